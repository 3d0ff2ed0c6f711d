//! Transcoding of extracted blocks through an external program.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to start {program:?} for {}: {source}", .input.display())]
    Spawn { program: OsString, input: PathBuf, source: io::Error },
    #[error("converting {} exited with {status}: {stderr}", .input.display())]
    Failed { input: PathBuf, status: ExitStatus, stderr: String },
}

#[derive(Debug, Clone)]
pub struct Transcoder {
    pub program:          OsString,
    pub target_extension: String,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self { program: "ffmpeg".into(), target_extension: "ogg".into() }
    }
}

impl Transcoder {
    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.target_extension)
    }

    /// Convert `input` next to itself, overwriting an older conversion.
    pub fn convert(&self, input: &Path) -> Result<PathBuf, ConvertError> {
        let output = self.output_path(input);
        debug!(input = %input.display(), output = %output.display(), "transcoding");

        let out = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .arg(&output)
            .output()
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                input:   input.to_owned(),
                source,
            })?;

        if !out.status.success() {
            return Err(ConvertError::Failed {
                input:  input.to_owned(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_replaces_extension() {
        let t = Transcoder::default();
        assert_eq!(t.output_path(Path::new("/x/voice_003.adx")), PathBuf::from("/x/voice_003.ogg"));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let t = Transcoder {
            program:          "afsx-no-such-transcoder".into(),
            target_extension: "ogg".into(),
        };
        let err = t.convert(Path::new("whatever.adx")).unwrap_err();
        assert!(matches!(err, ConvertError::Spawn { .. }));
    }
}
