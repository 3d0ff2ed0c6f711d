//! File-level API — open, extract, and pack AFS containers on disk.
//!
//! ```no_run
//! use afsx::archive::{extract_all, block_path};
//!
//! let input = std::path::Path::new("voices.afs");
//! let n = extract_all(input, |i| block_path(input, i, "adx"))?;
//! println!("{n} blocks");
//! # Ok::<(), afsx::AfsError>(())
//! ```
//!
//! Extraction is eager: every block is read into memory before the first
//! output file is created, so a bad header or a truncated block leaves no
//! output behind. A write failure part way through may leave earlier outputs.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::convert::{ConvertError, Transcoder};
use crate::error::{AfsError, Result};
use crate::header::Header;
use crate::index::IndexEntry;
use crate::io_stream::{AfsReader, AfsWriter};

// ── Options ──────────────────────────────────────────────────────────────────

/// Configuration for [`extract_all_with`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Extension given to every extracted block.
    pub extension: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { extension: "adx".into() }
    }
}

// ── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ExtractedBlock {
    pub index: usize,
    pub entry: IndexEntry,
    pub path:  PathBuf,
}

#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub input:  PathBuf,
    pub header: Header,
    pub blocks: Vec<ExtractedBlock>,
}

impl ExtractReport {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.blocks.iter().map(|b| b.path.as_path())
    }
}

/// Outcome of one input in [`extract_many`].
#[derive(Debug)]
pub struct FileOutcome {
    pub input:             PathBuf,
    pub result:            Result<ExtractReport>,
    /// Transcoded files, one per successful conversion.
    pub converted:         Vec<PathBuf>,
    pub conversion_errors: Vec<ConvertError>,
    /// Raw blocks deleted after post-processing.
    pub removed:           Vec<PathBuf>,
    pub removal_errors:    Vec<(PathBuf, std::io::Error)>,
}

impl FileOutcome {
    fn new(input: &Path, result: Result<ExtractReport>) -> Self {
        Self {
            input:             input.to_owned(),
            result,
            converted:         Vec::new(),
            conversion_errors: Vec::new(),
            removed:           Vec::new(),
            removal_errors:    Vec::new(),
        }
    }

    pub fn error(&self) -> Option<&AfsError> {
        self.result.as_ref().err()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// Inputs whose extraction failed. Conversion problems do not count.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 { 1 } else { 0 }
    }
}

// ── Operations ───────────────────────────────────────────────────────────────

/// `<dir>/<stem>_<index:03>.<extension>`, next to the input.
pub fn block_path(input: &Path, index: usize, extension: &str) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    input.with_file_name(format!("{stem}_{index:03}.{extension}"))
}

/// Read and validate just the header.
pub fn open_and_validate<P: AsRef<Path>>(path: P) -> Result<Header> {
    Header::read(File::open(path)?)
}

pub fn open<P: AsRef<Path>>(path: P) -> Result<AfsReader<BufReader<File>>> {
    AfsReader::new(BufReader::new(File::open(path)?))
}

/// Extract every block of `path`, writing block `i` to `namer(i)`.
/// Returns the number of files written.
pub fn extract_all<P, F>(path: P, namer: F) -> Result<usize>
where
    P: AsRef<Path>,
    F: FnMut(usize) -> PathBuf,
{
    let (_, written) = extract_into(path.as_ref(), namer)?;
    Ok(written.len())
}

/// [`extract_all`] with the default naming scheme and a per-block report.
pub fn extract_all_with<P: AsRef<Path>>(path: P, opts: &ExtractOptions) -> Result<ExtractReport> {
    let input = path.as_ref();
    let (header, written) = extract_into(input, |i| block_path(input, i, &opts.extension))?;
    Ok(ExtractReport {
        input:  input.to_owned(),
        header,
        blocks: written,
    })
}

fn extract_into<F>(input: &Path, mut namer: F) -> Result<(Header, Vec<ExtractedBlock>)>
where
    F: FnMut(usize) -> PathBuf,
{
    let (header, entries, blocks) = {
        let mut reader = open(input)?;
        let blocks = reader.read_all_blocks()?;
        (reader.header, reader.index.entries, blocks)
    };
    info!(input = %input.display(), blocks = blocks.len(), "extracting");

    let mut written = Vec::with_capacity(blocks.len());
    for (index, (entry, data)) in entries.into_iter().zip(blocks).enumerate() {
        let path = namer(index);
        fs::write(&path, &data)?;
        debug!(index, path = %path.display(), size = data.len(), "wrote block");
        written.push(ExtractedBlock { index, entry, path });
    }
    Ok((header, written))
}

/// Extract each input independently; one bad input never stops the others.
///
/// With a `transcoder`, every block this run produced is converted. With
/// `remove_raw`, a block is deleted afterwards, but only once its conversion
/// succeeded when a transcoder is given.
pub fn extract_many<P: AsRef<Path>>(
    inputs:     &[P],
    opts:       &ExtractOptions,
    transcoder: Option<&Transcoder>,
    remove_raw: bool,
) -> BatchReport {
    let mut batch = BatchReport::default();
    for input in inputs {
        let input = input.as_ref();
        let mut outcome = FileOutcome::new(input, extract_all_with(input, opts));
        let paths: Vec<PathBuf> = match &outcome.result {
            Ok(report) => report.paths().map(Path::to_path_buf).collect(),
            Err(e) => {
                warn!(input = %input.display(), error = %e, "extraction failed");
                Vec::new()
            }
        };
        for path in paths {
            post_process(&mut outcome, path, transcoder, remove_raw);
        }
        batch.outcomes.push(outcome);
    }
    batch
}

fn post_process(outcome: &mut FileOutcome, path: PathBuf, transcoder: Option<&Transcoder>, remove_raw: bool) {
    let converted = match transcoder {
        Some(t) => match t.convert(&path) {
            Ok(out) => {
                outcome.converted.push(out);
                true
            }
            Err(e) => {
                outcome.conversion_errors.push(e);
                false
            }
        },
        None => true,
    };
    if remove_raw && converted {
        match fs::remove_file(&path) {
            Ok(()) => outcome.removed.push(path),
            Err(e) => outcome.removal_errors.push((path, e)),
        }
    }
}

/// Pack `inputs`, in order, into a new container at `output`.
pub fn pack<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<usize> {
    let mut writer = AfsWriter::new(BufWriter::new(File::create(output)?));
    for path in inputs {
        writer.add_block(&fs::read(path)?)?;
    }
    let count = writer.len();
    writer.finish()?;
    info!(output = %output.display(), blocks = count, "packed");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_path_pads_to_three_digits() {
        let p = Path::new("/data/voice.afs");
        assert_eq!(block_path(p, 0, "adx"), PathBuf::from("/data/voice_000.adx"));
        assert_eq!(block_path(p, 42, "bin"), PathBuf::from("/data/voice_042.bin"));
        assert_eq!(block_path(p, 1234, "adx"), PathBuf::from("/data/voice_1234.adx"));
    }

    #[test]
    fn block_path_without_extension_on_input() {
        assert_eq!(block_path(Path::new("BGM"), 1, "adx"), PathBuf::from("BGM_001.adx"));
    }
}
