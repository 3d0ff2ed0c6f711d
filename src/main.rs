use clap::{ArgAction, Parser, Subcommand};
use afsx::archive::{self, ExtractOptions, ExtractReport, FileOutcome};
use afsx::convert::Transcoder;
use afsx::AfsError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Parser)]
#[command(name = "afsx", about = "Extract blocks from AFS audio containers")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every block of one or more AFS files next to the input
    Extract {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
        /// Extension for extracted blocks
        #[arg(long, default_value = "adx")]
        ext: String,
        /// Convert each extracted block to .ogg
        #[arg(short = 'c', long)]
        convert_ogg: bool,
        /// Delete extracted blocks (after a successful conversion when -c is given)
        #[arg(short = 'r', long, visible_alias = "delete-adx")]
        remove_adx: bool,
        /// Transcoder executable
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: OsString,
    },
    /// List the block index without extracting
    List {
        input: PathBuf,
        /// Print the header and index as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show header metadata
    Info {
        input: PathBuf,
    },
    /// Pack files, in the order given, into a new AFS container
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { files, ext, convert_ogg, remove_adx, ffmpeg } => {
            let opts = ExtractOptions { extension: ext };
            let transcoder = Transcoder { program: ffmpeg, ..Transcoder::default() };
            let batch = archive::extract_many(
                &files, &opts, convert_ogg.then_some(&transcoder), remove_adx);

            for outcome in &batch.outcomes {
                print_outcome(outcome);
            }

            if batch.failed() > 0 {
                eprintln!("{} of {} file(s) failed", batch.failed(), files.len());
                std::process::exit(batch.exit_code());
            }
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let reader = archive::open(&input)?;
            if json {
                println!("{}", reader.listing_json()?);
            } else {
                println!("{}: {} block(s)", input.display(), reader.len());
                println!("{:>6}  {:>10}  {:>10}", "Index", "Offset", "Size");
                for (i, e) in reader.entries().iter().enumerate() {
                    println!("{:>6}  0x{:08X}  0x{:08X}", i, e.offset, e.size);
                }
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let reader = archive::open(&input)?;
            let len = reader.stream_len();
            let mut out_of_bounds = 0usize;
            for (i, e) in reader.entries().iter().enumerate() {
                if !e.fits_within(len) {
                    warn!(index = i, end = e.end(), len, "block extends past end of file");
                    out_of_bounds += 1;
                }
            }

            println!("── AFS Container ────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  File size      {} B", len);
            println!("  Entries        {}", reader.header.entry_count);
            println!("  Index end      {} B", reader.header.index_end());
            println!("  Payload        {} B", reader.index.payload_bytes());
            println!("  Out of bounds  {}", out_of_bounds);
        }

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, files } => {
            let n = archive::pack(&files, &output)?;
            println!("Created: {} ({} block(s))", output.display(), n);
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(level.into()),
        )
        .init();
}

fn print_report(report: &ExtractReport) {
    println!("{} - {} blocks", report.input.display(), report.blocks.len());
    for b in &report.blocks {
        println!("{:<50} offset=0x{:08X} size=0x{:08X}",
            b.path.display().to_string(), b.entry.offset, b.entry.size);
    }
}

fn print_outcome(outcome: &FileOutcome) {
    match &outcome.result {
        Ok(report) => print_report(report),
        Err(e) => report_failure(&outcome.input, e),
    }
    for e in &outcome.conversion_errors {
        eprintln!("Error in converting: {}", e);
    }
    for (path, e) in &outcome.removal_errors {
        eprintln!("Could not remove {}: {}", path.display(), e);
    }
}

fn report_failure(input: &Path, e: &AfsError) {
    if e.is_format_error() {
        eprintln!("{}: not a valid AFS container, skipping ({})", input.display(), e);
    } else {
        eprintln!("{}: {}", input.display(), e);
    }
}
