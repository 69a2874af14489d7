//! bsuf-dump CLI
//!
//! Print the contents of SolarEdge .bsuf firmware files, or extract the
//! firmware they contain.

use bsuf_dump::output::{self, Report};
use bsuf_dump::{BsufFile, SaveOutcome};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bsuf-dump")]
#[command(about = "Decode SolarEdge .bsuf firmware files")]
#[command(version)]
struct Cli {
    /// Input .bsuf file(s)
    files: Vec<PathBuf>,

    /// Extract firmware to the specified directory
    #[arg(short = 'd', long)]
    savedir: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Show per-entry extraction results
    #[arg(short, long)]
    verbose: bool,

    /// Stop at the first failing file
    #[arg(long, hide = true)]
    debug: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let mut error_count = 0;

    for path in &cli.files {
        println!("==> {} <==", path.display());

        if let Err(e) = process_file(&cli, path) {
            error_count += 1;
            println!("ERROR: {}", e);
            if cli.debug {
                eprintln!("{:?}", e);
                std::process::exit(1);
            }
        }
    }

    if cli.files.len() > 1 && error_count > 0 {
        eprintln!(
            "\nProcessed {} file(s): {} errors",
            cli.files.len(),
            error_count
        );
    }

    if error_count > 0 {
        std::process::exit(1);
    }
}

fn process_file(cli: &Cli, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut bsuf = BsufFile::open(path)?;

    for warning in &bsuf.warnings {
        eprintln!("WARNING: {}", warning);
    }

    if let Some(ref savedir) = cli.savedir {
        fs::create_dir_all(savedir)?;
        for (decoded, outcome) in bsuf.save_all(savedir)? {
            match outcome {
                SaveOutcome::Written(out) => {
                    if cli.verbose {
                        eprintln!("  t{:04x} -> {}", decoded.entry.tag, out.display());
                    }
                }
                SaveOutcome::AlreadySaved(out) => {
                    println!("already saved: {}", out.display());
                }
                SaveOutcome::Skipped => {}
            }
        }
        return Ok(());
    }

    let report = Report::from_file(&mut bsuf)?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    match cli.format {
        OutputFormat::Text => {
            output::write_text(&report, &mut writer)?;
        }
        OutputFormat::Json => {
            output::write_json(&report, &mut writer, cli.pretty)?;
            writeln!(writer)?;
        }
    }

    writer.flush()?;

    Ok(())
}
