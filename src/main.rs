//! Weft CLI - Literate Programming Engine

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use weft::emit::{RstWeaver, Tangler};
use weft::model::{ReferenceStyle, Web};
use weft::reader::WebReader;

#[derive(Parser)]
#[command(name = "weft")]
#[command(author, version, about = "Literate programming engine", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract source files from a web document
    Tangle {
        /// The web document
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Directory tangled files are written under
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Mark each chunk with a source-line comment
        #[arg(long)]
        line_numbers: bool,
    },

    /// Render a web document as reStructuredText
    Weave {
        /// The web document
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Directory the woven document is written under
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Show full referenced-by ancestry, not just direct parents
        #[arg(long)]
        transitive: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Tangle {
            source,
            output,
            line_numbers,
        } => {
            let mut tangler = Tangler::new(output).with_line_numbers(line_numbers);
            load(&source).and_then(|web| web.tangle(&mut tangler))
        }

        Commands::Weave {
            source,
            output,
            transitive,
        } => {
            let style = if transitive {
                ReferenceStyle::Transitive
            } else {
                ReferenceStyle::Simple
            };
            let mut weaver = RstWeaver::new(output).with_reference_style(style);
            load(&source).and_then(|web| web.weave(&mut weaver))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(source: &PathBuf) -> weft::Result<Web> {
    let mut web = Web::new();
    WebReader::new().load(&mut web, source)?;
    web.create_used_by()?;
    Ok(web)
}
