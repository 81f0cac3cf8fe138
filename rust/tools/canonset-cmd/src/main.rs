use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "canonset-cmd")]
#[command(about = "Command-line utility for canonical identifier set encodings")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a set of identifiers and print the bytes as hex
    Encode {
        /// Identifiers or ranges, comma separated (e.g. `1,2,10..20,30..=40`)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// File with one identifier or range per line (`#` starts a comment)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Decode a hex encoding and print its members
    Decode {
        /// Print inclusive ranges instead of individual identifiers
        #[arg(long)]
        ranges: bool,

        /// Encoded set as hex
        hex: String,
    },

    /// Decode a hex encoding and print its structure as JSON
    ///
    /// With -v the segments of every partition are listed, with -vv also their chunks.
    Inspect {
        /// Encoded set as hex
        hex: String,
    },

    /// Check whether a hex string is a valid canonical encoding
    Validate {
        /// Encoded set as hex
        hex: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    match cli.command {
        Commands::Encode { ids, file } => commands::encode::run(ids, file),
        Commands::Decode { ranges, hex } => commands::decode::run(hex, ranges),
        Commands::Inspect { hex } => commands::inspect::run(cli.verbose, hex),
        Commands::Validate { hex } => commands::validate::run(hex),
    }
}
