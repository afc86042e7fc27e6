//! countrun: run-length encoded coverage counts
//!
//! Usage: countrun <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

use countrun::commands::{
    DecodeCommand, DepthCommand, ExpressionCommand, MergeCommand, PeaksCommand,
};
use countrun::error::{CountsError, Result};

#[derive(Parser)]
#[command(name = "countrun")]
#[command(version)]
#[command(
    about = "Run-length encoded coverage counts: depth, merge, peaks and gene expression",
    long_about = None
)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Log progress to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write per-chromosome coverage of BED reads as counts files
    Depth {
        /// Input BED file of reads
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for <chrom>.counts files
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print a counts file as bedGraph
    Decode {
        /// Input counts file
        #[arg(short, long)]
        input: PathBuf,

        /// Chromosome name for the first column (default: file stem)
        #[arg(short, long)]
        chrom: Option<String>,

        /// Also report zero-count runs
        #[arg(short, long)]
        all: bool,
    },

    /// Sum several counts files into one bedGraph
    Merge {
        /// Input counts files
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Shift applied to each input, in input order
        #[arg(long, num_args = 1.., allow_negative_numbers = true)]
        offset: Vec<i64>,

        /// Chromosome name for the first column (default: first file stem)
        #[arg(short, long)]
        chrom: Option<String>,

        /// Also report zero-count runs
        #[arg(short, long)]
        all: bool,
    },

    /// Report stretches with counts above a threshold
    Peaks {
        /// Input counts files (several are summed)
        #[arg(short, long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,

        /// Report runs with counts strictly above this value
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        threshold: i64,

        /// Chromosome name for the first column (default: first file stem)
        #[arg(short, long)]
        chrom: Option<String>,
    },

    /// Count reads over the exons of each gene
    Expression {
        /// BED file of reads
        #[arg(short, long)]
        reads: PathBuf,

        /// BED6 or BED12 gene models
        #[arg(short, long)]
        annotations: PathBuf,

        /// Weight each read by its BED score column
        #[arg(short, long)]
        weighted: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| CountsError::InvalidFormat(format!("thread pool: {}", e)))?;
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match cli.command {
        Commands::Depth { input, output } => {
            let files = DepthCommand::new().run(&input, &output)?;
            log::info!("wrote {} counts files to {}", files.len(), output.display());
        }

        Commands::Decode { input, chrom, all } => {
            DecodeCommand::new()
                .with_chrom(chrom)
                .with_report_zero(all)
                .run(&input, &mut handle)?;
        }

        Commands::Merge {
            input,
            offset,
            chrom,
            all,
        } => {
            MergeCommand::new()
                .with_offsets(offset)
                .with_chrom(chrom)
                .with_report_zero(all)
                .run(&input, &mut handle)?;
        }

        Commands::Peaks {
            input,
            threshold,
            chrom,
        } => {
            PeaksCommand::new()
                .with_threshold(threshold)
                .with_chrom(chrom)
                .run(&input, &mut handle)?;
        }

        Commands::Expression {
            reads,
            annotations,
            weighted,
        } => {
            ExpressionCommand::new()
                .with_weighted(weighted)
                .run(&reads, &annotations, &mut handle)?;
        }
    }
    Ok(())
}
