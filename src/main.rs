use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use clap::{Parser as ClapParser, Subcommand};
use pipeql::cli::{self, CliError, RunOptions};
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(ClapParser)]
#[command(name = "pipeql")]
#[command(about = "pipeql - A pipe-style query language over in-memory tables")]
#[command(version)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a query against JSON data
    Run {
        /// The query to execute
        query: String,

        /// JSON file mapping table names to arrays of rows
        /// (reads from stdin if not provided)
        #[arg(short, long, env = "PIPEQL_DATA")]
        data: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate query syntax, reporting every error found
    Check {
        query: String,
    },

    /// Print the token stream of a query
    Tokens {
        query: String,
    },

    /// Print the parsed syntax tree of a query
    Ast {
        query: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {e}");
    }

    let result = match cli.command {
        Commands::Run {
            query,
            data,
            pretty,
        } => run(query, data, pretty),
        Commands::Check { query } => cli::execute_check(&query).map(|count| {
            println!("Syntax is valid ({count} statements)");
        }),
        Commands::Tokens { query } => cli::format_tokens(&query).map(|listing| {
            print!("{listing}");
        }),
        Commands::Ast { query } => cli::format_ast(&query).map(|dump| {
            println!("{dump}");
        }),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(query: String, data: Option<PathBuf>, pretty: bool) -> Result<(), CliError> {
    let data = match data {
        Some(path) => {
            debug!(path = %path.display(), "reading data file");
            Some(fs::read_to_string(path)?)
        }
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let output = cli::execute_run(&RunOptions {
        query,
        data,
        pretty,
    })?;
    println!("{output}");
    Ok(())
}
