//! Codememo CLI - Command-line interface for Codememo
//!
//! Works on Codememo documents: JSON files holding a graph of code snippets
//! and the line references between them.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "codememo")]
#[command(author = "Codememo Contributors")]
#[command(version)]
#[command(about = "Take notes on code as a graph of referencing snippets", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.codememo/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty document
    New {
        doc: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Add a snippet from a source file as a new node
    Add {
        doc: PathBuf,

        /// Source file to take the snippet from
        file: PathBuf,

        /// Lines to take, as START:STOP, START: or LINE
        #[arg(short, long)]
        lines: Option<String>,

        /// Snippet name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Language tag (inferred from the extension by default)
        #[arg(long)]
        lang: Option<String>,

        /// Comment attached to the node
        #[arg(short, long)]
        comment: Option<String>,
    },

    /// Make LEAF refer to lines of ROOT
    Link {
        doc: PathBuf,

        /// Root node id or unique id prefix
        root: String,

        /// Leaf node id or unique id prefix
        leaf: String,

        /// First referenced line
        #[arg(long, default_value = "1")]
        start: u32,

        /// Last referenced line
        #[arg(long)]
        stop: Option<u32>,
    },

    /// Remove ROOT from the roots of LEAF
    Unlink {
        doc: PathBuf,
        leaf: String,
        root: String,
    },

    /// Remove a node
    Remove {
        doc: PathBuf,
        node: String,

        /// Also remove every node reachable through its leaves
        #[arg(short, long)]
        recursive: bool,
    },

    /// Print the document as layered trees
    Show { doc: PathBuf },

    /// Print all links in tree order
    Links {
        doc: PathBuf,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Validate a document and show statistics
    Status { doc: PathBuf },

    /// Export a document as Graphviz DOT
    ExportDot {
        doc: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a document from a Graphviz DOT file
    ImportDot {
        dot: PathBuf,

        /// Output document
        #[arg(short, long)]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<PathBuf>) -> Result<Config, config::ConfigError> {
    let path = match path {
        Some(path) => path,
        None => Config::default_path()?,
    };
    Config::load_or_create(&path)
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}, using defaults", e);
            Config::default()
        }
    };

    let result = match cli.command {
        Commands::New { doc, force } => commands::new(&doc, force),
        Commands::Add {
            doc,
            file,
            lines,
            name,
            lang,
            comment,
        } => commands::add(&doc, &file, lines.as_deref(), name, lang, comment, &config),
        Commands::Link {
            doc,
            root,
            leaf,
            start,
            stop,
        } => commands::link(&doc, &root, &leaf, start, stop),
        Commands::Unlink { doc, leaf, root } => commands::unlink(&doc, &leaf, &root),
        Commands::Remove {
            doc,
            node,
            recursive,
        } => commands::remove(&doc, &node, recursive),
        Commands::Show { doc } => commands::show(&doc),
        Commands::Links { doc, json } => commands::links(&doc, json),
        Commands::Status { doc } => commands::status(&doc),
        Commands::ExportDot { doc, output } => commands::export_dot(&doc, output.as_deref()),
        Commands::ImportDot { dot, output, force } => commands::import_dot(&dot, &output, force),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
