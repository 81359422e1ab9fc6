//! # notesite CLI
//!
//! Command-line interface for the notesite static site generator.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notesite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, env = "NOTESITE_CONFIG", default_value = "notesite.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new notesite project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Build the static site
    Build {
        /// Fail when the build reports error diagnostics
        #[arg(long)]
        strict: bool,
    },

    /// Start development server with live rebuilds
    Dev {
        /// Server port (defaults to `server.port`)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check content and configuration without writing output
    Verify {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show a single page
    Page {
        /// Route or source link, e.g. `/react/react.html` or `react/react.md`
        link: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = PageFormat::Json)]
        format: PageFormat,
    },

    /// Search the built site
    Search {
        /// Search query
        query: String,

        /// Maximum results to return
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum PageFormat {
    Json,
    Html,
    Frontmatter,
    Raw,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Build { strict } => commands::build_site(&cli.config, strict),
        Commands::Dev { port } => commands::dev_server(&cli.config, port).await,
        Commands::Verify { json } => commands::verify_site(&cli.config, json),
        Commands::Page { link, format } => commands::show_page(&cli.config, &link, format),
        Commands::Search { query, limit, json } => {
            commands::search_site(&cli.config, &query, limit, json)
        }
    }
}
