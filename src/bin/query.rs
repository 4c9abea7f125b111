use anyhow::Result;
use clap::{Parser, Subcommand};
use launch_indexer::config::Config;
use launch_indexer::query::commands::{
    cmd_launches, cmd_pending_metadata, cmd_purchases, cmd_status, cmd_submit_metadata,
};
use launch_indexer::query::formatters::OutputFormat;
use launch_indexer::repository::Database;

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Query indexed launches and purchases", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cursor position and row counts
    Status,
    Launches {
        /// active or finalized
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value = "50")]
        limit: usize,
    },
    Purchases {
        token: String,

        #[arg(long, default_value = "100")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },
    PendingMetadata {
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Record metadata for a launch that has not been confirmed on-chain yet
    SubmitMetadata {
        name: String,
        symbol: String,
        content_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let db = Database::new(&Config::database_url_from_env())?;

    match cli.command {
        Commands::Status => cmd_status(&db.conn, &format)?,
        Commands::Launches { status, limit } => {
            cmd_launches(&db.conn, status.as_deref(), limit, &format)?
        }
        Commands::Purchases {
            token,
            limit,
            offset,
        } => cmd_purchases(&db.conn, &token, limit, offset, &format)?,
        Commands::PendingMetadata { limit } => cmd_pending_metadata(&db.conn, limit, &format)?,
        Commands::SubmitMetadata {
            name,
            symbol,
            content_id,
        } => cmd_submit_metadata(&db.conn, &name, &symbol, &content_id)?,
    }

    Ok(())
}
