mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kata-cli")]
#[command(about = "Kata CLI - Manage the question bank and daily challenges", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load questions from a JSON seed file
    Seed {
        /// Path to a JSON array of questions
        #[arg(short, long, default_value = "data/questions.json")]
        file: String,

        /// Remove every stored question before seeding
        #[arg(long, default_value = "false")]
        clear: bool,
    },

    /// Remove every stored question, daily challenges included
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// Print the stored daily challenge for a date
    Daily {
        /// Date as YYYY-MM-DD (defaults to today, UTC)
        #[arg(short, long)]
        date: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seed { file, clear } => {
            commands::seed(&file, clear).await?;
        }
        Commands::Clear { yes } => {
            commands::clear(yes).await?;
        }
        Commands::Daily { date } => {
            commands::show_daily(date.as_deref()).await?;
        }
    }

    Ok(())
}
