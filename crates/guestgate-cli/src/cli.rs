use crate::commands::{self, DoorArgs, EventCommands, GuestCommands};
use anyhow::Context;
use clap::{Parser, Subcommand};
use guestgate_storage::{Database, DatabaseConfig};

#[derive(Debug, Parser)]
#[command(name = "guestgate")]
#[command(about = "Guest list check-in at the venue door")]
#[command(version)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "GUESTGATE_DB", default_value = "guestgate.db")]
    pub db: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create, edit and list events")]
    Event {
        #[command(subcommand)]
        cmd: EventCommands,
    },

    #[command(about = "Manage the guest list of an event")]
    Guest {
        #[command(subcommand)]
        cmd: GuestCommands,
    },

    #[command(about = "Run the interactive door terminal for an event")]
    Door(DoorArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let db = Database::open(DatabaseConfig::new(&cli.db))
        .await
        .with_context(|| format!("opening database {}", cli.db))?;

    let result = match cli.command {
        Commands::Event { cmd } => commands::event::handle(cmd, &db.roster()).await,
        Commands::Guest { cmd } => commands::guest::handle(cmd, &db.roster()).await,
        Commands::Door(args) => commands::door::run(args, &db).await,
    };

    db.close().await;
    result
}
