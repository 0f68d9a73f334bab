use anyhow::Context;
use chrono::Local;
use clap::Subcommand;
use guestgate_storage::{Guest, Roster};
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum GuestCommands {
    #[command(about = "Add one guest to an event")]
    Add {
        #[arg(help = "Event door code")]
        event: String,

        #[arg(help = "First name")]
        first_name: String,

        #[arg(help = "Last name")]
        last_name: String,

        #[arg(help = "CI, 7 or 8 digits (dots and dashes allowed)")]
        ci: String,
    },

    #[command(about = "Import guests from a CSV file (first name, last name, CI)")]
    Import {
        #[arg(help = "Event door code")]
        event: String,

        #[arg(help = "CSV file, comma or semicolon separated")]
        file: PathBuf,
    },

    #[command(about = "List guests, newest first")]
    List {
        #[arg(help = "Event door code")]
        event: String,

        #[arg(long, default_value = "", help = "Filter by name or CI")]
        filter: String,
    },

    #[command(about = "Show how many guests have entered")]
    Stats {
        #[arg(help = "Event door code")]
        event: String,
    },

    #[command(about = "Delete a guest by id")]
    Delete {
        #[arg(help = "Guest id, as shown by `guest list`")]
        id: i64,
    },
}

pub async fn handle(cmd: GuestCommands, roster: &Roster) -> anyhow::Result<()> {
    match cmd {
        GuestCommands::Add {
            event,
            first_name,
            last_name,
            ci,
        } => {
            let event_id = event_id(roster, &event).await?;
            let guest = roster
                .add_guest(event_id, &first_name, &last_name, &ci)
                .await
                .context("adding guest")?;

            println!("Added {} ({}) as guest {}", guest.full_name(), guest.ci, guest.id);
            Ok(())
        }
        GuestCommands::Import { event, file } => {
            let event_id = event_id(roster, &event).await?;
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;

            let summary = roster
                .import_csv(event_id, &text)
                .await
                .with_context(|| format!("importing {}", file.display()))?;

            println!(
                "Imported {} guests ({} rows read, {} already on the list)",
                summary.inserted,
                summary.parsed,
                summary.skipped()
            );
            Ok(())
        }
        GuestCommands::List { event, filter } => {
            let event_id = event_id(roster, &event).await?;
            let guests = roster
                .list_guests(event_id, &filter)
                .await
                .context("listing guests")?;

            if guests.is_empty() {
                println!("No guests");
            } else {
                print_guests(&guests);
            }
            Ok(())
        }
        GuestCommands::Stats { event } => {
            let event_id = event_id(roster, &event).await?;
            let stats = roster.stats(event_id).await.context("counting guests")?;

            println!("Total:   {}", stats.total);
            println!("Entered: {}", stats.entered);
            println!("Pending: {}", stats.pending);
            Ok(())
        }
        GuestCommands::Delete { id } => {
            roster
                .delete_guest(id)
                .await
                .with_context(|| format!("deleting guest {id}"))?;
            println!("Deleted guest {id}");
            Ok(())
        }
    }
}

async fn event_id(roster: &Roster, code: &str) -> anyhow::Result<i64> {
    let event = roster
        .find_event_by_code(code)
        .await
        .with_context(|| format!("looking up event {code}"))?;
    Ok(event.id)
}

fn print_guests(guests: &[Guest]) {
    println!("{:<6} {:<10} {:<30} {}", "ID", "CI", "NAME", "ENTERED");
    println!("{}", "-".repeat(60));
    for guest in guests {
        let entered = guest
            .checked_in_at
            .map(|at| at.with_timezone(&Local).format("%d/%m %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<10} {:<30} {}",
            guest.id,
            guest.ci,
            guest.full_name(),
            entered
        );
    }
}
