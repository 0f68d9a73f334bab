use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use guestgate_storage::{Event, Roster};

#[derive(Debug, Subcommand)]
pub enum EventCommands {
    #[command(about = "Create an event and print its door code")]
    Create {
        #[arg(help = "Event name")]
        name: String,

        #[arg(long, help = "Event date (YYYY-MM-DD)")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Door PIN, 4 to 8 digits")]
        pin: String,
    },

    #[command(about = "Edit an event; omitted fields keep their value")]
    Edit {
        #[arg(help = "Event door code")]
        code: String,

        #[arg(long, help = "New event name")]
        name: Option<String>,

        #[arg(long, conflicts_with = "no_date", help = "New event date (YYYY-MM-DD)")]
        date: Option<NaiveDate>,

        #[arg(long, help = "Remove the event date")]
        no_date: bool,

        #[arg(long, help = "Replace the door PIN")]
        pin: Option<String>,
    },

    #[command(about = "List events, newest first")]
    List,
}

pub async fn handle(cmd: EventCommands, roster: &Roster) -> anyhow::Result<()> {
    match cmd {
        EventCommands::Create { name, date, pin } => {
            let event = roster
                .create_event(&name, date, &pin)
                .await
                .context("creating event")?;

            println!("Created event {} ({})", event.name, event.display_date());
            println!("Door code: {}", event.event_code);
            Ok(())
        }
        EventCommands::Edit {
            code,
            name,
            date,
            no_date,
            pin,
        } => {
            let current = roster
                .find_event_by_code(&code)
                .await
                .with_context(|| format!("looking up event {code}"))?;

            let name = name.unwrap_or_else(|| current.name.clone());
            let date = match (date, no_date) {
                (_, true) => None,
                (Some(date), false) => Some(date),
                (None, false) => current.event_date,
            };

            let event = roster
                .update_event(current.id, &name, date, pin.as_deref())
                .await
                .with_context(|| format!("updating event {code}"))?;

            println!("Updated event {}", event.event_code);
            print_events(&[event]);
            Ok(())
        }
        EventCommands::List => {
            let events = roster.list_events().await.context("listing events")?;
            if events.is_empty() {
                println!("No events yet");
            } else {
                print_events(&events);
            }
            Ok(())
        }
    }
}

fn print_events(events: &[Event]) {
    println!("{:<6} {:<8} {:<12} {}", "ID", "CODE", "DATE", "NAME");
    println!("{}", "-".repeat(50));
    for event in events {
        println!(
            "{:<6} {:<8} {:<12} {}",
            event.id,
            event.event_code,
            event.display_date(),
            event.name
        );
    }
}
