//! `slots` CLI: check weekly schedules, list bookable slots and reserve them.
//!
//! ## Usage
//!
//! ```sh
//! # Report overlapping windows in a schedule (stdin → stdout)
//! cat schedule.json | slots check
//!
//! # Fail with a non-zero exit on any invalid or overlapping window
//! slots check -i schedule.json --strict
//!
//! # Bookable start times for a day, in the visitor's zone
//! slots times -s snapshot.json --event <uuid> --date 2026-03-16 --timezone Europe/Paris
//!
//! # Dates with at least one bookable start time
//! slots dates -s snapshot.json --event <uuid> --from 2026-03-16 --to 2026-03-22 --timezone UTC
//!
//! # Reserve a slot and persist the booking back into the snapshot
//! slots reserve -s snapshot.json --event <uuid> --date 2026-03-16 --time 09:30 \
//!     --timezone UTC --name Ada --email ada@example.com --write
//! ```
//!
//! Settings come from `slots.toml` (or `--config`) and `SLOTS_*` environment
//! variables; see [`config::Settings`].

mod config;
mod snapshot;

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use slot_engine::ports::{Clock, FixedClock, SystemClock};
use slot_engine::schedule::validate;
use slot_engine::time::parse_date;
use slot_engine::{overlap_warnings, Booker, ReservationGuard, SchedulePayload, SlotEnumerator};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::{load_config, DEFAULT_CONFIG_FILE};
use crate::snapshot::Snapshot;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Availability resolution for meeting schedules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Treat this date as today (YYYY-MM-DD) instead of the system clock
    #[arg(long, global = true)]
    today: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report overlapping windows in a schedule
    Check {
        /// Schedule JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Reject malformed times, bad zones and overlaps with an error
        #[arg(long)]
        strict: bool,
    },
    /// List bookable start times for one date
    Times {
        #[arg(short, long)]
        snapshot: String,
        #[arg(long)]
        event: Uuid,
        #[arg(long)]
        date: String,
        /// Visitor timezone (IANA name)
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
    /// List dates in a range with at least one bookable start time
    Dates {
        #[arg(short, long)]
        snapshot: String,
        #[arg(long)]
        event: Uuid,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
    /// Reserve a start time chosen in the visitor's timezone
    Reserve {
        #[arg(short, long)]
        snapshot: String,
        #[arg(long)]
        event: Uuid,
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
        #[arg(long, default_value = "UTC")]
        timezone: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        notes: Option<String>,
        /// Save the new booking back into the snapshot file
        #[arg(long)]
        write: bool,
    },
    /// Cancel a confirmed booking
    Cancel {
        #[arg(short, long)]
        snapshot: String,
        #[arg(long)]
        booking: Uuid,
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_config(&cli.config)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    debug!(config = ?settings, "settings loaded");

    let clock: Arc<dyn Clock> = match cli.today.as_deref() {
        Some(today) => Arc::new(FixedClock(parse_date(today)?)),
        None => Arc::new(SystemClock),
    };

    match cli.command {
        Commands::Check { input, strict } => {
            let raw = read_input(input.as_deref())?;
            let payload: SchedulePayload =
                serde_json::from_str(&raw).context("Failed to parse schedule JSON")?;
            if strict {
                validate("cli", &payload)?;
            }
            print_json(&overlap_warnings(&payload.windows))?;
        }
        Commands::Times {
            snapshot,
            event,
            date,
            timezone,
        } => {
            let snapshot = Snapshot::read(&snapshot)?;
            let event_type = snapshot.event_type(event)?;
            let loaded = snapshot.load().await?;
            let enumerator = SlotEnumerator::new(loaded.store.clone(), loaded.store, loaded.calendar)
                .with_clock(clock)
                .with_config(settings.engine);

            let slots = enumerator
                .available_time_slots(event_type, parse_date(&date)?, &timezone)
                .await?;
            print_json(&slots)?;
        }
        Commands::Dates {
            snapshot,
            event,
            from,
            to,
            timezone,
        } => {
            let snapshot = Snapshot::read(&snapshot)?;
            let event_type = snapshot.event_type(event)?;
            let loaded = snapshot.load().await?;
            let enumerator = SlotEnumerator::new(loaded.store.clone(), loaded.store, loaded.calendar)
                .with_clock(clock)
                .with_config(settings.engine);

            let dates: Vec<NaiveDate> = enumerator
                .available_dates(event_type, parse_date(&from)?, parse_date(&to)?, &timezone)
                .await?;
            print_json(&dates)?;
        }
        Commands::Reserve {
            snapshot: path,
            event,
            date,
            time,
            timezone,
            name,
            email,
            notes,
            write,
        } => {
            let mut snapshot = Snapshot::read(&path)?;
            let event_type = snapshot.event_type(event)?.clone();
            let loaded = snapshot.load().await?;
            let guard = ReservationGuard::new(loaded.store).with_clock(clock);

            let booker = Booker::new(name, email, notes)?;
            let booking = guard
                .reserve_local(&event_type, &date, &time, &timezone, booker)
                .await?;
            print_json(&booking)?;

            if write {
                snapshot.upsert_booking(booking);
                snapshot.write(&path)?;
            }
        }
        Commands::Cancel {
            snapshot: path,
            booking,
            write,
        } => {
            let mut snapshot = Snapshot::read(&path)?;
            let loaded = snapshot.load().await?;
            let guard = ReservationGuard::new(loaded.store).with_clock(clock);

            let cancelled = guard.cancel(booking).await?;
            print_json(&cancelled)?;

            if write {
                snapshot.upsert_booking(cancelled);
                snapshot.write(&path)?;
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
