use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use period_countdown::board::{build_board, render_board, Mode};
use period_countdown::calendar::Calendar;
use period_countdown::cli::{parse_args, print_help, Args};
use period_countdown::config::Config;
use period_countdown::notify::{LogNotifier, Notifier, ReminderQueue};
use period_countdown::scheduler::run_ticker;
use period_countdown::target::{SharedTarget, TargetStore};

#[tokio::main]
async fn main() -> Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    if args.help {
        print_help();
        return Ok(());
    }

    // Initialize logging; cards go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("period_countdown=info".parse()?),
        )
        .init();

    info!("Countdown v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Timezone: {}", config.timezone);
    info!("  Holidays: {:?}", config.holidays);
    info!("  Targets file: {}", config.targets_file.display());

    // Handle --validate mode
    if args.validate {
        info!("Validating configuration...");
        match config.validate() {
            Ok(()) => {
                info!("Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let calendar = config.calendar()?;
    info!("  Holiday calendar: {}", calendar.holidays().name());

    let mut store = TargetStore::open(&config.targets_file)?;

    if args.is_store_command() {
        return run_store_command(&args, &mut store, &calendar);
    }

    let shared = match (&args.name, &args.date) {
        (Some(name), Some(date)) => Some(SharedTarget::parse(name, date)?),
        _ => None,
    };
    let mode = if args.simple.unwrap_or(config.simple) {
        Mode::Simple
    } else {
        Mode::Detailed
    };

    // A fixed --now always means a single render
    if let Some(now) = &args.now {
        let now = parse_now(now, &calendar)?;
        print_board(&calendar, &now, &store, shared.as_ref(), mode);
        return Ok(());
    }

    if args.once {
        print_board(&calendar, &calendar.now(), &store, shared.as_ref(), mode);
        return Ok(());
    }

    if config.tick_interval() != Duration::from_millis(config.tick_ms) {
        warn!(
            "COUNTDOWN_TICK_MS={} out of range, using {}ms",
            config.tick_ms,
            config.tick_interval().as_millis()
        );
    }

    let notifier = LogNotifier;
    let mut reminders = ReminderQueue::new();
    let scheduled = reminders.schedule_all(&calendar, store.targets());
    info!("{} reminder(s) scheduled", scheduled);

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            stopper.cancel();
        }
    });

    run_ticker(&calendar, config.tick_interval(), cancel, |now| {
        // Pick up edits made with --add / --remove while the board runs
        match TargetStore::open(&config.targets_file) {
            Ok(reloaded) => {
                for gone in removed_ids(&store, &reloaded) {
                    reminders.cancel(&gone);
                }
                store = reloaded;
                reminders.schedule_all(&calendar, store.targets());
            }
            Err(e) => error!("Keeping previous targets: {}", e),
        }

        print!("\x1b[2J\x1b[H");
        print_board(&calendar, &now, &store, shared.as_ref(), mode);
        for reminder in reminders.due(&now) {
            notifier.notify(&reminder);
        }
    })
    .await;

    Ok(())
}

fn print_board(
    calendar: &Calendar,
    now: &DateTime<Tz>,
    store: &TargetStore,
    shared: Option<&SharedTarget>,
    mode: Mode,
) {
    let cards = build_board(calendar, now, store.targets(), shared);
    print!("{}", render_board(now, &cards, mode));
}

fn removed_ids(before: &TargetStore, after: &TargetStore) -> Vec<String> {
    before
        .targets()
        .iter()
        .filter(|old| !after.targets().iter().any(|t| t.id == old.id))
        .map(|old| old.id.clone())
        .collect()
}

fn parse_now(input: &str, calendar: &Calendar) -> Result<DateTime<Tz>> {
    let instant = DateTime::parse_from_rfc3339(input)
        .with_context(|| format!("--now '{}' must be an RFC 3339 timestamp", input))?;
    Ok(calendar.at(instant.with_timezone(&Utc)))
}

/// --add / --remove / --list
fn run_store_command(args: &Args, store: &mut TargetStore, calendar: &Calendar) -> Result<()> {
    if let Some((label, date)) = &args.add {
        let tz = calendar.timezone();
        let target = store.add(label, date, args.notify_at.as_deref(), &tz, Utc::now())?;
        info!("Added target '{}' ({})", target.label, target.id);
        println!("{}", target.id);
        store.save()?;
    }

    if let Some(id) = &args.remove {
        let removed = store.remove(id)?;
        info!("Removed target '{}' ({})", removed.label, removed.id);
        store.save()?;
    }

    if args.list {
        let now = calendar.now();
        for target in store.targets() {
            let status = match target.deadline(calendar) {
                Ok(deadline) if deadline > now => "",
                Ok(_) => " (passed)",
                Err(_) => " (invalid date)",
            };
            let reminder = target
                .notify_at
                .as_deref()
                .map(|at| format!(" 🔔 {}", at))
                .unwrap_or_default();
            println!("{}  {}  {}{}{}", target.id, target.date, target.label, reminder, status);
        }
    }

    Ok(())
}
