//! Command-line argument parsing for the countdown board

use anyhow::{bail, Result};

/// Parse command line arguments
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub once: bool,
    pub validate: bool,
    pub help: bool,
    pub list: bool,
    /// Some(true) for --simple, Some(false) for --detailed, None to use config
    pub simple: Option<bool>,
    /// RFC 3339 instant to use instead of the clock
    pub now: Option<String>,
    /// Shared target label and date (--name / --date)
    pub name: Option<String>,
    pub date: Option<String>,
    /// --add LABEL DATE
    pub add: Option<(String, String)>,
    pub notify_at: Option<String>,
    pub remove: Option<String>,
}

impl Args {
    /// Store edits and listings exit after one pass
    pub fn is_store_command(&self) -> bool {
        self.list || self.add.is_some() || self.remove.is_some()
    }
}

pub fn parse_args() -> Result<Args> {
    parse_args_from(std::env::args().skip(1))
}

/// Parse arguments, excluding the program name
pub fn parse_args_from<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut result = Args::default();
    let mut args = args.into_iter();

    fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
        match args.next() {
            Some(v) if !v.starts_with("--") => Ok(v),
            _ => bail!("{} requires a value", flag),
        }
    }

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--once" => result.once = true,
            "--validate" => result.validate = true,
            "--help" | "-h" => result.help = true,
            "--list" => result.list = true,
            "--simple" => result.simple = Some(true),
            "--detailed" => result.simple = Some(false),
            "--now" => result.now = Some(value(&mut args, "--now")?),
            "--name" => result.name = Some(value(&mut args, "--name")?),
            "--date" => result.date = Some(value(&mut args, "--date")?),
            "--add" => {
                let label = value(&mut args, "--add")?;
                let date = value(&mut args, "--add")?;
                result.add = Some((label, date));
            }
            "--notify-at" => result.notify_at = Some(value(&mut args, "--notify-at")?),
            "--remove" => result.remove = Some(value(&mut args, "--remove")?),
            other => bail!("unknown argument '{}' (see --help)", other),
        }
    }

    if result.name.is_some() != result.date.is_some() {
        bail!("--name and --date must be given together");
    }
    if result.notify_at.is_some() && result.add.is_none() {
        bail!("--notify-at only applies to --add");
    }

    Ok(result)
}

pub fn print_help() {
    println!("countdown - period-end countdown board\n");
    println!("USAGE:");
    println!("    countdown [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --once                       Print the board once and exit");
    println!("    --simple | --detailed        Days only, or days/hours/minutes/seconds");
    println!("    --now RFC3339                Evaluate at this instant instead of the clock");
    println!("    --name LABEL --date DATE     Show a one-off target (YYYY-MM-DD)");
    println!("    --add LABEL DATE             Save a custom target");
    println!("    --notify-at YYYY-MM-DDTHH:MM Reminder time for --add");
    println!("    --remove ID                  Delete a saved target");
    println!("    --list                       List saved targets");
    println!("    --validate                   Validate configuration and exit");
    println!("    --help, -h                   Show this help message\n");
    println!("ENVIRONMENT:");
    println!("    COUNTDOWN_TIMEZONE      IANA zone (default Asia/Tokyo)");
    println!("    COUNTDOWN_HOLIDAYS      jp | none | path to JSON table (default jp)");
    println!("    COUNTDOWN_TARGETS_FILE  custom target store (default ./targets.json)");
    println!("    COUNTDOWN_TICK_MS       refresh interval (default 1000)");
    println!("    COUNTDOWN_SIMPLE        true for simple mode");
}
