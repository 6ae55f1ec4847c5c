use std::io::{self, BufRead, Write};

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigField;
use crate::error::ConfigError;
use crate::interface::{ChannelSelection, ConfigInterface};

pub const PROMPT: &str = "CMD> ";

#[derive(Debug, Parser)]
#[command(multicall = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

#[derive(Debug, Subcommand)]
enum ConsoleCommand {
    /// Configure channels: min/max/hysteresis, read/write the store, show state
    Config(ConfigArgs),
    /// Show sampling state of one or all channels
    Status(StatusArgs),
    /// Show the scaled output of a channel
    Get(GetArgs),
    /// Leave the console
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Load settings of all channels from the store
    #[arg(short, long)]
    read: bool,
    /// Save settings of all channels to the store
    #[arg(short, long)]
    write: bool,
    /// Channel to change
    #[arg(short, long, value_name = "CH")]
    channel: Option<usize>,
    /// Lower output bound
    #[arg(short = 'm', long, value_name = "VAL", requires = "channel", allow_negative_numbers = true)]
    min: Option<i32>,
    /// Upper output bound
    #[arg(short = 'M', long, value_name = "VAL", requires = "channel", allow_negative_numbers = true)]
    max: Option<i32>,
    /// Hysteresis threshold
    #[arg(short = 'H', long, value_name = "VAL", requires = "channel", allow_negative_numbers = true)]
    hyst: Option<i32>,
    /// Show settings and filtered values of all channels
    #[arg(short, long)]
    show: bool,
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Channel to show, all when omitted
    #[arg(short, long, value_name = "CH")]
    channel: Option<usize>,
}

#[derive(Debug, Args)]
struct GetArgs {
    /// Channel to read
    #[arg(short, long, value_name = "CH")]
    channel: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

/// Line-oriented operator console over a [`ConfigInterface`].
pub struct Console {
    interface: ConfigInterface,
}

impl Console {
    pub fn new(interface: ConfigInterface) -> Self {
        Console { interface }
    }

    /// Reads commands until end of input or `quit`.
    pub fn run(&self, input: impl BufRead, mut out: impl Write) -> io::Result<()> {
        writeln!(out, "\nADC channel console ready")?;
        writeln!(out, "Type 'help' for available commands\n")?;

        let mut lines = input.lines();
        loop {
            write!(out, "{}", PROMPT)?;
            out.flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            if self.execute(&line?, &mut out)? == Outcome::Quit {
                break;
            }
        }
        Ok(())
    }

    pub fn execute(&self, line: &str, out: &mut impl Write) -> io::Result<Outcome> {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            return Ok(Outcome::Continue);
        }

        let parsed = match ConsoleLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                write!(out, "{}", e)?;
                return Ok(Outcome::Continue);
            }
        };

        let result = match parsed.command {
            ConsoleCommand::Config(args) => self.config(&args, out),
            ConsoleCommand::Status(args) => self.status(&args, out),
            ConsoleCommand::Get(args) => self.get(&args, out),
            ConsoleCommand::Quit => return Ok(Outcome::Quit),
        };

        match result {
            Ok(()) => {}
            Err(CommandError::Config(e)) => writeln!(out, "Error: {}", e)?,
            Err(CommandError::Io(e)) => return Err(e),
        }
        Ok(Outcome::Continue)
    }

    fn config(&self, args: &ConfigArgs, out: &mut impl Write) -> Result<(), CommandError> {
        if args.read {
            self.interface.load_from_store(ChannelSelection::All)?;
            writeln!(out, "Loaded settings from store.")?;
        }

        if args.write {
            self.interface.save_to_store(ChannelSelection::All)?;
            writeln!(out, "Saved settings to store.")?;
        }

        if let Some(ch) = args.channel {
            self.set_values(ch, args, out)?;
        }

        if args.show {
            for snap in self.interface.snapshots(ChannelSelection::All)? {
                writeln!(
                    out,
                    "CH{}: min={} max={} hyst={} filtered={} scaled={}",
                    snap.channel,
                    snap.config.lower_bound,
                    snap.config.upper_bound,
                    snap.config.hysteresis,
                    snap.filtered,
                    snap.scaled
                )?;
            }
        }
        Ok(())
    }

    fn set_values(&self, ch: usize, args: &ConfigArgs, out: &mut impl Write) -> Result<(), CommandError> {
        let current = self.interface.get_config(ch)?;
        if let Some(hyst) = args.hyst {
            ConfigField::Hysteresis.validate(hyst)?;
        }

        let bounds = match (args.min, args.max) {
            (Some(min), Some(max)) => Some((min, max, None)),
            (Some(min), None) => Some((min, current.upper_bound, Some((ConfigField::Min, min)))),
            (None, Some(max)) => Some((current.lower_bound, max, Some((ConfigField::Max, max)))),
            (None, None) => None,
        };

        if let Some((lower, upper, single)) = bounds {
            ConfigField::Min.validate(lower)?;
            ConfigField::Max.validate(upper)?;
            if lower > upper {
                writeln!(out, "Warning: min > max, swapping values")?;
            }
            let applied = match single {
                Some((field, value)) => self.interface.set_field(ch, field, value)?,
                None => self.interface.set_bounds(ch, lower, upper)?,
            };
            writeln!(
                out,
                "CH{} min={} max={}",
                ch, applied.lower_bound, applied.upper_bound
            )?;
        }

        if let Some(hyst) = args.hyst {
            let applied = self.interface.set_hysteresis(ch, hyst)?;
            writeln!(out, "CH{} hyst set to {}", ch, applied.hysteresis)?;
        }
        Ok(())
    }

    fn status(&self, args: &StatusArgs, out: &mut impl Write) -> Result<(), CommandError> {
        for snap in self.interface.snapshots(args.channel.into())? {
            writeln!(
                out,
                "CH{}: raw={} avg={} filtered={} scaled={} min={} max={} hyst={}",
                snap.channel,
                snap.raw,
                snap.average,
                snap.filtered,
                snap.scaled,
                snap.config.lower_bound,
                snap.config.upper_bound,
                snap.config.hysteresis
            )?;
        }
        Ok(())
    }

    fn get(&self, args: &GetArgs, out: &mut impl Write) -> Result<(), CommandError> {
        let value = self.interface.value(args.channel)?;
        let normalized = self.interface.normalized(args.channel)?;
        writeln!(out, "CH{}: value={} normalized={:.3}", args.channel, value, normalized)?;
        Ok(())
    }
}

enum CommandError {
    Config(ConfigError),
    Io(io::Error),
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        CommandError::Config(e)
    }
}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelBank;
    use crate::engine::{DEFAULT_PERIOD, Engine};
    use crate::testing::{MemoryStore, ScriptedSource};
    use std::sync::Arc;

    fn console(store: Arc<MemoryStore>) -> (Console, ConfigInterface) {
        let bank = Arc::new(ChannelBank::new(6).unwrap());
        let interface = ConfigInterface::new(bank, store);
        (Console::new(interface.clone()), interface)
    }

    fn exec(console: &Console, line: &str) -> (Outcome, String) {
        let mut out = Vec::new();
        let outcome = console.execute(line, &mut out).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn sets_bounds_and_hysteresis() {
        let store = MemoryStore::new();
        let (console, iface) = console(store.clone());

        let (outcome, text) = exec(&console, "config -c 2 -m 100 -M 3000 -H 20");
        assert_eq!(outcome, Outcome::Continue);
        assert!(text.contains("CH2 min=100 max=3000"), "{}", text);
        assert!(text.contains("CH2 hyst set to 20"), "{}", text);

        let cfg = iface.get_config(2).unwrap();
        assert_eq!((cfg.lower_bound, cfg.upper_bound, cfg.hysteresis), (100, 3000, 20));
        assert_eq!(store.value("ch_hyst2"), Some(20));
    }

    #[test]
    fn inverted_pair_warns_and_swaps() {
        let (console, iface) = console(MemoryStore::new());
        let (_, text) = exec(&console, "config -c 0 -m 3000 -M 1000");
        assert!(text.contains("Warning: min > max, swapping values"));
        assert!(text.contains("CH0 min=1000 max=3000"));
        assert_eq!(iface.get_config(0).unwrap().lower_bound, 1000);
    }

    #[test]
    fn out_of_range_value_is_reported_and_not_applied() {
        let store = MemoryStore::new();
        let (console, iface) = console(store.clone());

        let (_, text) = exec(&console, "config -c 1 -m 100 -M 5000");
        assert_eq!(text, "Error: invalid max value 5000 (valid: 0..=4095)\n");

        let (_, text) = exec(&console, "config -c 1 -m -3");
        assert!(text.contains("invalid min value -3"), "{}", text);

        let (_, text) = exec(&console, "config -c 1 -H 600");
        assert!(text.contains("invalid hyst value 600 (valid: 0..=500)"), "{}", text);

        assert_eq!(iface.get_config(1).unwrap(), Default::default());
        assert!(store.writes().is_empty());
    }

    #[test]
    fn command_with_a_bad_value_applies_nothing() {
        let store = MemoryStore::new();
        let (console, iface) = console(store.clone());

        let (_, text) = exec(&console, "config -c 1 -m 100 -M 200 -H 600");
        assert_eq!(text, "Error: invalid hyst value 600 (valid: 0..=500)\n");
        assert_eq!(iface.get_config(1).unwrap(), Default::default());
        assert!(store.writes().is_empty());
    }

    #[test]
    fn invalid_channel_is_reported() {
        let (console, _) = console(MemoryStore::new());
        let (outcome, text) = exec(&console, "config -c 6 -m 1");
        assert_eq!(outcome, Outcome::Continue);
        assert!(text.starts_with("Error: invalid channel 6"), "{}", text);
    }

    #[test]
    fn value_without_channel_is_a_usage_error() {
        let (console, iface) = console(MemoryStore::new());
        let (outcome, text) = exec(&console, "config -m 100");
        assert_eq!(outcome, Outcome::Continue);
        assert!(text.contains("--channel"), "{}", text);
        assert_eq!(iface.get_config(0).unwrap(), Default::default());
    }

    #[test]
    fn read_write_and_show_all_channels() {
        let store = MemoryStore::with_entries(&[("ch_min3", 50), ("ch_max3", 60)]);
        let (console, _) = console(store.clone());

        let (_, text) = exec(&console, "config -r -s");
        assert!(text.starts_with("Loaded settings from store.\n"));
        assert!(text.contains("CH3: min=50 max=60 hyst=10 filtered=0 scaled=0"), "{}", text);
        assert_eq!(text.lines().filter(|l| l.starts_with("CH")).count(), 6);

        let (_, text) = exec(&console, "config -w");
        assert_eq!(text, "Saved settings to store.\n");
        assert_eq!(store.writes().len(), 18);
    }

    #[test]
    fn status_for_one_channel() {
        let (console, _) = console(MemoryStore::new());
        let (_, text) = exec(&console, "status -c 4");
        assert_eq!(text, "CH4: raw=0 avg=0 filtered=0 scaled=0 min=0 max=4095 hyst=10\n");

        let (_, text) = exec(&console, "status");
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn get_prints_scaled_and_normalized() {
        let store = MemoryStore::new();
        let bank = Arc::new(ChannelBank::new(2).unwrap());
        let interface = ConfigInterface::new(Arc::clone(&bank), store.clone());
        let console = Console::new(interface);

        let source = ScriptedSource::new();
        source.set(1, 4095);
        let mut engine = Engine::new(bank, store, source, DEFAULT_PERIOD);
        for _ in 0..200 {
            engine.tick();
        }

        let (_, text) = exec(&console, "get -c 1");
        assert_eq!(text, "CH1: value=4084 normalized=0.997\n");

        let (_, text) = exec(&console, "get -c 2");
        assert!(text.starts_with("Error: invalid channel 2"), "{}", text);
    }

    #[test]
    fn unknown_and_empty_lines_keep_running() {
        let (console, _) = console(MemoryStore::new());
        assert_eq!(exec(&console, "   ").0, Outcome::Continue);
        let (outcome, text) = exec(&console, "frobnicate");
        assert_eq!(outcome, Outcome::Continue);
        assert!(!text.is_empty());
    }

    #[test]
    fn run_stops_on_quit() {
        let (console, iface) = console(MemoryStore::new());
        let input = b"config -c 0 -H 30\nexit\nconfig -c 0 -H 40\n";
        let mut out = Vec::new();
        console.run(&input[..], &mut out).unwrap();

        assert_eq!(iface.get_config(0).unwrap().hysteresis, 30);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(PROMPT).count(), 2);
    }
}
