//! LCD1602 Control Tool
//!
//! CLI for writing text to a 16x2 character LCD on an I2C backpack.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lcd1602_hw::{Bus, Lcd1602, RecordingBus, TransferPolicy};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Configuration file read when `--config` is not given, if present.
const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "lcd1602ctl")]
#[command(about = "Control tool for LCD1602 I2C displays")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// I2C bus device (overrides config)
    #[arg(long)]
    bus: Option<String>,

    /// Device address, decimal or 0x-prefixed hex (overrides config)
    #[arg(long, value_parser = parse_address)]
    address: Option<u8>,

    /// Transfer policy: report, ignore (overrides config)
    #[arg(long)]
    policy: Option<TransferPolicy>,

    /// Print the bus bytes instead of writing to the device
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Display(DisplayCommands),
    /// Print the effective configuration, or save it to a file
    Config {
        /// Write the configuration to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DisplayCommands {
    /// Clear the display, then write two lines
    Show {
        /// First row text (up to 16 characters)
        line1: String,
        /// Second row text (up to 16 characters)
        #[arg(default_value = "")]
        line2: String,
    },
    /// Write two lines without clearing
    Write {
        /// First row text (up to 16 characters)
        line1: String,
        /// Second row text (up to 16 characters)
        #[arg(default_value = "")]
        line2: String,
    },
    /// Clear the display
    Clear,
    /// Return the cursor to the top-left corner
    Home,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bus) = cli.bus {
        config.lcd.bus = bus;
    }
    if let Some(address) = cli.address {
        config.lcd.address = address;
    }
    if let Some(policy) = cli.policy {
        config.lcd.transfer_policy = policy;
    }
    debug!("Using {:?}", config.lcd);

    let command = match cli.command {
        Commands::Display(command) => command,
        Commands::Config { output } => return write_config(&config, output.as_deref()),
    };

    let lcd_config = &config.lcd;
    if cli.dry_run {
        let mut lcd = Lcd1602::with_bus(
            RecordingBus::new(),
            lcd_config.address,
            lcd_config.transfer_policy,
        )?;
        run(&mut lcd, &command)?;
        if let Some(bus) = lcd.bus() {
            for pulse in bus.bytes().chunks(2) {
                println!("{:02X?}", pulse);
            }
        }
        lcd.close();
        return Ok(());
    }

    let mut lcd = Lcd1602::init_with_policy(
        &lcd_config.bus,
        lcd_config.address,
        lcd_config.transfer_policy,
    )
    .with_context(|| {
        format!(
            "Failed to initialize LCD at {} (address 0x{:02X}). Is I2C enabled?",
            lcd_config.bus, lcd_config.address
        )
    })?;
    if let Some(bus) = lcd.bus() {
        info!(
            "LCD ready on {} (address 0x{:02X}, transfer policy {})",
            bus.path(),
            bus.address(),
            lcd.policy()
        );
    }

    let result = run(&mut lcd, &command);
    lcd.close();
    result
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(DEFAULT_CONFIG),
        None => Ok(Config::default()),
    }
}

fn write_config(config: &Config, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            config.save(path)?;
            println!("Configuration saved to: {}", path.display());
        }
        None => {
            let content =
                toml::to_string_pretty(config).context("Failed to serialize configuration")?;
            print!("{}", content);
        }
    }

    Ok(())
}

fn run<B: Bus>(lcd: &mut Lcd1602<B>, command: &DisplayCommands) -> Result<()> {
    match command {
        DisplayCommands::Show { line1, line2 } => {
            lcd.clear().context("Failed to clear display")?;
            lcd.write(line1, line2).context("Failed to write text")?;
            println!("Text sent to LCD");
        }
        DisplayCommands::Write { line1, line2 } => {
            lcd.write(line1, line2).context("Failed to write text")?;
            println!("Text sent to LCD");
        }
        DisplayCommands::Clear => {
            lcd.clear().context("Failed to clear display")?;
            println!("LCD cleared");
        }
        DisplayCommands::Home => {
            lcd.home().context("Failed to move cursor home")?;
            println!("Cursor at home");
        }
    }

    Ok(())
}

/// Parses a 7-bit address given as decimal or `0x` hex.
fn parse_address(s: &str) -> std::result::Result<u8, String> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    }
    .map_err(|e| format!("invalid address '{}': {}", s, e))?;

    if value > 0x7F {
        return Err(format!("address 0x{:02X} does not fit in 7 bits", value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x27"), Ok(0x27));
        assert_eq!(parse_address("0X3f"), Ok(0x3F));
        assert_eq!(parse_address("39"), Ok(39));
        assert!(parse_address("0x80").is_err());
        assert!(parse_address("0x100").is_err());
        assert!(parse_address("lcd").is_err());
    }

    #[test]
    fn test_cli_parses_show() {
        let cli = Cli::try_parse_from([
            "lcd1602ctl",
            "--address",
            "0x3F",
            "--policy",
            "ignore",
            "show",
            "Hello",
        ])
        .unwrap();
        assert_eq!(cli.address, Some(0x3F));
        assert_eq!(cli.policy, Some(TransferPolicy::Ignore));
        match cli.command {
            Commands::Display(DisplayCommands::Show { line1, line2 }) => {
                assert_eq!(line1, "Hello");
                assert_eq!(line2, "");
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn test_run_show_clears_first() {
        let mut lcd =
            Lcd1602::with_bus(RecordingBus::new(), 0x27, TransferPolicy::Report).unwrap();
        lcd.bus_mut().unwrap().take();
        let command = DisplayCommands::Show {
            line1: "A".to_string(),
            line2: "B".to_string(),
        };
        run(&mut lcd, &command).unwrap();
        let bytes = lcd.bus().unwrap().bytes();
        // clear (0x01) as two nibbles, then the row 0 cursor command.
        assert_eq!(&bytes[..4], &[0x0C, 0x08, 0x1C, 0x18]);
        assert_eq!(&bytes[4..8], &[0x8C, 0x88, 0x0C, 0x08]);
        assert_eq!(bytes.len(), 4 * 5);
    }

    #[test]
    fn test_run_on_closed_display_fails() {
        let mut lcd =
            Lcd1602::with_bus(RecordingBus::new(), 0x27, TransferPolicy::Report).unwrap();
        lcd.close();
        assert!(run(&mut lcd, &DisplayCommands::Clear).is_err());
    }

    #[test]
    fn test_cli_parses_config() {
        let cli = Cli::try_parse_from(["lcd1602ctl", "config", "--output", "lcd.toml"]).unwrap();
        match cli.command {
            Commands::Config { output } => assert_eq!(output, Some(PathBuf::from("lcd.toml"))),
            _ => panic!("expected config"),
        }
    }

    #[test]
    fn test_write_config_to_file() {
        let path = std::env::temp_dir().join(format!("lcd1602ctl-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.lcd.bus = "/dev/i2c-0".to_string();
        config.lcd.transfer_policy = TransferPolicy::Ignore;
        write_config(&config, Some(path.as_path())).unwrap();
        let loaded = load_config(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
