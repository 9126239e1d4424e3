//! Configuration management.

use anyhow::{Context, Result};
use lcd1602_hw::{TransferPolicy, DEFAULT_ADDRESS, DEFAULT_BUS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// LCD configuration
    #[serde(default)]
    pub lcd: LcdConfig,
}

/// LCD device configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LcdConfig {
    /// I2C bus device path
    #[serde(default = "default_bus")]
    pub bus: String,

    /// 7-bit expander address
    #[serde(default = "default_address")]
    pub address: u8,

    /// Whether failed bus writes are reported or only logged
    #[serde(default)]
    pub transfer_policy: TransferPolicy,
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            address: default_address(),
            transfer_policy: TransferPolicy::default(),
        }
    }
}

fn default_bus() -> String {
    DEFAULT_BUS.to_string()
}

fn default_address() -> u8 {
    DEFAULT_ADDRESS
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        std::fs::write(path.as_ref(), content).context("Failed to write configuration file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.lcd.bus, "/dev/i2c-1");
        assert_eq!(config.lcd.address, 0x27);
        assert_eq!(config.lcd.transfer_policy, TransferPolicy::Report);
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            [lcd]
            bus = "/dev/i2c-0"
            address = 0x3F
            transfer_policy = "ignore"
            "#,
        )
        .unwrap();
        assert_eq!(config.lcd.bus, "/dev/i2c-0");
        assert_eq!(config.lcd.address, 0x3F);
        assert_eq!(config.lcd.transfer_policy, TransferPolicy::Ignore);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("lcd1602-config-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.lcd.address = 0x20;
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_shipped_default_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
        assert_eq!(Config::load(path).unwrap(), Config::default());
    }
}
