use anyhow::{Context, Result};
use broadlink_lib::MacAddress;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

/// Contents of the JSON config file. Every field can also be given on the
/// command line, which takes precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub ip: Option<IpAddr>,
    pub mac: Option<MacAddress>,
    #[serde(rename = "type")]
    pub device_type: Option<u16>,
    pub timeout_secs: Option<u64>,
    /// Named IR/RF codes, hex encoded
    #[serde(default)]
    pub codes: BTreeMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at: {:?}", path))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file: {:?}", path))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Decode the named code
    pub fn code(&self, name: &str) -> Result<Vec<u8>> {
        let encoded = self
            .codes
            .get(name)
            .with_context(|| format!("No code named '{name}' in config"))?;
        hex::decode(encoded).with_context(|| format!("Code '{name}' is not valid hex"))
    }
}
