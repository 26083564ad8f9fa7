use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

pub const DEFAULT_ENDPOINT_URL: &str = "opc.tcp://10.0.5.76:4840";
pub const DEFAULT_NODE_ID: &str = "ns=1;s=G1_pressure";
pub const DEFAULT_LOG_FILE: &str = "pressure_log.txt";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Everything the poller needs to know, handed in once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Server endpoint, `opc.tcp://host:port`.
    pub endpoint_url: String,
    /// Node whose value is polled.
    pub node_id: String,
    pub log_file: PathBuf,
    /// Pause between two reads.
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.into(),
            node_id: DEFAULT_NODE_ID.into(),
            log_file: DEFAULT_LOG_FILE.into(),
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl Config {
    /// Rejects values that can only fail later, before anything connects.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint_url.trim().is_empty() {
            return Err(Error::Config("endpoint url is empty".into()));
        }
        if !self.endpoint_url.contains("://") {
            return Err(Error::Config(format!(
                "endpoint url {:?} has no scheme, expected scheme://host:port",
                self.endpoint_url
            )));
        }
        if self.node_id.trim().is_empty() {
            return Err(Error::Config("node id is empty".into()));
        }
        if self.log_file.as_os_str().is_empty() {
            return Err(Error::Config("log file path is empty".into()));
        }
        if self.interval.is_zero() {
            return Err(Error::Config("polling interval must be positive".into()));
        }
        Ok(())
    }
}
