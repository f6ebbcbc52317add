use std::collections::HashMap;
use std::time::Duration;

use logship_sink::Endpoint;

use crate::DriverError;

/// Log option naming the ingestion endpoint, `scheme://host:port`.
pub const OPT_URL: &str = "logstash-url";

/// Log option setting the per-operation I/O timeout, a duration string.
pub const OPT_TIMEOUT: &str = "logstash-timeout";

/// Timeout applied when `logstash-timeout` is not given.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Validated sink settings from a container's log options.
///
/// Compared for equality when a new stream wants to share the process's
/// sink client: streams with differing options are rejected instead of
/// silently replacing the active sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOptions {
    /// Where records are shipped.
    pub endpoint: Endpoint,

    /// Timeout applied to connect and to each write.
    pub timeout: Duration,
}

impl SinkOptions {
    /// Validate the host-supplied log options.
    ///
    /// Unknown keys are rejected so a misspelled option fails the start
    /// call instead of being silently ignored.
    pub fn from_config(config: &HashMap<String, String>) -> Result<Self, DriverError> {
        for key in config.keys() {
            if key != OPT_URL && key != OPT_TIMEOUT {
                return Err(DriverError::UnknownOption { key: key.clone() });
            }
        }

        let url = config
            .get(OPT_URL)
            .ok_or(DriverError::MissingOption { key: OPT_URL })?;
        let endpoint = Endpoint::parse(url).map_err(|e| DriverError::InvalidOption {
            key: OPT_URL,
            message: e.to_string(),
        })?;

        let timeout = match config.get(OPT_TIMEOUT) {
            Some(raw) => {
                humantime::parse_duration(raw).map_err(|e| DriverError::InvalidOption {
                    key: OPT_TIMEOUT,
                    message: e.to_string(),
                })?
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self { endpoint, timeout })
    }
}
