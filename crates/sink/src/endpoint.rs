use std::fmt;
use std::str::FromStr;

use crate::SinkError;

/// Transport scheme of the ingestion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Tcp,
    Udp,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            other => Err(SinkError::invalid_endpoint(format!(
                "unsupported scheme '{other}', expected tcp or udp"
            ))),
        }
    }
}

/// Parsed `scheme://host:port` endpoint address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse an endpoint URL of the form `tcp://host:port` or
    /// `udp://host:port`.
    pub fn parse(url: &str) -> Result<Self, SinkError> {
        let (scheme, rest) = url.split_once("://").ok_or_else(|| {
            SinkError::invalid_endpoint(format!(
                "'{url}' is missing a scheme, expected scheme://host:port"
            ))
        })?;
        let scheme = scheme.parse()?;

        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| SinkError::invalid_endpoint(format!("'{url}' is missing a port")))?;
        if host.is_empty() {
            return Err(SinkError::invalid_endpoint(format!(
                "'{url}' is missing a host"
            )));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| SinkError::invalid_endpoint(format!("invalid port in '{url}'")))?;
        if port == 0 {
            return Err(SinkError::invalid_endpoint(
                "port must be between 1 and 65535",
            ));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
        })
    }

    /// `host:port` form used for socket addresses.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}
