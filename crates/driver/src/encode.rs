use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use logship_protocol::LogEntry;

use crate::ContainerInfo;

/// JSON object shipped to the sink for one record, one object per line.
///
/// Field names are part of the wire contract with the ingestion
/// endpoint; `attr` and `err` are omitted when absent.
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    /// Stream the line came from, `stdout` or `stderr`.
    pub source: &'a str,

    /// The log line with surrounding whitespace removed.
    pub message: &'a str,

    #[serde(rename = "containerID")]
    pub container_id: &'a str,

    #[serde(rename = "containerName")]
    pub container_name: &'a str,

    #[serde(rename = "containerImageName")]
    pub container_image_name: &'a str,

    #[serde(rename = "containerCreated", serialize_with = "rfc3339_nanos")]
    pub container_created: &'a DateTime<Utc>,

    /// Extra attributes attached by the host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr: Option<&'a HashMap<String, String>>,

    /// Error attached to an incomplete record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

fn rfc3339_nanos<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Shape one decoded record into its newline-terminated JSON envelope.
///
/// Trimming is Unicode-aware and applied to both ends of the line; an
/// empty line still produces an envelope.
pub fn encode_entry(entry: &LogEntry, info: &ContainerInfo) -> Result<Vec<u8>, serde_json::Error> {
    let line = String::from_utf8_lossy(&entry.line);
    let envelope = Envelope {
        source: &entry.source,
        message: line.trim(),
        container_id: &info.id,
        container_name: &info.name,
        container_image_name: &info.image_name,
        container_created: &info.created,
        attr: None,
        err: None,
    };

    let mut payload = serde_json::to_vec(&envelope)?;
    payload.push(b'\n');
    Ok(payload)
}
