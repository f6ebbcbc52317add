use prost::Message;

/// One log record as the container runtime frames it.
///
/// Field tags match the runtime's log-driver protobuf contract, so frames
/// written by the runtime decode directly into this struct.
#[derive(Clone, PartialEq, Message)]
pub struct LogEntry {
    /// Stream the line was read from, `stdout` or `stderr`.
    #[prost(string, tag = "1")]
    pub source: String,

    /// Nanoseconds since the Unix epoch.
    #[prost(int64, tag = "2")]
    pub time_nano: i64,

    /// Raw line bytes, usually with a trailing newline.
    #[prost(bytes = "vec", tag = "3")]
    pub line: Vec<u8>,

    /// True when the line was split across multiple records.
    #[prost(bool, tag = "4")]
    pub partial: bool,
}
