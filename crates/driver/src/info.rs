use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Description of the container behind one log stream, supplied by the
/// host at start and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Full container id.
    pub id: String,

    /// Container name.
    pub name: String,

    /// Name of the image the container was created from.
    pub image_name: String,

    /// When the container was created.
    pub created: DateTime<Utc>,

    /// Host-chosen spool path; empty means derive one under the spool
    /// root.
    pub log_path: String,

    /// Raw log options from the host, validated at start.
    pub config: HashMap<String, String>,
}

impl ContainerInfo {
    /// Spool file for this container: the host-provided path when set,
    /// otherwise `<root>/<id>/<id>.log`.
    pub fn spool_path(&self, root: &Path) -> PathBuf {
        if self.log_path.is_empty() {
            root.join(&self.id).join(format!("{}.log", self.id))
        } else {
            PathBuf::from(&self.log_path)
        }
    }
}
