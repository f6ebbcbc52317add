use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use logship_sink::SinkClient;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::SpoolError;

/// Poll cadence while waiting for the sink to come back before rotating.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Mode of the spool file itself.
const SPOOL_FILE_MODE: u32 = 0o640;

/// Mode of created spool directories.
const SPOOL_DIR_MODE: u32 = 0o755;

/// Append-only overflow buffer for one container's records.
///
/// Cheap to clone; clones share the same file. At most one rotation task
/// runs at a time, serialized by an atomic flag, and appends that arrive
/// while a rotation is in flight land in whichever generation is current
/// without blocking on the replay.
#[derive(Clone)]
pub struct Spool {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<fs::File>>>,
    rotating: AtomicBool,
}

impl Spool {
    /// Open (or create) the spool file at `path`, creating its parent
    /// directory as needed.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SpoolError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            fs::DirBuilder::new()
                .recursive(true)
                .mode(SPOOL_DIR_MODE)
                .create(dir)
                .await
                .map_err(|e| SpoolError::CreateDir {
                    path: dir.to_path_buf(),
                    source: e,
                })?;
        }
        let writer = open_writer(&path).await?;

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                writer: Mutex::new(Some(writer)),
                rotating: AtomicBool::new(false),
            }),
        })
    }

    /// Path of the current generation.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Whether a rotation task is currently in flight.
    pub fn rotating(&self) -> bool {
        self.inner.rotating.load(Ordering::Acquire)
    }

    /// Append one record, flushed to the file before returning, so a
    /// crash loses at most the record in flight.
    pub async fn append(&self, record: &[u8]) -> Result<(), SpoolError> {
        let mut writer = self.inner.writer.lock().await;
        let Some(w) = writer.as_mut() else {
            return Err(SpoolError::Closed);
        };
        w.write_all(record).await?;
        w.flush().await?;
        Ok(())
    }

    /// Rotate the current generation aside and replay it into `sink`.
    ///
    /// Idempotent: when a rotation is already in flight this returns
    /// immediately. The work runs on a background task that waits for the
    /// sink to leave its reconnecting state, renames the current file
    /// with an RFC 3339 timestamp suffix, swaps in a fresh writer, and
    /// hands the renamed file to a replay task that deletes it when
    /// drained. If the fresh file cannot be opened the flag stays set and
    /// no further rotations happen for this spool.
    pub fn rotate_and_drain(&self, sink: &SinkClient) {
        if self
            .inner
            .rotating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let sink = sink.clone();
        tokio::spawn(async move {
            while sink.reconnecting() {
                sleep(DRAIN_POLL_INTERVAL).await;
            }

            let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
            let mut rotated = inner.path.clone().into_os_string();
            rotated.push(".");
            rotated.push(&stamp);
            let rotated = PathBuf::from(rotated);

            if let Err(e) = fs::rename(&inner.path, &rotated).await {
                tracing::error!(
                    path = %inner.path.display(),
                    error = %e,
                    "failed to rotate spool file"
                );
            }

            match open_writer(&inner.path).await {
                Ok(w) => *inner.writer.lock().await = Some(w),
                Err(e) => {
                    // `rotating` stays set: no further rotations for this
                    // stream, appends keep landing in the rotated file.
                    tracing::error!(
                        path = %inner.path.display(),
                        error = %e,
                        "failed to reopen spool file, rotation disabled"
                    );
                    return;
                }
            }

            tokio::spawn(replay(rotated, sink));

            inner.rotating.store(false, Ordering::Release);
        });
    }

    /// Flush and drop the writer. Terminal for appends; an in-flight
    /// rotation or replay finishes on its own.
    pub async fn close(&self) {
        let mut writer = self.inner.writer.lock().await;
        if let Some(mut w) = writer.take() {
            if let Err(e) = w.flush().await {
                tracing::error!(
                    path = %self.inner.path.display(),
                    error = %e,
                    "failed to flush spool file on close"
                );
            }
        }
    }
}

/// Stream a rotated generation into the sink line by line, then delete it.
async fn replay(path: PathBuf, sink: SinkClient) {
    let file = match fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "failed to open rotated spool file"
            );
            return;
        }
    };

    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if let Err(e) = sink.write(&line).await {
                    tracing::error!(
                        path = %path.display(),
                        error = %e,
                        "failed to replay spooled record"
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "failed to read rotated spool file"
                );
                break;
            }
        }
    }

    tracing::debug!(path = %path.display(), "removing drained spool file");
    if let Err(e) = fs::remove_file(&path).await {
        tracing::error!(
            path = %path.display(),
            error = %e,
            "failed to remove drained spool file"
        );
    }
}

async fn open_writer(path: &Path) -> Result<BufWriter<fs::File>, SpoolError> {
    let file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .mode(SPOOL_FILE_MODE)
        .open(path)
        .await
        .map_err(|e| SpoolError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(BufWriter::new(file))
}
