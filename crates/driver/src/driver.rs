use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use logship_protocol::FrameReader;
use logship_sink::SinkClient;
use logship_spool::Spool;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::worker::{self, Stream};
use crate::{ContainerInfo, DriverError, SinkOptions};

/// Default root for derived spool paths.
pub const DEFAULT_SPOOL_ROOT: &str = "/var/log/docker";

/// Process-wide registry of active log streams.
///
/// One stream per pipe path. All streams ship to a single shared sink
/// client, created with the first stream and closed with the last;
/// streams whose options disagree with the active sink are rejected
/// instead of silently replacing it, so a spool replayer never loses the
/// client it was draining into.
pub struct Driver {
    spool_root: PathBuf,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
pub(crate) struct State {
    streams: HashMap<String, StreamHandle>,
    sink: Option<SharedSink>,
}

struct StreamHandle {
    cancel: CancellationToken,
    spool: Spool,
}

struct SharedSink {
    client: SinkClient,
    options: SinkOptions,
    refs: usize,
}

impl State {
    async fn acquire_sink(&mut self, options: &SinkOptions) -> Result<SinkClient, DriverError> {
        match &mut self.sink {
            Some(shared) => {
                if shared.options != *options {
                    return Err(DriverError::ConfigConflict {
                        active: shared.options.endpoint.clone(),
                    });
                }
                shared.refs += 1;
                Ok(shared.client.clone())
            }
            None => {
                let client = SinkClient::connect(options.endpoint.clone(), options.timeout).await;
                self.sink = Some(SharedSink {
                    client: client.clone(),
                    options: options.clone(),
                    refs: 1,
                });
                Ok(client)
            }
        }
    }

    async fn release_sink(&mut self) {
        let last = match &mut self.sink {
            Some(shared) => {
                shared.refs -= 1;
                shared.refs == 0
            }
            None => false,
        };
        if last {
            if let Some(shared) = self.sink.take() {
                shared.client.close().await;
            }
        }
    }
}

impl Driver {
    /// Create a driver spooling under [`DEFAULT_SPOOL_ROOT`].
    pub fn new() -> Self {
        Self::with_spool_root(DEFAULT_SPOOL_ROOT)
    }

    /// Create a driver spooling under `root`.
    pub fn with_spool_root(root: impl Into<PathBuf>) -> Self {
        Self {
            spool_root: root.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Start shipping records read from the FIFO at `pipe`.
    ///
    /// Validates `info.config`, opens the FIFO (blocking until the host
    /// attaches its writer), opens the container's spool, joins the
    /// shared sink, and spawns the pipeline worker.
    pub async fn start_logging(&self, pipe: &str, info: ContainerInfo) -> Result<(), DriverError> {
        let options = SinkOptions::from_config(&info.config)?;

        if self.state.lock().await.streams.contains_key(pipe) {
            return Err(DriverError::AlreadyExists {
                pipe: pipe.to_string(),
            });
        }

        tracing::debug!(container = %info.id, pipe, "starting log stream");
        let fifo = tokio::fs::OpenOptions::new()
            .read(true)
            .open(pipe)
            .await
            .map_err(|e| DriverError::FifoOpen {
                path: pipe.to_string(),
                source: e,
            })?;

        let spool = Spool::open(info.spool_path(&self.spool_root)).await?;

        let mut state = self.state.lock().await;
        // Re-checked under the lock: another start may have won the race
        // while the FIFO open was blocking.
        if state.streams.contains_key(pipe) {
            return Err(DriverError::AlreadyExists {
                pipe: pipe.to_string(),
            });
        }
        let sink = state.acquire_sink(&options).await?;

        let cancel = CancellationToken::new();
        state.streams.insert(
            pipe.to_string(),
            StreamHandle {
                cancel: cancel.clone(),
                spool: spool.clone(),
            },
        );
        drop(state);

        tokio::spawn(worker::run(
            Stream {
                pipe: pipe.to_string(),
                reader: FrameReader::new(fifo),
                info,
                sink,
                spool,
                cancel,
            },
            Arc::clone(&self.state),
        ));

        Ok(())
    }

    /// Stop the stream for `pipe`.
    ///
    /// Idempotent: an unknown pipe is not an error. Cancels the worker,
    /// closes the spool, and releases the shared sink; rotation and
    /// replay tasks already in flight finish on their own.
    pub async fn stop_logging(&self, pipe: &str) -> Result<(), DriverError> {
        tracing::debug!(pipe, "stopping log stream");
        let mut state = self.state.lock().await;
        let Some(handle) = state.streams.remove(pipe) else {
            return Ok(());
        };

        handle.cancel.cancel();
        handle.spool.close().await;
        state.release_sink().await;
        Ok(())
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop a stream that ended on its own (reader EOF). No-op when
/// `stop_logging` already removed it.
pub(crate) async fn deregister(state: &Mutex<State>, pipe: &str) {
    let mut state = state.lock().await;
    if let Some(handle) = state.streams.remove(pipe) {
        handle.spool.close().await;
        state.release_sink().await;
    }
}
