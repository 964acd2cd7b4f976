//! Change stream for the file-backed store.
//!
//! Tails `changes.jsonl`: a filesystem watcher reacts to writes, and a poll
//! every 500ms catches anything the watcher misses (network filesystems,
//! coalesced events). Both read from a shared offset so each line is
//! delivered once.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use booth_core::ChangeEvent;
use booth_core::Result;
use booth_core::error::{Error, TransportError};

use crate::store::{CHANGE_LOG_FILE, FileStore};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Live change notifications from a [`FileBackend`](crate::FileBackend).
///
/// Only lines appended after the stream was opened are delivered. Dropping
/// the stream stops the watcher and the poll task.
pub struct FileChanges {
    inner: Pin<Box<dyn Stream<Item = Result<ChangeEvent>> + Send>>,
}

impl FileChanges {
    pub(crate) fn open(store: &FileStore) -> Result<Self> {
        let root = store.root().to_path_buf();
        std::fs::create_dir_all(&root).map_err(Error::io)?;

        let log_path = store.change_log_path();
        let position = Arc::new(Mutex::new(store.change_log_len()));
        let (tx, mut rx) = mpsc::unbounded_channel::<Result<ChangeEvent>>();

        let watch_path = log_path.clone();
        let watch_position = Arc::clone(&position);
        let watch_tx = tx.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(
                event.kind,
                notify::EventKind::Modify(_) | notify::EventKind::Create(_)
            ) {
                return;
            }
            let is_change_log = event
                .paths
                .iter()
                .any(|p| p.file_name().is_some_and(|n| n == CHANGE_LOG_FILE));
            if is_change_log {
                forward_new_events(&watch_path, &watch_position, &watch_tx);
            }
        })
        .map_err(|e| watch_error("create file watcher", e))?;

        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|e| watch_error("watch store directory", e))?;

        tokio::spawn(async move {
            let _watcher = watcher;
            let mut interval = tokio::time::interval(POLL_INTERVAL);

            while !tx.is_closed() {
                interval.tick().await;
                forward_new_events(&log_path, &position, &tx);
            }
            debug!("Change log tail stopped");
        });

        let stream = async_stream::stream! {
            while let Some(event) = rx.recv().await {
                yield event;
            }
        };

        Ok(Self {
            inner: Box::pin(stream),
        })
    }
}

impl Stream for FileChanges {
    type Item = Result<ChangeEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

fn watch_error(action: &str, err: notify::Error) -> Error {
    Error::Transport(TransportError::Io {
        message: format!("failed to {}: {}", action, err),
    })
}

fn forward_new_events(
    log_path: &Path,
    position: &Arc<Mutex<u64>>,
    tx: &mpsc::UnboundedSender<Result<ChangeEvent>>,
) {
    let mut pos = position.lock().unwrap_or_else(|e| e.into_inner());
    match read_complete_lines(log_path, *pos) {
        Ok((events, consumed)) => {
            *pos += consumed;
            for event in events {
                if tx.send(event).is_err() {
                    return;
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "Failed to read change log"),
    }
}

/// Parse every complete line after `start`.
///
/// Returns the parsed events and the number of bytes consumed. A trailing
/// line without its newline is left for the next read.
fn read_complete_lines(
    log_path: &Path,
    start: u64,
) -> std::io::Result<(Vec<Result<ChangeEvent>>, u64)> {
    let mut file = File::open(log_path)?;
    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    let Some(last_newline) = buf.iter().rposition(|b| *b == b'\n') else {
        return Ok((Vec::new(), 0));
    };
    let complete = &buf[..=last_newline];

    let events = complete
        .split(|b| *b == b'\n')
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .map(|line| serde_json::from_slice::<ChangeEvent>(line).map_err(Error::json))
        .collect();

    Ok((events, complete.len() as u64))
}
