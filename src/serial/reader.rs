//! Background task that drains the port and fans text out.
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use super::auto_reply::AutoReply;
use super::types::ObserverSet;
use super::{SerialError, SerialInterface};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReaderExit {
    /// Stop was requested
    Stopped,
    /// The port was closed underneath the reader
    Closed,
    /// Unrecoverable read error; the port has been released
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderMetrics {
    pub chunks_read: u64,
    pub bytes_read: u64,
    pub utf8_decode_errors: u64,
    pub last_error: Option<String>,
}

pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<ReaderExit>,
    metrics_rx: watch::Receiver<ReaderMetrics>,
}

impl ReaderHandle {
    /// Ask the loop to exit. Returns immediately; the loop notices on its next poll.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn metrics_receiver(&self) -> watch::Receiver<ReaderMetrics> {
        self.metrics_rx.clone()
    }

    /// Wait for the loop to end and report why it did
    pub async fn join(self) -> ReaderExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) => ReaderExit::Failed(format!("reader task ended: {}", e)),
        }
    }

    /// Stop and wait up to `limit` for the loop to wind down
    pub async fn shutdown(self, limit: Duration) -> Option<ReaderExit> {
        self.stop();
        match timeout(limit, self.task).await {
            Ok(Ok(exit)) => Some(exit),
            Ok(Err(e)) => Some(ReaderExit::Failed(format!("reader task ended: {}", e))),
            Err(_) => {
                log::warn!("Reader did not stop within {:?}", limit);
                None
            }
        }
    }
}

pub struct ReaderConfig {
    pub poll_interval: Duration,
    pub buffer_size: usize,
}

/// Best-effort UTF-8. Malformed sequences become U+FFFD instead of failing.
pub fn decode_chunk(bytes: &[u8]) -> (Cow<'_, str>, bool) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (Cow::Borrowed(s), false),
        Err(_) => (String::from_utf8_lossy(bytes), true),
    }
}

pub fn spawn_reader(
    interface: Arc<Mutex<SerialInterface>>,
    observers: ObserverSet,
    auto_reply: AutoReply,
    config: ReaderConfig,
) -> ReaderHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let (metrics_tx, metrics_rx) = watch::channel(ReaderMetrics::default());

    let task = tokio::spawn(reader_task(
        interface,
        observers,
        auto_reply,
        config,
        stop.clone(),
        metrics_tx,
    ));

    ReaderHandle { stop, task, metrics_rx }
}

async fn reader_task(
    interface: Arc<Mutex<SerialInterface>>,
    observers: ObserverSet,
    auto_reply: AutoReply,
    config: ReaderConfig,
    stop: Arc<AtomicBool>,
    metrics_tx: watch::Sender<ReaderMetrics>,
) -> ReaderExit {
    let mut buf = vec![0u8; config.buffer_size.max(1)];
    let mut metrics = ReaderMetrics::default();
    log::debug!("Reader started (poll every {:?})", config.poll_interval);

    let exit = loop {
        if stop.load(Ordering::SeqCst) {
            break ReaderExit::Stopped;
        }

        let read_res = {
            let mut guard = interface.lock().await;
            if !guard.is_connected() {
                break ReaderExit::Closed;
            }
            match guard.read_available(&mut buf).await {
                Err(e) if !matches!(e, SerialError::NotConnected) => {
                    // Record the cause before the port is seen as closed
                    metrics.last_error = Some(format!("Read error: {}", e));
                    let _ = metrics_tx.send(metrics.clone());
                    guard.disconnect();
                    Err(e)
                }
                other => other,
            }
        };

        match read_res {
            Ok(0) => {}
            Ok(n) => {
                // A stop issued during the read wins over delivery
                if stop.load(Ordering::SeqCst) {
                    break ReaderExit::Stopped;
                }

                let (text, lossy) = decode_chunk(&buf[..n]);
                metrics.chunks_read += 1;
                metrics.bytes_read += n as u64;
                if lossy {
                    metrics.utf8_decode_errors += 1;
                    log::warn!("Replaced malformed UTF-8 in {} byte chunk", n);
                }
                let _ = metrics_tx.send(metrics.clone());

                observers.text(&text);
                if stop.load(Ordering::SeqCst) {
                    break ReaderExit::Stopped;
                }
                // Replies are spawned; this never waits on the reply delay
                let _ = auto_reply.handle_chunk(&text).await;
            }
            Err(SerialError::NotConnected) => break ReaderExit::Closed,
            Err(e) => {
                let msg = format!("Read error: {}", e);
                log::error!("{}", msg);
                observers.status(&msg);
                break ReaderExit::Failed(e.to_string());
            }
        }

        sleep(config.poll_interval).await;
    };

    log::debug!("Reader exited: {:?}", exit);
    exit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_passes_valid_text_through() {
        let (text, lossy) = decode_chunk(b"OK\r\n");
        assert_eq!(text, "OK\r\n");
        assert!(!lossy);
    }

    #[test]
    fn decode_replaces_malformed_bytes() {
        let (text, lossy) = decode_chunk(&[b'D', 0xFF, b'!']);
        assert!(lossy);
        assert!(text.starts_with('D'));
        assert!(text.ends_with('!'));
        assert!(text.contains('\u{FFFD}'));
    }
}
