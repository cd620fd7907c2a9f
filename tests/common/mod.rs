#![allow(dead_code)]
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use matrix_link_lib::serial::{Observer, SerialError, SerialPortIO};

#[derive(Default)]
pub struct PortState {
    pub inbound: VecDeque<Vec<u8>>,
    pub written: Vec<Vec<u8>>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

/// In-memory stand-in for the calculator board.
#[derive(Clone, Default)]
pub struct ScriptedPort {
    pub state: Arc<Mutex<PortState>>,
}

impl ScriptedPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn SerialPortIO> {
        Box::new(self.clone())
    }

    /// Queue bytes as if the board had just sent them
    pub fn push(&self, bytes: &[u8]) {
        self.state.lock().unwrap().inbound.push_back(bytes.to_vec());
    }

    pub fn written(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .written
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn fail_reads(&self) {
        self.state.lock().unwrap().fail_reads = true;
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }
}

#[async_trait::async_trait]
impl SerialPortIO for ScriptedPort {
    async fn send_data(&mut self, data: &[u8]) -> Result<(), SerialError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(SerialError::IoError(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged")));
        }
        state.written.push(data.to_vec());
        Ok(())
    }

    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(SerialError::IoError(std::io::Error::new(std::io::ErrorKind::Other, "device gone")));
        }
        let Some(mut chunk) = state.inbound.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            state.inbound.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

/// Observer that remembers everything it was told
#[derive(Default)]
pub struct Recorder {
    pub texts: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

impl Observer for Recorder {
    fn on_text(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }

    fn on_status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }
}

/// Poll `check` until it holds or `limit` passes
pub async fn wait_for<F: Fn() -> bool>(limit: Duration, check: F) -> bool {
    let start = Instant::now();
    while start.elapsed() < limit {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
