//! Answers the calculator's setting-mode prompts.
//!
//! While in setting mode the board prints a single letter asking for the
//! next value: `D` (max dimension), `V` (max value), `M` (matrices per size),
//! and finally `S` once it has stored everything. Each chunk is scanned on
//! its own; when several letters are present only the first in that order is
//! acted on.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::protocol::encode_setting;
use super::types::ObserverSet;
use super::{Result, SerialError, SerialInterface};
use crate::config::{SettingsConfig, SharedSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    MaxDimension,
    MaxValue,
    MatricesPerSize,
    Success,
}

impl Prompt {
    /// Match order, first hit wins
    pub const PRIORITY: [Prompt; 4] = [
        Prompt::MaxDimension,
        Prompt::MaxValue,
        Prompt::MatricesPerSize,
        Prompt::Success,
    ];

    pub fn marker(self) -> char {
        match self {
            Prompt::MaxDimension => 'D',
            Prompt::MaxValue => 'V',
            Prompt::MatricesPerSize => 'M',
            Prompt::Success => 'S',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Prompt::MaxDimension => "Max Dim",
            Prompt::MaxValue => "Max Val",
            Prompt::MatricesPerSize => "Mat Per Size",
            Prompt::Success => "Configuration",
        }
    }

    pub fn detect(text: &str) -> Option<Prompt> {
        Self::PRIORITY
            .into_iter()
            .find(|prompt| text.contains(prompt.marker()))
    }

    /// The configured answer, or `None` for the terminal `S` marker
    pub fn reply_value(self, settings: &SettingsConfig) -> Option<u32> {
        match self {
            Prompt::MaxDimension => Some(settings.max_dimension),
            Prompt::MaxValue => Some(settings.max_value),
            Prompt::MatricesPerSize => Some(settings.matrices_per_size),
            Prompt::Success => None,
        }
    }
}

/// A delayed answer that is already on its way.
pub struct ScheduledReply {
    pub prompt: Prompt,
    pub value: u32,
    task: JoinHandle<Result<()>>,
}

impl ScheduledReply {
    /// Wait for the write and return how it went
    pub async fn outcome(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(SerialError::TaskAborted(e.to_string())),
        }
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

pub enum AutoReplyOutcome {
    Disabled,
    NoPrompt,
    Scheduled(ScheduledReply),
    Configured,
}

#[derive(Clone)]
pub struct AutoReply {
    interface: Arc<Mutex<SerialInterface>>,
    settings: SharedSettings,
    observers: ObserverSet,
    delay: Duration,
}

impl AutoReply {
    pub fn new(
        interface: Arc<Mutex<SerialInterface>>,
        settings: SharedSettings,
        observers: ObserverSet,
        delay: Duration,
    ) -> Self {
        Self { interface, settings, observers, delay }
    }

    /// Inspect one decoded chunk. Never waits for the reply itself.
    pub async fn handle_chunk(&self, text: &str) -> AutoReplyOutcome {
        let settings = *self.settings.read().await;
        if !settings.auto_reply_enabled {
            return AutoReplyOutcome::Disabled;
        }

        let Some(prompt) = Prompt::detect(text) else {
            return AutoReplyOutcome::NoPrompt;
        };

        match prompt.reply_value(&settings) {
            Some(value) => AutoReplyOutcome::Scheduled(self.schedule(prompt, value)),
            None => {
                log::info!("Device reported configuration stored");
                self.observers.status("[Auto] Configuration Success!");
                AutoReplyOutcome::Configured
            }
        }
    }

    fn schedule(&self, prompt: Prompt, value: u32) -> ScheduledReply {
        let interface = self.interface.clone();
        let observers = self.observers.clone();
        let delay = self.delay;
        log::debug!("Prompt '{}' seen, replying {} in {:?}", prompt.marker(), value, delay);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let payload = encode_setting(value);
            let result = {
                let mut guard = interface.lock().await;
                guard.send_data(payload.as_bytes()).await
            };

            match &result {
                Ok(()) => observers.status(&format!("[Auto] Sent {}: {}", prompt.label(), value)),
                Err(e) => {
                    log::warn!("Auto-reply for '{}' failed: {}", prompt.marker(), e);
                    observers.status(&format!("[Auto] Failed to send {}: {}", prompt.label(), e));
                }
            }
            result
        });

        ScheduledReply { prompt, value, task }
    }
}
