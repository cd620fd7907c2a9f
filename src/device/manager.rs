use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::config::{LinkOptions, SettingsConfig, SharedSettings};
use crate::serial::{
    spawn_reader, AutoReply, EventChannel, LinkEvent, Observer, ObserverSet, OutboundCommand,
    ReaderConfig, ReaderHandle, ReaderMetrics, SerialInterface, SerialPortIO,
};
use super::{Connection, ConnectionState, DeviceError, LinkStatus, Result};

/// Foreground control surface for the calculator board.
/// Handles connection lifecycle, outbound commands and the shared settings.
pub struct DeviceManager {
    interface: Arc<Mutex<SerialInterface>>,
    settings: SharedSettings,
    observers: ObserverSet,
    events: EventChannel,
    reader: Mutex<Option<ReaderHandle>>,
    options: LinkOptions,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::with_options(LinkOptions::default(), SettingsConfig::default())
    }

    pub fn with_options(options: LinkOptions, settings: SettingsConfig) -> Self {
        let observers = ObserverSet::new();
        let events = EventChannel::new(options.event_capacity);
        observers.add(Arc::new(events.clone()));

        Self {
            interface: Arc::new(Mutex::new(SerialInterface::with_read_timeout(options.read_timeout))),
            settings: settings.shared(),
            observers,
            events,
            reader: Mutex::new(None),
            options,
        }
    }

    /// Register another consumer of inbound text and status lines
    pub fn add_observer(&self, observer: Arc<dyn Observer>) {
        self.observers.add(observer);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.events.subscribe()
    }

    /// Open a serial port and start reading from it
    pub async fn connect(&self, port_name: &str, baud_rate: u32) -> Result<Connection> {
        let connection = {
            let mut guard = self.interface.lock().await;
            if guard.is_connected() {
                return Err(DeviceError::AlreadyConnected);
            }
            guard.connect(port_name, baud_rate).map_err(|e| {
                log::error!("Connection to {} failed: {}", port_name, e);
                DeviceError::Connection(e)
            })?
        };

        self.start_reader(&connection).await;
        Ok(connection)
    }

    /// Same as `connect`, over a caller-supplied port implementation
    pub async fn connect_with_io(
        &self,
        io: Box<dyn SerialPortIO>,
        port_name: &str,
        baud_rate: u32,
    ) -> Result<Connection> {
        let connection = {
            let mut guard = self.interface.lock().await;
            if guard.is_connected() {
                return Err(DeviceError::AlreadyConnected);
            }
            guard.attach(io, port_name, baud_rate).map_err(DeviceError::Connection)?
        };

        self.start_reader(&connection).await;
        Ok(connection)
    }

    async fn start_reader(&self, connection: &Connection) {
        let auto_reply = AutoReply::new(
            self.interface.clone(),
            self.settings.clone(),
            self.observers.clone(),
            self.options.reply_delay,
        );
        let handle = spawn_reader(
            self.interface.clone(),
            self.observers.clone(),
            auto_reply,
            ReaderConfig {
                poll_interval: self.options.poll_interval,
                buffer_size: self.options.read_buffer_size,
            },
        );

        let mut reader = self.reader.lock().await;
        if let Some(previous) = reader.replace(handle) {
            previous.stop();
        }
        drop(reader);

        self.observers.status(&format!("Connected to {} at {}", connection.port_name, connection.baud_rate));
    }

    /// Stop reading and close the port. Does nothing when already closed.
    ///
    /// Returns only after the reader has exited, so no text or auto-reply
    /// status from the old connection reaches observers afterwards.
    pub async fn disconnect(&self) {
        let reader = self.reader.lock().await.take();
        if let Some(reader) = reader {
            reader.stop();
            let exit = reader.join().await;
            log::debug!("Reader joined on disconnect: {:?}", exit);
        }

        let was_open = {
            let mut guard = self.interface.lock().await;
            let open = guard.is_connected();
            guard.disconnect();
            open
        };

        if was_open {
            self.observers.status("Disconnected");
        }
    }

    /// Encode `command` for its mode and write it to the board
    pub async fn send(&self, command: &OutboundCommand) -> Result<()> {
        let payload = command.encode()?;
        log::debug!("TX [{}] {:?}", command.mode().as_str(), payload);

        let mut guard = self.interface.lock().await;
        guard.send_data(payload.as_bytes()).await.map_err(|e| {
            log::error!("Send failed: {}", e);
            DeviceError::Send(e)
        })
    }

    pub async fn is_connected(&self) -> bool {
        self.interface.lock().await.is_connected()
    }

    pub async fn connection_state(&self) -> ConnectionState {
        if self.is_connected().await {
            return ConnectionState::Connected;
        }

        let last_error = match self.reader.lock().await.as_ref() {
            Some(reader) => {
                let metrics = reader.metrics_receiver();
                let last_error = metrics.borrow().last_error.clone();
                last_error
            }
            None => None,
        };
        match last_error {
            Some(msg) => ConnectionState::Error(msg),
            None => ConnectionState::Disconnected,
        }
    }

    pub async fn status(&self) -> LinkStatus {
        let state = self.connection_state().await;
        let connection = self.interface.lock().await.connection().cloned();
        LinkStatus { state, connection }
    }

    /// Counters of the running reader, if one was started
    pub async fn metrics(&self) -> Option<ReaderMetrics> {
        let reader = self.reader.lock().await;
        let metrics = reader.as_ref().map(|r| r.metrics_receiver().borrow().clone());
        metrics
    }

    pub async fn settings_snapshot(&self) -> SettingsConfig {
        *self.settings.read().await
    }

    /// Edit the settings in place; the next prompt sees the new values
    pub async fn update_settings<F>(&self, f: F)
    where
        F: FnOnce(&mut SettingsConfig),
    {
        let mut guard = self.settings.write().await;
        f(&mut guard);
        log::debug!("Settings updated: {:?}", *guard);
    }

    pub async fn set_auto_reply(&self, enabled: bool) {
        self.update_settings(|s| s.auto_reply_enabled = enabled).await;
        log::info!("Auto-reply {}", if enabled { "enabled" } else { "disabled" });
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeviceManager {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.get_mut().take() {
            reader.stop();
        }
        // The reader task may still hold the lock; it will see the stop flag.
        if let Ok(mut guard) = self.interface.try_lock() {
            guard.disconnect();
        }
    }
}
