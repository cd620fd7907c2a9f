use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use serialport::{SerialPort, SerialPortType};

use super::{Connection, Result, SerialDeviceInfo, SerialError};

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Byte-level access to an open port.
///
/// The native implementation wraps a `serialport` handle; tests and
/// simulators plug in their own.
#[async_trait::async_trait]
pub trait SerialPortIO: Send {
    /// Write the whole buffer and flush it to the device.
    async fn send_data(&mut self, data: &[u8]) -> Result<()>;

    /// Copy whatever the device has already sent into `buf`.
    /// Returns `Ok(0)` when nothing is pending.
    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize>;
}

struct NativePort {
    port: Box<dyn SerialPort>,
}

#[async_trait::async_trait]
impl SerialPortIO for NativePort {
    async fn send_data(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(0);
        }

        let want = pending.min(buf.len());
        match self.port.read(&mut buf[..want]) {
            Ok(n) => Ok(n),
            Err(ref e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }
}

/// Owns the single connection to the calculator board.
pub struct SerialInterface {
    io: Option<Box<dyn SerialPortIO>>,
    connection: Option<Connection>,
    read_timeout: Duration,
}

impl SerialInterface {
    pub fn new() -> Self {
        Self::with_read_timeout(DEFAULT_READ_TIMEOUT)
    }

    pub fn with_read_timeout(read_timeout: Duration) -> Self {
        Self {
            io: None,
            connection: None,
            read_timeout,
        }
    }

    /// List the serial ports present on this machine
    pub fn available_ports() -> Result<Vec<SerialDeviceInfo>> {
        let ports = serialport::available_ports()?;

        Ok(ports
            .into_iter()
            .map(|port| match port.port_type {
                SerialPortType::UsbPort(usb_info) => SerialDeviceInfo {
                    port_name: port.port_name,
                    vid: Some(usb_info.vid),
                    pid: Some(usb_info.pid),
                    manufacturer: usb_info.manufacturer,
                    product: usb_info.product,
                },
                _ => SerialDeviceInfo {
                    port_name: port.port_name,
                    vid: None,
                    pid: None,
                    manufacturer: None,
                    product: None,
                },
            })
            .collect())
    }

    /// Open `port_name` at `baud_rate`
    pub fn connect(&mut self, port_name: &str, baud_rate: u32) -> Result<Connection> {
        if self.is_connected() {
            return Err(SerialError::AlreadyConnected);
        }
        if baud_rate == 0 {
            return Err(SerialError::ConnectionFailed("baud rate must be positive".to_string()));
        }

        let port = serialport::new(port_name, baud_rate)
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| SerialError::ConnectionFailed(format!("{}: {}", port_name, e)))?;

        self.attach(Box::new(NativePort { port }), port_name, baud_rate)
    }

    /// Adopt an already-open port implementation as the current connection
    pub fn attach(&mut self, io: Box<dyn SerialPortIO>, port_name: &str, baud_rate: u32) -> Result<Connection> {
        if self.is_connected() {
            return Err(SerialError::AlreadyConnected);
        }

        let connection = Connection {
            port_name: port_name.to_string(),
            baud_rate,
            opened_at: chrono::Utc::now(),
        };
        self.io = Some(io);
        self.connection = Some(connection.clone());

        log::info!("Connected to {} at {} baud", port_name, baud_rate);
        Ok(connection)
    }

    /// Close the port. Safe to call when nothing is open.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            log::info!("Disconnecting from {}", connection.port_name);
        }
        self.io = None;
    }

    pub fn is_connected(&self) -> bool {
        self.io.is_some()
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// Send data to the connected device
    pub async fn send_data(&mut self, data: &[u8]) -> Result<()> {
        let io = self.io.as_mut().ok_or(SerialError::NotConnected)?;
        io.send_data(data).await
    }

    /// Drain pending inbound bytes into `buf`
    pub async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let io = self.io.as_mut().ok_or(SerialError::NotConnected)?;
        io.read_available(buf).await
    }
}

impl Default for SerialInterface {
    fn default() -> Self {
        Self::new()
    }
}
