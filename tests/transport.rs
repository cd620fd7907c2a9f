mod common;

use common::ScriptedPort;
use matrix_link_lib::serial::{SerialError, SerialInterface};

#[test]
fn missing_port_fails_to_connect() {
    let mut interface = SerialInterface::new();
    let err = interface.connect("/dev/matrix-link-does-not-exist", 115200).unwrap_err();
    assert!(matches!(err, SerialError::ConnectionFailed(_)), "got {err:?}");
    assert!(!interface.is_connected());
}

#[test]
fn zero_baud_is_rejected() {
    let mut interface = SerialInterface::new();
    assert!(matches!(interface.connect("COM3", 0), Err(SerialError::ConnectionFailed(_))));
}

#[test]
fn only_one_connection_at_a_time() {
    let mut interface = SerialInterface::new();
    interface.attach(ScriptedPort::new().boxed(), "COM3", 115200).unwrap();
    let err = interface.attach(ScriptedPort::new().boxed(), "COM4", 9600).unwrap_err();
    assert!(matches!(err, SerialError::AlreadyConnected));
    assert_eq!(interface.connection().unwrap().port_name, "COM3");
}

#[test]
fn disconnect_is_idempotent() {
    let mut interface = SerialInterface::new();
    interface.disconnect();
    interface.attach(ScriptedPort::new().boxed(), "COM3", 115200).unwrap();
    interface.disconnect();
    interface.disconnect();
    assert!(!interface.is_connected());
    assert!(interface.connection().is_none());
}

#[tokio::test]
async fn write_while_disconnected_is_an_error() {
    let mut interface = SerialInterface::new();
    let err = interface.send_data(b"23").await.unwrap_err();
    assert!(matches!(err, SerialError::NotConnected));

    let mut buf = [0u8; 8];
    assert!(matches!(interface.read_available(&mut buf).await, Err(SerialError::NotConnected)));
}

#[tokio::test]
async fn read_returns_empty_when_idle() {
    let port = ScriptedPort::new();
    let mut interface = SerialInterface::new();
    interface.attach(port.boxed(), "COM3", 115200).unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(interface.read_available(&mut buf).await.unwrap(), 0);

    port.push(b"RESULT");
    assert_eq!(interface.read_available(&mut buf).await.unwrap(), 4);
    assert_eq!(&buf, b"RESU");
    assert_eq!(interface.read_available(&mut buf).await.unwrap(), 2);
    assert_eq!(&buf[..2], b"LT");
}

#[tokio::test]
async fn write_failures_surface() {
    let port = ScriptedPort::new();
    let mut interface = SerialInterface::new();
    interface.attach(port.boxed(), "COM3", 115200).unwrap();
    port.fail_writes();
    assert!(matches!(interface.send_data(b"1\r").await, Err(SerialError::IoError(_))));
}
