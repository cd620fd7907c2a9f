//! Wire formats understood by the matrix calculator firmware.
//!
//! Each operating mode has its own framing:
//!
//! | Mode     | Payload         | Terminator |
//! |----------|-----------------|------------|
//! | Input    | `M N v1 v2 ...` | `\r`       |
//! | Generate | `MN`            | none       |
//! | Compute  | raw text        | none       |
//! | Settings | `value`         | `\r`       |
//!
//! Everything here is pure; nothing touches the port.

use std::fmt::Display;
use serde::{Deserialize, Serialize};

pub const TERMINATOR: char = '\r';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Input,
    Generate,
    Compute,
    Settings,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Input => "input",
            Mode::Generate => "generate",
            Mode::Compute => "compute",
            Mode::Settings => "settings",
        }
    }
}

/// A user request, still in its raw form as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundCommand {
    Input { rows: String, cols: String, data: String },
    Generate { rows: String, cols: String },
    Compute(String),
    SettingValue(u32),
}

impl OutboundCommand {
    pub fn mode(&self) -> Mode {
        match self {
            OutboundCommand::Input { .. } => Mode::Input,
            OutboundCommand::Generate { .. } => Mode::Generate,
            OutboundCommand::Compute(_) => Mode::Compute,
            OutboundCommand::SettingValue(_) => Mode::Settings,
        }
    }

    /// Produce the exact text the device expects for this command
    pub fn encode(&self) -> Result<String> {
        match self {
            OutboundCommand::Input { rows, cols, data } => encode_input(rows, cols, data),
            OutboundCommand::Generate { rows, cols } => encode_generate(rows, cols),
            OutboundCommand::Compute(cmd) => encode_compute(cmd),
            OutboundCommand::SettingValue(value) => Ok(encode_setting(value)),
        }
    }
}

/// Collapse a multi-line data block onto one line and trim it.
/// A stray `\r` would end the frame early, so it is treated like `\n`.
pub fn normalize_data(data: &str) -> String {
    data.replace(['\r', '\n'], " ").trim().to_string()
}

/// `M N data\r`
pub fn encode_input(rows: &str, cols: &str, data: &str) -> Result<String> {
    let rows = rows.trim();
    let cols = cols.trim();
    let data = normalize_data(data);

    if rows.is_empty() {
        return Err(ValidationError::EmptyField("rows"));
    }
    if cols.is_empty() {
        return Err(ValidationError::EmptyField("cols"));
    }
    if data.is_empty() {
        return Err(ValidationError::EmptyField("data"));
    }

    Ok(format!("{} {} {}{}", rows, cols, data, TERMINATOR))
}

/// `MN`, no separator and no terminator. The firmware reads one digit each.
pub fn encode_generate(rows: &str, cols: &str) -> Result<String> {
    let rows = rows.trim();
    let cols = cols.trim();

    if rows.is_empty() {
        return Err(ValidationError::EmptyField("rows"));
    }
    if cols.is_empty() {
        return Err(ValidationError::EmptyField("cols"));
    }
    if rows.chars().count() != 1 || cols.chars().count() != 1 {
        log::warn!("Generate mode expects single digits, got rows={:?} cols={:?}", rows, cols);
    }

    Ok(format!("{}{}", rows, cols))
}

/// Sent exactly as typed.
pub fn encode_compute(cmd: &str) -> Result<String> {
    if cmd.is_empty() {
        return Err(ValidationError::EmptyField("command"));
    }
    Ok(cmd.to_string())
}

pub fn encode_setting(value: impl Display) -> String {
    format!("{}{}", value, TERMINATOR)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFrame {
    pub rows: String,
    pub cols: String,
    pub values: Vec<String>,
}

impl InputFrame {
    /// Values joined the way they go out on the wire
    pub fn data(&self) -> String {
        self.values.join(" ")
    }
}

/// Split an Input-mode frame back into its parts.
pub fn parse_input_frame(frame: &str) -> Option<InputFrame> {
    let body = frame.strip_suffix(TERMINATOR)?;
    let mut tokens = body.split_whitespace();
    let rows = tokens.next()?.to_string();
    let cols = tokens.next()?.to_string();
    let values: Vec<String> = tokens.map(str::to_string).collect();

    if values.is_empty() {
        return None;
    }

    Some(InputFrame { rows, cols, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_frame_joins_lines_and_trims() {
        let payload = encode_input(" 2", "3 ", "\n1 2 3\n4 5 6\n").unwrap();
        assert_eq!(payload, "2 3 1 2 3 4 5 6\r");
    }

    #[test]
    fn input_rejects_blank_fields() {
        assert_eq!(encode_input("", "2", "1"), Err(ValidationError::EmptyField("rows")));
        assert_eq!(encode_input("2", "  ", "1"), Err(ValidationError::EmptyField("cols")));
        assert_eq!(encode_input("2", "2", " \n "), Err(ValidationError::EmptyField("data")));
    }

    #[test]
    fn input_frame_parses_back() {
        let payload = encode_input("2", "2", "1 2\n3 4").unwrap();
        let frame = parse_input_frame(&payload).expect("frame");
        assert_eq!(frame.rows, "2");
        assert_eq!(frame.cols, "2");
        assert_eq!(frame.data(), "1 2 3 4");
    }

    #[test]
    fn parse_rejects_unterminated_or_short_frames() {
        assert!(parse_input_frame("2 2 1 2 3 4").is_none());
        assert!(parse_input_frame("2 2\r").is_none());
    }

    #[test]
    fn generate_has_no_separator_or_terminator() {
        assert_eq!(encode_generate("2", "3").unwrap(), "23");
        assert_eq!(encode_generate("", "3"), Err(ValidationError::EmptyField("rows")));
        assert_eq!(encode_generate("2", ""), Err(ValidationError::EmptyField("cols")));
    }

    #[test]
    fn compute_is_verbatim() {
        assert_eq!(encode_compute("A\x03 b\t").unwrap(), "A\x03 b\t");
        assert_eq!(encode_compute("  padded  ").unwrap(), "  padded  ");
        assert!(encode_compute("").is_err());
    }

    #[test]
    fn setting_value_is_cr_terminated() {
        assert_eq!(encode_setting(5), "5\r");
        let cmd = OutboundCommand::SettingValue(12);
        assert_eq!(cmd.mode(), Mode::Settings);
        assert_eq!(cmd.encode().unwrap(), "12\r");
    }
}
