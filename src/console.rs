//! Line commands understood by the terminal front-end
use matrix_link_lib::serial::protocol::parse_input_frame;
use matrix_link_lib::OutboundCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    MaxDimension,
    MaxValue,
    MatricesPerSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Send(OutboundCommand),
    Set(SettingField, u32),
    AutoReply(bool),
    Status,
    Quit,
    Nothing,
}

pub const HELP: &str = "\
commands:
  input M N v1 v2 ...   send a matrix (Input mode)
  gen M N               generate a random M x N matrix
  set dim|val|per <n>   change a setting-mode answer
  auto on|off           toggle automatic answers
  status                show connection and settings
  quit                  disconnect and exit
  > text                send text verbatim
anything else is sent verbatim (Compute mode)";

pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    if line.trim().is_empty() {
        return Ok(ConsoleCommand::Nothing);
    }
    if let Some(raw) = line.strip_prefix('>') {
        return Ok(ConsoleCommand::Send(OutboundCommand::Compute(raw.trim_start().to_string())));
    }

    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    match head {
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        "status" => Ok(ConsoleCommand::Status),
        "input" => {
            let (Some(rows), Some(cols)) = (words.next(), words.next()) else {
                return Err("usage: input M N v1 v2 ...".to_string());
            };
            let data = words.collect::<Vec<_>>().join(" ");
            Ok(ConsoleCommand::Send(OutboundCommand::Input {
                rows: rows.to_string(),
                cols: cols.to_string(),
                data,
            }))
        }
        "gen" => match (words.next(), words.next()) {
            (Some(rows), Some(cols)) => Ok(ConsoleCommand::Send(OutboundCommand::Generate {
                rows: rows.to_string(),
                cols: cols.to_string(),
            })),
            _ => Err("usage: gen M N".to_string()),
        },
        "set" => {
            let field = match words.next() {
                Some("dim") => SettingField::MaxDimension,
                Some("val") => SettingField::MaxValue,
                Some("per") => SettingField::MatricesPerSize,
                _ => return Err("usage: set dim|val|per <n>".to_string()),
            };
            let value = words
                .next()
                .and_then(|v| v.parse::<u32>().ok())
                .ok_or_else(|| "setting values are non-negative integers".to_string())?;
            Ok(ConsoleCommand::Set(field, value))
        }
        "auto" => match words.next() {
            Some("on") => Ok(ConsoleCommand::AutoReply(true)),
            Some("off") => Ok(ConsoleCommand::AutoReply(false)),
            _ => Err("usage: auto on|off".to_string()),
        },
        _ => Ok(ConsoleCommand::Send(OutboundCommand::Compute(line.to_string()))),
    }
}

/// Confirmation line for a matrix that went out, read back from its frame
pub fn input_echo(cmd: &OutboundCommand) -> Option<String> {
    if !matches!(cmd, OutboundCommand::Input { .. }) {
        return None;
    }
    let frame = parse_input_frame(&cmd.encode().ok()?)?;
    Some(format!("sent {}x{} matrix: {}", frame.rows, frame.cols, frame.data()))
}
