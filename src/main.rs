mod console;

use std::io::Write;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use console::{ConsoleCommand, SettingField};
use matrix_link_lib::serial::interface::DEFAULT_BAUD_RATE;
use matrix_link_lib::serial::{Result as SerialResult, SerialDeviceInfo, SerialInterface};
use matrix_link_lib::{init_logging, DeviceManager, LinkEvent, LinkOptions, SettingsConfig};

/// Terminal control panel for the FPGA matrix calculator
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Serial port (first available if omitted)
    #[arg(short, long)]
    port: Option<String>,

    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// List serial ports and exit
    #[arg(long)]
    list: bool,

    /// Answer the board's setting-mode prompts automatically
    #[arg(long)]
    auto_reply: bool,

    #[arg(long, default_value_t = 5)]
    max_dim: u32,

    #[arg(long, default_value_t = 9)]
    max_value: u32,

    #[arg(long, default_value_t = 2)]
    per_size: u32,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

fn print_event(event: &LinkEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => log::warn!("Could not encode event: {}", e),
        }
        return;
    }

    match event {
        LinkEvent::Text { text, .. } => {
            print!("{}", text);
            let _ = std::io::stdout().flush();
        }
        LinkEvent::Status { message, .. } => println!("\n[{}]", message),
    }
}

/// The named port as given, otherwise the first one discovered.
/// Discovery only runs when no port was named.
fn choose_port<F>(requested: Option<String>, discover: F) -> Result<String>
where
    F: FnOnce() -> SerialResult<Vec<SerialDeviceInfo>>,
{
    if let Some(port) = requested {
        return Ok(port);
    }
    let ports = discover().context("listing serial ports")?;
    match ports.into_iter().next() {
        Some(p) => Ok(p.port_name),
        None => bail!("no serial ports found"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    if args.list {
        let ports = SerialInterface::available_ports().context("listing serial ports")?;
        for port in &ports {
            match (&port.product, port.vid, port.pid) {
                (Some(product), Some(vid), Some(pid)) => {
                    println!("{}  {} ({:04X}:{:04X})", port.port_name, product, vid, pid)
                }
                _ => println!("{}", port.port_name),
            }
        }
        return Ok(());
    }

    let port_name = choose_port(args.port, SerialInterface::available_ports)?;

    let settings = SettingsConfig {
        max_dimension: args.max_dim,
        max_value: args.max_value,
        matrices_per_size: args.per_size,
        auto_reply_enabled: args.auto_reply,
    };
    let manager = Arc::new(DeviceManager::with_options(LinkOptions::default(), settings));

    let mut events = manager.subscribe();
    let json = args.json;
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event, json),
                Err(RecvError::Lagged(n)) => log::warn!("Console fell behind, {} events dropped", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    manager
        .connect(&port_name, args.baud)
        .await
        .with_context(|| format!("connecting to {}", port_name))?;
    eprintln!("{}", console::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match console::parse_line(&line) {
            Ok(c) => c,
            Err(usage) => {
                eprintln!("{}", usage);
                continue;
            }
        };

        match command {
            ConsoleCommand::Send(cmd) => {
                match manager.send(&cmd).await {
                    Ok(()) => {
                        if let Some(echo) = console::input_echo(&cmd) {
                            eprintln!("{}", echo);
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
            ConsoleCommand::Set(field, value) => {
                manager
                    .update_settings(|s| match field {
                        SettingField::MaxDimension => s.max_dimension = value,
                        SettingField::MaxValue => s.max_value = value,
                        SettingField::MatricesPerSize => s.matrices_per_size = value,
                    })
                    .await
            }
            ConsoleCommand::AutoReply(enabled) => manager.set_auto_reply(enabled).await,
            ConsoleCommand::Status => {
                let status = manager.status().await;
                eprintln!("{} | {:?}", status.summary(), manager.settings_snapshot().await);
                if let Some(m) = manager.metrics().await {
                    eprintln!(
                        "read {} chunks, {} bytes, {} decode errors",
                        m.chunks_read, m.bytes_read, m.utf8_decode_errors
                    );
                }
            }
            ConsoleCommand::Quit => break,
            ConsoleCommand::Nothing => {}
        }
    }

    manager.disconnect().await;
    printer.abort();
    Ok(())
}
