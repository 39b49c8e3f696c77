// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <console.rs>

//! Operator input loop, device receive loop and command dispatch.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;
use tokio_stream::StreamExt;
use tokio_util::codec::FramedRead;

use crate::codec::{self, LineCodec};
use crate::game_config::ConfigStore;
use crate::session::Session;
use crate::transport::Connection;

pub const PORT_PROMPT: &str = "Enter the serial port (e.g., /dev/ttyUSB0 or COM3): ";
pub const LOAD_PROMPT: &str = "Enter the path of the config file to load: ";

/// What a line of operator input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Save,
    Load,
    Send,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        if line.eq_ignore_ascii_case("exit") {
            Command::Exit
        } else if line.starts_with("save") {
            Command::Save
        } else if line.starts_with("load") {
            Command::Load
        } else {
            Command::Send
        }
    }
}

/// Reads stdin on a dedicated thread and forwards each line.
///
/// The thread is never joined; it ends with the process or at end of input.
pub fn spawn_stdin_reader() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Error reading operator input: {}", e);
                    break;
                }
            }
        }
        log::debug!("stdin reader finished");
    });
    rx
}

/// Prints `text` without a newline and waits for the next operator line.
pub async fn prompt(lines: &mut UnboundedReceiver<String>, text: &str) -> Option<String> {
    print!("{}", text);
    if let Err(e) = io::stdout().flush() {
        log::debug!("Could not flush prompt: {}", e);
    }
    lines.recv().await
}

/// Forwards operator lines to the device, one per turn.
///
/// Ends on `exit`, at end of input, or when the session shuts down.
pub async fn input_loop<S>(
    session: Arc<Session>,
    conn: Arc<Connection<S>>,
    mut lines: UnboundedReceiver<String>,
    store: ConfigStore,
) where
    S: AsyncRead + AsyncWrite,
{
    loop {
        tokio::select! {
            _ = session.shutdown.cancelled() => break,
            _ = session.gate.wait_for_input() => {}
        }

        let line = tokio::select! {
            _ = session.shutdown.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            log::info!("End of operator input");
            session.shutdown.cancel();
            break;
        };

        match Command::parse(&line) {
            Command::Exit => {
                session.shutdown.cancel();
                break;
            }
            Command::Save => save_config(&store, &line),
            Command::Load => {
                let Some(path) = prompt(&mut lines, LOAD_PROMPT).await else {
                    session.shutdown.cancel();
                    break;
                };
                load_config(&store, Path::new(path.trim()), &conn).await;
            }
            Command::Send => {}
        }

        if let Err(e) = conn.send(&line).await {
            log::warn!("[{}] Failed to send message: {}", conn.port(), e);
        }
        session.gate.pass_to_receiver();
    }
    log::debug!("input loop finished");
}

fn save_config(store: &ConfigStore, line: &str) {
    match store.save(line) {
        Ok(_) => println!("Game configuration saved to {}", store.path().display()),
        Err(e) => log::warn!("Failed to save game configuration: {}", e),
    }
}

async fn load_config<S>(store: &ConfigStore, path: &Path, conn: &Connection<S>)
where
    S: AsyncRead + AsyncWrite,
{
    let config = match store.load(path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::warn!("Config file {} not found", path.display());
            return;
        }
        Err(e) => {
            log::warn!("Failed to load game configuration: {}", e);
            return;
        }
    };
    println!(
        "Loaded game configuration: gameMode={}, playerChoices1={}, playerChoices2={}, playerChoices3={}",
        config.game_mode, config.player_choices1, config.player_choices2, config.player_choices3
    );
    let message = match config.to_message() {
        Ok(message) => message,
        Err(e) => {
            log::warn!("Failed to encode game configuration: {}", e);
            return;
        }
    };
    if let Err(e) = conn.send(&message).await {
        log::warn!("[{}] Failed to send game configuration: {}", conn.port(), e);
    }
}

/// Prints every non-empty line the device sends and hands the turn back to
/// the operator. Returns the output sink once the session ends.
pub async fn receive_loop<R, W>(
    session: Arc<Session>,
    port: String,
    reader: R,
    read_timeout: Duration,
    mut out: W,
) -> W
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frames = FramedRead::new(reader, LineCodec::new());

    while !session.shutdown.is_cancelled() {
        let next = tokio::select! {
            _ = session.shutdown.cancelled() => break,
            next = timeout(read_timeout, frames.next()) => next,
        };
        let line = match next {
            // Timed out: whatever arrived without a newline is the line.
            Err(_) => {
                let pending = frames.read_buffer_mut().split();
                if pending.is_empty() {
                    continue;
                }
                codec::decode(&pending)
            }
            Ok(None) => {
                log::info!("[{}] Link closed by the device", port);
                session.shutdown.cancel();
                break;
            }
            Ok(Some(Err(e))) => {
                log::warn!("[{}] Read error: {}", port, e);
                // A framed reader stays terminated after an error.
                frames = FramedRead::new(frames.into_inner(), LineCodec::new());
                tokio::select! {
                    _ = session.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(read_timeout) => continue,
                }
            }
            Ok(Some(Ok(line))) => line,
        };
        if line.is_empty() {
            continue;
        }

        if let Err(e) = write_line(&mut out, &line).await {
            log::warn!("Failed to print received line: {}", e);
        }
        session.mark_received();
        if session.gate.pass_to_input() {
            log::debug!("[{}] Turn returned to operator", port);
        }
    }
    log::debug!("receive loop finished");
    out
}

async fn write_line<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
