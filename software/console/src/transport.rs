// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <transport.rs>

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::codec;

pub const BAUDRATE: u32 = 115_200;
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },
    #[error("write failed: {0}")]
    Write(#[from] io::Error),
    #[error("connection is closed")]
    NotOpen,
}

/// An open line-oriented link. The read half is handed out once at
/// construction; the write half is shared behind a lock.
pub struct Connection<S> {
    port: String,
    writer: Mutex<WriteHalf<S>>,
    open: AtomicBool,
}

impl Connection<SerialStream> {
    /// Opens `port` as 8N1 without flow control.
    pub fn open(
        port: &str,
        baud: u32,
        read_timeout: Duration,
    ) -> Result<(Self, ReadHalf<SerialStream>), TransportError> {
        log::info!("Opening \"{}\" at {} baud (8N1, no flow)", port, baud);
        let stream = tokio_serial::new(port, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open_native_async()
            .map_err(|source| TransportError::Open {
                port: port.to_string(),
                source,
            })?;
        Ok(Self::new(port, stream))
    }
}

impl<S: AsyncRead + AsyncWrite> Connection<S> {
    pub fn new(port: &str, stream: S) -> (Self, ReadHalf<S>) {
        let (reader, writer) = tokio::io::split(stream);
        let conn = Self {
            port: port.to_string(),
            writer: Mutex::new(writer),
            open: AtomicBool::new(true),
        };
        (conn, reader)
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Frames `text` as one line and writes it out.
    pub async fn send(&self, text: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        let buf = codec::encode(text);
        let mut writer = self.writer.lock().await;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        log::debug!("[{}] sent {} bytes", self.port, buf.len());
        Ok(())
    }

    /// Shuts the stream down. Only the first call has any effect.
    pub async fn close(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.writer.lock().await.shutdown().await {
            log::warn!("[{}] error while closing: {}", self.port, e);
        }
        log::info!("[{}] connection closed", self.port);
    }
}

/// Names of the serial ports the driver can enumerate.
pub fn available_ports() -> Result<Vec<String>, tokio_serial::Error> {
    Ok(tokio_serial::available_ports()?
        .into_iter()
        .map(|info| info.port_name)
        .collect())
}
