// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <app.rs>

//! One console session from open to shutdown, reduced to an exit code.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::console::{input_loop, receive_loop};
use crate::game_config::ConfigStore;
use crate::session::Session;
use crate::transport::{BAUDRATE, Connection, READ_TIMEOUT};

pub const EXIT_OK: i32 = 0;
pub const EXIT_OPEN_FAILED: i32 = 1;

/// Opens `port` and runs the session on it.
pub async fn open_and_run<W, I>(
    port: &str,
    lines: UnboundedReceiver<String>,
    store: ConfigStore,
    out: W,
    interrupt: I,
) -> i32
where
    W: AsyncWrite + Unpin + Send + 'static,
    I: Future<Output = io::Result<()>>,
{
    let (conn, reader) = match Connection::open(port, BAUDRATE, READ_TIMEOUT) {
        Ok(opened) => opened,
        Err(e) => {
            log::error!("{}", e);
            return EXIT_OPEN_FAILED;
        }
    };
    println!("Connected to {} at {} baud. Type \"exit\" to quit.", port, BAUDRATE);
    run_session(Arc::new(conn), reader, lines, store, out, interrupt).await
}

/// Runs both loops until `exit`, end of input, end of the link or
/// `interrupt`, then closes the connection.
pub async fn run_session<S, R, W, I>(
    conn: Arc<Connection<S>>,
    reader: R,
    lines: UnboundedReceiver<String>,
    store: ConfigStore,
    out: W,
    interrupt: I,
) -> i32
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
    I: Future<Output = io::Result<()>>,
{
    let session = Arc::new(Session::new());

    tokio::spawn(input_loop(Arc::clone(&session), Arc::clone(&conn), lines, store));
    let receiver = tokio::spawn(receive_loop(
        Arc::clone(&session),
        conn.port().to_string(),
        reader,
        READ_TIMEOUT,
        out,
    ));

    tokio::select! {
        _ = session.shutdown.cancelled() => {}
        res = interrupt => match res {
            Ok(()) => {
                log::info!("Ctrl+C received, shutting down");
                session.shutdown.cancel();
            }
            Err(e) => {
                log::warn!("Cannot listen for Ctrl+C: {}", e);
                session.shutdown.cancelled().await;
            }
        },
    }
    log::debug!("Shutting down on {:?} turn", session.gate.current());
    if let Some(idle) = session.since_last_received() {
        log::debug!("Last line received {:?} ago", idle);
    }

    if let Err(e) = receiver.await {
        log::warn!("Receive loop ended abnormally: {}", e);
    }
    if conn.is_open() {
        conn.close().await;
    }
    println!("Exit!");
    EXIT_OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn link() -> (Arc<Connection<DuplexStream>>, tokio::io::ReadHalf<DuplexStream>, DuplexStream) {
        let (local, device) = tokio::io::duplex(1024);
        let (conn, reader) = Connection::new("test", local);
        (Arc::new(conn), reader, device)
    }

    #[tokio::test]
    async fn exit_closes_link_and_returns_zero() {
        let (conn, reader, mut device) = link();
        let (input, lines) = mpsc::unbounded_channel();
        input.send("hello".to_string()).unwrap();

        let run = tokio::spawn(run_session(
            Arc::clone(&conn),
            reader,
            lines,
            ConfigStore::default(),
            Vec::new(),
            pending::<io::Result<()>>(),
        ));

        let mut buf = [0u8; 16];
        let n = timeout(WAIT, device.read(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf[..n], b"hello\n");
        device.write_all(b"ok\n").await.unwrap();
        input.send("exit".to_string()).unwrap();

        let code = timeout(WAIT, run).await.expect("session should end").unwrap();
        assert_eq!(code, EXIT_OK);
        assert!(!conn.is_open());

        // Closed exactly once: nothing after "hello", then end of stream.
        let mut rest = Vec::new();
        device.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn interrupt_closes_link_and_returns_zero() {
        let (conn, reader, mut device) = link();
        let (_input, lines) = mpsc::unbounded_channel();

        let code = timeout(
            WAIT,
            run_session(
                Arc::clone(&conn),
                reader,
                lines,
                ConfigStore::default(),
                Vec::new(),
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<(), io::Error>(())
                },
            ),
        )
        .await
        .expect("session should end");

        assert_eq!(code, EXIT_OK);
        assert!(!conn.is_open());
        let mut rest = Vec::new();
        device.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn device_hangup_ends_session() {
        let (conn, reader, device) = link();
        let (_input, lines) = mpsc::unbounded_channel();
        drop(device);

        let code = timeout(
            WAIT,
            run_session(
                Arc::clone(&conn),
                reader,
                lines,
                ConfigStore::default(),
                Vec::new(),
                pending::<io::Result<()>>(),
            ),
        )
        .await
        .expect("session should end");
        assert_eq!(code, EXIT_OK);
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn open_failure_returns_one() {
        let (_input, lines) = mpsc::unbounded_channel();
        let code = open_and_run(
            "/dev/does-not-exist-42",
            lines,
            ConfigStore::default(),
            Vec::new(),
            pending::<io::Result<()>>(),
        )
        .await;
        assert_eq!(code, EXIT_OPEN_FAILED);
    }
}
