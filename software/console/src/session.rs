// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <session.rs>

//! State shared by the input and receive loops for one console session.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Whose turn it is to use the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The operator may type the next message.
    Input,
    /// A message went out; waiting for the device to answer.
    Receive,
}

/// Single-slot turn token handed back and forth between the two loops.
#[derive(Debug)]
pub struct TurnGate {
    tx: watch::Sender<Turn>,
}

impl TurnGate {
    pub fn new(initial: Turn) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Turn {
        *self.tx.borrow()
    }

    /// Resolves once it is the operator's turn.
    pub async fn wait_for_input(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|turn| *turn == Turn::Input).await;
    }

    /// Called by the input loop after it has sent something.
    pub fn pass_to_receiver(&self) {
        self.tx.send_replace(Turn::Receive);
    }

    /// Called by the receive loop on every non-empty line. Returns `true` if
    /// this re-armed the input loop.
    pub fn pass_to_input(&self) -> bool {
        self.tx.send_if_modified(|turn| {
            if *turn == Turn::Receive {
                *turn = Turn::Input;
                true
            } else {
                false
            }
        })
    }
}

/// Constructed once at startup and shared by both loops.
#[derive(Debug)]
pub struct Session {
    pub gate: TurnGate,
    pub shutdown: CancellationToken,
    last_received: Mutex<Option<Instant>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            gate: TurnGate::new(Turn::Input),
            shutdown: CancellationToken::new(),
            last_received: Mutex::new(None),
        }
    }

    pub fn mark_received(&self) {
        if let Ok(mut last) = self.last_received.lock() {
            *last = Some(Instant::now());
        }
    }

    pub fn since_last_received(&self) -> Option<Duration> {
        self.last_received
            .lock()
            .ok()
            .and_then(|last| last.map(|t| t.elapsed()))
    }
}
