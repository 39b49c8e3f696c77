// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <main.rs>

mod app;
mod codec;
mod console;
mod game_config;
mod logging;
mod session;
mod settings;
mod transport;

use clap::Parser;
use tokio::signal;

use crate::console::{prompt, spawn_stdin_reader, PORT_PROMPT};
use crate::game_config::ConfigStore;
use crate::settings::Cli;
use crate::transport::available_ports;
use logging::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_ports {
        match available_ports() {
            Ok(ports) if ports.is_empty() => println!("No serial ports found"),
            Ok(ports) => ports.iter().for_each(|p| println!("{}", p)),
            Err(e) => {
                log::error!("Could not enumerate serial ports: {}", e);
                std::process::exit(app::EXIT_OPEN_FAILED);
            }
        }
        return;
    }

    let mut lines = spawn_stdin_reader();
    let port = match cli.port.clone() {
        Some(port) => port,
        None => match prompt(&mut lines, PORT_PROMPT).await {
            Some(port) => port.trim().to_string(),
            None => return,
        },
    };

    let code = app::open_and_run(
        &port,
        lines,
        ConfigStore::new(&cli.config_path),
        tokio::io::stdout(),
        signal::ctrl_c(),
    )
    .await;
    // The stdin thread may still be blocked on a read.
    std::process::exit(code);
}
