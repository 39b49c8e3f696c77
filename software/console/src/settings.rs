// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <settings.rs>

use std::path::PathBuf;

use clap::Parser;

use crate::game_config::DEFAULT_CONFIG_PATH;

/// Interactive line console for a serial device.
///
/// Type a line to send it. `save [mode]` stores a game configuration,
/// `load` sends one to the device, `exit` quits.
#[derive(Debug, Parser)]
#[command(name = "serial-console", version)]
pub struct Cli {
    /// Serial device to open. Asked for interactively when omitted.
    #[arg(long, env = "SERIAL_CONSOLE_PORT")]
    pub port: Option<String>,

    /// Where `save` writes the game configuration.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, env = "SERIAL_CONSOLE_CONFIG_PATH")]
    pub config_path: PathBuf,

    /// Print the serial ports found on this machine and exit.
    #[arg(long)]
    pub list_ports: bool,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
