// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <logging.rs>

use env_logger::Env;

/// Maps the `-v` count to the default filter. `RUST_LOG` still wins.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Diagnostics go to stderr so they stay out of the received-line stream on stdout.
pub fn init_logging(verbosity: u8) {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter(verbosity)))
        .format_timestamp_secs()
        .format_target(false)
        .target(env_logger::Target::Stderr)
        .init();
}
