// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/
//
// Filename: <game_config.rs>

//! Persisted game configuration, stored as flat JSON.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/game_config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(rename = "gameMode", default)]
    pub game_mode: i64,
    #[serde(rename = "playerChoices1", default = "default_choice_1")]
    pub player_choices1: String,
    #[serde(rename = "playerChoices2", default = "default_choice_2")]
    pub player_choices2: String,
    #[serde(rename = "playerChoices3", default = "default_choice_3")]
    pub player_choices3: String,
}

fn default_choice_1() -> String {
    "Rock".to_string()
}
fn default_choice_2() -> String {
    "Paper".to_string()
}
fn default_choice_3() -> String {
    "Scissors".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game_mode: 0,
            player_choices1: default_choice_1(),
            player_choices2: default_choice_2(),
            player_choices3: default_choice_3(),
        }
    }
}

impl GameConfig {
    /// Builds a fresh record from a `save [mode]` command line.
    ///
    /// The mode is taken only when the command has exactly two tokens and the
    /// second is made of ASCII digits. Player choices are always the defaults.
    pub fn from_save_command(raw: &str) -> Self {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let game_mode = match tokens.as_slice() {
            [_, mode] if !mode.is_empty() && mode.bytes().all(|b| b.is_ascii_digit()) => {
                mode.parse().unwrap_or(0)
            }
            _ => 0,
        };
        Self {
            game_mode,
            ..Self::default()
        }
    }

    /// Single-line JSON in `{"key": value, ...}` form, as sent over the link.
    pub fn to_message(&self) -> Result<String, ConfigError> {
        let mut ser = Serializer::with_formatter(Vec::new(), SpacedFormatter);
        self.serialize(&mut ser)?;
        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&ser.into_inner()).into_owned())
    }
}

/// Compact JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Reads and writes [`GameConfig`] files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the record described by `raw_command` to the store path,
    /// replacing whatever was there.
    pub fn save(&self, raw_command: &str) -> Result<GameConfig, ConfigError> {
        let config = GameConfig::from_save_command(raw_command);
        let io_err = |source| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut ser = Serializer::with_formatter(Vec::new(), PrettyFormatter::with_indent(b"    "));
        config.serialize(&mut ser)?;
        fs::write(&self.path, ser.into_inner()).map_err(io_err)?;

        log::debug!("Saved {:?} to {}", config, self.path.display());
        Ok(config)
    }

    /// Reads a record from `path`, or from the store path when `path` is empty.
    ///
    /// Returns `Ok(None)` when the file does not exist. Missing fields take
    /// their defaults.
    pub fn load(&self, path: &Path) -> Result<Option<GameConfig>, ConfigError> {
        let path = if path.as_os_str().is_empty() { self.path.as_path() } else { path };
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }
}
