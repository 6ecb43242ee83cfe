/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Configuration for a [`MessageBus`](crate::common::MessageBus).
///
/// Loaded from `config.toml` in the XDG configuration directory for `busline`.
/// Every section and field is optional; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Asynchronous worker pool settings
    pub executor: ExecutorConfig,
    /// Dispatch thread settings
    pub dispatcher: DispatcherConfig,
    /// Timeout values
    pub timeouts: TimeoutConfig,
    /// Logging destinations used by [`logging::init`](crate::logging::init)
    pub logging: LoggingConfig,
}

/// Worker pool used for asynchronous handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Number of worker threads; `0` is treated as `1`
    pub worker_threads: usize,
    /// Worker threads are named `"{prefix} #{index}"`
    pub thread_name_prefix: String,
    /// Scheduling hint for asynchronous handlers
    pub priority: WorkerPriority,
}

/// Relative scheduling preference of asynchronous handlers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPriority {
    /// Each invocation yields to the scheduler once before it runs.
    #[default]
    Background,
    /// Invocations run as soon as a worker picks them up.
    Normal,
}

/// Dispatch thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Name of the dispatch thread
    pub thread_name: String,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Longest `release` waits for the dispatch thread to exit, in milliseconds
    pub release_join_ms: u64,
}

/// Where log output goes and at which levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level written to the console
    pub console_level: String,
    /// Whether console output is written at all
    pub console_visible: bool,
    /// Directory for a daily rolling log file; no file output when unset
    pub log_directory: Option<PathBuf>,
    /// Minimum level written to the log file
    pub file_level: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            worker_threads: 5,
            thread_name_prefix: "async_handle".to_string(),
            priority: WorkerPriority::Background,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: "busline-dispatch".to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { release_join_ms: 5_000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: "trace".to_string(),
            console_visible: true,
            log_directory: None,
            file_level: "info".to_string(),
        }
    }
}

impl BusConfig {
    /// How long `release` waits for the dispatch thread.
    pub const fn release_join_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.release_join_ms)
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads configuration from the XDG-compliant location.
    ///
    /// Looks for `busline/config.toml` under `$XDG_CONFIG_HOME` (falling back
    /// to `~/.config`). A missing file yields the defaults; an unreadable or
    /// malformed one is logged and also yields the defaults.
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("busline") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        match xdg_dirs.find_config_file("config.toml") {
            Some(path) => Self::load_from(&path),
            None => {
                info!("No configuration file found, using defaults");
                Self::default()
            }
        }
    }

    /// Loads configuration from `path`, falling back to defaults on failure.
    pub fn load_from(path: &Path) -> Self {
        info!("Loading configuration from: {}", path.display());
        match std::fs::read_to_string(path) {
            Ok(config_str) => match Self::from_toml_str(&config_str) {
                Ok(config) => {
                    info!("Successfully loaded configuration");
                    config
                }
                Err(e) => {
                    error!("Failed to parse configuration file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Process-wide configuration loaded from XDG-compliant locations
    pub static ref CONFIG: BusConfig = BusConfig::load();
}
