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


use std::fs;
use std::time::Duration;

use busline::config::{BusConfig, WorkerPriority};
use busline::prelude::MessageBus;
use busline_test::prelude::*;
use tempfile::TempDir;

/// Values from a config file override the defaults they name and nothing else.
#[busline_test]
fn custom_file_overrides_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [executor]
        worker_threads = 3
        thread_name_prefix = "bus-worker"
        priority = "normal"

        [timeouts]
        release_join_ms = 750
        "#,
    )?;

    let config = BusConfig::load_from(&path);

    assert_eq!(config.executor.worker_threads, 3);
    assert_eq!(config.executor.thread_name_prefix, "bus-worker");
    assert_eq!(config.executor.priority, WorkerPriority::Normal);
    assert_eq!(config.release_join_timeout(), Duration::from_millis(750));
    assert_eq!(config.dispatcher.thread_name, "busline-dispatch");
    Ok(())
}

/// A file that does not parse falls back to the defaults.
#[busline_test]
fn malformed_file_yields_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[executor\nworker_threads = three")?;

    assert_eq!(BusConfig::load_from(&path), BusConfig::default());
    Ok(())
}

/// A path that does not exist falls back to the defaults.
#[busline_test]
fn missing_file_yields_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let config = BusConfig::load_from(&temp_dir.path().join("absent.toml"));

    assert_eq!(config, BusConfig::default());
    Ok(())
}

/// `load` finds `busline/config.toml` under `XDG_CONFIG_HOME`.
#[busline_test]
fn xdg_directory_resolution() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let config_dir = temp_dir.path().join("busline");
    fs::create_dir_all(&config_dir)?;
    fs::write(
        config_dir.join("config.toml"),
        r#"
        [dispatcher]
        thread_name = "xdg-dispatch"
        "#,
    )?;
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());

    let config = BusConfig::load();

    assert_eq!(config.dispatcher.thread_name, "xdg-dispatch");
    Ok(())
}

/// The bus runs with the configuration it was given.
#[busline_test]
fn bus_reports_its_configuration() -> anyhow::Result<()> {
    let config = BusConfig::from_toml_str("[executor]\nworker_threads = 0")?;
    let bus = MessageBus::with_config(config)?;

    assert_eq!(bus.config().executor.worker_threads, 0);
    bus.release();
    Ok(())
}
