//! Core runtime components of the bus.
//!
//! # Key Re-exported Components:
//!
//! *   [`MessageBus`]: The bus handle used to register handlers, post messages and release.
//! *   [`Bindings`] / [`BindingDecl`]: How a handler type describes its methods.
//! *   [`BusConfig`]: Configuration loaded from XDG-compliant locations.
//!
//! The registry, dispatcher, worker pool and shared state are internal.

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

// --- Public Re-exports ---
pub use binding::{BindingDecl, Bindings, Marking};
pub use bus::MessageBus;
pub use config::{BusConfig, WorkerPriority};

// --- Submodules ---

/// Type aliases shared by the internal components.
mod types;

/// Handler declarations and validated bindings.
mod binding;
/// The public `MessageBus` handle.
mod bus;
/// Shared state and the release protocol.
mod bus_inner;
/// The time-ordered queue and delivery routine.
mod dispatcher;
/// The asynchronous worker pool.
mod executor;
/// Binding and instance tables.
mod registry;
/// Defines the configuration system for the bus.
pub mod config;
