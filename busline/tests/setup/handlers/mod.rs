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


//! Handler types shared by the integration tests.

mod faulty;
mod gate;
mod recorder;
mod releaser;
mod threaded;

pub use faulty::*;
pub use gate::Gate;
pub use recorder::*;
pub use releaser::{PostsOnDrop, PostsOnDropPayload, Releaser};
pub use threaded::*;

/// Name of the thread running the caller.
pub fn thread_name() -> String {
    std::thread::current().name().unwrap_or("<unnamed>").to_string()
}
