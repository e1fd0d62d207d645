// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logging initialization for embedding binaries.
//!
//! This crate itself only emits `tracing` events (see the `target: "engine"`
//! / `"wal"` / `"book"` / `"recovery"` / `"snapshotter"` conventions used
//! throughout); it is up to whatever binary embeds the engine to install a
//! subscriber. `init_tracing` is a minimal default for that purpose, reading
//! `RUST_LOG` the same way the rest of this corpus's logging setup does.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` (default
/// `info`). Intended for an embedding binary's startup path; idempotent
/// (a second call is a silent no-op) so it is also safe to call from tests
/// that want readable output.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
