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

//! Durable single-symbol limit order book.
//!
//! A [`MatchingEngine`] owns an in-memory [`OrderBook`] and a durable WAL
//! ([`WalManager`] over a [`LogStore`]). Every inbound command is appended
//! to the log before it is applied, so a crash at any point leaves enough
//! on disk for [`MatchingEngine::new`] to reconstruct exactly the state
//! that existed immediately before the crash: recovery rebuilds the book
//! from the latest snapshot and replays every record after it, without
//! re-broadcasting any event externally.

pub mod book;
pub mod broadcaster;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod types;
pub mod wal;

pub use book::{BookListener, Fill, OrderBook};
pub use broadcaster::{Broadcaster, NullBroadcaster, RecordingBroadcaster};
pub use config::MatchingConfig;
pub use engine::MatchingEngine;
pub use error::{EngineError, StorageError};
pub use logging::init_tracing;
pub use types::{
	AddPayload, BookSnapshot, CancelPayload, Command, Order, Side, SnapshotEntry, StoredSnapshot,
	WalRecord,
};
pub use wal::{Keyspace, LogStore, MemoryLogStore, SledLogStore, WalManager};
