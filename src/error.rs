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

use thiserror::Error;

/// Error types for the durable log store (component A)
///
/// `StorageMissing` is deliberately not a variant here: a point get on an
/// absent key is an ordinary `Option::None`, not a failure.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("storage directory busy: {0}")]
	Busy(String),
	#[error("storage I/O error: {0}")]
	Io(String),
	#[error("record encoding error: {0}")]
	Encoding(String),
}

impl From<sled::Error> for StorageError {
	fn from(e: sled::Error) -> Self {
		match e {
			sled::Error::Io(io) => StorageError::Io(io.to_string()),
			other => StorageError::Io(other.to_string()),
		}
	}
}

impl From<serde_json::Error> for StorageError {
	fn from(e: serde_json::Error) -> Self {
		StorageError::Encoding(e.to_string())
	}
}

/// Error taxonomy for the matching engine, per the propagation policy:
/// `Invalid*`/`Unknown*` never reach here (they surface as book listener
/// events); only `Storage*`/`Broadcast*`/`Replay*` propagate to the caller
/// of a public engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("storage I/O failure: {0}")]
	StorageIo(String),

	#[error("storage busy: {0}")]
	StorageBusy(String),

	#[error("broadcast failed for inbound seq {0}")]
	BroadcastFailed(u64),

	#[error("replay mismatch: {0}")]
	ReplayMismatch(String),
}

impl From<StorageError> for EngineError {
	fn from(e: StorageError) -> Self {
		match e {
			StorageError::Busy(msg) => EngineError::StorageBusy(msg),
			StorageError::Io(msg) => EngineError::StorageIo(msg),
			StorageError::Encoding(msg) => EngineError::StorageIo(msg),
		}
	}
}
