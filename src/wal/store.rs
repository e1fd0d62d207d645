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

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use crate::error::StorageError;

/// The three logical keyspaces the durable log store exposes. They are
/// physically separate `sled` trees so that an inbound-only scan (used by
/// `replay_inbound`) never has to filter out "out"/"snap" rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyspace {
	In,
	Out,
	Snap,
}

impl Keyspace {
	fn tree_name(self) -> &'static [u8] {
		match self {
			Keyspace::In => b"in",
			Keyspace::Out => b"out",
			Keyspace::Snap => b"snap",
		}
	}
}

/// Fixed-width big-endian encoding so lexicographic byte ordering matches
/// numeric ordering. The original C++ implementation keyed rows with
/// `std::to_string(seq)`, which sorts "10" before "2"; every iteration and
/// seek in this crate relies on the corrected encoding instead.
pub fn encode_key(seq: u64) -> [u8; 8] {
	seq.to_be_bytes()
}

pub fn decode_key(bytes: &[u8]) -> u64 {
	let mut buf = [0u8; 8];
	buf.copy_from_slice(bytes);
	u64::from_be_bytes(buf)
}

/// Durable append/lookup/range-scan store backing the WAL manager
/// (component A of the spec). A production engine uses exactly one
/// `LogStore` for its whole lifetime, opened exclusively against one
/// on-disk directory.
pub trait LogStore: Send {
	fn put(&self, space: Keyspace, seq: u64, value: &[u8]) -> Result<(), StorageError>;
	fn get(&self, space: Keyspace, seq: u64) -> Result<Option<Vec<u8>>, StorageError>;
	fn contains(&self, space: Keyspace, seq: u64) -> Result<bool, StorageError>;
	/// Ascending scan of `space` starting at `from` (inclusive).
	fn scan_from(&self, space: Keyspace, from: u64) -> Result<Vec<(u64, Vec<u8>)>, StorageError>;
	/// Highest key present in `space`, if any.
	fn last_key(&self, space: Keyspace) -> Result<Option<u64>, StorageError>;
}

/// Production `LogStore` backed by an embedded `sled` database. Opening a
/// `sled::Db` takes an exclusive file lock on `path`, so a second process
/// attempting to open the same directory gets `sled::Error::Io` (mapped to
/// `StorageError::Busy` by the caller via `open`) rather than silently
/// corrupting the log.
pub struct SledLogStore {
	in_tree: sled::Tree,
	out_tree: sled::Tree,
	snap_tree: sled::Tree,
}

impl SledLogStore {
	pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
		let db = sled::open(path.as_ref()).map_err(|e| match e {
			sled::Error::Io(io) if io.kind() == std::io::ErrorKind::WouldBlock => {
				StorageError::Busy(format!("{} is locked by another process", path.as_ref().display()))
			}
			other => StorageError::from(other),
		})?;
		Ok(SledLogStore {
			in_tree: db.open_tree(Keyspace::In.tree_name())?,
			out_tree: db.open_tree(Keyspace::Out.tree_name())?,
			snap_tree: db.open_tree(Keyspace::Snap.tree_name())?,
		})
	}

	fn tree(&self, space: Keyspace) -> &sled::Tree {
		match space {
			Keyspace::In => &self.in_tree,
			Keyspace::Out => &self.out_tree,
			Keyspace::Snap => &self.snap_tree,
		}
	}
}

impl LogStore for SledLogStore {
	fn put(&self, space: Keyspace, seq: u64, value: &[u8]) -> Result<(), StorageError> {
		self.tree(space).insert(encode_key(seq), value)?;
		self.tree(space).flush()?;
		Ok(())
	}

	fn get(&self, space: Keyspace, seq: u64) -> Result<Option<Vec<u8>>, StorageError> {
		Ok(self.tree(space).get(encode_key(seq))?.map(|v| v.to_vec()))
	}

	fn contains(&self, space: Keyspace, seq: u64) -> Result<bool, StorageError> {
		Ok(self.tree(space).contains_key(encode_key(seq))?)
	}

	fn scan_from(&self, space: Keyspace, from: u64) -> Result<Vec<(u64, Vec<u8>)>, StorageError> {
		let mut out = Vec::new();
		for item in self.tree(space).range(encode_key(from)..) {
			let (k, v) = item?;
			out.push((decode_key(&k), v.to_vec()));
		}
		Ok(out)
	}

	fn last_key(&self, space: Keyspace) -> Result<Option<u64>, StorageError> {
		Ok(self.tree(space).last()?.map(|(k, _)| decode_key(&k)))
	}
}

impl<S: LogStore + Sync + ?Sized> LogStore for &S {
	fn put(&self, space: Keyspace, seq: u64, value: &[u8]) -> Result<(), StorageError> {
		(**self).put(space, seq, value)
	}
	fn get(&self, space: Keyspace, seq: u64) -> Result<Option<Vec<u8>>, StorageError> {
		(**self).get(space, seq)
	}
	fn contains(&self, space: Keyspace, seq: u64) -> Result<bool, StorageError> {
		(**self).contains(space, seq)
	}
	fn scan_from(&self, space: Keyspace, from: u64) -> Result<Vec<(u64, Vec<u8>)>, StorageError> {
		(**self).scan_from(space, from)
	}
	fn last_key(&self, space: Keyspace) -> Result<Option<u64>, StorageError> {
		(**self).last_key(space)
	}
}

/// In-memory fake used by unit/property tests that don't need to exercise
/// actual durability (e.g. matching-logic tests), so they don't pay for a
/// `sled` directory per test.
#[derive(Default)]
pub struct MemoryLogStore {
	inbound: Mutex<BTreeMap<u64, Vec<u8>>>,
	outbound: Mutex<BTreeMap<u64, Vec<u8>>>,
	snapshots: Mutex<BTreeMap<u64, Vec<u8>>>,
}

impl MemoryLogStore {
	pub fn new() -> Self {
		MemoryLogStore::default()
	}

	fn map(&self, space: Keyspace) -> &Mutex<BTreeMap<u64, Vec<u8>>> {
		match space {
			Keyspace::In => &self.inbound,
			Keyspace::Out => &self.outbound,
			Keyspace::Snap => &self.snapshots,
		}
	}
}

impl LogStore for MemoryLogStore {
	fn put(&self, space: Keyspace, seq: u64, value: &[u8]) -> Result<(), StorageError> {
		self.map(space).lock().unwrap().insert(seq, value.to_vec());
		Ok(())
	}

	fn get(&self, space: Keyspace, seq: u64) -> Result<Option<Vec<u8>>, StorageError> {
		Ok(self.map(space).lock().unwrap().get(&seq).cloned())
	}

	fn contains(&self, space: Keyspace, seq: u64) -> Result<bool, StorageError> {
		Ok(self.map(space).lock().unwrap().contains_key(&seq))
	}

	fn scan_from(&self, space: Keyspace, from: u64) -> Result<Vec<(u64, Vec<u8>)>, StorageError> {
		Ok(self
			.map(space)
			.lock()
			.unwrap()
			.range(from..)
			.map(|(k, v)| (*k, v.clone()))
			.collect())
	}

	fn last_key(&self, space: Keyspace) -> Result<Option<u64>, StorageError> {
		Ok(self.map(space).lock().unwrap().keys().next_back().copied())
	}
}
