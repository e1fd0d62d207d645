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

use std::sync::Mutex;

use serde_json::Value;

/// The engine's sole egress point for externally-visible events (accepts,
/// fills, cancels, trades). A return of `false` means the downstream
/// transport rejected or could not deliver the message; unlike the
/// original implementation, which treated that as a silently-dropped
/// message, this crate's engine maps it to `EngineError::BroadcastFailed`
/// and refuses to mark the originating command processed, so a restart
/// will retry the broadcast on replay.
pub trait Broadcaster: Send {
	fn publish(&self, topic: &str, message: &Value) -> bool;
}

/// A `Broadcaster` that always succeeds without doing anything. Useful as
/// a default for an embedding binary that has no egress transport wired up
/// yet, or for any caller that needs a concrete `Broadcaster` value but
/// doesn't care about its output. Replay's own suppression of side effects
/// is handled in `engine::recover` by swapping out the `BookListener`
/// instead, so `NullBroadcaster` is never constructed by the engine itself.
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
	fn publish(&self, _topic: &str, _message: &Value) -> bool {
		true
	}
}

/// Collects every published message in memory, for assertions in tests.
#[derive(Default)]
pub struct RecordingBroadcaster {
	published: Mutex<Vec<(String, Value)>>,
}

impl RecordingBroadcaster {
	pub fn new() -> Self {
		RecordingBroadcaster::default()
	}

	pub fn messages(&self) -> Vec<(String, Value)> {
		self.published.lock().unwrap().clone()
	}
}

impl Broadcaster for RecordingBroadcaster {
	fn publish(&self, topic: &str, message: &Value) -> bool {
		self.published
			.lock()
			.unwrap()
			.push((topic.to_string(), message.clone()));
		true
	}
}
