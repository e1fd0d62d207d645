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

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	pub fn opposite(self) -> Side {
		match self {
			Side::Buy => Side::Sell,
			Side::Sell => Side::Buy,
		}
	}
}

/// A resting or partially-filled order. Price is an integer tick count, not
/// a float: the book never needs to compare fractional prices, and integer
/// keys are what make the `BTreeMap` ordering exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	#[serde(rename = "orderId")]
	pub order_id: u64,
	pub side: Side,
	pub price: i64,
	#[serde(rename = "originalQty")]
	pub original_qty: i64,
	#[serde(rename = "filledQty")]
	pub filled_qty: i64,
}

impl Order {
	pub fn new(order_id: u64, side: Side, price: i64, qty: i64) -> Self {
		Order {
			order_id,
			side,
			price,
			original_qty: qty,
			filled_qty: 0,
		}
	}

	pub fn open_qty(&self) -> i64 {
		self.original_qty - self.filled_qty
	}

	pub fn is_resting(&self) -> bool {
		self.open_qty() > 0
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPayload {
	pub side: Side,
	pub price: i64,
	pub qty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelPayload {
	#[serde(rename = "orderId")]
	pub order_id: u64,
}

/// An inbound command as submitted by the driver/gateway. `order_id` for
/// `Add` is assigned by the engine as the inbound WAL sequence number, so
/// it is not present on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Add(AddPayload),
	Cancel(CancelPayload),
}

impl Command {
	pub fn kind(&self) -> &'static str {
		match self {
			Command::Add(_) => "add",
			Command::Cancel(_) => "cancel",
		}
	}

	pub fn payload_json(&self) -> serde_json::Value {
		match self {
			Command::Add(p) => serde_json::to_value(p).expect("AddPayload is always serializable"),
			Command::Cancel(p) => {
				serde_json::to_value(p).expect("CancelPayload is always serializable")
			}
		}
	}
}

/// The literal JSON shape persisted under the "in" keyspace: `{"id":..,
/// "type":.., "payload":{..}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalRecord {
	pub id: u64,
	#[serde(rename = "type")]
	pub kind: String,
	pub payload: serde_json::Value,
}

impl WalRecord {
	pub fn from_command(id: u64, cmd: &Command) -> Self {
		WalRecord {
			id,
			kind: cmd.kind().to_string(),
			payload: cmd.payload_json(),
		}
	}

	pub fn decode_command(&self) -> Result<Command, serde_json::Error> {
		match self.kind.as_str() {
			"add" => Ok(Command::Add(serde_json::from_value(self.payload.clone())?)),
			"cancel" => Ok(Command::Cancel(serde_json::from_value(
				self.payload.clone(),
			)?)),
			other => Err(serde::de::Error::custom(format!(
				"unknown WAL record type {other}"
			))),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
	#[serde(rename = "orderId")]
	pub order_id: u64,
	pub price: i64,
	pub qty: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
	pub bids: Vec<SnapshotEntry>,
	pub asks: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
	pub seq: u64,
	pub snapshot: BookSnapshot,
}
