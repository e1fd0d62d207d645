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

use tracing::{debug, error, info, warn};

use crate::book::{BookListener, Fill, OrderBook};
use crate::broadcaster::Broadcaster;
use crate::error::EngineError;
use crate::types::{AddPayload, CancelPayload, Command, Order, Side, StoredSnapshot};
use crate::wal::{LogStore, WalManager};

/// Runs the book's listener callbacks for one inbound command, translating
/// them into broadcast messages and marking the command processed in the
/// WAL. A `Fill` is published exactly once per match leg: `on_fill` fires
/// twice (aggressor, then resting maker), so only the aggressor-side
/// invocation is forwarded.
struct EngineListener<'a, B: Broadcaster> {
	broadcaster: &'a B,
	inbound_seq: u64,
	broadcast_failed: bool,
	/// Aggressor-side fill payloads produced while applying this command,
	/// collected so the command can be marked processed (§6: "out" keyed by
	/// the inbound seq that produced the fill) once it's known whether any
	/// fill happened at all.
	fills: Vec<serde_json::Value>,
}

impl<'a, B: Broadcaster> EngineListener<'a, B> {
	fn new(broadcaster: &'a B, inbound_seq: u64) -> Self {
		EngineListener {
			broadcaster,
			inbound_seq,
			broadcast_failed: false,
			fills: Vec::new(),
		}
	}

	fn publish(&mut self, topic: &str, message: serde_json::Value) {
		if self.broadcast_failed {
			return;
		}
		if !self.broadcaster.publish(topic, &message) {
			warn!(target: "engine", seq = self.inbound_seq, topic, "broadcast rejected");
			self.broadcast_failed = true;
		}
	}
}

impl<'a, B: Broadcaster> BookListener for EngineListener<'a, B> {
	fn on_accept(&mut self, order: &Order) {
		self.publish(
			"accepts",
			serde_json::json!({ "orderId": order.order_id, "side": order.side, "price": order.price, "qty": order.original_qty }),
		);
	}

	fn on_reject(&mut self, side: Side, price: i64, qty: i64, reason: &str) {
		self.publish(
			"rejects",
			serde_json::json!({ "side": side, "price": price, "qty": qty, "reason": reason }),
		);
	}

	fn on_fill(&mut self, fill: &Fill) {
		if !fill.is_aggressor_side {
			return;
		}
		let payload = serde_json::json!({
			"orderId": fill.order_id,
			"matchedOrderId": fill.matched_order_id,
			"qty": fill.qty,
			"price": fill.price,
		});
		self.fills.push(payload.clone());
		self.publish("fills", payload);
	}

	fn on_cancel(&mut self, order_id: u64) {
		self.publish("cancels", serde_json::json!({ "orderId": order_id }));
	}

	fn on_cancel_reject(&mut self, order_id: u64) {
		self.publish(
			"cancel_rejects",
			serde_json::json!({ "orderId": order_id }),
		);
	}

	fn on_trade(&mut self, taker_id: u64, maker_id: u64, price: i64, qty: i64) {
		self.publish(
			"trades",
			serde_json::json!({ "takerId": taker_id, "makerId": maker_id, "price": price, "qty": qty }),
		);
	}
}

/// Suppresses broadcast entirely during replay while still tracking
/// aggressor-side fills, so a record whose "out" row was never written
/// before the crash (e.g. the crash happened between `book.add` and
/// `mark_processed`) gets its WAL bookkeeping brought up to date without
/// re-publishing anything externally.
#[derive(Default)]
struct ReplayListener {
	fills: Vec<serde_json::Value>,
}

impl BookListener for ReplayListener {
	fn on_fill(&mut self, fill: &Fill) {
		if !fill.is_aggressor_side {
			return;
		}
		self.fills.push(serde_json::json!({
			"orderId": fill.order_id,
			"matchedOrderId": fill.matched_order_id,
			"qty": fill.qty,
			"price": fill.price,
		}));
	}
}

/// Single-symbol durable matching engine. Runs single-threaded and
/// synchronous: callers invoke `add_order`/`cancel_order` directly from
/// their own I/O loop, and every listener side effect for a command
/// completes before the call returns. There is no internal queue, worker
/// thread, or channel hop — the spec mandates this explicitly so the
/// WAL-append-before-apply ordering is trivially observable instead of
/// being an invariant across concurrent tasks.
pub struct MatchingEngine<S: LogStore, B: Broadcaster> {
	book: OrderBook,
	wal: WalManager<S>,
	broadcaster: B,
	commands_since_snapshot: u64,
	snapshot_every: u64,
}

impl<S: LogStore, B: Broadcaster> MatchingEngine<S, B> {
	pub fn new(store: S, broadcaster: B, snapshot_every: u64) -> Result<Self, EngineError> {
		let wal = WalManager::new(store)?;
		let mut engine = MatchingEngine {
			book: OrderBook::new(),
			wal,
			broadcaster,
			commands_since_snapshot: 0,
			snapshot_every,
		};
		engine.recover()?;
		Ok(engine)
	}

	/// Appends the command to the WAL, applies it to the book, broadcasts
	/// every resulting event, and marks the command processed — in that
	/// order. If the broadcaster reports failure the command is left
	/// unmarked, so a crash-restart replays it rather than silently
	/// treating a lost broadcast as delivered.
	fn apply(&mut self, cmd: Command) -> Result<u64, EngineError> {
		let seq = self.wal.append_inbound(&cmd)?;
		self.apply_and_publish(seq, &cmd)?;
		self.commands_since_snapshot += 1;
		if self.commands_since_snapshot >= self.snapshot_every {
			self.take_snapshot()?;
		}
		Ok(seq)
	}

	/// Only a command that produces at least one fill ever reaches
	/// `Marked(processed)` in the WAL: the state machine in SPEC_FULL.md §4.D
	/// is explicit that "out" is written from the fill path, not
	/// unconditionally for every applied command. A resting add or a cancel
	/// never writes an "out" row; `recover()` always replays every record in
	/// its window regardless, so this has no effect on crash-recovery
	/// correctness and only determines what `is_processed` reports.
	fn apply_and_publish(&mut self, seq: u64, cmd: &Command) -> Result<(), EngineError> {
		let mut listener = EngineListener::new(&self.broadcaster, seq);
		match cmd {
			Command::Add(AddPayload { side, price, qty }) => {
				let order = Order::new(seq, *side, *price, *qty);
				self.book.add(order, &mut listener);
			}
			Command::Cancel(CancelPayload { order_id }) => {
				self.book.cancel(*order_id, &mut listener);
			}
		}
		if listener.broadcast_failed {
			error!(target: "engine", seq, "command applied but broadcast failed; not marking processed");
			return Err(EngineError::BroadcastFailed(seq));
		}
		if !listener.fills.is_empty() {
			self.wal.mark_processed(seq, &serde_json::Value::Array(listener.fills))?;
		}
		Ok(())
	}

	pub fn add_order(&mut self, side: Side, price: i64, qty: i64) -> Result<u64, EngineError> {
		self.apply(Command::Add(AddPayload { side, price, qty }))
	}

	/// Cancels a resting order. Per the WAL-logging policy, only a cancel
	/// that actually finds a resting order is worth an intent record —
	/// logging a reject would durably record an event with no effect on
	/// book state to replay. Returns `Ok(None)` for an unknown or
	/// already-closed order id, with a `cancel_rejects` broadcast but no
	/// WAL write and no sequence number assigned.
	pub fn cancel_order(&mut self, order_id: u64) -> Result<Option<u64>, EngineError> {
		if !self.book.contains(order_id) {
			warn!(target: "engine", order_id, "cancel rejected: order not resting");
			self.broadcaster
				.publish("cancel_rejects", &serde_json::json!({ "orderId": order_id }));
			return Ok(None);
		}
		let seq = self.apply(Command::Cancel(CancelPayload { order_id }))?;
		Ok(Some(seq))
	}

	/// Persists the current book state keyed by the next sequence number
	/// that has not yet been assigned — i.e. recovery will replay from
	/// exactly this point forward.
	pub fn take_snapshot(&mut self) -> Result<u64, EngineError> {
		let seq = self.wal.next_seq();
		let snapshot = StoredSnapshot {
			seq,
			snapshot: self.book.snapshot(),
		};
		self.wal.save_snapshot(&snapshot)?;
		self.commands_since_snapshot = 0;
		info!(target: "snapshotter", seq, "snapshot written");
		Ok(seq)
	}

	/// Rebuilds in-memory state after a crash: load the latest snapshot
	/// (if any) directly into the book via `insert_resting`, bypassing
	/// matching entirely since snapshot entries are already resting and
	/// matching them against each other would be wrong; then replay every
	/// inbound record at or after the snapshot's seq. The snapshot's seq is
	/// the WAL position at the moment it was taken, so every record in this
	/// window happened strictly after the snapshot and must be re-applied
	/// to reconstruct the book regardless of whether it was already marked
	/// processed — that flag only reflects whether its fill was already
	/// durably broadcast before the crash, which `ReplayListener` (never the
	/// real `Broadcaster`) makes moot here. A record not yet marked that
	/// turns out to produce a fill on replay has its "out" row written now,
	/// bringing WAL bookkeeping up to date for work that never got that far
	/// before the crash.
	fn recover(&mut self) -> Result<(), EngineError> {
		let from = match self.wal.load_latest_snapshot()? {
			Some(stored) => {
				info!(target: "recovery", seq = stored.seq, "restoring from snapshot");
				for entry in &stored.snapshot.bids {
					self.book
						.insert_resting(Order::new(entry.order_id, Side::Buy, entry.price, entry.qty));
				}
				for entry in &stored.snapshot.asks {
					self.book
						.insert_resting(Order::new(entry.order_id, Side::Sell, entry.price, entry.qty));
				}
				stored.seq
			}
			None => 1,
		};

		let records = self.wal.replay_inbound(from)?;
		let count = records.len();
		for (record, already_processed) in records {
			if already_processed {
				warn!(target: "recovery", seq = record.id, "replaying a record already marked processed");
			}
			let cmd = record.decode_command().map_err(|e| {
				EngineError::ReplayMismatch(format!("seq {}: {e}", record.id))
			})?;
			let mut listener = ReplayListener::default();
			match &cmd {
				Command::Add(AddPayload { side, price, qty }) => {
					self.book.add(Order::new(record.id, *side, *price, *qty), &mut listener);
				}
				Command::Cancel(CancelPayload { order_id }) => {
					self.book.cancel(*order_id, &mut listener);
				}
			}
			if !already_processed && !listener.fills.is_empty() {
				self.wal
					.mark_processed(record.id, &serde_json::Value::Array(listener.fills))?;
			}
		}
		debug!(target: "recovery", from, replayed = count, "recovery complete");
		Ok(())
	}

	pub fn best_bid(&self) -> Option<i64> {
		self.book.best_bid()
	}

	pub fn best_ask(&self) -> Option<i64> {
		self.book.best_ask()
	}
}
