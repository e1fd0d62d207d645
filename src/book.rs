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

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::types::{BookSnapshot, Order, Side, SnapshotEntry};

/// Listener callbacks fired inline during `OrderBook::add`/`cancel`. All
/// methods default to no-ops so callers only override what they need; the
/// engine's replay path swaps in a listener that tracks fills but never
/// broadcasts (see `engine::ReplayListener`) so recovery never re-triggers
/// externally-visible side effects.
pub trait BookListener {
	fn on_accept(&mut self, _order: &Order) {}
	fn on_reject(&mut self, _side: Side, _price: i64, _qty: i64, _reason: &str) {}
	fn on_fill(&mut self, _fill: &Fill) {}
	fn on_cancel(&mut self, _order_id: u64) {}
	fn on_cancel_reject(&mut self, _order_id: u64) {}
	fn on_trade(&mut self, _taker_id: u64, _maker_id: u64, _price: i64, _qty: i64) {}
}

/// A single fill leg. `on_fill` is invoked twice per match (once for the
/// taker, once for the resting maker); `is_aggressor_side` distinguishes
/// the two so a caller that wants "record this fill exactly once" can
/// filter on it rather than deduplicating after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
	pub order_id: u64,
	pub matched_order_id: u64,
	pub qty: i64,
	pub price: i64,
	pub is_aggressor_side: bool,
}

#[derive(Debug, Default)]
struct PriceLevel {
	orders: VecDeque<Order>,
}

impl PriceLevel {
	fn total_qty(&self) -> i64 {
		self.orders.iter().map(Order::open_qty).sum()
	}
}

/// Price-time priority limit order book for a single symbol. Bids are
/// indexed so the best (highest) price is reached first; asks so the best
/// (lowest) price is reached first. `order_index` gives O(1) cancel/lookup
/// without scanning price levels.
#[derive(Debug, Default)]
pub struct OrderBook {
	bids: BTreeMap<i64, PriceLevel>,
	asks: BTreeMap<i64, PriceLevel>,
	order_index: HashMap<u64, (Side, i64)>,
}

impl OrderBook {
	pub fn new() -> Self {
		OrderBook::default()
	}

	pub fn best_bid(&self) -> Option<i64> {
		self.bids.keys().next_back().copied()
	}

	pub fn best_ask(&self) -> Option<i64> {
		self.asks.keys().next().copied()
	}

	pub fn contains(&self, order_id: u64) -> bool {
		self.order_index.contains_key(&order_id)
	}

	/// Submits a new order for matching. `order_id` must already be
	/// assigned by the caller (the engine uses the inbound WAL sequence
	/// number). Rejects non-positive price or quantity without touching
	/// the book.
	pub fn add(&mut self, mut order: Order, listener: &mut dyn BookListener) {
		if order.price <= 0 || order.original_qty <= 0 {
			listener.on_reject(
				order.side,
				order.price,
				order.original_qty,
				"price and qty must be positive",
			);
			return;
		}
		if self.order_index.contains_key(&order.order_id) {
			listener.on_reject(order.side, order.price, order.original_qty, "duplicate order id");
			return;
		}

		listener.on_accept(&order);
		self.match_order(&mut order, listener);

		if order.is_resting() {
			self.insert_resting(order);
		}
	}

	fn match_order(&mut self, taker: &mut Order, listener: &mut dyn BookListener) {
		loop {
			if taker.open_qty() <= 0 {
				break;
			}
			let crosses = match taker.side {
				Side::Buy => self.best_ask().is_some_and(|ask| ask <= taker.price),
				Side::Sell => self.best_bid().is_some_and(|bid| bid >= taker.price),
			};
			if !crosses {
				break;
			}

			let book_side = match taker.side {
				Side::Buy => &mut self.asks,
				Side::Sell => &mut self.bids,
			};
			let level_price = match taker.side {
				Side::Buy => *book_side.keys().next().expect("crosses implies a level exists"),
				Side::Sell => *book_side.keys().next_back().expect("crosses implies a level exists"),
			};
			let level = book_side.get_mut(&level_price).expect("level just looked up");

			while taker.open_qty() > 0 {
				let Some(maker) = level.orders.front_mut() else {
					break;
				};
				let trade_qty = taker.open_qty().min(maker.open_qty());
				let trade_price = level_price;

				taker.filled_qty += trade_qty;
				maker.filled_qty += trade_qty;
				let maker_id = maker.order_id;
				let maker_done = !maker.is_resting();

				listener.on_fill(&Fill {
					order_id: taker.order_id,
					matched_order_id: maker_id,
					qty: trade_qty,
					price: trade_price,
					is_aggressor_side: true,
				});
				listener.on_fill(&Fill {
					order_id: maker_id,
					matched_order_id: taker.order_id,
					qty: trade_qty,
					price: trade_price,
					is_aggressor_side: false,
				});
				listener.on_trade(taker.order_id, maker_id, trade_price, trade_qty);

				if maker_done {
					self.order_index.remove(&maker_id);
					level.orders.pop_front();
				}
			}

			if level.orders.is_empty() {
				book_side.remove(&level_price);
			}
		}
	}

	/// Inserts an order directly into the book without running the
	/// matching algorithm. Used exclusively by `recover()` to repopulate
	/// the book from a snapshot: snapshot entries are already-resting
	/// orders and must not be re-matched against each other.
	pub fn insert_resting(&mut self, order: Order) {
		debug_assert!(order.is_resting());
		self.order_index.insert(order.order_id, (order.side, order.price));
		let side_map = match order.side {
			Side::Buy => &mut self.bids,
			Side::Sell => &mut self.asks,
		};
		side_map.entry(order.price).or_default().orders.push_back(order);
	}

	pub fn cancel(&mut self, order_id: u64, listener: &mut dyn BookListener) {
		let Some((side, price)) = self.order_index.get(&order_id).copied() else {
			listener.on_cancel_reject(order_id);
			return;
		};
		let side_map = match side {
			Side::Buy => &mut self.bids,
			Side::Sell => &mut self.asks,
		};
		let Some(level) = side_map.get_mut(&price) else {
			listener.on_cancel_reject(order_id);
			return;
		};
		let pos = level.orders.iter().position(|o| o.order_id == order_id);
		match pos {
			Some(idx) => {
				level.orders.remove(idx);
				if level.orders.is_empty() {
					side_map.remove(&price);
				}
				self.order_index.remove(&order_id);
				listener.on_cancel(order_id);
			}
			None => listener.on_cancel_reject(order_id),
		}
	}

	pub fn snapshot(&self) -> BookSnapshot {
		let mut bids = Vec::new();
		for level in self.bids.values().rev() {
			for o in &level.orders {
				bids.push(SnapshotEntry {
					order_id: o.order_id,
					price: o.price,
					qty: o.open_qty(),
				});
			}
		}
		let mut asks = Vec::new();
		for level in self.asks.values() {
			for o in &level.orders {
				asks.push(SnapshotEntry {
					order_id: o.order_id,
					price: o.price,
					qty: o.open_qty(),
				});
			}
		}
		BookSnapshot { bids, asks }
	}

	#[cfg(test)]
	fn level_qty(&self, side: Side, price: i64) -> i64 {
		let map = match side {
			Side::Buy => &self.bids,
			Side::Sell => &self.asks,
		};
		map.get(&price).map(PriceLevel::total_qty).unwrap_or(0)
	}
}
