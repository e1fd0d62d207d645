use durable_matching_core::{MatchingEngine, MemoryLogStore, RecordingBroadcaster, Side};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
	Add { side: Side, price: i64, qty: i64 },
	Cancel { target: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
	prop_oneof![
		(prop_oneof![Just(Side::Buy), Just(Side::Sell)], 1i64..=20, 1i64..=50)
			.prop_map(|(side, price, qty)| Op::Add { side, price, qty }),
		(1u64..=40).prop_map(|target| Op::Cancel { target }),
	]
}

fn run(ops: &[Op]) -> MatchingEngine<MemoryLogStore, RecordingBroadcaster> {
	let mut engine = MatchingEngine::new(MemoryLogStore::new(), RecordingBroadcaster::new(), 1000)
		.unwrap();
	for op in ops {
		match op {
			Op::Add { side, price, qty } => {
				let _ = engine.add_order(*side, *price, *qty);
			}
			Op::Cancel { target } => {
				let _ = engine.cancel_order(*target);
			}
		}
	}
	engine
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(200))]

	/// After any sequence of adds/cancels, the book never ends up crossed:
	/// the best bid is always strictly below the best ask.
	#[test]
	fn book_never_ends_up_crossed(ops in prop::collection::vec(op_strategy(), 0..40)) {
		let engine = run(&ops);
		if let (Some(bid), Some(ask)) = (engine.best_bid(), engine.best_ask()) {
			prop_assert!(bid < ask, "book crossed: bid {bid} >= ask {ask}");
		}
	}

	/// Recovering from a fresh `MatchingEngine::new` over the same store
	/// the operations were applied to must reproduce the identical best
	/// bid/ask, regardless of how many times it is reopened.
	#[test]
	fn recovery_reproduces_identical_top_of_book(ops in prop::collection::vec(op_strategy(), 0..40)) {
		let store = MemoryLogStore::new();
		let (want_bid, want_ask) = {
			let mut engine = MatchingEngine::new(&store, RecordingBroadcaster::new(), 1000).unwrap();
			for op in &ops {
				match op {
					Op::Add { side, price, qty } => { let _ = engine.add_order(*side, *price, *qty); }
					Op::Cancel { target } => { let _ = engine.cancel_order(*target); }
				}
			}
			(engine.best_bid(), engine.best_ask())
		};
		let recovered = MatchingEngine::new(&store, RecordingBroadcaster::new(), 1000).unwrap();
		prop_assert_eq!(recovered.best_bid(), want_bid);
		prop_assert_eq!(recovered.best_ask(), want_ask);
	}

	/// Replaying the same command stream twice against two independent
	/// stores is deterministic: both engines reach the same top of book.
	#[test]
	fn replay_is_deterministic(ops in prop::collection::vec(op_strategy(), 0..40)) {
		let a = run(&ops);
		let b = run(&ops);
		prop_assert_eq!(a.best_bid(), b.best_bid());
		prop_assert_eq!(a.best_ask(), b.best_ask());
	}
}
