use durable_matching_core::{MatchingEngine, RecordingBroadcaster, SledLogStore, Side};

fn open(dir: &std::path::Path) -> MatchingEngine<SledLogStore, RecordingBroadcaster> {
	let store = SledLogStore::open(dir).unwrap();
	MatchingEngine::new(store, RecordingBroadcaster::new(), 1000).unwrap()
}

#[test]
fn fresh_start_with_no_files_yields_empty_book() {
	let dir = tempfile::tempdir().unwrap();
	let engine = open(dir.path());
	assert_eq!(engine.best_bid(), None);
	assert_eq!(engine.best_ask(), None);
}

#[test]
fn wal_only_recovery_replays_every_command() {
	let dir = tempfile::tempdir().unwrap();
	{
		let mut engine = open(dir.path());
		engine.add_order(Side::Buy, 100, 10).unwrap();
		engine.add_order(Side::Sell, 105, 5).unwrap();
	}
	// "crash": drop and reopen against the same directory, no snapshot taken.
	let engine = open(dir.path());
	assert_eq!(engine.best_bid(), Some(100));
	assert_eq!(engine.best_ask(), Some(105));
}

#[test]
fn snapshot_plus_wal_recovery_replays_only_the_tail() {
	let dir = tempfile::tempdir().unwrap();
	{
		let mut engine = open(dir.path());
		engine.add_order(Side::Buy, 100, 10).unwrap();
		engine.take_snapshot().unwrap();
		engine.add_order(Side::Sell, 100, 10).unwrap();
	}
	let engine = open(dir.path());
	// the snapshot captured the resting bid; the post-snapshot sell fully
	// matched it, so the book should be empty on both sides.
	assert_eq!(engine.best_bid(), None);
	assert_eq!(engine.best_ask(), None);
}

#[test]
fn recovery_is_idempotent_across_repeated_restarts() {
	let dir = tempfile::tempdir().unwrap();
	{
		let mut engine = open(dir.path());
		engine.add_order(Side::Buy, 100, 10).unwrap();
		engine.add_order(Side::Buy, 99, 5).unwrap();
		engine.cancel_order(2).unwrap();
	}
	let first = open(dir.path());
	assert_eq!(first.best_bid(), Some(100));
	drop(first);
	// Reopening again (no new commands in between) must reach the exact
	// same state: every reopen rebuilds the book from scratch and replays
	// the same WAL records, so the result is deterministic regardless of
	// how many times it's repeated.
	let second = open(dir.path());
	assert_eq!(second.best_bid(), Some(100));
}

#[test]
fn recovery_matches_continuous_operation() {
	let broadcaster_a = RecordingBroadcaster::new();
	let store_a = durable_matching_core::MemoryLogStore::new();
	let mut continuous = MatchingEngine::new(&store_a, broadcaster_a, 1000).unwrap();
	continuous.add_order(Side::Buy, 100, 10).unwrap();
	continuous.add_order(Side::Sell, 102, 7).unwrap();
	continuous.cancel_order(1).unwrap();
	continuous.add_order(Side::Sell, 102, 3).unwrap();

	let dir = tempfile::tempdir().unwrap();
	{
		let mut engine = open(dir.path());
		engine.add_order(Side::Buy, 100, 10).unwrap();
		engine.add_order(Side::Sell, 102, 7).unwrap();
		engine.cancel_order(1).unwrap();
	}
	let mut engine = open(dir.path());
	engine.add_order(Side::Sell, 102, 3).unwrap();

	assert_eq!(continuous.best_bid(), engine.best_bid());
	assert_eq!(continuous.best_ask(), engine.best_ask());
}

#[test]
fn recovery_with_cancels_drops_cancelled_orders_from_the_rebuilt_book() {
	let dir = tempfile::tempdir().unwrap();
	{
		let mut engine = open(dir.path());
		engine.add_order(Side::Buy, 100, 10).unwrap();
		engine.add_order(Side::Buy, 98, 4).unwrap();
		engine.cancel_order(2).unwrap();
	}
	let engine = open(dir.path());
	assert_eq!(engine.best_bid(), Some(100));
}
