use geotiler::{
    CoalescerState, Config, GeoJsonWorker, LoadDataParams, LoadDataResult, LoadReceiver,
    TileKey, TileParams, TileResult, TilerError,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const ROOT: TileKey = TileKey::new(0, 0, 0);

fn worker() -> GeoJsonWorker {
    GeoJsonWorker::new(Config::default()).expect("Failed to create worker")
}

/// A collection of `n` points with a `version` property on each.
fn points(n: usize, version: u64) -> Value {
    let features: Vec<_> = (0..n)
        .map(|i| {
            json!({
                "type": "Feature",
                "properties": {"version": version},
                "geometry": {"type": "Point", "coordinates": [-60.0 + i as f64, 10.0]}
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

fn outcome(rx: &mut LoadReceiver) -> Option<Result<LoadDataResult, TilerError>> {
    rx.try_recv().expect("Load responder dropped without answering")
}

fn root_feature_count(worker: &GeoJsonWorker) -> Option<usize> {
    worker
        .get_tile(ROOT)
        .expect("Tile lookup failed")
        .into_data()
        .map(|data| data.wrapper.len())
}

/// Test 1: N submits before any settle run the pipeline once, plus at most
/// once per settle, and abandon everything but the last request per run
#[test]
fn test_coalescing_bound() {
    let mut worker = worker();
    let mut receivers: Vec<_> = (0..6)
        .map(|v| worker.load_data(LoadDataParams::new("pts", points(3, v))))
        .collect();

    assert_eq!(worker.stats().runs, 1);
    assert_eq!(worker.state(), CoalescerState::NeedsReload);

    worker.coalesce();
    assert_eq!(worker.stats().runs, 2);
    worker.coalesce();
    worker.coalesce();
    assert_eq!(worker.stats().runs, 2);
    assert_eq!(worker.state(), CoalescerState::Idle);

    let results: Vec<_> = receivers
        .iter_mut()
        .map(|rx| outcome(rx).expect("Load left unanswered").expect("Load failed"))
        .collect();
    assert!(!results[0].abandoned);
    assert!(results[1..5].iter().all(|r| r.abandoned));
    assert!(!results[5].abandoned);
    assert_eq!(worker.stats().abandoned, 4);
}

/// Test 2: every load is answered exactly once, whatever its fate
#[test]
fn test_every_load_answered_once() {
    let mut worker = worker();
    let mut receivers = vec![
        worker.load_data(LoadDataParams::new("pts", points(1, 0))),
        worker.load_data(LoadDataParams::empty("pts")),
        worker.load_data(LoadDataParams::new("pts", json!({"type": "nope"}))),
    ];
    worker.coalesce();
    receivers.push(worker.load_data(LoadDataParams::new("pts", points(2, 1))));
    receivers.push(worker.load_data(LoadDataParams::new("pts", points(2, 2))));
    worker.remove_source();

    for rx in &mut receivers {
        assert!(outcome(rx).is_some(), "Load left unanswered");
        // A oneshot receiver yields its value once; the channel is spent after.
        assert!(rx.try_recv().is_err());
    }
}

/// Test 3: readers racing a rebuild see the old index or the new one
#[test]
fn test_index_swap_is_atomic() {
    let mut worker = worker();
    let mut first = worker.load_data(LoadDataParams::new("pts", points(10, 0)));
    outcome(&mut first).expect("Load left unanswered").expect("Load failed");
    worker.coalesce();

    let tiles = worker.tiles();
    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let tiles = tiles.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while !done.load(Ordering::Relaxed) {
                    match tiles.get_tile(ROOT).expect("Tile lookup failed") {
                        TileResult::Tile(data) => seen.push(data.wrapper.len()),
                        other => panic!("Index vanished during rebuild: {:?}", other),
                    }
                }
                seen
            })
        })
        .collect();

    for round in 1..=20 {
        let count = if round % 2 == 0 { 10 } else { 50 };
        let mut rx = worker.load_data(LoadDataParams::new("pts", points(count, round)));
        outcome(&mut rx).expect("Load left unanswered").expect("Load failed");
        worker.coalesce();
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        let seen = reader.join().expect("Reader panicked");
        assert!(seen.iter().all(|&n| n == 10 || n == 50), "Partial index observed");
    }
}

/// Test 4: absent keys and missing indexes are "no data", not errors
#[test]
fn test_sparse_lookup() {
    let mut worker = worker();
    assert!(matches!(
        worker.get_tile(ROOT).expect("Lookup before load failed"),
        TileResult::NotIndexed
    ));
    let before = worker
        .load_tile(&TileParams::new(1, ROOT))
        .expect("Tile load before any index failed");
    assert!(before.is_none());
    let too_deep = TileKey::new(25, 0, 0);
    assert!(worker.get_tile(too_deep).expect("Deep lookup before load failed").is_no_data());

    let data = json!({"type": "Point", "coordinates": [-100.0, 40.0]});
    let _rx = worker.load_data(LoadDataParams::new("pt", data));

    // Past the deepest zoom the answer stays "no data" once indexed.
    assert!(matches!(
        worker.get_tile(too_deep).expect("Deep lookup failed"),
        TileResult::Empty
    ));
    let deep = worker
        .load_tile(&TileParams::new(2, too_deep))
        .expect("Deep tile load failed");
    assert!(deep.is_none());

    assert!(matches!(
        worker.get_tile(TileKey::new(3, 7, 7)).expect("Lookup failed"),
        TileResult::Empty
    ));
    assert!(matches!(
        worker.get_tile(TileKey::new(12, 0, 0)).expect("Lookup failed"),
        TileResult::Empty
    ));
    assert!(worker.get_tile(ROOT).expect("Lookup failed").into_data().is_some());
}

/// Test 5: tiles loaded since the last rebuild are reloaded; a rebuild makes
/// every uid route to a fresh load
#[test]
fn test_reload_routing_after_rebuild() {
    let mut worker = worker();
    let mut rx = worker.load_data(LoadDataParams::new("pts", points(2, 0)));
    outcome(&mut rx).expect("Load left unanswered").expect("Load failed");
    worker.coalesce();

    let params = TileParams::new(11, ROOT);
    let loaded = worker
        .reload_tile(&params)
        .expect("First reload failed")
        .expect("Tile missing");
    assert!(worker.is_tile_loaded(11));

    let reloaded = worker
        .reload_tile(&params)
        .expect("Reload failed")
        .expect("Tile missing");
    assert!(Arc::ptr_eq(&loaded.wrapper, &reloaded.wrapper));

    let mut rx = worker.load_data(LoadDataParams::new("pts", points(3, 1)));
    outcome(&mut rx).expect("Load left unanswered").expect("Load failed");
    assert!(!worker.is_tile_loaded(11));

    let fresh = worker
        .reload_tile(&params)
        .expect("Reload after rebuild failed")
        .expect("Tile missing");
    assert_eq!(fresh.wrapper.len(), 3);
    assert!(worker.is_tile_loaded(11));
}

/// Test 6: unrecognized input fails with the source id and keeps the index
#[test]
fn test_invalid_input_leaves_index_unchanged() {
    let mut worker = worker();
    let mut rx = worker.load_data(LoadDataParams::new("roads", points(4, 0)));
    outcome(&mut rx).expect("Load left unanswered").expect("Load failed");
    worker.coalesce();
    let generation = worker.generation();

    let mut rx = worker.load_data(LoadDataParams::new(
        "roads",
        json!({"type": "not-an-object-string"}),
    ));
    let err = outcome(&mut rx)
        .expect("Load left unanswered")
        .expect_err("Invalid input was accepted");

    assert!(matches!(err, TilerError::InvalidInput { .. }));
    assert_eq!(err.source_id(), Some("roads"));
    assert!(err.to_string().contains("roads"));
    assert_eq!(worker.generation(), generation);
    assert_eq!(root_feature_count(&worker), Some(4));

    // The coalescer is not wedged by the failure.
    worker.coalesce();
    assert_eq!(worker.state(), CoalescerState::Idle);
}

/// Test 7: a queued request superseded before settle is abandoned and the
/// newer one is indexed
#[test]
fn test_superseded_request_is_abandoned() {
    let mut worker = worker();
    let mut busy = worker.load_data(LoadDataParams::new("pts", points(1, 0)));

    let mut a = worker.load_data(LoadDataParams::new("pts", points(5, 1)));
    let mut b = worker.load_data(LoadDataParams::new("pts", points(7, 2)));

    let a_result = outcome(&mut a)
        .expect("A left unanswered")
        .expect("A failed");
    assert!(a_result.abandoned);
    assert!(outcome(&mut b).is_none());

    outcome(&mut busy).expect("First load left unanswered").expect("First load failed");
    worker.coalesce();

    let b_result = outcome(&mut b)
        .expect("B left unanswered")
        .expect("B failed");
    assert!(!b_result.abandoned);
    assert_eq!(root_feature_count(&worker), Some(7));
}

/// Test 8: removing a source abandons the queued load before returning
#[test]
fn test_remove_source_abandons_pending_load() {
    let mut worker = worker();
    let _running = worker.load_data(LoadDataParams::new("pts", points(1, 0)));
    let mut pending = worker.load_data(LoadDataParams::new("pts", points(2, 1)));
    assert!(outcome(&mut pending).is_none());

    worker.remove_source();

    let result = outcome(&mut pending)
        .expect("Pending load left unanswered")
        .expect("Pending load failed");
    assert!(result.abandoned);
    assert!(!worker.is_loaded());
    assert!(matches!(
        worker.get_tile(ROOT).expect("Lookup after removal failed"),
        TileResult::NotIndexed
    ));
}

/// Test 9: resource timing is reported only when requested
#[test]
fn test_resource_timing() {
    let mut worker = worker();
    let mut plain = worker.load_data(LoadDataParams::new("pts", points(2, 0)));
    let plain = outcome(&mut plain)
        .expect("Load left unanswered")
        .expect("Load failed");
    assert!(plain.resource_timing.is_none());
    worker.coalesce();

    let mut timed = worker.load_data(
        LoadDataParams::new("pts", points(2, 1)).with_resource_timing(true),
    );
    let timed = outcome(&mut timed)
        .expect("Load left unanswered")
        .expect("Load failed");
    assert!(timed.resource_timing.is_some());
}

/// Test 10: a failed run still lets queued work proceed
#[test]
fn test_failure_does_not_block_queued_load() {
    let mut worker = worker();
    let mut bad = worker.load_data(LoadDataParams::new("pts", json!([1, 2, 3])));
    let mut good = worker.load_data(LoadDataParams::new("pts", points(3, 0)));

    assert!(matches!(
        outcome(&mut bad).expect("Bad load left unanswered"),
        Err(TilerError::InvalidInput { .. })
    ));
    assert!(!worker.is_loaded());

    worker.coalesce();
    assert!(
        !outcome(&mut good)
            .expect("Good load left unanswered")
            .expect("Good load failed")
            .abandoned
    );
    assert_eq!(root_feature_count(&worker), Some(3));
}
