use geotiler::{Config, GeoJsonWorker, IndexOptions, LoadDataParams, TileKey, TileParams, WorkerBuilder};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug to see coalescer transitions)
    env_logger::init();

    println!("=== geotiler - Getting Started ===\n");

    let mut worker: GeoJsonWorker = WorkerBuilder::new()
        .config(Config {
            index: IndexOptions::default().with_max_zoom(10),
            ..Config::default()
        })
        .build()?;
    println!("✓ Created worker\n");

    // === LOADING DATA ===
    println!("1. Loading GeoJSON");
    println!("------------------");

    let cities = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "New York"},
             "geometry": {"type": "Point", "coordinates": [-74.0060, 40.7128]}},
            {"type": "Feature", "properties": {"name": "London"},
             "geometry": {"type": "Point", "coordinates": [-0.1278, 51.5074]}},
            {"type": "Feature", "properties": {"name": "Paris"},
             "geometry": {"type": "Point", "coordinates": [2.3522, 48.8566]}}
        ]
    });

    let mut first = worker.load_data(LoadDataParams::new("cities", cities.clone()));
    // A burst of updates while the first load is running is coalesced.
    let mut second = worker.load_data(LoadDataParams::new("cities", cities.clone()));
    let mut third = worker.load_data(
        LoadDataParams::new("cities", cities).with_resource_timing(true),
    );
    worker.coalesce();
    worker.coalesce();

    for (name, rx) in [("first", &mut first), ("second", &mut second), ("third", &mut third)] {
        match rx.try_recv()? {
            Some(Ok(result)) if result.abandoned => println!("   {} load: superseded", name),
            Some(Ok(result)) => println!("   {} load: indexed {:?}", name, result.resource_timing),
            Some(Err(e)) => println!("   {} load failed: {}", name, e),
            None => println!("   {} load: still pending", name),
        }
    }
    let stats = worker.stats();
    println!(
        "   {} submitted, {} pipeline runs, {} abandoned\n",
        stats.submitted, stats.runs, stats.abandoned
    );

    // === SERVING TILES ===
    println!("2. Serving Tiles");
    println!("----------------");

    for (uid, key) in [(1, TileKey::new(0, 0, 0)), (2, TileKey::new(2, 2, 1)), (3, TileKey::new(4, 0, 0))] {
        match worker.load_tile(&TileParams::new(uid, key))? {
            Some(tile) => println!(
                "   {}: {} features, {} bytes",
                key,
                tile.wrapper.len(),
                tile.bytes.len()
            ),
            None => println!("   {}: no data", key),
        }
    }

    // A reload of a tile loaded since the last rebuild reuses the cached tile.
    let reloaded = worker.reload_tile(&TileParams::new(1, TileKey::new(0, 0, 0)))?;
    println!("   reload of uid 1: {:?} features\n", reloaded.map(|t| t.wrapper.len()));

    // === CLEANUP ===
    worker.remove_source();
    println!("✓ Source removed, index loaded: {}", worker.is_loaded());

    Ok(())
}
