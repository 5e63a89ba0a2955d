use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use geotiler::{Config, GeoJsonWorker, LoadDataParams, TileKey, TileParams};
use serde_json::{Value, json};

/// Grid of square polygons around New York, one per feature.
fn parcels(count: usize) -> Value {
    let side = (count as f64).sqrt().ceil() as usize;
    let features: Vec<_> = (0..count)
        .map(|i| {
            let (lon, lat) = (
                -74.1 + (i % side) as f64 * 0.001,
                40.6 + (i / side) as f64 * 0.001,
            );
            let d = 0.0008;
            json!({
                "type": "Feature",
                "id": i,
                "properties": {"parcel": i, "zone": if i % 3 == 0 { "R1" } else { "C2" }},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [lon, lat], [lon + d, lat], [lon + d, lat + d], [lon, lat + d], [lon, lat]
                ]]}
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

fn loaded_worker(data: Value) -> GeoJsonWorker {
    let mut worker = GeoJsonWorker::new(Config::default()).unwrap();
    let mut rx = worker.load_data(LoadDataParams::new("parcels", data));
    rx.try_recv().unwrap().unwrap().unwrap();
    worker.coalesce();
    worker
}

fn benchmark_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_data");
    group.sample_size(10);

    for count in [100, 1_000, 10_000] {
        let data = parcels(count);
        group.bench_with_input(BenchmarkId::new("parcels", count), &data, |b, data| {
            let mut worker = GeoJsonWorker::new(Config::default()).unwrap();
            b.iter(|| {
                let mut rx = worker.load_data(LoadDataParams::new("parcels", black_box(data.clone())));
                let result = rx.try_recv().unwrap();
                worker.coalesce();
                result
            })
        });
    }

    group.finish();
}

fn benchmark_tiles(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiles");
    let mut worker = loaded_worker(parcels(10_000));

    // Tiles covering the parcel grid at a precomputed and an on-demand zoom.
    for key in [TileKey::new(5, 9, 12), TileKey::new(12, 1205, 1540)] {
        group.bench_with_input(BenchmarkId::new("load_tile", key), &key, |b, &key| {
            let mut uid = 0;
            b.iter(|| {
                uid += 1;
                worker.load_tile(&TileParams::new(uid, black_box(key))).unwrap()
            })
        });
    }

    group.bench_function("reload_cached_tile", |b| {
        let params = TileParams::new(u64::MAX, TileKey::new(12, 1205, 1540));
        worker.load_tile(&params).unwrap();
        b.iter(|| worker.reload_tile(black_box(&params)).unwrap())
    });

    group.finish();
}

fn benchmark_coalescing(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalescing");
    let data = parcels(1_000);

    group.bench_function("burst_of_10", |b| {
        let mut worker = GeoJsonWorker::new(Config::default()).unwrap();
        b.iter(|| {
            let receivers: Vec<_> = (0..10)
                .map(|_| worker.load_data(LoadDataParams::new("parcels", data.clone())))
                .collect();
            worker.coalesce();
            worker.coalesce();
            receivers
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_load, benchmark_tiles, benchmark_coalescing);
criterion_main!(benches);
