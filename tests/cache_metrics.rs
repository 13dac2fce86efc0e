use std::collections::HashSet;
use std::time::Duration;

use folio::cache::{CacheConfig, TtlCache};
use metrics_util::debugging::DebuggingRecorder;

#[tokio::test(start_paused = true)]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let cache: TtlCache<u32> = TtlCache::new(&CacheConfig::default());

    // miss, then hit
    assert!(cache.get("tracks").is_none());
    cache.set("tracks", 7, Duration::from_secs(1));
    assert_eq!(cache.get("tracks"), Some(7));

    // lazy expiry on read
    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(cache.get("tracks").is_none());

    // bulk sweep
    cache.set("albums", 1, Duration::from_secs(1));
    cache.set("tours", 2, Duration::from_secs(1));
    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.sweep(), 2);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "folio_cache_hit_total",
        "folio_cache_miss_total",
        "folio_cache_expired_total",
        "folio_cache_swept_total",
        "folio_cache_entries",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
