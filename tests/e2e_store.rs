//! End-to-end tests for the `Store` handle: config, containment built at
//! construction, and cached rows read back through the scan engine.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use kg_store::{
    CancelSignal, ContainmentFact, Error, KeyPrefixes, Row, RowRange, RowSet, Store, StoreConfig,
};

fn facts() -> Vec<ContainmentFact> {
    vec![
        ContainmentFact::new("containedInPlace", "City", "County"),
        ContainmentFact::new("containedInPlace", "County", "State"),
        ContainmentFact::new("containedInPlace", "State", "Country"),
    ]
}

/// Store with `n` place-observation rows for `City` and a few triples rows.
fn setup(n: usize, config: StoreConfig) -> Store<kg_store::MemoryRowStore> {
    let store = Store::open_memory(config, &facts()).unwrap();
    let ts = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
    let prefixes = store.key_prefixes().clone();

    for i in 0..n {
        let dcid = format!("geoId/{i:05}");
        let key = KeyPrefixes::key(&prefixes.place_obs, ["City", dcid.as_str()]);
        store.backend().insert(Row::new(key).with_cell(&prefixes.family, "", format!("obs-{i}"), ts));
    }
    for dcid in ["geoId/06", "geoId/36"] {
        let key = KeyPrefixes::key(&prefixes.triples, [dcid]);
        store.backend().insert(Row::new(key).with_cell(&prefixes.family, "", "triples", ts));
    }
    store
}

#[tokio::test]
async fn test_prefix_scan_reads_only_its_dataset() {
    let store = setup(40, StoreConfig::default());
    let prefix = store.key_prefixes().place_obs.clone();

    let rows = store
        .collect_rows(RowSet::ranges([RowRange::prefix(&prefix)]), &CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(rows.len(), 40);
    assert!(rows.iter().all(|r| r.key.as_str().starts_with("d/3/City^")));
}

#[tokio::test]
async fn test_key_scan_with_small_batches() {
    let config = StoreConfig::from_json_str(r#"{"scan": {"batch_size": 7, "max_in_flight": 2}}"#).unwrap();
    let store = setup(50, config);
    let keys: Vec<String> = (0..50).map(|i| format!("d/3/City^geoId/{i:05}")).collect();

    let mut payloads = Vec::new();
    store
        .read_rows_parallel(RowSet::keys(keys), &CancelSignal::new(), |row| {
            let cell = row.latest("csv", "").ok_or_else(|| Error::VisitorError(format!("{} has no payload", row.key)))?;
            payloads.push(String::from_utf8_lossy(&cell.value).into_owned());
            Ok(())
        })
        .await
        .unwrap();

    payloads.sort();
    assert_eq!(payloads.len(), 50);
    assert_eq!(store.backend().request_count(), 8);
}

#[tokio::test]
async fn test_containment_shared_across_tasks() {
    let store = setup(0, StoreConfig::default());
    let table = store.containment();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let table = Arc::clone(&table);
            tokio::spawn(async move { table.path("City", "Country").map(|p| p.to_vec()) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Some(vec!["County".to_string(), "State".to_string()]));
    }
    assert_eq!(store.contained_in_path("County", "State"), Some(&[][..]));
    assert_eq!(store.contained_in_path("Country", "City"), None);
}

#[tokio::test]
async fn test_custom_containment_predicate() {
    let config = StoreConfig::from_json_str(r#"{"containment": {"predicate": "partOf"}}"#).unwrap();
    let facts = vec![
        ContainmentFact::new("partOf", "Room", "Building"),
        ContainmentFact::new("containedInPlace", "City", "County"),
    ];
    let store = Store::open_memory(config, &facts).unwrap();

    assert!(store.containment().is_contained_in("Room", "Building"));
    assert!(!store.containment().is_contained_in("City", "County"));
    store.shutdown().await.unwrap();
}

#[test]
fn test_invalid_config_fails_construction() {
    let mut config = StoreConfig::default();
    config.scan.batch_size = 0;
    assert!(matches!(Store::open_memory(config, &facts()), Err(Error::InvalidConfig(_))));
}
