//! Full dedup and clustering passes against real files and an in-memory store.

use std::fs;
use std::path::PathBuf;

use neardup_core::cluster::writer::flush;
use neardup_core::output::{read_path_list, write_path_list};
use neardup_core::types::{ClusterAssignment, DuplicateEdge};
use neardup_core::{ClusterPass, Config, DedupPass, HashMethod, HashStore, Ingestor, SqliteStore};
use tempfile::TempDir;

fn clustering_config(threshold: u32, prefix: usize, hex_len: usize, batch: usize) -> Config {
    let mut config = Config::default();
    config.clustering.distance_threshold = threshold;
    config.clustering.bucket_prefix_length = prefix;
    config.clustering.hash_hex_length = hex_len;
    config.clustering.batch_size = batch;
    config.pipeline.retry_delay_ms = 0;
    config
}

fn store_with_hashes(hashes: &[&str]) -> (SqliteStore, Vec<i64>) {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut image_ids = Vec::new();
    for (i, hash) in hashes.iter().enumerate() {
        let image_id = store
            .ingest_image(&format!("/corpus/{i}.jpg"), 100, &format!("digest{i}"), hash)
            .unwrap()
            .unwrap();
        image_ids.push(image_id);
    }
    (store, image_ids)
}

fn cluster_of(store: &SqliteStore, image_id: i64) -> Option<i64> {
    store
        .hash_records()
        .unwrap()
        .into_iter()
        .find(|r| r.image_id == image_id && r.hash_method == HashMethod::Perceptual)
        .and_then(|r| r.cluster_id)
}

#[tokio::test]
async fn test_dedup_unique_list_and_duplicate_report() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.jpg");
    let c = dir.path().join("c.jpg");
    fs::write(&a, b"identical bytes").unwrap();
    fs::write(&b, b"identical bytes").unwrap();
    fs::write(&c, b"something else").unwrap();

    let mut list = Vec::new();
    write_path_list(&mut list, &[a.clone(), b.clone(), c.clone()]).unwrap();
    let list = read_path_list(list.as_slice()).unwrap();
    assert!(list.errors.is_empty());

    let report = DedupPass::new(&Config::default()).run(list.paths).await;

    assert_eq!(report.unique, vec![a.clone(), c]);
    assert_eq!(
        report.duplicates,
        vec![DuplicateEdge {
            duplicate_path: b,
            original_path: a,
        }]
    );
    assert_eq!(report.files_seen(), 3);
    assert_eq!(report.error_count(), 0);
}

#[tokio::test]
async fn test_dedup_unreadable_file_is_neither_unique_nor_duplicate() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.jpg");
    fs::write(&a, b"bytes").unwrap();
    let missing = dir.path().join("gone.jpg");

    let report = DedupPass::new(&Config::default())
        .run(vec![missing.clone(), a.clone()])
        .await;

    assert_eq!(report.unique, vec![a]);
    assert!(report.duplicates.is_empty());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, missing);
}

#[test]
fn test_two_bucket_clustering() {
    let (store, images) = store_with_hashes(&["AAAA", "AAAB", "FFFF"]);
    let report = ClusterPass::new(&clustering_config(1, 2, 4, 1000))
        .run(&store)
        .unwrap();

    assert_eq!(report.clusters_formed, 2);
    assert_eq!(report.records_updated, 3);
    assert_eq!(cluster_of(&store, images[0]), Some(1));
    assert_eq!(cluster_of(&store, images[1]), Some(1));
    assert_eq!(cluster_of(&store, images[2]), Some(2));

    let listed = store.list_clusters(2).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].members.len(), 2);
}

#[test]
fn test_batched_writes_split_and_commit_everything() {
    let (store, _) = store_with_hashes(&["1000", "2000", "3000", "4000", "5000"]);
    let report = ClusterPass::new(&clustering_config(0, 1, 4, 2))
        .run(&store)
        .unwrap();

    assert_eq!(report.clusters_formed, 5);
    assert_eq!(report.records_updated, 5);
    assert!(store
        .fetch_unclustered(HashMethod::Perceptual)
        .unwrap()
        .is_empty());
}

#[test]
fn test_clustered_records_are_never_reassigned() {
    let (store, images) = store_with_hashes(&["AAAA", "FFFF"]);
    let config = clustering_config(1, 2, 4, 10);
    ClusterPass::new(&config).run(&store).unwrap();
    let before = cluster_of(&store, images[0]);

    // A new near-duplicate of an already-clustered image forms its own cluster.
    let late = store
        .ingest_image("/corpus/late.jpg", 1, "late", "AAAB")
        .unwrap()
        .unwrap();
    let report = ClusterPass::new(&config).run(&store).unwrap();

    assert_eq!(report.records_fetched, 1);
    assert_eq!(cluster_of(&store, images[0]), before);
    assert_eq!(cluster_of(&store, late), Some(3));
}

#[test]
fn test_reapplying_committed_batch_changes_nothing() {
    let (store, _) = store_with_hashes(&["AAAA", "AAAB"]);
    let records = store.fetch_unclustered(HashMethod::Perceptual).unwrap();
    let batch: Vec<_> = records
        .iter()
        .map(|r| ClusterAssignment {
            cluster_id: 1,
            record_id: r.id,
        })
        .collect();

    let first = flush(&store, &batch, 1).unwrap();
    let state = store.hash_records().unwrap();
    let second = flush(&store, &batch, 1).unwrap();

    assert_eq!(first.changed, 2);
    assert_eq!(second.changed, 0);
    assert_eq!(second.committed, 2);
    assert_eq!(store.hash_records().unwrap(), state);
}

#[test]
fn test_reset_returns_records_to_clustering() {
    let (store, _) = store_with_hashes(&["AAAA", "AAAB"]);
    let config = clustering_config(1, 2, 4, 10);
    ClusterPass::new(&config).run(&store).unwrap();

    assert_eq!(store.reset_clusters().unwrap(), 2);
    let report = ClusterPass::new(&config).run(&store).unwrap();
    assert_eq!(report.records_fetched, 2);
    // Ids keep increasing after a reset only if some record still holds one.
    assert_eq!(report.cluster_id_range, Some((1, 1)));
}

#[test]
fn test_ingest_then_cluster_real_images() {
    let dir = TempDir::new().unwrap();
    let mut paths: Vec<PathBuf> = Vec::new();
    for (name, shade) in [("a.png", 0u8), ("b.png", 0u8), ("c.png", 255u8)] {
        let path = dir.path().join(name);
        image::RgbImage::from_fn(64, 64, |x, _| {
            let v = ((x * 4) as u8) ^ shade;
            image::Rgb([v, v, v])
        })
        .save(&path)
        .unwrap();
        paths.push(path);
    }
    let store = SqliteStore::open_in_memory().unwrap();
    let config = Config::default();

    let ingest = Ingestor::new(&config).run(&store, &paths, |_, _| {}).unwrap();
    assert_eq!(ingest.ingested, 3);

    let report = ClusterPass::new(&config).run(&store).unwrap();
    assert_eq!(report.records_fetched, 3);
    assert!(report.rejected.is_empty());
    assert_eq!(report.records_updated, 3);

    // a.png and b.png are pixel-identical, so their hashes match exactly.
    let clusters = store.list_clusters(2).unwrap();
    assert_eq!(clusters.len(), 1);
    let members: Vec<_> = clusters[0].members.iter().map(|m| m.path.clone()).collect();
    assert_eq!(members, vec![paths[0].clone(), paths[1].clone()]);
}
