use super::*;
use sbw_adapters::FakeDownloader;
use std::io::{Cursor, Write};

fn build_test_zip() -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        writer.start_file("main.rs", options).expect("start file");
        writer.write_all(b"fn main() {}").expect("write");
        writer.finish().expect("finish");
    }
    buf
}

#[tokio::test]
async fn fetch_downloads_and_caches_tar() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let downloader = FakeDownloader::new();
    downloader.set_body("https://example.test/c1.zip", build_test_zip());

    let cache = ArtifactCache::new(downloader, PathManager::new(tmp.path()));
    let path = cache
        .fetch(&CodeId::new("c1"), "https://example.test/c1.zip")
        .await
        .expect("fetch");

    assert!(path.exists());
    assert!(path.ends_with("c1.tar"));
}

#[tokio::test]
async fn fetch_is_idempotent_and_skips_redownload() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let downloader = FakeDownloader::new();
    downloader.set_body("https://example.test/c1.zip", build_test_zip());

    let cache = ArtifactCache::new(downloader.clone(), PathManager::new(tmp.path()));
    cache.fetch(&CodeId::new("c1"), "https://example.test/c1.zip").await.expect("fetch");

    // Remove the body; a second fetch must still succeed from cache.
    let second = FakeDownloader::new();
    let cache2 = ArtifactCache::new(second, PathManager::new(tmp.path()));
    let path = cache2
        .fetch(&CodeId::new("c1"), "https://example.test/c1.zip")
        .await
        .expect("fetch from cache");
    assert!(path.exists());
}

#[tokio::test]
async fn fetch_of_missing_code_is_an_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let downloader = FakeDownloader::new();
    let cache = ArtifactCache::new(downloader, PathManager::new(tmp.path()));

    let err = cache
        .fetch(&CodeId::new("missing"), "https://example.test/missing.zip")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CodeNotFound(_)));
}

#[tokio::test]
async fn list_and_clean_round_trip() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let downloader = FakeDownloader::new();
    downloader.set_body("https://example.test/c1.zip", build_test_zip());

    let cache = ArtifactCache::new(downloader, PathManager::new(tmp.path()));
    cache.fetch(&CodeId::new("c1"), "https://example.test/c1.zip").await.expect("fetch");

    let ids = cache.list().await.expect("list");
    assert_eq!(ids, vec![CodeId::new("c1")]);

    cache.clean().await.expect("clean");
    assert!(cache.list().await.expect("list after clean").is_empty());
}
