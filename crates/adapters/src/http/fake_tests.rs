use super::*;
use sbw_core::CodeId;

#[tokio::test]
async fn fake_downloader_returns_configured_body() {
    let downloader = FakeDownloader::new();
    downloader.set_body("https://example.test/code.zip", vec![1, 2, 3]);

    let body = downloader.fetch("https://example.test/code.zip").await.expect("fetch");
    assert_eq!(body, Some(vec![1, 2, 3]));
}

#[tokio::test]
async fn fake_downloader_returns_none_for_unknown_url() {
    let downloader = FakeDownloader::new();
    let body = downloader.fetch("https://example.test/missing.zip").await.expect("fetch");
    assert_eq!(body, None);
}

#[tokio::test]
async fn fake_reporter_records_build_result() {
    let reporter = FakeReporter::new();
    let result = BuildResult::failure(CodeId::new("c1"), "boom");
    reporter.report_build_result("https://example.test", &result).await.expect("report");

    let calls = reporter.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], ReportCall::Build(r) if r.code_id == CodeId::new("c1")));
}
