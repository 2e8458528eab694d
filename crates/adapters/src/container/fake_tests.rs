use super::*;

#[tokio::test]
async fn run_then_wait_returns_configured_exit_code() {
    let runtime = FakeContainerRuntime::new();
    let id = runtime
        .run(RunSpec::new("c1", "saiblo-worker-image:abc"))
        .await
        .expect("run");

    runtime.set_exit_code(&id, 1);
    let code = runtime.wait(&id, Duration::from_secs(1)).await.expect("wait");
    assert_eq!(code, 1);
}

#[tokio::test]
async fn build_image_records_tag_and_can_be_listed() {
    let runtime = FakeContainerRuntime::new();
    runtime.build_image(Vec::new(), "saiblo-worker-image:c1").await.expect("build");

    let images = runtime.list_images("saiblo-worker-image").await.expect("list");
    assert_eq!(images, vec!["saiblo-worker-image:c1".to_string()]);
}

#[tokio::test]
async fn fail_build_surfaces_as_build_failed_error() {
    let runtime = FakeContainerRuntime::new();
    runtime.fail_build("saiblo-worker-image:bad", "syntax error");

    let err = runtime
        .build_image(Vec::new(), "saiblo-worker-image:bad")
        .await
        .unwrap_err();
    assert!(matches!(err, ContainerError::BuildFailed(msg) if msg == "syntax error"));
}

#[tokio::test]
async fn read_file_returns_none_when_absent() {
    let runtime = FakeContainerRuntime::new();
    let id = runtime.run(RunSpec::new("c1", "img")).await.expect("run");

    let result = runtime.read_file(&id, "data/result.json").await.expect("read");
    assert!(result.is_none());
}

#[tokio::test]
async fn calls_are_recorded_in_order() {
    let runtime = FakeContainerRuntime::new();
    runtime.create_network("saiblo-worker-network-m1").await.expect("create");
    let id = runtime.run(RunSpec::new("c1", "img")).await.expect("run");
    runtime.stop(&id).await.expect("stop");

    let calls = runtime.calls();
    assert!(matches!(calls[0], ContainerCall::CreateNetwork { .. }));
    assert!(matches!(calls[1], ContainerCall::Run { .. }));
    assert!(matches!(calls[2], ContainerCall::Stop { .. }));
}

#[tokio::test]
async fn list_containers_filters_by_name_prefix() {
    let runtime = FakeContainerRuntime::new();
    runtime.run(RunSpec::new("saiblo-worker-agent-m1-0", "img")).await.expect("run");
    runtime.run(RunSpec::new("other", "img")).await.expect("run");

    let names = runtime.list_containers("saiblo-worker-agent-m1").await.expect("list");
    assert_eq!(names, vec!["saiblo-worker-agent-m1-0".to_string()]);
}

#[tokio::test]
async fn remove_by_name_marks_container_removed() {
    let runtime = FakeContainerRuntime::new();
    runtime.run(RunSpec::new("saiblo-worker-agent-m1-0", "img")).await.expect("run");

    runtime.remove("saiblo-worker-agent-m1-0").await.expect("remove");

    let names = runtime.list_containers("saiblo-worker-agent-m1").await.expect("list");
    assert!(names.is_empty());
}

#[tokio::test]
async fn list_networks_filters_by_name_prefix() {
    let runtime = FakeContainerRuntime::new();
    runtime.create_network("saiblo-worker-network-m1-0").await.expect("create");
    runtime.create_network("unrelated").await.expect("create");

    let names = runtime.list_networks("saiblo-worker-network-m1").await.expect("list");
    assert_eq!(names, vec!["saiblo-worker-network-m1-0".to_string()]);
}
