use super::*;

#[test]
fn paths_are_keyed_by_id_under_their_subdir() {
    let pm = PathManager::new("/var/lib/saiblo-worker");

    assert_eq!(
        pm.agent_code_tar_path(&CodeId::new("c1")),
        PathBuf::from("/var/lib/saiblo-worker/agent_code/c1.tar")
    );
    assert_eq!(
        pm.match_replay_path(&MatchId::new("m1")),
        PathBuf::from("/var/lib/saiblo-worker/match_replays/m1.dat")
    );
    assert_eq!(
        pm.match_result_path(&MatchId::new("m1")),
        PathBuf::from("/var/lib/saiblo-worker/match_results/m1.json")
    );
}

#[tokio::test]
async fn ensure_dirs_creates_all_subdirectories() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let pm = PathManager::new(tmp.path());
    pm.ensure_dirs().await.expect("ensure_dirs");

    assert!(pm.agent_code_dir().is_dir());
    assert!(pm.match_replays_dir().is_dir());
    assert!(pm.match_results_dir().is_dir());
}
