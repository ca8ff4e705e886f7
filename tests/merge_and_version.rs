//! Integration tests for merge orchestration and version resolution
//!
//! These drive the public API against real repositories on disk, the way a
//! build script would: branch, merge, tag, then ask for the next version.

use std::path::Path;

use branchcraft_lib::commands::{current_version, tag_next_version, Bump, VersioningConfig};
use branchcraft_lib::{
    merge, merge_outcome, resolve_next_version, DefaultIncrement, GitGateway, IncrementStrategy,
    MergeOptions, MergeOutcome, VcsGateway, Version, VersionSettings,
};
use tempfile::TempDir;

/// Create a repository on the `default` branch with one commit
fn setup_repo() -> (TempDir, GitGateway) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let gateway = GitGateway::new();
    gateway.init(dir.path()).expect("Failed to init repo");

    let repo = git2::Repository::open(dir.path()).expect("Failed to open repo");
    let mut config = repo.config().expect("Failed to get config");
    config
        .set_str("user.name", "Test User")
        .expect("Failed to set user.name");
    config
        .set_str("user.email", "test@example.com")
        .expect("Failed to set user.email");

    write_and_commit(&gateway, dir.path(), "README.md", "# Test Repo", "Initial commit");
    (dir, gateway)
}

fn write_and_commit(gateway: &GitGateway, path: &Path, name: &str, content: &str, message: &str) {
    std::fs::write(path.join(name), content).expect("Failed to write file");
    gateway
        .commit(path, message, true)
        .expect("Failed to commit");
}

fn commit_count(path: &Path) -> usize {
    let repo = git2::Repository::open(path).expect("Failed to open repo");
    let mut walk = repo.revwalk().expect("Failed to create revwalk");
    walk.push_glob("refs/heads/*").expect("Failed to push branches");
    walk.count()
}

fn pending_count(gateway: &GitGateway, path: &Path) -> usize {
    gateway
        .status(path, false)
        .expect("Failed to read status")
        .into_iter()
        .filter(|entry| entry.state.is_pending())
        .count()
}

fn v(raw: &str) -> Version {
    raw.parse().expect("Invalid version")
}

#[test]
fn test_disjoint_merge_creates_merge_commit() {
    let (dir, gateway) = setup_repo();
    let path = dir.path();

    gateway.branch(path, "dev").unwrap();
    write_and_commit(&gateway, path, "dev.txt", "dev", "dev work");
    let dev_head = gateway.tip(path).unwrap();

    gateway.update(path, "default").unwrap();
    write_and_commit(&gateway, path, "main.txt", "main", "main work");
    let before = gateway.tip(path).unwrap();

    let summary = merge(&gateway, path, "dev", &MergeOptions::default()).unwrap();
    assert_eq!(summary.outcome, MergeOutcome::Success);

    let tip = gateway.tip(path).unwrap();
    assert!(tip.is_merge());
    assert_eq!(tip.left_parent_hash.as_deref(), Some(before.hash.as_str()));
    assert_eq!(tip.right_parent_hash.as_deref(), Some(dev_head.hash.as_str()));
    assert_eq!(tip.branch.as_deref(), Some("default"));
    assert!(path.join("dev.txt").exists());
    assert!(path.join("main.txt").exists());
}

#[test]
fn test_conflicting_merge_leaves_repository_untouched() {
    let (dir, gateway) = setup_repo();
    let path = dir.path();

    gateway.branch(path, "dev").unwrap();
    write_and_commit(&gateway, path, "shared.txt", "dev side\n", "dev edit");

    gateway.update(path, "default").unwrap();
    write_and_commit(&gateway, path, "shared.txt", "default side\n", "default edit");
    let before = gateway.tip(path).unwrap();
    let commits_before = commit_count(path);

    let outcome = merge_outcome(&gateway, path, "dev", None).unwrap();
    assert_eq!(outcome, MergeOutcome::UnresolvedFiles);

    assert_eq!(gateway.tip(path).unwrap().hash, before.hash);
    assert_eq!(commit_count(path), commits_before);
    assert_eq!(pending_count(&gateway, path), 0);
    assert_eq!(
        std::fs::read_to_string(path.join("shared.txt")).unwrap(),
        "default side\n"
    );
}

#[test]
fn test_repeated_merge_is_not_success() {
    let (dir, gateway) = setup_repo();
    let path = dir.path();

    gateway.branch(path, "dev").unwrap();
    write_and_commit(&gateway, path, "dev.txt", "dev", "dev work");
    gateway.update(path, "default").unwrap();
    write_and_commit(&gateway, path, "main.txt", "main", "main work");

    assert_eq!(
        merge_outcome(&gateway, path, "dev", None).unwrap(),
        MergeOutcome::Success
    );
    let merged_tip = gateway.tip(path).unwrap();

    let again = merge_outcome(&gateway, path, "dev", None).unwrap();
    assert_ne!(again, MergeOutcome::Success);
    assert_eq!(gateway.tip(path).unwrap().hash, merged_tip.hash);
}

#[test]
fn test_merge_into_other_destination() {
    let (dir, gateway) = setup_repo();
    let path = dir.path();

    gateway.branch(path, "other").unwrap();
    write_and_commit(&gateway, path, "other.txt", "other", "other work");
    let other_before = gateway.tip(path).unwrap();

    gateway.update(path, "default").unwrap();
    gateway.branch(path, "dev").unwrap();
    write_and_commit(&gateway, path, "dev.txt", "dev", "dev work");
    let dev_head = gateway.tip(path).unwrap();

    let summary = merge(&gateway, path, "dev", &MergeOptions::into_branch("other")).unwrap();
    assert_eq!(summary.outcome, MergeOutcome::Success);
    assert_eq!(summary.destination.as_deref(), Some("other"));

    let tip = gateway.tip(path).unwrap();
    assert_eq!(tip.branch.as_deref(), Some("other"));
    assert_eq!(tip.left_parent_hash.as_deref(), Some(other_before.hash.as_str()));
    assert_eq!(tip.right_parent_hash.as_deref(), Some(dev_head.hash.as_str()));
    assert_eq!(pending_count(&gateway, path), 0);
}

#[test]
fn test_unmerged_destination_leaves_checkout_alone() {
    let (dir, gateway) = setup_repo();
    let path = dir.path();
    let start = gateway.tip(path).unwrap();

    gateway.branch(path, "other").unwrap();
    write_and_commit(&gateway, path, "shared.txt", "other side\n", "other edit");
    let other_before = gateway.tip(path).unwrap();

    gateway.update(path, "default").unwrap();
    gateway.branch(path, "dev").unwrap();
    write_and_commit(&gateway, path, "shared.txt", "dev side\n", "dev edit");
    gateway.update(path, "default").unwrap();
    let commits_before = commit_count(path);

    let outcome = merge_outcome(&gateway, path, "dev", Some("other")).unwrap();
    assert_eq!(outcome, MergeOutcome::UnresolvedFiles);

    assert_eq!(gateway.current_branch(path).unwrap().as_deref(), Some("default"));
    assert_eq!(gateway.tip(path).unwrap().hash, start.hash);
    assert!(!path.join("shared.txt").exists());
    assert_eq!(commit_count(path), commits_before);
    assert_eq!(pending_count(&gateway, path), 0);
    assert_eq!(
        gateway.heads(path, "other").unwrap()[0].hash,
        other_before.hash
    );
}

#[test]
fn test_tagless_repository_uses_baseline() {
    let (dir, gateway) = setup_repo();
    let settings = VersionSettings::default();

    assert!(current_version(&gateway, dir.path(), &settings).unwrap().is_none());
    assert_eq!(
        resolve_next_version(&gateway, dir.path(), &settings).unwrap(),
        v("0.1")
    );

    let bump_major = |version: &Version| Version::new(version.major() + 1, 0);
    let settings = VersionSettings::default().with_increment(&bump_major);
    assert_eq!(
        resolve_next_version(&gateway, dir.path(), &settings).unwrap(),
        v("0.1")
    );

    gateway.tag(dir.path(), "v0.1", "tip").unwrap();
    assert_eq!(
        resolve_next_version(&gateway, dir.path(), &settings).unwrap(),
        v("1.0")
    );
}

#[test]
fn test_default_increment_bumps_least_significant_component() {
    assert_eq!(DefaultIncrement.increment(&v("1.2.3.4")), v("1.2.3.5"));
    assert_eq!(DefaultIncrement.increment(&v("1.2.3")), v("1.2.4"));
    assert_eq!(DefaultIncrement.increment(&v("1.2")), v("1.3"));
}

#[test]
fn test_highest_reachable_tag_wins() {
    let (dir, gateway) = setup_repo();
    let path = dir.path();

    gateway.tag(path, "v1.0", "tip").unwrap();
    write_and_commit(&gateway, path, "a.txt", "a", "second");
    gateway.tag(path, "v1.4.2", "tip").unwrap();
    gateway.tag(path, "release-candidate", "tip").unwrap();

    // Tag on a branch that never reaches default
    gateway.branch(path, "experiment").unwrap();
    write_and_commit(&gateway, path, "b.txt", "b", "experiment");
    gateway.tag(path, "v9.0", "tip").unwrap();
    gateway.update(path, "default").unwrap();

    let settings = VersionSettings::default();
    let current = current_version(&gateway, path, &settings).unwrap().unwrap();
    assert_eq!(current.version, v("1.4.2"));
    assert_eq!(
        resolve_next_version(&gateway, path, &settings).unwrap(),
        v("1.4.3")
    );
}

#[test]
fn test_tag_next_version_and_config_round_trip() {
    let (dir, gateway) = setup_repo();
    let path = dir.path();

    let config = VersioningConfig {
        increment: Bump::Minor,
        ..VersioningConfig::default()
    };
    config.save(&gateway, path).unwrap();
    let loaded = VersioningConfig::load(&gateway, path).unwrap();
    assert_eq!(loaded, config);

    gateway.tag(path, "v2.3.7", "tip").unwrap();
    let tagged = tag_next_version(&gateway, path, &loaded.settings()).unwrap();
    assert_eq!(tagged.tag, "v2.4.0");
    assert_eq!(tagged.version, v("2.4.0"));

    let current = current_version(&gateway, path, &loaded.settings())
        .unwrap()
        .unwrap();
    assert_eq!(current.version, v("2.4.0"));
}
