//! Full commit behavior against a real working tree.

mod common;

use common::TestTree;
use keyvc::VcError;
use keyvc::clock::FixedClock;
use keyvc::reconstruct::Revision;
use keyvc_core::model::{CommitKind, Key};

fn key(s: &str) -> Key {
    Key::new(s).unwrap()
}

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

#[test]
fn first_commit_records_every_file_in_scan_order() {
    let tree = TestTree::new();
    tree.write("README", "hello\n");
    tree.write("src/main.rs", "fn main() {}\n");
    tree.write("assets/logo.png", PNG);

    let entry = tree.commit_at(1_000, "initial import");

    let refs: Vec<String> = entry.commits.iter().map(ToString::to_string).collect();
    assert_eq!(refs.len(), 3);
    assert!(refs[0].starts_with("README/.commits/d1000+"));
    assert!(refs[1].starts_with("assets/logo.png/.commits/b1000+"));
    assert!(refs[2].starts_with("src/main.rs/.commits/d1000+"));

    let history = tree.meta_files("history");
    assert_eq!(history, vec!["1000"]);
    let text = String::from_utf8(tree.read(".vc/history/1000").unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "1");
    assert_eq!(lines[1], "initial import");
    assert_eq!(lines.len(), 5);
}

#[test]
fn nothing_to_commit_writes_no_history() {
    let tree = TestTree::new();
    let err = tree
        .repo()
        .full_commit("empty", &FixedClock(5))
        .unwrap_err();
    assert!(matches!(err, VcError::NothingToCommit));
    assert!(err.is_noop());
    assert!(tree.meta_files("history").is_empty());
    assert!(tree.read(".vc/lock").is_none(), "lock must be released");
}

#[test]
fn unchanged_tree_is_a_noop_on_rerun() {
    let tree = TestTree::new();
    tree.write("a.txt", "one\ntwo\n");
    tree.write("b.bin", [0u8, 1, 2, 3]);
    tree.commit_at(10, "first");

    let err = tree
        .repo()
        .full_commit("again", &FixedClock(20))
        .unwrap_err();
    assert!(matches!(err, VcError::NothingToCommit));
    assert_eq!(tree.meta_files("keys/a.txt/.commits").len(), 1);
    assert_eq!(tree.meta_files("keys/b.bin/.commits").len(), 1);
    assert_eq!(tree.meta_files("history"), vec!["10"]);
}

#[test]
fn modification_appends_one_diff_commit() {
    let tree = TestTree::new();
    tree.write("notes.txt", "A\nB\nC");
    tree.write("other.txt", "untouched");
    tree.commit_at(100, "v1");

    tree.write("notes.txt", "A\nB\nD");
    let entry = tree.commit_at(200, "v2");

    assert_eq!(entry.commits.len(), 1);
    let commit = &entry.commits[0];
    assert_eq!(commit.key, key("notes.txt"));
    assert_eq!(commit.commit.kind(), CommitKind::Diff);

    let payload = tree
        .read(&format!(".vc/keys/notes.txt/.commits/{}", commit.commit))
        .unwrap();
    assert_eq!(payload, b"=1\n=2\n+D\n");

    let repo = tree.repo();
    let ids = repo.chain().list(&key("notes.txt")).unwrap();
    assert_eq!(repo.cat(&key("notes.txt"), Some(&ids[0])).unwrap(), "A\nB\nC");
    assert_eq!(repo.last_cat(&key("notes.txt")).unwrap(), "A\nB\nD");
}

#[test]
fn same_second_passes_get_distinct_timestamps() {
    let tree = TestTree::new();
    tree.write("a", "1");
    let first = tree.commit_at(50, "one");
    tree.write("a", "2");
    let second = tree.commit_at(50, "two");
    assert_eq!(first.timestamp, 50);
    assert_eq!(second.timestamp, 51);
    assert_eq!(tree.meta_files("history"), vec!["50", "51"]);
}

#[test]
fn deleted_key_is_archived_with_a_marker() {
    let tree = TestTree::new();
    tree.write("docs/guide.md", "# Guide\nstep one\n");
    tree.write("keep.txt", "keep");
    tree.commit_at(300, "add guide");

    tree.remove("docs/guide.md");
    let entry = tree.commit_at(400, "drop guide");

    assert_eq!(entry.commits.len(), 1);
    assert_eq!(
        entry.commits[0].to_string(),
        "docs/guide.md/.commits/d400+deleted"
    );

    let archived = tree.meta_files("deleted/400/docs/guide.md/.commits");
    assert_eq!(archived.len(), 2);
    assert!(archived.contains(&"d400+deleted".to_owned()));
    assert!(tree.meta_files("keys/docs").is_empty());

    let repo = tree.repo();
    assert!(!repo.keys().unwrap().contains(&key("docs/guide.md")));
    assert!(matches!(
        repo.last_cat(&key("docs/guide.md")),
        Err(VcError::KeyNotFound { .. })
    ));
    assert_eq!(
        repo.cat_archived(400, &key("docs/guide.md"), None).unwrap(),
        Revision::Text("# Guide\nstep one\n".to_owned())
    );
}

#[test]
fn dotfile_keys_are_tracked_and_their_deletions_recorded() {
    let tree = TestTree::new();
    tree.write(".env", "TOKEN=1\n");
    tree.write(".github/ci.yml", "on: push\n");
    tree.write("a.txt", "a");
    tree.commit_at(10, "add");

    let keys: Vec<String> = tree
        .repo()
        .keys()
        .unwrap()
        .into_iter()
        .map(|k| k.as_str().to_owned())
        .collect();
    assert_eq!(keys, vec![".env", ".github/ci.yml", "a.txt"]);

    tree.remove(".env");
    let entry = tree.commit_at(20, "drop env");
    assert_eq!(entry.commits.len(), 1);
    assert_eq!(entry.commits[0].to_string(), ".env/.commits/d20+deleted");

    std::fs::remove_dir_all(tree.root().join(".github")).unwrap();
    let entry = tree.commit_at(30, "drop ci");
    assert_eq!(
        entry.commits[0].to_string(),
        ".github/ci.yml/.commits/d30+deleted"
    );
    assert_eq!(
        tree.repo()
            .cat_archived(30, &key(".github/ci.yml"), None)
            .unwrap(),
        Revision::Text("on: push\n".to_owned())
    );
    assert!(!tree.repo().keys().unwrap().contains(&key(".env")));
}

#[test]
fn readded_key_starts_a_fresh_chain() {
    let tree = TestTree::new();
    tree.write("a.txt", "old");
    tree.commit_at(1, "add");
    tree.remove("a.txt");
    tree.commit_at(2, "remove");
    tree.write("a.txt", "new");
    tree.commit_at(3, "re-add");

    let repo = tree.repo();
    assert_eq!(repo.chain().list(&key("a.txt")).unwrap().len(), 1);
    assert_eq!(repo.last_cat(&key("a.txt")).unwrap(), "new");
}

#[test]
fn file_replaced_by_directory_in_one_pass() {
    let tree = TestTree::new();
    tree.write("lib", "was a file");
    tree.commit_at(10, "file");

    tree.remove("lib");
    tree.write("lib/mod.rs", "now a dir");
    let entry = tree.commit_at(20, "dir");

    let refs: Vec<String> = entry.commits.iter().map(ToString::to_string).collect();
    assert_eq!(refs[0], "lib/.commits/d20+deleted");
    assert!(refs[1].starts_with("lib/mod.rs/.commits/d20+"));
    assert_eq!(tree.repo().last_cat(&key("lib/mod.rs")).unwrap(), "now a dir");
}

#[test]
fn binary_content_is_preserved_byte_for_byte() {
    let tree = TestTree::new();
    let mut blob: Vec<u8> = (0..=255).collect();
    blob.extend_from_slice(&[0xff, 0xfe, 0, 0]);
    tree.write("blob.dat", &blob);
    tree.commit_at(7, "blob");

    let repo = tree.repo();
    assert_eq!(
        repo.materialize(&key("blob.dat"), None).unwrap(),
        Revision::Binary(blob)
    );
}

#[test]
fn key_switching_between_text_and_binary() {
    let tree = TestTree::new();
    tree.write("data", "line\n");
    tree.commit_at(1, "text");
    tree.write("data", PNG);
    tree.commit_at(2, "binary");
    // Same text as before the binary stretch still records a revision.
    tree.write("data", "line\n");
    let entry = tree.commit_at(3, "text again");
    assert_eq!(entry.commits.len(), 1);
    assert_eq!(entry.commits[0].commit.kind(), CommitKind::Diff);

    let repo = tree.repo();
    let ids = repo.chain().list(&key("data")).unwrap();
    let kinds: Vec<CommitKind> = ids.iter().map(|id| id.kind()).collect();
    assert_eq!(
        kinds,
        vec![CommitKind::Diff, CommitKind::Binary, CommitKind::Diff]
    );
    assert_eq!(
        repo.materialize(&key("data"), Some(&ids[1])).unwrap(),
        Revision::Binary(PNG.to_vec())
    );
    assert_eq!(repo.last_cat(&key("data")).unwrap(), "line\n");
}

#[test]
fn empty_file_gets_a_first_commit() {
    let tree = TestTree::new();
    tree.write("empty", "");
    let entry = tree.commit_at(1, "empty");
    assert_eq!(entry.commits.len(), 1);
    assert_eq!(tree.repo().last_cat(&key("empty")).unwrap(), "");
}

#[test]
fn multiline_message_round_trips_through_history() {
    let tree = TestTree::new();
    tree.write("x", "x");
    tree.write("y", "y");
    tree.commit_at(9, "fix bug\n\nlonger body");

    let history = tree.repo().history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "fix bug\n\nlonger body");
    assert_eq!(history[0].commits.len(), 2);
}

#[test]
fn held_lock_rejects_a_commit() {
    let tree = TestTree::new();
    tree.write("a", "a");
    std::fs::write(tree.root().join(".vc/lock"), "12345").unwrap();
    let err = tree
        .repo()
        .full_commit("blocked", &FixedClock(1))
        .unwrap_err();
    assert!(matches!(err, VcError::CommitInProgress { .. }));
    assert!(tree.meta_files("keys").is_empty());
}

#[test]
fn ignore_patterns_from_config_are_honored() {
    let tree = TestTree::new();
    tree.write(".vc/config.toml", "[scan]\nignore = [\"*.log\", \"target\"]\n");
    tree.write("src/lib.rs", "pub fn f() {}");
    tree.write("build.log", "noise");
    tree.write("target/debug/out", [0u8, 1]);

    let entry = tree.commit_at(1, "code only");
    let keys: Vec<&str> = entry.commits.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["src/lib.rs"]);
}

#[test]
fn lcs_strategy_chains_replay_like_greedy_ones() {
    let tree = TestTree::new();
    tree.write(".vc/config.toml", "[diff]\nstrategy = \"lcs\"\n");
    tree.write("f", "a\nb\na\nc");
    tree.commit_at(1, "one");
    tree.write("f", "c\na\nb\na");
    tree.commit_at(2, "two");
    assert_eq!(tree.repo().last_cat(&key("f")).unwrap(), "c\na\nb\na");
}
