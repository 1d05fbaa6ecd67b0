//! Integration tests for the full dropfs stack.
//!
//! Drives a real `SandboxFs` through both entry points: the REST-style
//! `FileStore` calls and the whitelisted command shell.

use dropfs_core::{CommandStatus, ErrorKind, FileStore, Limits, TextPayload};
use dropfs_sandbox::SandboxFs;
use dropfs_shell::CommandDispatcher;
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

/// Root directory plus both entry points over it.
struct Harness {
    _temp: TempDir,
    store: Arc<SandboxFs>,
    shell: CommandDispatcher,
}

impl Harness {
    fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    fn with_limits(limits: Limits) -> Self {
        let temp = tempdir().unwrap();
        let store = Arc::new(SandboxFs::open(temp.path(), limits).unwrap());
        let shell = CommandDispatcher::new(store.clone());
        Self {
            _temp: temp,
            store,
            shell,
        }
    }

    fn root(&self) -> &Path {
        self.store.root().path()
    }

    /// Every file and directory under the root, sorted.
    fn tree(&self) -> Vec<String> {
        fn walk(dir: &Path, base: &Path, out: &mut Vec<String>) {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                out.push(path.strip_prefix(base).unwrap().to_string_lossy().into_owned());
                if path.is_dir() {
                    walk(&path, base, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self.root(), self.root(), &mut out);
        out.sort();
        out
    }
}

// ========== Command Scenarios ==========

#[tokio::test]
async fn test_cat_notes() {
    let h = Harness::new();
    std::fs::write(h.root().join("notes.txt"), "hi").unwrap();

    let out = h.shell.run("cat notes.txt").await;

    assert_eq!(out.status, CommandStatus::Ok);
    assert_eq!(out.output, vec!["hi"]);
    assert_eq!(out.error, None);
}

#[tokio::test]
async fn test_ls_outside_root_lists_nothing() {
    let h = Harness::new();
    std::fs::write(h.root().join("visible.txt"), "x").unwrap();

    let out = h.shell.run("ls ../../etc").await;

    assert!(!out.is_ok());
    assert_eq!(out.error_kind, Some(ErrorKind::PathEscape));
    assert!(out.output.is_empty());
}

#[tokio::test]
async fn test_rm_missing_is_well_formed() {
    let h = Harness::new();

    let out = h.shell.run("rm missing.txt").await;

    assert_eq!(out.command, "rm missing.txt");
    assert_eq!(out.status, CommandStatus::Error);
    assert_eq!(out.error_kind, Some(ErrorKind::NotFound));
    assert!(out.output.is_empty());

    // Dispatcher keeps working
    let out = h.shell.run("touch present.txt").await;
    assert_eq!(out.output, vec!["created present.txt"]);
}

#[tokio::test]
async fn test_session_of_commands() {
    let h = Harness::new();

    for (command, expected) in [
        ("touch draft.txt", "created draft.txt"),
        ("mv draft.txt final.txt", "renamed draft.txt -> final.txt"),
        ("rm final.txt", "removed final.txt"),
        ("ls", "(empty)"),
    ] {
        let out = h.shell.run(command).await;
        assert_eq!(out.output, vec![expected], "{command}");
    }
}

// ========== REST-style Scenarios ==========

#[tokio::test]
async fn test_write_creates_parents() {
    let h = Harness::new();

    let summary = h
        .store
        .write_text("a/b/c.txt", &TextPayload::new("x"))
        .await
        .unwrap();

    assert_eq!(summary.bytes_written, 1);
    assert!(h.root().join("a").is_dir());
    assert!(h.root().join("a/b").is_dir());
    assert_eq!(std::fs::read_to_string(h.root().join("a/b/c.txt")).unwrap(), "x");
    assert_eq!(h.tree(), vec!["a", "a/b", "a/b/c.txt"]);
}

#[tokio::test]
async fn test_oversized_write_leaves_target_unchanged() {
    let h = Harness::new();
    std::fs::write(h.root().join("big.txt"), "original").unwrap();

    let payload = TextPayload::new("y".repeat(524_289));
    let err = h.store.write_text("big.txt", &payload).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TooLarge);
    assert_eq!(std::fs::read(h.root().join("big.txt")).unwrap(), b"original");
    assert_eq!(h.tree(), vec!["big.txt"]);
}

#[tokio::test]
async fn test_write_at_exact_limit_succeeds() {
    let h = Harness::new();

    let payload = TextPayload::new("z".repeat(524_288));
    h.store.write_text("exact.txt", &payload).await.unwrap();

    let back = h.store.read_text("exact.txt").await.unwrap();
    assert_eq!(back.len(), 524_288);
}

#[tokio::test]
async fn test_configured_limit_applies_to_reads_and_writes() {
    let h = Harness::with_limits(Limits { max_text_bytes: 4 });
    std::fs::write(h.root().join("long.txt"), "12345").unwrap();

    let err = h.store.read_text("long.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooLarge);

    let out = h.shell.run("cat long.txt").await;
    assert_eq!(out.error_kind, Some(ErrorKind::TooLarge));

    let err = h
        .store
        .write_text("new.txt", &TextPayload::new("12345"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TooLarge);
}

#[tokio::test]
async fn test_escaping_paths_touch_nothing() {
    let h = Harness::new();
    let outside = tempdir().unwrap();
    let target = outside.path().join("victim.txt");
    std::fs::write(&target, "safe").unwrap();

    let escape = format!("../{}/victim.txt", outside.path().display());
    let err = h
        .store
        .write_text(&escape, &TextPayload::new("pwned"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PathEscape);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "safe");
    assert!(h.tree().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_planted_symlink_is_contained() {
    let h = Harness::new();
    let outside = tempdir().unwrap();
    std::fs::write(outside.path().join("secret.txt"), "secret").unwrap();
    std::os::unix::fs::symlink(outside.path(), h.root().join("planted")).unwrap();

    let out = h.shell.run("cat planted/secret.txt").await;
    assert_eq!(out.error_kind, Some(ErrorKind::PathEscape));

    let out = h.shell.run("rm planted/secret.txt").await;
    assert_eq!(out.error_kind, Some(ErrorKind::PathEscape));
    assert!(outside.path().join("secret.txt").exists());

    let err = h
        .store
        .write_text("planted/new.txt", &TextPayload::new("x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathEscape);
    assert!(!outside.path().join("new.txt").exists());
}

#[tokio::test]
async fn test_rename_round_trip_restores_layout() {
    let h = Harness::new();
    std::fs::create_dir(h.root().join("docs")).unwrap();
    std::fs::write(h.root().join("docs/a.txt"), "alpha").unwrap();
    let before = h.tree();

    h.store.rename("docs/a.txt", "docs/b.txt").await.unwrap();
    h.store.rename("docs/b.txt", "docs/a.txt").await.unwrap();

    assert_eq!(h.tree(), before);
    assert_eq!(std::fs::read_to_string(h.root().join("docs/a.txt")).unwrap(), "alpha");
}

#[tokio::test]
async fn test_touch_never_truncates() {
    let h = Harness::new();
    std::fs::write(h.root().join("log.txt"), "line one\nline two\n").unwrap();

    let summary = h.store.touch("log.txt").await.unwrap();

    assert!(!summary.created);
    assert_eq!(
        std::fs::read_to_string(h.root().join("log.txt")).unwrap(),
        "line one\nline two\n"
    );
}

#[tokio::test]
async fn test_no_temp_files_remain() {
    let h = Harness::new();

    for i in 0..5 {
        h.store
            .write_text("same.txt", &TextPayload::new(format!("version {i}")))
            .await
            .unwrap();
    }
    let _ = h
        .store
        .write_text("same.txt", &TextPayload::new("x".repeat(600_000)))
        .await;

    assert_eq!(h.tree(), vec!["same.txt"]);
    assert_eq!(
        std::fs::read_to_string(h.root().join("same.txt")).unwrap(),
        "version 4"
    );
}

#[tokio::test]
async fn test_concurrent_writers_leave_one_whole_version() {
    let h = Harness::new();
    let contents: Vec<String> = (0..8).map(|i| format!("writer {i} ").repeat(1000)).collect();

    let handles: Vec<_> = contents
        .iter()
        .cloned()
        .map(|content| {
            let store = h.store.clone();
            tokio::spawn(async move {
                store
                    .write_text("shared.txt", &TextPayload::new(content))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let result = std::fs::read_to_string(h.root().join("shared.txt")).unwrap();
    assert!(contents.contains(&result));
    assert_eq!(h.tree(), vec!["shared.txt"]);
}

#[tokio::test]
async fn test_uploads_are_listed_case_insensitively() {
    let h = Harness::new();

    h.store.store_upload("b-notes.txt", b"bbbb").await.unwrap();
    h.store.store_upload("A Report.pdf", b"%PDF-1.7").await.unwrap();
    h.store.store_upload("../c.txt", b"cc").await.unwrap();

    let entries = h.store.list("").await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["AReport.pdf", "b-notes.txt", "c.txt"]);
    assert_eq!(entries[0].size_bytes, Some(8));
}
