// Drift detection and downloader dispatch against a local snippet server


use snipty::downloader::DownloadError;
use snipty::project::{Comparison, FileStatus};
use snipty::{Artifact, CheckOutcome, SniptyError};
use test_helpers::{SnippetServer, TestEnvironment};

#[tokio::test]
async fn test_check_detects_local_edit() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.text("/a.txt", "line one\n");

    env.manager(&server).install("a.txt", &url, false).await.unwrap();

    let mut pm = env.manager(&server);
    let report = pm.check("a.txt", false).await.unwrap();
    assert_eq!(report.discrepancies(), 0);
    assert!(
        pm.reporter()
            .messages()
            .contains(&"✔ Snippet a.txt present and up to date.".to_string())
    );

    env.append("a.txt", "local change\n");

    let mut pm = env.manager(&server);
    let report = pm.check("a.txt", false).await.unwrap();
    assert_eq!(report.discrepancies(), 1);
    assert!(matches!(
        report.outcome,
        CheckOutcome::Compared(Comparison::File { changed: true, diff: None })
    ));
    assert!(
        pm.reporter()
            .messages()
            .contains(&"❌ Snippet a.txt has changed.".to_string())
    );
}

#[tokio::test]
async fn test_check_detects_remote_change_with_diff() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.text("/a.py", "x = 1\ny = 2\n");

    env.manager(&server).install("a.py", &url, false).await.unwrap();
    server.text("/a.py", "x = 1\ny = 3\n");

    let mut pm = env.manager(&server);
    let report = pm.check("a.py", true).await.unwrap();
    assert_eq!(report.discrepancies(), 1);

    let messages = pm.reporter().messages();
    assert!(messages.contains(&"  x = 1".to_string()));
    assert!(messages.contains(&"- y = 2".to_string()));
    assert!(messages.contains(&"+ y = 3".to_string()));
}

#[tokio::test]
async fn test_check_untracked_makes_no_requests() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    env.write("snipty.yml", "{}\n");

    let mut pm = env.manager(&server);
    let report = pm.check("nope.txt", false).await.unwrap();
    assert!(matches!(report.outcome, CheckOutcome::NotTracked));
    assert_eq!(report.discrepancies(), 1);
    assert_eq!(server.total_hits(), 0);
}

#[tokio::test]
async fn test_check_tracked_but_missing_from_disk() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.text("/a.txt", "a");

    env.manager(&server).install("a.txt", &url, false).await.unwrap();
    std::fs::remove_file(env.path("a.txt")).unwrap();

    let report = env.manager(&server).check("a.txt", false).await.unwrap();
    assert!(matches!(report.outcome, CheckOutcome::NotOnDisk));
    assert_eq!(report.discrepancies(), 1);
    assert_eq!(server.hits("/a.txt"), 1);
}

#[tokio::test]
async fn test_check_all_counts_drifted_snippets() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let a = server.text("/a.txt", "a");
    let b = server.text("/b.txt", "b");
    let c = server.text("/c.txt", "c");

    let mut pm = env.manager(&server);
    pm.install("a.txt", &a, false).await.unwrap();
    pm.install("b.txt", &b, false).await.unwrap();
    pm.install("c.txt", &c, false).await.unwrap();

    assert_eq!(env.manager(&server).check_all(false).await.unwrap().drifted(), 0);

    env.append("a.txt", "!");
    assert_eq!(env.manager(&server).check_all(false).await.unwrap().drifted(), 1);

    env.append("c.txt", "!");
    let summary = env.manager(&server).check_all(false).await.unwrap();
    assert_eq!(summary.drifted(), 2);
    assert_eq!(summary.reports.len(), 3);
}

#[tokio::test]
async fn test_check_all_continues_past_download_failure() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let a = server.text("/a.txt", "a");
    let b = server.text("/b.txt", "b");

    let mut pm = env.manager(&server);
    pm.install("a.txt", &a, false).await.unwrap();
    pm.install("b.txt", &b, false).await.unwrap();

    server.set("/a.txt", 500, Some("text/plain"), "boom");

    let mut pm = env.manager(&server);
    let summary = pm.check_all(false).await.unwrap();
    assert_eq!(summary.drifted(), 1);
    assert!(matches!(summary.reports[0].outcome, CheckOutcome::Unverified(_)));
    assert!(matches!(
        summary.reports[1].outcome,
        CheckOutcome::Compared(Comparison::File { changed: false, .. })
    ));
    assert!(
        pm.reporter()
            .messages()
            .iter()
            .any(|m| m.starts_with("Error: Snippet a.txt cannot be downloaded"))
    );
    assert_eq!(env.leftover_downloads(), 0);
}

#[tokio::test]
async fn test_check_single_propagates_download_failure() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.text("/a.txt", "a");

    env.manager(&server).install("a.txt", &url, false).await.unwrap();
    server.set("/a.txt", 404, Some("text/plain"), "gone");

    let err = env.manager(&server).check("a.txt", false).await.unwrap_err();
    assert!(matches!(
        err,
        SniptyError::Download {
            source: DownloadError::Status { status: 404, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_multi_file_gist_installs_directory() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.gist("f00d", &[("first.py", "1\n"), ("second.py", "2\n")]);

    let result = env
        .manager(&server)
        .install("lib/helpers.py", &url, false)
        .await
        .unwrap();

    assert!(result.is_dir);
    assert_eq!(env.read("lib/helpers.py/first.py"), "1\n");
    assert_eq!(env.read("lib/helpers.py/second.py"), "2\n");
    assert!(env.path("lib/__init__.py").exists());
    assert!(env.path("lib/helpers.py/__init__.py").exists());
    assert_eq!(server.hits("/gists/f00d"), 1);
}

#[tokio::test]
async fn test_single_file_gist_installs_file() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.gist("beef", &[("only.sh", "echo only\n")]);

    let result = env.manager(&server).install("only.sh", &url, false).await.unwrap();
    assert!(!result.is_dir);
    assert_eq!(env.read("only.sh"), "echo only\n");
}

#[tokio::test]
async fn test_empty_gist_is_an_error() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.gist("e0", &[]);

    let err = env
        .manager(&server)
        .install("empty.txt", &url, false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SniptyError::Download {
            source: DownloadError::EmptyGist(ref id),
            ..
        } if id == "e0"
    ));
    assert!(!env.path("empty.txt").exists());
    assert_eq!(env.manifest().trim(), "{}");
}

#[tokio::test]
async fn test_gist_filename_cannot_escape() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.gist("bad", &[("../escape.txt", "x"), ("ok.txt", "y")]);

    let err = env.dispatcher(&server).fetch(&url).await.unwrap_err();
    assert!(matches!(err, SniptyError::Download { .. }));
    assert!(!env.temp_dir.path().join("escape.txt").exists());
    assert_eq!(env.leftover_downloads(), 0);
}

#[tokio::test]
async fn test_directory_drift_reports_each_file() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.gist("d1", &[("a.txt", "a\n"), ("b.txt", "b\n")]);

    env.manager(&server).install("pair", &url, false).await.unwrap();
    env.append("pair/a.txt", "edited\n");
    std::fs::remove_file(env.path("pair/b.txt")).unwrap();

    let mut pm = env.manager(&server);
    let report = pm.check("pair", true).await.unwrap();
    assert_eq!(report.discrepancies(), 1);

    let CheckOutcome::Compared(Comparison::Dir { files }) = &report.outcome else {
        panic!("expected a directory comparison, got {:?}", report.outcome);
    };
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].status, FileStatus::Changed);
    assert_eq!(files[1].status, FileStatus::Missing);

    let messages = pm.reporter().messages();
    assert!(messages.contains(&"❌ Snippet pair file a.txt has changed.".to_string()));
    assert!(messages.contains(&"❌ Snippet pair file b.txt is not present.".to_string()));
    assert!(messages.contains(&"- edited".to_string()));
}

#[tokio::test]
async fn test_directory_extra_local_files_are_ignored() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.gist("d2", &[("a.txt", "a"), ("b.txt", "b")]);

    env.manager(&server).install("pair", &url, false).await.unwrap();
    env.write("pair/notes.md", "mine");

    let report = env.manager(&server).check("pair", false).await.unwrap();
    assert_eq!(report.discrepancies(), 0);
}

#[tokio::test]
async fn test_kind_mismatch_counts_as_drift() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = server.gist("k1", &[("a.txt", "a")]);

    env.manager(&server).install("kind", &url, false).await.unwrap();
    assert!(env.path("kind").is_file());

    // The gist grows a second file upstream
    server.gist("k1", &[("a.txt", "a"), ("b.txt", "b")]);

    let mut pm = env.manager(&server);
    let report = pm.check("kind", false).await.unwrap();
    assert!(matches!(
        report.outcome,
        CheckOutcome::Compared(Comparison::KindMismatch)
    ));
    assert_eq!(report.discrepancies(), 1);
    assert!(
        pm.reporter()
            .messages()
            .contains(&"❌ Snippet kind has changed between single and multi file.".to_string())
    );
}

#[tokio::test]
async fn test_paste_fetches_raw_view() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    server.set("/paste/abc/raw", 200, Some("text/plain"), "pasted");

    let artifact = env
        .dispatcher(&server)
        .fetch(&server.url("/paste/abc"))
        .await
        .unwrap();
    assert!(!artifact.is_dir());
    assert_eq!(std::fs::read_to_string(artifact.path()).unwrap(), "pasted");
    assert_eq!(server.hits("/paste/abc"), 0);
    assert_eq!(server.hits("/paste/abc/raw"), 1);
}

#[tokio::test]
async fn test_text_rejects_non_text_content() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    server.set("/page", 200, Some("text/html; charset=utf-8"), "<html></html>");

    let err = env
        .dispatcher(&server)
        .fetch(&server.url("/page"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SniptyError::Download {
            source: DownloadError::ContentType { .. },
            ..
        }
    ));
    assert_eq!(env.leftover_downloads(), 0);
}

#[tokio::test]
async fn test_text_accepts_python_source() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    server.set("/mod.py", 200, Some("text/x-python"), "pass\n");

    let artifact = env
        .dispatcher(&server)
        .fetch(&server.url("/mod.py"))
        .await
        .unwrap();
    assert!(matches!(artifact, Artifact::File(_)));

    // The temp file goes away with the artifact
    let path = artifact.path().to_path_buf();
    drop(artifact);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_text_rejects_error_status() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;

    let err = env
        .dispatcher(&server)
        .fetch(&server.url("/missing.txt"))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("HTTP 404"), "unexpected message: {}", message);
}

fn truncated_gist(server: &SnippetServer, id: &str, filename: &str, raw_path: &str) -> String {
    let mut files = serde_json::Map::new();
    files.insert(
        filename.to_string(),
        serde_json::json!({
            "filename": filename,
            "content": "FULL",
            "truncated": true,
            "raw_url": server.url(raw_path),
        }),
    );
    let payload = serde_json::json!({ "id": id, "files": files });
    server.set(
        &format!("/gists/{}", id),
        200,
        Some("application/json"),
        &payload.to_string(),
    );
    server.gist_url(id)
}

#[tokio::test]
async fn test_truncated_gist_file_is_fetched_whole() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    server.set("/raw/big.txt", 200, Some("text/plain"), "FULL CONTENT\n");
    let url = truncated_gist(&server, "t1", "big.txt", "/raw/big.txt");

    env.manager(&server).install("big.txt", &url, false).await.unwrap();

    assert_eq!(env.read("big.txt"), "FULL CONTENT\n");
    assert_eq!(server.hits("/gists/t1"), 1);
    assert_eq!(server.hits("/raw/big.txt"), 1);
}

#[tokio::test]
async fn test_truncated_gist_raw_failure_reports_status() {
    let env = TestEnvironment::new();
    let server = SnippetServer::spawn().await;
    let url = truncated_gist(&server, "t2", "gone.txt", "/raw/gone.txt");

    let err = env
        .manager(&server)
        .install("gone.txt", &url, false)
        .await
        .unwrap_err();
    match err {
        SniptyError::Download {
            source: DownloadError::Status { url, status },
            ..
        } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/raw/gone.txt"), "unexpected url: {}", url);
        }
        other => panic!("expected a status error, got {:?}", other),
    }
    assert!(!env.path("gone.txt").exists());
    assert_eq!(env.leftover_downloads(), 0);
}
