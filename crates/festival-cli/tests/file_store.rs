//! CLI integration tests against the file-backed store.

mod common;

use tempfile::TempDir;

use common::{
    DESCRIPTION, file_store_url, run_cli, run_cli_success, run_cli_with_stdin, upload_booth,
};

fn list_json(store: &str, extra: &[&str]) -> Vec<serde_json::Value> {
    let mut args = vec!["list", "--json"];
    args.extend_from_slice(extra);
    run_cli_success(&args, store)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_upload_then_list() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store_url(&temp_dir.path().join("store"));

    let id = upload_booth(temp_dir.path(), &store, "Lemonade Stand");

    let records = list_json(&store, &[]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], id.as_str());
    assert_eq!(records[0]["title"], "Lemonade Stand");
    assert_eq!(records[0]["studentsName"], "Kim");
    assert_eq!(records[0]["description"], DESCRIPTION);
    assert_eq!(records[0]["likes"], 0);

    let image_url = records[0]["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("file://"));
    assert!(image_url.ends_with(&format!("festival-booths/{}.png", id)));
}

#[test]
fn test_like_show_delete() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store_url(&temp_dir.path().join("store"));
    let id = upload_booth(temp_dir.path(), &store, "Lemonade Stand");

    assert_eq!(run_cli_success(&["like", &id], &store).trim(), "1");
    assert_eq!(run_cli_success(&["like", &id], &store).trim(), "2");

    let shown: serde_json::Value =
        serde_json::from_str(&run_cli_success(&["show", &id, "--json"], &store)).unwrap();
    assert_eq!(shown["likes"], 2);

    run_cli_success(&["delete", &id], &store);
    assert!(list_json(&store, &[]).is_empty());

    let output = run_cli(&["show", &id], &store);
    assert!(!output.status.success());
}

#[test]
fn test_list_sorted_by_likes() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store_url(&temp_dir.path().join("store"));

    let first = upload_booth(temp_dir.path(), &store, "Lemonade Stand");
    let second = upload_booth(temp_dir.path(), &store, "Tea Corner");
    run_cli_success(&["like", &first], &store);

    let by_created: Vec<_> = list_json(&store, &[])
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(by_created, vec![second.clone(), first.clone()]);

    let by_likes: Vec<_> = list_json(&store, &["--sort", "likes"])
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(by_likes, vec![first, second]);
}

#[test]
fn test_upload_rejects_invalid_form() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store_url(&temp_dir.path().join("store"));
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "not an image").unwrap();

    let output = run_cli(
        &[
            "upload",
            notes.to_str().unwrap(),
            "--title",
            "L",
            "--author",
            "Kim",
            "--description",
            DESCRIPTION,
        ],
        &store,
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Title must be at least 2 characters."));
    assert!(stderr.contains("Please upload an image file."));
    assert!(list_json(&store, &[]).is_empty());
}

#[test]
fn test_invalid_store_url() {
    let output = run_cli(&["list"], "ftp://example.com/");
    assert!(!output.status.success());
}

#[test]
fn test_dashboard_lists_and_selects() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store_url(&temp_dir.path().join("store"));
    let id = upload_booth(temp_dir.path(), &store, "Lemonade Stand");

    let output = run_cli_with_stdin(
        &["dashboard"],
        &store,
        &format!("list\nselect {}\nselect ghost\nquit\n", id),
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Lemonade Stand"));
    assert!(stdout.contains(DESCRIPTION));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No booth ghost in the feed"));
}
