use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use url::Url;

pub const DESCRIPTION: &str = "Serves fresh lemonade to thirsty festival-goers all day long";

/// A one-pixel PNG.
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89,
];

/// `file://` URL for a store directory.
pub fn file_store_url(path: &Path) -> String {
    Url::from_directory_path(path)
        .expect("Failed to convert path to file URL")
        .to_string()
}

fn command(args: &[&str], store: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_festival"));
    cmd.args(args);
    cmd.env("FESTIVAL_STORE", store);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Run the CLI against `store`.
pub fn run_cli(args: &[&str], store: &str) -> Output {
    command(args, store)
        .output()
        .expect("Failed to execute CLI")
}

/// Run the CLI against `store` and expect success.
pub fn run_cli_success(args: &[&str], store: &str) -> String {
    let output = run_cli(args, store);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI with `input` on stdin.
pub fn run_cli_with_stdin(args: &[&str], store: &str, input: &str) -> Output {
    let mut child = command(args, store)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for CLI")
}

/// Write the test image and upload a booth with it, returning its id.
pub fn upload_booth(dir: &Path, store: &str, title: &str) -> String {
    let image = dir.join("stand.png");
    std::fs::write(&image, PNG).unwrap();

    let stdout = run_cli_success(
        &[
            "upload",
            image.to_str().unwrap(),
            "--title",
            title,
            "--author",
            "Kim",
            "--description",
            DESCRIPTION,
        ],
        store,
    );
    stdout.lines().next().unwrap().trim().to_string()
}
