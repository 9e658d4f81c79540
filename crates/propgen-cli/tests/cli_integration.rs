use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the workspace root (two levels up from CARGO_MANIFEST_DIR of propgen-cli)
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent() // crates/
        .unwrap()
        .parent() // workspace root
        .unwrap()
        .to_path_buf()
}

fn propgen_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_propgen"));
    cmd.current_dir(workspace_root());
    cmd
}

fn generate_into(out: &Path, extra: &[&str]) -> std::process::Output {
    propgen_bin()
        .args([
            "generate",
            "samples/introspection",
            "samples/config.yaml",
            "samples/fragments.yaml",
            out.to_str().unwrap(),
        ])
        .args(extra)
        .output()
        .expect("failed to run")
}

#[test]
fn cli_help() {
    let output = propgen_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("versioned property accessors"));
}

#[test]
fn cli_version() {
    let output = propgen_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.3.0"));
}

#[test]
fn cli_missing_arguments_is_usage_error() {
    let output = propgen_bin().arg("generate").output().expect("failed to run");
    assert_eq!(output.status.code(), Some(100));
}

// ── Generate ─────────────────────────────────────────────────

#[test]
fn cli_generate_samples() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("generated");
    let output = generate_into(&out, &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Generated 5 classes (9 files)"), "stdout: {stdout}");
    assert!(stdout.contains("0 errors"), "stdout: {stdout}");

    let root = std::fs::read_to_string(out.join("mod.rs")).unwrap();
    assert!(root.contains("pub mod catalog;"));
    assert!(root.contains("pub mod descriptors;"));
    assert!(root.contains("pub mod model;"));

    let table = std::fs::read_to_string(out.join("catalog").join("table.rs")).unwrap();
    assert!(table.contains("pub struct Table;"));
    assert!(table.contains("counts: &[3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 5, 5],"));
    assert!(table.contains("pub mod cloud_warehouse {"));

    let login = std::fs::read_to_string(out.join("catalog").join("login.rs")).unwrap();
    assert!(login.contains("pub fn is_windows_login"));
    assert!(login.contains("ReferenceTarget::Template(\"Server/Database[@Name='{0}']\")"));

    let index = std::fs::read_to_string(out.join("catalog").join("mod.rs")).unwrap();
    assert!(index.contains("pub mod server_role;"));

    assert!(out.join("model").join("catalog").join("database.rs").exists());
    assert!(!out.join("model").join("catalog").join("server.rs").exists());
    let model_path = out.join("model").join("catalog").join("table.rs");
    let model = std::fs::read_to_string(model_path).unwrap();
    assert!(model.contains("pub trait TableModel {"));
    assert!(model.contains("fn schema(&self) -> String;"));
    assert!(!model.contains("row_count"));
}

#[test]
fn cli_generate_single_class() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("generated");
    let output = generate_into(&out, &["--class", "Login"]);
    assert!(output.status.success());

    assert!(out.join("catalog").join("login.rs").exists());
    assert!(!out.join("catalog").join("table.rs").exists());
    let index = std::fs::read_to_string(out.join("catalog").join("mod.rs")).unwrap();
    assert_eq!(index.lines().filter(|l| l.starts_with("pub mod")).count(), 1);
}

#[test]
fn cli_generate_type_conflict() {
    let tmp = tempfile::tempdir().unwrap();
    let output = propgen_bin()
        .args([
            "generate",
            "samples/conflict/introspection",
            "samples/conflict/config.yaml",
            "samples/fragments.yaml",
            tmp.path().to_str().unwrap(),
        ])
        .output()
        .expect("failed to run");
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("error[PG-E002]: Catalog.Widget (standalone):"),
        "stdout: {stdout}"
    );
    assert!(!tmp.path().join("catalog").join("widget.rs").exists());
}

#[test]
fn cli_generate_nonexistent_endpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let output = propgen_bin()
        .args([
            "generate",
            "nonexistent/endpoint",
            "samples/config.yaml",
            "samples/fragments.yaml",
            tmp.path().to_str().unwrap(),
        ])
        .output()
        .expect("failed to run");
    assert_eq!(output.status.code(), Some(101));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
}

#[test]
fn cli_generate_output_is_a_file() {
    let output = generate_into(Path::new("samples/config.yaml"), &[]);
    assert_eq!(output.status.code(), Some(100));
}

// ── Check ────────────────────────────────────────────────────

#[test]
fn cli_check_clean() {
    let output = propgen_bin()
        .args(["check", "samples/config.yaml"])
        .output()
        .expect("failed to run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0 errors, 0 warnings in 5 classes."));
}

#[test]
fn cli_check_json_format() {
    let output = propgen_bin()
        .args(["check", "samples/config.yaml", "--format", "json"])
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    let result: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON output");
    assert_eq!(result["summary"]["errors"], 0);
    assert_eq!(result["summary"]["namespaces"], 1);
}

#[test]
fn cli_check_with_errors() {
    let output = propgen_bin()
        .args(["check", "samples/bad-parent.yaml"])
        .output()
        .expect("failed to run");
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("error[PG-E007]: Catalog.Login:"), "stdout: {stdout}");
}

#[test]
fn cli_check_nonexistent() {
    let output = propgen_bin()
        .args(["check", "nonexistent.yaml"])
        .output()
        .expect("failed to run");
    assert_eq!(output.status.code(), Some(101));
}

// ── Tables / epochs ──────────────────────────────────────────

#[test]
fn cli_tables_json() {
    let output = propgen_bin()
        .args([
            "tables",
            "samples/introspection",
            "samples/config.yaml",
            "--class",
            "Table",
        ])
        .output()
        .expect("failed to run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("invalid JSON output");
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["format_version"], "1.0");

    let classes = v["data"]["classes"].as_array().unwrap();
    assert_eq!(classes.len(), 1);
    let families = classes[0]["families"].as_array().unwrap();
    assert_eq!(families.len(), 3);
    assert_eq!(families[1]["table"]["family"], "cloud");
    assert_eq!(families[1]["table"]["counts"], serde_json::json!([0, 0, 5]));
    assert_eq!(families[2]["table"]["counts"], serde_json::json!([3]));
}

#[test]
fn cli_epochs() {
    let output = propgen_bin().arg("epochs").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("standalone"));
    assert!(stdout.contains("17.0.max"));
    assert!(stdout.contains("cloud-warehouse"));
}
