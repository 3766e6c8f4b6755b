use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "slicebridge-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_slicebridge<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_slicebridge");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("slicebridge command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_bind_file(path: &Path, remove_on_destroy: bool) {
    let text = format!(
        r#"kind = "test"

[settings]
removeOnDestroy = {remove_on_destroy}

[initialState]
foo = 100
label = "card"
"#
    );
    fs::write(path, text).expect("bind file should be written");
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn mount_default_key_json() {
    let tmp = TempDirGuard::new("mount-default");
    let config = tmp.path().join("bind.toml");
    write_bind_file(&config, false);

    let output = run_slicebridge(["mount", "--config", path_arg(&config).as_str(), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["kind"], "test");
    assert_eq!(payload["namespace"], "bridge");
    assert_eq!(payload["revision"], 1);
    assert_eq!(payload["instances"][0]["key"], "default");
    assert_eq!(payload["instances"][0]["lifecycle"], "active");
    assert_eq!(
        payload["tree"],
        json!({ "bridge": { "test": { "default": { "foo": 100, "label": "card" } } } })
    );
}

#[test]
fn mount_keys_and_sets_write_every_instance() {
    let tmp = TempDirGuard::new("mount-keys");
    let config = tmp.path().join("bind.toml");
    write_bind_file(&config, false);

    let output = run_slicebridge([
        "mount",
        "--config",
        path_arg(&config).as_str(),
        "--key",
        "1",
        "--key",
        "2",
        "--set",
        "foo=200",
        "--json",
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(
        payload["tree"]["bridge"]["test"],
        json!({
            "1": { "foo": 200, "label": "card" },
            "2": { "foo": 200, "label": "card" },
        })
    );
}

#[test]
fn mount_destroy_with_removal_keeps_namespace_only() {
    let tmp = TempDirGuard::new("mount-destroy");
    let config = tmp.path().join("bind.toml");
    write_bind_file(&config, true);

    let output = run_slicebridge([
        "mount",
        "--config",
        path_arg(&config).as_str(),
        "--key",
        "a",
        "--destroy",
        "--json",
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["instances"][0]["lifecycle"], "destroyed");
    assert_eq!(payload["instances"][0]["state"], Value::Null);
    assert_eq!(payload["tree"], json!({ "bridge": { "test": {} } }));
}

#[test]
fn mount_snapshot_round_trip_through_inspect() {
    let tmp = TempDirGuard::new("round-trip");
    let config = tmp.path().join("bind.toml");
    let snapshot = tmp.path().join("store.json");
    write_bind_file(&config, false);

    let first = run_slicebridge([
        "mount",
        "--config",
        path_arg(&config).as_str(),
        "--key",
        "a",
        "--set",
        "foo=7",
        "--out",
        path_arg(&snapshot).as_str(),
    ]);
    assert_success(&first);
    assert!(stdout_text(&first).contains("slicebridge mount test"));

    let second = run_slicebridge([
        "mount",
        "--config",
        path_arg(&config).as_str(),
        "--snapshot",
        path_arg(&snapshot).as_str(),
        "--key",
        "a",
        "--key",
        "b",
        "--json",
    ]);
    assert_success(&second);
    let payload = parse_json_stdout(&second);
    assert_eq!(payload["tree"]["bridge"]["test"]["a"]["foo"], 7);
    assert_eq!(payload["tree"]["bridge"]["test"]["b"]["foo"], 100);

    let inspect = run_slicebridge([
        "inspect",
        "--snapshot",
        path_arg(&snapshot).as_str(),
        "--json",
    ]);
    assert_success(&inspect);
    let payload = parse_json_stdout(&inspect);
    assert_eq!(payload["namespace"], "bridge");
    assert_eq!(
        payload["kinds"]["test"],
        json!([{ "key": "a", "fields": ["foo", "label"] }])
    );
}

#[test]
fn inspect_text_lists_kinds() {
    let tmp = TempDirGuard::new("inspect-text");
    let snapshot = tmp.path().join("store.json");
    fs::write(
        &snapshot,
        serde_json::to_vec_pretty(&json!({
            "bridge": { "Card": { "x": { "foo": 1 } }, "List": {} }
        }))
        .expect("snapshot should serialize"),
    )
    .expect("snapshot should be written");

    let output = run_slicebridge(["inspect", "--snapshot", path_arg(&snapshot).as_str()]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("Component kinds: 2"));
    assert!(text.contains("Card (1 slices)"));
    assert!(text.contains("x: foo"));
}

#[test]
fn mount_rejects_undeclared_field() {
    let tmp = TempDirGuard::new("undeclared");
    let config = tmp.path().join("bind.toml");
    write_bind_file(&config, false);

    let output = run_slicebridge([
        "mount",
        "--config",
        path_arg(&config).as_str(),
        "--set",
        "missing=1",
    ]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("error:"));
    assert!(stderr_text(&output).contains("missing"));
}

#[test]
fn mount_rejects_blank_kind() {
    let tmp = TempDirGuard::new("blank-kind");
    let config = tmp.path().join("bind.toml");
    fs::write(&config, "kind = \"\"\n").expect("bind file should be written");

    let output = run_slicebridge(["mount", "--config", path_arg(&config).as_str()]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("kind"));
}

#[test]
fn inspect_missing_namespace_fails() {
    let tmp = TempDirGuard::new("missing-ns");
    let snapshot = tmp.path().join("store.json");
    fs::write(&snapshot, "{}").expect("snapshot should be written");

    let output = run_slicebridge([
        "inspect",
        "--snapshot",
        path_arg(&snapshot).as_str(),
        "--namespace",
        "ui",
    ]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("no namespace `ui`"));
}
