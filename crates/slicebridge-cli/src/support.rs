use crate::bindfile::BindFile;
use serde::Serialize;
use serde_json::Value;
use slicebridge_store::Store;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn load_bind_file_or_exit(path: &str) -> BindFile {
    BindFile::load(Path::new(path)).unwrap_or_else(|e| exit_with(e))
}

pub fn load_snapshot_or_exit(path: &str) -> Store {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with(format!("failed to read {path}: {e}")));
    let snapshot: Value = serde_json::from_str(&text)
        .unwrap_or_else(|e| exit_with(format!("invalid snapshot {path}: {e}")));
    Store::hydrate(snapshot).unwrap_or_else(|e| exit_with(format!("invalid snapshot {path}: {e}")))
}

pub fn write_snapshot_or_exit(path: &str, store: &Store) {
    let bytes = serde_json::to_vec_pretty(&store.snapshot())
        .unwrap_or_else(|e| exit_with(format!("failed to serialize snapshot: {e}")));
    fs::write(path, bytes).unwrap_or_else(|e| exit_with(format!("failed to write {path}: {e}")));
}

pub fn print_json_or_exit<T: Serialize>(payload: &T) {
    let text = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|e| exit_with(format!("json serialization failed: {e}")));
    println!("{text}");
}

/// Split `field=value`. The value is parsed as JSON; anything that is not
/// valid JSON is taken as a plain string.
pub fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{raw}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}
