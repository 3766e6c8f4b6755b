//! TOML bind files: one component kind with its bridge settings and
//! initial slice.

use serde::Deserialize;
use serde_json::{Map, Value};
use slicebridge::BridgeSettings;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindFile {
    pub kind: String,
    #[serde(default)]
    pub settings: BridgeSettings,
    #[serde(default)]
    pub initial_state: Map<String, Value>,
}

impl BindFile {
    pub fn parse(text: &str) -> Result<Self, String> {
        let file: Self = toml::from_str(text).map_err(|e| format!("invalid bind file: {e}"))?;
        if file.kind.trim().is_empty() {
            return Err("bind file `kind` must not be empty".to_string());
        }
        Ok(file)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::parse(&text)
    }
}
