use crate::support::{exit_with, load_snapshot_or_exit, print_json_or_exit};
use serde::Serialize;
use serde_json::Value;
use slicebridge::read_slice;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SliceSummary {
    key: String,
    fields: Vec<String>,
}

pub fn run(snapshot: String, namespace: String, json_output: bool) {
    let store = load_snapshot_or_exit(&snapshot);
    let kinds = match store.read(&[namespace.as_str()]) {
        Some(Value::Object(kinds)) => kinds,
        Some(_) => exit_with(format!("`{namespace}` in {snapshot} is not a namespace object")),
        None => exit_with(format!("snapshot {snapshot} has no namespace `{namespace}`")),
    };

    let mut summary: BTreeMap<String, Vec<SliceSummary>> = BTreeMap::new();
    for (kind, slices) in &kinds {
        let Value::Object(slices) = slices else {
            continue;
        };
        let entries = slices
            .keys()
            .filter_map(|key| {
                let slice = read_slice(&store, &namespace, kind, key)?;
                Some(SliceSummary {
                    key: key.clone(),
                    fields: slice.keys().cloned().collect(),
                })
            })
            .collect();
        summary.insert(kind.clone(), entries);
    }

    if json_output {
        print_json_or_exit(&serde_json::json!({
            "snapshot": snapshot,
            "namespace": namespace,
            "kinds": summary,
        }));
    } else {
        println!("slicebridge inspect {snapshot}");
        println!("  Namespace: {namespace}");
        println!("  Component kinds: {}", summary.len());
        for (kind, slices) in &summary {
            println!("    {kind} ({} slices)", slices.len());
            for slice in slices {
                println!("      {}: {}", slice.key, slice.fields.join(", "));
            }
        }
    }
}
