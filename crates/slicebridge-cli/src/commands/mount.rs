use crate::support::{
    exit_with, load_bind_file_or_exit, load_snapshot_or_exit, parse_assignment,
    print_json_or_exit, write_snapshot_or_exit,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use slicebridge::{
    Bridge, BridgeOptions, ComponentDescriptor, DefaultKey, Instance, InstanceContext,
    LifecycleState, PropKey,
};
use slicebridge_store::Store;
use tracing::debug;

const KEY_PROP: &str = "key";

pub struct Args {
    pub config: String,
    pub snapshot: Option<String>,
    pub keys: Vec<String>,
    pub sets: Vec<String>,
    pub destroy: bool,
    pub out: Option<String>,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MountedInstance {
    key: String,
    lifecycle: LifecycleState,
    state: Option<Map<String, Value>>,
}

pub fn run(args: Args) {
    let bind_file = load_bind_file_or_exit(&args.config);
    let assignments: Vec<(String, Value)> = args
        .sets
        .iter()
        .map(|raw| parse_assignment(raw).unwrap_or_else(|e| exit_with(e)))
        .collect();
    let store = match &args.snapshot {
        Some(path) => load_snapshot_or_exit(path),
        None => Store::new(),
    };

    let options = BridgeOptions::new(bind_file.initial_state).settings(bind_file.settings);
    let options = if args.keys.is_empty() {
        options.key_generator(DefaultKey)
    } else {
        options.key_generator(PropKey::new(KEY_PROP))
    };
    let bridge: Bridge<Map<String, Value>> =
        Bridge::new(options).unwrap_or_else(|e| exit_with(e));
    let bound = bridge
        .bind(ComponentDescriptor::new(bind_file.kind))
        .unwrap_or_else(|e| exit_with(e));

    let contexts: Vec<InstanceContext> = if args.keys.is_empty() {
        vec![InstanceContext::with_store(store.clone())]
    } else {
        args.keys
            .iter()
            .map(|key| InstanceContext::with_store(store.clone()).prop(KEY_PROP, key.as_str()))
            .collect()
    };

    let instances: Vec<Instance<Map<String, Value>>> = contexts
        .into_iter()
        .map(|ctx| bound.create(ctx).unwrap_or_else(|e| exit_with(e)))
        .collect();

    for instance in &instances {
        for (field, value) in &assignments {
            instance
                .set(field, value)
                .unwrap_or_else(|e| exit_with(e));
        }
    }
    if args.destroy {
        for instance in &instances {
            instance.destroy().unwrap_or_else(|e| exit_with(e));
        }
    }
    debug!(
        kind = %bound.kind(),
        instances = instances.len(),
        revision = store.revision(),
        "mount finished"
    );

    if let Some(path) = &args.out {
        write_snapshot_or_exit(path, &store);
    }

    let mounted: Vec<MountedInstance> = instances
        .iter()
        .map(|instance| MountedInstance {
            key: instance.key().to_string(),
            lifecycle: instance.lifecycle_state(),
            state: instance.state().unwrap_or_else(|e| exit_with(e)),
        })
        .collect();

    if args.json {
        print_json_or_exit(&json!({
            "kind": bound.kind(),
            "namespace": bound.namespace(),
            "instances": mounted,
            "revision": store.revision(),
            "tree": store.snapshot(),
        }));
    } else {
        println!("slicebridge mount {}", bound.kind());
        println!("  Namespace: {}", bound.namespace());
        println!("  Instances: {}", mounted.len());
        for instance in &mounted {
            match &instance.state {
                Some(state) => println!(
                    "    {} [{}]: {}",
                    instance.key,
                    instance.lifecycle,
                    Value::Object(state.clone())
                ),
                None => println!("    {} [{}]: (removed)", instance.key, instance.lifecycle),
            }
        }
        println!("  Revision: {}", store.revision());
        if let Some(path) = &args.out {
            println!("  Snapshot: {path}");
        }
    }
}
