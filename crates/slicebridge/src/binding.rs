use serde::Serialize;

/// Coordinates of one instance's slice: `<namespace>/<component_kind>/<instance_key>`.
///
/// Fixed at construction and never mutated; the store does not hold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    component_kind: String,
    namespace: String,
    prop_name: String,
    instance_key: String,
}

impl Binding {
    pub(crate) fn new(
        component_kind: impl Into<String>,
        namespace: impl Into<String>,
        prop_name: impl Into<String>,
        instance_key: impl Into<String>,
    ) -> Self {
        Self {
            component_kind: component_kind.into(),
            namespace: namespace.into(),
            prop_name: prop_name.into(),
            instance_key: instance_key.into(),
        }
    }

    pub fn component_kind(&self) -> &str {
        &self.component_kind
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name under which the instance exposes its key.
    pub fn prop_name(&self) -> &str {
        &self.prop_name
    }

    pub fn instance_key(&self) -> &str {
        &self.instance_key
    }

    pub fn slice_path(&self) -> [&str; 3] {
        [&self.namespace, &self.component_kind, &self.instance_key]
    }

    pub fn field_path<'a>(&'a self, field: &'a str) -> [&'a str; 4] {
        [
            &self.namespace,
            &self.component_kind,
            &self.instance_key,
            field,
        ]
    }
}
