//! Schema detection and the uniform view shared by both state schemas.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::resource::{ResolveConfig, Resource};

use super::{legacy, values};

/// Resources with this key prefix are read-only data sources (an AMI lookup,
/// a tag query) and never represent hosts.
pub(super) const DATA_SOURCE_PREFIX: &str = "data.";

/// Sentinel substituted for values that cannot be represented as a string.
pub(super) const ERROR_SENTINEL: &str = "<error>";

/// Why a single schema attempt was rejected.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
    #[error("document decoded but contains no modules")]
    NoModules,
    #[error("document decoded but has no root module")]
    NoRootModule,
}

/// Neither known state schema matched the document. Fatal: no partial
/// inventory is ever emitted.
#[derive(Debug, Error)]
#[error("unrecognized state format (values format: {values}; legacy modules format: {legacy})")]
pub struct SchemaError {
    pub values: FormatError,
    pub legacy: FormatError,
}

/// A named module-level output, flattened into the `all` group's variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub key: String,
    pub value: Value,
    /// Dot-joined path of the owning module; empty at root.
    pub module_path: String,
}

/// Schema-independent view of one state document. Nothing branches on the
/// schema version after [`normalize`] returns.
#[derive(Debug, Default)]
pub struct UniformView {
    /// Supported resources, sorted by base name.
    pub resources: Vec<Resource>,
    pub outputs: Vec<Output>,
    /// Lowercased resource id mapped to a human-readable name, for the
    /// optional tag-group alias resolution.
    pub id_names: BTreeMap<String, String>,
}

/// Detects the document schema and normalizes it to a [`UniformView`].
///
/// The values schema is tried first since it superseded the legacy modules
/// schema. A document matching neither is fatal; the error carries both
/// underlying failures for diagnosis.
pub fn normalize(raw: &[u8], config: &ResolveConfig) -> Result<UniformView, SchemaError> {
    let values_err = match values::parse(raw) {
        Ok(state) => return Ok(state.normalize(config)),
        Err(err) => err,
    };
    let legacy_err = match legacy::parse(raw) {
        Ok(state) => return Ok(state.normalize(config)),
        Err(err) => err,
    };
    Err(SchemaError {
        values: values_err,
        legacy: legacy_err,
    })
}

/// Unwraps an output value: a bare string passes through, a `{"value": ...}`
/// wrapper is unwrapped. Anything else yields the error sentinel rather than
/// failing the run.
pub(super) fn unwrap_output_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => map.get("value").cloned().unwrap_or(Value::Null),
        Value::String(_) => value.clone(),
        _ => Value::String(ERROR_SENTINEL.to_string()),
    }
}

/// Runs one flattened resource through identity parsing and address/tag
/// resolution. Unparseable keys and addressless resources are skipped with a
/// diagnostic; neither aborts the run.
pub(super) fn build_resource(
    key: &str,
    attributes: BTreeMap<String, String>,
    config: &ResolveConfig,
) -> Option<Resource> {
    match Resource::new(key, attributes, config) {
        Ok(Some(resource)) => Some(resource),
        Ok(None) => {
            tracing::debug!(key, "no address resolved, skipping unsupported resource");
            None
        }
        Err(err) => {
            tracing::warn!(%err, "skipping resource");
            None
        }
    }
}
