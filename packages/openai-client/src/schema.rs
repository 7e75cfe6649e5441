//! Schema generation for OpenAI structured outputs.
//!
//! `schemars` produces draft-07 style schemas with a `definitions` table and
//! `$ref` links. OpenAI's strict mode rejects both, and additionally requires
//! every object to carry `additionalProperties: false` with every property
//! listed under `required`. [`StructuredOutput::openai_schema`] rewrites the
//! generated schema into that dialect.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types usable as an OpenAI structured-output target.
///
/// Blanket-implemented for anything that is `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a strict-mode compatible JSON schema for this type.
    fn openai_schema() -> Value {
        let mut root = serde_json::to_value(schema_for!(Self)).unwrap_or_default();

        let definitions = root
            .as_object()
            .and_then(|m| m.get("definitions"))
            .cloned()
            .unwrap_or(Value::Null);

        strictify(&mut root, &definitions);

        if let Value::Object(map) = &mut root {
            map.remove("definitions");
            map.remove("$schema");
        }

        root
    }

    /// Schema name for this type.
    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Inline `$ref` links and rewrite object schemas for strict mode, in one
/// walk. Inlined definitions are re-walked so nested refs resolve too.
fn strictify(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            let ref_target = map
                .get("$ref")
                .and_then(Value::as_str)
                .and_then(|path| path.strip_prefix("#/definitions/"))
                .map(str::to_owned);
            if let Some(name) = ref_target {
                if let Some(def) = definitions.get(&name) {
                    *value = def.clone();
                    strictify(value, definitions);
                    return;
                }
            }

            if map.get("type") == Some(&Value::String("object".into())) {
                map.insert("additionalProperties".into(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let all: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".into(), Value::Array(all));
                }
            }

            for (_, v) in map.iter_mut() {
                strictify(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                strictify(item, definitions);
            }
        }
        _ => {}
    }
}
