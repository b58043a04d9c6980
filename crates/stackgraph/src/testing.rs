//! Synthesis-time assertions
//!
//! Helpers for tests that inspect a synthesized stack instead of applying
//! it. They operate on the JSON document, so they see exactly what the
//! engine would see.

use crate::stack::Stack;
use serde_json::Value;

/// Synthesize a stack with default settings, panicking on invalid graphs
pub fn synth_json(stack: &Stack) -> Value {
    match stack.to_json(None) {
        Ok(doc) => doc,
        Err(e) => panic!("stack {} failed to synthesize: {e}", stack.name()),
    }
}

/// Synthesize a stack to its pretty-printed text
pub fn synth_text(stack: &Stack) -> String {
    match stack.synth(None) {
        Ok(text) => text,
        Err(e) => panic!("stack {} failed to synthesize: {e}", stack.name()),
    }
}

/// Every resource block of a given type
pub fn resources_of<'a>(doc: &'a Value, resource_type: &str) -> Vec<(&'a str, &'a Value)> {
    doc.get("resource")
        .and_then(|r| r.get(resource_type))
        .and_then(Value::as_object)
        .map(|named| named.iter().map(|(k, v)| (k.as_str(), v)).collect())
        .unwrap_or_default()
}

/// One resource block, if present
pub fn resource<'a>(doc: &'a Value, resource_type: &str, name: &str) -> Option<&'a Value> {
    doc.get("resource")?.get(resource_type)?.get(name)
}

pub fn has_resource(doc: &Value, resource_type: &str) -> bool {
    !resources_of(doc, resource_type).is_empty()
}

/// True when some resource of the type contains `properties` as a JSON subset
pub fn has_resource_with_properties(doc: &Value, resource_type: &str, properties: &Value) -> bool {
    resources_of(doc, resource_type)
        .into_iter()
        .any(|(_, block)| contains(block, properties))
}

/// The `depends_on` list of a resource, empty when absent
pub fn depends_on(doc: &Value, resource_type: &str, name: &str) -> Vec<String> {
    resource(doc, resource_type, name)
        .and_then(|block| block.get("depends_on"))
        .and_then(Value::as_array)
        .map(|deps| {
            deps.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The local-exec commands of a resource, in order
pub fn commands(doc: &Value, resource_type: &str, name: &str) -> Vec<String> {
    resource(doc, resource_type, name)
        .and_then(|block| block.get("provisioner"))
        .and_then(Value::as_array)
        .map(|provisioners| {
            provisioners
                .iter()
                .filter_map(|p| p.get("local-exec")?.get("command")?.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// JSON subset match: objects match key-by-key, everything else by equality
pub fn contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(actual), Value::Object(expected)) => expected
            .iter()
            .all(|(key, value)| actual.get(key).is_some_and(|a| contains(a, value))),
        (actual, expected) => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contains_is_a_subset_match() {
        let actual = json!({"name": "makers", "meta": {"a": 1, "b": 2}, "list": [1, 2]});
        assert!(contains(&actual, &json!({"name": "makers"})));
        assert!(contains(&actual, &json!({"meta": {"b": 2}})));
        assert!(!contains(&actual, &json!({"list": [1]})));
        assert!(!contains(&actual, &json!({"missing": null})));
    }

    #[test]
    fn test_lookup_helpers() {
        let doc = json!({
            "resource": {
                "null_resource": {
                    "step": {
                        "depends_on": ["null_resource.prev"],
                        "provisioner": [{"local-exec": {"command": "echo hi", "when": "create"}}]
                    }
                }
            }
        });
        assert!(has_resource(&doc, "null_resource"));
        assert!(!has_resource(&doc, "helm_release"));
        assert_eq!(depends_on(&doc, "null_resource", "step"), vec!["null_resource.prev"]);
        assert_eq!(commands(&doc, "null_resource", "step"), vec!["echo hi"]);
        assert!(depends_on(&doc, "null_resource", "missing").is_empty());
    }
}
