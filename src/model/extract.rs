//! Tolerant accessors over untyped upstream JSON.
//!
//! Every lookup is addressed by a dotted path (`models[0].skus[2].price`) so a
//! failure names the exact field that broke. Numbers are read as `f64`, as the
//! upstream service emits them, and truncated toward zero when an integer is
//! wanted.

use crate::error::FieldError;
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct JsonNode<'a> {
    value: &'a Value,
    path: &'a str,
}

/// Owned counterpart of [`JsonNode`] for nodes whose path had to be built.
#[derive(Debug, Clone)]
pub struct OwnedPath<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> OwnedPath<'a> {
    pub fn node(&self) -> JsonNode<'_> {
        JsonNode {
            value: self.value,
            path: &self.path,
        }
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Truncates a wire number to an integer; the `as` cast saturates at the bounds.
#[inline]
pub fn truncate_number(n: f64) -> i64 {
    n.trunc() as i64
}

impl<'a> JsonNode<'a> {
    pub fn root(value: &'a Value) -> Self {
        JsonNode { value, path: "" }
    }

    fn lookup(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|v| !v.is_null())
    }

    pub fn object(&self, key: &str) -> Result<OwnedPath<'a>, FieldError> {
        match self.lookup(key) {
            Some(v) if v.is_object() => Ok(OwnedPath {
                value: v,
                path: join(self.path, key),
            }),
            _ => Err(FieldError::new(join(self.path, key), "object")),
        }
    }

    pub fn str(&self, key: &str) -> Result<String, FieldError> {
        self.opt_str(key)
            .ok_or_else(|| FieldError::new(join(self.path, key), "string"))
    }

    pub fn opt_str(&self, key: &str) -> Option<String> {
        self.lookup(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn int(&self, key: &str) -> Result<i64, FieldError> {
        self.opt_int(key)
            .ok_or_else(|| FieldError::new(join(self.path, key), "number"))
    }

    pub fn opt_int(&self, key: &str) -> Option<i64> {
        self.lookup(key)
            .and_then(Value::as_f64)
            .map(truncate_number)
    }

    /// Elements of a required array, each carrying its indexed path.
    pub fn array(&self, key: &str) -> Result<Vec<OwnedPath<'a>>, FieldError> {
        match self.lookup(key) {
            Some(Value::Array(items)) => Ok(self.indexed(key, items)),
            _ => Err(FieldError::new(join(self.path, key), "array")),
        }
    }

    /// Absent or non-array values read as empty.
    pub fn opt_array(&self, key: &str) -> Vec<OwnedPath<'a>> {
        match self.lookup(key) {
            Some(Value::Array(items)) => self.indexed(key, items),
            _ => Vec::new(),
        }
    }

    fn indexed(&self, key: &str, items: &'a [Value]) -> Vec<OwnedPath<'a>> {
        let base = join(self.path, key);
        items
            .iter()
            .enumerate()
            .map(|(i, value)| OwnedPath {
                value,
                path: format!("{}[{}]", base, i),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_are_truncated_not_rounded() {
        let doc = json!({"a": 12.9, "b": -3.7, "c": 42, "d": "7"});
        let node = JsonNode::root(&doc);
        assert_eq!(node.int("a"), Ok(12));
        assert_eq!(node.int("b"), Ok(-3));
        assert_eq!(node.int("c"), Ok(42));
        assert_eq!(node.int("d"), Err(FieldError::new("d", "number")));
    }

    #[test]
    fn nested_paths_are_reported() {
        let doc = json!({"models": [{"skus": [{"price": 1}, {"size": {}}]}]});
        let root = JsonNode::root(&doc);
        let models = root.array("models").unwrap();
        let skus = models[0].node().array("skus").unwrap();
        let err = skus[1].node().int("price").unwrap_err();
        assert_eq!(err.path, "models[0].skus[1].price");
        assert_eq!(err.expected, "number");

        let size = skus[1].node().object("size").unwrap();
        let err = size.node().str("value").unwrap_err();
        assert_eq!(err.path, "models[0].skus[1].size.value");
    }

    #[test]
    fn null_counts_as_missing() {
        let doc = json!({"old_price": null, "medias": null, "name": null});
        let node = JsonNode::root(&doc);
        assert_eq!(node.opt_int("old_price"), None);
        assert!(node.opt_array("medias").is_empty());
        assert!(node.str("name").is_err());
        assert!(node.array("medias").is_err());
    }

    #[test]
    fn wrong_type_is_a_field_error() {
        let doc = json!({"color": "red", "skus": {}});
        let node = JsonNode::root(&doc);
        assert_eq!(
            node.object("color").unwrap_err(),
            FieldError::new("color", "object")
        );
        assert_eq!(
            node.array("skus").unwrap_err(),
            FieldError::new("skus", "array")
        );
    }
}
