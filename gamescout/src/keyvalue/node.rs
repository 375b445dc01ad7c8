//! Parsed node tree and field accessors.

use super::KeyValueError;

/// One node of a parsed document: a leaf with a string scalar, or a branch
/// with an ordered list of children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    value: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub(super) fn leaf(name: String, value: String) -> Self {
        Self {
            name,
            value: Some(value),
            children: Vec::new(),
        }
    }

    pub(super) fn branch(name: String, children: Vec<Node>) -> Self {
        Self {
            name,
            value: None,
            children,
        }
    }

    /// The node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scalar value, when this node is a leaf.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Children in document order. Duplicate names are preserved.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// First child with the given name, case-insensitive.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Children whose names parse as non-negative integers, in document
    /// order.
    ///
    /// These form an implicit array in library indexes. The keys may be
    /// sparse, so this filters rather than indexing from zero.
    pub fn numbered_children(&self) -> impl Iterator<Item = &Node> {
        self.children
            .iter()
            .filter(|c| c.name.parse::<u64>().is_ok())
    }

    /// The string value of a required child field.
    ///
    /// Fails with an error naming the field when it is missing or is a
    /// branch. Never substitutes a default.
    pub fn require_str(&self, field: &str) -> Result<&str, KeyValueError> {
        let child = self.child(field).ok_or_else(|| KeyValueError::MissingField {
            field: field.to_owned(),
        })?;
        child.value().ok_or_else(|| KeyValueError::NotAValue {
            field: field.to_owned(),
        })
    }

    /// The integer value of a required child field.
    pub fn require_i64(&self, field: &str) -> Result<i64, KeyValueError> {
        let value = self.require_str(field)?;
        value.parse().map_err(|_| KeyValueError::NotAnInteger {
            field: field.to_owned(),
            value: value.to_owned(),
        })
    }

    /// The string value of an optional child field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.child(field).and_then(Node::value)
    }

    /// The integer value of an optional child field. `None` when absent or
    /// not an integer.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get_str(field).and_then(|v| v.parse().ok())
    }
}
