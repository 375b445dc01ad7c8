//! Hierarchical key-value text parser.
//!
//! Parses the nested, quoted, escape-aware format Steam uses for its
//! library index (`libraryfolders.vdf`) and app manifests
//! (`appmanifest_*.acf`):
//!
//! ```text
//! "AppState"
//! {
//!     "appid"       "262060"
//!     "name"        "Darkest Dungeon"
//!     "installdir"  "DarkestDungeon"
//! }
//! ```
//!
//! # Semantics
//!
//! - A document is one named root node; the root's name is validated
//!   against an expected literal (case-insensitive) before any children are
//!   read.
//! - Each node is a leaf carrying a string scalar or a branch carrying an
//!   ordered child list. Duplicate sibling names are legal: `children()`
//!   preserves document order, and `child(name)` returns the first match.
//! - Numeric-named children form an implicit sparse array;
//!   [`Node::numbered_children`] filters by "name parses as a non-negative
//!   integer" instead of assuming contiguity.
//! - A NUL byte embedded in a quoted value (a known upstream writer bug)
//!   truncates the value at the NUL; it never aborts the parse.
//!
//! # Consumer contract
//!
//! Required fields are read with [`Node::require_str`] /
//! [`Node::require_i64`], which fail with an error naming the field when it
//! is absent. There is no defaulting path: a silently-defaulted required
//! field (an install id, say) would corrupt identity downstream.

mod lexer;
mod node;

pub use node::Node;

use lexer::{Lexer, Token};
use thiserror::Error;

/// Errors from parsing or field access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyValueError {
    /// Input ended mid-node.
    #[error("unexpected end of input at line {line}")]
    UnexpectedEof {
        /// Line the parser stopped on.
        line: usize,
    },

    /// A token that doesn't fit the grammar.
    #[error("unexpected {found} at line {line}")]
    UnexpectedToken {
        /// Description of the offending token.
        found: String,
        /// Line it was found on.
        line: usize,
    },

    /// The root node's name didn't match the expected literal.
    #[error("root node is \"{found}\", expected \"{expected}\"")]
    RootMismatch {
        /// The literal the caller expected.
        expected: String,
        /// What the document actually opens with.
        found: String,
    },

    /// A required field is absent.
    #[error("missing required field \"{field}\"")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A required field exists but is a branch, not a value.
    #[error("field \"{field}\" is not a value")]
    NotAValue {
        /// Name of the field.
        field: String,
    },

    /// A required field's value is not an integer.
    #[error("field \"{field}\" value \"{value}\" is not an integer")]
    NotAnInteger {
        /// Name of the field.
        field: String,
        /// The raw value.
        value: String,
    },
}

/// Parse a document and validate its root name.
///
/// The root name check happens before any children are read, so a document
/// with the wrong root fails fast with [`KeyValueError::RootMismatch`].
pub fn parse_document(text: &str, expected_root: &str) -> Result<Node, KeyValueError> {
    let mut lexer = Lexer::new(text);

    let root_name = match lexer.next_token()? {
        Some(Token::Str(name)) => name,
        Some(Token::Open) => {
            return Err(KeyValueError::UnexpectedToken {
                found: "'{'".into(),
                line: lexer.line(),
            })
        }
        Some(Token::Close) => {
            return Err(KeyValueError::UnexpectedToken {
                found: "'}'".into(),
                line: lexer.line(),
            })
        }
        None => return Err(KeyValueError::UnexpectedEof { line: lexer.line() }),
    };

    if !root_name.eq_ignore_ascii_case(expected_root) {
        return Err(KeyValueError::RootMismatch {
            expected: expected_root.to_owned(),
            found: root_name,
        });
    }

    let root = parse_body(root_name, &mut lexer)?;

    // Anything after the root's closing brace is a structural defect.
    if let Some(token) = lexer.next_token()? {
        return Err(KeyValueError::UnexpectedToken {
            found: token.describe().into(),
            line: lexer.line(),
        });
    }

    Ok(root)
}

/// Parse the part after a node's name: either a scalar or a braced body.
fn parse_body(name: String, lexer: &mut Lexer<'_>) -> Result<Node, KeyValueError> {
    match lexer.next_token()? {
        Some(Token::Str(value)) => Ok(Node::leaf(name, value)),
        Some(Token::Open) => {
            let mut children = Vec::new();
            loop {
                match lexer.next_token()? {
                    Some(Token::Close) => return Ok(Node::branch(name, children)),
                    Some(Token::Str(child_name)) => {
                        children.push(parse_body(child_name, lexer)?);
                    }
                    Some(Token::Open) => {
                        return Err(KeyValueError::UnexpectedToken {
                            found: "'{'".into(),
                            line: lexer.line(),
                        })
                    }
                    None => return Err(KeyValueError::UnexpectedEof { line: lexer.line() }),
                }
            }
        }
        Some(Token::Close) => Err(KeyValueError::UnexpectedToken {
            found: "'}'".into(),
            line: lexer.line(),
        }),
        None => Err(KeyValueError::UnexpectedEof { line: lexer.line() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
"AppState"
{
    "appid"        "262060"
    "name"         "Darkest Dungeon"
    "installdir"   "DarkestDungeon"
    "StateFlags"   "4"
}
"#;

    #[test]
    fn test_parse_manifest() {
        let root = parse_document(MANIFEST, "AppState").unwrap();
        assert_eq!(root.name(), "AppState");
        assert_eq!(root.require_str("appid").unwrap(), "262060");
        assert_eq!(root.require_str("name").unwrap(), "Darkest Dungeon");
        assert_eq!(root.require_i64("appid").unwrap(), 262060);
    }

    #[test]
    fn test_root_name_is_case_insensitive() {
        assert!(parse_document(MANIFEST, "appstate").is_ok());
    }

    #[test]
    fn test_root_mismatch() {
        let error = parse_document(MANIFEST, "libraryfolders").unwrap_err();
        assert_eq!(
            error,
            KeyValueError::RootMismatch {
                expected: "libraryfolders".into(),
                found: "AppState".into(),
            }
        );
    }

    #[test]
    fn test_missing_field_names_the_field() {
        let root = parse_document(MANIFEST, "AppState").unwrap();
        let error = root.require_str("launcherpath").unwrap_err();
        assert_eq!(
            error,
            KeyValueError::MissingField {
                field: "launcherpath".into()
            }
        );
    }

    #[test]
    fn test_non_integer_field() {
        let root = parse_document(MANIFEST, "AppState").unwrap();
        let error = root.require_i64("name").unwrap_err();
        assert!(matches!(error, KeyValueError::NotAnInteger { .. }));
    }

    #[test]
    fn test_nested_and_duplicate_siblings() {
        let text = r#"
"libraryfolders"
{
    "0" { "path" "/lib/a" }
    "1" { "path" "/lib/b" }
    "tool" { "path" "/x" }
    "tool" { "path" "/y" }
}
"#;
        let root = parse_document(text, "libraryfolders").unwrap();
        assert_eq!(root.children().len(), 4);

        // First match wins for named lookup; all duplicates stay addressable
        // positionally.
        let first_tool = root.child("tool").unwrap();
        assert_eq!(first_tool.require_str("path").unwrap(), "/x");
        let tools: Vec<_> = root
            .children()
            .iter()
            .filter(|c| c.name() == "tool")
            .collect();
        assert_eq!(tools.len(), 2);
    }

    #[test]
    fn test_numbered_children_are_sparse() {
        let text = r#"
"libraryfolders"
{
    "0"  { "path" "/a" }
    "2"  { "path" "/c" }
    "contentstatsid" "555"
}
"#;
        let root = parse_document(text, "libraryfolders").unwrap();
        let numbered: Vec<_> = root.numbered_children().collect();
        assert_eq!(numbered.len(), 2);
        assert_eq!(numbered[0].require_str("path").unwrap(), "/a");
        assert_eq!(numbered[1].require_str("path").unwrap(), "/c");
    }

    #[test]
    fn test_escape_sequences() {
        let text = "\"root\" { \"key\" \"a\\\"b\\\\c\\td\" }";
        let root = parse_document(text, "root").unwrap();
        assert_eq!(root.require_str("key").unwrap(), "a\"b\\c\td");
    }

    #[test]
    fn test_embedded_nul_truncates_value() {
        let text = "\"root\" { \"name\" \"Dark\0est\" \"after\" \"ok\" }";
        let root = parse_document(text, "root").unwrap();
        assert_eq!(root.require_str("name").unwrap(), "Dark");
        // Parsing continued past the corrupted value.
        assert_eq!(root.require_str("after").unwrap(), "ok");
    }

    #[test]
    fn test_unterminated_body_is_eof_error() {
        let text = "\"root\" { \"key\" \"value\"";
        assert!(matches!(
            parse_document(text, "root"),
            Err(KeyValueError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        let text = "\"root\" { } \"extra\"";
        assert!(matches!(
            parse_document(text, "root"),
            Err(KeyValueError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_comments_are_skipped() {
        let text = r#"
// header comment
"root"
{
    // a comment line
    "key" "value"
}
"#;
        let root = parse_document(text, "root").unwrap();
        assert_eq!(root.require_str("key").unwrap(), "value");
    }

    #[test]
    fn test_bare_tokens() {
        let text = "root { key value }";
        let root = parse_document(text, "root").unwrap();
        assert_eq!(root.require_str("key").unwrap(), "value");
    }

    proptest::proptest! {
        /// Arbitrary input must produce a parse result, never a panic.
        #[test]
        fn prop_parser_is_total(text in "\\PC*") {
            let _ = parse_document(&text, "root");
        }
    }
}
