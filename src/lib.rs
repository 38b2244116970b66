#![warn(missing_docs)]
//! Structural pattern matching over JavaScript syntax trees.
//!
//! Patterns are written in the language they search. Identifiers such as
//! `_`, `$name`, `glob_` and `glob$name` stand for arbitrary nodes or runs of
//! sibling nodes, statements of the pattern may be separated by unrelated
//! code in the source, and callers can constrain what the named wildcards
//! capture. See [match_code] for the entry point.
pub mod constraint;
pub mod error;
pub mod facade;
pub mod inject;
pub mod location;
pub mod matcher;
pub mod node;
pub mod normalize;
pub mod parse;
pub mod pattern;
pub mod print;
pub(crate) mod utils;

pub use constraint::{Constraint, Constraints, Verdict};
pub use facade::{inject_data, match_code, match_node, MatchOptions, Outcome, Source};
pub use matcher::state::{Bindings, Capture};
pub use node::Node;
pub use normalize::EditorCallbacks;
pub use pattern::PatternSource;
