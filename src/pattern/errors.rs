//! Ways a pattern can be malformed

use crate::error::MisuseError;
use crate::node::Placeholder;

/// A name is used both as a glob and as a single wildcard
pub struct ArityMismatch(pub String);
impl MisuseError for ArityMismatch {
  const DESCRIPTION: &'static str = "Wildcard used inconsistently with and without glob";
  fn message(&self) -> String {
    format!("${0} and glob${0} refer to the same variable", self.0)
  }
}

/// A glob in a position that holds exactly one node
pub struct GlobOutsideSequence(pub Placeholder);
impl MisuseError for GlobOutsideSequence {
  const DESCRIPTION: &'static str = "Glob outside a list";
  fn message(&self) -> String {
    format!("{} can only stand among statements, arguments, elements or parameters", self.0)
  }
}

/// Two globs follow each other, so the boundary between them is arbitrary
pub struct GlobNeighbors(pub Placeholder, pub Placeholder);
impl MisuseError for GlobNeighbors {
  const DESCRIPTION: &'static str = "Two globs next to each other";
  fn message(&self) -> String { format!("{} and {} are adjacent", self.0, self.1) }
}

/// A constraint refers to a variable the pattern never binds
pub struct UnknownConstraintVar(pub String);
impl MisuseError for UnknownConstraintVar {
  const DESCRIPTION: &'static str = "Constraint on an unknown variable";
  fn message(&self) -> String { format!("${} does not appear in the pattern", self.0) }
}

/// A wrapped pattern must be a single function
pub struct NotAWrapper(pub &'static str);
impl MisuseError for NotAWrapper {
  const DESCRIPTION: &'static str = "Wrapped pattern is not a function";
  fn message(&self) -> String { format!("Expected a single function, found {}", self.0) }
}
