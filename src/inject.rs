//! The inverse of matching: filling the wildcards of a pattern with values

use crate::error::{MisuseError, MisuseResult};
use crate::matcher::state::{Bindings, Capture};
use crate::node::{Node, PHClass, Rewrite};
use crate::pattern::Pattern;

/// A named wildcard has no value in the bindings
pub struct MissingBinding(pub String);
impl MisuseError for MissingBinding {
  const DESCRIPTION: &'static str = "No value for a wildcard";
  fn message(&self) -> String { format!("${} is not bound", self.0) }
}

/// A single value for a glob or a list of values for a single wildcard
pub struct BindingKindMismatch {
  /// Name of the wildcard
  pub name: String,
  /// What the wildcard is
  pub expected: PHClass,
}
impl MisuseError for BindingKindMismatch {
  const DESCRIPTION: &'static str = "Value doesn't fit the wildcard";
  fn message(&self) -> String {
    match self.expected {
      PHClass::Scalar => format!("${} needs a single node, got a list", self.name),
      PHClass::Glob => format!("glob${} needs a list of nodes, got a single node", self.name),
    }
  }
}

/// More anonymous wildcards than anonymous captures
pub struct MissingAnonymous(pub usize);
impl MisuseError for MissingAnonymous {
  const DESCRIPTION: &'static str = "Too few anonymous values";
  fn message(&self) -> String { format!("Anonymous wildcard #{} has no value", self.0 + 1) }
}

/// Replace every wildcard of the pattern with its value. Named wildcards take
/// their value from `bindings.vars`, anonymous ones consume
/// `bindings.anonymous` in source order. A glob's nodes are spliced into the
/// list around it.
pub fn inject(pattern: &Pattern, bindings: &Bindings) -> MisuseResult<Node> {
  let mut anonymous = bindings.anonymous.iter();
  let mut used = 0;
  pattern.root.map(&mut |node: &Node| -> MisuseResult<Rewrite> {
    let ph = match node {
      Node::Placeh(ph) => ph,
      _ => return Ok(Rewrite::Keep),
    };
    let capture = match &ph.name {
      Some(name) => bindings.vars.get(name).ok_or_else(|| MissingBinding(name.clone()).pack())?,
      None => {
        let capture = anonymous.next().ok_or_else(|| MissingAnonymous(used).pack())?;
        used += 1;
        capture
      },
    };
    match (ph.class, capture) {
      (PHClass::Scalar, Capture::One(n)) => Ok(Rewrite::One(n.clone())),
      (PHClass::Glob, Capture::Many(v)) => Ok(Rewrite::Many(v.clone())),
      // anonymous captures are not checked against their wildcard
      (_, capture) if ph.name.is_none() => Ok(match capture {
        Capture::One(n) => Rewrite::One(n.clone()),
        Capture::Many(v) => Rewrite::Many(v.clone()),
      }),
      (expected, _) => {
        let name = ph.name.clone().unwrap_or_default();
        Err(BindingKindMismatch { name, expected }.pack())
      },
    }
  })
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::constraint::Constraints;
  use crate::node::{LitValue, Literal};
  use crate::pattern::{compile, PatternSource};

  fn pattern(text: &str) -> Pattern {
    compile(PatternSource::Wrapped(text.to_string()), &Constraints::new()).expect("valid pattern")
  }

  fn call(name: &str) -> Node {
    Node::expr_stmt(Node::Call { callee: Box::new(Node::ident(name)), arguments: vec![] })
  }

  #[test]
  fn scalars_and_globs() {
    let yes = Node::Literal(Literal { value: LitValue::Bool(true), raw: "true".to_string() });
    let bindings = Bindings::from_vars([
      ("condition".to_string(), Capture::One(yes)),
      ("expressions".to_string(), Capture::Many(vec![call("test1"), call("test2")])),
    ]);
    let pat = pattern("function() { if ($condition) { oldTest(); glob$expressions; } }");
    let filled = inject(&pat, &bindings).expect("every variable is bound");
    let Node::Program(body) = filled else { panic!("patterns compile to programs") };
    let Node::If { test, consequent, .. } = &body[0] else { panic!() };
    assert_eq!(test.to_string(), "true");
    assert_eq!(**consequent, Node::Block(vec![call("oldTest"), call("test1"), call("test2")]));
  }

  #[test]
  fn anonymous_values_are_consumed_in_order() {
    let anonymous = vec![Capture::One(Node::int(1)), Capture::One(Node::int(2))];
    let bindings = Bindings { anonymous, ..Bindings::default() };
    let filled = inject(&pattern("function() { f(_, _); }"), &bindings).unwrap();
    assert_eq!(filled.to_string(), "f(1, 2);");
    let err = inject(&pattern("function() { f(_, _, _); }"), &bindings).unwrap_err();
    assert!(err.as_any().downcast_ref::<MissingAnonymous>().is_some());
  }

  #[test]
  fn misuse() {
    let err = inject(&pattern("function() { $a; }"), &Bindings::default()).unwrap_err();
    assert!(err.as_any().downcast_ref::<MissingBinding>().is_some());
    let list = Bindings::from_vars([("a".to_string(), Capture::Many(vec![]))]);
    let err = inject(&pattern("function() { f($a); }"), &list).unwrap_err();
    assert!(err.as_any().downcast_ref::<BindingKindMismatch>().is_some());
  }
}
