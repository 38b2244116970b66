//! Caller-supplied predicates over named captures.
//!
//! A constraint lists the variables it needs and receives their values
//! positionally. The matcher evaluates every constraint as soon as the last of
//! its variables is bound, and treats a rejection like a structural mismatch:
//! the current branch fails and the search backtracks.

use std::fmt;
use std::sync::Arc;

use trait_set::trait_set;

use crate::matcher::state::Bound;

/// The answer of a constraint
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
  /// The bindings are acceptable
  Pass,
  /// The bindings are rejected
  Fail,
  /// The bindings are rejected for a reason the user should see if the match
  /// fails overall
  Failure(String),
}
impl From<bool> for Verdict {
  fn from(value: bool) -> Self { if value { Self::Pass } else { Self::Fail } }
}
impl Verdict {
  /// Reject with a message
  pub fn failure(msg: impl Into<String>) -> Self { Self::Failure(msg.into()) }
}

trait_set! {
  /// A constraint body. The slice holds one value per variable, in the order
  /// the variables were listed.
  pub trait Predicate = for<'b> Fn(&[Bound<'b>]) -> Verdict + Send + Sync;
}

/// A predicate together with the variables it reads
#[derive(Clone)]
pub struct Constraint {
  vars: Vec<String>,
  pred: Arc<dyn Predicate>,
}
impl Constraint {
  /// Constraint over any number of variables. Names may be written with or
  /// without the `$` sigil.
  pub fn new<V: AsRef<str>>(vars: impl IntoIterator<Item = V>, pred: impl Predicate + 'static) -> Self {
    let vars = vars.into_iter().map(|v| strip_sigil(v.as_ref())).collect();
    Self { vars, pred: Arc::new(pred) }
  }

  /// Constraint over one variable
  pub fn single(var: &str, pred: impl for<'b> Fn(Bound<'b>) -> Verdict + Send + Sync + 'static) -> Self {
    Self::new([var], move |b: &[Bound<'_>]| match b {
      [only] => pred(*only),
      _ => Verdict::Fail,
    })
  }

  /// Constraint keyed by a comma-separated variable list, eg. `"$r, $g, $b"`
  pub fn keyed(key: &str, pred: impl Predicate + 'static) -> Self {
    Self::new(key.split(',').map(str::trim).filter(|s| !s.is_empty()), pred)
  }

  /// Names of the variables, without sigils
  pub fn vars(&self) -> &[String] { &self.vars }

  /// Run the predicate on the values of its variables, or [None] if any of
  /// them is unbound
  pub fn evaluate<'a>(&self, lookup: impl Fn(&str) -> Option<Bound<'a>>) -> Option<Verdict> {
    let values = self.vars.iter().map(|v| lookup(v)).collect::<Option<Vec<_>>>()?;
    Some((self.pred)(&values))
  }
}
impl fmt::Debug for Constraint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Constraint").field("vars", &self.vars).finish_non_exhaustive()
  }
}

fn strip_sigil(name: &str) -> String { name.strip_prefix('$').unwrap_or(name).to_string() }

/// The constraint set of a match
#[derive(Clone, Debug, Default)]
pub struct Constraints(Vec<Constraint>);
impl Constraints {
  /// No constraints
  pub fn new() -> Self { Self::default() }

  /// Add a constraint
  pub fn push(&mut self, c: Constraint) { self.0.push(c) }

  /// Builder form of [Constraints::push]
  #[must_use]
  pub fn with(mut self, c: Constraint) -> Self {
    self.push(c);
    self
  }

  /// All constraints
  pub fn iter(&self) -> impl Iterator<Item = &Constraint> { self.0.iter() }

  /// Whether there are no constraints
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Evaluate the constraints that read `var` and have all of their variables
  /// bound. Returns the first rejection, or [Verdict::Pass].
  pub fn check<'a>(&self, var: &str, lookup: impl Fn(&str) -> Option<Bound<'a>>) -> Verdict {
    for c in self.0.iter().filter(|c| c.vars.iter().any(|v| v == var)) {
      match c.evaluate(&lookup) {
        None | Some(Verdict::Pass) => (),
        Some(rejection) => return rejection,
      }
    }
    Verdict::Pass
  }
}
impl FromIterator<Constraint> for Constraints {
  fn from_iter<T: IntoIterator<Item = Constraint>>(iter: T) -> Self { Self(iter.into_iter().collect()) }
}
impl From<Constraint> for Constraints {
  fn from(value: Constraint) -> Self { Self(vec![value]) }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::node::Node;

  fn number(b: &Bound<'_>) -> Option<f64> { b.node().and_then(Node::as_number) }

  #[test]
  fn keys_accept_sigils_and_spaces() {
    let c = Constraint::keyed("$r, g ,$b", |_: &[Bound<'_>]| Verdict::Pass);
    assert_eq!(c.vars(), ["r", "g", "b"]);
  }

  #[test]
  fn waits_for_every_variable() {
    let seven = Node::int(7);
    let c = Constraints::from(Constraint::new(["a", "b"], |v: &[Bound<'_>]| {
      (number(&v[0]) < number(&v[1])).into()
    }));
    let only_a = |name: &str| (name == "a").then_some(Bound::Node(&seven));
    assert_eq!(c.check("a", only_a), Verdict::Pass, "b is unbound, so nothing is checked yet");
    let both = |_: &str| Some(Bound::Node(&seven));
    assert_eq!(c.check("b", both), Verdict::Fail);
  }

  #[test]
  fn unrelated_constraints_are_skipped() {
    let c = Constraints::from_iter([
      Constraint::single("x", |_| Verdict::failure("never")),
      Constraint::single("y", |b| b.node().is_some().into()),
    ]);
    let one = Node::int(1);
    assert_eq!(c.check("y", |_| Some(Bound::Node(&one))), Verdict::Pass);
  }
}
