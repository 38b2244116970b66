//! Comparing a compiled pattern with a candidate tree.
//!
//! The search is written in continuation passing style. Every function takes
//! the state of the current branch by value and a continuation that receives
//! the extended state. Returning `true` means the continuation accepted a
//! complete match and the search is over; returning `false` backtracks into
//! the next alternative of the innermost choice point. A branch owns its
//! state, so bindings made in a failed branch never leak into its siblings.

mod seq;
pub mod state;

use std::cell::RefCell;
use std::slice;

use tracing::trace;

use self::state::{Bound, State};
use crate::constraint::{Constraints, Verdict};
use crate::node::{Field, Node, PHClass, Placeholder, SeqPolicy};
use crate::normalize::{equivalent, rewrites, EditorCallbacks};

/// Receives the state of a branch that matched so far
pub type Cont<'k, 'a> = &'k mut dyn FnMut(State<'a>) -> bool;

/// One comparison the matcher still owes for the current node
enum Ob<'p, 'a> {
  Node(&'p Node, &'a Node),
  /// Like [Ob::Node], but the pattern may also match below the candidate
  Nested(&'p Node, &'a Node),
  Seq(SeqPolicy, &'p [Node], &'a [Node]),
}

/// The statements in statement position; a block is its body, anything else
/// is a list of one
fn stmt_list(node: &Node) -> &[Node] {
  match node {
    Node::Block(body) => body,
    other => slice::from_ref(other),
  }
}

/// Stateless apart from the diagnostic of the most recent constraint failure
pub struct Matcher<'m> {
  constraints: &'m Constraints,
  rules: Option<&'m EditorCallbacks>,
  order_matters: bool,
  diagnostic: RefCell<Option<String>>,
}
impl<'m> Matcher<'m> {
  /// Matcher with the given constraints. `rules` enables equivalences,
  /// `order_matters` disables retrying later candidates of a statement once
  /// an earlier one matched.
  #[must_use]
  pub fn new(constraints: &'m Constraints, rules: Option<&'m EditorCallbacks>, order_matters: bool) -> Self {
    Self { constraints, rules, order_matters, diagnostic: RefCell::default() }
  }

  /// The message of the most recent [Verdict::Failure]
  #[must_use]
  pub fn diagnostic(&self) -> Option<String> { self.diagnostic.borrow().clone() }

  /// The first complete match of a single node
  pub fn first_node<'a>(&self, pat: &Node, cand: &'a Node, st: State<'a>) -> Option<State<'a>> {
    let mut found = None;
    self.node(pat, cand, st, &mut |st| {
      found = Some(st);
      true
    });
    found
  }

  /// The first complete match of a statement list against another, with
  /// clutter and nested statement lists
  pub fn first_body<'a>(&self, ps: &[Node], cs: &'a [Node], st: State<'a>) -> Option<State<'a>> {
    let mut found = None;
    self.scan(ps, cs, true, st, &mut |st| {
      found = Some(st);
      true
    });
    found
  }

  /// Match one node, including the alternative forms the equivalence rules
  /// allow
  pub fn node<'a>(&self, pat: &Node, cand: &'a Node, st: State<'a>, k: Cont<'_, 'a>) -> bool {
    match pat {
      Node::Placeh(ph) => {
        let value = match ph.class {
          PHClass::Scalar => Bound::Node(cand),
          PHClass::Glob => Bound::Nodes(slice::from_ref(cand)),
        };
        return self.bind(ph, value, st, k);
      },
      // an elided element in the pattern stands for any element
      Node::Hole => return k(st),
      _ => (),
    }
    if pat.shape_eq(cand) && self.fields(pat, cand, st.clone(), &mut *k) {
      return true;
    }
    let Some(rules) = self.rules else { return false };
    let alternatives = rewrites(pat, cand, rules);
    alternatives.iter().any(|alt| alt.shape_eq(cand) && self.fields(alt, cand, st.clone(), &mut *k))
  }

  /// Pair up the child slots of two nodes of the same shape
  fn fields<'a>(&self, pat: &Node, cand: &'a Node, st: State<'a>, k: Cont<'_, 'a>) -> bool {
    let mut obs = Vec::new();
    // the expression of a statement has to be the whole statement
    let exact = matches!(pat, Node::Expr(_));
    for pair in pat.fields().into_iter().zip(cand.fields()) {
      match pair {
        (Field::One(p), Field::One(c)) | (Field::Opt(Some(p)), Field::Opt(Some(c))) =>
          obs.push(if exact { Ob::Node(p, c) } else { Ob::Nested(p, c) }),
        (Field::Stmt(Some(p)), Field::Stmt(Some(c))) =>
          obs.push(Ob::Seq(SeqPolicy::Statements, stmt_list(p), stmt_list(c))),
        (Field::Seq(policy, p), Field::Seq(_, c)) => obs.push(Ob::Seq(policy, p, c)),
        // an absent optional part of the pattern means any or none
        (Field::Opt(None) | Field::Stmt(None), _) => (),
        _ => return false,
      }
    }
    self.all(&obs, st, k)
  }

  fn all<'a>(&self, obs: &[Ob<'_, 'a>], st: State<'a>, k: Cont<'_, 'a>) -> bool {
    let Some((first, rest)) = obs.split_first() else { return k(st) };
    let mut next = |st| self.all(rest, st, &mut *k);
    match *first {
      Ob::Node(p, c) => self.node(p, c, st, &mut next),
      Ob::Nested(p, c) => self.nested(p, c, st, &mut next),
      Ob::Seq(SeqPolicy::Fixed, ps, cs) => self.fixed(ps, cs, st, &mut next),
      Ob::Seq(SeqPolicy::Ordered, ps, cs) => self.scan(ps, cs, false, st, &mut next),
      Ob::Seq(SeqPolicy::Statements, ps, cs) => self.scan(ps, cs, true, st, &mut next),
    }
  }

  /// Match a slot directly, or failing that, any node below the candidate in
  /// pre-order. Wildcards, leaves and blocks only ever match directly.
  fn nested<'a>(&self, pat: &Node, cand: &'a Node, st: State<'a>, k: Cont<'_, 'a>) -> bool {
    if self.node(pat, cand, st.clone(), &mut *k) {
      return true;
    }
    if pat.children().is_empty() || matches!(pat, Node::Block(_)) {
      return false;
    }
    cand.descendants().into_iter().skip(1).any(|d| self.node(pat, d, st.clone(), &mut *k))
  }

  /// Record a wildcard's value. A name that is already bound must see an
  /// equal value; a new name is checked against every constraint that has
  /// become decidable.
  fn bind<'a>(&self, ph: &Placeholder, value: Bound<'a>, mut st: State<'a>, k: Cont<'_, 'a>) -> bool {
    let Some(name) = &ph.name else {
      st.anon.push(value);
      return k(st);
    };
    if let Some(old) = st.named.get(name.as_str()) {
      return self.same(*old, value) && k(st);
    }
    st.named.insert(name.clone(), value);
    match self.constraints.check(name, |v| st.named.get(v).copied()) {
      Verdict::Pass => k(st),
      Verdict::Fail => {
        trace!(var = %name, "constraint rejected the binding");
        false
      },
      Verdict::Failure(msg) => {
        trace!(var = %name, %msg, "constraint rejected the binding");
        *self.diagnostic.borrow_mut() = Some(msg);
        false
      },
    }
  }

  /// Equality of two values of one variable
  fn same(&self, old: Bound<'_>, new: Bound<'_>) -> bool {
    match (old, new) {
      (Bound::Node(a), Bound::Node(b)) => self.equal(a, b),
      _ => {
        let (a, b) = (old.nodes(), new.nodes());
        a.len() == b.len() && a.iter().zip(b).all(|(a, b)| self.equal(a, b))
      },
    }
  }

  /// Values compare without the expression statement around them, so
  /// `foo;` equals the name `foo`
  fn equal(&self, a: &Node, b: &Node) -> bool { equivalent(bare(a), bare(b), self.rules) }
}

fn bare(node: &Node) -> &Node {
  match node {
    Node::Expr(e) => e,
    other => other,
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::constraint::Constraint;
  use crate::parse::parse_program;
  use crate::pattern::mark_wildcards;

  fn body(text: &str) -> Vec<Node> {
    match parse_program(text) {
      Ok(Node::Program(body)) => body,
      other => panic!("{other:?}"),
    }
  }

  fn pattern(text: &str) -> Vec<Node> {
    match mark_wildcards(&Node::Program(body(text))) {
      Node::Program(body) => body,
      other => panic!("{other:?}"),
    }
  }

  fn run<'a>(m: &Matcher<'_>, pat: &str, cands: &'a [Node]) -> Option<State<'a>> {
    m.first_body(&pattern(pat), cands, State::default())
  }

  #[test]
  fn fixed_lists_are_prefixes() {
    let none = Constraints::new();
    let m = Matcher::new(&none, None, false);
    let src = body("rect(30, 40, 10, 11);");
    assert!(run(&m, "rect(30, _, _, 11);", &src).is_some());
    assert!(run(&m, "rect(30, 40);", &src).is_some(), "surplus arguments are ignored");
    assert!(run(&m, "rect(60, _, _, 11);", &src).is_none());
    let empty = body("rect();");
    assert!(run(&m, "rect(_, _);", &empty).is_none(), "a wildcard can't match nothing");
  }

  #[test]
  fn globs_in_argument_lists() {
    let none = Constraints::new();
    let m = Matcher::new(&none, None, false);
    let src = body("rect(10, 20, 200, 200, 300, 400);");
    let st = run(&m, "rect(_, _, _, _, glob_);", &src).expect("match");
    assert_eq!(st.anon.len(), 5);
    assert_eq!(st.anon[4].nodes().len(), 2);
    let st = run(&m, "rect(glob$head, 200, 300);", &src).expect("match");
    assert_eq!(st.named["head"].nodes().len(), 3, "shortest span that lets the rest match");
  }

  #[test]
  fn holes() {
    let none = Constraints::new();
    let m = Matcher::new(&none, None, false);
    let src = body("[,];");
    assert!(run(&m, "[];", &src).is_some());
    assert!(run(&m, "[4];", &src).is_none());
    assert!(run(&m, "[_];", &src).is_some(), "a wildcard captures the hole");
    let full = body("[1, 2];");
    assert!(run(&m, "[, 2];", &full).is_some(), "a pattern hole matches any element");
  }

  #[test]
  fn repeated_names_must_agree() {
    let none = Constraints::new();
    let m = Matcher::new(&none, None, false);
    let src = body("var x = 10; y -= 1; x -= 1;");
    let st = run(&m, "var $a = 10; $a -= 1;", &src).expect("match");
    assert_eq!(st.named["a"].node(), Some(&Node::ident("x")));
    let src = body("function foo(bar) {} bar; foo;");
    assert!(run(&m, "function $k(bar) {} $k;", &src).is_some(), "a name equals its statement");
  }

  #[test]
  fn statements_dive_forward_only() {
    let none = Constraints::new();
    let m = Matcher::new(&none, None, false);
    let down = body("var x = 5; while (true) { var y = 6; }");
    assert!(run(&m, "var x = 5; var y = 6;", &down).is_some());
    let up = body("while (true) { var x = 5; } var y = 6;");
    assert!(run(&m, "var x = 5; var y = 6;", &up).is_none());
  }

  #[test]
  fn root_is_the_first_matched_statement() {
    let none = Constraints::new();
    let m = Matcher::new(&none, None, false);
    let src = body("f(); if (true) { var x = 5; g(); }");
    let st = run(&m, "var x = _; g();", &src).expect("match");
    let Node::If { consequent, .. } = &src[1] else { panic!() };
    let Node::Block(inner) = &**consequent else { panic!() };
    assert!(std::ptr::eq(st.root.expect("anchored"), &inner[0]), "not the enclosing if");
  }

  #[test]
  fn compound_expressions_match_below_the_slot() {
    let none = Constraints::new();
    let m = Matcher::new(&none, None, false);
    let src = body("if (y % 2 == 1) { x += y; }");
    let st = run(&m, "if (_ % 2) { _ += _; }", &src).expect("y % 2 is inside the condition");
    assert_eq!(st.anon[0].node(), Some(&Node::ident("y")));
    assert!(run(&m, "if (_ % 3) {}", &src).is_none());
    let leaf = body("if (y.z) {}");
    assert!(run(&m, "if (z) {}", &leaf).is_none(), "leaves only match directly");
    let stmt = body("a = f(1) + g(2);");
    assert!(run(&m, "f(_);", &stmt).is_none(), "a statement's expression is the whole statement");
    assert!(run(&m, "a = f(_);", &stmt).is_some());
  }

  #[test]
  fn constraints_drive_backtracking() {
    let c = Constraints::from(Constraint::single("a", |b| (b.node().and_then(Node::as_number) == Some(40.0)).into()));
    let m = Matcher::new(&c, None, false);
    let src = body("var x = 10; var y = 20; var z = 40;");
    let st = run(&m, "var _ = $a;", &src).expect("third declaration");
    assert_eq!(st.root, Some(&src[2]));
    let failing = Constraints::from(Constraint::single("a", |_| Verdict::failure("Nothing can match $a!")));
    let m = Matcher::new(&failing, None, false);
    assert!(run(&m, "var $a = _;", &src).is_none());
    assert_eq!(m.diagnostic().as_deref(), Some("Nothing can match $a!"));
  }

  #[test]
  fn order_matters_commits_early() {
    let c = Constraints::from(Constraint::keyed("$a, $b", |v: &[Bound<'_>]| (v[0] == v[1]).into()));
    let src = body("f(1); f(2); g(2);");
    let free = Matcher::new(&c, None, false);
    assert!(run(&free, "f($a); g($b);", &src).is_some());
    let strict = Matcher::new(&c, None, true);
    assert!(run(&strict, "f($a); g($b);", &src).is_none(), "f(1) was taken before $b was known");
  }

  #[test]
  fn declaration_split_needs_rules() {
    let none = Constraints::new();
    let src = body("var a; a = 7;");
    assert!(run(&Matcher::new(&none, None, false), "var $a = 7;", &src).is_none());
    let rules = EditorCallbacks::default();
    let m = Matcher::new(&none, Some(&rules), false);
    assert!(run(&m, "var $a = 7;", &src).is_some());
    let merged = body("var b = 7;");
    assert!(run(&m, "var $b; $b = 7;", &merged).is_some());
  }
}
