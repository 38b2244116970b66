//! The public operations. Each call compiles its pattern, runs one search
//! and shares nothing with other calls.

use std::slice;

use tracing::debug;

use crate::constraint::{Constraint, Constraints};
use crate::error::MisuseResult;
use crate::inject::inject;
use crate::matcher::state::{Bindings, State};
use crate::matcher::Matcher;
use crate::node::Node;
use crate::normalize::{fold_constants, EditorCallbacks};
use crate::parse::parse_program;
use crate::pattern::{compile, PatternSource};

/// Settings of a match
#[derive(Clone, Debug, Default)]
pub struct MatchOptions {
  /// Predicates the named wildcards have to satisfy
  pub var_callbacks: Constraints,
  /// Take the first candidate of every statement instead of searching for a
  /// combination that satisfies all constraints
  pub order_matters: bool,
  /// Equivalences between operator forms; [None] disables all of them
  pub editor_callbacks: Option<EditorCallbacks>,
}
impl MatchOptions {
  /// Plain structural matching
  #[must_use]
  pub fn new() -> Self { Self::default() }

  /// Add a constraint
  #[must_use]
  pub fn constraint(mut self, c: Constraint) -> Self {
    self.var_callbacks.push(c);
    self
  }

  /// Replace the constraint set
  #[must_use]
  pub fn var_callbacks(self, var_callbacks: Constraints) -> Self { Self { var_callbacks, ..self } }

  /// Set whether statements are paired in first-occurrence order
  #[must_use]
  pub fn order_matters(self, order_matters: bool) -> Self { Self { order_matters, ..self } }

  /// Enable the equivalence rules
  #[must_use]
  pub fn editor_callbacks(self, rules: EditorCallbacks) -> Self {
    Self { editor_callbacks: Some(rules), ..self }
  }
}

/// The code to search
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
  /// Program text, parsed and folded before matching
  Text(String),
  /// A tree from elsewhere, used as-is
  Node(Node),
}
impl From<&str> for Source {
  fn from(value: &str) -> Self { Self::Text(value.to_string()) }
}
impl From<String> for Source {
  fn from(value: String) -> Self { Self::Text(value) }
}
impl From<Node> for Source {
  fn from(value: Node) -> Self { Self::Node(value) }
}

/// The result of a match that ran to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
  /// The pattern was found
  Matched(Bindings),
  /// The pattern was not found
  Failed {
    /// The message of the last constraint that rejected a binding with one
    diagnostic: Option<String>,
  },
}
impl Outcome {
  /// Whether the pattern was found
  #[must_use]
  pub fn is_match(&self) -> bool { matches!(self, Self::Matched(_)) }

  /// The bindings if the pattern was found
  #[must_use]
  pub fn bindings(&self) -> Option<&Bindings> {
    if let Self::Matched(b) = self { Some(b) } else { None }
  }

  /// The diagnostic of a failed match
  #[must_use]
  pub fn diagnostic(&self) -> Option<&str> {
    match self {
      Self::Failed { diagnostic } => diagnostic.as_deref(),
      Self::Matched(_) => None,
    }
  }
}

fn outcome<'a>(found: Option<State<'a>>, fallback: &'a Node, matcher: &Matcher<'_>) -> Outcome {
  let outcome = match found {
    Some(st) => Outcome::Matched(st.finish(fallback)),
    None => Outcome::Failed { diagnostic: matcher.diagnostic() },
  };
  debug!(matched = outcome.is_match(), diagnostic = ?outcome.diagnostic(), "match finished");
  outcome
}

/// The statements a program pattern is searched in
fn body_of(node: &Node) -> &[Node] {
  match node {
    Node::Program(body) | Node::Block(body) => body,
    other => slice::from_ref(other),
  }
}

/// Search the source for the pattern.
///
/// A statement pattern matches if its statements appear in the source in
/// order, possibly with other statements in between, and each one either in
/// the same statement list as the previous or nested deeper below it. Any
/// other pattern matches the first node of the source, in depth-first order,
/// that has its shape.
pub fn match_code(
  source: impl Into<Source>,
  pattern: impl Into<PatternSource>,
  opts: &MatchOptions,
) -> MisuseResult<Outcome> {
  let source = match source.into() {
    Source::Text(text) => fold_constants(&parse_program(&text)?),
    Source::Node(node) => node,
  };
  let pattern = compile(pattern.into(), &opts.var_callbacks)?;
  debug!(pattern = %pattern.root, "matching code");
  let matcher = Matcher::new(&opts.var_callbacks, opts.editor_callbacks.as_ref(), opts.order_matters);
  let found = match &pattern.root {
    Node::Program(ps) => matcher.first_body(ps, body_of(&source), State::default()),
    pat => (source.descendants().into_iter())
      .find_map(|node| matcher.first_node(pat, node, State::rooted(node))),
  };
  Ok(outcome(found, &source, &matcher))
}

/// Compare a node with the pattern without searching below it. A program or
/// block node has its body matched against the statements of the pattern,
/// any other node is compared with the only statement of the pattern.
pub fn match_node(
  node: &Node,
  pattern: impl Into<PatternSource>,
  opts: &MatchOptions,
) -> MisuseResult<Outcome> {
  let pattern = compile(pattern.into(), &opts.var_callbacks)?;
  debug!(pattern = %pattern.root, node = node.kind_name(), "matching node");
  let matcher = Matcher::new(&opts.var_callbacks, opts.editor_callbacks.as_ref(), opts.order_matters);
  let found = match (&pattern.root, node) {
    (Node::Program(ps), Node::Program(cs) | Node::Block(cs)) => matcher.first_body(ps, cs, State::default()),
    (Node::Program(ps), _) => match &ps[..] {
      [] => Some(State::rooted(node)),
      [single] => matcher.first_node(single, node, State::rooted(node)),
      _ => None,
    },
    (pat, _) => matcher.first_node(pat, node, State::rooted(node)),
  };
  Ok(outcome(found, node, &matcher))
}

/// Fill the wildcards of a pattern with the values in the bindings. Text
/// patterns produce a [Node::Program].
pub fn inject_data(pattern: impl Into<PatternSource>, bindings: &Bindings) -> MisuseResult<Node> {
  let pattern = compile(pattern.into(), &Constraints::new())?;
  let node = inject(&pattern, bindings)?;
  debug!(result = %node, "injected bindings");
  Ok(node)
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::constraint::Verdict;
  use crate::matcher::state::{Bound, Capture};

  fn wrapped(text: &str) -> PatternSource { PatternSource::Wrapped(text.to_string()) }

  fn matches(code: &str, pattern: &str) -> bool { matches_with(code, pattern, &MatchOptions::new()) }

  fn matches_with(code: &str, pattern: &str, opts: &MatchOptions) -> bool {
    match_code(code, pattern, opts).expect("valid code and pattern").is_match()
  }

  fn number(b: Bound<'_>) -> Option<f64> { b.node().and_then(Node::as_number) }

  #[test]
  fn basic_scenarios() {
    assert!(matches("rect(30, 40, 10, 11);", "rect(30, _, _, 11);"));
    assert!(!matches("rect(60, 40, 10, 11);", "rect(30, _, _, 11);"));
    assert!(!matches("rect();", "rect(_, _);"));
    assert!(matches("var a = 'text';", "var a = \"text\";"), "quote style is irrelevant");
    assert!(matches("var a = \"text\";", "var a = 'text';"));
    assert!(matches("", ""), "an empty pattern always matches");
  }

  #[test]
  fn clutter_and_nesting() {
    let else_if = "if (y > 30 && x > 13) {x += y;} else if (x < 10) {y -= 20;} else { y += 2;}";
    assert!(matches(else_if, "if (_) {} else {}"), "else-if counts as an else");
    let structure = "for (; _ < 10; _ += 1) { if (_) {} }";
    let code = "var x = 30;\nfor (var i = 0; i < 10; j += 1) {\n if (y > 30 && x > 13) {x += y;}\n console.log(x);\n}";
    assert!(matches(code, structure));
    assert!(!matches(&code.replace("i < 10", "i < 20"), structure));
    let nested = "if (_) { if (_) {} }";
    assert!(matches("var x = 30; if (x > 10) { for (;;) { if (y) {x += y;} } console.log(x); }", nested));
    assert!(!matches("if (x > 10) { while (y) {x += y;} } if (y) {x += y;}", nested));
  }

  #[test]
  fn peers() {
    assert!(matches("rect(); ellipse();", "rect(); ellipse();"));
    assert!(!matches("rect();", "rect(); ellipse();"));
    let structure = "var _ = 0; var _ = 1; var _ = _;";
    assert!(matches("var a = 0; var b = 1; var c = 30;", structure));
    assert!(!matches("var a = 0; var b = 1;", structure), "a partial match is not enough");
  }

  #[test]
  fn drawing() {
    let structure = wrapped(
      "function() {
        var draw = function() {
          var _ = 10;
          if (_) {
            var _ = _;
            if (_) { _ = _ / 2; _ = _ % 2; rect(); }
          }
          rect();
          ellipse();
        };
      }",
    );
    let code = "var draw = function() {
      var a = 20; var b = 40; var c = 10;
      if (a > 10 && b > 30) {
        a -= 3; var d = 2;
        if (d > 1 && c > 3) { d = 2; c = a / 2; b = 20; d = b; a = c % 2; rect(); ellipse(); }
        d += 10; c *= d; rect(3, c, d, a); ellipse(a, a, c, d); rect(); f += 3;
      }
      rect(); var b = 10; ellipse();
    };";
    assert!(match_code(code, structure, &MatchOptions::new()).unwrap().is_match());
  }

  #[test]
  fn wildcard_variables() {
    assert!(matches("var x = 10; x -= 1;", "var $a = 10; $a -= 1;"));
    assert!(!matches("var x = 10; y -= 1;", "var $a = 10; $a -= 1;"));
    let code = "var x = 10; var y = 10; var t = 3; var c = 1; c = 3; t += 2; y += 2;";
    assert!(matches(code, "var $a = 10; var $b = _; $b += 2; $a += 2;"));
    let code = "var x = 10; var y = 10; var t = 3; var c = 1; c = 3; y += 2;";
    assert!(!matches(code, "var $a = _; var $b = _; $b = 3 + 2; $a += 2;"));
    assert!(matches("if(true) {var x = 2;} var y = 4; z = x + y", "if (_) { var $a = _; } var $b = 4; _ = $a + $b;"));
    let structure = "var $a, $b, $c, $d; $a = 1; $b = 1; $c = 1; $d = 1; $a += 3;";
    let code = "var r, s, t, u, v, w, x, y, z;\nr = 1; s = 1; t = 1; u = 1; v = 1; w = 1; x = 1; y = 1; z = 1;\n";
    assert!(matches(&format!("{code}u += 3;"), structure));
    assert!(!matches(&format!("{code}x += 3;"), structure), "too few declarators left after x");
  }

  #[test]
  fn functions_and_names() {
    let structure = "var $a = _; var $d = function() {}; var draw = function() {
      var $b = $a + _; $d(_, $e, $b, _); $d($a); $a = $e.length; };";
    let code = "var a = 10, b = 20, z = 3, y = 1;
      var bar = function(x) {return x + 3;};
      var foo = function(x) {return x + 3;};
      var draw = function() {
        var t = z + y; foo(t); foo(3, 'eagle', t, 10); test(z); foo(z); z = 'eagle'.length;
      }";
    assert!(matches(code, structure));
    assert!(!matches(&code.replace("z = 'eagle'", "z = 'eaglee'"), structure));
  }

  #[test]
  fn constraints() {
    let opts = MatchOptions::new().constraint(Constraint::single("$a", |_| Verdict::Fail));
    assert!(!matches_with("var x = 10; var y = 20;", "var _ = $a;", &opts));
    let forty = MatchOptions::new().constraint(Constraint::single("$a", |b| (number(b) == Some(40.0)).into()));
    assert!(matches_with("var x = 10; var y = 20; var z = 40;", "var _ = $a;", &forty));
    assert!(!matches_with("var x = 10; var y = 20;", "var z = $a;", &MatchOptions::new()));
    let ordered = MatchOptions::new()
      .constraint(Constraint::single("$a", |b| number(b).is_some_and(|n| n > 11.0).into()))
      .constraint(Constraint::single("$b", |b| number(b).is_some_and(|n| n < 11.0).into()));
    let code = "var x = 10; var y = 20; var z = 40;";
    assert!(!matches_with(code, "var _ = $a; var _ = $b;", &ordered), "$b can't come before $a");
    let pair = MatchOptions::new().constraint(Constraint::keyed("$a, $b", |v: &[Bound<'_>]| {
      (number(v[0]) > number(v[1])).into()
    }));
    assert!(matches_with("var x = 50; var y = 20;", "var _ = $a; var _ = $b;", &pair));
  }

  #[test]
  fn failure_diagnostics() {
    let big = |b: Bound<'_>| match number(b) {
      Some(n) if n > 90.0 => Verdict::Pass,
      _ => Verdict::failure("Make sure the value is big"),
    };
    let opts = MatchOptions::new().constraint(Constraint::single("b", big));
    let out = match_code("var x = 10; var y = 20; var c = 0;", "var $a = $b;", &opts).unwrap();
    assert_eq!(out.diagnostic(), Some("Make sure the value is big"));
    let out = match_code("var x = 10; var y = 20; var c = 100;", "var $a = $b;", &opts).unwrap();
    assert!(out.is_match(), "a later candidate satisfies the constraint");
    assert_eq!(out.diagnostic(), None);
    let rgb = |v: &[Bound<'_>]| match (number(v[0]), number(v[1]), number(v[2])) {
      (Some(r), ..) if r < 50.0 => Verdict::failure("Red must be greater than 50"),
      (_, Some(g), Some(b)) if g < b => Verdict::failure("Use more green than blue"),
      _ => Verdict::Pass,
    };
    let opts = MatchOptions::new().constraint(Constraint::keyed("$red, $green, $blue", rgb));
    let out = match_code("var foo = 5; foo += 2; fill(100, 40, 200);", "fill($red, $green, $blue);", &opts);
    assert_eq!(out.unwrap().diagnostic(), Some("Use more green than blue"));
    let out = match_code("var foo = 5; foo += 2; fill(100, 40, 2);", "fill($red, $green, $blue);", &opts);
    assert!(out.unwrap().is_match());
  }

  #[test]
  fn constant_folding() {
    let negative = MatchOptions::new().constraint(Constraint::single("num", |b| number(b).is_some_and(|n| n < 0.0).into()));
    assert!(matches_with("var x = -5;", "var x = $num;", &negative));
    let positive = MatchOptions::new().constraint(Constraint::single("num", |b| number(b).is_some_and(|n| n > -10.0).into()));
    assert!(matches_with("var x = +5;", "var x = $num;", &positive));
    assert!(matches("var y = 10; var x = +y; x = -y;", "var x = +$var; x = -$var;"));
  }

  #[test]
  fn structure_capture() {
    let out = match_code("if(true){var x = 5;}", "var x = $a;", &MatchOptions::new()).unwrap();
    let bindings = out.bindings().expect("match");
    assert_eq!(bindings.vars["a"], Capture::One(Node::int(5)));
    assert!(matches!(bindings.root, Node::Decl { .. }), "the root is the matched declaration, not the if");
    assert_eq!(bindings.root.to_string(), "var x = $a;");
    let restored = inject_data(PatternSource::Node(Node::Program(vec![bindings.root.clone()])), bindings);
    assert_eq!(restored.unwrap().to_string(), "var x = 5;");
    let out = match_code("test(1,2,3);", "_();", &MatchOptions::new()).unwrap();
    assert_eq!(out.bindings().unwrap().anonymous, vec![Capture::One(Node::ident("test"))]);
    let out = match_code("if(true){var a = 5; test();}", "if ($condition) { glob$expressions; }", &MatchOptions::new());
    let bindings = out.unwrap().bindings().cloned().expect("match");
    assert_eq!(bindings.vars["expressions"].to_string(), "[var a = 5; test();]");
    assert_eq!(bindings.root.to_string(), "if ($condition) { glob$expressions; }");
    let out = match_code("if(true){}", "if ($condition) { glob$expressions; }", &MatchOptions::new());
    assert_eq!(out.unwrap().bindings().unwrap().vars["expressions"], Capture::Many(vec![]));
  }

  #[test]
  fn combined_features() {
    let code = "if (y % 2 == 1 ) {\n x += y;\n}\n";
    assert!(matches(code, "if (_ % 2) { _ += _; }"), "the condition may contain the pattern");
  }

  #[test]
  fn single_variable_callbacks_with_calls() {
    let structure = wrapped(
      "function() {
        var $a = _,
          _ = $val;
        var $d = function() {};
        var draw = function() {
          var $b = $a + _;
          $d(_, $e, $b, _);
          $d($a);
          $a = $e.length;
        };
      }",
    );
    let code = "var a = 10, z = 3, b = 20, y = 1, k = foo();
      var bar = function(x) {return x + 3;};
      var foo = function(x) {return x + 3;};
      var draw = function() {
        var t = z + y;
        foo(t);
        foo(3, 'falcon', t, 10);
        foo(3, 'eagle', t, 10);
        test(z);
        foo(z);
        z = 'falcon'.length;
        z = 'eagle'.length;
      }";
    let opts = MatchOptions::new()
      .constraint(Constraint::single("$e", |b| (b.node().and_then(Node::as_str) == Some("eagle")).into()))
      .constraint(Constraint::single("$val", |b| {
        matches!(b.node(), Some(Node::Call { callee, .. }) if callee.as_ident() == Some("foo")).into()
      }));
    assert!(match_code(code, structure.clone(), &opts).unwrap().is_match());
    let no_call = code.replace("k = foo()", "k = bar");
    assert!(!match_code(no_call, structure, &opts).unwrap().is_match(), "$val needs a call to foo");
  }

  #[test]
  fn multiple_multi_variable_callbacks() {
    let opts = MatchOptions::new()
      .constraint(Constraint::keyed("$c, $a, $b", |v: &[Bound<'_>]| (number(v[1]) > number(v[2])).into()))
      .constraint(Constraint::single("$c", |b| {
        b.node().and_then(Node::as_ident).is_some_and(|name| name != "foo").into()
      }))
      .constraint(Constraint::keyed("$c, $d, $e", |v: &[Bound<'_>]| (number(v[1]) == number(v[2])).into()));
    let structure = "_ += $a + $b; $c($e, $d);";
    let code = "tree += 30 + 50 + 10; plant(40, 20); forest(30, 30);";
    let out = match_code(code, structure, &opts).unwrap();
    let bindings = out.bindings().expect("match");
    assert_eq!(bindings.vars["a"], Capture::One(Node::int(80)), "30 + 50 is folded");
    assert_eq!(bindings.vars["c"], Capture::One(Node::ident("forest")));
    let code = "tree += 30 + 50 + 70; plant(40, 0) + forest(30, 30);\
      tree += 30 + 50 + 10; plant(40, 0) + forest(30, 60);";
    let out = match_code(code, structure, &opts.order_matters(true)).unwrap();
    assert_eq!(out, Outcome::Failed { diagnostic: None });
  }

  #[test]
  fn rematching_is_idempotent() {
    let opts = MatchOptions::new().constraint(Constraint::single("$v", |b| number(b).is_some_and(|n| n > 5.0).into()));
    let code = "var a = 1; var b = 10; if (b) { f(a, b); }";
    let pattern = "var _ = $v; f(glob$args);";
    let first = match_code(code, pattern, &opts).unwrap();
    assert!(first.is_match());
    assert_eq!(first, match_code(code, pattern, &opts).unwrap());
  }

  #[test]
  fn clutter_anywhere() {
    let structure = "var _ = 0; var _ = 1; var _ = _;";
    let cluttered = "f(); var a = 0; g(); h(1); var b = 1; while (x) { y(); } var q; var c = 30; k();";
    assert!(matches(cluttered, structure));
    assert!(matches(&format!("var p = 5; {cluttered} var r = 2;"), structure));
    assert!(!matches(&cluttered.replace("var b = 1", "var b = 2"), structure));
  }

  #[test]
  fn node_patterns_search_every_node() {
    let five = Node::int(5);
    let out = match_code("test(); if(true){var x = 5;}", five.clone(), &MatchOptions::new()).unwrap();
    assert_eq!(out.bindings().unwrap().root, five);
    let tree = parse_program("if(true){var x = 5;}").unwrap();
    assert!(match_code(tree, "var x = $a;", &MatchOptions::new()).unwrap().is_match());
  }

  #[test]
  fn match_node_compares_directly() {
    let Node::Program(body) = parse_program("if (true) { test(); }").unwrap() else { unreachable!() };
    let if_block = &body[0];
    let opts = MatchOptions::new();
    assert!(match_node(if_block, "if (_) { test(); }", &opts).unwrap().is_match());
    assert!(!match_node(if_block, "test();", &opts).unwrap().is_match(), "no searching below the node");
    assert!(!match_node(if_block, Node::Literal(crate::node::Literal::int(1)), &opts).unwrap().is_match());
    let Node::If { consequent, .. } = if_block else { unreachable!() };
    assert!(match_node(consequent, "test();", &opts).unwrap().is_match(), "blocks have their body matched");
  }

  #[test]
  fn injection_restores_the_match() {
    let pattern = "if ($condition) { glob$expressions; }";
    let out = match_code("if(true){ oldTest(); test(); }", pattern, &MatchOptions::new()).unwrap();
    let bindings = out.bindings().unwrap();
    let injected = inject_data(pattern, bindings).unwrap();
    assert_eq!(injected, parse_program("if (true) { oldTest(); test(); }").unwrap());
    let root_pattern = PatternSource::Node(Node::Program(vec![bindings.root.clone()]));
    assert_eq!(inject_data(root_pattern, bindings).unwrap(), injected);
  }

  #[test]
  fn constraint_formats() {
    fn name_is(want: &'static str) -> impl Fn(Bound<'_>) -> Verdict + Send + Sync {
      move |b| (b.node().and_then(Node::as_ident) == Some(want)).into()
    }
    let single = MatchOptions::new().constraint(Constraint::single("$v", name_is("a")));
    assert!(match_code("var a = 1", wrapped("function(){ var $v = 1; }"), &single).unwrap().is_match());
    let wrong = MatchOptions::new().constraint(Constraint::single("$v", name_is("ab")));
    assert!(!match_code("var a = 1", wrapped("function(){ var $v = 1; }"), &wrong).unwrap().is_match());
    let list = MatchOptions::new().var_callbacks(Constraints::from_iter([
      Constraint::single("$fun", name_is("b")),
      Constraint::new(["$add"], |v: &[Bound<'_>]| number(v[0]).is_some_and(|n| n > 5.0).into()),
    ]));
    assert!(matches_with("a = b + 10", "a = $fun + $add", &list));
    assert!(!matches_with("a = c + 10", "a = $fun + $add", &list));
  }

  #[test]
  fn misuse_is_an_error() {
    assert!(match_code("var a = ;", "_;", &MatchOptions::new()).is_err());
    assert!(match_code("a();", "f(glob_, glob_);", &MatchOptions::new()).is_err());
    let stray = MatchOptions::new().constraint(Constraint::single("$nope", |_| Verdict::Pass));
    assert!(match_code("a();", "a();", &stray).is_err());
  }

  #[test]
  fn equivalences_need_editor_callbacks() {
    let on = MatchOptions::new().editor_callbacks(EditorCallbacks::default());
    let pairs = [
      ("a += 1;", "$a = $a + 1;"),
      ("a = a + 1;", "$a += 1;"),
      ("7 + a;", "$a + 7;"),
      ("a * 7;", "7 * $a;"),
      ("a > 7;", "7 < $a;"),
      ("a < 7;", "7 > $a;"),
      ("a >= 7;", "7 <= $a;"),
      ("a <= 7;", "7 >= $a;"),
      ("a++;", "$a += 1;"),
      ("a--;", "$a -= 1;"),
      ("false && true;", "true && false;"),
      ("true || (a === 3);", "($a === 3) || true;"),
      ("7 === a;", "$a === 7;"),
      ("a != 7;", "7 != $a;"),
      ("7 !== a;", "$a !== 7;"),
      ("a == 7;", "7 == $a;"),
      ("7 & a;", "$a & 7;"),
      ("a | 7;", "7 | $a;"),
      ("7 ^ a;", "$a ^ 7;"),
      ("a && 7;", "7 && $a;"),
      ("7 || a;", "$a || 7;"),
      ("var a; a = 7;", "var $a = 7;"),
    ];
    for (code, pattern) in pairs {
      assert!(matches_with(code, pattern, &on), "{code} should match {pattern}");
      assert!(!matches(code, pattern), "{code} should not match {pattern} without equivalences");
    }
  }
}
