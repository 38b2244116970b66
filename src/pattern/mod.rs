//! Turning pattern text into a tree with explicit wildcard markers.
//!
//! Patterns are written in the subject language. Identifiers following the
//! wildcard conventions are replaced with [Node::Placeh]:
//!
//! - `_` matches any one node
//! - `$name` matches any one node and binds it to `name`
//! - `glob_` matches any run of siblings
//! - `glob$name` matches any run of siblings and binds it to `name`

pub mod errors;
mod validate;

use hashbrown::HashMap;
use tracing::debug;

use self::errors::NotAWrapper;
pub use self::validate::validate;
use crate::constraint::Constraints;
use crate::error::{MisuseError, MisuseResult};
use crate::node::{FnForm, Node, PHClass, Placeholder, Rewrite};
use crate::normalize::fold_constants;
use crate::parse::{parse_expression, parse_program};

/// The forms a pattern can be supplied in
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternSource {
  /// Statements in the subject language
  Text(String),
  /// A function whose body holds the pattern statements, eg.
  /// `function() { if (_) { glob_; } }`
  Wrapped(String),
  /// An existing tree, used as-is. Explicit [Node::Placeh] nodes in it are
  /// still wildcards.
  Node(Node),
}
impl From<&str> for PatternSource {
  fn from(value: &str) -> Self { Self::Text(value.to_string()) }
}
impl From<String> for PatternSource {
  fn from(value: String) -> Self { Self::Text(value) }
}
impl From<Node> for PatternSource {
  fn from(value: Node) -> Self { Self::Node(value) }
}

/// A compiled pattern
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
  /// The tree with wildcard markers. Text patterns always compile to a
  /// [Node::Program].
  pub root: Node,
  /// Every named wildcard and what it can match
  pub vars: HashMap<String, PHClass>,
}
impl Pattern {
  /// Whether the pattern is a statement list rather than a single node
  #[must_use]
  pub fn is_program(&self) -> bool { matches!(self.root, Node::Program(_)) }
}

/// Classify an identifier according to the wildcard conventions
#[must_use]
pub fn wildcard(name: &str) -> Option<Placeholder> {
  match name {
    "_" => Some(Placeholder::scalar(None)),
    "glob_" => Some(Placeholder::glob(None)),
    _ => match (name.strip_prefix("glob$"), name.strip_prefix('$')) {
      (Some(var), _) if is_var_name(var) => Some(Placeholder::glob(Some(var))),
      (_, Some(var)) if is_var_name(var) => Some(Placeholder::scalar(Some(var))),
      _ => None,
    },
  }
}

fn is_var_name(s: &str) -> bool { !s.is_empty() && !s.contains('$') }

/// Replace the identifiers that follow the wildcard conventions. An expression
/// statement that is only a wildcard becomes a statement-level wildcard.
#[must_use]
pub fn mark_wildcards(tree: &Node) -> Node {
  let marked = tree.map(&mut |n| {
    Ok::<_, never::Never>(match n {
      Node::Ident(name) => wildcard(name).map_or(Rewrite::Keep, |ph| Rewrite::One(Node::Placeh(ph))),
      Node::Expr(e) => match &**e {
        Node::Ident(name) => wildcard(name).map_or(Rewrite::Keep, |ph| Rewrite::One(Node::Placeh(ph))),
        _ => Rewrite::Keep,
      },
      _ => Rewrite::Keep,
    })
  });
  marked.unwrap_or_else(|e| match e {})
}

/// The statements in the body of a wrapper function
fn unwrap_function(wrapper: Node) -> MisuseResult<Node> {
  match wrapper {
    Node::Function { form: FnForm::Arrow, body, .. } => Ok(match *body {
      Node::Block(stmts) => Node::Program(stmts),
      expr => Node::Program(vec![Node::expr_stmt(expr)]),
    }),
    Node::Function { body, .. } => match *body {
      Node::Block(stmts) => Ok(Node::Program(stmts)),
      other => Err(NotAWrapper(other.kind_name()).pack()),
    },
    other => Err(NotAWrapper(other.kind_name()).pack()),
  }
}

/// Compile a pattern and check it against the constraints that will be used
/// with it
pub fn compile(src: PatternSource, constraints: &Constraints) -> MisuseResult<Pattern> {
  let root = match src {
    PatternSource::Text(text) => mark_wildcards(&fold_constants(&parse_program(&text)?)),
    PatternSource::Wrapped(text) =>
      mark_wildcards(&fold_constants(&unwrap_function(parse_expression(&text)?)?)),
    PatternSource::Node(node) => node,
  };
  let vars = validate(&root, constraints)?;
  debug!(pattern = %root, vars = vars.len(), "compiled pattern");
  Ok(Pattern { root, vars })
}
