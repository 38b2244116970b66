//! Captures of a search in progress and of a finished match

use std::fmt;

use hashbrown::HashMap;

use crate::node::{Node, Placeholder, Rewrite};

/// A tentative capture, pointing into the candidate tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound<'a> {
  /// Captured by a single wildcard
  Node(&'a Node),
  /// Captured by a glob
  Nodes(&'a [Node]),
}
impl<'a> Bound<'a> {
  /// The node, if this was captured by a single wildcard
  #[must_use]
  pub fn node(&self) -> Option<&'a Node> {
    if let Self::Node(n) = self { Some(n) } else { None }
  }

  /// The captured nodes; a single capture is a one-element slice
  #[must_use]
  pub fn nodes(&self) -> &'a [Node] {
    match self {
      Self::Node(n) => std::slice::from_ref(*n),
      Self::Nodes(v) => v,
    }
  }

  /// Copy the captured data out of the candidate tree
  #[must_use]
  pub fn to_capture(&self) -> Capture {
    match self {
      Self::Node(n) => Capture::One((*n).clone()),
      Self::Nodes(v) => Capture::Many(v.to_vec()),
    }
  }
}

/// The bindings of one branch of the search. Branches get their own copy,
/// so nothing bound in a failed branch is visible in its siblings.
#[derive(Clone, Debug, Default)]
pub struct State<'a> {
  /// Captures of anonymous wildcards in the order they were made
  pub anon: Vec<Bound<'a>>,
  /// Captures of named wildcards
  pub named: HashMap<String, Bound<'a>>,
  /// The candidate node the first pattern statement matched
  pub root: Option<&'a Node>,
}
impl<'a> State<'a> {
  /// A state whose root is already known
  #[must_use]
  pub fn rooted(root: &'a Node) -> Self { Self { root: Some(root), ..Self::default() } }

  /// Detach the captures from the candidate tree. Subtrees captured by named
  /// wildcards are replaced in the root by the wildcard itself, `fallback` is
  /// the root if the pattern never anchored one.
  #[must_use]
  pub fn finish(self, fallback: &'a Node) -> Bindings {
    let root = self.root.unwrap_or(fallback);
    let mut erase = HashMap::<*const Node, Option<Placeholder>>::new();
    for (name, bound) in &self.named {
      match bound {
        Bound::Node(n) => {
          erase.insert(*n, Some(Placeholder::scalar(Some(name))));
        },
        Bound::Nodes(v) =>
          for (i, n) in v.iter().enumerate() {
            erase.insert(n, (i == 0).then(|| Placeholder::glob(Some(name))));
          },
      }
    }
    let root = root
      .map(&mut |n| {
        Ok::<_, never::Never>(match erase.get(&(n as *const Node)) {
          None => Rewrite::Keep,
          Some(Some(ph)) => Rewrite::One(Node::Placeh(ph.clone())),
          Some(None) => Rewrite::Many(vec![]),
        })
      })
      .unwrap_or_else(|e| match e {});
    Bindings {
      anonymous: self.anon.iter().map(Bound::to_capture).collect(),
      vars: self.named.iter().map(|(k, v)| (k.clone(), v.to_capture())).collect(),
      root,
    }
  }
}

/// Value of a wildcard in a successful match
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capture {
  /// Value of a single wildcard
  One(Node),
  /// Value of a glob
  Many(Vec<Node>),
}
impl Capture {
  /// The node if this is a single capture
  #[must_use]
  pub fn node(&self) -> Option<&Node> {
    if let Self::One(n) = self { Some(n) } else { None }
  }
  /// The nodes if this is a glob capture
  #[must_use]
  pub fn nodes(&self) -> Option<&[Node]> {
    if let Self::Many(v) = self { Some(v) } else { None }
  }
}
impl fmt::Display for Capture {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::One(n) => write!(f, "{n}"),
      Self::Many(v) => write!(f, "[{}]", itertools::join(v, " ")),
    }
  }
}

/// Everything a successful match captured
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Bindings {
  /// Captures of `_` and `glob_` in the order they were made
  pub anonymous: Vec<Capture>,
  /// Captures of named wildcards by name, without the `$`
  pub vars: HashMap<String, Capture>,
  /// The candidate node the first pattern statement matched, with named
  /// captures erased
  pub root: Node,
}
impl Bindings {
  /// Bindings that only supply named values, eg. for injection
  pub fn from_vars(vars: impl IntoIterator<Item = (String, Capture)>) -> Self {
    Self { vars: vars.into_iter().collect(), ..Self::default() }
  }
}
