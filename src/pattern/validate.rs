use hashbrown::HashMap;
use itertools::Itertools;

use super::errors::{ArityMismatch, GlobNeighbors, GlobOutsideSequence, UnknownConstraintVar};
use crate::constraint::Constraints;
use crate::error::{MisuseError, MisuseResult};
use crate::node::{Field, Node, PHClass};

fn check_node(node: &Node, types: &mut HashMap<String, PHClass>, in_seq: bool) -> MisuseResult<()> {
  if let Node::Placeh(ph) = node {
    if ph.class == PHClass::Glob && !in_seq {
      return Err(GlobOutsideSequence(ph.clone()).pack());
    }
    if let Some(name) = &ph.name {
      if let Some(known) = types.insert(name.clone(), ph.class) {
        if known != ph.class {
          return Err(ArityMismatch(name.clone()).pack());
        }
      }
    }
    return Ok(());
  }
  for field in node.fields() {
    match field {
      Field::One(n) | Field::Opt(Some(n)) => check_node(n, types, false)?,
      // a lone statement in statement position is a list of one
      Field::Stmt(Some(n)) => check_node(n, types, true)?,
      Field::Opt(None) | Field::Stmt(None) => (),
      Field::Seq(_, items) => check_seq(items, types)?,
    }
  }
  Ok(())
}

fn check_seq(items: &[Node], types: &mut HashMap<String, PHClass>) -> MisuseResult<()> {
  for (l, r) in items.iter().tuple_windows::<(_, _)>() {
    if let (Some(lg), Some(rg)) = (l.glob(), r.glob()) {
      return Err(GlobNeighbors(lg.clone(), rg.clone()).pack());
    }
  }
  items.iter().try_for_each(|n| check_node(n, types, true))
}

/// Check that globs only appear in lists and never next to each other, that
/// every name is used with one arity, and that the constraints only refer to
/// names the pattern binds. Returns the named wildcards.
pub fn validate(root: &Node, constraints: &Constraints) -> MisuseResult<HashMap<String, PHClass>> {
  let mut types = HashMap::new();
  match root {
    Node::Placeh(_) => check_node(root, &mut types, true)?,
    _ => check_node(root, &mut types, false)?,
  }
  let unknown = constraints.iter().flat_map(|c| c.vars()).find(|v| !types.contains_key(v.as_str()));
  if let Some(var) = unknown {
    return Err(UnknownConstraintVar(var.clone()).pack());
  }
  Ok(types)
}
