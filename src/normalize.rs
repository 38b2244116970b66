//! Syntactic equivalences between interchangeable forms of an expression.
//!
//! The rules are expressed as rewrites of the pattern side: given a pattern
//! node and the candidate it is being compared with, [rewrites] produces
//! alternative patterns that mean the same and have the candidate's shape, so
//! the matcher can compare them field by field. Patterns are free to be
//! synthesized since captures only ever point into the candidate.

use never::Never;
use ordered_float::NotNan;
use tracing::trace;

use crate::node::{AssignOp, BinaryOp, Field, LitValue, Literal, Node, Rewrite, UnaryOp};

/// The rule families of the normalizer. Its presence in the options enables
/// normalization at all; every family is on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EditorCallbacks {
  /// `a + b` is `b + a` for `+ * & | ^ && || == === != !==`
  pub commutative: bool,
  /// `a < b` is `b > a`, and `a <= b` is `b >= a`
  pub mirror: bool,
  /// `a op= b` is `a = a op b`
  pub compound: bool,
  /// `a++` is `a += 1`, `a--` is `a -= 1`
  pub increment: bool,
  /// `var a; a = 7;` is `var a = 7;`
  pub declaration_split: bool,
}
impl Default for EditorCallbacks {
  fn default() -> Self {
    Self { commutative: true, mirror: true, compound: true, increment: true, declaration_split: true }
  }
}

fn one() -> Node { Node::int(1) }
fn boxed(n: &Node) -> Box<Node> { Box::new(n.clone()) }

/// Alternative forms of `pat` that have the same top-level shape as `cand`.
/// The alternatives are not themselves rewritten further at the top level,
/// but their children are compared with the rules enabled again.
pub fn rewrites(pat: &Node, cand: &Node, rules: &EditorCallbacks) -> Vec<Node> {
  let mut out = Vec::new();
  match (pat, cand) {
    (Node::Binary { op, left, right }, Node::Binary { op: cop, .. }) => {
      if rules.commutative && op == cop && op.commutative() {
        out.push(Node::Binary { op: *op, left: right.clone(), right: left.clone() });
      }
      if rules.mirror && op.mirror() == Some(*cop) {
        out.push(Node::Binary { op: *cop, left: right.clone(), right: left.clone() });
      }
    },
    (Node::Logical { op, left, right }, Node::Logical { op: cop, .. }) =>
      if rules.commutative && op == cop && op.commutative() {
        out.push(Node::Logical { op: *op, left: right.clone(), right: left.clone() });
      },
    // a op= b  ->  a = a op b
    (Node::Assign { op, left, right }, Node::Assign { op: AssignOp::Assign, .. }) if rules.compound =>
      if let Some(bin) = op.binary() {
        let right = Box::new(Node::Binary { op: bin, left: left.clone(), right: right.clone() });
        out.push(Node::Assign { op: AssignOp::Assign, left: left.clone(), right });
      },
    // a = a op b  ->  a op= b
    (Node::Assign { op: AssignOp::Assign, left, right }, Node::Assign { op: cop, .. }) if rules.compound =>
      if let Some(operand) = expanded_operand(left, right, cop.binary()) {
        out.push(Node::Assign { op: *cop, left: left.clone(), right: boxed(operand) });
      },
    (Node::Update { op, argument, .. }, Node::Assign { op: cop, .. }) if rules.increment => {
      if *cop == op.compound() {
        out.push(Node::Assign { op: *cop, left: argument.clone(), right: Box::new(one()) });
      } else if *cop == AssignOp::Assign && rules.compound {
        if let Some(bin) = op.compound().binary() {
          let right = Box::new(Node::Binary { op: bin, left: argument.clone(), right: Box::new(one()) });
          out.push(Node::Assign { op: AssignOp::Assign, left: argument.clone(), right });
        }
      }
    },
    (Node::Assign { op, left, right }, Node::Update { op: cop, prefix, .. }) if rules.increment => {
      let direct = *op == cop.compound() && is_one(right);
      let expanded = *op == AssignOp::Assign
        && rules.compound
        && expanded_operand(left, right, cop.compound().binary()).is_some_and(is_one);
      if direct || expanded {
        out.push(Node::Update { op: *cop, prefix: *prefix, argument: left.clone() });
      }
    },
    _ => (),
  }
  if !out.is_empty() {
    trace!(pattern = %pat, candidate = %cand, alternatives = out.len(), "normalized");
  }
  out
}

/// If `right` is `target op x` (or `x op target` for a commutative op), the
/// operand `x`
fn expanded_operand<'a>(target: &Node, right: &'a Node, op: Option<BinaryOp>) -> Option<&'a Node> {
  let op = op?;
  match right {
    Node::Binary { op: rop, left, right } if *rop == op => {
      if **left == *target {
        Some(right)
      } else if op.commutative() && **right == *target {
        Some(left)
      } else {
        None
      }
    },
    _ => None,
  }
}

fn is_one(node: &Node) -> bool { node.as_number() == Some(1.0) }

/// If the statement is a declaration of one initialized variable, the
/// equivalent pair of an uninitialized declaration and an assignment
pub fn split_declaration(stmt: &Node) -> Option<(Node, Node)> {
  let Node::Decl { kind, declarations } = stmt else { return None };
  let [Node::Declarator { id, init: Some(init) }] = &declarations[..] else { return None };
  let decl = Node::Decl { kind: *kind, declarations: vec![Node::Declarator { id: id.clone(), init: None }] };
  let assign = Node::Assign { op: AssignOp::Assign, left: id.clone(), right: init.clone() };
  Some((decl, Node::Expr(Box::new(assign))))
}

/// If the two statements declare a variable and then assign to it, the
/// equivalent initialized declaration
pub fn merge_declaration(first: &Node, second: &Node) -> Option<Node> {
  let Node::Decl { kind, declarations } = first else { return None };
  let [Node::Declarator { id, init: None }] = &declarations[..] else { return None };
  let Node::Expr(expr) = second else { return None };
  let Node::Assign { op: AssignOp::Assign, left, right } = &**expr else { return None };
  if left != id {
    return None;
  }
  let declarator = Node::Declarator { id: id.clone(), init: Some(right.clone()) };
  Some(Node::Decl { kind: *kind, declarations: vec![declarator] })
}

/// Whether two concrete trees are interchangeable. Without rules this is
/// plain structural equality, where literals compare by decoded value. With
/// rules, every node may also be replaced by one of its [rewrites].
pub fn equivalent(pat: &Node, cand: &Node, rules: Option<&EditorCallbacks>) -> bool {
  let Some(rules) = rules else { return pat == cand };
  if pat.shape_eq(cand) && fields_equivalent(pat, cand, rules) {
    return true;
  }
  rewrites(pat, cand, rules).iter().any(|alt| alt.shape_eq(cand) && fields_equivalent(alt, cand, rules))
}

fn fields_equivalent(pat: &Node, cand: &Node, rules: &EditorCallbacks) -> bool {
  let (pf, cf) = (pat.fields(), cand.fields());
  pf.len() == cf.len()
    && pf.into_iter().zip(cf).all(|pair| match pair {
      (Field::One(p), Field::One(c)) => equivalent(p, c, Some(rules)),
      (Field::Opt(p), Field::Opt(c)) | (Field::Stmt(p), Field::Stmt(c)) => match (p, c) {
        (None, None) => true,
        (Some(p), Some(c)) => equivalent(p, c, Some(rules)),
        _ => false,
      },
      (Field::Seq(_, p), Field::Seq(_, c)) =>
        p.len() == c.len() && p.iter().zip(c).all(|(p, c)| equivalent(p, c, Some(rules))),
      _ => false,
    })
}

/// The value of an arithmetic operator applied to two numbers, if it is one
fn arithmetic(op: BinaryOp, l: f64, r: f64) -> Option<NotNan<f64>> {
  let value = match op {
    BinaryOp::Add => l + r,
    BinaryOp::Sub => l - r,
    BinaryOp::Mul => l * r,
    BinaryOp::Div => l / r,
    BinaryOp::Rem => l % r,
    BinaryOp::Exp => l.powf(r),
    _ => return None,
  };
  value.is_finite().then(|| NotNan::new(value).ok()).flatten()
}

/// Fold operators applied directly to numeric literals into a literal: `-`
/// and `+` on one literal, and arithmetic on two. The tree is folded in one
/// pass from the root, so `30 + 50 + 10` becomes `80 + 10`.
pub fn fold_constants(node: &Node) -> Node {
  let folded = node.map(&mut |n| {
    Ok::<_, Never>(match n {
      Node::Unary { op: op @ (UnaryOp::Neg | UnaryOp::Plus), argument } => {
        let argument = fold_constants(argument);
        Rewrite::One(match argument {
          Node::Literal(Literal { value: LitValue::Num(value), raw }) => {
            let (value, raw) = match op {
              UnaryOp::Neg => match raw.strip_prefix('-') {
                Some(positive) => (-value, positive.to_string()),
                None => (-value, format!("-{raw}")),
              },
              _ => (value, raw),
            };
            Node::Literal(Literal { value: LitValue::Num(value), raw })
          },
          argument => Node::Unary { op: *op, argument: Box::new(argument) },
        })
      },
      Node::Binary { op, left, right } => match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => match arithmetic(*op, l, r) {
          Some(value) => {
            trace!(expr = %n, %value, "folded");
            let raw = value.to_string();
            Rewrite::One(Node::Literal(Literal { value: LitValue::Num(value), raw }))
          },
          None => Rewrite::Keep,
        },
        _ => Rewrite::Keep,
      },
      _ => Rewrite::Keep,
    })
  });
  folded.unwrap_or_else(|e| match e {})
}
