//! The tagged tree shared by source code and patterns
//!
//! The front-end produces these trees, the pattern compiler marks wildcard
//! positions in them with [Node::Placeh], and the matcher compares two of
//! them. Nothing in the crate mutates a tree in place; rewrites go through
//! [Node::map].

use std::{fmt, slice};

use ordered_float::NotNan;

/// Decoded value of a [Literal]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LitValue {
  /// String with escapes already decoded
  Str(String),
  /// Any numeric literal, including the folded `-5`
  Num(NotNan<f64>),
  /// `true` or `false`
  Bool(bool),
  /// `null`
  Null,
}

/// A literal value together with the text it was written as.
///
/// Equality only looks at the decoded value, so `'a'` equals `"a"` and `1.0`
/// equals `1`.
#[derive(Clone, Debug)]
pub struct Literal {
  /// The decoded value
  pub value: LitValue,
  /// The original textual form, including quotes
  pub raw: String,
}
impl Literal {
  /// Build a numeric literal from an integer, writing the raw form in decimal
  pub fn int(n: i32) -> Self { Self { value: LitValue::Num(NotNan::from(n)), raw: n.to_string() } }
  /// Build a string literal with double quotes as its raw form
  pub fn string(s: &str) -> Self { Self { value: LitValue::Str(s.to_string()), raw: format!("{s:?}") } }
}
impl PartialEq for Literal {
  fn eq(&self, other: &Self) -> bool { self.value == other.value }
}
impl Eq for Literal {}

/// Operators of plain and compound assignments
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AssignOp {
  Assign,
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  Exp,
  Shl,
  Shr,
  UShr,
  BitAnd,
  BitOr,
  BitXor,
}
impl AssignOp {
  /// The binary operator a compound assignment applies, [None] for `=`
  pub fn binary(self) -> Option<BinaryOp> {
    Some(match self {
      Self::Assign => return None,
      Self::Add => BinaryOp::Add,
      Self::Sub => BinaryOp::Sub,
      Self::Mul => BinaryOp::Mul,
      Self::Div => BinaryOp::Div,
      Self::Rem => BinaryOp::Rem,
      Self::Exp => BinaryOp::Exp,
      Self::Shl => BinaryOp::Shl,
      Self::Shr => BinaryOp::Shr,
      Self::UShr => BinaryOp::UShr,
      Self::BitAnd => BinaryOp::BitAnd,
      Self::BitOr => BinaryOp::BitOr,
      Self::BitXor => BinaryOp::BitXor,
    })
  }

  /// The compound assignment that applies the given binary operator
  pub fn compound(op: BinaryOp) -> Option<Self> {
    Some(match op {
      BinaryOp::Add => Self::Add,
      BinaryOp::Sub => Self::Sub,
      BinaryOp::Mul => Self::Mul,
      BinaryOp::Div => Self::Div,
      BinaryOp::Rem => Self::Rem,
      BinaryOp::Exp => Self::Exp,
      BinaryOp::Shl => Self::Shl,
      BinaryOp::Shr => Self::Shr,
      BinaryOp::UShr => Self::UShr,
      BinaryOp::BitAnd => Self::BitAnd,
      BinaryOp::BitOr => Self::BitOr,
      BinaryOp::BitXor => Self::BitXor,
      _ => return None,
    })
  }

  /// Source text of the operator
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Assign => "=",
      Self::Add => "+=",
      Self::Sub => "-=",
      Self::Mul => "*=",
      Self::Div => "/=",
      Self::Rem => "%=",
      Self::Exp => "**=",
      Self::Shl => "<<=",
      Self::Shr => ">>=",
      Self::UShr => ">>>=",
      Self::BitAnd => "&=",
      Self::BitOr => "|=",
      Self::BitXor => "^=",
    }
  }
}

/// Arithmetic, bitwise, equality and relational operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  Exp,
  Shl,
  Shr,
  UShr,
  BitAnd,
  BitOr,
  BitXor,
  Eq,
  NotEq,
  StrictEq,
  StrictNotEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
  In,
  InstanceOf,
}
impl BinaryOp {
  /// Whether swapping the operands preserves meaning
  pub fn commutative(self) -> bool {
    matches!(
      self,
      Self::Add
        | Self::Mul
        | Self::BitAnd
        | Self::BitOr
        | Self::BitXor
        | Self::Eq
        | Self::NotEq
        | Self::StrictEq
        | Self::StrictNotEq
    )
  }

  /// The relational operator that means the same with the operands swapped
  pub fn mirror(self) -> Option<Self> {
    match self {
      Self::Lt => Some(Self::Gt),
      Self::Gt => Some(Self::Lt),
      Self::LtEq => Some(Self::GtEq),
      Self::GtEq => Some(Self::LtEq),
      _ => None,
    }
  }

  /// Source text of the operator
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
      Self::Rem => "%",
      Self::Exp => "**",
      Self::Shl => "<<",
      Self::Shr => ">>",
      Self::UShr => ">>>",
      Self::BitAnd => "&",
      Self::BitOr => "|",
      Self::BitXor => "^",
      Self::Eq => "==",
      Self::NotEq => "!=",
      Self::StrictEq => "===",
      Self::StrictNotEq => "!==",
      Self::Lt => "<",
      Self::LtEq => "<=",
      Self::Gt => ">",
      Self::GtEq => ">=",
      Self::In => "in",
      Self::InstanceOf => "instanceof",
    }
  }
}

/// Short-circuiting operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum LogicalOp {
  And,
  Or,
  Nullish,
}
impl LogicalOp {
  /// `??` is the only one that can't be swapped
  pub fn commutative(self) -> bool { !matches!(self, Self::Nullish) }
  /// Source text of the operator
  pub fn as_str(self) -> &'static str {
    match self {
      Self::And => "&&",
      Self::Or => "||",
      Self::Nullish => "??",
    }
  }
}

/// Prefix operators other than `++` and `--`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum UnaryOp {
  Neg,
  Plus,
  Not,
  BitNot,
  TypeOf,
  Void,
  Delete,
}
impl UnaryOp {
  /// Source text of the operator
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Neg => "-",
      Self::Plus => "+",
      Self::Not => "!",
      Self::BitNot => "~",
      Self::TypeOf => "typeof",
      Self::Void => "void",
      Self::Delete => "delete",
    }
  }
}

/// `++` or `--`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum UpdateOp {
  Incr,
  Decr,
}
impl UpdateOp {
  /// The compound assignment `x op= 1` this update is shorthand for
  pub fn compound(self) -> AssignOp {
    match self {
      Self::Incr => AssignOp::Add,
      Self::Decr => AssignOp::Sub,
    }
  }
  /// Source text of the operator
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Incr => "++",
      Self::Decr => "--",
    }
  }
}

/// Keyword of a declaration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DeclKind {
  Var,
  Let,
  Const,
}
impl DeclKind {
  /// Source text of the keyword
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Var => "var",
      Self::Let => "let",
      Self::Const => "const",
    }
  }
}

/// Syntactic form of a function. Declarations and expressions never match
/// each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum FnForm {
  Declaration,
  Expression,
  Arrow,
}

/// Role of a class member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum MethodKind {
  Constructor,
  Method,
  Get,
  Set,
}

/// Role of an object literal property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PropKind {
  Init,
  Get,
  Set,
}

/// Various types of placeholders
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PHClass {
  /// Matches exactly one node
  Scalar,
  /// Matches zero or more contiguous siblings in a sequence
  Glob,
}

/// A wildcard position in a pattern.
///
/// Anonymous placeholders append their capture to the ordered capture list,
/// named ones bind a variable that has to be consistent across the pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placeholder {
  /// Variable name without the `$` sigil, [None] for `_` and `glob_`
  pub name: Option<String>,
  /// What the placeholder can match
  pub class: PHClass,
}
impl Placeholder {
  /// Wildcard matching one node, optionally binding a name
  pub fn scalar(name: Option<&str>) -> Self {
    Self { name: name.map(str::to_string), class: PHClass::Scalar }
  }
  /// Wildcard matching a run of siblings, optionally binding a name
  pub fn glob(name: Option<&str>) -> Self { Self { name: name.map(str::to_string), class: PHClass::Glob } }
}

impl fmt::Display for Placeholder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.name, self.class) {
      (None, PHClass::Scalar) => write!(f, "_"),
      (Some(name), PHClass::Scalar) => write!(f, "${name}"),
      (None, PHClass::Glob) => write!(f, "glob_"),
      (Some(name), PHClass::Glob) => write!(f, "glob${name}"),
    }
  }
}

/// One syntactic construct of the subject language
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Node {
  /// A whole file
  Program(Vec<Node>),
  /// `{ ... }` in statement position
  Block(Vec<Node>),
  /// An expression used as a statement
  Expr(Box<Node>),
  /// A lone `;`
  #[default]
  Empty,
  If { test: Box<Node>, consequent: Box<Node>, alternate: Option<Box<Node>> },
  /// The counted `for(init; test; update)` loop
  For {
    init: Option<Box<Node>>,
    test: Option<Box<Node>>,
    update: Option<Box<Node>>,
    body: Box<Node>,
  },
  /// `for (left in right)` or, if `of` is set, `for (left of right)`
  ForIn { left: Box<Node>, right: Box<Node>, body: Box<Node>, of: bool },
  While { test: Box<Node>, body: Box<Node> },
  DoWhile { body: Box<Node>, test: Box<Node> },
  Return(Option<Box<Node>>),
  Break,
  Continue,
  Throw(Box<Node>),
  Try {
    block: Box<Node>,
    param: Option<Box<Node>>,
    handler: Option<Box<Node>>,
    finalizer: Option<Box<Node>>,
  },
  /// `var`, `let` or `const` with a list of [Node::Declarator]
  Decl { kind: DeclKind, declarations: Vec<Node> },
  Declarator { id: Box<Node>, init: Option<Box<Node>> },
  /// Declarations, function expressions and arrows. An arrow with an
  /// expression body has that expression as its body.
  Function { form: FnForm, id: Option<Box<Node>>, params: Vec<Node>, body: Box<Node> },
  Class { id: Option<Box<Node>>, superclass: Option<Box<Node>>, body: Vec<Node>, expression: bool },
  /// Class member; the value is always a [FnForm::Expression] function
  Method { key: Box<Node>, value: Box<Node>, kind: MethodKind, is_static: bool },
  Assign { op: AssignOp, left: Box<Node>, right: Box<Node> },
  Update { op: UpdateOp, prefix: bool, argument: Box<Node> },
  Binary { op: BinaryOp, left: Box<Node>, right: Box<Node> },
  Logical { op: LogicalOp, left: Box<Node>, right: Box<Node> },
  Unary { op: UnaryOp, argument: Box<Node> },
  Conditional { test: Box<Node>, consequent: Box<Node>, alternate: Box<Node> },
  Call { callee: Box<Node>, arguments: Vec<Node> },
  New { callee: Box<Node>, arguments: Vec<Node> },
  Member { object: Box<Node>, property: Box<Node>, computed: bool },
  /// Comma operator
  Sequence(Vec<Node>),
  /// Elements may be [Node::Hole]
  Array(Vec<Node>),
  /// A list of [Node::Property]
  Object(Vec<Node>),
  Property {
    key: Box<Node>,
    value: Box<Node>,
    kind: PropKind,
    computed: bool,
    shorthand: bool,
    method: bool,
  },
  /// Template string; `quasis` is always one longer than `expressions`
  Template { quasis: Vec<String>, expressions: Vec<Node> },
  Spread(Box<Node>),
  /// Parameter with a default value
  Default { left: Box<Node>, right: Box<Node> },
  Literal(Literal),
  Ident(String),
  This,
  /// Elided array element
  Hole,
  /// Wildcard marker, only ever present in patterns
  Placeh(Placeholder),
}

/// How the elements of a sequence field are paired up during matching
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeqPolicy {
  /// Element-wise from the front, surplus candidate elements ignored
  Fixed,
  /// Ordered subsequence, unmatched candidate elements are clutter
  Ordered,
  /// Ordered subsequence that may also descend into nested statement lists
  Statements,
}

/// A child slot of a node, as seen by generic traversals
#[derive(Clone, Copy, Debug)]
pub enum Field<'n> {
  /// Mandatory child
  One(&'n Node),
  /// Optional child
  Opt(Option<&'n Node>),
  /// Child in statement position, eg. the body of a loop
  Stmt(Option<&'n Node>),
  /// Ordered children
  Seq(SeqPolicy, &'n [Node]),
}

/// Result of a visitor passed to [Node::map]
pub enum Rewrite {
  /// Keep the node and continue into its children
  Keep,
  /// Replace the node
  One(Node),
  /// Replace the node with a run of siblings. In a single slot the run is
  /// wrapped in a [Node::Sequence] unless it has exactly one element.
  Many(Vec<Node>),
}

impl Node {
  /// Shorthand for an identifier
  pub fn ident(name: &str) -> Self { Self::Ident(name.to_string()) }
  /// Shorthand for an integer literal
  pub fn int(n: i32) -> Self { Self::Literal(Literal::int(n)) }
  /// Shorthand for a string literal
  pub fn string(s: &str) -> Self { Self::Literal(Literal::string(s)) }
  /// Shorthand for an expression statement
  pub fn expr_stmt(expr: Node) -> Self { Self::Expr(Box::new(expr)) }

  /// Name of an identifier
  pub fn as_ident(&self) -> Option<&str> {
    if let Self::Ident(name) = self { Some(name) } else { None }
  }

  /// Value of a numeric literal
  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Literal(Literal { value: LitValue::Num(n), .. }) => Some(n.into_inner()),
      _ => None,
    }
  }

  /// Value of a string literal
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Literal(Literal { value: LitValue::Str(s), .. }) => Some(s),
      _ => None,
    }
  }

  /// The placeholder if this is a wildcard
  pub fn placeholder(&self) -> Option<&Placeholder> {
    if let Self::Placeh(ph) = self { Some(ph) } else { None }
  }

  /// The placeholder if this is a glob
  pub fn glob(&self) -> Option<&Placeholder> {
    self.placeholder().filter(|ph| ph.class == PHClass::Glob)
  }

  /// The ESTree name of the node kind, used in diagnostics
  pub fn kind_name(&self) -> &'static str {
    match self {
      Self::Program(_) => "Program",
      Self::Block(_) => "BlockStatement",
      Self::Expr(_) => "ExpressionStatement",
      Self::Empty => "EmptyStatement",
      Self::If { .. } => "IfStatement",
      Self::For { .. } => "ForStatement",
      Self::ForIn { of: false, .. } => "ForInStatement",
      Self::ForIn { of: true, .. } => "ForOfStatement",
      Self::While { .. } => "WhileStatement",
      Self::DoWhile { .. } => "DoWhileStatement",
      Self::Return(_) => "ReturnStatement",
      Self::Break => "BreakStatement",
      Self::Continue => "ContinueStatement",
      Self::Throw(_) => "ThrowStatement",
      Self::Try { .. } => "TryStatement",
      Self::Decl { .. } => "VariableDeclaration",
      Self::Declarator { .. } => "VariableDeclarator",
      Self::Function { form: FnForm::Declaration, .. } => "FunctionDeclaration",
      Self::Function { form: FnForm::Expression, .. } => "FunctionExpression",
      Self::Function { form: FnForm::Arrow, .. } => "ArrowFunctionExpression",
      Self::Class { expression: false, .. } => "ClassDeclaration",
      Self::Class { expression: true, .. } => "ClassExpression",
      Self::Method { .. } => "MethodDefinition",
      Self::Assign { .. } => "AssignmentExpression",
      Self::Update { .. } => "UpdateExpression",
      Self::Binary { .. } => "BinaryExpression",
      Self::Logical { .. } => "LogicalExpression",
      Self::Unary { .. } => "UnaryExpression",
      Self::Conditional { .. } => "ConditionalExpression",
      Self::Call { .. } => "CallExpression",
      Self::New { .. } => "NewExpression",
      Self::Member { .. } => "MemberExpression",
      Self::Sequence(_) => "SequenceExpression",
      Self::Array(_) => "ArrayExpression",
      Self::Object(_) => "ObjectExpression",
      Self::Property { .. } => "Property",
      Self::Template { .. } => "TemplateLiteral",
      Self::Spread(_) => "SpreadElement",
      Self::Default { .. } => "AssignmentPattern",
      Self::Literal(_) => "Literal",
      Self::Ident(_) => "Identifier",
      Self::This => "ThisExpression",
      Self::Hole => "Hole",
      Self::Placeh(_) => "Placeholder",
    }
  }

  /// The child slots of this node in source order
  pub fn fields(&self) -> Vec<Field<'_>> {
    use Field::*;
    match self {
      Self::Program(body) | Self::Block(body) => vec![Seq(SeqPolicy::Statements, body)],
      Self::Expr(e) | Self::Throw(e) | Self::Spread(e) => vec![One(e)],
      Self::Empty
      | Self::Break
      | Self::Continue
      | Self::Literal(_)
      | Self::Ident(_)
      | Self::This
      | Self::Hole
      | Self::Placeh(_) => vec![],
      Self::If { test, consequent, alternate } =>
        vec![One(test), Stmt(Some(consequent)), Stmt(alternate.as_deref())],
      Self::For { init, test, update, body } =>
        vec![Opt(init.as_deref()), Opt(test.as_deref()), Opt(update.as_deref()), Stmt(Some(body))],
      Self::ForIn { left, right, body, .. } => vec![One(left), One(right), Stmt(Some(body))],
      Self::While { test, body } => vec![One(test), Stmt(Some(body))],
      Self::DoWhile { body, test } => vec![Stmt(Some(body)), One(test)],
      Self::Return(arg) => vec![Opt(arg.as_deref())],
      Self::Try { block, param, handler, finalizer } =>
        vec![One(block), Opt(param.as_deref()), Opt(handler.as_deref()), Opt(finalizer.as_deref())],
      Self::Decl { declarations, .. } => vec![Seq(SeqPolicy::Ordered, declarations)],
      Self::Declarator { id, init } => vec![One(id), Opt(init.as_deref())],
      Self::Function { id, params, body, .. } =>
        vec![Opt(id.as_deref()), Seq(SeqPolicy::Fixed, params), One(body)],
      Self::Class { id, superclass, body, .. } =>
        vec![Opt(id.as_deref()), Opt(superclass.as_deref()), Seq(SeqPolicy::Ordered, body)],
      Self::Method { key, value, .. } => vec![One(key), One(value)],
      Self::Assign { left, right, .. }
      | Self::Binary { left, right, .. }
      | Self::Logical { left, right, .. }
      | Self::Default { left, right } => vec![One(left), One(right)],
      Self::Update { argument, .. } | Self::Unary { argument, .. } => vec![One(argument)],
      Self::Conditional { test, consequent, alternate } =>
        vec![One(test), One(consequent), One(alternate)],
      Self::Call { callee, arguments } | Self::New { callee, arguments } =>
        vec![One(callee), Seq(SeqPolicy::Fixed, arguments)],
      Self::Member { object, property, .. } => vec![One(object), One(property)],
      Self::Sequence(items) | Self::Array(items) => vec![Seq(SeqPolicy::Fixed, items)],
      Self::Object(props) => vec![Seq(SeqPolicy::Ordered, props)],
      Self::Property { key, value, .. } => vec![One(key), One(value)],
      Self::Template { expressions, .. } => vec![Seq(SeqPolicy::Fixed, expressions)],
    }
  }

  /// Whether the two nodes are of the same kind and agree on every leaf
  /// attribute (operators, flags, names, literal values). Children are not
  /// inspected.
  pub fn shape_eq(&self, other: &Node) -> bool {
    match self {
      Self::Program(_) => matches!(other, Self::Program(_)),
      Self::Block(_) => matches!(other, Self::Block(_)),
      Self::Expr(_) => matches!(other, Self::Expr(_)),
      Self::Empty => matches!(other, Self::Empty),
      Self::If { .. } => matches!(other, Self::If { .. }),
      Self::For { .. } => matches!(other, Self::For { .. }),
      Self::ForIn { of, .. } => matches!(other, Self::ForIn { of: o, .. } if o == of),
      Self::While { .. } => matches!(other, Self::While { .. }),
      Self::DoWhile { .. } => matches!(other, Self::DoWhile { .. }),
      Self::Return(_) => matches!(other, Self::Return(_)),
      Self::Break => matches!(other, Self::Break),
      Self::Continue => matches!(other, Self::Continue),
      Self::Throw(_) => matches!(other, Self::Throw(_)),
      Self::Try { .. } => matches!(other, Self::Try { .. }),
      Self::Decl { kind, .. } => matches!(other, Self::Decl { kind: k, .. } if k == kind),
      Self::Declarator { .. } => matches!(other, Self::Declarator { .. }),
      Self::Function { form, .. } => matches!(other, Self::Function { form: f, .. } if f == form),
      Self::Class { expression, .. } =>
        matches!(other, Self::Class { expression: e, .. } if e == expression),
      Self::Method { kind, is_static, .. } => matches!(
        other,
        Self::Method { kind: k, is_static: s, .. } if k == kind && s == is_static
      ),
      Self::Assign { op, .. } => matches!(other, Self::Assign { op: o, .. } if o == op),
      Self::Update { op, prefix, .. } =>
        matches!(other, Self::Update { op: o, prefix: p, .. } if o == op && p == prefix),
      Self::Binary { op, .. } => matches!(other, Self::Binary { op: o, .. } if o == op),
      Self::Logical { op, .. } => matches!(other, Self::Logical { op: o, .. } if o == op),
      Self::Unary { op, .. } => matches!(other, Self::Unary { op: o, .. } if o == op),
      Self::Conditional { .. } => matches!(other, Self::Conditional { .. }),
      Self::Call { .. } => matches!(other, Self::Call { .. }),
      Self::New { .. } => matches!(other, Self::New { .. }),
      Self::Member { computed, .. } =>
        matches!(other, Self::Member { computed: c, .. } if c == computed),
      Self::Sequence(_) => matches!(other, Self::Sequence(_)),
      Self::Array(_) => matches!(other, Self::Array(_)),
      Self::Object(_) => matches!(other, Self::Object(_)),
      Self::Property { kind, computed, method, .. } => matches!(
        other,
        Self::Property { kind: k, computed: c, method: m, .. }
          if k == kind && c == computed && m == method
      ),
      Self::Template { quasis, .. } =>
        matches!(other, Self::Template { quasis: q, .. } if q == quasis),
      Self::Spread(_) => matches!(other, Self::Spread(_)),
      Self::Default { .. } => matches!(other, Self::Default { .. }),
      Self::Literal(lit) => matches!(other, Self::Literal(l) if l == lit),
      Self::Ident(name) => matches!(other, Self::Ident(n) if n == name),
      Self::This => matches!(other, Self::This),
      Self::Hole => matches!(other, Self::Hole),
      Self::Placeh(ph) => matches!(other, Self::Placeh(p) if p == ph),
    }
  }

  /// Direct children in source order
  pub fn children(&self) -> Vec<&Node> {
    let mut out = Vec::new();
    for field in self.fields() {
      match field {
        Field::One(n) | Field::Opt(Some(n)) | Field::Stmt(Some(n)) => out.push(n),
        Field::Opt(None) | Field::Stmt(None) => (),
        Field::Seq(_, items) => out.extend(items),
      }
    }
    out
  }

  /// Every node of the tree in depth-first pre-order, starting with this one
  pub fn descendants(&self) -> Vec<&Node> {
    let mut out = Vec::new();
    let mut stack = vec![self];
    while let Some(node) = stack.pop() {
      out.push(node);
      stack.extend(node.children().into_iter().rev());
    }
    out
  }

  /// The closest statement lists below this node, in source order. A block
  /// contributes its body, a non-block statement in statement position (eg.
  /// the body of `while (x) y();`) contributes itself as a one-element list,
  /// and every other child is searched recursively. Lists nested in the
  /// returned lists are not included.
  pub fn nested_lists(&self) -> Vec<&[Node]> {
    let mut out = Vec::new();
    self.push_lists(&mut out);
    out
  }

  fn push_lists<'n>(&'n self, out: &mut Vec<&'n [Node]>) {
    if let Self::Program(body) | Self::Block(body) = self {
      out.push(body);
      return;
    }
    for field in self.fields() {
      match field {
        Field::Stmt(Some(Self::Block(body))) => out.push(body),
        Field::Stmt(Some(stmt)) => out.push(slice::from_ref(stmt)),
        Field::One(n) | Field::Opt(Some(n)) => n.push_lists(out),
        Field::Opt(None) | Field::Stmt(None) => (),
        Field::Seq(_, items) => items.iter().for_each(|n| n.push_lists(out)),
      }
    }
  }

  /// Rebuild the tree, consulting the visitor on every node in pre-order.
  /// [Rewrite::Keep] descends into the children, the other variants replace
  /// the node without visiting the replacement.
  pub fn map<E>(&self, f: &mut impl FnMut(&Node) -> Result<Rewrite, E>) -> Result<Node, E> {
    match f(self)? {
      Rewrite::Keep => self.map_children(f),
      Rewrite::One(node) => Ok(node),
      Rewrite::Many(nodes) => Ok(collapse(nodes)),
    }
  }

  fn map_children<E>(&self, f: &mut impl FnMut(&Node) -> Result<Rewrite, E>) -> Result<Node, E> {
    let b = |n: &Node, f: &mut _| n.map(f).map(Box::new);
    Ok(match self {
      Self::Program(body) => Self::Program(map_seq(body, f)?),
      Self::Block(body) => Self::Block(map_seq(body, f)?),
      Self::Expr(e) => Self::Expr(b(e, f)?),
      Self::Throw(e) => Self::Throw(b(e, f)?),
      Self::Spread(e) => Self::Spread(b(e, f)?),
      Self::Empty
      | Self::Break
      | Self::Continue
      | Self::Literal(_)
      | Self::Ident(_)
      | Self::This
      | Self::Hole
      | Self::Placeh(_) => self.clone(),
      Self::If { test, consequent, alternate } => Self::If {
        test: b(test, f)?,
        consequent: b(consequent, f)?,
        alternate: map_opt(alternate, f)?,
      },
      Self::For { init, test, update, body } => Self::For {
        init: map_opt(init, f)?,
        test: map_opt(test, f)?,
        update: map_opt(update, f)?,
        body: b(body, f)?,
      },
      Self::ForIn { left, right, body, of } =>
        Self::ForIn { left: b(left, f)?, right: b(right, f)?, body: b(body, f)?, of: *of },
      Self::While { test, body } => Self::While { test: b(test, f)?, body: b(body, f)? },
      Self::DoWhile { body, test } => Self::DoWhile { body: b(body, f)?, test: b(test, f)? },
      Self::Return(arg) => Self::Return(map_opt(arg, f)?),
      Self::Try { block, param, handler, finalizer } => Self::Try {
        block: b(block, f)?,
        param: map_opt(param, f)?,
        handler: map_opt(handler, f)?,
        finalizer: map_opt(finalizer, f)?,
      },
      Self::Decl { kind, declarations } =>
        Self::Decl { kind: *kind, declarations: map_seq(declarations, f)? },
      Self::Declarator { id, init } => Self::Declarator { id: b(id, f)?, init: map_opt(init, f)? },
      Self::Function { form, id, params, body } => Self::Function {
        form: *form,
        id: map_opt(id, f)?,
        params: map_seq(params, f)?,
        body: b(body, f)?,
      },
      Self::Class { id, superclass, body, expression } => Self::Class {
        id: map_opt(id, f)?,
        superclass: map_opt(superclass, f)?,
        body: map_seq(body, f)?,
        expression: *expression,
      },
      Self::Method { key, value, kind, is_static } =>
        Self::Method { key: b(key, f)?, value: b(value, f)?, kind: *kind, is_static: *is_static },
      Self::Assign { op, left, right } =>
        Self::Assign { op: *op, left: b(left, f)?, right: b(right, f)? },
      Self::Update { op, prefix, argument } =>
        Self::Update { op: *op, prefix: *prefix, argument: b(argument, f)? },
      Self::Binary { op, left, right } =>
        Self::Binary { op: *op, left: b(left, f)?, right: b(right, f)? },
      Self::Logical { op, left, right } =>
        Self::Logical { op: *op, left: b(left, f)?, right: b(right, f)? },
      Self::Unary { op, argument } => Self::Unary { op: *op, argument: b(argument, f)? },
      Self::Conditional { test, consequent, alternate } => Self::Conditional {
        test: b(test, f)?,
        consequent: b(consequent, f)?,
        alternate: b(alternate, f)?,
      },
      Self::Call { callee, arguments } =>
        Self::Call { callee: b(callee, f)?, arguments: map_seq(arguments, f)? },
      Self::New { callee, arguments } =>
        Self::New { callee: b(callee, f)?, arguments: map_seq(arguments, f)? },
      Self::Member { object, property, computed } =>
        Self::Member { object: b(object, f)?, property: b(property, f)?, computed: *computed },
      Self::Sequence(items) => Self::Sequence(map_seq(items, f)?),
      Self::Array(items) => Self::Array(map_seq(items, f)?),
      Self::Object(props) => Self::Object(map_seq(props, f)?),
      Self::Property { key, value, kind, computed, shorthand, method } => Self::Property {
        key: b(key, f)?,
        value: b(value, f)?,
        kind: *kind,
        computed: *computed,
        shorthand: *shorthand,
        method: *method,
      },
      Self::Template { quasis, expressions } =>
        Self::Template { quasis: quasis.clone(), expressions: map_seq(expressions, f)? },
      Self::Default { left, right } => Self::Default { left: b(left, f)?, right: b(right, f)? },
    })
  }
}

fn collapse(mut nodes: Vec<Node>) -> Node {
  match nodes.len() {
    1 => nodes.pop().unwrap_or(Node::Empty),
    _ => Node::Sequence(nodes),
  }
}

fn map_seq<E>(
  items: &[Node],
  f: &mut impl FnMut(&Node) -> Result<Rewrite, E>,
) -> Result<Vec<Node>, E> {
  let mut out = Vec::with_capacity(items.len());
  for item in items {
    match f(item)? {
      Rewrite::Keep => out.push(item.map_children(f)?),
      Rewrite::One(node) => out.push(node),
      Rewrite::Many(nodes) => out.extend(nodes),
    }
  }
  Ok(out)
}

fn map_opt<E>(
  opt: &Option<Box<Node>>,
  f: &mut impl FnMut(&Node) -> Result<Rewrite, E>,
) -> Result<Option<Box<Node>>, E> {
  opt.as_deref().map(|n| n.map(f).map(Box::new)).transpose()
}

#[cfg(test)]
mod test {
  use never::Never;

  use super::*;

  fn sample() -> Node {
    // if (x) { a(); while (y) b(); } else c();
    Node::Program(vec![Node::If {
      test: Box::new(Node::ident("x")),
      consequent: Box::new(Node::Block(vec![
        Node::expr_stmt(Node::Call { callee: Box::new(Node::ident("a")), arguments: vec![] }),
        Node::While {
          test: Box::new(Node::ident("y")),
          body: Box::new(Node::expr_stmt(Node::Call {
            callee: Box::new(Node::ident("b")),
            arguments: vec![],
          })),
        },
      ])),
      alternate: Some(Box::new(Node::expr_stmt(Node::Call {
        callee: Box::new(Node::ident("c")),
        arguments: vec![],
      }))),
    }])
  }

  #[test]
  fn literals_compare_by_value() {
    let single = Literal { value: LitValue::Str("text".to_string()), raw: "'text'".to_string() };
    assert_eq!(single, Literal::string("text"), "quote style is not part of the value");
    assert_ne!(Literal::int(1), Literal::string("1"));
  }

  #[test]
  fn nested_lists_stop_at_blocks() {
    let program = sample();
    let Node::Program(body) = &program else { unreachable!() };
    let lists = body[0].nested_lists();
    assert_eq!(lists.len(), 2, "the consequent block and the else statement");
    assert_eq!(lists[0].len(), 2);
    assert!(matches!(lists[1], [Node::Expr(_)]));
  }

  #[test]
  fn descendants_are_preorder() {
    let program = sample();
    let names = (program.descendants().into_iter())
      .filter_map(Node::as_ident)
      .collect::<Vec<_>>();
    assert_eq!(names, vec!["x", "a", "y", "b", "c"]);
  }

  #[test]
  fn map_splices_into_sequences() {
    let program = Node::Array(vec![Node::int(1), Node::ident("x"), Node::int(3)]);
    let mapped = program
      .map(&mut |n| {
        Ok::<_, Never>(match n.as_ident() {
          Some(_) => Rewrite::Many(vec![Node::int(2), Node::int(2)]),
          None => Rewrite::Keep,
        })
      })
      .unwrap_or_else(|e| match e {});
    assert_eq!(mapped, Node::Array(vec![Node::int(1), Node::int(2), Node::int(2), Node::int(3)]));
  }
}
