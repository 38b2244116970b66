//! Render trees back as source text. The output reparses to an equal tree,
//! but layout and redundant parentheses are not preserved.

use std::fmt;

use itertools::Itertools;

use crate::node::{FnForm, MethodKind, Node, PropKind, UnaryOp};

/// Operand position; anything looser than a unary expression is parenthesized
struct Operand<'a>(&'a Node);
impl fmt::Display for Operand<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Node::Binary { .. }
      | Node::Logical { .. }
      | Node::Assign { .. }
      | Node::Conditional { .. }
      | Node::Sequence(_)
      | Node::Unary { .. }
      | Node::Function { form: FnForm::Arrow, .. } => write!(f, "({})", self.0),
      _ => write!(f, "{}", self.0),
    }
  }
}

/// List item position; only the comma operator needs parentheses
struct Item<'a>(&'a Node);
impl fmt::Display for Item<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Node::Sequence(_) => write!(f, "({})", self.0),
      _ => write!(f, "{}", self.0),
    }
  }
}

/// Statement position; a wildcard standing for statements ends like one
struct Statement<'a>(&'a Node);
impl fmt::Display for Statement<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Node::Placeh(ph) => write!(f, "{ph};"),
      other => write!(f, "{other}"),
    }
  }
}

fn items(list: &[Node]) -> String { list.iter().map(Item).join(", ") }

/// Declaration without the terminating semicolon, as it appears in loop heads
struct DeclHead<'a>(&'a Node);
impl fmt::Display for DeclHead<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.0 {
      Node::Decl { kind, declarations } => write!(f, "{} {}", kind.as_str(), items(declarations)),
      other => write!(f, "{other}"),
    }
  }
}

fn opt(node: Option<&Node>) -> String { node.map_or_else(String::new, |n| n.to_string()) }

/// Parameters and body of a function used as a method
fn method_tail(f: &mut fmt::Formatter<'_>, value: &Node) -> fmt::Result {
  match value {
    Node::Function { params, body, .. } => write!(f, "({}) {body}", items(params)),
    other => write!(f, ": {other}"),
  }
}

impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Program(body) => write!(f, "{}", body.iter().map(Statement).join("\n")),
      Self::Block(body) if body.is_empty() => write!(f, "{{}}"),
      Self::Block(body) => write!(f, "{{ {} }}", body.iter().map(Statement).join(" ")),
      Self::Expr(e) => match &**e {
        Self::Function { form: FnForm::Expression, .. }
        | Self::Object(_)
        | Self::Class { .. } => write!(f, "({e});"),
        _ => write!(f, "{e};"),
      },
      Self::Empty => write!(f, ";"),
      Self::If { test, consequent, alternate: None } =>
        write!(f, "if ({test}) {}", Statement(consequent)),
      Self::If { test, consequent, alternate: Some(alt) } =>
        write!(f, "if ({test}) {} else {}", Statement(consequent), Statement(alt)),
      Self::For { init, test, update, body } => {
        let init = init.as_deref().map_or_else(String::new, |n| DeclHead(n).to_string());
        let (test, update) = (opt(test.as_deref()), opt(update.as_deref()));
        write!(f, "for ({init}; {test}; {update}) {}", Statement(body))
      },
      Self::ForIn { left, right, body, of } => {
        let kw = if *of { "of" } else { "in" };
        write!(f, "for ({} {kw} {right}) {}", DeclHead(left), Statement(body))
      },
      Self::While { test, body } => write!(f, "while ({test}) {}", Statement(body)),
      Self::DoWhile { body, test } => write!(f, "do {} while ({test});", Statement(body)),
      Self::Return(None) => write!(f, "return;"),
      Self::Return(Some(arg)) => write!(f, "return {arg};"),
      Self::Break => write!(f, "break;"),
      Self::Continue => write!(f, "continue;"),
      Self::Throw(arg) => write!(f, "throw {arg};"),
      Self::Try { block, param, handler, finalizer } => {
        write!(f, "try {block}")?;
        match (param, handler) {
          (Some(p), Some(h)) => write!(f, " catch ({p}) {h}")?,
          (None, Some(h)) => write!(f, " catch {h}")?,
          _ => (),
        }
        match finalizer {
          Some(fin) => write!(f, " finally {fin}"),
          None => Ok(()),
        }
      },
      Self::Decl { .. } => write!(f, "{};", DeclHead(self)),
      Self::Declarator { id, init: None } => write!(f, "{id}"),
      Self::Declarator { id, init: Some(init) } => write!(f, "{id} = {}", Item(init)),
      Self::Function { form: FnForm::Arrow, params, body, .. } => match &**body {
        Self::Object(_) | Self::Sequence(_) => write!(f, "({}) => ({body})", items(params)),
        _ => write!(f, "({}) => {body}", items(params)),
      },
      Self::Function { id, params, body, .. } =>
        write!(f, "function {}({}) {body}", opt(id.as_deref()), items(params)),
      Self::Class { id, superclass, body, .. } => {
        write!(f, "class")?;
        if let Some(id) = id {
          write!(f, " {id}")?;
        }
        if let Some(sup) = superclass {
          write!(f, " extends {}", Operand(sup))?;
        }
        write!(f, " {{ {} }}", body.iter().join(" "))
      },
      Self::Method { key, value, kind, is_static } => {
        if *is_static {
          write!(f, "static ")?;
        }
        match kind {
          MethodKind::Get => write!(f, "get ")?,
          MethodKind::Set => write!(f, "set ")?,
          MethodKind::Method | MethodKind::Constructor => (),
        }
        write!(f, "{key}")?;
        method_tail(f, value)
      },
      Self::Assign { op, left, right } => write!(f, "{left} {} {right}", op.as_str()),
      Self::Update { op, prefix: true, argument } => write!(f, "{}{}", op.as_str(), Operand(argument)),
      Self::Update { op, prefix: false, argument } => write!(f, "{}{}", Operand(argument), op.as_str()),
      Self::Binary { op, left, right } =>
        write!(f, "{} {} {}", Operand(left), op.as_str(), Operand(right)),
      Self::Logical { op, left, right } =>
        write!(f, "{} {} {}", Operand(left), op.as_str(), Operand(right)),
      Self::Unary { op, argument } => match op {
        UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete =>
          write!(f, "{} {}", op.as_str(), Operand(argument)),
        _ => match &**argument {
          Self::Update { .. } => write!(f, "{}({argument})", op.as_str()),
          _ => write!(f, "{}{}", op.as_str(), Operand(argument)),
        },
      },
      Self::Conditional { test, consequent, alternate } =>
        write!(f, "{} ? {} : {}", Operand(test), Item(consequent), Item(alternate)),
      Self::Call { callee, arguments } => match &**callee {
        Self::Function { .. } => write!(f, "({callee})({})", items(arguments)),
        _ => write!(f, "{}({})", Operand(callee), items(arguments)),
      },
      Self::New { callee, arguments } => write!(f, "new {}({})", Operand(callee), items(arguments)),
      Self::Member { object, property, computed: true } =>
        write!(f, "{}[{property}]", Operand(object)),
      Self::Member { object, property, computed: false } => match &**object {
        Self::Literal(_) | Self::Function { .. } | Self::Object(_) => write!(f, "({object}).{property}"),
        _ => write!(f, "{}.{property}", Operand(object)),
      },
      Self::Sequence(items) => write!(f, "{}", items.iter().join(", ")),
      Self::Array(elements) => {
        let trailing = if matches!(elements.last(), Some(Self::Hole)) { "," } else { "" };
        write!(f, "[{}{trailing}]", items(elements))
      },
      Self::Object(props) => write!(f, "{{{}}}", props.iter().join(", ")),
      Self::Property { key, value, kind, computed, shorthand, method } => {
        let key = if *computed { format!("[{key}]") } else { key.to_string() };
        match kind {
          PropKind::Get => write!(f, "get {key}")?,
          PropKind::Set => write!(f, "set {key}")?,
          PropKind::Init if *shorthand => return write!(f, "{key}"),
          PropKind::Init if !*method => return write!(f, "{key}: {}", Item(value)),
          PropKind::Init => write!(f, "{key}")?,
        }
        method_tail(f, value)
      },
      Self::Template { quasis, expressions } => {
        write!(f, "`")?;
        for (i, quasi) in quasis.iter().enumerate() {
          write!(f, "{quasi}")?;
          if let Some(expr) = expressions.get(i) {
            write!(f, "${{{expr}}}")?;
          }
        }
        write!(f, "`")
      },
      Self::Spread(arg) => write!(f, "...{}", Item(arg)),
      Self::Default { left, right } => write!(f, "{left} = {}", Item(right)),
      Self::Literal(lit) => write!(f, "{}", lit.raw),
      Self::Ident(name) => write!(f, "{name}"),
      Self::This => write!(f, "this"),
      Self::Hole => Ok(()),
      Self::Placeh(ph) => write!(f, "{ph}"),
    }
  }
}

#[cfg(test)]
mod test {
  use crate::parse::parse_program;

  fn reparses(text: &str) {
    let tree = parse_program(text).unwrap();
    let printed = tree.to_string();
    let again = parse_program(&printed).unwrap_or_else(|e| panic!("{printed}\n{e}"));
    assert_eq!(tree, again, "printing {text:?} gave {printed:?}");
  }

  #[test]
  fn statements_reparse() {
    reparses("var a = 1, b; if (a > b) { a += 2; } else b--; while (x) y();");
    reparses("for (var i = 0; i < 10; i++) { rect(i * 10, 20, [1, , 3]); }");
    reparses("for (const k of list) total = total + k; do { x = !x; } while (x);");
    reparses("try { go(); } catch (e) { throw e; } finally { done(); }");
  }

  #[test]
  fn expressions_reparse() {
    reparses("var f = (a, b = 2) => ({ a: a, b, [k]: -1 }); var g = function named() { return; };");
    reparses("class A extends B { constructor(x) { this.x = x; } static make() { return new A(1); } }");
    reparses("var t = `a ${b + 1} c`; x = a ? b : (c, d); typeof q === 'string' && z[0].w(...rest);");
  }

  #[test]
  fn statement_wildcards_end_in_semicolons() {
    use crate::node::{Node, Placeholder};
    let glob = Node::Placeh(Placeholder::glob(Some("body")));
    let tree = Node::Program(vec![Node::Block(vec![glob.clone()]), glob.clone()]);
    assert_eq!(tree.to_string(), "{ glob$body; }\nglob$body;");
    let call = Node::Call { callee: Box::new(Node::ident("f")), arguments: vec![glob] };
    assert_eq!(call.to_string(), "f(glob$body)", "not in expressions");
  }

  #[test]
  fn trailing_hole_survives() {
    let tree = parse_program("[,];").unwrap();
    assert_eq!(tree.to_string(), "[,];");
  }
}
