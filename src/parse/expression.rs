//! Expressions, by precedence climbing over the binary operators

use super::errors::{InvalidTarget, ParseErrorKind};
use super::lexer::Lexeme;
use super::Parser;
use crate::error::MisuseResult;
use crate::node::{
  AssignOp, BinaryOp, FnForm, Literal, LitValue, LogicalOp, MethodKind, Node, PropKind, UnaryOp, UpdateOp,
};

enum BinOp {
  Binary(BinaryOp),
  Logical(LogicalOp),
}

/// Binding power of each binary operator; higher binds tighter
fn binary_op(lexeme: &Lexeme, no_in: bool) -> Option<(u8, BinOp)> {
  use BinaryOp::*;
  let (prec, op) = match lexeme {
    Lexeme::Punct(p) => match *p {
      "??" => (1, BinOp::Logical(LogicalOp::Nullish)),
      "||" => (2, BinOp::Logical(LogicalOp::Or)),
      "&&" => (3, BinOp::Logical(LogicalOp::And)),
      "|" => (4, BinOp::Binary(BitOr)),
      "^" => (5, BinOp::Binary(BitXor)),
      "&" => (6, BinOp::Binary(BitAnd)),
      "==" => (7, BinOp::Binary(Eq)),
      "!=" => (7, BinOp::Binary(NotEq)),
      "===" => (7, BinOp::Binary(StrictEq)),
      "!==" => (7, BinOp::Binary(StrictNotEq)),
      "<" => (8, BinOp::Binary(Lt)),
      ">" => (8, BinOp::Binary(Gt)),
      "<=" => (8, BinOp::Binary(LtEq)),
      ">=" => (8, BinOp::Binary(GtEq)),
      "<<" => (9, BinOp::Binary(Shl)),
      ">>" => (9, BinOp::Binary(Shr)),
      ">>>" => (9, BinOp::Binary(UShr)),
      "+" => (10, BinOp::Binary(Add)),
      "-" => (10, BinOp::Binary(Sub)),
      "*" => (11, BinOp::Binary(Mul)),
      "/" => (11, BinOp::Binary(Div)),
      "%" => (11, BinOp::Binary(Rem)),
      "**" => (12, BinOp::Binary(Exp)),
      _ => return None,
    },
    Lexeme::Name(n) if n == "instanceof" => (8, BinOp::Binary(InstanceOf)),
    Lexeme::Name(n) if n == "in" && !no_in => (8, BinOp::Binary(In)),
    _ => return None,
  };
  Some((prec, op))
}

fn assign_op(lexeme: &Lexeme) -> Option<AssignOp> {
  let Lexeme::Punct(p) = lexeme else { return None };
  Some(match *p {
    "=" => AssignOp::Assign,
    "+=" => AssignOp::Add,
    "-=" => AssignOp::Sub,
    "*=" => AssignOp::Mul,
    "/=" => AssignOp::Div,
    "%=" => AssignOp::Rem,
    "**=" => AssignOp::Exp,
    "<<=" => AssignOp::Shl,
    ">>=" => AssignOp::Shr,
    ">>>=" => AssignOp::UShr,
    "&=" => AssignOp::BitAnd,
    "|=" => AssignOp::BitOr,
    "^=" => AssignOp::BitXor,
    _ => return None,
  })
}

fn is_target(node: &Node) -> bool { matches!(node, Node::Ident(_) | Node::Member { .. }) }

impl<'a> Parser<'a> {
  /// Comma-separated expressions
  pub(super) fn expression(&mut self) -> MisuseResult<Node> {
    let first = self.assignment()?;
    if !self.is(",") {
      return Ok(first);
    }
    let mut items = vec![first];
    while self.eat(",") {
      items.push(self.assignment()?);
    }
    Ok(Node::Sequence(items))
  }

  /// Whether the parenthesized list starting at the cursor is followed by `=>`
  fn arrow_ahead(&self) -> bool {
    let mut depth = 0usize;
    for i in 0.. {
      let entry = self.peek_at(i);
      match &entry.lexeme {
        Lexeme::Eof => return false,
        Lexeme::Punct("(" | "[" | "{") => depth += 1,
        Lexeme::Punct(")" | "]" | "}") => {
          depth -= 1;
          if depth == 0 {
            return self.peek_at(i + 1).is("=>");
          }
        },
        _ => (),
      }
    }
    false
  }

  pub(super) fn assignment(&mut self) -> MisuseResult<Node> {
    let simple_arrow = matches!(self.peek().lexeme, Lexeme::Name(_)) && self.peek_at(1).is("=>");
    if simple_arrow || (self.is("(") && self.arrow_ahead()) {
      return self.arrow();
    }
    if self.is_name("async") && (self.peek_at(1).is_name("function") || self.peek_at(1).is("(")) {
      return self.unsupported("async functions");
    }
    if self.is_name("yield") {
      return self.unsupported("generators");
    }
    let start = self.peek();
    let left = self.conditional()?;
    let Some(op) = assign_op(&self.peek().lexeme) else { return Ok(left) };
    if matches!(left, Node::Array(_) | Node::Object(_)) {
      return self.unsupported("destructuring patterns");
    }
    if !is_target(&left) {
      return Err(InvalidTarget.pack(self.range(start)));
    }
    self.next();
    let right = self.assignment()?;
    Ok(Node::Assign { op, left: Box::new(left), right: Box::new(right) })
  }

  fn arrow(&mut self) -> MisuseResult<Node> {
    let params = if self.is("(") { self.params()? } else { vec![Node::Ident(self.ident()?)] };
    self.expect("=>")?;
    let body = if self.is("{") { self.block()? } else { self.allow_in(Self::assignment)? };
    Ok(Node::Function { form: FnForm::Arrow, id: None, params, body: Box::new(body) })
  }

  fn conditional(&mut self) -> MisuseResult<Node> {
    let test = self.binary(1)?;
    if !self.eat("?") {
      return Ok(test);
    }
    let consequent = self.allow_in(Self::assignment)?;
    self.expect(":")?;
    let alternate = self.assignment()?;
    Ok(Node::Conditional {
      test: Box::new(test),
      consequent: Box::new(consequent),
      alternate: Box::new(alternate),
    })
  }

  fn binary(&mut self, min: u8) -> MisuseResult<Node> {
    let mut left = self.unary()?;
    while let Some((prec, op)) = binary_op(&self.peek().lexeme, self.no_in) {
      if prec < min {
        break;
      }
      self.next();
      // exponentiation is right-associative
      let right = self.binary(if prec == 12 { prec } else { prec + 1 })?;
      let (left_box, right_box) = (Box::new(left), Box::new(right));
      left = match op {
        BinOp::Binary(op) => Node::Binary { op, left: left_box, right: right_box },
        BinOp::Logical(op) => Node::Logical { op, left: left_box, right: right_box },
      };
    }
    Ok(left)
  }

  fn unary(&mut self) -> MisuseResult<Node> {
    let entry = self.peek();
    let op = match &entry.lexeme {
      Lexeme::Punct("-") => Some(UnaryOp::Neg),
      Lexeme::Punct("+") => Some(UnaryOp::Plus),
      Lexeme::Punct("!") => Some(UnaryOp::Not),
      Lexeme::Punct("~") => Some(UnaryOp::BitNot),
      Lexeme::Name(n) if n == "typeof" => Some(UnaryOp::TypeOf),
      Lexeme::Name(n) if n == "void" => Some(UnaryOp::Void),
      Lexeme::Name(n) if n == "delete" => Some(UnaryOp::Delete),
      Lexeme::Name(n) if n == "await" => return self.unsupported("async functions"),
      _ => None,
    };
    if let Some(op) = op {
      self.next();
      let argument = self.unary()?;
      return Ok(Node::Unary { op, argument: Box::new(argument) });
    }
    let update = if entry.is("++") {
      Some(UpdateOp::Incr)
    } else if entry.is("--") {
      Some(UpdateOp::Decr)
    } else {
      None
    };
    if let Some(op) = update {
      self.next();
      let argument = self.unary()?;
      if !is_target(&argument) {
        return Err(InvalidTarget.pack(self.range(entry)));
      }
      return Ok(Node::Update { op, prefix: true, argument: Box::new(argument) });
    }
    let expr = self.call_member()?;
    let next = self.peek();
    let op = if next.nl_before {
      None
    } else if next.is("++") {
      Some(UpdateOp::Incr)
    } else if next.is("--") {
      Some(UpdateOp::Decr)
    } else {
      None
    };
    let Some(op) = op else { return Ok(expr) };
    if !is_target(&expr) {
      return Err(InvalidTarget.pack(self.range(next)));
    }
    self.next();
    Ok(Node::Update { op, prefix: false, argument: Box::new(expr) })
  }

  /// Calls, member accesses and `new`
  pub(super) fn call_member(&mut self) -> MisuseResult<Node> {
    let mut expr = if self.eat_name("new") {
      let callee = self.member_chain()?;
      let arguments = if self.is("(") { self.arguments()? } else { vec![] };
      Node::New { callee: Box::new(callee), arguments }
    } else {
      self.primary()?
    };
    loop {
      if self.is("(") {
        let arguments = self.arguments()?;
        expr = Node::Call { callee: Box::new(expr), arguments };
      } else if self.is(".") || self.is("[") {
        expr = self.member_suffix(expr)?;
      } else if matches!(self.peek().lexeme, Lexeme::Template { .. }) {
        return self.unsupported("tagged templates");
      } else {
        return Ok(expr);
      }
    }
  }

  /// Callee of a `new` expression, which ends at the first argument list
  fn member_chain(&mut self) -> MisuseResult<Node> {
    let mut expr = if self.eat_name("new") {
      let callee = self.member_chain()?;
      let arguments = if self.is("(") { self.arguments()? } else { vec![] };
      Node::New { callee: Box::new(callee), arguments }
    } else {
      self.primary()?
    };
    while self.is(".") || self.is("[") {
      expr = self.member_suffix(expr)?;
    }
    Ok(expr)
  }

  /// `.name` or `[expr]` following an object. The cursor must be on the `.`
  /// or `[`
  fn member_suffix(&mut self, object: Node) -> MisuseResult<Node> {
    let object = Box::new(object);
    if self.eat(".") {
      let property = Box::new(Node::Ident(self.property_name()?));
      return Ok(Node::Member { object, property, computed: false });
    }
    self.expect("[")?;
    let property = Box::new(self.allow_in(Self::expression)?);
    self.expect("]")?;
    Ok(Node::Member { object, property, computed: true })
  }

  fn arguments(&mut self) -> MisuseResult<Vec<Node>> {
    self.expect("(")?;
    self.allow_in(|p| {
      let mut args = Vec::new();
      while !p.eat(")") {
        args.push(if p.eat("...") { Node::Spread(Box::new(p.assignment()?)) } else { p.assignment()? });
        if !p.is(")") {
          p.expect(",")?;
        }
      }
      Ok(args)
    })
  }

  fn primary(&mut self) -> MisuseResult<Node> {
    let entry = self.peek();
    match &entry.lexeme {
      Lexeme::Num { value, raw } => {
        self.next();
        Ok(Node::Literal(Literal { value: LitValue::Num(*value), raw: raw.clone() }))
      },
      Lexeme::Str { value, raw } => {
        self.next();
        Ok(Node::Literal(Literal { value: LitValue::Str(value.clone()), raw: raw.clone() }))
      },
      Lexeme::Template { quasis, parts } => {
        self.next();
        let mut expressions = Vec::with_capacity(parts.len());
        for part in parts {
          let mut sub = self.sub_parser(part);
          expressions.push(sub.expression()?);
          if !sub.at_end() {
            return sub.expected("the end of the substitution");
          }
        }
        Ok(Node::Template { quasis: quasis.clone(), expressions })
      },
      Lexeme::Punct("(") => {
        self.next();
        let inner = self.allow_in(Self::expression)?;
        self.expect(")")?;
        Ok(inner)
      },
      Lexeme::Punct("[") => self.array(),
      Lexeme::Punct("{") => self.object(),
      Lexeme::Punct("/" | "/=") => self.unsupported("regular expression literals"),
      Lexeme::Name(n) => match n.as_str() {
        "this" => {
          self.next();
          Ok(Node::This)
        },
        "true" | "false" => {
          self.next();
          Ok(Node::Literal(Literal { value: LitValue::Bool(n == "true"), raw: n.clone() }))
        },
        "null" => {
          self.next();
          Ok(Node::Literal(Literal { value: LitValue::Null, raw: n.clone() }))
        },
        "function" => self.function(FnForm::Expression),
        "class" => self.class(true),
        "super" => self.unsupported("super references"),
        "import" => self.unsupported("modules"),
        _ => Ok(Node::Ident(self.ident()?)),
      },
      _ => self.expected("an expression"),
    }
  }

  fn array(&mut self) -> MisuseResult<Node> {
    self.expect("[")?;
    self.allow_in(|p| {
      let mut elements = Vec::new();
      while !p.eat("]") {
        if p.eat(",") {
          elements.push(Node::Hole);
          continue;
        }
        elements.push(if p.eat("...") { Node::Spread(Box::new(p.assignment()?)) } else { p.assignment()? });
        if !p.is("]") {
          p.expect(",")?;
        }
      }
      Ok(Node::Array(elements))
    })
  }

  /// Key of a property or class member, and whether it was computed
  fn property_key(&mut self) -> MisuseResult<(Node, bool)> {
    let entry = self.peek();
    match &entry.lexeme {
      Lexeme::Punct("[") => {
        self.next();
        let key = self.allow_in(Self::assignment)?;
        self.expect("]")?;
        Ok((key, true))
      },
      Lexeme::Num { .. } | Lexeme::Str { .. } => Ok((self.primary()?, false)),
      Lexeme::Name(_) => Ok((Node::Ident(self.property_name()?), false)),
      _ => self.expected("a property name"),
    }
  }

  /// Whether a `get`, `set` or `static` at the cursor is a modifier rather
  /// than a name
  fn is_modifier(&self, word: &str) -> bool {
    let next = self.peek_at(1);
    let ends_name = ["(", ":", ",", "}", "=", ";"].iter().any(|p| next.is(p));
    self.is_name(word) && !ends_name
  }

  fn object(&mut self) -> MisuseResult<Node> {
    self.expect("{")?;
    self.allow_in(|p| {
      let mut props = Vec::new();
      while !p.eat("}") {
        props.push(p.property()?);
        if !p.is("}") {
          p.expect(",")?;
        }
      }
      Ok(Node::Object(props))
    })
  }

  fn property(&mut self) -> MisuseResult<Node> {
    if self.eat("...") {
      return Ok(Node::Spread(Box::new(self.assignment()?)));
    }
    let kind = if self.is_modifier("get") {
      self.next();
      PropKind::Get
    } else if self.is_modifier("set") {
      self.next();
      PropKind::Set
    } else {
      PropKind::Init
    };
    let (key, computed) = self.property_key()?;
    let (value, shorthand, method) = if self.is("(") {
      (self.function_rest(FnForm::Expression, None)?, false, kind == PropKind::Init)
    } else if kind != PropKind::Init {
      return self.expected("a parameter list");
    } else if self.eat(":") {
      (self.assignment()?, false, false)
    } else if matches!(key, Node::Ident(_)) && !computed {
      if self.is("=") {
        return self.unsupported("destructuring patterns");
      }
      (key.clone(), true, false)
    } else {
      return self.expected(":");
    };
    Ok(Node::Property {
      key: Box::new(key),
      value: Box::new(value),
      kind,
      computed,
      shorthand,
      method,
    })
  }

  /// Parenthesized parameter list
  pub(super) fn params(&mut self) -> MisuseResult<Vec<Node>> {
    self.expect("(")?;
    let mut params = Vec::new();
    while !self.eat(")") {
      if self.is("[") || self.is("{") {
        return self.unsupported("destructuring patterns");
      }
      let param = if self.eat("...") {
        Node::Spread(Box::new(Node::Ident(self.ident()?)))
      } else {
        let name = Node::Ident(self.ident()?);
        if self.eat("=") {
          let right = self.allow_in(Self::assignment)?;
          Node::Default { left: Box::new(name), right: Box::new(right) }
        } else {
          name
        }
      };
      params.push(param);
      if !self.is(")") {
        self.expect(",")?;
      }
    }
    Ok(params)
  }

  /// `function` keyword with everything after it
  pub(super) fn function(&mut self, form: FnForm) -> MisuseResult<Node> {
    if !self.eat_name("function") {
      return self.expected("function");
    }
    if self.is("*") {
      return self.unsupported("generators");
    }
    let id = match (&self.peek().lexeme, form) {
      (_, FnForm::Declaration) => Some(self.ident()?),
      (Lexeme::Name(_), _) => Some(self.ident()?),
      _ => None,
    };
    self.function_rest(form, id)
  }

  /// Parameters and body of a function
  fn function_rest(&mut self, form: FnForm, id: Option<String>) -> MisuseResult<Node> {
    let params = self.params()?;
    let body = self.allow_in(Self::block)?;
    Ok(Node::Function { form, id: id.map(|n| Box::new(Node::Ident(n))), params, body: Box::new(body) })
  }

  /// `class` keyword with everything after it
  pub(super) fn class(&mut self, expression: bool) -> MisuseResult<Node> {
    if !self.eat_name("class") {
      return self.expected("class");
    }
    let id = match &self.peek().lexeme {
      Lexeme::Name(n) if n != "extends" => Some(Box::new(Node::Ident(self.ident()?))),
      _ if !expression => return self.expected("a class name"),
      _ => None,
    };
    let superclass = if self.eat_name("extends") { Some(Box::new(self.call_member()?)) } else { None };
    self.expect("{")?;
    let mut body = Vec::new();
    while !self.eat("}") {
      if self.eat(";") {
        continue;
      }
      body.push(self.method()?);
    }
    Ok(Node::Class { id, superclass, body, expression })
  }

  fn method(&mut self) -> MisuseResult<Node> {
    let is_static = self.is_modifier("static") && {
      self.next();
      true
    };
    let kind = if self.is_modifier("get") {
      self.next();
      MethodKind::Get
    } else if self.is_modifier("set") {
      self.next();
      MethodKind::Set
    } else {
      MethodKind::Method
    };
    if self.is("*") {
      return self.unsupported("generators");
    }
    let (key, _) = self.property_key()?;
    if !self.is("(") {
      return self.unsupported("class fields");
    }
    let kind = match key.as_ident() {
      Some("constructor") if !is_static && kind == MethodKind::Method => MethodKind::Constructor,
      _ => kind,
    };
    let value = self.function_rest(FnForm::Expression, None)?;
    Ok(Node::Method { key: Box::new(key), value: Box::new(value), kind, is_static })
  }
}
