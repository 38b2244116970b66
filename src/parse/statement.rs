//! Statements and declarations

use super::lexer::Lexeme;
use super::Parser;
use crate::error::MisuseResult;
use crate::node::{DeclKind, FnForm, Node};

impl<'a> Parser<'a> {
  /// End of a statement. A semicolon may be omitted before `}`, at the end of
  /// input and at a line break.
  fn semi(&mut self) -> MisuseResult<()> {
    if self.eat(";") || self.is("}") || self.at_end() || self.peek().nl_before {
      return Ok(());
    }
    self.expected(";")
  }

  pub(super) fn statement(&mut self) -> MisuseResult<Node> {
    let entry = self.peek();
    let keyword = match &entry.lexeme {
      Lexeme::Punct("{") => return self.block(),
      Lexeme::Punct(";") => {
        self.next();
        return Ok(Node::Empty);
      },
      Lexeme::Name(n) => n.as_str(),
      _ => "",
    };
    match keyword {
      "var" | "let" | "const" => {
        let decl = self.declaration()?;
        self.semi()?;
        Ok(decl)
      },
      "function" => self.function(FnForm::Declaration),
      "class" => self.class(false),
      "if" => self.if_statement(),
      "for" => self.for_statement(),
      "while" => {
        self.next();
        let test = self.condition()?;
        let body = self.statement()?;
        Ok(Node::While { test: Box::new(test), body: Box::new(body) })
      },
      "do" => {
        self.next();
        let body = self.statement()?;
        if !self.eat_name("while") {
          return self.expected("while");
        }
        let test = self.condition()?;
        // a do-while may be followed directly by the next statement
        self.eat(";");
        Ok(Node::DoWhile { body: Box::new(body), test: Box::new(test) })
      },
      "return" => {
        self.next();
        let ends = self.is(";") || self.is("}") || self.at_end() || self.peek().nl_before;
        let arg = if ends { None } else { Some(Box::new(self.expression()?)) };
        self.semi()?;
        Ok(Node::Return(arg))
      },
      "break" | "continue" => {
        self.next();
        if matches!(self.peek().lexeme, Lexeme::Name(_)) && !self.peek().nl_before {
          return self.unsupported("labels");
        }
        self.semi()?;
        Ok(if keyword == "break" { Node::Break } else { Node::Continue })
      },
      "throw" => {
        self.next();
        let arg = self.expression()?;
        self.semi()?;
        Ok(Node::Throw(Box::new(arg)))
      },
      "try" => self.try_statement(),
      "switch" => self.unsupported("switch statements"),
      "import" | "export" => self.unsupported("modules"),
      "with" => self.unsupported("with statements"),
      "debugger" => self.unsupported("debugger statements"),
      _ if matches!(entry.lexeme, Lexeme::Name(_)) && self.peek_at(1).is(":") =>
        self.unsupported("labels"),
      _ => {
        let expr = self.expression()?;
        self.semi()?;
        Ok(Node::Expr(Box::new(expr)))
      },
    }
  }

  /// Curly braces with a statement list
  pub(super) fn block(&mut self) -> MisuseResult<Node> {
    self.expect("{")?;
    let mut body = Vec::new();
    while !self.eat("}") {
      if self.at_end() {
        return self.expected("}");
      }
      body.push(self.statement()?);
    }
    Ok(Node::Block(body))
  }

  /// Parenthesized condition of `if` and `while`
  fn condition(&mut self) -> MisuseResult<Node> {
    self.expect("(")?;
    let test = self.allow_in(Self::expression)?;
    self.expect(")")?;
    Ok(test)
  }

  /// `var`, `let` or `const` with its declarators, without the semicolon
  fn declaration(&mut self) -> MisuseResult<Node> {
    let kind = match &self.next().lexeme {
      Lexeme::Name(n) if n == "let" => DeclKind::Let,
      Lexeme::Name(n) if n == "const" => DeclKind::Const,
      _ => DeclKind::Var,
    };
    let mut declarations = Vec::new();
    loop {
      if self.is("[") || self.is("{") {
        return self.unsupported("destructuring patterns");
      }
      let id = Box::new(Node::Ident(self.ident()?));
      let init = if self.eat("=") { Some(Box::new(self.assignment()?)) } else { None };
      declarations.push(Node::Declarator { id, init });
      if !self.eat(",") {
        break;
      }
    }
    Ok(Node::Decl { kind, declarations })
  }

  fn if_statement(&mut self) -> MisuseResult<Node> {
    self.next();
    let test = self.condition()?;
    let consequent = self.statement()?;
    let alternate = if self.eat_name("else") { Some(Box::new(self.statement()?)) } else { None };
    Ok(Node::If { test: Box::new(test), consequent: Box::new(consequent), alternate })
  }

  fn for_statement(&mut self) -> MisuseResult<Node> {
    self.next();
    if self.is_name("await") {
      return self.unsupported("async functions");
    }
    self.expect("(")?;
    let init = if self.is(";") {
      None
    } else {
      let saved = std::mem::replace(&mut self.no_in, true);
      let head = if ["var", "let", "const"].iter().any(|k| self.is_name(k)) {
        self.declaration()
      } else {
        self.expression()
      };
      self.no_in = saved;
      Some(head?)
    };
    let of = self.is_name("of");
    let init = match init {
      Some(left) if of || self.is_name("in") => {
        self.next();
        let right = if of { self.assignment()? } else { self.expression()? };
        self.expect(")")?;
        let body = self.statement()?;
        return Ok(Node::ForIn { left: Box::new(left), right: Box::new(right), body: Box::new(body), of });
      },
      init => init,
    };
    self.expect(";")?;
    let test = if self.is(";") { None } else { Some(Box::new(self.expression()?)) };
    self.expect(";")?;
    let update = if self.is(")") { None } else { Some(Box::new(self.expression()?)) };
    self.expect(")")?;
    let body = self.statement()?;
    Ok(Node::For { init: init.map(Box::new), test, update, body: Box::new(body) })
  }

  fn try_statement(&mut self) -> MisuseResult<Node> {
    self.next();
    let block = Box::new(self.block()?);
    let (mut param, mut handler, mut finalizer) = (None, None, None);
    if self.eat_name("catch") {
      if self.eat("(") {
        if self.is("[") || self.is("{") {
          return self.unsupported("destructuring patterns");
        }
        param = Some(Box::new(Node::Ident(self.ident()?)));
        self.expect(")")?;
      }
      handler = Some(Box::new(self.block()?));
    }
    if self.eat_name("finally") {
      finalizer = Some(Box::new(self.block()?));
    }
    if handler.is_none() && finalizer.is_none() {
      return self.expected("catch or finally");
    }
    Ok(Node::Try { block, param, handler, finalizer })
  }
}
