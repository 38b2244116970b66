//! Front-end for the JavaScript subset that sources and patterns are written
//! in. A hand-written recursive descent parser over the tokens of
//! [lexer::lex].

pub mod errors;
mod expression;
pub mod lexer;
pub mod numeric;
mod statement;
pub mod string;

use std::sync::Arc;

use tracing::trace;

use self::errors::{Expected, ParseErrorKind, Unsupported};
use self::lexer::{lex, Entry, Lexeme, KEYWORDS};
use crate::error::MisuseResult;
use crate::location::SourceRange;
use crate::node::Node;

/// Parse a complete program into a [Node::Program]
pub fn parse_program(text: &str) -> MisuseResult<Node> {
  let text = Arc::new(text.to_string());
  let tokens = lex(&text)?;
  trace!(tokens = tokens.len(), "lexed source");
  let mut parser = Parser::new(&tokens, &text);
  let mut body = Vec::new();
  while !parser.at_end() {
    body.push(parser.statement()?);
  }
  Ok(Node::Program(body))
}

/// Parse text that must consist of exactly one expression, eg. an anonymous
/// function that would not be a valid statement
pub fn parse_expression(text: &str) -> MisuseResult<Node> {
  let text = Arc::new(text.to_string());
  let tokens = lex(&text)?;
  let mut parser = Parser::new(&tokens, &text);
  let expr = parser.assignment()?;
  parser.eat(";");
  if !parser.at_end() {
    return parser.expected("end of input");
  }
  Ok(expr)
}

/// Cursor over a token stream. The stream must end with [Lexeme::Eof].
pub(crate) struct Parser<'a> {
  tokens: &'a [Entry],
  pos: usize,
  text: &'a Arc<String>,
  /// Set while parsing the head of a `for` loop, where `in` ends the
  /// expression
  no_in: bool,
}
impl<'a> Parser<'a> {
  fn new(tokens: &'a [Entry], text: &'a Arc<String>) -> Self { Self { tokens, pos: 0, text, no_in: false } }

  fn peek(&self) -> &'a Entry { self.peek_at(0) }

  fn peek_at(&self, n: usize) -> &'a Entry {
    let last = self.tokens.len() - 1;
    &self.tokens[(self.pos + n).min(last)]
  }

  fn next(&mut self) -> &'a Entry {
    let entry = self.peek();
    if !matches!(entry.lexeme, Lexeme::Eof) {
      self.pos += 1;
    }
    entry
  }

  fn at_end(&self) -> bool { matches!(self.peek().lexeme, Lexeme::Eof) }
  fn is(&self, punct: &str) -> bool { self.peek().is(punct) }
  fn is_name(&self, name: &str) -> bool { self.peek().is_name(name) }

  fn eat(&mut self, punct: &str) -> bool {
    let found = self.is(punct);
    if found {
      self.next();
    }
    found
  }

  fn eat_name(&mut self, name: &str) -> bool {
    let found = self.is_name(name);
    if found {
      self.next();
    }
    found
  }

  fn range(&self, entry: &Entry) -> SourceRange { SourceRange::new(self.text, entry.range.clone()) }

  /// Error pointing at the next token
  fn expected<T>(&self, expected: &'static str) -> MisuseResult<T> {
    let entry = self.peek();
    Err(Expected { expected, found: entry.lexeme.to_string() }.pack(self.range(entry)))
  }

  fn unsupported<T>(&self, what: &'static str) -> MisuseResult<T> {
    Err(Unsupported(what).pack(self.range(self.peek())))
  }

  fn expect(&mut self, punct: &'static str) -> MisuseResult<()> {
    if self.eat(punct) { Ok(()) } else { self.expected(punct) }
  }

  /// An identifier that isn't a reserved word
  fn ident(&mut self) -> MisuseResult<String> {
    match &self.peek().lexeme {
      Lexeme::Name(n) if !KEYWORDS.contains(n.as_str()) => {
        self.next();
        Ok(n.clone())
      },
      _ => self.expected("an identifier"),
    }
  }

  /// Property names may be reserved words
  fn property_name(&mut self) -> MisuseResult<String> {
    match &self.peek().lexeme {
      Lexeme::Name(n) => {
        self.next();
        Ok(n.clone())
      },
      _ => self.expected("a property name"),
    }
  }

  /// Run the parser with `in` permitted as an operator again, eg. inside
  /// parentheses in a loop head
  fn allow_in<T>(&mut self, f: impl FnOnce(&mut Self) -> MisuseResult<T>) -> MisuseResult<T> {
    let saved = std::mem::replace(&mut self.no_in, false);
    let result = f(self);
    self.no_in = saved;
    result
  }

  /// Parse a token stream nested in a template literal
  fn sub_parser(&self, tokens: &'a [Entry]) -> Parser<'a> { Parser::new(tokens, self.text) }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::node::{AssignOp, BinaryOp, DeclKind, FnForm};

  fn body(text: &str) -> Vec<Node> {
    match parse_program(text) {
      Ok(Node::Program(body)) => body,
      other => panic!("{other:?}"),
    }
  }

  #[test]
  fn precedence() {
    let [Node::Expr(e)] = &body("a = b + c * d;")[..] else { panic!() };
    let Node::Assign { op: AssignOp::Assign, right, .. } = &**e else { panic!("{e:?}") };
    let Node::Binary { op: BinaryOp::Add, right, .. } = &**right else { panic!("{right:?}") };
    assert!(matches!(&**right, Node::Binary { op: BinaryOp::Mul, .. }));
  }

  #[test]
  fn semicolon_insertion() {
    let stmts = body("var a = 1\nvar b = 2\na++\nb");
    assert_eq!(stmts.len(), 4);
    assert!(matches!(&stmts[0], Node::Decl { kind: DeclKind::Var, .. }));
    assert!(parse_program("var a = 1 var b = 2").is_err());
  }

  #[test]
  fn holes_are_explicit() {
    let [Node::Expr(e)] = &body("[, 1, , ];")[..] else { panic!() };
    assert_eq!(**e, Node::Array(vec![Node::Hole, Node::int(1), Node::Hole]));
  }

  #[test]
  fn arrows_and_functions() {
    let stmts = body("var f = (a, b) => a + b; var g = x => { return x; }; function h() {}");
    let Node::Decl { declarations, .. } = &stmts[0] else { panic!() };
    let Node::Declarator { init: Some(init), .. } = &declarations[0] else { panic!() };
    assert!(matches!(&**init, Node::Function { form: FnForm::Arrow, params, .. } if params.len() == 2));
    assert!(matches!(&stmts[2], Node::Function { form: FnForm::Declaration, .. }));
  }

  #[test]
  fn single_expressions() {
    let f = parse_expression("function() { a(); }").expect("anonymous function");
    assert!(matches!(f, Node::Function { form: FnForm::Expression, id: None, .. }));
    assert!(parse_expression("a; b").is_err());
  }

  #[test]
  fn unsupported_syntax_is_an_error() {
    for text in ["var r = /ab+c/;", "switch (x) {}", "function* g() {}", "var [a, b] = c;", "l: x;"] {
      let err = parse_program(text).expect_err(text);
      assert!(err.position().is_some(), "{text} error has no position");
    }
  }
}
