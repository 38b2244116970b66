//! Split source text into tokens. Template literals are lexed recursively, so
//! each substitution becomes its own token stream.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use hashbrown::HashSet;
use itertools::Itertools;
use once_cell::sync::Lazy;
use ordered_float::NotNan;

use super::errors::{
  InvalidEscape, InvalidNumber, ParseErrorKind, UnexpectedChar, UnterminatedComment,
  UnterminatedString, UnterminatedTemplate,
};
use super::numeric::parse_num;
use super::string::{lex_string, StringError};
use crate::error::MisuseResult;
use crate::location::SourceRange;

/// Words that can't be used as identifiers
pub static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
  HashSet::from_iter([
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "export", "extends", "false", "finally", "for", "function", "if", "import", "in",
    "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield",
  ])
});

/// Longest first, so that the first prefix match is the right one
const PUNCTUATORS: &[&str] = &[
  ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "=>", "==", "!=", "<=", ">=", "&&", "||",
  "??", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<", ">>", "{", "}", "(",
  ")", "[", "]", ";", ",", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":", "=",
  ".",
];

/// One token
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
  /// Identifier or keyword
  Name(String),
  /// Numeric literal
  Num {
    /// Decoded value
    value: NotNan<f64>,
    /// Source text
    raw: String,
  },
  /// String literal
  Str {
    /// Value with escapes decoded
    value: String,
    /// Source text including the quotes
    raw: String,
  },
  /// Template literal
  Template {
    /// Raw text between the substitutions, one more than `parts`
    quasis: Vec<String>,
    /// Tokens of each substitution
    parts: Vec<Vec<Entry>>,
  },
  /// Operator or delimiter
  Punct(&'static str),
  /// End of the token stream
  Eof,
}
impl fmt::Display for Lexeme {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Name(n) => write!(f, "{n}"),
      Self::Num { raw, .. } | Self::Str { raw, .. } => write!(f, "{raw}"),
      Self::Template { quasis, .. } => write!(f, "`{}`", quasis.iter().join("${...}")),
      Self::Punct(p) => write!(f, "{p}"),
      Self::Eof => write!(f, "end of input"),
    }
  }
}

/// A token with its position
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
  /// The token
  pub lexeme: Lexeme,
  /// Byte range in the source
  pub range: Range<usize>,
  /// Whether a line break precedes the token, used for semicolon insertion
  pub nl_before: bool,
}
impl Entry {
  /// Whether this is the given operator or delimiter
  pub fn is(&self, punct: &str) -> bool { matches!(self.lexeme, Lexeme::Punct(p) if p == punct) }
  /// Whether this is the given name or keyword
  pub fn is_name(&self, name: &str) -> bool { matches!(&self.lexeme, Lexeme::Name(n) if n == name) }
}

fn is_ident_start(c: char) -> bool { c == '$' || c == '_' || c.is_alphabetic() }
fn is_ident_part(c: char) -> bool { c == '$' || c == '_' || c.is_alphanumeric() }

struct Lexer<'a> {
  text: &'a Arc<String>,
  pos: usize,
}
impl<'a> Lexer<'a> {
  fn rest(&self) -> &'a str { self.text.get(self.pos..).unwrap_or("") }
  fn peek(&self) -> Option<char> { self.rest().chars().next() }
  fn range(&self, start: usize) -> SourceRange { SourceRange::new(self.text, start..self.pos) }

  /// Skip whitespace and comments, report whether a line break was passed
  fn skip_trivia(&mut self) -> MisuseResult<bool> {
    let mut newline = false;
    loop {
      let rest = self.rest();
      if let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
        newline |= c == '\n' || c == '\r' || c == '\u{2028}' || c == '\u{2029}';
        self.pos += c.len_utf8();
      } else if rest.starts_with("//") {
        self.pos += rest.find('\n').unwrap_or(rest.len());
      } else if rest.starts_with("/*") {
        let Some(end) = rest[2..].find("*/") else {
          let start = self.pos;
          self.pos = self.text.len();
          return Err(UnterminatedComment.pack(self.range(start)));
        };
        newline |= rest[2..2 + end].contains('\n');
        self.pos += end + 4;
      } else {
        return Ok(newline);
      }
    }
  }

  fn number(&mut self) -> MisuseResult<Lexeme> {
    let start = self.pos;
    let rest = self.rest();
    let prefixed = ["0x", "0X", "0o", "0O", "0b", "0B"].iter().any(|p| rest.starts_with(p));
    let mut len = 0;
    let mut chars = rest.chars().peekable();
    if prefixed {
      len = 2 + rest[2..].chars().take_while(|c| c.is_ascii_alphanumeric() || *c == '_').count();
    } else {
      let mut seen_dot = false;
      let mut seen_exp = false;
      while let Some(c) = chars.next() {
        match c {
          '0'..='9' | '_' => len += 1,
          '.' if !seen_dot && !seen_exp => {
            seen_dot = true;
            len += 1
          },
          'e' | 'E' if !seen_exp => {
            seen_exp = true;
            len += 1;
            if let Some(sign @ ('+' | '-')) = chars.peek().copied() {
              chars.next();
              len += sign.len_utf8();
            }
          },
          _ => break,
        }
      }
    }
    self.pos += len;
    let raw = rest[..len].to_string();
    let trailing = self.peek().is_some_and(is_ident_part);
    match parse_num(&raw).filter(|_| !trailing) {
      Some(value) => Ok(Lexeme::Num { value, raw }),
      None => Err(InvalidNumber(raw).pack(self.range(start))),
    }
  }

  fn string(&mut self) -> MisuseResult<Lexeme> {
    let start = self.pos;
    let rest = self.rest();
    match lex_string(rest) {
      Ok((value, len)) => {
        self.pos += len;
        Ok(Lexeme::Str { value, raw: rest[..len].to_string() })
      },
      Err(StringError::Unterminated) => {
        self.pos += rest.find('\n').unwrap_or(rest.len());
        Err(UnterminatedString.pack(self.range(start)))
      },
      Err(StringError::BadEscape) => {
        self.pos += 1;
        Err(InvalidEscape.pack(self.range(start)))
      },
    }
  }

  fn template(&mut self) -> MisuseResult<Lexeme> {
    let start = self.pos;
    self.pos += 1;
    let mut quasis = Vec::new();
    let mut parts = Vec::new();
    let mut quasi_start = self.pos;
    loop {
      let rest = self.rest();
      let Some(c) = rest.chars().next() else {
        return Err(UnterminatedTemplate.pack(self.range(start)));
      };
      if c == '`' {
        quasis.push(self.text[quasi_start..self.pos].to_string());
        self.pos += 1;
        return Ok(Lexeme::Template { quasis, parts });
      } else if c == '\\' {
        self.pos += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
      } else if rest.starts_with("${") {
        quasis.push(self.text[quasi_start..self.pos].to_string());
        self.pos += 2;
        let tokens = self.tokens(true)?;
        parts.push(tokens);
        quasi_start = self.pos;
      } else {
        self.pos += c.len_utf8();
      }
    }
  }

  /// Lex until the end of the text, or if `in_template` is set, until the
  /// `}` closing a template substitution, which is consumed.
  fn tokens(&mut self, in_template: bool) -> MisuseResult<Vec<Entry>> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let start = self.pos;
    loop {
      let nl_before = self.skip_trivia()?;
      let tok_start = self.pos;
      let rest = self.rest();
      let Some(c) = rest.chars().next() else {
        if in_template {
          return Err(UnterminatedTemplate.pack(self.range(start)));
        }
        out.push(Entry { lexeme: Lexeme::Eof, range: self.pos..self.pos, nl_before: true });
        return Ok(out);
      };
      let lexeme = if is_ident_start(c) {
        let len = rest.find(|c| !is_ident_part(c)).unwrap_or(rest.len());
        self.pos += len;
        Lexeme::Name(rest[..len].to_string())
      } else if c.is_ascii_digit() || (c == '.' && rest[1..].starts_with(|c: char| c.is_ascii_digit())) {
        self.number()?
      } else if c == '"' || c == '\'' {
        self.string()?
      } else if c == '`' {
        self.template()?
      } else if let Some(p) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
        match *p {
          "{" => depth += 1,
          "}" if in_template && depth == 0 => {
            self.pos += 1;
            let end = self.pos;
            out.push(Entry { lexeme: Lexeme::Eof, range: tok_start..end, nl_before: true });
            return Ok(out);
          },
          "}" => depth = depth.saturating_sub(1),
          _ => (),
        }
        self.pos += p.len();
        Lexeme::Punct(p)
      } else {
        self.pos += c.len_utf8();
        return Err(UnexpectedChar(c).pack(self.range(tok_start)));
      };
      out.push(Entry { lexeme, range: tok_start..self.pos, nl_before });
    }
  }
}

/// Split the text into tokens. The stream always ends with [Lexeme::Eof].
pub fn lex(text: &Arc<String>) -> MisuseResult<Vec<Entry>> { Lexer { text, pos: 0 }.tokens(false) }

#[cfg(test)]
mod test {
  use super::*;

  fn lexemes(text: &str) -> Vec<Lexeme> {
    lex(&Arc::new(text.to_string())).unwrap().into_iter().map(|e| e.lexeme).collect()
  }

  #[test]
  fn operators_take_the_longest_match() {
    assert_eq!(lexemes("a>>>=b")[1], Lexeme::Punct(">>>="));
    assert_eq!(lexemes("a=>b")[1], Lexeme::Punct("=>"));
    assert_eq!(lexemes("x.y")[1], Lexeme::Punct("."));
  }

  #[test]
  fn comments_and_newlines() {
    let toks = lex(&Arc::new("a /* one\ntwo */ b // c\nd".to_string())).unwrap();
    let names = toks.iter().map(|e| (e.lexeme.to_string(), e.nl_before)).collect::<Vec<_>>();
    assert_eq!(names[..3], [("a".to_string(), false), ("b".to_string(), true), ("d".to_string(), true)]);
  }

  #[test]
  fn templates_nest() {
    let toks = lexemes("`a${ {b: `c${d}`}.b }e`");
    let Lexeme::Template { quasis, parts } = &toks[0] else { panic!("{toks:?}") };
    assert_eq!(quasis, &["a".to_string(), "e".to_string()]);
    assert_eq!(parts[0].first().map(|e| &e.lexeme), Some(&Lexeme::Punct("{")));
    assert!(matches!(parts[0].last().map(|e| &e.lexeme), Some(Lexeme::Eof)));
  }

  #[test]
  fn errors_have_positions() {
    let err = lex(&Arc::new("x = 'abc".to_string())).unwrap_err();
    assert_eq!(err.position().map(|p| p.start().col), Some(5));
    assert!(lex(&Arc::new("3in".to_string())).is_err());
    assert!(lex(&Arc::new("a # b".to_string())).is_err());
  }
}
