//! Errors produced by the front-end. Every one of them carries the range of
//! the offending text.

use crate::error::{MisuseError, MisuseErrorObj};
use crate::location::SourceRange;

/// Parse error information without a location. Location data is added by the
/// lexer or parser.
pub trait ParseErrorKind: Sized + Send + Sync + 'static {
  /// A general description of the error condition
  const DESCRIPTION: &'static str;
  /// A specific description of the error with concrete text sections
  fn message(&self) -> String { Self::DESCRIPTION.to_string() }
  /// Convert this error to a type-erased [MisuseError] to be handled together
  /// with other misuse errors.
  fn pack(self, range: SourceRange) -> MisuseErrorObj { ParseError { kind: self, range }.pack() }
}

/// A [ParseErrorKind] bundled with its location
pub struct ParseError<T> {
  /// Location of the offending text
  pub range: SourceRange,
  /// What went wrong
  pub kind: T,
}
impl<T: ParseErrorKind> MisuseError for ParseError<T> {
  const DESCRIPTION: &'static str = T::DESCRIPTION;
  fn message(&self) -> String { self.kind.message() }
  fn position(&self) -> Option<SourceRange> { Some(self.range.clone()) }
}

/// A character that cannot start any token
pub struct UnexpectedChar(pub char);
impl ParseErrorKind for UnexpectedChar {
  const DESCRIPTION: &'static str = "Unexpected character";
  fn message(&self) -> String { format!("{:?} cannot appear here", self.0) }
}

/// A string literal without its closing quote
pub struct UnterminatedString;
impl ParseErrorKind for UnterminatedString {
  const DESCRIPTION: &'static str = "Unterminated string literal";
}

/// A template literal without its closing backtick
pub struct UnterminatedTemplate;
impl ParseErrorKind for UnterminatedTemplate {
  const DESCRIPTION: &'static str = "Unterminated template literal";
}

/// A block comment without `*/`
pub struct UnterminatedComment;
impl ParseErrorKind for UnterminatedComment {
  const DESCRIPTION: &'static str = "Unterminated comment";
}

/// Malformed numeric literal
pub struct InvalidNumber(pub String);
impl ParseErrorKind for InvalidNumber {
  const DESCRIPTION: &'static str = "Invalid numeric literal";
  fn message(&self) -> String { format!("{} is not a valid number", self.0) }
}

/// Malformed escape sequence in a string
pub struct InvalidEscape;
impl ParseErrorKind for InvalidEscape {
  const DESCRIPTION: &'static str = "Invalid escape sequence";
}

/// A specific token or construct was expected
pub struct Expected {
  /// Description of what would have been acceptable
  pub expected: &'static str,
  /// The text that was found instead
  pub found: String,
}
impl ParseErrorKind for Expected {
  const DESCRIPTION: &'static str = "Unexpected token";
  fn message(&self) -> String { format!("Expected {}, found {}", self.expected, self.found) }
}

/// Valid JavaScript that the front-end deliberately doesn't handle
pub struct Unsupported(pub &'static str);
impl ParseErrorKind for Unsupported {
  const DESCRIPTION: &'static str = "Unsupported syntax";
  fn message(&self) -> String { format!("{} are not supported", self.0) }
}

/// The left side of an assignment or update is not a name or a member
pub struct InvalidTarget;
impl ParseErrorKind for InvalidTarget {
  const DESCRIPTION: &'static str = "Invalid assignment target";
}
