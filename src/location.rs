//! Positions in source text, used to point misuse errors at the offending
//! code

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

/// A line and column pair, both 1-based. Columns count grapheme clusters, so
/// they agree with what an editor shows for non-ASCII text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineCol {
  /// 1-based line number
  pub line: usize,
  /// 1-based column in graphemes
  pub col: usize,
}
impl fmt::Display for LineCol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}", self.line, self.col) }
}

/// A byte range within a shared piece of source text
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceRange {
  /// The complete text the range points into
  pub text: Arc<String>,
  /// Byte offsets
  pub range: Range<usize>,
}
impl SourceRange {
  /// Create a range, clamping it to the text
  pub fn new(text: &Arc<String>, range: Range<usize>) -> Self {
    let end = range.end.min(text.len());
    Self { text: text.clone(), range: range.start.min(end)..end }
  }

  /// Line and column of the first character
  #[must_use]
  pub fn start(&self) -> LineCol { line_col(&self.text, self.range.start) }

  /// The text covered by the range
  #[must_use]
  pub fn slice(&self) -> &str { self.text.get(self.range.clone()).unwrap_or("") }
}
impl fmt::Display for SourceRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.start()) }
}
impl fmt::Debug for SourceRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SourceRange({}, {:?})", self.start(), self.range)
  }
}

/// Line and column of a byte offset. Offsets that fall inside a grapheme are
/// attributed to that grapheme.
#[must_use]
pub fn line_col(text: &str, offset: usize) -> LineCol {
  let mut line = 1;
  let mut col = 1;
  for (idx, g) in text.grapheme_indices(true) {
    if offset < idx + g.len() {
      break;
    }
    if g == "\n" || g == "\r\n" {
      line += 1;
      col = 1;
    } else {
      col += 1;
    }
  }
  LineCol { line, col }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn columns_count_graphemes() {
    let text = "a = 1;\nb = 'é'; c";
    assert_eq!(line_col(text, 0), LineCol { line: 1, col: 1 });
    assert_eq!(line_col(text, 7), LineCol { line: 2, col: 1 });
    let c = text.rfind('c').unwrap();
    assert_eq!(line_col(text, c), LineCol { line: 2, col: 10 });
  }

  #[test]
  fn windows_newlines_are_one_break() {
    assert_eq!(line_col("x\r\ny", 3), LineCol { line: 2, col: 1 });
  }
}
