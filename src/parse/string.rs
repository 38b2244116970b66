//! Decode quoted string literals

/// Why a string literal could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringError {
  /// The closing quote is missing
  Unterminated,
  /// A `\x` or `\u` escape is malformed
  BadEscape,
}

/// Decode the string literal at the start of `text`, which must begin with
/// its opening quote. Returns the decoded value and the byte length of the
/// literal including both quotes.
pub fn lex_string(text: &str) -> Result<(String, usize), StringError> {
  let mut chars = text.char_indices();
  let quote = chars.next().map(|(_, c)| c).ok_or(StringError::Unterminated)?;
  let mut value = String::new();
  while let Some((i, c)) = chars.next() {
    match c {
      c if c == quote => return Ok((value, i + c.len_utf8())),
      '\n' | '\r' => return Err(StringError::Unterminated),
      '\\' => {
        let (_, esc) = chars.next().ok_or(StringError::Unterminated)?;
        match esc {
          'n' => value.push('\n'),
          't' => value.push('\t'),
          'r' => value.push('\r'),
          'b' => value.push('\u{8}'),
          'f' => value.push('\u{c}'),
          'v' => value.push('\u{b}'),
          '0' => value.push('\0'),
          // line continuation
          '\n' => (),
          '\r' => {
            if chars.clone().next().map(|(_, c)| c) == Some('\n') {
              chars.next();
            }
          },
          'x' => {
            let hex = (chars.by_ref().take(2)).map(|(_, c)| c).collect::<String>();
            value.push(hex_char(&hex, 2)?);
          },
          'u' => {
            let braced = chars.clone().next().map(|(_, c)| c) == Some('{');
            let hex = if braced {
              chars.next();
              let hex = (chars.by_ref().map(|(_, c)| c)).take_while(|c| *c != '}').collect::<String>();
              if hex.is_empty() || hex.len() > 6 {
                return Err(StringError::BadEscape);
              }
              hex
            } else {
              let hex = (chars.by_ref().take(4)).map(|(_, c)| c).collect::<String>();
              if hex.len() != 4 {
                return Err(StringError::BadEscape);
              }
              hex
            };
            value.push(hex_char(&hex, hex.len())?);
          },
          other => value.push(other),
        }
      },
      c => value.push(c),
    }
  }
  Err(StringError::Unterminated)
}

fn hex_char(hex: &str, len: usize) -> Result<char, StringError> {
  if hex.len() != len {
    return Err(StringError::BadEscape);
  }
  let code = u32::from_str_radix(hex, 16).map_err(|_| StringError::BadEscape)?;
  // lone surrogates have no char representation
  Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn escapes_decode() {
    assert_eq!(lex_string(r#""a\tb" + x"#), Ok(("a\tb".to_string(), 6)));
    assert_eq!(lex_string(r"'it\'s'"), Ok(("it's".to_string(), 7)));
    assert_eq!(lex_string(r"'\x41B\u{43}'").map(|r| r.0), Ok("ABC".to_string()));
  }

  #[test]
  fn unterminated() {
    assert_eq!(lex_string("'abc"), Err(StringError::Unterminated));
    assert_eq!(lex_string("'abc\n'"), Err(StringError::Unterminated));
    assert_eq!(lex_string(r"'\xZZ'"), Err(StringError::BadEscape));
  }
}
