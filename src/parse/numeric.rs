//! Parse the text of a numeric literal

use ordered_float::NotNan;

/// Decode a numeric literal. Accepts decimal integers and fractions with an
/// optional exponent, as well as `0x`, `0o` and `0b` prefixed integers. `_`
/// separators are ignored.
pub fn parse_num(raw: &str) -> Option<NotNan<f64>> {
  let text = raw.replace('_', "");
  let (radix, digits) = (text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).map(|s| (16, s)))
    .or_else(|| text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")).map(|s| (8, s)))
    .or_else(|| text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")).map(|s| (2, s)))
    .unwrap_or((10, text.as_str()));
  let value = if radix == 10 {
    if digits.is_empty() || digits == "." {
      return None;
    }
    digits.parse::<f64>().ok()?
  } else {
    if digits.is_empty() {
      return None;
    }
    // digits beyond u64 lose precision the same way the language does
    digits.chars().try_fold(0f64, |acc, c| Some(acc * f64::from(radix) + f64::from(c.to_digit(radix)?)))?
  };
  NotNan::new(value).ok()
}
