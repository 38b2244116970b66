/// Take the value out of an [Option] or run a control flow expression such as
/// `return false` or `continue` in the surrounding function.
///
/// ```ignore
/// let (head, tail) = crate::utils::unwrap_or!(pattern.split_first(); return k(st));
/// ```
///
/// Keep the fallback to a single short jump; anything longer reads better as
/// a `let .. else`.
macro_rules! unwrap_or {
  ($m:expr; $fail:expr) => {{
    if let Some(res) = ($m) { res } else { $fail }
  }};
}

pub(crate) use unwrap_or;
