//! Abstractions for handling the various ways a caller can misuse the
//! matcher under a common trait object.
//!
//! A match that simply doesn't hold is not an error, see
//! [crate::facade::Outcome]. Errors are reserved for malformed patterns,
//! unparsable input and injections that reference missing bindings.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::location::SourceRange;

/// Errors addressed to the author of a pattern or the caller of the API,
/// which are to be resolved by changing the pattern or the call
pub trait MisuseError: Sized + Send + Sync + 'static {
  /// A general description of this type of error
  const DESCRIPTION: &'static str;
  /// A formatted message that includes specific parameters
  #[must_use]
  fn message(&self) -> String { Self::DESCRIPTION.to_string() }
  /// The position in the source text the error refers to, if known
  #[must_use]
  fn position(&self) -> Option<SourceRange> { None }
  /// Convert the error into an `Arc<dyn DynMisuseError>` to be able to
  /// handle various errors together
  #[must_use]
  fn pack(self) -> MisuseErrorObj { Arc::new(self) }
}

/// Object-safe version of [MisuseError]. Implement that instead of this.
pub trait DynMisuseError: Send + Sync {
  /// Access type information about this error
  #[must_use]
  fn as_any(&self) -> &dyn Any;
  /// A general description of this type of error
  #[must_use]
  fn description(&self) -> &str;
  /// A formatted message that includes specific parameters
  #[must_use]
  fn message(&self) -> String { self.description().to_string() }
  /// The position in the source text the error refers to
  #[must_use]
  fn position(&self) -> Option<SourceRange>;
}

impl<T> DynMisuseError for T
where T: MisuseError
{
  fn as_any(&self) -> &dyn Any { self }
  fn description(&self) -> &str { T::DESCRIPTION }
  fn message(&self) -> String { MisuseError::message(self) }
  fn position(&self) -> Option<SourceRange> { MisuseError::position(self) }
}

impl fmt::Display for dyn DynMisuseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let description = self.description();
    let message = self.message();
    match self.position() {
      None => write!(f, "{description}: {message}"),
      Some(pos) => write!(f, "{description} at {pos}: {message}"),
    }
  }
}

impl fmt::Debug for dyn DynMisuseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}

/// Type-erased [MisuseError] implementor through the [DynMisuseError]
/// object-trait
pub type MisuseErrorObj = Arc<dyn DynMisuseError>;
/// Alias for a result with an error of [Arc] of [MisuseError] trait object.
/// Every fallible public operation returns this.
pub type MisuseResult<T> = Result<T, MisuseErrorObj>;

#[cfg(test)]
mod test {
  use super::*;

  struct Oops(&'static str);
  impl MisuseError for Oops {
    const DESCRIPTION: &'static str = "Something went wrong";
    fn message(&self) -> String { format!("because of {}", self.0) }
  }

  #[test]
  fn packed_errors_keep_their_type() {
    let err = Oops("reasons").pack();
    assert_eq!(err.to_string(), "Something went wrong: because of reasons");
    assert!(err.as_any().downcast_ref::<Oops>().is_some());
  }
}
