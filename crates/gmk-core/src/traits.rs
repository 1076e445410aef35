use crate::error::Result;

/// Validate structural integrity of a geometric entity.
///
/// Construction already rejects malformed inputs; `validate` re-checks the
/// invariants of a value that may have been mutated or deserialized.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}
