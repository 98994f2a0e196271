//! Fault policy for member lookup failures during traversal
//!
//! A member miss mid-traversal either aborts the extraction or silently
//! excludes the branch. The policy is an explicit sum type consulted at
//! each lookup site; the filtering arm intercepts only the not-found
//! category, so denied/IO faults always propagate.

use crate::error::{AccessError, ExtractError};

/// How a member lookup failure is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Re-raise the miss as `AttributeNotFound` (the default).
    #[default]
    Propagate,
    /// Exclude the missing branch from the result instead of aborting.
    Filter,
}

impl FaultPolicy {
    /// Decide the outcome of a plain member miss.
    pub fn member_miss(
        &self,
        segment: impl Into<String>,
        container: impl Into<String>,
    ) -> ExtractError {
        self.miss(ExtractError::not_found(segment, container))
    }

    /// Decide the outcome of any not-found-class lookup failure.
    pub fn miss(&self, err: ExtractError) -> ExtractError {
        match self {
            FaultPolicy::Propagate => err,
            FaultPolicy::Filter => ExtractError::Filtered,
        }
    }

    /// Decide the outcome of an access-layer fault raised by a lookup.
    ///
    /// Only the not-found category is filterable; everything else passes
    /// through unchanged.
    pub fn access_fault(&self, fault: AccessError) -> ExtractError {
        match (self, fault) {
            (FaultPolicy::Filter, AccessError::NotFound(_)) => ExtractError::Filtered,
            (_, other) => ExtractError::Access(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagate_raises_attribute_not_found() {
        let err = FaultPolicy::Propagate.member_miss("used", "composite<mem>");
        assert!(matches!(err, ExtractError::AttributeNotFound { .. }));
    }

    #[test]
    fn filter_intercepts_only_not_found() {
        let policy = FaultPolicy::Filter;
        assert!(matches!(
            policy.member_miss("x", "map"),
            ExtractError::Filtered
        ));
        assert!(matches!(
            policy.access_fault(AccessError::NotFound("x".into())),
            ExtractError::Filtered
        ));
        assert!(matches!(
            policy.access_fault(AccessError::Denied("x".into())),
            ExtractError::Access(AccessError::Denied(_))
        ));
    }
}
