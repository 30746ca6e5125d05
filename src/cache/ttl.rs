//! TTL Policy Module
//!
//! Maps each class of read operation to how long its results stay cached.

use serde::Serialize;

/// Default lifetime of list views, in seconds
pub const LIST_TTL_SECS: u64 = 300;
/// Default lifetime of single-entity views
pub const DETAIL_TTL_SECS: u64 = 600;
/// Default lifetime of aggregate statistics
pub const STATS_TTL_SECS: u64 = 900;
/// Default lifetime of availability checks
pub const VALIDATION_TTL_SECS: u64 = 60;

// == TTL Class ==
/// Operation class every cached read is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlClass {
    List,
    Detail,
    Stats,
    Validation,
}

// == TTL Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub list: u64,
    pub detail: u64,
    pub stats: u64,
    pub validation: u64,
}

impl TtlPolicy {
    /// Seconds an entry of `class` lives.
    pub fn seconds(&self, class: TtlClass) -> u64 {
        match class {
            TtlClass::List => self.list,
            TtlClass::Detail => self.detail,
            TtlClass::Stats => self.stats,
            TtlClass::Validation => self.validation,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            list: LIST_TTL_SECS,
            detail: DETAIL_TTL_SECS,
            stats: STATS_TTL_SECS,
            validation: VALIDATION_TTL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.seconds(TtlClass::List), 300);
        assert_eq!(policy.seconds(TtlClass::Detail), 600);
        assert_eq!(policy.seconds(TtlClass::Stats), 900);
        assert_eq!(policy.seconds(TtlClass::Validation), 60);
    }

    #[test]
    fn test_custom_policy() {
        let policy = TtlPolicy {
            list: 1,
            ..TtlPolicy::default()
        };
        assert_eq!(policy.seconds(TtlClass::List), 1);
        assert_eq!(policy.seconds(TtlClass::Stats), 900);
    }
}
