//! Accumulated validation outcome.

use serde::{Deserialize, Serialize};

/// Errors block checkout; warnings are shown but do not.
///
/// Validators push every problem they find instead of stopping at the first,
/// so a shopper sees the whole list in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// False once any error has been recorded.
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// An empty, valid report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a blocking error.
    pub fn error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    /// Record a non-blocking warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append everything from `other`.
    pub fn merge(&mut self, other: Self) {
        self.valid &= other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_valid() {
        let report = ValidationReport::new();
        assert!(report.is_valid());
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_warning_keeps_report_valid() {
        let mut report = ValidationReport::new();
        report.warn("heads up");
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec!["heads up".to_string()]);
    }

    #[test]
    fn test_merge_accumulates_everything() {
        let mut a = ValidationReport::new();
        a.warn("w1");
        let mut b = ValidationReport::new();
        b.error("e1");
        b.warn("w2");

        a.merge(b);
        assert!(!a.is_valid());
        assert_eq!(a.errors, vec!["e1".to_string()]);
        assert_eq!(a.warnings, vec!["w1".to_string(), "w2".to_string()]);
    }
}
