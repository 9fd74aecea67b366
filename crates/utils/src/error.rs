//! Error types for utility functions.

use eventcar_primitives::Date;

/// Errors that can occur during utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// Keys are not in ascending order.
    #[error("dates out of order at position {position}: {date}")]
    Unsorted {
        /// Index of the offending row.
        position: usize,
        /// Offending date.
        date: Date,
    },

    /// The same date appears twice.
    #[error("duplicate date: {0}")]
    DuplicateDate(Date),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let date = Date::from_ymd_opt(2024, 1, 2).unwrap();
        let err = UtilsError::DuplicateDate(date);
        assert!(err.to_string().contains("2024-01-02"));
    }
}
