use serde::Serialize;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    /// Zero-based index of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    /// `(position + 1) / total` as a rounded percentage.
    pub percent_through: u32,
    pub is_last: bool,
}
