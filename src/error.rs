use thiserror::Error;

/// Errors raised when caller-supplied names or filter expressions are invalid.
///
/// Empty inputs and unmatched place names are not errors; they surface as
/// empty results and absent map entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsightError {
    #[error("invalid dimension `{0}` (expected one of: country, topic, sector, region, pestle, source)")]
    InvalidDimension(String),
    #[error("invalid metric `{0}` (expected one of: intensity, likelihood, relevance)")]
    InvalidMetric(String),
    #[error("invalid filter `{0}` (expected key=value)")]
    InvalidFilter(String),
}
