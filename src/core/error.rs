use thiserror::Error;

/// Result type alias for metric collection
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors raised while configuring metric collection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// A configuration value was rejected before any record was processed
    #[error("Invalid configuration for '{parameter}': {reason}")]
    InvalidConfiguration {
        /// The offending option
        parameter: String,
        /// Why it was rejected
        reason: String,
    },
}

impl MetricsError {
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Reasons an accumulator skips a record.
///
/// These never abort a run: the collector counts them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("read '{read}' is mapped but carries no reference sequence")]
    MissingReference { read: String },

    #[error("read '{read}' needs a {needed}bp window at {start} but the contig is {contig_length}bp")]
    WindowOutOfBounds {
        read: String,
        start: usize,
        needed: usize,
        contig_length: usize,
    },

    #[error("read '{read}' has alignment end {end} before start {start}")]
    InvertedAlignment {
        read: String,
        start: usize,
        end: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_message() {
        let error = MetricsError::invalid("flow-order", "must not be empty");
        let msg = format!("{error}");
        assert!(msg.contains("'flow-order'"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn test_malformed_record_message() {
        let reason = MalformedRecord::WindowOutOfBounds {
            read: "r1".to_string(),
            start: 95,
            needed: 10,
            contig_length: 100,
        };
        let msg = format!("{reason}");
        assert!(msg.contains("r1"));
        assert!(msg.contains("10bp window at 95"));
    }
}
