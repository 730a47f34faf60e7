//! Error types for the mining policy subsystem

use thiserror::Error;

/// Result type alias for policy operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can surface from policy queries.
///
/// Malformed license outputs are never errors; they are skipped where they
/// are parsed. What remains is infrastructure trouble (the chain view cannot
/// produce a block the walk needs) and configuration mistakes.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The chain view could not produce the block body for a height the
    /// round walk required.
    #[error("block at height {height} missing from chain view")]
    MissingBlock {
        /// Height the walk tried to read.
        height: u32,
    },

    /// The chain has no tip yet; round walks are undefined.
    #[error("chain view has no tip")]
    EmptyChain,

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PolicyError {
    /// True for errors caused by the surrounding infrastructure rather than
    /// by policy inputs; the host should treat these as fatal for the
    /// current operation and retry after the chain view recovers.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::MissingBlock { .. } | Self::EmptyChain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_classification() {
        assert!(PolicyError::MissingBlock { height: 7 }.is_infrastructure());
        assert!(PolicyError::EmptyChain.is_infrastructure());
        assert!(!PolicyError::InvalidConfig("bad".into()).is_infrastructure());
    }

    #[test]
    fn test_display_carries_height() {
        let err = PolicyError::MissingBlock { height: 1234 };
        assert!(err.to_string().contains("1234"));
    }
}
