use std::path::PathBuf;

use strum::{Display, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Failed to read image {path:?}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write mask {path:?}: {source}")]
    MaskWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Degenerate geometry: path has {points} distinct points, at least 3 required")]
    DegenerateGeometry { points: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse failure category, used as a structured field when failures are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureReason {
    Decode,
    Write,
    DegenerateGeometry,
    Config,
}

impl SignatureError {
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::ImageRead { .. } => FailureReason::Decode,
            Self::MaskWrite { .. } | Self::Write { .. } => FailureReason::Write,
            Self::DegenerateGeometry { .. } => FailureReason::DegenerateGeometry,
            Self::InvalidConfig(_) => FailureReason::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, SignatureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_names() {
        let err = SignatureError::DegenerateGeometry { points: 2 };
        assert_eq!(err.reason(), FailureReason::DegenerateGeometry);
        assert_eq!(err.reason().to_string(), "degenerate_geometry");

        let err = SignatureError::InvalidConfig("window".to_string());
        assert_eq!(err.reason().to_string(), "config");
    }
}
