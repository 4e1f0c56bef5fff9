//! Error taxonomy for the run-state core.
//!
//! Only configuration and content mistakes are errors. A skipped draft
//! choice is a legitimate player action and never reaches this type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FellowshipError {
    /// A run was requested for a leader id the catalog does not define.
    #[error("leader '{0}' not found in catalog")]
    LeaderNotFound(String),
    /// A starting member id does not match any member template.
    #[error("member template '{0}' not found in catalog")]
    UnknownMemberTemplate(String),
    /// A random pick was asked to choose from an empty candidate list.
    #[error("cannot pick from empty input: {what}")]
    EmptyInput { what: String },
    /// The catalog failed validation.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    /// A live run has no curriculum entry for its current segment.
    #[error("run has no segment {0} in its curriculum")]
    MissingSegment(u32),
}

impl FellowshipError {
    pub(crate) fn empty_input(what: impl Into<String>) -> Self {
        Self::EmptyInput { what: what.into() }
    }

    /// True for errors that point at catalog content rather than caller input.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::LeaderNotFound(_)
                | Self::UnknownMemberTemplate(_)
                | Self::InvalidCatalog(_)
                | Self::MissingSegment(_)
        )
    }
}

/// Convenience result type for core operations.
pub type FellowshipResult<T> = Result<T, FellowshipError>;

/// Failure to read, parse, or validate a catalog file.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] FellowshipError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_missing_content() {
        let err = FellowshipError::LeaderNotFound("ghost".into());
        assert_eq!(err.to_string(), "leader 'ghost' not found in catalog");
        assert!(err.is_configuration());

        let err = FellowshipError::empty_input("rank 3 member templates");
        assert_eq!(
            err.to_string(),
            "cannot pick from empty input: rank 3 member templates"
        );
        assert!(!err.is_configuration());

        let err = FellowshipError::MissingSegment(4);
        assert_eq!(err.to_string(), "run has no segment 4 in its curriculum");
        assert!(err.is_configuration());
    }

    #[test]
    fn invalid_catalog_load_is_transparent() {
        let err = CatalogLoadError::from(FellowshipError::InvalidCatalog("no leaders".into()));
        assert_eq!(err.to_string(), "invalid catalog: no leaders");
    }
}
