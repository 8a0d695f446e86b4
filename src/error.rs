//! Error types surfaced by the store and the repository. The UI shows the
//! `Display` text of these directly, so messages are written for the person at
//! the keyboard.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::Collection;

/// Rejections raised while checking a record before it is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required.")]
    MissingField(&'static str),
    #[error("{} {key} already exists!", .collection.key_field())]
    DuplicateKey { collection: Collection, key: i64 },
    #[error("Please select {}.", .0.to_lowercase())]
    UnselectedChoice(&'static str),
}

/// Failures reading or writing the data file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data file {} is not a valid dataset", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to access data file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize dataset")]
    Serialize(#[source] serde_json::Error),
}

/// Everything a repository operation can fail with.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("row {}: {source}", .row + 1)]
    InvalidRow {
        row: usize,
        #[source]
        source: ValidationError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepoError {
    /// The validation failure behind this error, if it is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            RepoError::Validation(err) => Some(err),
            RepoError::InvalidRow { source, .. } => Some(source),
            RepoError::Store(_) => None,
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_message_names_the_key_field() {
        let err = ValidationError::DuplicateKey {
            collection: Collection::Staff,
            key: 3,
        };
        assert_eq!(err.to_string(), "Staff ID 3 already exists!");
    }

    #[test]
    fn unselected_choice_reads_like_the_form_prompt() {
        let err = ValidationError::UnselectedChoice("Gender");
        assert_eq!(err.to_string(), "Please select gender.");
    }

    #[test]
    fn invalid_row_is_one_based() {
        let err = RepoError::InvalidRow {
            row: 0,
            source: ValidationError::MissingField("Name"),
        };
        assert_eq!(err.to_string(), "row 1: Name is required.");
        assert_eq!(err.validation(), Some(&ValidationError::MissingField("Name")));
    }
}
