//! Error types for request traversal.
//!
//! Configuration and relation-resolution problems are fatal and surface to the
//! caller as [`TraverseError`]. Malformed request entries never produce an error;
//! the feature scopes skip them.

use crate::feature::Feature;
use crate::relation::RelationType;
use std::fmt;

/// Traversal error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraverseError {
    /// The model declares no allow-list for the requested feature (strict policy)
    FeatureNotConfigured { model: String, feature: Feature },
    /// No model with this name is registered in the schema
    UnknownModel(String),
    /// The accessor does not name a relation on the model
    UnknownRelation { model: String, relation: String },
    /// The relation exists but its join shape cannot be expressed
    UnsupportedRelation {
        model: String,
        relation: String,
        kind: RelationType,
    },
    /// Empty dot-path or empty path segment
    InvalidPath(String),
    /// The request payload is not an object
    InvalidRequest(String),
    /// Settings could not be loaded
    Config(String),
}

impl fmt::Display for TraverseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraverseError::FeatureNotConfigured { model, feature } => {
                write!(f, "No column configured to be {} on model {model}", feature.verb())
            }
            TraverseError::UnknownModel(name) => write!(f, "Unknown model: {name}"),
            TraverseError::UnknownRelation { model, relation } => {
                write!(f, "Relation '{relation}' is not defined on model {model}")
            }
            TraverseError::UnsupportedRelation {
                model,
                relation,
                kind,
            } => write!(
                f,
                "Relation '{relation}' on model {model} ({kind:?}) cannot be joined"
            ),
            TraverseError::InvalidPath(path) => write!(f, "Invalid relation path: '{path}'"),
            TraverseError::InvalidRequest(msg) => write!(f, "Invalid traversal request: {msg}"),
            TraverseError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for TraverseError {}

impl From<config::ConfigError> for TraverseError {
    fn from(err: config::ConfigError) -> Self {
        TraverseError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TraverseError {
    fn from(err: serde_json::Error) -> Self {
        TraverseError::InvalidRequest(err.to_string())
    }
}
