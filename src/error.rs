//! Error types for the readiness & analytics engine
//!
//! Errors are classified by where they come from:
//! - Isolation: a viewer asked for something outside what its tier may see
//! - Provisioning: a hierarchy could not be built from the supplied nodes
//! - Configuration: the config file is missing, unreadable or invalid
//! - Snapshot: an importer snapshot file could not be read
//!
//! Aggregation itself never fails. Malformed task records are normalized, not
//! reported.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::Tier;

/// Why a node is not visible to a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityReason {
    /// Target is not the viewer or one of its descendants (or does not exist).
    OutsideSubtree,
    /// Target is a descendant, but more than one level below the viewer.
    NonAdjacentTier,
}

impl fmt::Display for VisibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityReason::OutsideSubtree => write!(f, "outside the viewer's subtree"),
            VisibilityReason::NonAdjacentTier => {
                write!(f, "more than one tier below the viewer")
            }
        }
    }
}

/// Access-boundary failures for hierarchy-scoped queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsolationError {
    #[error("Viewer not found in hierarchy: {0}")]
    UnknownViewer(String),

    #[error("Node '{node}' is not visible to '{viewer}': {reason}")]
    NotVisible {
        viewer: String,
        node: String,
        reason: VisibilityReason,
    },
}

/// Failures while building a hierarchy from provisioning data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Node '{node}' references unknown parent '{parent}'")]
    UnknownParent { node: String, parent: String },

    #[error("Hierarchy has no root node")]
    NoRoot,

    #[error("Hierarchy has more than one root: {0:?}")]
    MultipleRoots(Vec<String>),

    #[error("A {child_tier} cannot be placed under a {parent_tier} (node '{node}')")]
    InvalidPlacement {
        node: String,
        parent_tier: Tier,
        child_tier: Tier,
    },

    #[error("Nodes not reachable from the root: {0:?}")]
    Unreachable(Vec<String>),
}

/// Config loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failures reading an importer snapshot from disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serializable error representation for the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub error_type: ErrorType,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Isolation,
    Provisioning,
    Configuration,
    Snapshot,
}

impl From<&IsolationError> for ErrorPayload {
    fn from(err: &IsolationError) -> Self {
        let suggestion = match err {
            IsolationError::UnknownViewer(_) => {
                "Reload the organisation tree; the viewer may have been deprovisioned."
            }
            IsolationError::NotVisible { .. } => {
                "Request the aggregate view through the parent organisation instead."
            }
        };
        ErrorPayload {
            message: err.to_string(),
            error_type: ErrorType::Isolation,
            recovery_suggestion: suggestion.to_string(),
        }
    }
}

impl From<&HierarchyError> for ErrorPayload {
    fn from(err: &HierarchyError) -> Self {
        ErrorPayload {
            message: err.to_string(),
            error_type: ErrorType::Provisioning,
            recovery_suggestion: "Check the organisation tree for missing or misplaced nodes."
                .to_string(),
        }
    }
}

impl From<&ConfigError> for ErrorPayload {
    fn from(err: &ConfigError) -> Self {
        let suggestion = match err {
            ConfigError::HomeDirNotFound => "Set HOME or pass an explicit config path.",
            ConfigError::Read(_) => "Check file permissions for ~/.opsboard/config.json.",
            ConfigError::Parse(_) | ConfigError::Invalid(_) => {
                "Check your configuration in ~/.opsboard/config.json"
            }
        };
        ErrorPayload {
            message: err.to_string(),
            error_type: ErrorType::Configuration,
            recovery_suggestion: suggestion.to_string(),
        }
    }
}

impl From<&SnapshotError> for ErrorPayload {
    fn from(err: &SnapshotError) -> Self {
        ErrorPayload {
            message: err.to_string(),
            error_type: ErrorType::Snapshot,
            recovery_suggestion: "Re-run the tracker import to produce a fresh snapshot.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_visible_message_names_both_nodes() {
        let err = IsolationError::NotVisible {
            viewer: "alpha".to_string(),
            node: "gamma".to_string(),
            reason: VisibilityReason::NonAdjacentTier,
        };
        let msg = err.to_string();
        assert!(msg.contains("alpha"));
        assert!(msg.contains("gamma"));
        assert!(msg.contains("more than one tier"));
    }

    #[test]
    fn test_payload_error_type() {
        let iso = IsolationError::UnknownViewer("x".to_string());
        assert_eq!(ErrorPayload::from(&iso).error_type, ErrorType::Isolation);

        let prov = HierarchyError::NoRoot;
        assert_eq!(ErrorPayload::from(&prov).error_type, ErrorType::Provisioning);

        let cfg = ConfigError::Invalid("performerLimit must be > 0".to_string());
        let payload = ErrorPayload::from(&cfg);
        assert_eq!(payload.error_type, ErrorType::Configuration);
        assert!(payload.message.contains("performerLimit"));
    }

    #[test]
    fn test_payload_serializes_camel_case() {
        let payload = ErrorPayload::from(&HierarchyError::NoRoot);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["errorType"], "provisioning");
        assert!(json.get("recoverySuggestion").is_some());
    }
}
