// vybe-core/src/artifact.rs
// ============================================================================
// Module: Vybe Artifact Index Types
// Description: Pointer to an out-of-band file or URI linked to a task.
// Purpose: Shared type for the artifact index store and the brief assembler.
// Dependencies: serde, crate::ids, crate::time
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::error::CoreError;
use crate::ids::ArtifactId;
use crate::ids::TaskId;
use crate::time::Timestamp;

/// What an artifact's `location` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// A path on the local filesystem.
    File,
    /// A URI (including non-file schemes such as `https://`).
    Uri,
    /// A VCS commit or ref.
    Commit,
    /// Anything else; `label` should describe it.
    Other,
}

impl ArtifactKind {
    /// Returns the stable lowercase string used in storage and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Uri => "uri",
            Self::Commit => "commit",
            Self::Other => "other",
        }
    }

    /// Parses an artifact kind from its stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] for an unrecognized kind.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "file" => Ok(Self::File),
            "uri" => Ok(Self::Uri),
            "commit" => Ok(Self::Commit),
            "other" => Ok(Self::Other),
            other => Err(CoreError::InvalidArgument(format!("unknown artifact kind: {other}"))),
        }
    }
}

/// A single row in the artifact index, optionally linked to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Monotonic identifier.
    pub id: ArtifactId,
    /// Task this artifact is linked to, if any.
    pub task_id: Option<TaskId>,
    /// What kind of pointer `location` is.
    pub kind: ArtifactKind,
    /// The path, URI, or ref itself.
    pub location: String,
    /// Short human-readable label.
    pub label: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
}
