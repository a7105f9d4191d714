//! Export errors
//!
//! Every variant is fatal: the export aborts and no output file is written.
//! [`ExportError::kind`] groups variants the way the CLI reports them.

/// Broad class of an [`ExportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The invocation asked for something that cannot be expressed
    Configuration,
    /// The scene contradicts itself or the request
    Consistency,
    /// Asset buffers could not be encoded
    Encoding,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unknown root motion mode '{0}' (expected local, global, or first)")]
    UnknownRootMotion(String),

    #[error("malformed clip selector '{selector}': {reason}")]
    MalformedSelector { selector: String, reason: String },

    #[error("clip '{name}' has an empty frame range [{first}, {last}]")]
    EmptyFrameRange { name: String, first: i32, last: i32 },

    #[error("object '{0}' not found in scene")]
    ObjectNotFound(String),

    #[error("unknown object type '{kind}' for object '{name}' (expected an armature or a mesh)")]
    UnsupportedObject { name: String, kind: String },

    #[error("mesh '{0}' is not bound to an armature")]
    MissingArmature(String),

    #[error("action '{0}' not found")]
    ActionNotFound(String),

    #[error("bone '{0}' not found in skeleton")]
    BoneNotFound(String),

    #[error("bone '{bone}' has parent '{parent}' which is not in the skeleton")]
    MissingParent { bone: String, parent: String },

    #[error("bone hierarchy has a cycle through '{0}'")]
    BoneCycle(String),

    #[error("bind matrix of bone '{0}' is not invertible")]
    SingularBindMatrix(String),

    #[error("pose has no transform for bone '{0}'")]
    MissingPoseBone(String),

    #[error("mesh '{mesh}' has vertex group '{group}' with no matching bone")]
    UnknownVertexGroup { mesh: String, group: String },

    #[error("invalid scene: {0}")]
    InvalidScene(String),

    #[error(transparent)]
    Encoding(#[from] anyhow::Error),
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::UnknownRootMotion(_)
            | ExportError::MalformedSelector { .. }
            | ExportError::EmptyFrameRange { .. } => ErrorKind::Configuration,
            ExportError::Encoding(_) => ErrorKind::Encoding,
            _ => ErrorKind::Consistency,
        }
    }
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
