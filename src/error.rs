//! Engine error type.
//!
//! Every fallible operation in the engine returns [`EngineError`]. Import and
//! parsing failures keep their underlying cause so callers can walk the chain
//! with [`std::error::Error::source`].

use std::error::Error as StdError;

/// Boxed cause attached to an [`EngineError`].
pub type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// The engine's single domain error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Generic import/parse failure with an optional underlying cause.
    #[error("{message}")]
    Import {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("mesh `{mesh}` has no {attribute}")]
    MissingAttribute { mesh: String, attribute: &'static str },

    #[error("could not build collision shape: {message}")]
    Collision {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read glTF: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("failed to read OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to (de)serialize meta asset: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Error with a message and no cause.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Import {
            message: message.into(),
            cause: None,
        }
    }

    /// Error with a message caused by `cause`.
    pub fn with_cause(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::Import {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Collision shape failure without an underlying cause.
    pub fn collision(message: impl Into<String>) -> Self {
        Self::Collision {
            message: message.into(),
            cause: None,
        }
    }

    /// Error that only wraps `cause`, reusing its message.
    pub fn from_cause(cause: impl Into<Cause>) -> Self {
        let cause = cause.into();
        Self::Import {
            message: cause.to_string(),
            cause: Some(cause),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
