use store_object::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoftDeleteError {
    #[error("E_MODEL_SOFT_DELETE: {model} model does not support soft deletes")]
    UnsupportedModel { model: String },

    #[error("E_MODEL_FORCE_DELETED: cannot restore {model} instance, it was force deleted")]
    ForceDeleted { model: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SoftDeleteError {
    pub fn unsupported_model(model: &str) -> Self {
        Self::UnsupportedModel {
            model: model.to_string(),
        }
    }

    pub fn force_deleted(model: &str) -> Self {
        Self::ForceDeleted {
            model: model.to_string(),
        }
    }

    /// Stable machine readable code; `None` for pass-through store errors
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::UnsupportedModel { .. } => Some("E_MODEL_SOFT_DELETE"),
            Self::ForceDeleted { .. } => Some("E_MODEL_FORCE_DELETED"),
            Self::Store(_) => None,
        }
    }
}
