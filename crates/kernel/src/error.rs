//! Application error types.

use thiserror::Error;

use crate::jsmodule::DependencyError;
use crate::menu::MenuError;

/// Errors surfaced by the `katari` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Menu(#[from] MenuError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit code: 2 for bad input, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Menu(MenuError::InvalidLevel)
            | AppError::Dependency(DependencyError::InvalidItem { .. }) => 2,
            _ => 1,
        }
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_exit_code() {
        assert_eq!(AppError::from(MenuError::InvalidLevel).exit_code(), 2);
        let invalid = DependencyError::InvalidItem {
            item: "file.txt".to_string(),
            reason: "the script must have a .js extension",
        };
        assert_eq!(AppError::from(invalid).exit_code(), 2);
        let cycle = DependencyError::CircularDependency {
            item: "a.js".to_string(),
            ancestors: vec!["a.js".to_string()],
        };
        assert_eq!(AppError::from(cycle).exit_code(), 1);
    }
}
