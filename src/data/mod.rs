//! Per-language page data.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────────┐
//! │ loader       │ ──► │ resolve      │ ──► │ PageContext per lang │
//! │ (file→Value) │     │ (merge/warn) │     │ (flat JSON object)   │
//! └──────────────┘     └──────────────┘     └──────────────────────┘
//! ```
//!
//! # Error policy
//!
//! | Error         | Raised by        | Recovery                          |
//! |---------------|------------------|-----------------------------------|
//! | `ConfigError` | `config`         | [`Recovery::Abort`] before output |
//! | `LoadError`   | [`loader`]       | [`Recovery::Fallback`] + warning  |
//!
//! Render failures are per page and handled by the compiler.

pub mod loader;
pub mod resolve;
pub mod types;

pub use loader::LoadError;
pub use resolve::resolve_all;
pub use types::PageContext;

use crate::config::ConfigError;

/// What the build does when an error surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Stop the process before touching the output directory.
    Abort,
    /// Log a warning and substitute the declared fallback value.
    Fallback,
}

impl Recovery {
    /// `log!` module an error with this policy is reported under.
    pub const fn log_module(self) -> &'static str {
        match self {
            Self::Abort => "error",
            Self::Fallback => "warn",
        }
    }
}

impl LoadError {
    /// Every content error is recoverable.
    pub const fn policy(&self) -> Recovery {
        match self {
            Self::Io { .. } | Self::Parse { .. } | Self::UnsupportedType { .. } => {
                Recovery::Fallback
            }
        }
    }
}

impl ConfigError {
    pub const fn policy(&self) -> Recovery {
        Recovery::Abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_load_errors_fall_back() {
        let errors = [
            LoadError::Parse {
                path: PathBuf::from("a.yaml"),
                message: "bad".into(),
            },
            LoadError::UnsupportedType {
                path: PathBuf::from("a.xyz"),
                ext: "xyz".into(),
            },
        ];
        for err in &errors {
            assert_eq!(err.policy(), Recovery::Fallback);
        }
    }

    #[test]
    fn test_config_errors_abort() {
        assert_eq!(ConfigError::Missing("languages").policy(), Recovery::Abort);
        assert_eq!(
            ConfigError::Validation("x".into()).policy(),
            Recovery::Abort
        );
        assert_eq!(Recovery::Abort.log_module(), "error");
        assert_eq!(Recovery::Fallback.log_module(), "warn");
    }
}
