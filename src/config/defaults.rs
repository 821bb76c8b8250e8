//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// build: Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn source() -> PathBuf {
        "src".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn data() -> PathBuf {
        "data".into()
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }
}

// ============================================================================
// serve: Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        3000
    }
}

// ============================================================================
// Site Declarations
// ============================================================================

pub mod site {
    /// Placeholder substituted with the language code in file patterns.
    pub const LANG_PLACEHOLDER: &str = "${lang}";

    /// Extension used when a data source declares no `file` pattern.
    pub const DEFAULT_DATA_EXT: &str = "yaml";

    pub fn fallback() -> serde_json::Value {
        serde_json::Value::Null
    }
}
