//! Configuration types for context resolution and evaluation sessions.
//!
//! All types implement [`serde::Deserialize`] for loading from TOML.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining session and resolution settings.
//! - [`SessionConfig`] - Names of the slots the broker uses inside an evaluation session.
//! - [`ResolutionConfig`] - Limits applied while walking the block hierarchy.
//!
//! # Example
//!
//! ```
//! # use blockctx::config::AppConfig;
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [resolution]
//!     max_depth = 64
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.resolution().max_depth(), 64);
//! assert_eq!(config.session().context_slot(), "context");
//! ```

use serde::Deserialize;

/// Default name of the slot receiving the statement lines.
pub const DEFAULT_CONTEXT_SLOT: &str = "context";

/// Default name of the slot receiving evaluated variable names.
pub const DEFAULT_NAMES_SLOT: &str = "context_names";

/// Default name of the slot receiving evaluated variable values.
pub const DEFAULT_VALUES_SLOT: &str = "context_values";

/// Default bound on the number of nodes in a hierarchy walk.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Evaluation session section.
    #[serde(default)]
    session: SessionConfig,

    /// Hierarchy resolution section.
    #[serde(default)]
    resolution: ResolutionConfig,
}

impl AppConfig {
    pub fn new(session: SessionConfig, resolution: ResolutionConfig) -> Self {
        Self {
            session,
            resolution,
        }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn resolution(&self) -> &ResolutionConfig {
        &self.resolution
    }
}

/// Slot names used inside an evaluation session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    context_slot: String,
    names_slot: String,
    values_slot: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            context_slot: DEFAULT_CONTEXT_SLOT.to_string(),
            names_slot: DEFAULT_NAMES_SLOT.to_string(),
            values_slot: DEFAULT_VALUES_SLOT.to_string(),
        }
    }
}

impl SessionConfig {
    /// Creates a session configuration with explicit slot names.
    pub fn new(
        context_slot: impl Into<String>,
        names_slot: impl Into<String>,
        values_slot: impl Into<String>,
    ) -> Self {
        Self {
            context_slot: context_slot.into(),
            names_slot: names_slot.into(),
            values_slot: values_slot.into(),
        }
    }

    /// Slot the statement lines are written to.
    pub fn context_slot(&self) -> &str {
        &self.context_slot
    }

    /// Slot holding the evaluated variable names.
    pub fn names_slot(&self) -> &str {
        &self.names_slot
    }

    /// Slot holding the evaluated variable values.
    pub fn values_slot(&self) -> &str {
        &self.values_slot
    }
}

/// Limits applied while walking the block hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Maximum number of nodes a walk may visit before it is reported as a cycle.
    max_depth: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolutionConfig {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
