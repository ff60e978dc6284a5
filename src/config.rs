//! Configuration loading.
//!
//! A YAML document with three optional sections:
//!
//! ```yaml
//! hypershell:
//!   embedding_dim: 64
//!   hidden_dim: 128
//!   num_shells: 5
//!   attenuation_factor: 0.8
//!   max_nodes_per_shell: 50
//!   shell_aggregation: mean
//! shells:
//!   max_shells: 10
//!   max_nodes_per_shell: 100
//! root_selection: degree
//! ```
//!
//! Priority: env var > YAML > default.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::atomspace::{AtomStore, Handle};
use crate::error::Result;
use crate::hypershell::HypershellOptions;
use crate::shell::{find_optimal_root, RootSelection, ShellBuilder, ShellOptions};

pub const ENV_EMBEDDING_DIM: &str = "HYPERSHELL_EMBEDDING_DIM";
pub const ENV_HIDDEN_DIM: &str = "HYPERSHELL_HIDDEN_DIM";
pub const ENV_NUM_SHELLS: &str = "HYPERSHELL_NUM_SHELLS";
pub const ENV_ATTENUATION_FACTOR: &str = "HYPERSHELL_ATTENUATION_FACTOR";
pub const ENV_MAX_NODES_PER_SHELL: &str = "HYPERSHELL_MAX_NODES_PER_SHELL";

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypershellConfig {
    /// Orchestrator options
    pub hypershell: HypershellOptions,
    /// Caps for standalone shell builds
    pub shells: ShellOptions,
    /// How callers without an explicit root pick one
    pub root_selection: RootSelection,
}

impl HypershellConfig {
    /// Load from an optional YAML file, then apply env var overrides.
    ///
    /// If `yaml_path` is None, tries "hypershell.yaml" in CWD. A missing or
    /// unparsable file falls back to defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Self {
        let mut config = Self::load_yaml(yaml_path);
        config.apply_env();
        config
    }

    /// Overlay `HYPERSHELL_*` env vars onto the orchestrator options.
    /// Values that fail to parse are ignored.
    pub fn apply_env(&mut self) {
        let h = &mut self.hypershell;
        override_from_env(ENV_EMBEDDING_DIM, &mut h.embedding_dim);
        override_from_env(ENV_HIDDEN_DIM, &mut h.hidden_dim);
        override_from_env(ENV_NUM_SHELLS, &mut h.num_shells);
        override_from_env(ENV_ATTENUATION_FACTOR, &mut h.attenuation_factor);
        override_from_env(ENV_MAX_NODES_PER_SHELL, &mut h.max_nodes_per_shell);
    }

    /// Pick a root in `store` with the configured `root_selection`.
    /// `None` when the store is empty.
    pub fn select_root(&self, store: Arc<dyn AtomStore>) -> Result<Option<Handle>> {
        find_optimal_root(store, self.root_selection)
    }

    /// Build shells under the configured `shells` caps around the root
    /// chosen by [`select_root`](Self::select_root). `None` when the store
    /// is empty.
    pub fn build_shells(&self, store: Arc<dyn AtomStore>) -> Result<Option<ShellBuilder>> {
        let Some(root) = self.select_root(store.clone())? else {
            return Ok(None);
        };
        ShellBuilder::new(store, root, self.shells).map(Some)
    }

    fn load_yaml(yaml_path: Option<&Path>) -> Self {
        let default_path = Path::new("hypershell.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!("No config file at {}, using env vars / defaults", path.display());
                Self::default()
            }
        }
    }
}

fn override_from_env<T: FromStr>(var: &str, slot: &mut T) {
    let Ok(raw) = std::env::var(var) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!("Ignoring {}={:?}: not a valid value", var, raw),
    }
}
