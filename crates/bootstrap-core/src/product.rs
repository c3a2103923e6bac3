//! Product configuration trait for CLI binaries
//!
//! This trait defines the interface a product binary must implement to
//! configure the bootstrapping behavior for its specific stack: where the
//! asset bundle lives, which upstream template the frontend generator uses,
//! and what to tell the user afterwards.

use std::path::Path;

use crate::process::runner::{self, PromptRule};

/// Configuration trait for different CLI products.
pub trait StackConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Default URL of the downloadable asset bundle (zip)
    fn asset_bundle_url(&self) -> &'static str;

    /// Environment variable name for overriding the asset bundle URL
    fn asset_url_env(&self) -> &'static str;

    /// URL probed by the pre-flight network check
    fn connectivity_probe_url(&self) -> &'static str;

    /// Upstream template repository passed to the frontend generator
    fn frontend_template_repo(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Generate the "next steps" instructions after workspace creation
    fn next_steps(&self, dir: &Path) -> Vec<String>;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }

    /// Prompt markers answered on generator stdin. Override to support
    /// generators with different interactive confirmations.
    fn prompt_rules(&self) -> Vec<PromptRule> {
        runner::default_prompt_rules()
    }
}
