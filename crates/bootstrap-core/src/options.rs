//! User-supplied identity of the workspace being created

use anyhow::{bail, Result};

/// Placeholder wildcard hosting domain used when no custom domain is supplied.
pub const SHARED_HOSTING_DOMAIN: &str = "*.amplifyapp.com";

/// The three values that identify a new workspace.
///
/// `app_code` doubles as the workspace directory name and the
/// infrastructure resource-name prefix, so it is restricted to
/// alphanumeric characters.
#[derive(Debug, Clone)]
pub struct CliOptions {
    /// Product name, eg: 'My SaaS App'
    pub app_name: String,
    /// Short application code, eg: 'MSA'
    pub app_code: String,
    /// Custom domain, or [`SHARED_HOSTING_DOMAIN`]
    pub domain_name: String,
}

impl CliOptions {
    /// Build and validate options. All three fields must be non-empty before
    /// orchestration starts.
    pub fn new(
        app_name: impl Into<String>,
        app_code: impl Into<String>,
        domain_name: impl Into<String>,
    ) -> Result<Self> {
        let options = Self {
            app_name: app_name.into(),
            app_code: app_code.into(),
            domain_name: domain_name.into(),
        };
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty()
            || self.app_code.trim().is_empty()
            || self.domain_name.trim().is_empty()
        {
            bail!("APP_NAME, APP_CODE and DOMAINNAME must all be provided and non-empty");
        }
        if !self.app_code.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!(
                "APP_CODE must be alphanumeric, it becomes a directory and resource-name prefix: {:?}",
                self.app_code
            );
        }
        Ok(())
    }

    /// True when the app is hosted on the shared wildcard domain instead of a
    /// custom one. Shared hosting drops the notifications stack.
    pub fn uses_shared_hosting(&self) -> bool {
        self.domain_name.contains("amplifyapp.com")
    }
}
