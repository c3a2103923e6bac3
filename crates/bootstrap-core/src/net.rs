//! Pre-flight network reachability gate

use std::time::Duration;

use anyhow::{Context, Result};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// One HEAD request against the configured probe URL. Any response at all
/// means the network is usable; a transport error aborts the whole init
/// before any workspace state is touched.
pub async fn check_reachable(probe_url: &str, user_agent: &str) -> Result<()> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(PROBE_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new());

    client
        .head(probe_url)
        .send()
        .await
        .with_context(|| format!("Network check against {} failed", probe_url))?;

    Ok(())
}
