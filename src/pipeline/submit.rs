//! BOM submission to a Dependency-Track style server.

use crate::config::ServerConfig;
use crate::error::{DepBomError, Result};
use reqwest::blocking::{Client, multipart};
use std::time::Duration;
use tracing::info;

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Upload endpoint for a server base URL
#[must_use]
pub fn bom_endpoint(base_url: &str) -> String {
    format!("{}/api/v1/bom", base_url.trim_end_matches('/'))
}

fn network_error(msg: &str, err: &reqwest::Error) -> DepBomError {
    DepBomError::submit(format!("{msg}: {err}"))
}

/// POST the BOM as a multipart form.
///
/// The project is created on the server if it does not exist yet.
pub fn submit_bom(
    server: &ServerConfig,
    bom: &str,
    project_name: &str,
    project_version: &str,
) -> Result<()> {
    let Some(url) = server.url.as_deref() else {
        return Err(DepBomError::submit("no server URL configured"));
    };
    let endpoint = bom_endpoint(url);

    let client = Client::builder()
        .timeout(SUBMIT_TIMEOUT)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(|e| network_error("Failed to create HTTP client", &e))?;

    let form = multipart::Form::new()
        .text("autoCreate", "true")
        .text("projectName", project_name.to_string())
        .text("projectVersion", project_version.to_string())
        .text("bom", bom.to_string());

    let mut request = client.post(&endpoint).multipart(form);
    if let Some(key) = &server.api_key {
        request = request.header("X-Api-Key", key);
    }

    let response = request
        .send()
        .map_err(|e| network_error("Upload request failed", &e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(DepBomError::submit(format!(
            "{endpoint} returned status {status}"
        )));
    }

    info!("Submitted BOM for {project_name}@{project_version} to {endpoint}");
    Ok(())
}
