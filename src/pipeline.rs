//! Synthetic end-to-end check of the deployed signup pipeline.
//!
//! The checks run one after another. Each one is wrapped in its own failure boundary,
//! so an error inside a check turns into a failed `Check` and the remaining checks still run.

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::{
    config::PipelineConfig,
    provider::{types::Automation, ProviderClient},
    utils,
};

pub const SKIPPED_NO_API_KEY: &str = "Skipped (no API key)";

type CheckResult = anyhow::Result<Outcome>;

// ###################################
// ->   STRUCTS
// ###################################
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub pass: bool,
    pub detail: String,
}

/// Body of `GET /api/dashboard?action=test-pipeline`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub checks: Vec<Check>,
    pub all_passed: bool,
    pub tested_at: String,
}

/// What a check reports when it ran to completion.
#[derive(Debug)]
struct Outcome {
    pass: bool,
    detail: String,
}

/// Plain HTTP client for the public pages of the deployment.
#[derive(Debug)]
pub struct SiteProbe {
    pub http_client: Client,
    pub landing_page_url: String,
    pub subscribe_url: String,
}

// ###################################
// ->   IMPLs
// ###################################
impl Outcome {
    fn new(pass: bool, detail: impl Into<String>) -> Self {
        Outcome {
            pass,
            detail: detail.into(),
        }
    }
}

impl PipelineReport {
    pub fn new(checks: Vec<Check>, tested_at: DateTime<Utc>) -> Self {
        let all_passed = checks.iter().all(|check| check.pass);
        PipelineReport {
            checks,
            all_passed,
            tested_at: utils::iso_timestamp(tested_at),
        }
    }
}

impl SiteProbe {
    pub fn new(
        landing_page_url: String,
        subscribe_url: String,
        timeout: std::time::Duration,
    ) -> reqwest::Result<Self> {
        // Redirects are followed with reqwest's default policy.
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(SiteProbe {
            http_client,
            landing_page_url,
            subscribe_url,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> reqwest::Result<Self> {
        Self::new(
            config.landing_page_url.clone(),
            config.subscribe_url.clone(),
            config.timeout(),
        )
    }

    /// Status code of a plain GET to `url`.
    pub async fn status(&self, url: &str) -> reqwest::Result<StatusCode> {
        let resp = self.http_client.get(url).send().await?;
        Ok(resp.status())
    }
}

// ###################################
// ->   CHECKS
// ###################################
/// Runs every check in order and collects the results.
#[tracing::instrument(name = "run_pipeline_checks", skip_all)]
pub async fn run(provider: &ProviderClient, probe: &SiteProbe) -> PipelineReport {
    let checks: Vec<(&'static str, BoxFuture<'_, CheckResult>)> = vec![
        ("API Key", api_key(provider).boxed()),
        ("Landing Page", landing_page(probe).boxed()),
        ("Subscribe Function", subscribe_function(probe).boxed()),
        ("MailerLite Group", provider_group(provider).boxed()),
        ("Automation", automation(provider).boxed()),
    ];

    let mut results = Vec::with_capacity(checks.len());
    for (name, check) in checks {
        results.push(isolate(name, check).await);
    }

    PipelineReport::new(results, Utc::now())
}

/// Failure boundary around a single check.
async fn isolate(name: &'static str, check: BoxFuture<'_, CheckResult>) -> Check {
    match check.await {
        Ok(Outcome { pass, detail }) => {
            tracing::debug!("{name}: pass={pass} ({detail})");
            Check { name, pass, detail }
        }
        Err(er) => {
            tracing::warn!("{name}: check errored: {er}");
            Check {
                name,
                pass: false,
                detail: er.to_string(),
            }
        }
    }
}

async fn api_key(provider: &ProviderClient) -> CheckResult {
    Ok(if provider.has_api_key() {
        Outcome::new(true, "Configured")
    } else {
        Outcome::new(false, "Missing MAILERLITE_API_KEY env var")
    })
}

async fn landing_page(probe: &SiteProbe) -> CheckResult {
    let status = probe.status(&probe.landing_page_url).await?;
    Ok(Outcome::new(
        status == StatusCode::OK,
        format!("HTTP {}", status.as_u16()),
    ))
}

/// The signup endpoint only accepts POST, so a 405 on GET means it is deployed.
async fn subscribe_function(probe: &SiteProbe) -> CheckResult {
    let status = probe.status(&probe.subscribe_url).await?;
    Ok(if status == StatusCode::METHOD_NOT_ALLOWED {
        Outcome::new(true, "Deployed (405 on GET as expected)")
    } else {
        Outcome::new(false, format!("Unexpected HTTP {}", status.as_u16()))
    })
}

async fn provider_group(provider: &ProviderClient) -> CheckResult {
    if !provider.has_api_key() {
        return Ok(Outcome::new(false, SKIPPED_NO_API_KEY));
    }

    let group = provider.fetch_group().await?;
    let name = group.name.as_deref().unwrap_or("Unknown");
    let active = group.active_count.unwrap_or(0);
    Ok(Outcome::new(true, format!("\"{name}\" ({active} active)")))
}

async fn automation(provider: &ProviderClient) -> CheckResult {
    if !provider.has_api_key() {
        return Ok(Outcome::new(false, SKIPPED_NO_API_KEY));
    }

    let automation = Automation::from_payload(provider.fetch_automation().await?)?;
    Ok(match (automation.is_enabled(), automation.is_broken()) {
        (false, _) => Outcome::new(false, "Disabled"),
        (true, true) => Outcome::new(false, "Enabled but BROKEN"),
        (true, false) => Outcome::new(true, "Enabled and healthy"),
    })
}
