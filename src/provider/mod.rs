//! Client for the mailing-list provider HTTP API.
//!
//! Every call authenticates with the bearer API key from `ProviderConfig` and addresses
//! the fixed group and automation configured there.

pub mod types;

use futures::{stream, Stream, TryStreamExt};
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::{ConfigError, ProviderConfig};
use crate::web::types::ValidEmail;
use types::{Group, NewSubscriber, ProviderMessage, Subscriber, SubscriberPage};

/// Maximum page size the subscriber listing accepts.
pub const PAGE_LIMIT: &str = "1000";

#[derive(Debug)]
pub struct ProviderClient {
    pub http_client: Client,
    pub base_url: Url,
    pub group_id: String,
    pub automation_id: String,
    api_key: Option<SecretString>,
}

impl ProviderClient {
    pub fn new<S: AsRef<str>>(
        base_url: S,
        group_id: String,
        automation_id: String,
        api_key: Option<SecretString>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let base_url = crate::config::parse_base_url(base_url.as_ref())?;
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(ProviderClient {
            http_client,
            base_url,
            group_id,
            automation_id,
            api_key,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.group_id.clone(),
            config.automation_id.clone(),
            config.api_key.clone(),
            config.timeout(),
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .ok_or(Error::MissingApiKey)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::UrlParsing(e.to_string()))
    }

    /// Fetches one page of the group's subscribers, starting at `cursor` when given.
    #[tracing::instrument(name = "provider_subscribers_page", skip(self))]
    pub async fn subscribers_page(&self, cursor: Option<&str>) -> Result<SubscriberPage> {
        let url = self.endpoint(&format!("groups/{}/subscribers", self.group_id))?;

        let mut request = self
            .http_client
            .get(url)
            .bearer_auth(self.api_key()?)
            .query(&[("limit", PAGE_LIMIT)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::SubscribersStatus(status.as_u16()));
        }

        Ok(resp.json().await?)
    }

    /// Lazily walks the subscriber listing one page per item.
    /// The stream ends after the first page without a continuation cursor
    /// and yields the error of the first failing page.
    pub fn subscriber_pages(&self) -> impl Stream<Item = Result<Vec<Subscriber>>> + '_ {
        // State: `Some(cursor)` while there is a page to fetch, `None` once exhausted.
        stream::try_unfold(Some(None::<String>), move |next| async move {
            let Some(cursor) = next else {
                return Ok::<_, Error>(None);
            };
            let page = self.subscribers_page(cursor.as_deref()).await?;
            let next = page.next_cursor().map(|cursor| Some(cursor.to_string()));

            Ok(Some((page.data, next)))
        })
    }

    /// Collects every subscriber of the group. Any failing page fails the whole fetch.
    #[tracing::instrument(name = "provider_fetch_all_subscribers", skip(self))]
    pub async fn fetch_all_subscribers(&self) -> Result<Vec<Subscriber>> {
        let subscribers: Vec<Subscriber> = self.subscriber_pages().try_concat().await?;
        tracing::debug!("fetched {} subscribers", subscribers.len());

        Ok(subscribers)
    }

    /// Returns the raw automation payload as the provider sent it.
    #[tracing::instrument(name = "provider_fetch_automation", skip(self))]
    pub async fn fetch_automation(&self) -> Result<Value> {
        let url = self.endpoint(&format!("automations/{}", self.automation_id))?;

        let resp = self
            .http_client
            .get(url)
            .bearer_auth(self.api_key()?)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::AutomationStatus(status.as_u16()));
        }

        Ok(resp.json().await?)
    }

    #[tracing::instrument(name = "provider_fetch_group", skip(self))]
    pub async fn fetch_group(&self) -> Result<Group> {
        let url = self.endpoint(&format!("groups/{}", self.group_id))?;

        let resp = self
            .http_client
            .get(url)
            .bearer_auth(self.api_key()?)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::GroupStatus(status.as_u16()));
        }

        Ok(Group::from_payload(resp.json().await?)?)
    }

    /// Creates the subscriber in the configured group.
    /// Any 2xx is a success, anything else becomes `Error::Rejected` carrying the provider's status.
    #[tracing::instrument(name = "provider_create_subscriber", skip(self, email))]
    pub async fn create_subscriber(&self, email: &ValidEmail, variant: Option<&str>) -> Result<()> {
        let url = self.endpoint("subscribers")?;
        let body = NewSubscriber::new(email.as_ref(), &self.group_id, variant);

        let resp = self
            .http_client
            .post(url)
            .bearer_auth(self.api_key()?)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let message = resp
            .json::<ProviderMessage>()
            .await
            .unwrap_or_default()
            .message
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| "Signup failed".to_string());
        tracing::warn!("provider rejected the signup with {status}: {message}");

        Err(Error::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing MAILERLITE_API_KEY env var")]
    MissingApiKey,
    #[error("MailerLite API error: {0}")]
    SubscribersStatus(u16),
    #[error("Automation fetch error: {0}")]
    AutomationStatus(u16),
    #[error("HTTP {0}")]
    GroupStatus(u16),
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("url parsing error: {0}")]
    UrlParsing(String),
    #[error("invalid provider config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("malformed provider payload: {0}")]
    Decode(#[from] serde_json::Error),
}
