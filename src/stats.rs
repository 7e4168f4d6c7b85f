//! Dashboard statistics: subscribers bucketed by experiment variant plus the automation summary.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    provider::{
        self,
        types::{Automation, Subscriber},
        ProviderClient,
    },
    utils,
};

/// Bucket for subscribers without a variant label.
pub const UNKNOWN_VARIANT: &str = "unknown";

// ###################################
// ->   STRUCTS
// ###################################
/// Per-variant counters. `opened`, `clicked` and `sent` count subscribers, not emails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VariantBucket {
    pub count: u64,
    pub opened: u64,
    pub clicked: u64,
    pub sent: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSummary {
    pub count: u64,
    pub percentage: String,
    pub sent: u64,
    pub opened: u64,
    pub clicked: u64,
    pub open_rate: String,
    pub click_rate: String,
}

#[derive(Debug, Serialize)]
pub struct AutomationSummary {
    pub name: String,
    pub enabled: bool,
    pub broken: bool,
    pub stats: Map<String, Value>,
    pub emails_count: u64,
    pub queue_count: u64,
    pub completed_count: u64,
    pub sent: u64,
    pub opens: u64,
    pub clicks: u64,
    #[serde(rename = "openRate")]
    pub open_rate: String,
    #[serde(rename = "clickRate")]
    pub click_rate: String,
}

/// Body of `GET /api/dashboard?action=stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: u64,
    pub variants: BTreeMap<String, VariantSummary>,
    pub automation: AutomationSummary,
    pub fetched_at: String,
}

// ###################################
// ->   IMPLs
// ###################################
impl VariantBucket {
    fn record(&mut self, subscriber: &Subscriber) {
        self.count += 1;
        if subscriber.has_opened() {
            self.opened += 1;
        }
        if subscriber.has_clicked() {
            self.clicked += 1;
        }
        if subscriber.was_sent() {
            self.sent += 1;
        }
    }
}

impl VariantSummary {
    pub fn new(bucket: &VariantBucket, total: u64) -> Self {
        VariantSummary {
            count: bucket.count,
            percentage: percent(bucket.count, total),
            sent: bucket.sent,
            opened: bucket.opened,
            clicked: bucket.clicked,
            open_rate: percent(bucket.opened, bucket.sent),
            click_rate: percent(bucket.clicked, bucket.sent),
        }
    }
}

impl From<Automation> for AutomationSummary {
    fn from(automation: Automation) -> Self {
        let sent = automation.stat("sent_count");
        let opens = automation.stat("open_count");
        let clicks = automation.stat("click_count");

        AutomationSummary {
            name: automation
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            enabled: automation.enabled.unwrap_or(false),
            broken: automation.broken.unwrap_or(false),
            emails_count: automation.emails_count.unwrap_or(0),
            queue_count: automation.stat("queue_count"),
            completed_count: automation.stat("completed_count"),
            sent,
            opens,
            clicks,
            open_rate: percent(opens, sent),
            click_rate: percent(clicks, sent),
            stats: automation.stats.unwrap_or_default(),
        }
    }
}

impl DashboardStats {
    pub fn compose(
        subscribers: &[Subscriber],
        automation: Automation,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let total = subscribers.len() as u64;
        let variants = aggregate(subscribers)
            .iter()
            .map(|(label, bucket)| (label.clone(), VariantSummary::new(bucket, total)))
            .collect();

        DashboardStats {
            total,
            variants,
            automation: automation.into(),
            fetched_at: utils::iso_timestamp(fetched_at),
        }
    }
}

// ###################################
// ->   FUNCTIONS
// ###################################
/// Fetches all subscribers and the automation concurrently and composes the dashboard stats.
/// Fails as a whole if either fetch fails.
#[tracing::instrument(name = "collect_dashboard_stats", skip_all)]
pub async fn collect(client: &ProviderClient) -> provider::Result<DashboardStats> {
    let (subscribers, automation) =
        tokio::try_join!(client.fetch_all_subscribers(), client.fetch_automation())?;
    let automation = Automation::from_payload(automation)?;

    Ok(DashboardStats::compose(&subscribers, automation, Utc::now()))
}

/// Buckets subscribers by variant label in a single pass.
/// Every subscriber lands in exactly one bucket.
pub fn aggregate<'a, I>(subscribers: I) -> HashMap<String, VariantBucket>
where
    I: IntoIterator<Item = &'a Subscriber>,
{
    let mut buckets: HashMap<String, VariantBucket> = HashMap::new();

    for subscriber in subscribers {
        let label = subscriber.variant().unwrap_or(UNKNOWN_VARIANT);
        buckets.entry(label.to_string()).or_default().record(subscriber);
    }

    buckets
}

/// `numerator / denominator * 100` with one decimal, `"0.0"` when the denominator is zero.
pub fn percent(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0.0".to_string();
    }
    one_decimal(numerator as f64 / denominator as f64 * 100.0)
}

/// Rounds half away from zero to one decimal digit.
/// Ties are judged on the shown value times ten, so 0.15 becomes "0.2".
fn one_decimal(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    format!("{rounded:.1}")
}
