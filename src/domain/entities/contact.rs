use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z\s\-'.]+$").expect("name pattern is a valid regex")
});

/// Body of a contact form POST.
///
/// Missing fields deserialize to empty strings so they are reported as
/// validation errors instead of a JSON payload error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"),
        regex(
            path = *NAME_PATTERN,
            message = "Name can only contain letters, spaces, hyphens, apostrophes, and periods"
        )
    )]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 10, max = 1000, message = "Message must be between 10 and 1000 characters"))]
    pub message: String,
}

impl ContactForm {
    /// Trims every field and lowercases the email address.
    pub fn normalized(self) -> Self {
        ContactForm {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            message: self.message.trim().to_string(),
        }
    }

    pub fn into_insert(self, client: ClientInfo) -> NewContactSubmission {
        NewContactSubmission {
            name: self.name,
            email: self.email,
            message: self.message,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        }
    }
}

const PLUS_TAG_DOMAINS: &[&str] = &[
    "icloud.com", "me.com",
    "hotmail.com", "hotmail.co.uk", "hotmail.fr", "hotmail.de", "hotmail.it",
    "live.com", "live.co.uk", "live.fr", "msn.com", "outlook.com", "outlook.de",
    "outlook.fr", "passport.com",
];

const DASH_TAG_DOMAINS: &[&str] = &[
    "rocketmail.com", "yahoo.ca", "yahoo.co.uk", "yahoo.com", "yahoo.de",
    "yahoo.fr", "yahoo.in", "yahoo.it", "ymail.com",
];

/// Canonical form of a sender address, used for storage and the duplicate
/// lookup.
///
/// Lowercases the whole address. For Gmail it drops dots and `+tag` from the
/// local part and folds `googlemail.com` into `gmail.com`. iCloud and
/// Outlook addresses lose their `+tag`, Yahoo addresses their `-tag`.
pub fn normalize_email(value: &str) -> String {
    let email = value.trim().to_lowercase();
    canonical_mailbox(&email).unwrap_or(email)
}

fn canonical_mailbox(email: &str) -> Option<String> {
    let (local, domain) = email.rsplit_once('@')?;

    let (local, domain) = match domain {
        "gmail.com" | "googlemail.com" => (before_plus(local).replace('.', ""), "gmail.com"),
        d if PLUS_TAG_DOMAINS.contains(&d) => (before_plus(local).to_string(), d),
        d if DASH_TAG_DOMAINS.contains(&d) => match local.rsplit_once('-') {
            Some((base, _)) => (base.to_string(), d),
            None => (local.to_string(), d),
        },
        _ => return None,
    };

    // "+tag@gmail.com" has no mailbox left; keep the lowercased input
    (!local.is_empty()).then(|| format!("{local}@{domain}"))
}

fn before_plus(local: &str) -> &str {
    local.split('+').next().unwrap_or(local)
}

/// Where the request came from, captured by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[display("pending")]
    Pending,
    #[display("sent")]
    Sent,
    #[display("failed")]
    Failed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Sent => "sent",
            ContactStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Display)]
#[display("Unknown contact status: {_0}")]
pub struct ContactStatusError(pub String);

impl std::error::Error for ContactStatusError {}

impl FromStr for ContactStatus {
    type Err = ContactStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContactStatus::Pending),
            "sent" => Ok(ContactStatus::Sent),
            "failed" => Ok(ContactStatus::Failed),
            other => Err(ContactStatusError(other.to_string())),
        }
    }
}

impl TryFrom<String> for ContactStatus {
    type Error = ContactStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the recent-messages block in the stats response.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct ContactStats {
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
    pub pending: i64,
}

/// Outcome written back after the notification email was attempted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryUpdate {
    pub status: ContactStatus,
    pub email_sent_at: Option<DateTime<Utc>>,
}

impl DeliveryUpdate {
    pub fn sent(at: DateTime<Utc>) -> Self {
        DeliveryUpdate { status: ContactStatus::Sent, email_sent_at: Some(at) }
    }

    pub fn failed() -> Self {
        DeliveryUpdate { status: ContactStatus::Failed, email_sent_at: None }
    }

    pub fn email_sent(&self) -> bool {
        self.email_sent_at.is_some()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub submitted_at: DateTime<Utc>,
}

impl From<&ContactSubmission> for SubmittedContact {
    fn from(contact: &ContactSubmission) -> Self {
        SubmittedContact {
            id: contact.id,
            name: contact.name.clone(),
            email: contact.email.clone(),
            submitted_at: contact.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitContactResponse {
    pub success: bool,
    pub message: String,
    pub data: SubmittedContact,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStatsData {
    pub stats: ContactStats,
    pub recent_messages: Vec<ContactSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 { total.saturating_add(limit - 1) / limit } else { 0 };
        Pagination { page, limit, total, pages }
    }

    /// Rows to skip. Saturates so a huge `page` yields an empty page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).max(0).saturating_mul(self.limit)
    }
}

#[derive(Debug, Serialize)]
pub struct ContactListData {
    pub contacts: Vec<ContactSubmission>,
    pub pagination: Pagination,
}

/// Success envelope shared by the read endpoints.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        DataResponse { success: true, data }
    }
}

/// Raw `?page=&limit=` query. Kept as strings so junk falls back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

impl ListQuery {
    pub fn page(&self) -> i64 {
        parse_positive(self.page.as_deref()).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok()).filter(|n| *n > 0)
}
