//! # Single Sign-On Ticket Gate
//!
//! Pages behind SSO arrive with a `?ticket=` issued by the CAS server. The
//! ticket is checked once against the CAS 1.0 `validate` endpoint for the
//! service URL the page was requested under.

use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct SsoConfig {
    #[serde(default = "default_cas_url")]
    pub cas_url: String,
    /// Service URL registered for the landing page.
    #[serde(default = "default_service")]
    pub service: String,
    /// Service URL registered for the admin page.
    #[serde(default = "default_admin_service")]
    pub admin_service: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            cas_url: default_cas_url(),
            service: default_service(),
            admin_service: default_admin_service(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_cas_url() -> String {
    "https://authn.hawaii.edu/cas".into()
}
fn default_service() -> String {
    "https://dahi.manoa.hawaii.edu/njs".into()
}
fn default_admin_service() -> String {
    "https://dahi.manoa.hawaii.edu/njs/admin".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// Decides whether an SSO ticket is good for a service.
#[async_trait::async_trait]
pub trait TicketValidator: Send + Sync {
    /// The authenticated user name, or `None` when the ticket is rejected.
    async fn validate(&self, ticket: &str, service: &str) -> Option<String>;
}

/// CAS 1.0 validator: `GET {cas_url}/validate?service=..&ticket=..`.
pub struct CasValidator {
    client: reqwest::Client,
    validate_url: String,
}

impl CasValidator {
    pub fn new(config: &SsoConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            validate_url: format!("{}/validate", config.cas_url.trim_end_matches('/')),
        })
    }
}

#[async_trait::async_trait]
impl TicketValidator for CasValidator {
    async fn validate(&self, ticket: &str, service: &str) -> Option<String> {
        let response = self
            .client
            .get(&self.validate_url)
            .query(&[("service", service), ("ticket", ticket)])
            .send()
            .await;

        let body = match response {
            Ok(resp) => match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Unreadable CAS response for {}: {}", service, e);
                    return None;
                }
            },
            Err(e) => {
                tracing::warn!("CAS validation request failed for {}: {}", service, e);
                return None;
            }
        };

        let user = parse_cas_response(&body);
        if user.is_none() {
            tracing::warn!("CAS rejected ticket for {}", service);
        }
        user
    }
}

/// CAS 1.0 body: `yes\n<user>\n` or `no\n\n`.
pub fn parse_cas_response(body: &str) -> Option<String> {
    let mut lines = body.lines();
    match lines.next().map(str::trim) {
        Some("yes") => Some(lines.next().map(str::trim).unwrap_or_default().to_string()),
        _ => None,
    }
}
