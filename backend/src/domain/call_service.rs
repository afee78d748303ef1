use std::sync::Arc;

use tracing::{error, info};
use url::Url;

use crate::domain::error::{require, require_present, ServiceError, ServiceResult};
use crate::telephony::{CallProvider, TelephonyError};

/// Emergency call trigger and the voice script the callee hears
#[derive(Clone)]
pub struct CallService {
    provider: Arc<dyn CallProvider>,
    public_base_url: Url,
}

impl CallService {
    pub fn new(provider: Arc<dyn CallProvider>, public_base_url: Url) -> Self {
        Self {
            provider,
            public_base_url,
        }
    }

    /// Call `to` and have the provider read `message` through the voice
    /// endpoint. Returns the provider's call id.
    pub async fn make_call(&self, to: &str, message: &str) -> ServiceResult<String> {
        let to = require("to", to)?;
        validate_phone_number(to)?;
        let message = require_present("message", message)?;

        let callback = self.voice_url(message)?;
        info!("Requesting call to {}", to);

        self.provider.place_call(to, &callback).await.map_err(|e| {
            error!("Call to {} failed: {}", to, e);
            match e {
                TelephonyError::NotConfigured => {
                    ServiceError::Upstream("call provider is not configured".into())
                }
                other => ServiceError::Upstream(other.to_string()),
            }
        })
    }

    /// `{public_base_url}/voice?message=...`
    pub fn voice_url(&self, message: &str) -> ServiceResult<Url> {
        let mut url = self.public_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Internal("public base URL cannot carry a path".into()))?
            .pop_if_empty()
            .push("voice");
        url.query_pairs_mut().clear().append_pair("message", message);
        Ok(url)
    }
}

/// E.164: optional leading `+`, then 7 to 15 digits
fn validate_phone_number(number: &str) -> ServiceResult<()> {
    let digits = number.strip_prefix('+').unwrap_or(number);
    if (7..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "'{number}' is not a valid phone number"
        )))
    }
}

/// Voice document read to the callee.
///
/// Each non-empty line becomes one `<Say>`; lines ending in `?` are followed
/// by a two second pause so the listener can take the question in.
pub fn voice_response(message: &str) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#);
    for line in message.lines().map(str::trim).filter(|line| !line.is_empty()) {
        xml.push_str("<Say>");
        xml.push_str(&escape_xml(line));
        xml.push_str("</Say>");
        if line.ends_with('?') {
            xml.push_str(r#"<Pause length="2"/>"#);
        }
    }
    xml.push_str("</Response>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
