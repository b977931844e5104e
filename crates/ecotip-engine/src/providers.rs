use std::fmt;

use ecotip_contracts::activity::ActivityLog;
use ecotip_contracts::tips::TipRequest;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::failure::TipFailure;

pub const DEFAULT_API_BASE: &str = "https://api.together.ai/v1";

pub const NO_RESPONSE_FALLBACK: &str = "No response from model.";

/// Bearer credential for the chat endpoint. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// `None` for empty or whitespace-only input.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Something that turns a tip request into the model's raw reply text.
pub trait TipProvider {
    fn name(&self) -> &str;
    fn send(&self, request: &TipRequest) -> Result<String, TipFailure>;
}

pub struct TogetherProvider {
    endpoint: String,
    api_key: Option<ApiKey>,
    http: HttpClient,
}

impl TogetherProvider {
    /// Without a key the provider still names itself, but every send fails
    /// before touching the network.
    pub fn new(api_base: Option<&str>, api_key: Option<ApiKey>) -> Self {
        Self {
            endpoint: chat_completions_endpoint(api_base.unwrap_or(DEFAULT_API_BASE)),
            api_key,
            http: HttpClient::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TipProvider for TogetherProvider {
    fn name(&self) -> &str {
        "together"
    }

    fn send(&self, request: &TipRequest) -> Result<String, TipFailure> {
        let Some(api_key) = &self.api_key else {
            return Err(TipFailure::request("no API key configured"));
        };
        send_tip_request(&self.http, &self.endpoint, request, api_key)
    }
}

pub fn chat_completions_endpoint(api_base: &str) -> String {
    let base = match api_base.trim().trim_end_matches('/') {
        "" => DEFAULT_API_BASE,
        trimmed => trimmed,
    };
    format!("{base}/chat/completions")
}

/// One POST, no retries. Non-2xx, transport and decode errors come back as
/// classified failures; a 2xx without `choices[0].message.content` yields
/// [`NO_RESPONSE_FALLBACK`].
pub fn send_tip_request(
    http: &HttpClient,
    endpoint: &str,
    request: &TipRequest,
    api_key: &ApiKey,
) -> Result<String, TipFailure> {
    let response = http
        .post(endpoint)
        .bearer_auth(api_key.expose())
        .header(CONTENT_TYPE, "application/json")
        .json(&request.payload())
        .send()
        .map_err(|err| TipFailure::transport(&err))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|err| TipFailure::transport(&err))?;
    if !status.is_success() {
        return Err(TipFailure::http(status, &body));
    }
    let parsed: Value = serde_json::from_str(&body)
        .map_err(|err| TipFailure::request(format!("invalid JSON payload ({err})")))?;
    Ok(extract_message_content(&parsed))
}

pub fn extract_message_content(payload: &Value) -> String {
    payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or(NO_RESPONSE_FALLBACK)
        .to_string()
}

/// Offline provider: answers in the requested two-line format with a tip
/// for the largest emission category.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryrunProvider;

impl TipProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn send(&self, request: &TipRequest) -> Result<String, TipFailure> {
        let (tip, score) = dryrun_tip(request.activity());
        Ok(format!("Tip: {tip}\nRelevance score: {score}"))
    }
}

fn dryrun_tip(log: &ActivityLog) -> (&'static str, u8) {
    let top = log
        .breakdown()
        .into_iter()
        .filter(|row| row.co2_kg > 0.0)
        .max_by(|left, right| left.co2_kg.total_cmp(&right.co2_kg));
    match top.map(|row| row.label) {
        Some("Car travel") => (
            "Combine errands into one trip or take public transport for short journeys.",
            85,
        ),
        Some("Meat meals") => (
            "Swap one meat meal for a plant-based dish; beans and lentils cut emissions sharply.",
            90,
        ),
        Some(_) => (
            "Unplug idle chargers and switch to LED bulbs to trim your electricity use.",
            80,
        ),
        None => (
            "Keep it up: walking, plant-based meals and switching off lights all help.",
            50,
        ),
    }
}
