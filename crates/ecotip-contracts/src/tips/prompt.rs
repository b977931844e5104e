use serde_json::{json, Value};

use crate::activity::ActivityLog;

pub const DEFAULT_TIP_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";

pub const TIP_PERSONA: &str = "You are a helpful AI giving eco-friendly tips.";

/// One chat-completion request for a single eco tip. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TipRequest {
    model: String,
    persona: &'static str,
    prompt: String,
    activity: ActivityLog,
}

impl TipRequest {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The log the prompt was built from.
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Chat-completions body: system persona first, then the user prompt.
    pub fn payload(&self) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": self.persona},
                {"role": "user", "content": self.prompt},
            ],
        })
    }
}

pub fn build_request(log: &ActivityLog) -> TipRequest {
    build_request_for_model(log, DEFAULT_TIP_MODEL)
}

pub fn build_request_for_model(log: &ActivityLog, model: &str) -> TipRequest {
    let model = match model.trim() {
        "" => DEFAULT_TIP_MODEL.to_string(),
        trimmed => trimmed.to_string(),
    };
    TipRequest {
        model,
        persona: TIP_PERSONA,
        prompt: tip_prompt(log.car_km(), log.meat_meals(), log.electricity_kwh()),
        activity: *log,
    }
}

fn tip_prompt(car_km: f64, meat_meals: u32, electricity_kwh: f64) -> String {
    format!(
        "\nYou are a friendly, concise, and helpful AI named GreenSimplify.\n\
The user did today:\n\
- Car travel: {car_km} km\n\
- Meat meals: {meat_meals}\n\
- Electricity: {electricity_kwh} kWh\n\
\n\
Provide ONE eco-friendly tip most relevant to their activities.\n\
Also provide a relevance score from 0 to 100.\n\
\n\
Format the response like:\n\
Tip: <eco tip here>\n\
Relevance score: <score here>\n"
    )
}
