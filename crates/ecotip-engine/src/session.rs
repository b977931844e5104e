use std::path::Path;

use anyhow::Result;
use ecotip_contracts::activity::ActivityLog;
use ecotip_contracts::events::{EventPayload, EventWriter};
use ecotip_contracts::session::SessionState;
use ecotip_contracts::tips::{build_request_for_model, parse_tip, EcoTip, DEFAULT_TIP_MODEL};
use serde_json::{json, Map, Value};

use crate::failure::{FailureKind, TipFailure};
use crate::providers::TipProvider;

/// Result of one "generate tip" action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipOutcome {
    Success(EcoTip),
    Failure(TipFailure),
}

/// Everything one interactive session owns. Handlers take it by `&mut`.
pub struct EcoSession {
    state: SessionState,
    provider: Box<dyn TipProvider>,
    model: String,
    events: EventWriter,
}

impl EcoSession {
    pub fn new(
        provider: Box<dyn TipProvider>,
        model: Option<String>,
        events: EventWriter,
    ) -> Result<Self> {
        let model = model
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_TIP_MODEL.to_string());
        events.emit(
            "session_started",
            map_object(json!({
                "provider": provider.name(),
                "model": model,
            })),
        )?;
        Ok(Self {
            state: SessionState::new(),
            provider,
            model,
            events,
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: &str) {
        let trimmed = model.trim();
        if !trimmed.is_empty() {
            self.model = trimmed.to_string();
        }
    }

    pub fn session_id(&self) -> &str {
        self.events.session_id()
    }

    /// Where session events are appended; `None` when logging is off.
    pub fn events_path(&self) -> Option<&Path> {
        self.events.path()
    }

    pub fn record_activity(&self, log: &ActivityLog) -> Result<Value> {
        self.events.emit(
            "activity_updated",
            map_object(json!({
                "car_km": log.car_km(),
                "meat_meals": log.meat_meals(),
                "electricity_kwh": log.electricity_kwh(),
                "total_co2_kg": log.estimate().total_co2_kg,
            })),
        )
    }

    /// Build, send, parse. The stored tip is replaced only on success.
    pub fn generate_tip(&mut self, log: &ActivityLog) -> Result<TipOutcome> {
        let request = build_request_for_model(log, &self.model);
        self.events.emit(
            "tip_requested",
            map_object(json!({
                "provider": self.provider.name(),
                "model": request.model(),
                "car_km": log.car_km(),
                "meat_meals": log.meat_meals(),
                "electricity_kwh": log.electricity_kwh(),
            })),
        )?;

        let parsed = self
            .provider
            .send(&request)
            .and_then(|raw| parse_tip(&raw).map_err(TipFailure::from));
        match parsed {
            Ok(tip) => {
                // Stored before logging so a log write error cannot drop it.
                let tip = self.state.record_tip(tip).clone();
                self.events.emit(
                    "tip_received",
                    map_object(json!({
                        "tip": tip.tip(),
                        "relevance_score": tip.relevance_score(),
                    })),
                )?;
                Ok(TipOutcome::Success(tip))
            }
            Err(failure) => {
                let status = match failure.kind {
                    FailureKind::Http { status } => Value::from(status),
                    _ => Value::Null,
                };
                self.events.emit(
                    "tip_failed",
                    map_object(json!({
                        "failure_kind": failure.kind.label(),
                        "status": status,
                        "detail": failure.detail,
                    })),
                )?;
                Ok(TipOutcome::Failure(failure))
            }
        }
    }

    /// Returns true only for the call that unlocked pro.
    pub fn unlock_pro(&mut self) -> Result<bool> {
        let newly_unlocked = self.state.unlock_pro();
        if newly_unlocked {
            self.events.emit("pro_unlocked", EventPayload::new())?;
        }
        Ok(newly_unlocked)
    }

    pub fn finish(&self) -> Result<Value> {
        self.events.emit(
            "session_finished",
            map_object(json!({
                "had_tip": self.state.eco_tip().is_some(),
                "pro_unlocked": self.state.pro_unlocked(),
            })),
        )
    }
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;

    use ecotip_contracts::activity::ActivityLog;
    use ecotip_contracts::events::EventWriter;
    use ecotip_contracts::tips::{TipRequest, DEFAULT_TIP_MODEL};
    use reqwest::StatusCode;
    use serde_json::Value;

    use super::{EcoSession, TipOutcome};
    use crate::failure::{FailureKind, TipFailure};
    use crate::providers::{DryrunProvider, TipProvider};

    /// Replays scripted replies and remembers the models it was asked for.
    struct ScriptedProvider {
        replies: RefCell<VecDeque<Result<String, TipFailure>>>,
        models: RefCell<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, TipFailure>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                models: RefCell::new(Vec::new()),
            }
        }
    }

    impl TipProvider for Rc<ScriptedProvider> {
        fn name(&self) -> &str {
            "scripted"
        }

        fn send(&self, request: &TipRequest) -> Result<String, TipFailure> {
            self.models.borrow_mut().push(request.model().to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TipFailure::request("script exhausted")))
        }
    }

    fn scripted(replies: Vec<Result<String, TipFailure>>) -> Rc<ScriptedProvider> {
        Rc::new(ScriptedProvider::new(replies))
    }

    fn read_event_types(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
        let raw = fs::read_to_string(path)?;
        let mut types = Vec::new();
        for line in raw.lines() {
            let event: Value = serde_json::from_str(line)?;
            types.push(event["type"].as_str().unwrap_or_default().to_string());
        }
        Ok(types)
    }

    #[test]
    fn successful_tip_is_stored_and_logged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("session.jsonl");
        let mut session = EcoSession::new(
            Box::new(DryrunProvider),
            None,
            EventWriter::new(&events_path, "session-1"),
        )?;
        let log = ActivityLog::new(10.0, 2, 5.0)?;
        session.record_activity(&log)?;

        let tip = match session.generate_tip(&log)? {
            TipOutcome::Success(tip) => tip,
            other => anyhow::bail!("expected a tip, got {other:?}"),
        };
        assert_eq!(session.state().eco_tip(), Some(&tip));
        assert_eq!(tip.score_value(), Some(90));

        session.finish()?;
        assert_eq!(
            read_event_types(&events_path)?,
            vec![
                "session_started",
                "activity_updated",
                "tip_requested",
                "tip_received",
                "session_finished"
            ]
        );
        Ok(())
    }

    #[test]
    fn failures_keep_the_previous_tip() -> anyhow::Result<()> {
        let provider = scripted(vec![
            Ok("Tip: Cycle to work.\nRelevance score: 70".to_string()),
            Err(TipFailure::http(StatusCode::TOO_MANY_REQUESTS, "slow down")),
            Ok("Sorry, I cannot help with that.".to_string()),
        ]);
        let mut session = EcoSession::new(
            Box::new(Rc::clone(&provider)),
            None,
            EventWriter::disabled("session-1"),
        )?;
        let log = ActivityLog::new(30.0, 0, 2.0)?;

        assert!(matches!(session.generate_tip(&log)?, TipOutcome::Success(_)));

        let TipOutcome::Failure(http) = session.generate_tip(&log)? else {
            anyhow::bail!("expected http failure");
        };
        assert_eq!(http.kind, FailureKind::Http { status: 429 });
        assert!(http.detail.contains("slow down"));

        let TipOutcome::Failure(parse) = session.generate_tip(&log)? else {
            anyhow::bail!("expected parse failure");
        };
        assert_eq!(parse.kind, FailureKind::Parse);

        let kept = session.state().eco_tip().map(|tip| tip.tip().to_string());
        assert_eq!(kept.as_deref(), Some("Tip: Cycle to work."));
        Ok(())
    }

    /// Replaces the event log with a directory mid-request so the next
    /// append fails.
    struct LogBreakingProvider {
        events_path: PathBuf,
    }

    impl TipProvider for LogBreakingProvider {
        fn name(&self) -> &str {
            "log-breaking"
        }

        fn send(&self, _request: &TipRequest) -> Result<String, TipFailure> {
            fs::remove_file(&self.events_path).map_err(TipFailure::request)?;
            fs::create_dir_all(&self.events_path).map_err(TipFailure::request)?;
            Ok("Tip: Cycle to work.\nRelevance score: 70".to_string())
        }
    }

    #[test]
    fn tip_is_kept_when_the_event_log_cannot_be_written() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("session.jsonl");
        let mut session = EcoSession::new(
            Box::new(LogBreakingProvider {
                events_path: events_path.clone(),
            }),
            None,
            EventWriter::new(&events_path, "session-1"),
        )?;

        assert!(session.generate_tip(&ActivityLog::new(30.0, 0, 0.0)?).is_err());
        let stored = session.state().eco_tip().map(|tip| tip.relevance_score().to_string());
        assert_eq!(stored.as_deref(), Some("70"));
        Ok(())
    }

    #[test]
    fn failed_request_is_logged_with_kind_and_status() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("session.jsonl");
        let provider = scripted(vec![Err(TipFailure::http(
            StatusCode::UNAUTHORIZED,
            "bad key",
        ))]);
        let mut session = EcoSession::new(
            Box::new(provider),
            None,
            EventWriter::new(&events_path, "session-1"),
        )?;
        session.generate_tip(&ActivityLog::default())?;

        let raw = fs::read_to_string(&events_path)?;
        let last: Value = serde_json::from_str(raw.lines().last().unwrap_or("{}"))?;
        assert_eq!(last["type"], "tip_failed");
        assert_eq!(last["failure_kind"], "http");
        assert_eq!(last["status"], 401);
        assert!(session.state().eco_tip().is_none());
        Ok(())
    }

    #[test]
    fn model_override_reaches_the_request() -> anyhow::Result<()> {
        let provider = scripted(vec![
            Ok("Tip: a\nRelevance score: 1".to_string()),
            Ok("Tip: b\nRelevance score: 2".to_string()),
        ]);
        let mut session = EcoSession::new(
            Box::new(Rc::clone(&provider)),
            Some("  ".to_string()),
            EventWriter::disabled("session-1"),
        )?;
        assert_eq!(session.model(), DEFAULT_TIP_MODEL);
        session.generate_tip(&ActivityLog::default())?;
        session.set_model("meta-llama/Llama-3-8b-chat-hf");
        session.generate_tip(&ActivityLog::default())?;
        assert_eq!(
            *provider.models.borrow(),
            vec![DEFAULT_TIP_MODEL, "meta-llama/Llama-3-8b-chat-hf"]
        );
        Ok(())
    }

    #[test]
    fn pro_unlock_is_permanent_for_the_session() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("session.jsonl");
        let mut session = EcoSession::new(
            Box::new(DryrunProvider),
            None,
            EventWriter::new(&events_path, "session-1"),
        )?;
        assert_eq!(session.events_path(), Some(events_path.as_path()));
        assert_eq!(session.session_id(), "session-1");
        assert!(!session.state().pro_unlocked());
        assert!(session.unlock_pro()?);
        for _ in 0..3 {
            assert!(!session.unlock_pro()?);
            session.generate_tip(&ActivityLog::default())?;
            assert!(session.state().pro_unlocked());
        }
        let unlocks = read_event_types(&events_path)?
            .into_iter()
            .filter(|kind| kind == "pro_unlocked")
            .count();
        assert_eq!(unlocks, 1);
        Ok(())
    }
}
