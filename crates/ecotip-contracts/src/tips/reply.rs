use serde::Serialize;
use thiserror::Error;

pub const SCORE_MARKER: &str = "Relevance score:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TipParseError {
    #[error("model reply has no \"Relevance score:\" marker")]
    MissingScoreMarker { raw: String },
}

/// A parsed tip. The relevance score stays as the model wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EcoTip {
    tip: String,
    relevance_score: String,
}

impl EcoTip {
    pub fn tip(&self) -> &str {
        &self.tip
    }

    pub fn relevance_score(&self) -> &str {
        &self.relevance_score
    }

    /// Leading integer of the score when it lies in 0..=100.
    pub fn score_value(&self) -> Option<u8> {
        let digits: String = self
            .relevance_score
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        let value = digits.parse::<u32>().ok()?;
        u8::try_from(value).ok().filter(|score| *score <= 100)
    }
}

/// Splits on the first `Relevance score:` and trims both halves.
pub fn parse_tip(raw: &str) -> Result<EcoTip, TipParseError> {
    let Some((tip, score)) = raw.split_once(SCORE_MARKER) else {
        return Err(TipParseError::MissingScoreMarker {
            raw: raw.to_string(),
        });
    };
    Ok(EcoTip {
        tip: tip.trim().to_string(),
        relevance_score: score.trim().to_string(),
    })
}
