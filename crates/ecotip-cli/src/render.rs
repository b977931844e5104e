use ecotip_contracts::activity::{ActivityLog, CategoryEmission, EmissionEstimate};
use ecotip_contracts::tips::EcoTip;
use ecotip_engine::{FailureKind, TipFailure};

const CHART_WIDTH: usize = 30;
const CARD_RULE: &str = "----------------------------------------";

pub(crate) fn metric_line(estimate: &EmissionEstimate) -> String {
    format!("Total CO₂ Emitted (kg): {}", estimate.display_kg())
}

pub(crate) fn tip_card(tip: &EcoTip) -> String {
    let score = match tip.score_value() {
        Some(value) => format!("{value}/100"),
        None if tip.relevance_score().is_empty() => "n/a".to_string(),
        None => tip.relevance_score().to_string(),
    };
    format!(
        "{CARD_RULE}\nAI Eco Tip\n\n{}\n\nRelevance Score: {score}\n{CARD_RULE}",
        tip.tip()
    )
}

pub(crate) fn failure_line(failure: &TipFailure) -> String {
    let hint = match failure.kind {
        FailureKind::Http { status: 401 | 403 } => "check your API key",
        FailureKind::Http { status: 429 } => "rate limited; wait a moment and try /tip again",
        FailureKind::Http { .. } => "the tip service rejected the request",
        FailureKind::Connection => "check your network connection",
        FailureKind::Timeout => "the model took too long to answer; try /tip again",
        FailureKind::Request => "the request could not be completed",
        FailureKind::Parse => "the model reply did not follow the expected format",
    };
    format!(
        "Tip request failed [{}] ({hint}): {}",
        failure.kind, failure.detail
    )
}

pub(crate) fn pro_panel(pro_unlocked: bool, log: &ActivityLog) -> String {
    if !pro_unlocked {
        return "Upgrade to Pro to see advanced analytics! (/unlock)".to_string();
    }
    format!(
        "Pro features unlocked! Advanced analytics enabled.\n{}",
        bar_chart(&log.breakdown())
    )
}

/// Horizontal bars scaled to the largest category.
pub(crate) fn bar_chart(rows: &[CategoryEmission]) -> String {
    let label_width = rows.iter().map(|row| row.label.len()).max().unwrap_or(0);
    let peak = rows.iter().map(|row| row.co2_kg).fold(0.0_f64, f64::max);
    let mut lines = vec![format!("{:<label_width$}   CO₂ (kg)", "Activity")];
    for row in rows {
        let filled = if peak > 0.0 {
            ((row.co2_kg / peak) * CHART_WIDTH as f64).round() as usize
        } else {
            0
        };
        lines.push(format!(
            "{:<label_width$} | {:<CHART_WIDTH$} {:.2}",
            row.label,
            "█".repeat(filled),
            row.co2_kg
        ));
    }
    lines.join("\n")
}
