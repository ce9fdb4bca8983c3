use super::super::aggregate::ShiftPerformance;
use super::views::{ShiftHighlight, SuggestedAction, UpsellInsights};
use std::cmp::Ordering;

const RECOMMENDED_ACTIONS: [&str; 4] = [
    "Replicate the best shift's upselling approach (scripts, offers, timing) across other shifts",
    "Set a minimum bundled share target and track it daily",
    "Coach underperforming shifts on upgrading customers from Premium to Bundled",
    "Review days with a high Basic mix to reduce revenue volatility",
];

/// Percent with one decimal, e.g. `0.375` -> `37.5%`.
pub fn percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

/// Highest bundled share first; equal shares fall back to shift name.
pub fn rank_shifts(shifts: &[ShiftPerformance]) -> Vec<&ShiftPerformance> {
    let mut ranked: Vec<&ShiftPerformance> = shifts.iter().collect();
    ranked.sort_by(|left, right| {
        right
            .bundled_share
            .partial_cmp(&left.bundled_share)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.shift.cmp(&right.shift))
    });
    ranked
}

fn highlight(shift: &ShiftPerformance) -> ShiftHighlight {
    ShiftHighlight {
        shift: shift.shift.clone(),
        bundled_share: shift.bundled_share,
        bundled_share_label: percent(shift.bundled_share),
    }
}

pub(crate) fn generate_insights(shifts: &[ShiftPerformance], bundled_target: f64) -> UpsellInsights {
    let ranked = rank_shifts(shifts);
    let ranking: Vec<ShiftHighlight> = ranked.iter().map(|shift| highlight(shift)).collect();
    let recommended_actions = RECOMMENDED_ACTIONS
        .iter()
        .map(|action| action.to_string())
        .collect();

    let (best, worst) = match (ranked.first(), ranked.last()) {
        (Some(best), Some(worst)) if ranked.len() >= 2 => (*best, *worst),
        _ => {
            return UpsellInsights {
                best_shift: None,
                worst_shift: None,
                ranking,
                bundled_target,
                suggested_action: None,
                messages: vec![
                    "Not enough time-of-day categories in the filtered data to compare upselling performance"
                        .to_string(),
                ],
                recommended_actions,
            };
        }
    };

    let mut messages = vec![
        format!(
            "Best upselling shift: {} ({} bundled share)",
            best.shift,
            percent(best.bundled_share)
        ),
        format!(
            "Needs improvement: {} ({} bundled share)",
            worst.shift,
            percent(worst.bundled_share)
        ),
    ];

    let suggested_action = if best.bundled_share == worst.bundled_share {
        messages.push(format!(
            "All shifts sell bundles at the same rate; keep the current approach and track a {} target",
            percent(bundled_target)
        ));
        SuggestedAction::HoldCourse
    } else if worst.bundled_share < bundled_target {
        messages.push(format!(
            "{} is below the {} bundled share target; coach the team on upgrading Premium customers to Bundled",
            worst.shift,
            percent(bundled_target)
        ));
        SuggestedAction::CoachWorstShift
    } else {
        messages.push(format!(
            "Every shift meets the {} target; roll {}'s scripts and offers out to {}",
            percent(bundled_target),
            best.shift,
            worst.shift
        ));
        SuggestedAction::ReplicateBestShift
    };

    UpsellInsights {
        best_shift: Some(highlight(best)),
        worst_shift: Some(highlight(worst)),
        ranking,
        bundled_target,
        suggested_action: Some(suggested_action),
        messages,
        recommended_actions,
    }
}
