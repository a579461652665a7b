//! Phase schedule derivation for the Gantt view.
//!
//! The schedule is never stored. It is rebuilt from the project's start and
//! end dates, its site condition and the current template items whenever
//! any of them changes.

use chrono::{Duration, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{Phase, PhaseTask, SiteCondition, TemplateItem};

const DEMOLITION_KEYWORDS: &[&str] = &["demo", "removal", "remove", "tear", "disposal", "haul"];
const PREPARATION_KEYWORDS: &[&str] = &[
    "prep",
    "primer",
    "underlayment",
    "level",
    "membrane",
    "protection",
    "vapor",
    "backer",
    "patch",
    "sand",
];
const FINISHING_KEYWORDS: &[&str] = &[
    "trim", "baseboard", "transition", "grout", "caulk", "seal", "clean", "touch", "finish",
    "tape", "mud",
];

/// Relative share of the timeline each phase receives.
fn weight(phase: Phase) -> i64 {
    match phase {
        Phase::Demolition => 2,
        Phase::Preparation => 2,
        Phase::Installation => 5,
        Phase::Finishing => 2,
    }
}

/// Assign an item to a phase by keywords in its name. Anything unmatched is
/// installation work.
pub fn classify_item(name: &str) -> Phase {
    let name = name.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

    if matches(DEMOLITION_KEYWORDS) {
        Phase::Demolition
    } else if matches(PREPARATION_KEYWORDS) {
        Phase::Preparation
    } else if matches(FINISHING_KEYWORDS) {
        Phase::Finishing
    } else {
        Phase::Installation
    }
}

pub fn derive_schedule(
    start: NaiveDate,
    end: NaiveDate,
    site_condition: SiteCondition,
    items: &[TemplateItem],
) -> Result<Vec<PhaseTask>> {
    if end < start {
        return Err(Error::InvalidInput(format!(
            "end date {} is before start date {}",
            end, start
        )));
    }

    let phases: Vec<Phase> = match site_condition {
        SiteCondition::Demolition => vec![
            Phase::Demolition,
            Phase::Preparation,
            Phase::Installation,
            Phase::Finishing,
        ],
        SiteCondition::Clear => vec![Phase::Preparation, Phase::Installation, Phase::Finishing],
    };

    let total_days = (end - start).num_days() + 1;
    let total_weight: i64 = phases.iter().map(|p| weight(*p)).sum();

    let mut tasks = Vec::with_capacity(phases.len());
    let mut cursor = start;
    let mut allotted = 0;

    for (idx, phase) in phases.iter().enumerate() {
        let last = idx + 1 == phases.len();
        let days = if last {
            (total_days - allotted).max(1)
        } else {
            (total_days * weight(*phase) / total_weight).max(1)
        };
        allotted += days;

        let phase_start = cursor.min(end);
        let phase_end = (phase_start + Duration::days(days - 1)).min(end);
        cursor = phase_end + Duration::days(1);

        let item_ids = items
            .iter()
            .filter(|item| bucket(classify_item(&item.name), site_condition) == *phase)
            .map(|item| item.id)
            .collect();

        tasks.push(PhaseTask {
            phase: *phase,
            name: phase.label().to_string(),
            start: phase_start,
            end: phase_end,
            duration_days: (phase_end - phase_start).num_days() + 1,
            item_ids,
        });
    }

    Ok(tasks)
}

/// Demolition items on a clear site are folded into preparation.
fn bucket(phase: Phase, site_condition: SiteCondition) -> Phase {
    match (phase, site_condition) {
        (Phase::Demolition, SiteCondition::Clear) => Phase::Preparation,
        (phase, _) => phase,
    }
}
