//! Typed reading of a project's live ledger.

use chrono::NaiveDate;
use serde_json::Value;

use crate::ledger::Ledger;
use crate::models::{CiteType, Citation, NewCitation, ProjectDna, SiteCondition, Trade};
use crate::rollup::CostSummary;

/// Facts a project must have before its DNA can be finalized.
pub const REQUIRED_FOR_FINALIZE: [CiteType; 3] = [
    CiteType::GfaLock,
    CiteType::TradeSelection,
    CiteType::TemplateLock,
];

pub(crate) fn parse_date(value: Option<&Value>) -> Option<NaiveDate> {
    value
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

impl ProjectDna {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut dna = ProjectDna {
            project_id: ledger.project_id(),
            ledger_version: ledger.version(),
            citation_count: ledger.len(),
            ..Default::default()
        };
        for citation in ledger.entries() {
            dna.absorb(citation);
        }
        dna
    }

    fn absorb(&mut self, c: &Citation) {
        match c.cite_type {
            CiteType::ProjectName => self.name = Some(c.answer.clone()),
            CiteType::Location => self.location = Some(c.answer.clone()),
            CiteType::WorkType => self.work_type = Some(c.answer.clone()),
            CiteType::GfaLock => self.gfa_sqft = c.value_f64(),
            CiteType::TradeSelection => self.trade = c.value_str().and_then(Trade::from_str),
            CiteType::TemplateLock => self.template_net_total = c.value_f64(),
            CiteType::SiteCondition => {
                self.site_condition = c
                    .value_str()
                    .and_then(SiteCondition::from_str)
                    .unwrap_or_default()
            }
            CiteType::DemolitionPrice => self.demolition_unit_price = c.value_f64(),
            CiteType::Timeline => {
                self.start_date = parse_date(c.value.get("start"));
                // END_DATE wins over the timeline's own end when both exist.
                if self.end_date.is_none() {
                    self.end_date = parse_date(c.value.get("end"));
                }
            }
            CiteType::EndDate => self.end_date = parse_date(Some(&c.value)),
            CiteType::TeamMemberInvite => self.team_invites += 1,
            CiteType::BlueprintUpload | CiteType::SitePhoto | CiteType::Contract => {
                self.uploads += 1
            }
            CiteType::DnaFinalized => self.finalized = true,
            CiteType::TeamSize
            | CiteType::ExecutionMode
            | CiteType::VisualVerification
            | CiteType::TeamStructure
            | CiteType::TeamPermissionSet => {}
        }
    }

    pub fn missing_for_finalize(ledger: &Ledger) -> Vec<CiteType> {
        REQUIRED_FOR_FINALIZE
            .into_iter()
            .filter(|t| !ledger.contains(*t))
            .collect()
    }
}

/// DNA_FINALIZED citation. `value` is the pre-tax net total; the typed cost
/// breakdown travels in `metadata.cost`.
pub fn finalize_citation(dna: &ProjectDna, cost: &CostSummary) -> crate::Result<NewCitation> {
    Ok(NewCitation::new(
        CiteType::DnaFinalized,
        format!(
            "{} finalized at ${:.2} before tax",
            dna.name.as_deref().unwrap_or("Project"),
            cost.net_total
        ),
        cost.net_total,
    )
    .question("dna_finalized")
    .meta("cost", serde_json::to_value(cost)?)
    .meta("dna", serde_json::to_value(dna)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn reads_typed_facts_from_citations() {
        let mut l = Ledger::new(Uuid::new_v4());
        l.apply(None, NewCitation::new(CiteType::ProjectName, "Loft", "Loft"))
            .unwrap();
        l.apply(None, NewCitation::new(CiteType::GfaLock, "1507 sq ft", 1507))
            .unwrap();
        l.apply(
            None,
            NewCitation::new(CiteType::TradeSelection, "Flooring", "flooring"),
        )
        .unwrap();
        l.apply(
            None,
            NewCitation::new(CiteType::SiteCondition, "Demolition needed", "demolition"),
        )
        .unwrap();
        l.apply(
            None,
            NewCitation::new(
                CiteType::Timeline,
                "Mar 1 - Mar 20",
                json!({"start": "2026-03-01", "end": "2026-03-20"}),
            ),
        )
        .unwrap();
        l.apply(None, NewCitation::new(CiteType::EndDate, "Mar 25", "2026-03-25"))
            .unwrap();

        let dna = ProjectDna::from_ledger(&l);
        assert_eq!(dna.name.as_deref(), Some("Loft"));
        assert_eq!(dna.gfa_sqft, Some(1507.0));
        assert_eq!(dna.trade, Some(Trade::Flooring));
        assert_eq!(dna.site_condition, SiteCondition::Demolition);
        assert_eq!(dna.start_date, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert_eq!(dna.end_date, NaiveDate::from_ymd_opt(2026, 3, 25));
        assert_eq!(dna.ledger_version, 6);
        assert!(!dna.finalized);
    }

    #[test]
    fn end_date_wins_over_a_later_timeline() {
        let mut l = Ledger::new(Uuid::new_v4());
        l.apply(None, NewCitation::new(CiteType::EndDate, "Apr 30", "2026-04-30"))
            .unwrap();
        l.apply(
            None,
            NewCitation::new(
                CiteType::Timeline,
                "Apr 1 - Apr 10",
                json!({"start": "2026-04-01", "end": "2026-04-10"}),
            ),
        )
        .unwrap();

        let dna = ProjectDna::from_ledger(&l);
        assert_eq!(dna.start_date, NaiveDate::from_ymd_opt(2026, 4, 1));
        assert_eq!(dna.end_date, NaiveDate::from_ymd_opt(2026, 4, 30));
    }

    #[test]
    fn reports_missing_prerequisites() {
        let mut l = Ledger::new(Uuid::new_v4());
        l.apply(None, NewCitation::new(CiteType::GfaLock, "900 sq ft", 900))
            .unwrap();
        assert_eq!(
            ProjectDna::missing_for_finalize(&l),
            vec![CiteType::TradeSelection, CiteType::TemplateLock]
        );
    }
}
