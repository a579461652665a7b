//! Append-only citation ledger.
//!
//! A project's verified facts are an ordered list of [`Citation`]s. Singleton
//! types keep at most one live entry: committing a new one filters out the
//! previous entry of the same type and appends the new one. Multi-instance
//! types (invites, uploads, contracts) simply accumulate.
//!
//! Every commit bumps the ledger version, and the new citation takes the
//! bumped version as its `seq`. Writers may pass the version they read; a
//! stale version is rejected instead of silently overwriting a concurrent
//! edit.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dna::parse_date;
use crate::error::{Error, Result};
use crate::models::{Cardinality, CiteType, Citation, NewCitation, SiteCondition, Trade};

/// `ledger ++ [c]`, after removing earlier entries of `c`'s type when that
/// type is a singleton.
pub fn upsert(entries: &[Citation], citation: Citation) -> Vec<Citation> {
    let mut next: Vec<Citation> = match citation.cite_type.cardinality() {
        Cardinality::Singleton => entries
            .iter()
            .filter(|c| c.cite_type != citation.cite_type)
            .cloned()
            .collect(),
        Cardinality::Multi => entries.to_vec(),
    };
    next.push(citation);
    next
}

/// Result of committing one citation.
#[derive(Debug, Clone)]
pub struct Applied {
    pub citation: Citation,
    /// Ids of live entries the new citation replaced.
    pub superseded: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    project_id: Uuid,
    version: u64,
    entries: Vec<Citation>,
}

impl Ledger {
    pub fn new(project_id: Uuid) -> Self {
        Self {
            project_id,
            version: 0,
            entries: Vec::new(),
        }
    }

    /// Rebuild a ledger from stored live entries, ordered by `seq`.
    pub fn from_entries(project_id: Uuid, version: u64, mut entries: Vec<Citation>) -> Self {
        entries.retain(Citation::is_live);
        entries.sort_by_key(|c| c.seq);
        Self {
            project_id,
            version,
            entries,
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn entries(&self) -> &[Citation] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent live citation of `cite_type`.
    pub fn latest(&self, cite_type: CiteType) -> Option<&Citation> {
        self.entries.iter().rev().find(|c| c.cite_type == cite_type)
    }

    pub fn all_of(&self, cite_type: CiteType) -> impl Iterator<Item = &Citation> {
        self.entries.iter().filter(move |c| c.cite_type == cite_type)
    }

    pub fn contains(&self, cite_type: CiteType) -> bool {
        self.latest(cite_type).is_some()
    }

    pub fn find(&self, id: Uuid) -> Option<&Citation> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn check_version(&self, expected_version: Option<u64>) -> Result<()> {
        match expected_version {
            Some(expected) if expected != self.version => Err(Error::VersionConflict {
                expected,
                actual: self.version,
            }),
            _ => Ok(()),
        }
    }

    pub fn apply(&mut self, expected_version: Option<u64>, new: NewCitation) -> Result<Applied> {
        self.apply_at(expected_version, new, Utc::now())
    }

    pub fn apply_at(
        &mut self,
        expected_version: Option<u64>,
        new: NewCitation,
        now: DateTime<Utc>,
    ) -> Result<Applied> {
        self.check_version(expected_version)?;

        let citation = Citation {
            id: Uuid::new_v4(),
            project_id: self.project_id,
            seq: self.version + 1,
            cite_type: new.cite_type,
            question_key: new.question_key,
            answer: new.answer,
            value: new.value,
            metadata: new.metadata,
            message_id: new.message_id,
            created_at: now,
            superseded_at: None,
        };

        let superseded: Vec<Uuid> = if citation.cite_type.is_singleton() {
            self.all_of(citation.cite_type).map(|c| c.id).collect()
        } else {
            Vec::new()
        };

        self.entries = upsert(&self.entries, citation.clone());
        self.version = citation.seq;

        tracing::debug!(
            project_id = %self.project_id,
            cite_type = citation.cite_type.as_str(),
            seq = citation.seq,
            superseded = superseded.len(),
            "citation applied"
        );

        Ok(Applied {
            citation,
            superseded,
        })
    }
}

/// Check a fact submitted through the generic write path.
///
/// Managed types are refused outright. Types the DNA reads as typed values
/// must carry a value of the right shape.
pub fn validate_fact(new: &NewCitation) -> Result<()> {
    let invalid = |msg: String| Err(Error::InvalidInput(msg));
    let tag = new.cite_type.as_str();

    if new.answer.trim().is_empty() {
        return invalid("citation answer must not be empty".into());
    }
    if new.cite_type.is_managed() {
        return invalid(format!("{tag} is recorded by its own operation"));
    }

    match new.cite_type {
        CiteType::GfaLock => match new.value.as_f64() {
            Some(sqft) if sqft.is_finite() && sqft >= 1.0 => Ok(()),
            _ => invalid(format!("{tag} value must be a positive square-foot area")),
        },
        CiteType::DemolitionPrice => match new.value.as_f64() {
            Some(price) if price.is_finite() && price >= 0.0 => Ok(()),
            _ => invalid(format!("{tag} value must be a non-negative price")),
        },
        CiteType::TradeSelection => match new.value.as_str().and_then(Trade::from_str) {
            Some(_) => Ok(()),
            None => invalid(format!("{tag} value must name a known trade")),
        },
        CiteType::SiteCondition => match new.value.as_str().and_then(SiteCondition::from_str) {
            Some(_) => Ok(()),
            None => invalid(format!("{tag} value must be \"clear\" or \"demolition\"")),
        },
        CiteType::EndDate => match parse_date(Some(&new.value)) {
            Some(_) => Ok(()),
            None => invalid(format!("{tag} value must be a YYYY-MM-DD date")),
        },
        CiteType::Timeline => {
            match (parse_date(new.value.get("start")), parse_date(new.value.get("end"))) {
                (Some(start), Some(end)) if start <= end => Ok(()),
                (Some(_), Some(_)) => invalid(format!("{tag} ends before it starts")),
                _ => invalid(format!("{tag} value must hold start and end dates")),
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Ledger {
        Ledger::new(Uuid::new_v4())
    }

    #[test]
    fn second_project_name_replaces_first() {
        let mut l = ledger();
        l.apply(None, NewCitation::new(CiteType::ProjectName, "Basement", "Basement"))
            .unwrap();
        let applied = l
            .apply(None, NewCitation::new(CiteType::ProjectName, "Kitchen", "Kitchen"))
            .unwrap();

        let names: Vec<_> = l.all_of(CiteType::ProjectName).collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].answer, "Kitchen");
        assert_eq!(applied.superseded.len(), 1);
    }

    #[test]
    fn multi_instance_types_accumulate() {
        let mut l = ledger();
        for email in ["a@example.com", "b@example.com"] {
            l.apply(None, NewCitation::new(CiteType::TeamMemberInvite, email, email))
                .unwrap();
        }
        assert_eq!(l.all_of(CiteType::TeamMemberInvite).count(), 2);
    }

    #[test]
    fn replaced_entry_moves_to_the_end() {
        let mut l = ledger();
        l.apply(None, NewCitation::new(CiteType::ProjectName, "A", "A")).unwrap();
        l.apply(None, NewCitation::new(CiteType::GfaLock, "1500 sq ft", 1500))
            .unwrap();
        l.apply(None, NewCitation::new(CiteType::ProjectName, "B", "B")).unwrap();

        let order: Vec<_> = l.entries().iter().map(|c| c.cite_type).collect();
        assert_eq!(order, vec![CiteType::GfaLock, CiteType::ProjectName]);
    }

    #[test]
    fn seq_is_monotonic_and_tracks_version() {
        let mut l = ledger();
        let mut last = 0;
        for i in 0..5 {
            let a = l
                .apply(None, NewCitation::new(CiteType::Timeline, format!("v{i}"), i))
                .unwrap();
            assert!(a.citation.seq > last);
            last = a.citation.seq;
            assert_eq!(l.version(), a.citation.seq);
        }
        assert_eq!(l.version(), 5);
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn stale_version_is_rejected_without_mutation() {
        let mut l = ledger();
        l.apply(Some(0), NewCitation::new(CiteType::ProjectName, "A", "A"))
            .unwrap();

        let err = l
            .apply(Some(0), NewCitation::new(CiteType::ProjectName, "B", "B"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::VersionConflict {
                expected: 0,
                actual: 1
            }
        ));
        assert_eq!(l.version(), 1);
        assert_eq!(l.latest(CiteType::ProjectName).unwrap().answer, "A");
    }

    #[test]
    fn upsert_keeps_other_types_in_order() {
        let mut l = ledger();
        l.apply(None, NewCitation::new(CiteType::Location, "Toronto", "Toronto"))
            .unwrap();
        l.apply(None, NewCitation::new(CiteType::SitePhoto, "p1.jpg", "p1.jpg"))
            .unwrap();
        let extra = Citation {
            id: Uuid::new_v4(),
            project_id: l.project_id(),
            seq: 99,
            cite_type: CiteType::Location,
            question_key: "location".into(),
            answer: "Ottawa".into(),
            value: "Ottawa".into(),
            metadata: Default::default(),
            message_id: None,
            created_at: Utc::now(),
            superseded_at: None,
        };

        let next = upsert(l.entries(), extra);
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].cite_type, CiteType::SitePhoto);
        assert_eq!(next[1].answer, "Ottawa");
    }

    #[test]
    fn from_entries_drops_superseded_rows() {
        let project_id = Uuid::new_v4();
        let mut l = Ledger::new(project_id);
        l.apply(None, NewCitation::new(CiteType::ProjectName, "A", "A")).unwrap();
        let mut old = l.entries()[0].clone();
        old.superseded_at = Some(Utc::now());
        l.apply(None, NewCitation::new(CiteType::ProjectName, "B", "B")).unwrap();

        let mut rows = l.entries().to_vec();
        rows.insert(0, old);
        let rebuilt = Ledger::from_entries(project_id, 2, rows);
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(rebuilt.latest(CiteType::ProjectName).unwrap().answer, "B");
    }

    #[test]
    fn generic_writes_refuse_managed_types() {
        for t in [CiteType::TemplateLock, CiteType::DnaFinalized, CiteType::SitePhoto] {
            let err = validate_fact(&NewCitation::new(t, "anything", "anything")).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{t:?} should be refused");
        }
    }

    #[test]
    fn typed_facts_need_well_formed_values() {
        let bad = [
            NewCitation::new(CiteType::GfaLock, "-500 sq ft", -500),
            NewCitation::new(CiteType::GfaLock, "big", "big"),
            NewCitation::new(CiteType::DemolitionPrice, "free?", -1.0),
            NewCitation::new(CiteType::TradeSelection, "Roofing", "roofing"),
            NewCitation::new(CiteType::SiteCondition, "Messy", "messy"),
            NewCitation::new(CiteType::EndDate, "soon", "soon"),
            NewCitation::new(
                CiteType::Timeline,
                "backwards",
                serde_json::json!({"start": "2026-03-13", "end": "2026-03-02"}),
            ),
            NewCitation::new(CiteType::Location, "  ", "  "),
        ];
        for new in bad {
            assert!(validate_fact(&new).is_err(), "{new:?} should be rejected");
        }

        let good = [
            NewCitation::new(CiteType::GfaLock, "1500 sq ft", 1500),
            NewCitation::new(CiteType::DemolitionPrice, "$2.75", 2.75),
            NewCitation::new(CiteType::TradeSelection, "Tiling", "tiling"),
            NewCitation::new(CiteType::SiteCondition, "Clear", "clear"),
            NewCitation::new(CiteType::EndDate, "Mar 20", "2026-03-20"),
            NewCitation::new(
                CiteType::Timeline,
                "two weeks",
                serde_json::json!({"start": "2026-03-02", "end": "2026-03-13"}),
            ),
            NewCitation::new(CiteType::TeamSize, "4 people", 4),
        ];
        for new in good {
            validate_fact(&new).unwrap();
        }
    }
}
