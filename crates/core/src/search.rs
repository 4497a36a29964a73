//! Filtering and summary figures for subscriber lists.
//!
//! Lists are small, so both are a single linear pass over the records.

use serde::{Deserialize, Serialize};

use crate::draft::{KycStatus, SubscriberStatus};
use crate::record::SubscriberRecord;

/// Filter applied by the subscriber list.
///
/// Every populated criterion must match. `text` is matched case-insensitively as a
/// substring of the full name, email, phone or subscriber id. The others must equal the
/// stored value exactly, case included.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriberQuery {
    pub text: Option<String>,
    pub status: Option<SubscriberStatus>,
    pub kyc_status: Option<KycStatus>,
    pub branch: Option<String>,
    pub membership_type: Option<String>,
}

impl SubscriberQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &SubscriberRecord) -> bool {
        let details = &record.details;

        if let Some(needle) = self
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            let needle = needle.to_lowercase();
            let haystacks = [
                details.full_name(),
                details.email.clone(),
                details.phone.clone(),
                record.subscriber_id.to_string(),
            ];
            if !haystacks
                .iter()
                .any(|h| h.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        if self.status.is_some_and(|s| s != details.status) {
            return false;
        }
        if self.kyc_status.is_some_and(|k| k != details.kyc_status) {
            return false;
        }
        // Blank filters are treated as unset, like an empty search box.
        if let Some(branch) = self.branch.as_deref().filter(|b| !b.is_empty()) {
            if branch != details.branch {
                return false;
            }
        }
        if let Some(kind) = self.membership_type.as_deref().filter(|m| !m.is_empty()) {
            if kind != details.membership_type {
                return false;
            }
        }

        true
    }

    /// Records matching this query, in stored order.
    pub fn filter<'a>(&self, records: &'a [SubscriberRecord]) -> Vec<&'a SubscriberRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Headline figures for a set of subscribers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberStats {
    pub total: usize,
    pub active: usize,
    pub pending_kyc: usize,
    pub verified_kyc: usize,
    pub total_contributions: u64,
    /// Mean of the credit scores that are present; `None` when none are.
    pub average_credit_score: Option<f64>,
}

impl SubscriberStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a SubscriberRecord>) -> Self {
        let mut stats = Self::default();
        let mut score_sum = 0u64;
        let mut score_count = 0u64;

        for record in records {
            let details = &record.details;
            stats.total += 1;
            if details.status == SubscriberStatus::Active {
                stats.active += 1;
            }
            match details.kyc_status {
                KycStatus::Pending => stats.pending_kyc += 1,
                KycStatus::Verified => stats.verified_kyc += 1,
                KycStatus::Rejected => {}
            }
            stats.total_contributions = stats
                .total_contributions
                .saturating_add(details.total_contributions);
            if let Some(score) = details.credit_score {
                score_sum += u64::from(score);
                score_count += 1;
            }
        }

        if score_count > 0 {
            stats.average_credit_score = Some(score_sum as f64 / score_count as f64);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::draft::DraftRecord;
    use crate::{NonEmptyText, SubscriberId};
    use chrono::Utc;

    fn record(millis: i64, edit: impl FnOnce(&mut DraftRecord)) -> SubscriberRecord {
        let actor = Actor::new(
            NonEmptyText::new("Test Actor").unwrap(),
            NonEmptyText::new("Agent").unwrap(),
        );
        let mut draft = DraftRecord::new();
        edit(&mut draft);
        let id: SubscriberId = format!("SUB{}", millis).parse().unwrap();
        SubscriberRecord::finalize(id, draft, &actor, Utc::now())
    }

    fn sample() -> Vec<SubscriberRecord> {
        vec![
            record(100, |d| {
                d.first_name = "Anita".into();
                d.last_name = "Desai".into();
                d.email = "anita@example.com".into();
                d.branch = "Bangalore Main".into();
                d.membership_type = "Individual".into();
                d.status = SubscriberStatus::Active;
                d.kyc_status = KycStatus::Verified;
                d.total_contributions = 50_000;
                d.credit_score = Some(780);
            }),
            record(200, |d| {
                d.first_name = "Rahul".into();
                d.last_name = "Mehta".into();
                d.phone = "+919800011122".into();
                d.branch = "Mumbai Central".into();
                d.membership_type = "Corporate".into();
                d.total_contributions = 25_000;
                d.credit_score = Some(640);
            }),
            record(300, |d| {
                d.first_name = "Sneha".into();
                d.last_name = "Iyer".into();
                d.branch = "Bangalore Main".into();
                d.kyc_status = KycStatus::Rejected;
            }),
        ]
    }

    #[test]
    fn empty_query_matches_everything() {
        let records = sample();
        assert_eq!(SubscriberQuery::default().filter(&records).len(), 3);
        assert_eq!(SubscriberQuery::text("   ").filter(&records).len(), 3);
    }

    #[test]
    fn text_matches_name_email_phone_and_id() {
        let records = sample();

        let by_name = SubscriberQuery::text("anita desai").filter(&records);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].details.first_name, "Anita");

        assert_eq!(SubscriberQuery::text("EXAMPLE.COM").filter(&records).len(), 1);
        assert_eq!(SubscriberQuery::text("98000").filter(&records).len(), 1);
        assert_eq!(SubscriberQuery::text("SUB300").filter(&records).len(), 1);
        assert!(SubscriberQuery::text("nobody").filter(&records).is_empty());
    }

    #[test]
    fn criteria_combine() {
        let records = sample();
        let query = SubscriberQuery {
            branch: Some("Bangalore Main".into()),
            kyc_status: Some(KycStatus::Rejected),
            ..SubscriberQuery::default()
        };

        let found = query.filter(&records);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].details.first_name, "Sneha");

        let active_corporate = SubscriberQuery {
            status: Some(SubscriberStatus::Active),
            membership_type: Some("Corporate".into()),
            ..SubscriberQuery::default()
        };
        assert!(active_corporate.filter(&records).is_empty());
    }

    #[test]
    fn branch_and_membership_filters_are_exact() {
        let records = sample();

        let differently_cased = SubscriberQuery {
            branch: Some("bangalore main".into()),
            ..SubscriberQuery::default()
        };
        assert!(differently_cased.filter(&records).is_empty());

        let padded = SubscriberQuery {
            membership_type: Some(" Corporate".into()),
            ..SubscriberQuery::default()
        };
        assert!(padded.filter(&records).is_empty());

        let exact = SubscriberQuery {
            membership_type: Some("Corporate".into()),
            ..SubscriberQuery::default()
        };
        assert_eq!(exact.filter(&records).len(), 1);

        let blank = SubscriberQuery {
            branch: Some(String::new()),
            ..SubscriberQuery::default()
        };
        assert_eq!(blank.filter(&records).len(), 3);
    }

    #[test]
    fn stats_reduce_over_records() {
        let records = sample();
        let stats = SubscriberStats::from_records(&records);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.pending_kyc, 1);
        assert_eq!(stats.verified_kyc, 1);
        assert_eq!(stats.total_contributions, 75_000);
        assert_eq!(stats.average_credit_score, Some(710.0));
    }

    #[test]
    fn stats_of_empty_list() {
        let stats = SubscriberStats::from_records(&Vec::<SubscriberRecord>::new());
        assert_eq!(stats, SubscriberStats::default());
        assert_eq!(stats.average_credit_score, None);
    }
}
