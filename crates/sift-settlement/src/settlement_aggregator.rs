//! Groups settlement fields into per-label transaction records.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::{ApproverLine, UserDirectory};

pub const CUSTODIAN_FIELD: &str = "Custodian";
pub const APPROVERS_FIELD: &str = "Approvers";

fn amount_regex() -> &'static Regex {
    static AMOUNT: OnceLock<Regex> = OnceLock::new();
    AMOUNT.get_or_init(|| Regex::new(r"[\d,.]+").expect("amount regex"))
}

fn link_status_regex() -> &'static Regex {
    static LINK_STATUS: OnceLock<Regex> = OnceLock::new();
    LINK_STATUS.get_or_init(|| {
        Regex::new(r"<([^<>|]+)\|(blockchain_confirmed|blockchain_observed)>")
            .expect("link status regex")
    })
}

/// Decodes a string that Slack may omit or send as `null`, yielding `""` for both.
pub fn deserialize_null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// One `{title, value}` field of a Slack message attachment.
///
/// Fields posted by other integrations may carry no title or value; both
/// decode as empty strings.
pub struct SettlementField {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub value: String,
}

impl SettlementField {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    BlockchainConfirmed,
    BlockchainObserved,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockchainConfirmed => "blockchain_confirmed",
            Self::BlockchainObserved => "blockchain_observed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "blockchain_confirmed" => Some(Self::BlockchainConfirmed),
            "blockchain_observed" => Some(Self::BlockchainObserved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Aggregated transfers sharing one field title; `links` and `statuses` are parallel.
pub struct SettlementRecord {
    pub title: String,
    pub amount: Option<f64>,
    pub links: Vec<String>,
    pub statuses: Vec<TransferStatus>,
}

impl SettlementRecord {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            amount: parse_title_amount(title),
            links: Vec::new(),
            statuses: Vec::new(),
        }
    }

    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlementSummary {
    pub records: Vec<SettlementRecord>,
    pub approvers: Option<ApproverLine>,
    pub custodian: Option<String>,
}

/// Parses the first numeric run of a field title (`"BTC Withdrawal ($500,000)"` is `500000.0`).
pub fn parse_title_amount(title: &str) -> Option<f64> {
    let matched = amount_regex().find(title)?;
    matched
        .as_str()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

#[derive(Debug, Clone)]
pub struct SettlementAggregator {
    directory: Arc<UserDirectory>,
}

impl SettlementAggregator {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self { directory }
    }

    /// Builds the summary for one settlement message.
    ///
    /// Records keep first-encounter order of their titles; a repeated title
    /// appends its transfers to the existing record. Untitled fields are skipped.
    pub fn aggregate(&self, fields: &[SettlementField]) -> SettlementSummary {
        let mut records: Vec<SettlementRecord> = Vec::new();
        let mut index_by_title: HashMap<&str, usize> = HashMap::new();

        for field in fields
            .iter()
            .filter(|field| {
                !field.title.is_empty()
                    && field.title != CUSTODIAN_FIELD
                    && field.title != APPROVERS_FIELD
            })
        {
            let index = *index_by_title
                .entry(field.title.as_str())
                .or_insert_with(|| {
                    records.push(SettlementRecord::new(&field.title));
                    records.len() - 1
                });
            let record = &mut records[index];
            for captures in link_status_regex().captures_iter(&field.value) {
                let (Some(link), Some(status)) = (
                    captures.get(1),
                    captures.get(2).and_then(|raw| TransferStatus::parse(raw.as_str())),
                ) else {
                    continue;
                };
                record.links.push(link.as_str().to_string());
                record.statuses.push(status);
            }
        }

        let approvers = fields
            .iter()
            .find(|field| field.title == APPROVERS_FIELD)
            .map(|field| self.directory.resolve_mentions(&field.value));
        let custodian = fields
            .iter()
            .find(|field| field.title == CUSTODIAN_FIELD)
            .map(|field| field.value.clone());

        debug!(
            records = records.len(),
            has_approvers = approvers.is_some(),
            "aggregated settlement fields"
        );
        SettlementSummary {
            records,
            approvers,
            custodian,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{
        parse_title_amount, SettlementAggregator, SettlementField, TransferStatus,
    };
    use crate::UserDirectory;

    fn aggregator() -> SettlementAggregator {
        SettlementAggregator::new(Arc::new(UserDirectory::from_entries([(
            "U020LSUKYJF",
            "Albi Mema",
        )])))
    }

    #[test]
    fn unit_parse_title_amount_strips_thousands_separators() {
        assert_eq!(parse_title_amount("BTC Withdrawal ($500,000)"), Some(500_000.0));
        assert_eq!(parse_title_amount("ETH Deposit 1,234.5"), Some(1_234.5));
        assert_eq!(parse_title_amount("USDC Sweep"), None);
        assert_eq!(parse_title_amount("Sweep ..."), None);
    }

    #[test]
    fn functional_aggregate_merges_repeated_titles_in_encounter_order() {
        let fields = vec![
            SettlementField::new("Custodian", "rht"),
            SettlementField::new(
                "BTC Withdrawal ($500,000)",
                "<https://explorer.test/tx/1|blockchain_confirmed>",
            ),
            SettlementField::new(
                "ETH Deposit ($20,000)",
                "<https://explorer.test/tx/9|blockchain_observed>",
            ),
            SettlementField::new(
                "BTC Withdrawal ($500,000)",
                "<https://explorer.test/tx/2|blockchain_confirmed>",
            ),
            SettlementField::new("Approvers", "<@U020LSUKYJF>, <@U999UNKNOWN>"),
        ];
        let summary = aggregator().aggregate(&fields);

        assert_eq!(summary.records.len(), 2);
        let btc = &summary.records[0];
        assert_eq!(btc.title, "BTC Withdrawal ($500,000)");
        assert_eq!(btc.amount, Some(500_000.0));
        assert_eq!(
            btc.links,
            vec![
                "https://explorer.test/tx/1".to_string(),
                "https://explorer.test/tx/2".to_string()
            ]
        );
        assert_eq!(
            btc.statuses,
            vec![
                TransferStatus::BlockchainConfirmed,
                TransferStatus::BlockchainConfirmed
            ]
        );
        assert_eq!(summary.records[1].title, "ETH Deposit ($20,000)");
        assert_eq!(
            summary.approvers.expect("approvers").text,
            "@Albi Mema, <@U999UNKNOWN>"
        );
        assert_eq!(summary.custodian.as_deref(), Some("rht"));
    }

    #[test]
    fn functional_aggregate_extracts_multiple_pairs_from_one_value() {
        let fields = vec![SettlementField::new(
            "SOL Withdrawal",
            "<https://a.test/1|blockchain_observed>,<https://a.test/2|blockchain_confirmed>",
        )];
        let summary = aggregator().aggregate(&fields);
        let record = &summary.records[0];
        assert_eq!(record.amount, None);
        assert_eq!(record.links.len(), 2);
        assert_eq!(
            record.statuses,
            vec![
                TransferStatus::BlockchainObserved,
                TransferStatus::BlockchainConfirmed
            ]
        );
        assert!(summary.approvers.is_none());
        assert!(summary.custodian.is_none());
    }

    #[test]
    fn regression_aggregate_ignores_unknown_status_keywords() {
        let fields = vec![SettlementField::new(
            "LTC Withdrawal ($1,000)",
            "<https://a.test/1|pending> awaiting signer",
        )];
        let summary = aggregator().aggregate(&fields);
        assert_eq!(summary.records.len(), 1);
        assert!(!summary.records[0].has_links());
        assert!(summary.records[0].statuses.is_empty());
    }

    #[test]
    fn unit_settlement_field_deserializes_missing_value_as_empty() {
        let field: SettlementField =
            serde_json::from_str(r#"{"title":"Custodian","short":true}"#).expect("field");
        assert_eq!(field.value, "");
    }

    #[test]
    fn regression_settlement_field_tolerates_missing_or_null_title() {
        let untitled: SettlementField =
            serde_json::from_str(r#"{"value":"no title","short":true}"#).expect("untitled");
        assert_eq!(untitled, SettlementField::new("", "no title"));

        let null_title: SettlementField =
            serde_json::from_str(r#"{"title":null,"value":null}"#).expect("null title");
        assert_eq!(null_title, SettlementField::new("", ""));

        let summary = aggregator().aggregate(&[
            untitled,
            SettlementField::new("SOL Withdrawal", "<https://a.test/1|blockchain_confirmed>"),
        ]);
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].title, "SOL Withdrawal");
    }
}
