//! EOD settlement aggregation for Sift.
//!
//! Consumes the labeled fields of one "Settlement Status" bot message and
//! produces per-label transaction records plus the resolved approver line.

pub mod settlement_aggregator;
pub mod user_directory;

pub use settlement_aggregator::{
    deserialize_null_as_empty, parse_title_amount, SettlementAggregator, SettlementField,
    SettlementRecord, SettlementSummary, TransferStatus, APPROVERS_FIELD, CUSTODIAN_FIELD,
};
pub use user_directory::{ApproverLine, ResolvedMention, UserDirectory};
