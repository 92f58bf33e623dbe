//! Fee and revenue aggregation.
//!
//! Fees may violate `paid_amount <= amount`; overpayments are reported
//! separately and never produce negative outstanding balances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::{collection_rate, percentage, round2};
use crate::types::{DbId, Timestamp};

/// Number of debtors listed in [`FinanceSummary::top_debtors`].
pub const TOP_DEBTORS: usize = 5;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
    Waived,
    Cancelled,
}

impl FeeStatus {
    /// Parse the `fees.status` column. Unknown values are treated as pending.
    pub fn from_db(value: &str) -> Self {
        match value {
            "partial" => FeeStatus::Partial,
            "paid" => FeeStatus::Paid,
            "overdue" => FeeStatus::Overdue,
            "waived" => FeeStatus::Waived,
            "cancelled" => FeeStatus::Cancelled,
            _ => FeeStatus::Pending,
        }
    }

    /// Waived and cancelled fees are not expected to be collected.
    pub fn is_collectible(self) -> bool {
        !matches!(self, FeeStatus::Waived | FeeStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeeRecord {
    pub id: DbId,
    pub school_id: DbId,
    pub student_id: DbId,
    pub student_name: String,
    pub amount: f64,
    pub paid_amount: f64,
    pub status: FeeStatus,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Payment,
    Refund,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub id: DbId,
    pub school_id: DbId,
    pub student_id: Option<DbId>,
    pub amount: f64,
    pub method: String,
    pub kind: TransactionKind,
    pub occurred_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Fee summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeeStatusCounts {
    pub pending: u64,
    pub partial: u64,
    pub paid: u64,
    pub overdue: u64,
    pub waived: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Debtor {
    pub student_id: DbId,
    pub student_name: String,
    pub outstanding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceSummary {
    pub fee_count: u64,
    pub total_expected: f64,
    pub total_collected: f64,
    pub outstanding: f64,
    /// Sum of payments above the fee amount.
    pub overpaid: f64,
    pub collection_rate: f64,
    pub status_counts: FeeStatusCounts,
    pub top_debtors: Vec<Debtor>,
}

impl FinanceSummary {
    pub fn is_empty(&self) -> bool {
        self.fee_count == 0
    }
}

/// Fold fee rows into a [`FinanceSummary`].
pub fn summarize_fees(fees: &[FeeRecord]) -> FinanceSummary {
    let mut counts = FeeStatusCounts::default();
    let mut expected = 0.0;
    let mut collected = 0.0;
    let mut outstanding = 0.0;
    let mut overpaid = 0.0;
    let mut per_student: BTreeMap<DbId, (String, f64)> = BTreeMap::new();

    for fee in fees {
        match fee.status {
            FeeStatus::Pending => counts.pending += 1,
            FeeStatus::Partial => counts.partial += 1,
            FeeStatus::Paid => counts.paid += 1,
            FeeStatus::Overdue => counts.overdue += 1,
            FeeStatus::Waived => counts.waived += 1,
            FeeStatus::Cancelled => counts.cancelled += 1,
        }
        if !fee.status.is_collectible() {
            continue;
        }

        expected += fee.amount;
        collected += fee.paid_amount;
        let owed = (fee.amount - fee.paid_amount).max(0.0);
        outstanding += owed;
        overpaid += (fee.paid_amount - fee.amount).max(0.0);

        if owed > 0.0 {
            per_student
                .entry(fee.student_id)
                .or_insert_with(|| (fee.student_name.clone(), 0.0))
                .1 += owed;
        }
    }

    let mut debtors: Vec<Debtor> = per_student
        .into_iter()
        .map(|(student_id, (student_name, owed))| Debtor {
            student_id,
            student_name,
            outstanding: round2(owed),
        })
        .collect();
    debtors.sort_by(|a, b| {
        b.outstanding
            .total_cmp(&a.outstanding)
            .then(a.student_id.cmp(&b.student_id))
    });
    debtors.truncate(TOP_DEBTORS);

    FinanceSummary {
        fee_count: fees.len() as u64,
        total_expected: expected,
        total_collected: collected,
        outstanding,
        overpaid,
        collection_rate: round2(collection_rate(collected, expected)),
        status_counts: counts,
        top_debtors: debtors,
    }
}

// ---------------------------------------------------------------------------
// Revenue summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    /// `YYYY-MM`.
    pub month: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodTotal {
    pub method: String,
    pub total: f64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueSummary {
    pub payment_count: u64,
    pub gross_payments: f64,
    pub refunds: f64,
    pub net_revenue: f64,
    pub average_payment: f64,
    pub by_month: Vec<MonthTotal>,
    pub by_method: Vec<MethodTotal>,
}

impl RevenueSummary {
    pub fn is_empty(&self) -> bool {
        self.payment_count == 0 && self.refunds == 0.0
    }
}

/// Fold transaction rows into a [`RevenueSummary`]. Months are ascending,
/// methods are ordered by total descending then name.
pub fn summarize_revenue(transactions: &[TransactionRecord]) -> RevenueSummary {
    let mut payment_count = 0u64;
    let mut gross = 0.0;
    let mut refunds = 0.0;
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_method: BTreeMap<String, f64> = BTreeMap::new();

    for tx in transactions {
        let month = tx.occurred_at.format("%Y-%m").to_string();
        let signed = match tx.kind {
            TransactionKind::Payment => {
                payment_count += 1;
                gross += tx.amount;
                *by_method.entry(tx.method.clone()).or_default() += tx.amount;
                tx.amount
            }
            TransactionKind::Refund => {
                refunds += tx.amount;
                -tx.amount
            }
        };
        *by_month.entry(month).or_default() += signed;
    }

    let mut methods: Vec<MethodTotal> = by_method
        .into_iter()
        .map(|(method, total)| MethodTotal {
            share_pct: round2(percentage(total, gross)),
            method,
            total,
        })
        .collect();
    methods.sort_by(|a, b| b.total.total_cmp(&a.total).then(a.method.cmp(&b.method)));

    RevenueSummary {
        payment_count,
        gross_payments: gross,
        refunds,
        net_revenue: gross - refunds,
        average_payment: if payment_count == 0 {
            0.0
        } else {
            round2(gross / payment_count as f64)
        },
        by_month: by_month
            .into_iter()
            .map(|(month, total)| MonthTotal { month, total })
            .collect(),
        by_method: methods,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(month: u32, day: u32) -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2026, month, day, 9, 0, 0).unwrap()
    }

    fn fee(id: DbId, student_id: DbId, amount: f64, paid: f64, status: FeeStatus) -> FeeRecord {
        FeeRecord {
            id,
            school_id: 1,
            student_id,
            student_name: format!("Student {student_id}"),
            amount,
            paid_amount: paid,
            status,
            created_at: ts(1, 10),
        }
    }

    fn tx(amount: f64, method: &str, kind: TransactionKind, month: u32) -> TransactionRecord {
        TransactionRecord {
            id: 1,
            school_id: 1,
            student_id: Some(1),
            amount,
            method: method.to_string(),
            kind,
            occurred_at: ts(month, 3),
        }
    }

    #[test]
    fn half_paid_school_collects_fifty_percent() {
        let fees = vec![
            fee(1, 10, 25_000.0, 25_000.0, FeeStatus::Paid),
            fee(2, 11, 25_000.0, 0.0, FeeStatus::Pending),
        ];
        let summary = summarize_fees(&fees);
        assert_eq!(summary.total_collected, 25_000.0);
        assert_eq!(summary.total_expected, 50_000.0);
        assert_eq!(summary.collection_rate, 50.0);
        assert_eq!(summary.outstanding, 25_000.0);
        assert_eq!(summary.top_debtors.len(), 1);
        assert_eq!(summary.top_debtors[0].student_id, 11);
    }

    #[test]
    fn overpayment_is_tolerated() {
        let fees = vec![fee(1, 10, 100.0, 150.0, FeeStatus::Paid)];
        let summary = summarize_fees(&fees);
        assert_eq!(summary.outstanding, 0.0);
        assert_eq!(summary.overpaid, 50.0);
        assert_eq!(summary.collection_rate, 100.0);
        assert!(summary.top_debtors.is_empty());
    }

    #[test]
    fn zero_amount_fees_do_not_divide_by_zero() {
        let fees = vec![fee(1, 10, 0.0, 0.0, FeeStatus::Pending)];
        let summary = summarize_fees(&fees);
        assert_eq!(summary.collection_rate, 0.0);
        assert!(!summary.is_empty());
    }

    #[test]
    fn waived_and_cancelled_are_counted_but_not_expected() {
        let fees = vec![
            fee(1, 10, 500.0, 0.0, FeeStatus::Waived),
            fee(2, 11, 500.0, 0.0, FeeStatus::Cancelled),
            fee(3, 12, 1_000.0, 250.0, FeeStatus::Partial),
        ];
        let summary = summarize_fees(&fees);
        assert_eq!(summary.total_expected, 1_000.0);
        assert_eq!(summary.status_counts.waived, 1);
        assert_eq!(summary.status_counts.cancelled, 1);
        assert_eq!(summary.status_counts.partial, 1);
        assert_eq!(summary.collection_rate, 25.0);
    }

    #[test]
    fn debtors_are_ranked_and_capped() {
        let fees: Vec<FeeRecord> = (1..=8)
            .map(|i| fee(i, i, 100.0 * i as f64, 0.0, FeeStatus::Overdue))
            .collect();
        let summary = summarize_fees(&fees);
        let ids: Vec<DbId> = summary.top_debtors.iter().map(|d| d.student_id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn debts_accumulate_per_student() {
        let fees = vec![
            fee(1, 10, 100.0, 0.0, FeeStatus::Pending),
            fee(2, 10, 300.0, 100.0, FeeStatus::Partial),
        ];
        let summary = summarize_fees(&fees);
        assert_eq!(summary.top_debtors[0].outstanding, 300.0);
    }

    #[test]
    fn fee_summary_is_deterministic() {
        let fees = vec![
            fee(1, 10, 120.0, 20.0, FeeStatus::Partial),
            fee(2, 11, 120.0, 20.0, FeeStatus::Partial),
        ];
        assert_eq!(summarize_fees(&fees), summarize_fees(&fees));
    }

    #[test]
    fn unknown_fee_status_is_pending() {
        assert_eq!(FeeStatus::from_db("mystery"), FeeStatus::Pending);
        assert_eq!(FeeStatus::from_db("paid"), FeeStatus::Paid);
    }

    #[test]
    fn revenue_groups_by_month_and_method() {
        let txs = vec![
            tx(300.0, "mpesa", TransactionKind::Payment, 1),
            tx(100.0, "cash", TransactionKind::Payment, 1),
            tx(600.0, "mpesa", TransactionKind::Payment, 2),
            tx(50.0, "mpesa", TransactionKind::Refund, 2),
        ];
        let summary = summarize_revenue(&txs);
        assert_eq!(summary.payment_count, 3);
        assert_eq!(summary.gross_payments, 1_000.0);
        assert_eq!(summary.net_revenue, 950.0);
        assert_eq!(summary.by_month.len(), 2);
        assert_eq!(summary.by_month[0].month, "2026-01");
        assert_eq!(summary.by_month[1].total, 550.0);
        assert_eq!(summary.by_method[0].method, "mpesa");
        assert_eq!(summary.by_method[0].share_pct, 90.0);
        assert_eq!(summary.average_payment, 333.33);
    }

    #[test]
    fn empty_revenue() {
        let summary = summarize_revenue(&[]);
        assert!(summary.is_empty());
        assert_eq!(summary.average_payment, 0.0);
    }
}
