//! Batch orchestration.
//!
//! Drives an extractor over a collection of uploaded documents,
//! isolating per-item failures as [`Diagnostic`]s, ordering the
//! resulting table chronologically, and optionally joining in ledger
//! statuses. No item's failure ever aborts the batch, and diagnostics
//! are returned as data, never raised.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dates;
use crate::error::ExtractError;
use crate::invoice::{self, InvoiceRecord};
use crate::metadata::StatusMap;
use crate::payment::{self, PaymentRecord};

/// One uploaded document: display name plus raw bytes.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Advisory message tying a source item to a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the item the message refers to.
    pub source: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Seam between the orchestrator and the two record shapes. Both
/// [`InvoiceRecord`] and [`PaymentRecord`] carry an issue date, a
/// fiscal fingerprint, and a late-bound status.
pub trait Extracted {
    fn issue_date(&self) -> &str;
    fn set_issue_date(&mut self, value: String);
    fn fingerprint(&self) -> &str;
    fn status(&self) -> &str;
    fn set_status(&mut self, value: String);
}

/// Run `extract` over every item, collecting records and per-item
/// diagnostics. A failed or empty item yields a diagnostic and the
/// batch continues. The returned table is sorted chronologically with
/// issue dates re-rendered in [`dates::DISPLAY_FORMAT`].
pub fn process_batch<R, F>(items: &[BatchItem], extract: F) -> (Vec<R>, Vec<Diagnostic>)
where
    R: Extracted,
    F: Fn(&[u8]) -> Result<Vec<R>, ExtractError>,
{
    let mut records: Vec<R> = Vec::new();
    let mut diagnostics = Vec::new();

    for item in items {
        match extract(&item.bytes) {
            Ok(extracted) if extracted.is_empty() => {
                debug!(source = %item.name, "no records extracted");
                diagnostics.push(Diagnostic {
                    source: item.name.clone(),
                    message: "no extractable records found".into(),
                });
            }
            Ok(mut extracted) => records.append(&mut extracted),
            Err(e) => {
                warn!(source = %item.name, error = %e, "item failed; batch continues");
                diagnostics.push(Diagnostic {
                    source: item.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    sort_chronologically(&mut records);
    (records, diagnostics)
}

/// Stable ascending sort by parsed issue date. Unparseable dates sort
/// as the earliest possible value and keep their original text;
/// parseable ones are re-rendered in the fixed display format.
pub fn sort_chronologically<R: Extracted>(records: &mut [R]) {
    records.sort_by_key(|r| {
        dates::parse_issue_date(r.issue_date()).unwrap_or(NaiveDateTime::MIN)
    });
    for record in records.iter_mut() {
        if let Some(dt) = dates::parse_issue_date(record.issue_date()) {
            record.set_issue_date(dates::format_display(dt));
        }
    }
}

/// Join ledger statuses onto a table by fiscal fingerprint. A non-empty
/// ledger status wins; records whose fingerprint is absent from the
/// ledger, or maps to an empty status, keep what they already carry.
pub fn apply_statuses<R: Extracted>(records: &mut [R], statuses: &StatusMap) {
    for record in records.iter_mut() {
        let key = record.fingerprint().trim().to_uppercase();
        if key.is_empty() {
            continue;
        }
        if let Some(status) = statuses.get(&key) {
            if !status.is_empty() {
                record.set_status(status.clone());
            }
        }
    }
}

/// Aggregate a batch of invoice documents: one record per document.
pub fn extract_invoices(items: &[BatchItem]) -> (Vec<InvoiceRecord>, Vec<Diagnostic>) {
    process_batch(items, |bytes| {
        invoice::aggregate_invoice(bytes).map(|record| vec![record])
    })
}

/// Expand a batch of payment complements: zero or more allocations per
/// document. Documents without payment detail surface as diagnostics.
pub fn extract_payments(items: &[BatchItem]) -> (Vec<PaymentRecord>, Vec<Diagnostic>) {
    process_batch(items, payment::expand_payment)
}
