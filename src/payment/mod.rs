//! Payment complement expansion.
//!
//! Consumes one CFDI of the Pagos variant (tipo `P`) and emits one
//! [`PaymentRecord`] per related-document allocation. A payment entry
//! with no allocation detail still emits one record carrying the
//! entry's own total — a payment is never silently dropped. A document
//! without a Pagos complement at all expands to an empty list, which
//! the batch layer reports as a soft warning, not a parse failure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::batch::Extracted;
use crate::dates;
use crate::error::ExtractError;
use crate::invoice::fiscal_stamp_uuid;
use crate::xml::{
    self, CFDI_33, CFDI_40, Lookup, PAGOS_10, PAGOS_20, attr_chain, decimal_attr, resolve,
    resolve_all,
};

/// Historically seen spellings of the paid-amount attribute on a
/// DoctoRelacionado, newest first. Producers renamed and misspelled
/// this field across versions; the whole chain is kept verbatim rather
/// than pruned to the current spelling.
pub const PAID_AMOUNT_ATTRS: &[&str] = &["ImpPagado", "ImpPagad", "ImportePagado", "Importe"];

/// Related-document identifier attributes: `Folio` when the producer
/// wrote one, otherwise the UUID in `IdDocumento`.
pub const RELATED_FOLIO_ATTRS: &[&str] = &["Folio", "IdDocumento"];

const RECEIVER: &[Lookup<'static>] = &[
    Lookup::Path(Some(CFDI_40), &["Receptor"]),
    Lookup::Path(Some(CFDI_33), &["Receptor"]),
    Lookup::Path(None, &["Receptor"]),
];

const PAYMENTS: &[Lookup<'static>] = &[
    Lookup::Descendant(Some(PAGOS_20), "Pagos"),
    Lookup::Descendant(Some(PAGOS_10), "Pagos"),
    Lookup::Descendant(None, "Pagos"),
];

const PAYMENT_ENTRIES: &[Lookup<'static>] = &[
    Lookup::Path(Some(PAGOS_20), &["Pago"]),
    Lookup::Path(Some(PAGOS_10), &["Pago"]),
    Lookup::Descendant(None, "Pago"),
];

const RELATED_DOCS: &[Lookup<'static>] = &[
    Lookup::Path(Some(PAGOS_20), &["DoctoRelacionado"]),
    Lookup::Path(Some(PAGOS_10), &["DoctoRelacionado"]),
    Lookup::Descendant(None, "DoctoRelacionado"),
];

/// One allocation of a payment to a related document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Fiscal fingerprint of the payment document itself.
    pub uuid: String,
    pub receiver_name: String,
    /// Comprobante issue date — the allocation's date of record. The
    /// payment-event date (`FechaPago`) is deliberately not propagated.
    pub issue_date: String,
    /// Spanish month name derived from the issue date.
    pub month: String,
    pub receiver_rfc: String,
    /// The payment document's own folio.
    pub payment_folio: String,
    /// Folio of the document being paid; empty for the implicit
    /// allocation emitted when a payment lists no related documents.
    pub related_folio: String,
    pub amount: Decimal,
    /// Populated by the optional ledger join; empty until then.
    pub status: String,
}

impl Extracted for PaymentRecord {
    fn issue_date(&self) -> &str {
        &self.issue_date
    }

    fn set_issue_date(&mut self, value: String) {
        self.issue_date = value;
    }

    fn fingerprint(&self) -> &str {
        &self.uuid
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn set_status(&mut self, value: String) {
        self.status = value;
    }
}

/// Expand one payment complement into its allocation records.
pub fn expand_payment(bytes: &[u8]) -> Result<Vec<PaymentRecord>, ExtractError> {
    let root = xml::parse_document(bytes)?;

    let issue_date = root.attr("Fecha").to_string();
    let month = dates::month_name(&issue_date).to_string();
    let payment_folio = root.attr("Folio").to_string();
    let uuid = fiscal_stamp_uuid(&root);

    let receiver = resolve(&root, RECEIVER);
    let receiver_rfc = receiver.map(|e| e.attr("Rfc")).unwrap_or("").to_string();
    let receiver_name = receiver.map(|e| e.attr("Nombre")).unwrap_or("").to_string();

    let Some(pagos) = resolve(&root, PAYMENTS) else {
        // no complement: "no payments found", not a parse failure
        return Ok(Vec::new());
    };

    let record = |related_folio: String, amount: Decimal| PaymentRecord {
        uuid: uuid.clone(),
        receiver_name: receiver_name.clone(),
        issue_date: issue_date.clone(),
        month: month.clone(),
        receiver_rfc: receiver_rfc.clone(),
        payment_folio: payment_folio.clone(),
        related_folio,
        amount,
        status: String::new(),
    };

    let mut records = Vec::new();
    for pago in resolve_all(pagos, PAYMENT_ENTRIES) {
        // accepted but not propagated; the record dates from the Comprobante
        let _payment_date = pago.attr("FechaPago");
        let entry_total = decimal_attr(pago, "Monto", Decimal::ZERO);

        let related = resolve_all(pago, RELATED_DOCS);
        if related.is_empty() {
            records.push(record(String::new(), entry_total));
            continue;
        }
        for doc in related {
            let amount = attr_chain(doc, PAID_AMOUNT_ATTRS)
                .trim()
                .parse()
                .unwrap_or(Decimal::ZERO);
            let related_folio = attr_chain(doc, RELATED_FOLIO_ATTRS).to_string();
            records.push(record(related_folio, amount));
        }
    }

    Ok(records)
}
