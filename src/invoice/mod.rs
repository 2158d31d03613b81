//! Invoice aggregation.
//!
//! Consumes one CFDI document (3.3 or 4.0) and produces exactly one
//! [`InvoiceRecord`]: header fields read straight off the Comprobante,
//! the UUID dug out of the fiscal stamp, and line items summed into
//! quantity, amount, and four tax totals. Malformed XML is the only
//! hard failure; every missing optional structure degrades to a
//! documented default.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::batch::Extracted;
use crate::error::ExtractError;
use crate::xml::{
    self, CFDI_33, CFDI_40, Element, Lookup, TFD, attr_chain, decimal_attr, resolve, resolve_all,
};

/// Separator between concatenated line descriptions.
pub const DESCRIPTION_SEPARATOR: &str = " | ";

/// Unit-price attribute names, newest format first: CFDI 4.0 writes
/// `ValorUnitario`, 3.3 wrote `PrecioUnitario`.
pub const UNIT_PRICE_ATTRS: &[&str] = &["ValorUnitario", "PrecioUnitario"];

const STAMP: &[Lookup<'static>] = &[
    Lookup::Descendant(Some(TFD), "TimbreFiscalDigital"),
    Lookup::Descendant(None, "TimbreFiscalDigital"),
];

const ISSUER: &[Lookup<'static>] = &[
    Lookup::Path(Some(CFDI_40), &["Emisor"]),
    Lookup::Path(Some(CFDI_33), &["Emisor"]),
    Lookup::Path(None, &["Emisor"]),
];

const CONCEPTS: &[Lookup<'static>] = &[
    Lookup::Path(Some(CFDI_40), &["Conceptos", "Concepto"]),
    Lookup::Path(Some(CFDI_33), &["Conceptos", "Concepto"]),
    Lookup::Descendant(None, "Concepto"),
];

const CONCEPT_TAXES: &[Lookup<'static>] = &[
    Lookup::Path(Some(CFDI_40), &["Impuestos"]),
    Lookup::Path(Some(CFDI_33), &["Impuestos"]),
    Lookup::Path(None, &["Impuestos"]),
];

const TRANSFERS: &[Lookup<'static>] = &[
    Lookup::Path(Some(CFDI_40), &["Traslados", "Traslado"]),
    Lookup::Path(Some(CFDI_33), &["Traslados", "Traslado"]),
    Lookup::Descendant(None, "Traslado"),
];

const WITHHOLDINGS: &[Lookup<'static>] = &[
    Lookup::Path(Some(CFDI_40), &["Retenciones", "Retencion"]),
    Lookup::Path(Some(CFDI_33), &["Retenciones", "Retencion"]),
    Lookup::Descendant(None, "Retencion"),
];

/// Which bucket a tax entry sits in. SAT tax codes are only meaningful
/// together with their bucket: `002` is IVA under Traslados but IVA
/// retenido under Retenciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxKind {
    /// Traslado — charged to the buyer, added to the total.
    Transfer,
    /// Retención — withheld at source, subtracted from net payment.
    Withholding,
}

/// The four tax totals an invoice aggregates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxClass {
    /// Traslado `002` — IVA trasladado.
    IvaTransferred,
    /// Traslado `003` — IEPS.
    Ieps,
    /// Retención `001` — ISR retenido.
    IsrWithheld,
    /// Retención `002` — IVA retenido.
    IvaWithheld,
}

impl TaxClass {
    /// Classify a tax entry by its two-dimensional key (bucket × code).
    /// Unrecognized codes classify to `None` and are ignored by the
    /// aggregator, keeping it forward-compatible with new codes.
    pub fn from_entry(kind: TaxKind, code: &str) -> Option<Self> {
        match (kind, code) {
            (TaxKind::Transfer, "002") => Some(Self::IvaTransferred),
            (TaxKind::Transfer, "003") => Some(Self::Ieps),
            (TaxKind::Withholding, "001") => Some(Self::IsrWithheld),
            (TaxKind::Withholding, "002") => Some(Self::IvaWithheld),
            _ => None,
        }
    }
}

/// One tax entry on a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxEntry {
    pub kind: TaxKind,
    /// SAT tax code as written (e.g. `002`); read together with `kind`.
    pub code: String,
    pub amount: Decimal,
}

/// One line item (Concepto). Ephemeral — exists only while a document
/// is being aggregated; it is never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub quantity: Decimal,
    /// Unit price with version-aware fallback ([`UNIT_PRICE_ATTRS`]).
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub description: String,
    pub taxes: Vec<TaxEntry>,
}

/// One aggregated record per source document. Field order matches the
/// output table schema handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Fiscal fingerprint stamped by the authority; empty if unstamped.
    pub uuid: String,
    /// Issue date as extracted; normalized to the display format by the
    /// batch orchestrator.
    pub issue_date: String,
    /// TipoDeComprobante (I, E, P, N, T).
    pub kind: String,
    pub issuer_rfc: String,
    pub issuer_name: String,
    /// Non-empty line descriptions joined with [`DESCRIPTION_SEPARATOR`],
    /// in document order.
    pub description: String,
    pub quantity: Decimal,
    pub amount: Decimal,
    pub iva_transferred: Decimal,
    pub isr_withheld: Decimal,
    pub iva_withheld: Decimal,
    /// IEPS (excise) transferred.
    pub ieps: Decimal,
    /// Document-level SubTotal, read from the header, never re-derived.
    pub subtotal: Decimal,
    /// Document-level Total, read from the header, never re-derived.
    pub total: Decimal,
    pub currency: String,
    /// Populated by the optional ledger join; empty until then.
    pub status: String,
}

impl Extracted for InvoiceRecord {
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

/// Aggregate one CFDI document into a single [`InvoiceRecord`].
///
/// A document with no resolvable line items still yields one record —
/// quantity and amount zero, description empty — so every well-formed
/// document produces exactly one row.
pub fn aggregate_invoice(bytes: &[u8]) -> Result<InvoiceRecord, ExtractError> {
    let root = xml::parse_document(bytes)?;

    let issue_date = root.attr("Fecha").to_string();
    let total = decimal_attr(&root, "Total", Decimal::ZERO);
    let subtotal = decimal_attr(&root, "SubTotal", Decimal::ZERO);
    let currency = root.attr_or("Moneda", "MXN").to_string();
    let kind = root.attr("TipoDeComprobante").to_string();
    let uuid = fiscal_stamp_uuid(&root);

    let issuer = resolve(&root, ISSUER);
    let issuer_rfc = issuer.map(|e| e.attr("Rfc")).unwrap_or("").to_string();
    let issuer_name = issuer.map(|e| e.attr("Nombre")).unwrap_or("").to_string();

    let mut quantity = Decimal::ZERO;
    let mut amount = Decimal::ZERO;
    let mut iva_transferred = Decimal::ZERO;
    let mut isr_withheld = Decimal::ZERO;
    let mut iva_withheld = Decimal::ZERO;
    let mut ieps = Decimal::ZERO;
    let mut descriptions: Vec<String> = Vec::new();

    // Zero concepts leaves the sums at zero — the implicit single
    // empty line item.
    for el in resolve_all(&root, CONCEPTS) {
        let concept = read_concept(el);
        quantity += concept.quantity;
        amount += concept.amount;
        if !concept.description.is_empty() {
            descriptions.push(concept.description);
        }
        for tax in &concept.taxes {
            match TaxClass::from_entry(tax.kind, &tax.code) {
                Some(TaxClass::IvaTransferred) => iva_transferred += tax.amount,
                Some(TaxClass::Ieps) => ieps += tax.amount,
                Some(TaxClass::IsrWithheld) => isr_withheld += tax.amount,
                Some(TaxClass::IvaWithheld) => iva_withheld += tax.amount,
                None => {}
            }
        }
    }

    Ok(InvoiceRecord {
        uuid,
        issue_date,
        kind,
        issuer_rfc,
        issuer_name,
        description: descriptions.join(DESCRIPTION_SEPARATOR),
        quantity,
        amount: round2(amount),
        iva_transferred: round2(iva_transferred),
        isr_withheld: round2(isr_withheld),
        iva_withheld: round2(iva_withheld),
        ieps: round2(ieps),
        subtotal,
        total,
        currency,
        status: String::new(),
    })
}

/// Read one Concepto element into an ephemeral [`Concept`].
///
/// Missing Cantidad defaults to 1 (a priced line without an explicit
/// quantity is one unit); missing amounts default to 0.
pub fn read_concept(el: &Element) -> Concept {
    let quantity = decimal_attr(el, "Cantidad", Decimal::ONE);
    let unit_price = attr_chain(el, UNIT_PRICE_ATTRS)
        .trim()
        .parse()
        .unwrap_or(Decimal::ZERO);
    let amount = decimal_attr(el, "Importe", Decimal::ZERO);
    let description = el.attr("Descripcion").to_string();

    let mut taxes = Vec::new();
    if let Some(impuestos) = resolve(el, CONCEPT_TAXES) {
        for t in resolve_all(impuestos, TRANSFERS) {
            taxes.push(tax_entry(TaxKind::Transfer, t));
        }
        for r in resolve_all(impuestos, WITHHOLDINGS) {
            taxes.push(tax_entry(TaxKind::Withholding, r));
        }
    }

    Concept {
        quantity,
        unit_price,
        amount,
        description,
        taxes,
    }
}

/// UUID from the Timbre Fiscal Digital, wherever it is nested; empty
/// string when the document carries no stamp. Never fabricated.
pub(crate) fn fiscal_stamp_uuid(root: &Element) -> String {
    resolve(root, STAMP)
        .map(|e| e.attr("UUID"))
        .unwrap_or("")
        .to_string()
}

fn tax_entry(kind: TaxKind, el: &Element) -> TaxEntry {
    TaxEntry {
        kind,
        code: el.attr("Impuesto").to_string(),
        amount: decimal_attr(el, "Importe", Decimal::ZERO),
    }
}

/// Two-decimal rounding, midpoint away from zero.
fn round2(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
