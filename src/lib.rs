//! # cfdix
//!
//! CFDI (Mexican SAT e-invoice) extraction library: aggregates invoice
//! documents into per-document tax records, expands payment complements
//! (Pagos 1.0/2.0) into allocation rows, loads delimited status ledgers
//! heuristically, and orchestrates batches with per-item failure
//! isolation.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating
//! point. Both CFDI format versions (3.3 and 4.0) and their namespace
//! conventions are handled by one code path through ordered candidate
//! lists; version strings in the header are informative only.
//!
//! ## Quick Start
//!
//! ```rust
//! use cfdix::aggregate_invoice;
//!
//! let xml = br#"<cfdi:Comprobante xmlns:cfdi="http://www.sat.gob.mx/cfd/4"
//!         Fecha="2024-05-10T09:30:00" SubTotal="100.00" Total="116.00"
//!         Moneda="MXN" TipoDeComprobante="I">
//!   <cfdi:Emisor Rfc="AAA010101AAA" Nombre="Servicios Integrales SA"/>
//!   <cfdi:Conceptos>
//!     <cfdi:Concepto Cantidad="1" ValorUnitario="100.00" Importe="100.00"
//!                    Descripcion="Consultoria">
//!       <cfdi:Impuestos>
//!         <cfdi:Traslados>
//!           <cfdi:Traslado Impuesto="002" Importe="16.00"/>
//!         </cfdi:Traslados>
//!       </cfdi:Impuestos>
//!     </cfdi:Concepto>
//!   </cfdi:Conceptos>
//! </cfdi:Comprobante>"#;
//!
//! let record = aggregate_invoice(xml).unwrap();
//! assert_eq!(record.issuer_rfc, "AAA010101AAA");
//! assert_eq!(record.iva_transferred.to_string(), "16.00");
//! assert_eq!(record.currency, "MXN");
//! ```
//!
//! The batch layer ties it together: [`extract_invoices`] /
//! [`extract_payments`] over uploaded files, [`load_metadata`] for the
//! status ledger, [`apply_statuses`] for the join. Diagnostics come
//! back as data — the caller decides how to show them.

pub mod batch;
pub mod dates;
pub mod error;
pub mod invoice;
pub mod metadata;
pub mod payment;
pub mod xml;

pub use crate::batch::{
    BatchItem, Diagnostic, Extracted, apply_statuses, extract_invoices, extract_payments,
    process_batch, sort_chronologically,
};
pub use crate::error::ExtractError;
pub use crate::invoice::{Concept, InvoiceRecord, TaxClass, TaxEntry, TaxKind, aggregate_invoice};
pub use crate::metadata::{StatusMap, load_metadata};
pub use crate::payment::{PaymentRecord, expand_payment};
