//! Namespace-tolerant XML access.
//!
//! CFDI documents come in two format versions (3.3 and 4.0) whose
//! elements live in different namespaces, plus a long tail of producers
//! that bind no namespace at all. This module parses raw bytes into a
//! small owned element tree and resolves elements through ordered
//! candidate lists, so version handling is data rather than control
//! flow — no call site ever branches on the `Version` attribute.

mod dom;
mod resolve;

pub use dom::{Element, parse_document};
pub use resolve::{
    CFDI_33, CFDI_40, Lookup, PAGOS_10, PAGOS_20, TFD, attr_chain, decimal_attr, resolve,
    resolve_all,
};
