use thiserror::Error;

/// Errors that can occur during extraction or ledger loading.
///
/// Only two conditions are fatal: a document that is not well-formed XML
/// (fatal to that document only), and a status ledger without a
/// recognizable identifier column (fatal to the metadata load only).
/// Every other absence — missing elements, missing attributes, missing
/// tax detail — degrades to a documented default instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The document bytes are not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// The status ledger has no column recognizable as the fiscal
    /// identifier (no exact synonym match, no "uuid"/"folio" substring).
    #[error("metadata ledger has no identifier column (headers: {0})")]
    NoIdentifierColumn(String),
}
