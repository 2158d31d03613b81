//! Heuristic status-ledger loading.
//!
//! The ledger is an externally produced delimited text file mapping
//! fiscal fingerprints to a lifecycle status (Vigente, Cancelado, …).
//! Nothing about it is reliable — delimiter, header row, and column
//! names all vary by producer — so loading is best-effort inference
//! over named, independently testable heuristics.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ExtractError;

/// Identifier → status, deduplicated, keys trimmed and uppercased.
pub type StatusMap = HashMap<String, String>;

/// Exact (case-insensitive) identifier-column header names.
pub const ID_HEADER_NAMES: &[&str] = &[
    "uuid",
    "folio fiscal",
    "folio_fiscal",
    "foliofiscal",
    "identificador",
    "id",
];

/// Substring fallbacks when no exact identifier header matches.
pub const ID_HEADER_HINTS: &[&str] = &["uuid", "folio"];

/// Substring synonyms locating the status column.
pub const STATUS_HEADER_HINTS: &[&str] = &[
    "estatus",
    "estado",
    "status",
    "situacion",
    "situación",
    "vigencia",
];

/// How many leading lines the delimiter sniff inspects.
pub const DELIMITER_PROBE_LINES: usize = 5;

/// Pipe if it appears anywhere in the probe window, else comma.
pub fn sniff_delimiter(lines: &[&str]) -> char {
    if lines
        .iter()
        .take(DELIMITER_PROBE_LINES)
        .any(|l| l.contains('|'))
    {
        '|'
    } else {
        ','
    }
}

/// A first row counts as a header when any cell contains an alphabetic
/// character.
pub fn looks_like_header(cells: &[String]) -> bool {
    cells
        .iter()
        .any(|c| c.chars().any(|ch| ch.is_alphabetic()))
}

/// Index of the identifier column: exact synonym match first, then the
/// substring fallbacks. Headers must already be lowercased.
pub fn find_identifier_column(headers: &[String]) -> Option<usize> {
    if let Some(i) = headers
        .iter()
        .position(|h| ID_HEADER_NAMES.contains(&h.as_str()))
    {
        return Some(i);
    }
    headers
        .iter()
        .position(|h| ID_HEADER_HINTS.iter().any(|hint| h.contains(hint)))
}

/// Index of the status column, if any. A ledger without one is valid —
/// every status is then the empty string.
pub fn find_status_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| STATUS_HEADER_HINTS.iter().any(|hint| h.contains(hint)))
}

/// Load a raw delimited ledger into a [`StatusMap`].
///
/// Fails only with [`ExtractError::NoIdentifierColumn`]; a missing
/// status column degrades to empty statuses. Duplicate identifiers keep
/// the last occurrence in file order.
pub fn load_metadata(raw_text: &str) -> Result<StatusMap, ExtractError> {
    let lines: Vec<&str> = raw_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let delimiter = sniff_delimiter(&lines);
    debug!(%delimiter, lines = lines.len(), "loading status ledger");

    let rows: Vec<Vec<String>> = lines
        .iter()
        .map(|l| l.split(delimiter).map(|c| c.trim().to_string()).collect())
        .collect();
    let Some(first) = rows.first() else {
        return Err(ExtractError::NoIdentifierColumn("(empty ledger)".into()));
    };

    let (headers, data) = if looks_like_header(first) {
        let headers: Vec<String> = first.iter().map(|h| h.to_lowercase()).collect();
        (headers, &rows[1..])
    } else {
        // synthesized positional names; identifier detection below
        // cannot match them, so headerless input fails there
        let headers = (1..=first.len()).map(|i| format!("col{i}")).collect();
        (headers, &rows[..])
    };

    let id_col = find_identifier_column(&headers)
        .ok_or_else(|| ExtractError::NoIdentifierColumn(headers.join(", ")))?;
    let status_col = find_status_column(&headers);
    if status_col.is_none() {
        debug!("ledger carries no status column; statuses default to empty");
    }

    let mut map = StatusMap::new();
    for row in data {
        let id = row
            .get(id_col)
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_default();
        if id.is_empty() {
            continue;
        }
        let status = status_col
            .and_then(|i| row.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        // insert overwrites: last occurrence wins
        map.insert(id, status);
    }
    Ok(map)
}
