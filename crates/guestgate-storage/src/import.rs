//! Roster file parsing.
//!
//! Organizers export guest lists from spreadsheets, so the accepted format
//! is deliberately loose:
//!
//! - one guest per line, blank lines ignored;
//! - `;` is the delimiter if any line contains one, otherwise `,`;
//! - columns are first name, last name, CI (extra columns are ignored);
//! - the first row is a header if any of its cells is `nombre`, `name`,
//!   `apellido`, `ci` or `cedula` (case-insensitive);
//! - rows with a missing field, or whose CI is not 7 or 8 digits after
//!   normalization, are skipped.
//!
//! Parsing is pure; [`crate::roster::Roster::import_csv`] does the
//! deduplication against the database and the chunked insert.

use guestgate_core::Ci;
use std::collections::HashSet;

const HEADER_MARKERS: [&str; 5] = ["nombre", "name", "apellido", "ci", "cedula"];

/// One parsed roster line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub first_name: String,
    pub last_name: String,
    pub ci: Ci,
}

/// Parse roster text into rows, in file order.
///
/// # Examples
///
/// ```
/// use guestgate_storage::import::parse_roster;
///
/// let rows = parse_roster("nombre;apellido;ci\nAna;Pérez;1.234.567-8\n");
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].ci.as_str(), "12345678");
/// ```
#[must_use]
pub fn parse_roster(text: &str) -> Vec<ImportRow> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let Some(first) = lines.first() else {
        return Vec::new();
    };

    let delimiter = if lines.iter().any(|line| line.contains(';')) {
        ';'
    } else {
        ','
    };

    let has_header = first
        .split(delimiter)
        .map(|cell| cell.trim().to_lowercase())
        .any(|cell| HEADER_MARKERS.contains(&cell.as_str()));

    lines
        .iter()
        .skip(usize::from(has_header))
        .filter_map(|line| parse_row(line, delimiter))
        .collect()
}

fn parse_row(line: &str, delimiter: char) -> Option<ImportRow> {
    let mut cells = line.split(delimiter).map(str::trim);
    let first_name = cells.next().filter(|s| !s.is_empty())?;
    let last_name = cells.next().filter(|s| !s.is_empty())?;
    let ci = Ci::parse(cells.next()?).ok()?;

    Some(ImportRow {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        ci,
    })
}

/// Drop rows whose CI is already registered or already seen earlier in the
/// file. The first occurrence wins.
#[must_use]
pub fn dedup_rows(rows: Vec<ImportRow>, existing: &HashSet<String>) -> Vec<ImportRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| !existing.contains(row.ci.as_str()))
        .filter(|row| seen.insert(row.ci.clone()))
        .collect()
}
