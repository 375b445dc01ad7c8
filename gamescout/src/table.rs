//! Columnar text-table parser for CLI tool output.
//!
//! Package-manager CLIs print fixed-width tables:
//!
//! ```text
//! Name             Id                Version  Available Source
//! -------------------------------------------------------------
//! Darkest Dungeon  RedHook.Darkest…  1.0      1.1       winget
//! ```
//!
//! Column boundaries are not delimiters but *positions*: the character
//! offset of each header token. [`TableLayout::detect`] recovers those cut
//! points from the header line, and [`TableLayout::rows`] slices every data
//! line at them. Offsets are measured in characters, not bytes, so output
//! containing non-ASCII names slices correctly.
//!
//! # Truncation
//!
//! Long fields are elided with a trailing `…`. A row containing such a
//! field is incomplete; [`RowSlices::is_truncated`] detects it (on *any*
//! column, one uniform rule) and the driving adapter re-queries the CLI
//! for an unelided single-row table, at most once per row.

use thiserror::Error;

/// The character CLI tools use to mark an elided field.
pub const TRUNCATION_MARKER: char = '…';

/// Errors detecting a table's structure.
///
/// These cover the whole parse; individually malformed rows are reported
/// per-row by the driving adapter, not here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The output contained no line with the expected header token.
    #[error("no recognizable header containing \"{marker}\"")]
    NoHeader {
        /// The header token that was searched for.
        marker: String,
    },

    /// The header had fewer columns than this table kind requires.
    #[error("header has {found} columns, expected at least {expected}")]
    TooFewColumns {
        /// Columns found in the header.
        found: usize,
        /// Minimum required.
        expected: usize,
    },
}

/// Cut points recovered from a table's header line.
#[derive(Debug, Clone)]
pub struct TableLayout {
    /// Character offset of each column start, ascending.
    cuts: Vec<usize>,
    /// Index of the first data line (header + separator skipped).
    data_start: usize,
}

impl TableLayout {
    /// Detect the layout of `raw`.
    ///
    /// Scans for the first line containing `header_marker`, records the
    /// character offset of every whitespace-delimited token from the marker
    /// onward, and requires at least `min_columns` of them. Exactly one
    /// separator line after the header is skipped.
    pub fn detect(raw: &str, header_marker: &str, min_columns: usize) -> Result<Self, TableError> {
        for (index, line) in raw.lines().enumerate() {
            let Some(marker_byte) = line.find(header_marker) else {
                continue;
            };

            let marker_offset = line[..marker_byte].chars().count();
            let cuts: Vec<usize> = token_starts(&line[marker_byte..])
                .map(|start| marker_offset + start)
                .collect();

            if cuts.len() < min_columns {
                return Err(TableError::TooFewColumns {
                    found: cuts.len(),
                    expected: min_columns,
                });
            }

            return Ok(Self {
                cuts,
                data_start: index + 2,
            });
        }

        Err(TableError::NoHeader {
            marker: header_marker.to_owned(),
        })
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.cuts.len()
    }

    /// Slice one line into trimmed per-column fields.
    ///
    /// A line shorter than a cut point yields empty fields for the columns
    /// it doesn't reach; no index ever panics.
    pub fn slice_line(&self, line: &str) -> RowSlices {
        let chars: Vec<char> = line.chars().collect();
        let mut fields = Vec::with_capacity(self.cuts.len());

        for (i, &start) in self.cuts.iter().enumerate() {
            let end = self
                .cuts
                .get(i + 1)
                .copied()
                .unwrap_or(chars.len())
                .min(chars.len());
            let start = start.min(chars.len());
            let field: String = chars[start..end].iter().collect();
            fields.push(field.trim().to_owned());
        }

        RowSlices { fields }
    }

    /// Iterate the data rows of `raw`: every non-blank line after the
    /// header and its separator, sliced at the cut points.
    pub fn rows<'a>(&'a self, raw: &'a str) -> impl Iterator<Item = RowSlices> + 'a {
        raw.lines()
            .skip(self.data_start)
            .filter(|line| !line.trim().is_empty())
            .map(|line| self.slice_line(line))
    }

    /// First data row of `raw`, if any. Used on re-query output, which is
    /// expected to be a single-row table.
    pub fn first_row(&self, raw: &str) -> Option<RowSlices> {
        self.rows(raw).next()
    }
}

/// One data line sliced into per-column fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSlices {
    /// Trimmed field per column, in column order.
    pub fields: Vec<String>,
}

impl RowSlices {
    /// Field by column index; empty when the line didn't reach the column.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    /// Whether any field was elided.
    ///
    /// One uniform rule: every column is checked, not just the identifier.
    pub fn is_truncated(&self) -> bool {
        self.fields
            .iter()
            .any(|field| field.ends_with(TRUNCATION_MARKER))
    }

    /// A field with any trailing truncation marker removed.
    pub fn field_trimmed(&self, index: usize) -> &str {
        self.field(index).trim_end_matches(TRUNCATION_MARKER)
    }
}

/// Character offsets where whitespace-delimited tokens start.
fn token_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    let mut in_token = false;
    text.chars().enumerate().filter_map(move |(offset, c)| {
        if c.is_whitespace() {
            in_token = false;
            None
        } else if in_token {
            None
        } else {
            in_token = true;
            Some(offset)
        }
    })
}
