//! Delimited-table parsing and serialization.
//!
//! Quote-aware: quoted fields may contain commas and doubled quotes. Blank
//! lines are skipped and rows whose width does not match the header are
//! dropped rather than aborting the job. A parse -> serialize -> parse cycle
//! is value-for-value identity.

use tracing::warn;

/// How duplicate rows arriving from a corrective round are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep duplicates as delivered.
    #[default]
    Keep,
    /// Drop corrective rows equal, field for field, to an existing row.
    Drop,
}

/// Per-category row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeTally {
    pub positive: u32,
    pub negative: u32,
}

/// A parsed table: header row plus data rows in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Parse delimited text. The first non-blank line is the header.
    pub fn parse(text: &str) -> Result<Self, crate::error::PipelineError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header_line = lines.next().ok_or_else(|| {
            crate::error::PipelineError::MalformedOutput("no header row".to_string())
        })?;
        let headers = split_line(header_line);

        let mut rows = Vec::new();
        for line in lines {
            let fields = split_line(line);
            if fields.len() == headers.len() {
                rows.push(fields);
            } else {
                warn!(
                    expected = headers.len(),
                    got = fields.len(),
                    "dropping malformed row"
                );
            }
        }
        Ok(Self { headers, rows })
    }

    /// Serialize under the current header order, quoting only when needed.
    pub fn serialize(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(join_fields(&self.headers));
        for row in &self.rows {
            lines.push(join_fields(row));
        }
        lines.join("\n")
    }

    /// Index of a column by case-insensitive name.
    pub fn column_ci(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
    }

    /// Count rows per category by the `type` column. Rows without a
    /// recognizable negative marker count as positive.
    pub fn tally_types(&self) -> TypeTally {
        let type_col = self.column_ci("type");
        let mut tally = TypeTally::default();
        for row in &self.rows {
            let value = type_col
                .and_then(|i| row.get(i))
                .map(|v| v.to_lowercase())
                .unwrap_or_default();
            if value == "negative" {
                tally.negative += 1;
            } else {
                tally.positive += 1;
            }
        }
        tally
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Append another table's rows, remapped into this table's header order
    /// by case-insensitive column name; absent columns become empty fields.
    /// Returns how many rows were dropped as duplicates.
    pub fn absorb(&mut self, other: DataTable, policy: DuplicatePolicy) -> usize {
        let mapping: Vec<Option<usize>> = self
            .headers
            .iter()
            .map(|h| other.column_ci(h))
            .collect();

        let mut dropped = 0;
        for row in other.rows {
            let mapped: Vec<String> = mapping
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
                })
                .collect();
            if policy == DuplicatePolicy::Drop && self.rows.contains(&mapped) {
                dropped += 1;
                continue;
            }
            self.rows.push(mapped);
        }
        dropped
    }
}

/// Split one line into fields, honoring quoting. Unquoted fields are
/// trimmed; quoted fields keep their content verbatim with `""` unescaped.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' if current.trim().is_empty() => {
                    in_quotes = true;
                    was_quoted = true;
                    current.clear();
                }
                ',' => fields.push(take_field(&mut current, &mut was_quoted)),
                _ => current.push(c),
            }
        }
    }
    fields.push(take_field(&mut current, &mut was_quoted));
    fields
}

fn take_field(current: &mut String, was_quoted: &mut bool) -> String {
    let raw = std::mem::take(current);
    let field = if *was_quoted {
        raw
    } else {
        raw.trim().to_string()
    };
    *was_quoted = false;
    field
}

fn join_fields(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
