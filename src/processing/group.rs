//! Bucketing rows by column values.

use std::collections::BTreeMap;

use crate::error::{CsvioError, CsvioResult};
use crate::types::Record;

/// Rows nested by an ordered list of columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Grouped {
    /// Rows sharing every grouping value above this level.
    Rows(Vec<Record>),
    /// Next grouping level, keyed by the text of the column value.
    Nested(BTreeMap<String, Grouped>),
}

impl Grouped {
    /// Follow `keys` down the nesting levels.
    pub fn get(&self, keys: &[&str]) -> Option<&Grouped> {
        match keys.split_first() {
            None => Some(self),
            Some((key, rest)) => match self {
                Grouped::Nested(map) => map.get(*key)?.get(rest),
                Grouped::Rows(_) => None,
            },
        }
    }

    /// The rows at this level, if it is a leaf.
    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            Grouped::Rows(rows) => Some(rows),
            Grouped::Nested(_) => None,
        }
    }
}

/// Collect rows that share the value of `column`, keyed by that value's text.
///
/// Rows keep their relative order inside each bucket. A row without `column` is an error.
pub fn group_by_column(rows: &[Record], column: &str) -> CsvioResult<BTreeMap<String, Vec<Record>>> {
    let mut out: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for row in rows {
        out.entry(key_of(row, column)?).or_default().push(row.clone());
    }
    Ok(out)
}

/// Nest rows by `columns`, outermost first; the last column's buckets hold the rows.
///
/// With no columns, every row ends up in a single [`Grouped::Rows`].
pub fn nest_by_columns(rows: &[Record], columns: &[&str]) -> CsvioResult<Grouped> {
    let Some((first, rest)) = columns.split_first() else {
        return Ok(Grouped::Rows(rows.to_vec()));
    };

    let mut nested = BTreeMap::new();
    for (key, bucket) in group_by_column(rows, first)? {
        let child = if rest.is_empty() {
            Grouped::Rows(bucket)
        } else {
            nest_by_columns(&bucket, rest)?
        };
        nested.insert(key, child);
    }
    Ok(Grouped::Nested(nested))
}

fn key_of(row: &Record, column: &str) -> CsvioResult<String> {
    row.get(column)
        .map(ToString::to_string)
        .ok_or_else(|| CsvioError::MissingColumn {
            column: column.to_owned(),
        })
}
