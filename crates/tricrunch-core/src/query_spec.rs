use thiserror::Error;

use crate::{BirthdayWindow, QueryId, QuerySpec, TagId, parse_month_day};

const QUERY_FIELD_COUNT: usize = 7;
const TAG_FIELDS: [&str; 4] = ["a1", "a2", "a3", "a4"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("line {line}: expected 7 '|'-separated fields, found {found}")]
    FieldCount { line: usize, found: usize },
    #[error("line {line}: invalid query id '{value}'")]
    InvalidQueryId { line: usize, value: String },
    #[error("line {line} (query {query_id}): invalid tag {field} '{value}'")]
    InvalidTag {
        line: usize,
        query_id: QueryId,
        field: &'static str,
        value: String,
    },
    #[error("line {line} (query {query_id}): invalid date {field} '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        line: usize,
        query_id: QueryId,
        field: &'static str,
        value: String,
    },
}

impl QueryParseError {
    pub fn line(&self) -> usize {
        match self {
            Self::FieldCount { line, .. }
            | Self::InvalidQueryId { line, .. }
            | Self::InvalidTag { line, .. }
            | Self::InvalidDate { line, .. } => *line,
        }
    }
}

/// Parses one `queryId|a1|a2|a3|a4|d1|d2` line. `line` is 1-based and only
/// used for error reporting.
pub fn parse_query_line(line: usize, raw: &str) -> Result<QuerySpec, QueryParseError> {
    let fields: Vec<&str> = raw.trim().split('|').map(str::trim).collect();
    if fields.len() != QUERY_FIELD_COUNT {
        return Err(QueryParseError::FieldCount {
            line,
            found: fields.len(),
        });
    }

    let query_id: QueryId = fields[0]
        .parse()
        .map_err(|_| QueryParseError::InvalidQueryId {
            line,
            value: fields[0].to_owned(),
        })?;

    let mut tags = [0 as TagId; 4];
    for (slot, (field, value)) in tags.iter_mut().zip(TAG_FIELDS.iter().zip(&fields[1..5])) {
        *slot = value.parse().map_err(|_| QueryParseError::InvalidTag {
            line,
            query_id,
            field: *field,
            value: (*value).to_owned(),
        })?;
    }

    let month_day = |field: &'static str, value: &str| {
        parse_month_day(value).ok_or_else(|| QueryParseError::InvalidDate {
            line,
            query_id,
            field,
            value: value.to_owned(),
        })
    };
    let from = month_day("d1", fields[5])?;
    let to = month_day("d2", fields[6])?;

    Ok(QuerySpec {
        id: query_id,
        anchor_tag: tags[0],
        score_tags: [tags[1], tags[2], tags[3]],
        window: BirthdayWindow::new(from, to),
    })
}

/// Parses a whole query file. Blank lines are skipped; the first malformed
/// line aborts the batch.
pub fn parse_query_batch(text: &str) -> Result<Vec<QuerySpec>, QueryParseError> {
    text.lines()
        .enumerate()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .map(|(index, raw)| parse_query_line(index + 1, raw))
        .collect()
}
