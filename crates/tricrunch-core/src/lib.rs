use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

mod query_spec;

pub use query_spec::{QueryParseError, parse_query_batch, parse_query_line};

pub type PersonId = u64;
pub type TagId = u64;
pub type CityId = u64;
pub type QueryId = u64;

/// Birthdays and window bounds are compared as `month * 100 + day`.
pub type MonthDayKey = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub birthday: Option<NaiveDate>,
    pub city: Option<CityId>,
}

impl Person {
    pub fn birthday_key(&self) -> Option<MonthDayKey> {
        self.birthday.map(month_day_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub struct Interest {
    pub person: PersonId,
    pub tag: TagId,
}

/// One recorded acquaintance row. Direction is kept exactly as it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub struct Knows {
    pub person: PersonId,
    pub friend: PersonId,
}

impl Knows {
    pub fn is_self_loop(&self) -> bool {
        self.person == self.friend
    }
}

pub fn month_day_key(date: NaiveDate) -> MonthDayKey {
    (date.month() * 100 + date.day()) as MonthDayKey
}

/// Parses a `YYYY-MM-DD` date, ignoring a trailing time part separated by
/// `T` or a space.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    let value = value.trim();
    let date_part = value
        .split_once(['T', ' '])
        .map(|(date, _)| date)
        .unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
}

/// Reads the `MM-DD` part of a `YYYY-MM-DD` value as a month/day key without
/// validating the year, so `2015-02-29` maps to `229`. The day is checked
/// against a leap year.
pub fn parse_month_day(value: &str) -> Option<MonthDayKey> {
    let value = value.trim();
    let date_part = value
        .split_once(['T', ' '])
        .map(|(date, _)| date)
        .unwrap_or(value);

    let mut parts = date_part.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || year.len() != 4 || month.len() != 2 || day.len() != 2 {
        return None;
    }
    if ![year, month, day]
        .iter()
        .all(|part| part.bytes().all(|byte| byte.is_ascii_digit()))
    {
        return None;
    }

    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(2000, month, day).map(month_day_key)
}

/// Closed interval of month/day keys. Windows that wrap past the end of the
/// year are not supported; `from > to` simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayWindow {
    pub from: MonthDayKey,
    pub to: MonthDayKey,
}

impl BirthdayWindow {
    pub fn new(from: MonthDayKey, to: MonthDayKey) -> Self {
        Self { from, to }
    }

    pub fn contains(self, key: MonthDayKey) -> bool {
        self.from <= key && key <= self.to
    }

    pub fn is_empty(self) -> bool {
        self.from > self.to
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub id: QueryId,
    /// `a1`: only holders of this tag may take the p1 role, and they are
    /// never scored.
    pub anchor_tag: TagId,
    /// `a2`, `a3`, `a4` in input order.
    pub score_tags: [TagId; 3],
    pub window: BirthdayWindow,
}

impl QuerySpec {
    /// The scoring tags as a set. Repeating a tag in the query does not let a
    /// person score it twice.
    pub fn distinct_score_tags(&self) -> Vec<TagId> {
        let mut tags = self.score_tags.to_vec();
        tags.sort_unstable();
        tags.dedup();
        tags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultRow {
    pub query_id: QueryId,
    pub score: u32,
    pub p1: PersonId,
    pub p2: PersonId,
    pub p3: PersonId,
}
