//! Entry queries: period filter, category filter, deterministic sort

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::{Entry, PeriodFilter};

/// Field entries are sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Date,
    Amount,
    Category,
}

impl SortKey {
    /// Total order: primary key, then date, then ID
    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        let primary = match self {
            Self::Date => a.date.cmp(&b.date),
            Self::Amount => a.amount.cmp(&b.amount),
            Self::Category => a.category.cmp(&b.category),
        };
        primary
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => write!(f, "date"),
            Self::Amount => write!(f, "amount"),
            Self::Category => write!(f, "category"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Self::Date),
            "amount" => Ok(Self::Amount),
            "category" => Ok(Self::Category),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

/// Options for listing entries
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    pub period: Option<PeriodFilter>,
    pub category: Option<String>,
    pub sort: SortKey,
    pub ascending: bool,
}

impl EntryQuery {
    /// All entries, newest first
    pub fn new() -> Self {
        Self::default()
    }

    pub fn period(mut self, period: PeriodFilter) -> Self {
        self.period = Some(period);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into().trim().to_string());
        self
    }

    pub fn sort_by(mut self, sort: SortKey, ascending: bool) -> Self {
        self.sort = sort;
        self.ascending = ascending;
        self
    }

    /// Filter and sort a collection
    pub fn apply<'a>(&self, entries: impl IntoIterator<Item = &'a Entry>) -> Vec<Entry> {
        let mut matched: Vec<Entry> = entries
            .into_iter()
            .filter(|e| self.period.map_or(true, |p| p.contains(e.date)))
            .filter(|e| self.category.as_deref().map_or(true, |c| e.category == c))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ord = self.sort.compare(a, b);
            if self.ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        matched
    }
}
