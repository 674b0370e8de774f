use chrono::{Datelike, NaiveDate};

pub const DEFAULT_QUERY: &str = "SaaS automation pain points";

/// Daily rotation over a fixed list of search queries. The same calendar
/// day always maps to the same query.
#[derive(Debug, Clone)]
pub struct QueryRotation {
    queries: Vec<String>,
}

impl QueryRotation {
    /// Blank entries are dropped.
    pub fn new(queries: impl IntoIterator<Item = String>) -> Self {
        Self {
            queries: queries
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn for_date(&self, date: NaiveDate) -> &str {
        if self.queries.is_empty() {
            return DEFAULT_QUERY;
        }
        let day = date.num_days_from_ce().rem_euclid(self.queries.len() as i32);
        &self.queries[day as usize]
    }
}
