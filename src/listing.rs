use chrono::NaiveDate;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One bus offering scraped from a results page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub operator: String,
    pub departure_time: CompactString,
    pub arrival_time: CompactString,
    pub duration: CompactString,
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub source: String,
    pub destination: String,
    pub date: NaiveDate,
}

/// A persisted row: the listing, the query that produced it and the generated id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredListing {
    pub id: i64,
    pub query: SearchQuery,
    pub listing: Listing,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("origin must not be empty")]
    EmptySource,
    #[error("destination must not be empty")]
    EmptyDestination,
    #[error("invalid travel date {0:?}, expected YYYY-MM-DD")]
    Date(String),
}

impl SearchQuery {
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d";

    pub fn new(source: &str, destination: &str, date: NaiveDate) -> Result<Self, QueryError> {
        let source = source.trim();
        let destination = destination.trim();
        if source.is_empty() {
            return Err(QueryError::EmptySource);
        }
        if destination.is_empty() {
            return Err(QueryError::EmptyDestination);
        }
        Ok(Self {
            source: source.to_owned(),
            destination: destination.to_owned(),
            date,
        })
    }

    pub fn parse_date(s: &str) -> Result<NaiveDate, QueryError> {
        NaiveDate::parse_from_str(s.trim(), Self::DATE_FORMAT)
            .map_err(|_| QueryError::Date(s.to_owned()))
    }
}
