//! Search pipeline: fetch a results page, extract its listings, store them.
//!
//! The stages only share a `Vec<Listing>`, so each one can be driven on its
//! own: the CLI scrapes without storing, tests drive both stages against
//! fixtures.

use crate::{
    db::ListingStore,
    extract::{ExtractError, extract_listings},
    listing::{Listing, SearchQuery},
    scrape::SearchDriver,
};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("browser session failed: {0:#}")]
    Browser(anyhow::Error),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl SearchError {
    /// What a user gets to see; details stay in the log.
    #[allow(clippy::unused_self)]
    pub const fn user_message(&self) -> &'static str {
        "Something went wrong while fetching bus listings. Please try again."
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stored {
    /// Nothing to store.
    Skipped,
    Rows(u64),
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub query: SearchQuery,
    pub listings: Vec<Listing>,
    pub stored: Stored,
}

pub async fn scrape<D>(driver: &D, query: &SearchQuery) -> Result<Vec<Listing>, SearchError>
where
    D: SearchDriver + Sync,
{
    let html = driver.fetch(query).await.map_err(SearchError::Browser)?;
    Ok(extract_listings(&html)?)
}

pub async fn persist<S>(store: &S, query: &SearchQuery, listings: &[Listing]) -> Stored
where
    S: ListingStore + Sync,
{
    if listings.is_empty() {
        return Stored::Skipped;
    }
    match store.store(query, listings).await {
        Ok(n) => Stored::Rows(n),
        Err(e) => {
            tracing::error!(target: "db", "\x1b[31mstoring {} listings failed: {e:#}\x1b[0m", listings.len());
            Stored::Failed(e.to_string())
        }
    }
}

pub async fn run_search<D, S>(
    driver: &D,
    store: &S,
    query: SearchQuery,
) -> Result<SearchOutcome, SearchError>
where
    D: SearchDriver + Sync,
    S: ListingStore + Sync,
{
    let listings = match scrape(driver, &query).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "scrape", "\x1b[31m{} -> {}: {e}\x1b[0m", query.source, query.destination);
            return Err(e);
        }
    };
    let stored = persist(store, &query, &listings).await;

    Ok(SearchOutcome {
        query,
        listings,
        stored,
    })
}
