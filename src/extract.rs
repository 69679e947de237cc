//! Listing extraction from a rendered results page.
//!
//! Every listing on the page is a `.bus-item` container holding one element per
//! field. A container missing any field is dropped; a fare that cannot be read
//! as a price fails the whole page.

use std::sync::LazyLock;

use compact_str::CompactString;
use scraper::{ElementRef, Html, Selector, error::SelectorErrorKind};

use crate::{
    listing::Listing,
    price::{PriceError, parse_price},
    util::{inline_text_of, text_of},
};

pub const BUS_ITEM: &str = ".bus-item";
pub const OPERATOR: &str = ".travels";
pub const DEPARTURE: &str = ".dp-time";
pub const ARRIVAL: &str = ".bp-time";
pub const DURATION: &str = ".dur";
pub const FARE: &str = ".fare";

pub struct Selectors {
    pub sel_bus_item: Selector,
    pub sel_operator: Selector,
    pub sel_departure: Selector,
    pub sel_arrival: Selector,
    pub sel_duration: Selector,
    pub sel_fare: Selector,
}

impl Selectors {
    pub fn new() -> Result<Self, SelectorErrorKind<'static>> {
        Ok(Self {
            sel_bus_item: Selector::parse(BUS_ITEM)?,
            sel_operator: Selector::parse(OPERATOR)?,
            sel_departure: Selector::parse(DEPARTURE)?,
            sel_arrival: Selector::parse(ARRIVAL)?,
            sel_duration: Selector::parse(DURATION)?,
            sel_fare: Selector::parse(FARE)?,
        })
    }
}

#[allow(clippy::unwrap_used)]
static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors::new().unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("bad fare for {operator:?}: {source}")]
    Price {
        operator: String,
        #[source]
        source: PriceError,
    },
}

/// The five raw field texts of one `.bus-item`.
struct RawListing {
    operator: String,
    departure_time: String,
    arrival_time: String,
    duration: String,
    fare: String,
}

fn field(item: ElementRef<'_>, sel: &Selector, text: fn(ElementRef<'_>) -> String) -> Option<String> {
    let text = text(item.select(sel).next()?);
    (!text.is_empty()).then_some(text)
}

impl RawListing {
    fn from_element(item: ElementRef<'_>, sels: &Selectors) -> Option<Self> {
        Some(Self {
            operator: field(item, &sels.sel_operator, text_of)?,
            departure_time: field(item, &sels.sel_departure, text_of)?,
            arrival_time: field(item, &sels.sel_arrival, text_of)?,
            duration: field(item, &sels.sel_duration, text_of)?,
            fare: field(item, &sels.sel_fare, inline_text_of)?,
        })
    }

    fn into_listing(self) -> Result<Listing, ExtractError> {
        let price = match parse_price(&self.fare) {
            Ok(p) => p,
            Err(source) => {
                return Err(ExtractError::Price {
                    operator: self.operator,
                    source,
                });
            }
        };
        Ok(Listing {
            operator: self.operator,
            departure_time: CompactString::from(self.departure_time),
            arrival_time: CompactString::from(self.arrival_time),
            duration: CompactString::from(self.duration),
            price,
        })
    }
}

pub fn extract_listings(html: &str) -> Result<Vec<Listing>, ExtractError> {
    let sels = &*SELECTORS;
    let document = Html::parse_document(html);

    let mut listings = Vec::new();
    let mut skipped = 0usize;
    for (idx, item) in document.select(&sels.sel_bus_item).enumerate() {
        let Some(raw) = RawListing::from_element(item, sels) else {
            tracing::debug!(target: "extract", "bus item #{idx} is missing a field, skipped");
            skipped += 1;
            continue;
        };
        listings.push(raw.into_listing()?);
    }

    tracing::info!(target: "extract", "{} listings extracted, {skipped} skipped", listings.len());
    Ok(listings)
}
