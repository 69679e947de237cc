mod puppeteer;

use core::fmt::Write;
use std::thread::sleep;

pub use puppeteer::*;

use crate::{config::ScrapeConfig, listing::SearchQuery};

pub const SOURCE_INPUT: &str = "#src";
pub const DESTINATION_INPUT: &str = "#dest";
pub const DATE_INPUT: &str = "#onward_cal";
pub const SEARCH_BUTTON: &str = "#search_btn";

/// Produces the rendered results page for a query.
pub trait SearchDriver {
    fn fetch(&self, query: &SearchQuery) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Drives a real Chrome through the site's search form.
///
/// Every [`fetch`](SearchDriver::fetch) launches a fresh browser on a blocking
/// thread and closes it before returning, whether the search succeeded or not.
#[derive(Clone, Debug)]
pub struct ChromeDriver {
    config: ScrapeConfig,
}

impl ChromeDriver {
    pub const fn new(config: ScrapeConfig) -> Self {
        Self { config }
    }

    fn session(config: &ScrapeConfig, query: &SearchQuery) -> anyhow::Result<String> {
        let browser = puppeteer(
            !config.headed,
            config.proxy.as_deref(),
            config.chrome.clone(),
        )?;
        let tab = first_tab(&browser)?;

        tracing::info!(target: "scrape", "\x1b[33mopening\x1b[0m {} ...", config.url);
        navigate_to(&tab, &config.url)?;

        type_into(&tab, SOURCE_INPUT, &query.source)?;
        sleep(config.input_pause());
        type_into(&tab, DESTINATION_INPUT, &query.destination)?;
        sleep(config.input_pause());

        let mut date = String::new();
        write!(date, "{}", query.date.format(&config.date_format))
            .map_err(|_| anyhow::anyhow!("invalid date format {:?}", config.date_format))?;
        set_value(&tab, DATE_INPUT, &date)?;

        click(&tab, SEARCH_BUTTON)?;
        sleep(config.results_wait());

        scroll_to_bottom(&tab)?;
        sleep(config.scroll_wait());

        let content = tab.get_content()?;
        tracing::info!(target: "scrape", "results page: {} bytes", content.len());
        Ok(content)
    }
}

impl SearchDriver for ChromeDriver {
    async fn fetch(&self, query: &SearchQuery) -> anyhow::Result<String> {
        let config = self.config.clone();
        let query = query.clone();

        tracing::info!(
            target: "scrape",
            "searching {} -> {} on {}",
            query.source,
            query.destination,
            query.date,
        );
        tokio::task::spawn_blocking(move || Self::session(&config, &query)).await?
    }
}
