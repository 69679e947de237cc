use std::sync::Arc;

use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::Html,
};
use bscr::{
    SearchQuery,
    db::PgStore,
    pipeline::run_search,
    render,
    scrape::ChromeDriver,
};
use serde::Deserialize;
use tokio::sync::Mutex;

pub struct AppState {
    driver: ChromeDriver,
    store: PgStore,
    /// Held for the whole of a search: one browser session at a time.
    busy: Mutex<()>,
}

impl AppState {
    pub fn new(driver: ChromeDriver, store: PgStore) -> Self {
        Self {
            driver,
            store,
            busy: Mutex::new(()),
        }
    }
}

type Page = (StatusCode, Html<String>);

pub async fn index() -> Html<String> {
    Html(render::search_page())
}

#[derive(Deserialize)]
pub struct SearchForm {
    source: String,
    destination: String,
    date: String,
}

impl SearchForm {
    fn into_query(self) -> Result<SearchQuery, bscr::listing::QueryError> {
        let date = SearchQuery::parse_date(&self.date)?;
        SearchQuery::new(&self.source, &self.destination, date)
    }
}

pub async fn search(State(state): State<Arc<AppState>>, Form(form): Form<SearchForm>) -> Page {
    let query = match form.into_query() {
        Ok(q) => q,
        Err(e) => {
            tracing::info!(target: "server", "rejected search: {e}");
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(render::error_page(None, &e.to_string())));
        }
    };

    let _busy = state.busy.lock().await;
    match run_search(&state.driver, &state.store, query.clone()).await {
        Ok(outcome) => (StatusCode::OK, Html(render::results_page(&outcome))),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Html(render::error_page(Some(&query), e.user_message())),
        ),
    }
}

#[derive(Deserialize)]
pub struct HistoryParams {
    limit: Option<i64>,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(HistoryParams { limit }): Query<HistoryParams>,
) -> Page {
    let limit = limit.unwrap_or(50).clamp(1, 1000);
    match state.store.recent(limit).await {
        Ok(rows) => (StatusCode::OK, Html(render::history_page(&rows))),
        Err(e) => {
            tracing::error!(target: "db", "\x1b[31mloading history failed: {e}\x1b[0m");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::error_page(None, "Could not load saved results from the database.")),
            )
        }
    }
}
