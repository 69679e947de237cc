//! HTML pages for the web UI and a plain-text table for the terminal.

use crate::{
    listing::{Listing, SearchQuery, StoredListing},
    pipeline::{SearchOutcome, Stored},
    util::html_escape,
};

const STYLE: &str = "body{font-family:sans-serif;margin:2em auto;max-width:60em}\
form{display:flex;gap:.5em;flex-wrap:wrap;align-items:end}\
label{display:flex;flex-direction:column;font-size:.85em}\
input{padding:4px;border:1px solid #ccc}\
table{border-collapse:collapse;margin-top:1em;width:100%}\
th,td{border:1px solid #ccc;padding:4px 8px;text-align:left}\
td.num{text-align:right}\
.error{color:#b00020}.note{color:#555}";

const COLUMNS: [&str; 5] = ["Bus Name", "Departure", "Arrival", "Duration", "Price"];

pub fn count_message(n: usize) -> String {
    match n {
        0 => "No buses found".to_owned(),
        1 => "Found 1 bus".to_owned(),
        n => format!("Found {n} buses"),
    }
}

#[inline]
pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>Bus Search</h1>\n{body}</body>\n</html>\n",
        html_escape(title),
    )
}

fn form(prefill: Option<&SearchQuery>) -> String {
    let (source, destination, date) = prefill.map_or_else(Default::default, |q| {
        (
            html_escape(&q.source),
            html_escape(&q.destination),
            q.date.format(SearchQuery::DATE_FORMAT).to_string(),
        )
    });
    format!(
        "<form method=\"post\" action=\"/search\">\n\
         <label>From<input type=\"text\" name=\"source\" value=\"{source}\" required></label>\n\
         <label>To<input type=\"text\" name=\"destination\" value=\"{destination}\" required></label>\n\
         <label>Date<input type=\"date\" name=\"date\" value=\"{date}\" required></label>\n\
         <button type=\"submit\">Search Buses</button>\n\
         </form>\n\
         <p class=\"note\"><a href=\"/history\">Saved results</a></p>\n"
    )
}

fn listing_cells(out: &mut String, listing: &Listing) {
    out.push_str(&format!(
        "<td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"num\">{}</td>",
        html_escape(&listing.operator),
        html_escape(&listing.departure_time),
        html_escape(&listing.arrival_time),
        html_escape(&listing.duration),
        format_price(listing.price),
    ));
}

fn header_row(out: &mut String, leading: &[&str]) {
    out.push_str("<thead><tr>");
    for col in leading.iter().chain(&COLUMNS) {
        out.push_str(&format!("<th>{col}</th>"));
    }
    out.push_str("</tr></thead>\n");
}

pub fn listings_table(listings: &[Listing]) -> String {
    let mut out = String::from("<table>\n");
    header_row(&mut out, &[]);
    out.push_str("<tbody>\n");
    for listing in listings {
        out.push_str("<tr>");
        listing_cells(&mut out, listing);
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

pub fn search_page() -> String {
    layout("Bus Search", &form(None))
}

pub fn results_page(outcome: &SearchOutcome) -> String {
    let query = &outcome.query;
    let mut body = form(Some(query));
    body.push_str(&format!(
        "<h2>{} &rarr; {} on {}</h2>\n<p>{}</p>\n",
        html_escape(&query.source),
        html_escape(&query.destination),
        query.date.format("%a, %d %b %Y"),
        count_message(outcome.listings.len()),
    ));
    if !outcome.listings.is_empty() {
        body.push_str(&listings_table(&outcome.listings));
    }
    match outcome.stored {
        Stored::Skipped => (),
        Stored::Rows(n) => body.push_str(&format!("<p class=\"note\">Saved {n} rows to the database.</p>\n")),
        Stored::Failed(_) => body.push_str("<p class=\"error\">Could not save the results to the database.</p>\n"),
    }
    layout("Bus Search Results", &body)
}

pub fn error_page(prefill: Option<&SearchQuery>, message: &str) -> String {
    let mut body = form(prefill);
    body.push_str(&format!("<p class=\"error\">{}</p>\n", html_escape(message)));
    layout("Bus Search", &body)
}

pub fn history_page(rows: &[StoredListing]) -> String {
    let mut body = String::from("<p><a href=\"/\">New search</a></p>\n");
    body.push_str(&format!("<h2>Saved results</h2>\n<p>{} rows</p>\n", rows.len()));
    body.push_str("<table>\n");
    header_row(&mut body, &["#", "From", "To", "Date"]);
    body.push_str("<tbody>\n");
    for row in rows {
        body.push_str(&format!(
            "<tr><td class=\"num\">{}</td><td>{}</td><td>{}</td><td>{}</td>",
            row.id,
            html_escape(&row.query.source),
            html_escape(&row.query.destination),
            row.query.date.format(SearchQuery::DATE_FORMAT),
        ));
        listing_cells(&mut body, &row.listing);
        body.push_str("</tr>\n");
    }
    body.push_str("</tbody>\n</table>\n");
    layout("Saved Bus Results", &body)
}

/// Column-aligned table for terminals, followed by the count line.
pub fn text_table(listings: &[Listing]) -> String {
    let rows = listings
        .iter()
        .map(|l| {
            [
                l.operator.clone(),
                l.departure_time.to_string(),
                l.arrival_time.to_string(),
                l.duration.to_string(),
                format_price(l.price),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: &[&str]| {
        let line = cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                if i == COLUMNS.len() - 1 {
                    format!("{cell:>w$}")
                } else {
                    format!("{cell:<w$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    };

    if !rows.is_empty() {
        push_row(&COLUMNS);
        for row in &rows {
            push_row(&row.each_ref().map(String::as_str));
        }
    }
    out.push_str(&count_message(listings.len()));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use compact_str::CompactString;

    use super::*;

    fn listing(operator: &str, price: f64) -> Listing {
        Listing {
            operator: operator.to_owned(),
            departure_time: CompactString::const_new("21:30"),
            arrival_time: CompactString::const_new("06:15"),
            duration: CompactString::const_new("08h 45m"),
            price,
        }
    }

    fn outcome(listings: Vec<Listing>, stored: Stored) -> SearchOutcome {
        SearchOutcome {
            query: SearchQuery {
                source: "Bangalore".to_owned(),
                destination: "Chennai".to_owned(),
                date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            },
            listings,
            stored,
        }
    }

    #[test]
    fn count_matches_length() {
        assert_eq!(count_message(0), "No buses found");
        assert_eq!(count_message(1), "Found 1 bus");
        assert_eq!(count_message(12), "Found 12 buses");
    }

    #[test]
    fn results_page_has_one_row_per_listing() {
        let listings = vec![listing("Sharma Travels", 1250.0), listing("VRL Travels", 899.5)];
        let page = results_page(&outcome(listings, Stored::Rows(2)));
        assert!(page.contains("Found 2 buses"));
        assert_eq!(page.matches("<tr><td>").count(), 2);
        assert!(page.contains("<td class=\"num\">899.50</td>"));
        assert!(page.contains("Saved 2 rows"));
        assert!(page.contains("value=\"2026-10-16\""));
    }

    #[test]
    fn empty_results_have_no_table() {
        let page = results_page(&outcome(Vec::new(), Stored::Skipped));
        assert!(page.contains("No buses found"));
        assert!(!page.contains("<table>"));
        assert!(!page.contains("rows to the database"));
    }

    #[test]
    fn store_failure_is_reported() {
        let page = results_page(&outcome(vec![listing("KPN", 650.0)], Stored::Failed("connection refused".to_owned())));
        assert!(page.contains("Found 1 bus"));
        assert!(page.contains("Could not save"));
        assert!(!page.contains("connection refused"));
    }

    #[test]
    fn scraped_text_is_escaped() {
        let page = results_page(&outcome(vec![listing("<script>alert(1)</script>", 1.0)], Stored::Skipped));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }

    #[test]
    fn text_table_aligns_columns() {
        let table = text_table(&[listing("Sharma Travels", 1250.0), listing("KPN", 650.0)]);
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Bus Name        Departure"));
        assert!(lines[1].ends_with("1250.00"));
        assert!(lines[2].ends_with(" 650.00"));
        assert_eq!(lines[1].len(), lines[2].len());
        assert_eq!(lines[3], "Found 2 buses");
    }

    #[test]
    fn text_table_without_listings() {
        assert_eq!(text_table(&[]), "No buses found\n");
    }
}
