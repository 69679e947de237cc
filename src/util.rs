use scraper::ElementRef;

/// Visible text of an element: trimmed text nodes joined by a single space.
pub fn text_of(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for piece in element.text().map(str::trim).filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(piece);
    }
    out
}

/// Text nodes of an element concatenated as-is, then trimmed. Keeps amounts
/// split over inline markup (`1<span>,250</span>`) in one piece.
pub fn inline_text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
