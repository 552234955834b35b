//! Markdown rendering for chat bubbles

use pulldown_cmark::{html, Event, Parser};

/// Render message text to HTML.
///
/// Raw HTML in the source is escaped and shown as text, never passed through.
pub fn to_html(text: &str) -> String {
    let parser = Parser::new(text).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, parser);
    out
}
