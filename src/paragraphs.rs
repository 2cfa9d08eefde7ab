use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
/// Wikipedia footnote markers: [1], [a], [note 3], [citation needed].
static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:\d+|[a-z]|note \d+|citation needed|clarification needed)\]").unwrap()
});

/// Text of every `<p>` element in document order, empty ones included.
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&PARAGRAPH)
        .map(|p| clean_text(&p.text().collect::<String>()))
        .collect()
}

fn clean_text(text: &str) -> String {
    let stripped = CITATION_RE.replace_all(text, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
