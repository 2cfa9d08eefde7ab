use crate::db::ExtractedPoint;

/// Only the leading paragraphs of a page are considered.
pub const MAX_PARAGRAPHS: usize = 5;
/// Paragraphs at or under this many characters are treated as boilerplate.
pub const MIN_PARAGRAPH_CHARS: usize = 40;

const EXAMPLE_MARKER: &str = "example";

/// Turn page paragraphs into a description: at most `MAX_PARAGRAPHS` inputs
/// are read, short ones dropped, and paragraphs mentioning an example tagged.
pub fn extract<S: AsRef<str>>(paragraphs: &[S]) -> Vec<ExtractedPoint> {
    paragraphs
        .iter()
        .take(MAX_PARAGRAPHS)
        .map(|p| p.as_ref().trim())
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .map(|text| {
            if text.to_lowercase().contains(EXAMPLE_MARKER) {
                ExtractedPoint::example(text)
            } else {
                ExtractedPoint::Line(text.to_string())
            }
        })
        .collect()
}
