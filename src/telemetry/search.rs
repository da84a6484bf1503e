//! Search span helpers.

use tracing::Span;

/// Start a span for one search call.
///
/// `search.results` is declared empty and filled in by [`record_results`].
pub fn start_search_span(scope: &str, term: &str) -> Span {
    tracing::info_span!(
        "search.execute",
        "search.scope" = scope,
        "search.term" = term,
        "search.results" = tracing::field::Empty,
    )
}

/// Record how many rows a search produced.
pub fn record_results(span: &Span, count: usize) {
    span.record("search.results", count);
}
