//! Metric instruments.
//!
//! All instruments come from the `"tracker-rs"` meter on the globally
//! registered `MeterProvider`. Without an OTLP endpoint they are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("tracker-rs")
}

/// Counter: search calls.
/// Labels: `scope` ("combined" | "iterations" | "projects" | "stories" | "users" | "tasks").
pub fn search_requests() -> Counter<u64> {
    meter()
        .u64_counter("tracker.search.requests")
        .with_description("Number of search requests")
        .build()
}

/// Counter: rows returned by search.
/// Labels: `scope`.
pub fn search_results() -> Counter<u64> {
    meter()
        .u64_counter("tracker.search.results")
        .with_description("Number of search result rows returned")
        .build()
}

/// Counter: candidates dropped by the access check.
/// Labels: `entity` ("backlog" | "story" | "task").
pub fn search_filtered() -> Counter<u64> {
    meter()
        .u64_counter("tracker.search.filtered")
        .with_description("Search candidates hidden from the user")
        .build()
}

/// Counter: work queue mutations.
/// Labels: `operation` ("add" | "remove" | "rank").
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("tracker.queue.operations")
        .with_description("Number of work queue operations")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("tracker.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
