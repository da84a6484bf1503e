//! Work queue span helpers.

use tracing::Span;

use crate::model::{TaskId, UserId};

/// Start a span for a queue mutation on behalf of `user`.
pub fn start_queue_span(operation: &str, user: UserId, task: TaskId) -> Span {
    tracing::info_span!(
        "queue.mutate",
        "queue.operation" = operation,
        "queue.user" = user.0,
        "queue.task" = task.0,
        "queue.rank" = tracing::field::Empty,
    )
}

/// Record the rank a task ended up at.
pub fn record_rank(span: &Span, rank: i32) {
    span.record("queue.rank", rank);
}
