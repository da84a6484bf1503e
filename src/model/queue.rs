//! Daily work queue types.
//!
//! Each user has an ordered list of tasks they intend to work on next.
//! Ranks are 0-based and dense: the queue `[a, b, c]` is stored as
//! `a=0, b=1, c=2`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Task, TaskId, UserId};

/// A task's position in a user's work queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub user_id: UserId,
    pub task_id: TaskId,
    pub rank: i32,
    pub created_at: DateTime<Utc>,
}

/// Why a task shows up in a user's daily work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskClass {
    /// The user is responsible for the task but hasn't queued it.
    Assigned,
    /// The task is in the user's work queue.
    Next,
}

/// A task as seen from a user's daily work view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyWorkTask {
    pub task: Task,
    pub class: TaskClass,
    /// Queue rank, or -1 for tasks that aren't queued.
    pub work_queue_rank: i32,
}

impl DailyWorkTask {
    pub fn next(task: Task, rank: i32) -> Self {
        Self {
            task,
            class: TaskClass::Next,
            work_queue_rank: rank,
        }
    }

    pub fn assigned(task: Task) -> Self {
        Self {
            task,
            class: TaskClass::Assigned,
            work_queue_rank: -1,
        }
    }
}

/// Move `task` so that it sits directly below `target` in `order`.
///
/// With no target, or a target that isn't in the queue, the task goes to
/// the top. A task not yet in `order` is inserted. Returns the task's new
/// rank.
pub fn rank_under(order: &mut Vec<TaskId>, task: TaskId, target: Option<TaskId>) -> usize {
    if target == Some(task) {
        if let Some(pos) = order.iter().position(|id| *id == task) {
            return pos;
        }
    }

    order.retain(|id| *id != task);

    let pos = match target {
        Some(target) if target != task => order
            .iter()
            .position(|id| *id == target)
            .map(|i| i + 1)
            .unwrap_or(0),
        _ => 0,
    };

    order.insert(pos, task);
    pos
}
