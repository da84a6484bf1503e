//! In-memory fakes of the repository traits, shared by the integration tests.
//!
//! Every trait call is appended to `calls` so tests can assert which
//! collaborators were hit and in what order.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracker_rs::error::Result;
use tracker_rs::model::*;
use tracker_rs::repository::*;

#[derive(Default)]
pub struct FakeStore {
    pub backlogs: Vec<Backlog>,
    pub stories: Vec<Story>,
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    pub accessible: HashSet<BacklogId>,
    pub queues: Mutex<HashMap<UserId, Vec<TaskId>>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backlogs(mut self, backlogs: &[&Backlog]) -> Self {
        self.backlogs.extend(backlogs.iter().map(|b| (*b).clone()));
        self
    }

    pub fn with_stories(mut self, stories: &[&Story]) -> Self {
        self.stories.extend(stories.iter().map(|s| (*s).clone()));
        self
    }

    pub fn with_tasks(mut self, tasks: &[&Task]) -> Self {
        self.tasks.extend(tasks.iter().map(|t| (*t).clone()));
        self
    }

    pub fn with_users(mut self, users: &[&User]) -> Self {
        self.users.extend(users.iter().map(|u| (*u).clone()));
        self
    }

    /// Let the test user see these backlogs.
    pub fn grant(mut self, backlogs: &[&Backlog]) -> Self {
        self.accessible.extend(backlogs.iter().map(|b| b.id));
        self
    }

    pub fn queue_of(&self, user: UserId) -> Vec<TaskId> {
        self.queues
            .lock()
            .unwrap()
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose name starts with `prefix`.
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

fn matches(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.to_lowercase())
}

#[async_trait]
impl BacklogRepository for FakeStore {
    async fn search_by_name(&self, term: &str, kind: Option<BacklogKind>) -> Result<Vec<Backlog>> {
        self.record(format!("backlogs.by_name({term})"));
        Ok(self
            .backlogs
            .iter()
            .filter(|b| matches(&b.name, term))
            .filter(|b| kind.is_none_or(|k| b.kind == k))
            .cloned()
            .collect())
    }

    async fn search_by_id(&self, id: i32) -> Result<Vec<Backlog>> {
        self.record(format!("backlogs.by_id({id})"));
        Ok(self.backlogs.iter().filter(|b| b.id.0 == id).cloned().collect())
    }

    async fn get(&self, id: BacklogId) -> Result<Option<Backlog>> {
        self.record(format!("backlogs.get({id})"));
        Ok(self.backlogs.iter().find(|b| b.id == id).cloned())
    }
}

#[async_trait]
impl StoryRepository for FakeStore {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Story>> {
        self.record(format!("stories.by_name({term})"));
        Ok(self
            .stories
            .iter()
            .filter(|s| matches(&s.name, term))
            .cloned()
            .collect())
    }

    async fn search_by_id(&self, id: i32) -> Result<Vec<Story>> {
        self.record(format!("stories.by_id({id})"));
        Ok(self.stories.iter().filter(|s| s.id.0 == id).cloned().collect())
    }

    async fn get(&self, id: StoryId) -> Result<Option<Story>> {
        self.record(format!("stories.get({id})"));
        Ok(self.stories.iter().find(|s| s.id == id).cloned())
    }
}

#[async_trait]
impl TaskRepository for FakeStore {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Task>> {
        self.record(format!("tasks.by_name({term})"));
        Ok(self
            .tasks
            .iter()
            .filter(|t| matches(&t.name, term))
            .cloned()
            .collect())
    }

    async fn search_by_id(&self, id: i32) -> Result<Vec<Task>> {
        self.record(format!("tasks.by_id({id})"));
        Ok(self.tasks.iter().filter(|t| t.id.0 == id).cloned().collect())
    }

    async fn get(&self, id: TaskId) -> Result<Option<Task>> {
        self.record(format!("tasks.get({id})"));
        Ok(self.tasks.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn search_by_name(&self, term: &str) -> Result<Vec<User>> {
        self.record(format!("users.by_name({term})"));
        Ok(self
            .users
            .iter()
            .filter(|u| matches(&u.full_name, term) || matches(&u.login_name, term))
            .cloned()
            .collect())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        self.record(format!("users.get({id})"));
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn enabled_users(&self) -> Result<Vec<User>> {
        self.record("users.enabled");
        Ok(self.users.iter().filter(|u| u.enabled).cloned().collect())
    }
}

#[async_trait]
impl AccessControl for FakeStore {
    async fn is_backlog_accessible(&self, backlog: BacklogId, _user: &User) -> Result<bool> {
        self.record(format!("access({backlog})"));
        Ok(self.accessible.contains(&backlog))
    }
}

#[async_trait]
impl WorkQueue for FakeStore {
    async fn current_tasks(&self, user: &User) -> Result<Vec<DailyWorkTask>> {
        self.record(format!("queue.current({})", user.id));
        Ok(self
            .queue_of(user.id)
            .into_iter()
            .enumerate()
            .filter_map(|(rank, id)| {
                let task = self.tasks.iter().find(|t| t.id == id)?.clone();
                Some(DailyWorkTask::next(task, rank as i32))
            })
            .collect())
    }

    async fn add(&self, user: &User, task: &Task) -> Result<QueueEntry> {
        self.record(format!("queue.add({}, {})", user.id, task.id));
        let mut queues = self.queues.lock().unwrap();
        let queue = queues.entry(user.id).or_default();
        let rank = match queue.iter().position(|id| *id == task.id) {
            Some(rank) => rank,
            None => {
                queue.push(task.id);
                queue.len() - 1
            }
        };
        Ok(QueueEntry {
            user_id: user.id,
            task_id: task.id,
            rank: rank as i32,
            created_at: Utc::now(),
        })
    }

    async fn remove(&self, user: &User, task: &Task) -> Result<()> {
        self.record(format!("queue.remove({}, {})", user.id, task.id));
        if let Some(queue) = self.queues.lock().unwrap().get_mut(&user.id) {
            queue.retain(|id| *id != task.id);
        }
        Ok(())
    }

    async fn rank_under(
        &self,
        user: &User,
        task: &Task,
        target: Option<&Task>,
    ) -> Result<DailyWorkTask> {
        let target_id = target.map(|t| t.id);
        self.record(format!(
            "queue.rank({}, {}, {:?})",
            user.id,
            task.id,
            target_id.map(|id| id.0)
        ));
        let mut queues = self.queues.lock().unwrap();
        let queue = queues.entry(user.id).or_default();
        let rank = rank_under(queue, task.id, target_id);
        Ok(DailyWorkTask::next(task.clone(), rank as i32))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn product(id: i32, name: &str) -> Backlog {
    Backlog {
        id: BacklogId(id),
        name: name.to_string(),
        kind: BacklogKind::Product,
        parent: None,
    }
}

pub fn project(id: i32, name: &str, product: &Backlog) -> Backlog {
    Backlog {
        id: BacklogId(id),
        name: name.to_string(),
        kind: BacklogKind::Project,
        parent: Some(product.to_ref()),
    }
}

pub fn iteration(id: i32, name: &str, parent: Option<&Backlog>) -> Backlog {
    Backlog {
        id: BacklogId(id),
        name: name.to_string(),
        kind: BacklogKind::Iteration,
        parent: parent.map(Backlog::to_ref),
    }
}

pub fn story(id: i32, name: &str, backlog: Option<&Backlog>, iteration: Option<&Backlog>) -> Story {
    Story {
        id: StoryId(id),
        name: name.to_string(),
        backlog: backlog.cloned(),
        iteration: iteration.cloned(),
    }
}

pub fn task(id: i32, name: &str, story: Option<&Story>, iteration: Option<&Backlog>) -> Task {
    Task {
        id: TaskId(id),
        name: name.to_string(),
        story: story.cloned(),
        iteration: iteration.cloned(),
    }
}

pub fn user(id: i32, full_name: &str) -> User {
    User {
        id: UserId(id),
        login_name: full_name.to_lowercase().replace(' ', "."),
        full_name: full_name.to_string(),
        initials: full_name
            .split_whitespace()
            .filter_map(|p| p.chars().next())
            .collect(),
        enabled: true,
        admin: false,
    }
}

/// The user searches run as. Access is decided by `FakeStore::accessible`.
pub fn viewer() -> User {
    user(100, "Test Viewer")
}
