//! Cross-entity search with access filtering.
//!
//! Every backlog, story and task hit is checked against the backlog that
//! owns it before it is returned, and labelled with a breadcrumb such as
//! `"Website > Login page"`. User hits are not filtered.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, debug};

use crate::error::Result;
use crate::model::*;
use crate::repository::{
    AccessControl, BacklogRepository, StoryRepository, TaskRepository, UserRepository,
};
use crate::telemetry::metrics;
use crate::telemetry::search::{record_results, start_search_span};

/// Label segment used for tasks that don't belong to a story.
const NO_STORY: &str = "No Story";

pub struct SearchService {
    backlogs: Arc<dyn BacklogRepository>,
    stories: Arc<dyn StoryRepository>,
    tasks: Arc<dyn TaskRepository>,
    users: Arc<dyn UserRepository>,
    access: Arc<dyn AccessControl>,
}

impl SearchService {
    pub fn new(
        backlogs: Arc<dyn BacklogRepository>,
        stories: Arc<dyn StoryRepository>,
        tasks: Arc<dyn TaskRepository>,
        users: Arc<dyn UserRepository>,
        access: Arc<dyn AccessControl>,
    ) -> Self {
        Self {
            backlogs,
            stories,
            tasks,
            users,
            access,
        }
    }

    /// Build a service whose repositories and access checks all go to `store`.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: BacklogRepository
            + StoryRepository
            + TaskRepository
            + UserRepository
            + AccessControl
            + 'static,
    {
        Self {
            backlogs: store.clone(),
            stories: store.clone(),
            tasks: store.clone(),
            users: store.clone(),
            access: store,
        }
    }

    /// Resolve a `story:<id>` or `backlog:<id>` quick reference.
    ///
    /// A story that sits directly in an iteration (no backlog) resolves to
    /// that iteration without an access check.
    pub async fn search_by_reference(&self, term: &str, user: &User) -> Result<Option<SearchTarget>> {
        let Some(reference) = Reference::parse(term) else {
            return Ok(None);
        };

        match reference.kind {
            ReferenceKind::Story => {
                let Some(story) = self.stories.get(StoryId(reference.id)).await? else {
                    return Ok(None);
                };
                let accessible = match &story.backlog {
                    Some(backlog) => Some(self.check_access(backlog, user).await?),
                    None => None,
                };
                match accessible {
                    Some(true) => Ok(Some(SearchTarget::Story(story))),
                    Some(false) => Ok(None),
                    None => Ok(story.iteration.map(SearchTarget::Backlog)),
                }
            }
            ReferenceKind::Backlog => {
                let Some(backlog) = self.backlogs.get(BacklogId(reference.id)).await? else {
                    return Ok(None);
                };
                if self.check_access(&backlog, user).await? {
                    Ok(Some(SearchTarget::Backlog(backlog)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Search backlogs, stories and tasks by name, and by id when the term
    /// is an integer.
    ///
    /// Rows come out as: quick-reference hit, backlogs, stories, tasks. Within
    /// each group the repository order is kept.
    pub async fn search_stories_and_backlogs(
        &self,
        term: &str,
        user: &User,
    ) -> Result<Vec<SearchResultRow>> {
        traced("combined", term, async {
            let mut rows = Vec::new();

            if let Some(hit) = self.search_by_reference(term, user).await? {
                rows.push(SearchResultRow::new(hit.name().to_string(), hit));
            }

            let mut backlogs = self.backlogs.search_by_name(term, None).await?;
            let mut stories = self.stories.search_by_name(term).await?;
            let mut tasks = self.tasks.search_by_name(term).await?;

            if let Some(id) = parse_id(term) {
                backlogs.extend(self.backlogs.search_by_id(id).await?);
                stories.extend(self.stories.search_by_id(id).await?);
                tasks.extend(self.tasks.search_by_id(id).await?);
            }

            self.backlog_rows(&mut rows, backlogs, user).await?;
            self.story_rows(&mut rows, stories, user).await?;
            self.task_rows(&mut rows, tasks, user).await?;

            Ok(rows)
        })
        .await
    }

    /// Iterations by name, labelled like any other backlog.
    pub async fn search_iterations(&self, term: &str, user: &User) -> Result<Vec<SearchResultRow>> {
        traced("iterations", term, async {
            let mut rows = Vec::new();
            let backlogs = self
                .backlogs
                .search_by_name(term, Some(BacklogKind::Iteration))
                .await?;
            self.backlog_rows(&mut rows, backlogs, user).await?;
            Ok(rows)
        })
        .await
    }

    /// Projects by name, labelled `"<product> > <project>"`.
    pub async fn search_projects(&self, term: &str, user: &User) -> Result<Vec<SearchResultRow>> {
        traced("projects", term, async {
            let mut rows = Vec::new();
            let backlogs = self
                .backlogs
                .search_by_name(term, Some(BacklogKind::Project))
                .await?;
            self.backlog_rows(&mut rows, backlogs, user).await?;
            Ok(rows)
        })
        .await
    }

    /// Stories by name, labelled with their iteration or backlog.
    pub async fn search_stories(&self, term: &str, user: &User) -> Result<Vec<SearchResultRow>> {
        traced("stories", term, async {
            let mut rows = Vec::new();
            let stories = self.stories.search_by_name(term).await?;
            self.story_rows(&mut rows, stories, user).await?;
            Ok(rows)
        })
        .await
    }

    /// Users by name, labelled with their full name. Not access filtered.
    pub async fn search_users(&self, term: &str) -> Result<Vec<SearchResultRow>> {
        traced("users", term, async {
            let users = self.users.search_by_name(term).await?;
            Ok(users
                .into_iter()
                .map(|user| SearchResultRow::new(user.full_name.clone(), SearchTarget::User(user)))
                .collect())
        })
        .await
    }

    /// Tasks by name, labelled `"<iteration> > <story> > <task>"`.
    ///
    /// A task in a story is checked against the story's backlog (or the
    /// story's iteration if it has no backlog). Its leading label segment is
    /// the task's own iteration, or the story's container when the task
    /// isn't assigned to one. Storyless tasks are checked against their
    /// iteration and labelled with "No Story".
    pub async fn search_tasks(&self, term: &str, user: &User) -> Result<Vec<SearchResultRow>> {
        traced("tasks", term, async {
            let mut rows = Vec::new();
            for task in self.tasks.search_by_name(term).await? {
                let row = match &task.story {
                    Some(story) => {
                        let Some(owner) = story.backlog.as_ref().or(story.iteration.as_ref())
                        else {
                            debug!(task = %task.id, "task story has no backlog, skipping");
                            continue;
                        };
                        if !self.check_access(owner, user).await? {
                            record_filtered("task");
                            continue;
                        }
                        let Some(head) = task.iteration.as_ref().or(story.container()) else {
                            continue;
                        };
                        format!("{} > {} > {}", head.name, story.name, task.name)
                    }
                    None => {
                        let Some(iteration) = &task.iteration else {
                            debug!(task = %task.id, "task has neither story nor iteration, skipping");
                            continue;
                        };
                        if !self.check_access(iteration, user).await? {
                            record_filtered("task");
                            continue;
                        }
                        format!("{} > {NO_STORY} > {}", iteration.name, task.name)
                    }
                };
                rows.push(SearchResultRow::new(row, SearchTarget::Task(task)));
            }
            Ok(rows)
        })
        .await
    }

    async fn check_access(&self, backlog: &Backlog, user: &User) -> Result<bool> {
        self.access.is_backlog_accessible(backlog.id, user).await
    }

    async fn backlog_rows(
        &self,
        rows: &mut Vec<SearchResultRow>,
        backlogs: Vec<Backlog>,
        user: &User,
    ) -> Result<()> {
        for backlog in backlogs {
            if !self.check_access(&backlog, user).await? {
                record_filtered("backlog");
                continue;
            }
            let label = match &backlog.parent {
                Some(parent) => format!("{} > {}", parent.name, backlog.name),
                None => backlog.name.clone(),
            };
            rows.push(SearchResultRow::new(label, SearchTarget::Backlog(backlog)));
        }
        Ok(())
    }

    async fn story_rows(
        &self,
        rows: &mut Vec<SearchResultRow>,
        stories: Vec<Story>,
        user: &User,
    ) -> Result<()> {
        for story in stories {
            let Some(container) = story.container() else {
                debug!(story = %story.id, "story has no backlog or iteration, skipping");
                continue;
            };
            if !self.check_access(container, user).await? {
                record_filtered("story");
                continue;
            }
            let label = format!("{} > {}", container.name, story.name);
            rows.push(SearchResultRow::new(label, SearchTarget::Story(story)));
        }
        Ok(())
    }

    /// A task can show up twice: once through its story and once through the
    /// iteration it is directly assigned to.
    async fn task_rows(
        &self,
        rows: &mut Vec<SearchResultRow>,
        tasks: Vec<Task>,
        user: &User,
    ) -> Result<()> {
        for task in tasks {
            if let Some(story) = &task.story {
                let mut visible = false;
                if let Some(backlog) = &story.backlog {
                    visible = self.check_access(backlog, user).await?;
                }
                if !visible {
                    if let Some(iteration) = &story.iteration {
                        visible = self.check_access(iteration, user).await?;
                    }
                }
                if visible {
                    let label = format!("{} > {}", story.name, task.name);
                    rows.push(SearchResultRow::new(label, SearchTarget::Task(task.clone())));
                } else {
                    record_filtered("task");
                }
            }

            if let Some(iteration) = &task.iteration {
                if self.check_access(iteration, user).await? {
                    let label = format!("{} > {}", iteration.name, task.name);
                    rows.push(SearchResultRow::new(label, SearchTarget::Task(task.clone())));
                } else {
                    record_filtered("task");
                }
            }
        }
        Ok(())
    }
}

/// Run one search inside its span and record request/result metrics.
async fn traced<F>(scope: &'static str, term: &str, search: F) -> Result<Vec<SearchResultRow>>
where
    F: Future<Output = Result<Vec<SearchResultRow>>>,
{
    let span = start_search_span(scope, term);
    let started = Instant::now();
    metrics::search_requests().add(1, &[KeyValue::new("scope", scope)]);

    let rows = search.instrument(span.clone()).await?;

    record_results(&span, rows.len());
    metrics::search_results().add(rows.len() as u64, &[KeyValue::new("scope", scope)]);
    metrics::operation_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", "search")],
    );
    Ok(rows)
}

fn record_filtered(entity: &'static str) {
    metrics::search_filtered().add(1, &[KeyValue::new("entity", entity)]);
}
