//! Daily work action tests: id resolution and the order collaborators are
//! called in.

mod common;

use std::sync::Arc;

use common::*;
use tracker_rs::action::DailyWorkAction;
use tracker_rs::error::Error;
use tracker_rs::model::*;

const LOGGED_IN_USER: UserId = UserId(2);

fn action(store: &Arc<FakeStore>) -> DailyWorkAction {
    DailyWorkAction::from_store(Arc::clone(store), LOGGED_IN_USER)
}

fn user_list() -> Vec<User> {
    vec![user(5, "Antti Haapala Sr"), user(9, "Antti Haapala Jr")]
}

#[tokio::test]
async fn retrieve_returns_queue_and_enabled_users() {
    let [u1, u2]: [User; 2] = user_list().try_into().unwrap();
    // The queue owner is disabled, so only the other two are offered in the
    // user switcher.
    let owner = User {
        enabled: false,
        ..user(1, "Queue Owner")
    };
    let first = task(10, "Write tests", None, None);
    let second = task(11, "Review PR", None, None);
    let store = Arc::new(
        FakeStore::new()
            .with_users(&[&u1, &u2, &owner])
            .with_tasks(&[&first, &second]),
    );
    store
        .queues
        .lock()
        .unwrap()
        .insert(owner.id, vec![first.id, second.id]);

    let view = action(&store).retrieve(Some(UserId(1))).await.unwrap();

    assert_eq!(view.user.id, UserId(1));
    assert_eq!(
        view.assigned_tasks,
        vec![DailyWorkTask::next(first, 0), DailyWorkTask::next(second, 1)]
    );
    assert_eq!(view.enabled_users.len(), 2);
    assert!(view.enabled_users.contains(&u1));
    assert!(view.enabled_users.contains(&u2));
    assert_eq!(
        store.calls(),
        vec!["users.get(1)", "users.enabled", "queue.current(1)"]
    );
}

#[tokio::test]
async fn retrieve_defaults_to_logged_in_user_and_fails_when_missing() {
    let store = Arc::new(FakeStore::new().with_users(&[&user(5, "Someone Else")]));

    let err = action(&store).retrieve(None).await.unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
    assert_eq!(store.calls(), vec!["users.get(2)"]);
}

#[tokio::test]
async fn delete_from_queue_uses_logged_in_user() {
    let me = user(LOGGED_IN_USER.0, "Logged In");
    let work = task(1, "Update docs", None, None);
    let store = Arc::new(FakeStore::new().with_users(&[&me]).with_tasks(&[&work]));
    store
        .queues
        .lock()
        .unwrap()
        .insert(me.id, vec![TaskId(7), work.id]);

    let returned = action(&store)
        .delete_from_work_queue(None, TaskId(1))
        .await
        .unwrap();

    assert_eq!(returned, work);
    assert_eq!(store.queue_of(me.id), vec![TaskId(7)]);
    assert_eq!(
        store.calls(),
        vec!["users.get(2)", "tasks.get(1)", "queue.remove(2, 1)"]
    );
}

#[tokio::test]
async fn add_to_queue_resolves_user_and_task() {
    let owner = user(3, "Queue Owner");
    let work = task(1, "Update docs", None, None);
    let store = Arc::new(FakeStore::new().with_users(&[&owner]).with_tasks(&[&work]));

    let returned = action(&store)
        .add_to_work_queue(Some(UserId(3)), TaskId(1))
        .await
        .unwrap();

    assert_eq!(returned, work);
    assert_eq!(store.queue_of(owner.id), vec![TaskId(1)]);
    assert_eq!(
        store.calls(),
        vec!["users.get(3)", "tasks.get(1)", "queue.add(3, 1)"]
    );
}

#[tokio::test]
async fn add_to_queue_with_missing_task_never_reaches_queue() {
    let owner = user(3, "Queue Owner");
    let store = Arc::new(FakeStore::new().with_users(&[&owner]));

    let err = action(&store)
        .add_to_work_queue(Some(UserId(3)), TaskId(1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
    assert!(store.calls_to("queue").is_empty());
}

#[tokio::test]
async fn rank_moves_task_under_target() {
    let owner = user(3, "Queue Owner");
    let work = task(1, "Update docs", None, None);
    let under = task(2, "Fix build", None, None);
    let store = Arc::new(
        FakeStore::new()
            .with_users(&[&owner])
            .with_tasks(&[&work, &under]),
    );
    store
        .queues
        .lock()
        .unwrap()
        .insert(owner.id, vec![work.id, under.id, TaskId(3)]);

    let ranked = action(&store)
        .rank_queue_task_and_move_under(Some(UserId(3)), TaskId(1), Some(TaskId(2)))
        .await
        .unwrap();

    assert_eq!(ranked, DailyWorkTask::next(work, 1));
    assert_eq!(store.queue_of(owner.id), vec![TaskId(2), TaskId(1), TaskId(3)]);
    assert_eq!(
        store.calls(),
        vec![
            "users.get(3)",
            "tasks.get(1)",
            "tasks.get(2)",
            "queue.rank(3, 1, Some(2))",
        ]
    );
}

#[tokio::test]
async fn rank_with_unknown_target_ranks_under_nothing() {
    let owner = user(3, "Queue Owner");
    let work = task(1, "Update docs", None, None);
    let store = Arc::new(FakeStore::new().with_users(&[&owner]).with_tasks(&[&work]));
    store
        .queues
        .lock()
        .unwrap()
        .insert(owner.id, vec![TaskId(5), work.id]);

    let ranked = action(&store)
        .rank_queue_task_and_move_under(Some(UserId(3)), TaskId(1), Some(TaskId(99)))
        .await
        .unwrap();

    assert_eq!(ranked.work_queue_rank, 0);
    assert_eq!(
        store.calls(),
        vec![
            "users.get(3)",
            "tasks.get(1)",
            "tasks.get(99)",
            "queue.rank(3, 1, None)",
        ]
    );
}
