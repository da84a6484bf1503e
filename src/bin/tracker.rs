//! tracker CLI: operator interface to search and the daily work queue.

use clap::{Parser, Subcommand, ValueEnum};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracker_rs::action::DailyWorkAction;
use tracker_rs::config::Config;
use tracker_rs::db::Db;
use tracker_rs::model::{
    DailyWorkTask, SearchResultRow, SearchTarget, TaskClass, TaskId, User, UserId,
};
use tracker_rs::repository::UserRepository;
use tracker_rs::search::SearchService;
use tracker_rs::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "tracker", about = "Backlog search and daily work queue")]
struct Cli {
    /// Act as this user (defaults to TRACKER_USER_ID)
    #[arg(long, global = true)]
    as_user: Option<i32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Search backlogs, stories, tasks and users
    Search {
        /// Free text, an id, or a quick reference like story:42
        term: String,
        /// What to search
        #[arg(long, value_enum, default_value_t = SearchKind::All)]
        kind: SearchKind,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// Daily work queue operations
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchKind {
    All,
    Iterations,
    Projects,
    Stories,
    Users,
    Tasks,
}

#[derive(Subcommand)]
enum QueueAction {
    /// Show a user's queue and assigned tasks
    List {
        /// Whose queue (defaults to the acting user)
        #[arg(long)]
        user: Option<i32>,
    },
    /// Append a task to a queue
    Add {
        task: i32,
        #[arg(long)]
        user: Option<i32>,
    },
    /// Take a task off a queue
    Remove {
        task: i32,
        #[arg(long)]
        user: Option<i32>,
    },
    /// Move a task directly below another (top if omitted)
    Rank {
        task: i32,
        /// Task to rank under
        #[arg(long)]
        under: Option<i32>,
        #[arg(long)]
        user: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig::from_config(&config, "tracker"))?;

    let db = Arc::new(Db::connect(config.database_url.expose_secret()).await?);

    let acting = cli
        .as_user
        .map(UserId)
        .or(config.session_user)
        .ok_or_else(|| anyhow::anyhow!("no acting user: pass --as-user or set TRACKER_USER_ID"));

    match cli.command {
        Command::Migrate => {
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Command::Search { term, kind, json } => {
            let user = db.retrieve(acting?).await?;
            cmd_search(db, &user, &term, kind, json).await
        }
        Command::Queue { action } => {
            let action_handler = DailyWorkAction::from_store(Arc::clone(&db), acting?);
            cmd_queue(&action_handler, action).await
        }
    }
}

async fn cmd_search(
    db: Arc<Db>,
    user: &User,
    term: &str,
    kind: SearchKind,
    json: bool,
) -> anyhow::Result<()> {
    let search = SearchService::from_store(db);
    let rows = match kind {
        SearchKind::All => search.search_stories_and_backlogs(term, user).await?,
        SearchKind::Iterations => search.search_iterations(term, user).await?,
        SearchKind::Projects => search.search_projects(term, user).await?,
        SearchKind::Stories => search.search_stories(term, user).await?,
        SearchKind::Users => search.search_users(term).await?,
        SearchKind::Tasks => search.search_tasks(term, user).await?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    print_rows(&rows);
    Ok(())
}

fn print_rows(rows: &[SearchResultRow]) {
    if rows.is_empty() {
        println!("No matches.");
        return;
    }
    for row in rows {
        let (kind, id) = match &row.original {
            SearchTarget::Backlog(b) => (b.kind.to_string(), b.id.0),
            SearchTarget::Story(s) => ("story".to_string(), s.id.0),
            SearchTarget::Task(t) => ("task".to_string(), t.id.0),
            SearchTarget::User(u) => ("user".to_string(), u.id.0),
        };
        println!("{:<10}  {:>6}  {}", kind, id, row.label);
    }
    println!("\n{} match(es)", rows.len());
}

async fn cmd_queue(action: &DailyWorkAction, queue_action: QueueAction) -> anyhow::Result<()> {
    match queue_action {
        QueueAction::List { user } => {
            let view = action.retrieve(user.map(UserId)).await?;
            println!("Daily work for {} ({})", view.user.full_name, view.user.login_name);
            println!("{}", "-".repeat(60));
            if view.assigned_tasks.is_empty() {
                println!("Nothing queued or assigned.");
            }
            for item in &view.assigned_tasks {
                print_daily_task(item);
            }
            let others: Vec<&str> = view
                .enabled_users
                .iter()
                .filter(|u| u.id != view.user.id)
                .map(|u| u.login_name.as_str())
                .collect();
            if !others.is_empty() {
                println!("\nOther users: {}", others.join(", "));
            }
        }
        QueueAction::Add { task, user } => {
            let task = action.add_to_work_queue(user.map(UserId), TaskId(task)).await?;
            println!("Queued: {} ({})", task.name, task.id);
        }
        QueueAction::Remove { task, user } => {
            let task = action
                .delete_from_work_queue(user.map(UserId), TaskId(task))
                .await?;
            println!("Removed: {} ({})", task.name, task.id);
        }
        QueueAction::Rank { task, under, user } => {
            let ranked = action
                .rank_queue_task_and_move_under(user.map(UserId), TaskId(task), under.map(TaskId))
                .await?;
            println!(
                "Ranked: {} ({}) now at position {}",
                ranked.task.name, ranked.task.id, ranked.work_queue_rank
            );
        }
    }
    Ok(())
}

fn print_daily_task(item: &DailyWorkTask) {
    let marker = match item.class {
        TaskClass::Next => format!("{:>3}", item.work_queue_rank),
        TaskClass::Assigned => "  -".to_string(),
    };
    println!("{marker}  {:>6}  {}", item.task.id.0, item.task.name);
}
