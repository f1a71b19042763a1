#![forbid(unsafe_code)]

mod view;

use std::cell::Cell;
use std::env;
use std::rc::Rc;

use chrono::{Days, Local};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use taskdeck_core::{
    Assignee, Category, CategoryId, Engine, EngineConfig, EngineEvent, MemoryProvider, Status,
    Task, TaskId, TaskPatch,
};
use view::ConsoleView;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "taskdeck: task-board sync engine demo",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run a scripted walkthrough against an in-memory store",
        after_help = "EXAMPLES:\n    # Walk through start/move/finish/postpone with board dumps\n    td demo"
    )]
    Demo,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TASKDECK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "taskdeck_core=debug,info"
        } else {
            "taskdeck_core=info,warn"
        })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn seeded_provider() -> MemoryProvider {
    let today = Local::now().date_naive();
    let categories = vec![
        Category {
            id: CategoryId::new("c-dc"),
            name: "Data Change / Production".to_string(),
            color: Some("#2383e2".to_string()),
            parent: Some("Operations".to_string()),
        },
        Category {
            id: CategoryId::new("c-inq"),
            name: "Customer Inquiry".to_string(),
            color: None,
            parent: Some("Support".to_string()),
        },
    ];
    let tasks = vec![
        Task {
            id: TaskId::new("t-1"),
            title: "Fix billing flags".to_string(),
            status: Status::NotStarted,
            assignee: Some(Assignee::Primary),
            category: Some(CategoryId::new("c-dc")),
            due_date: today.checked_add_days(Days::new(2)),
            ..Task::default()
        },
        Task {
            id: TaskId::new("t-2"),
            title: "Why was my export empty".to_string(),
            status: Status::NotStarted,
            assignee: Some(Assignee::Primary),
            category: Some(CategoryId::new("c-inq")),
            ..Task::default()
        },
        Task {
            id: TaskId::new("t-3"),
            title: "Review schema migration".to_string(),
            status: Status::InProgress,
            assignee: Some(Assignee::Reviewer),
            ..Task::default()
        },
    ];
    MemoryProvider::new(tasks, categories)
}

async fn demo() -> anyhow::Result<()> {
    // Polling off: the walkthrough drives every refresh explicitly.
    let config = EngineConfig {
        poll_ms: 0,
        ..EngineConfig::default()
    };
    let engine = Engine::new(seeded_provider(), ConsoleView::new(), config);

    let completed = Rc::new(Cell::new(0u32));
    {
        let completed = Rc::clone(&completed);
        engine.subscribe(move |event| {
            if let EngineEvent::MutationFailed { message, .. } = event {
                eprintln!("mutation failed: {message}");
            } else if matches!(event, EngineEvent::MutationCommitted { .. }) {
                completed.set(completed.get() + 1);
            }
        });
    }

    engine.initialize().await?;
    println!("== initial board ==");
    engine.with_view(ConsoleView::print);

    println!("\n== start t-1 (auto-assigns the data-change phase) ==");
    engine.start_task(&TaskId::new("t-1")).await?;
    engine.with_view(ConsoleView::print);

    println!("\n== start t-2 (stops t-1 first) ==");
    engine.start_task(&TaskId::new("t-2")).await?;
    println!(
        "running: {}",
        engine
            .find_running()
            .map_or_else(|| "none".to_string(), |id| id.to_string())
    );
    engine.with_view(ConsoleView::print);

    println!("\n== finish t-2, postpone t-1, edit t-3 ==");
    engine.finish_task(&TaskId::new("t-2")).await?;
    engine.postpone_task(&TaskId::new("t-1")).await?;
    engine
        .edit_task(
            &TaskId::new("t-3"),
            &TaskPatch::default().with_memo("ping the author before merging"),
        )
        .await?;
    engine.with_view(ConsoleView::print);

    println!("\ncommitted mutations: {}", completed.get());
    engine.dispose();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    runtime.block_on(local.run_until(async {
        match cli.command {
            Commands::Demo => demo().await,
        }
    }))
}
