//! The at-most-one-running-task invariant across starts and refreshes.

mod common;

use std::time::Duration;

use common::{GatedProvider, RecordingView, manual_config, running_task, settle, task};
use taskdeck_core::{Engine, MemoryProvider, ProviderError, Status, TaskId, TaskProvider};
use tokio::task::LocalSet;

#[tokio::test(start_paused = true)]
async fn starting_x_while_y_runs_stops_y_first() {
    LocalSet::new()
        .run_until(async {
            let provider = GatedProvider::new(
                vec![
                    task("x", "next up", Status::NotStarted),
                    running_task("y", "current"),
                ],
                vec![],
            );
            let engine = Engine::new(provider.clone(), RecordingView::new(), manual_config());
            engine.initialize().await.unwrap();
            assert_eq!(engine.find_running(), Some(TaskId::new("y")));

            let release_stop = provider.gate("stop_task");
            let release_start = provider.gate("start_task");
            let runner = engine.clone();
            let handle = tokio::task::spawn_local(async move {
                runner.start_task(&TaskId::new("x")).await
            });
            settle().await;

            // Immediately after the optimistic step, before either
            // remote call resolves: X is the running task and Y's run
            // stamps are cleared.
            assert_eq!(engine.find_running(), Some(TaskId::new("x")));
            let y = engine.task(&TaskId::new("y")).unwrap();
            assert!(y.run_start.is_none() && y.run_end.is_none());

            release_stop.send(Ok(())).unwrap();
            settle().await;
            release_start.send(Ok(())).unwrap();
            handle.await.unwrap().unwrap();

            // Remote order: stop for Y precedes start for X.
            let calls = provider.calls();
            let stop_at = calls.iter().position(|c| *c == "stop_task").unwrap();
            let start_at = calls.iter().position(|c| *c == "start_task").unwrap();
            assert!(stop_at < start_at);

            assert_eq!(engine.find_running(), Some(TaskId::new("x")));
            let running: Vec<_> = engine
                .tasks()
                .into_iter()
                .filter(taskdeck_core::Task::is_running)
                .collect();
            assert_eq!(running.len(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failed_start_restores_the_previous_running_task() {
    LocalSet::new()
        .run_until(async {
            let provider = GatedProvider::new(
                vec![
                    task("x", "next up", Status::NotStarted),
                    running_task("y", "current"),
                ],
                vec![],
            );
            let engine = Engine::new(provider.clone(), RecordingView::new(), manual_config());
            engine.initialize().await.unwrap();

            let release_stop = provider.gate("stop_task");
            release_stop
                .send(Err(ProviderError::transport("stop failed")))
                .ok();
            let result = engine.start_task(&TaskId::new("x")).await;
            assert!(result.is_err());

            // Both tasks roll back to their snapshots: Y running again,
            // X untouched.
            assert_eq!(engine.find_running(), Some(TaskId::new("y")));
            let x = engine.task(&TaskId::new("x")).unwrap();
            assert!(x.run_start.is_none());
            assert_eq!(x.status, Status::NotStarted);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn answering_the_running_task_clears_its_run_state() {
    LocalSet::new()
        .run_until(async {
            let provider = GatedProvider::new(vec![running_task("a", "open question")], vec![]);
            let engine = Engine::new(provider.clone(), RecordingView::new(), manual_config());
            engine.initialize().await.unwrap();
            assert_eq!(engine.find_running(), Some(TaskId::new("a")));

            engine
                .answer_task(&TaskId::new("a"), Some("resolved: see memo"))
                .await
                .unwrap();

            // Nothing runs afterwards, locally or in the store, and a
            // later refresh cannot resurrect the stamps.
            assert_eq!(engine.find_running(), None);
            let a = engine.task(&TaskId::new("a")).unwrap();
            assert_eq!(a.status, Status::Answered);
            assert!(a.run_start.is_none() && a.run_end.is_none());
            let stored = provider.stored(&TaskId::new("a")).unwrap();
            assert!(stored.run_start.is_none() && stored.run_end.is_none());

            tokio::time::advance(Duration::from_secs(31)).await;
            engine.refresh_now().await.unwrap();
            assert_eq!(engine.find_running(), None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn stopping_and_finishing_clear_both_run_stamps() {
    LocalSet::new()
        .run_until(async {
            let provider = GatedProvider::new(vec![running_task("a", "one")], vec![]);
            let engine = Engine::new(provider.clone(), RecordingView::new(), manual_config());
            engine.initialize().await.unwrap();

            engine.stop_task(&TaskId::new("a")).await.unwrap();
            let a = engine.task(&TaskId::new("a")).unwrap();
            assert!(a.run_start.is_none() && a.run_end.is_none());

            engine.start_task(&TaskId::new("a")).await.unwrap();
            assert_eq!(engine.find_running(), Some(TaskId::new("a")));

            engine.finish_task(&TaskId::new("a")).await.unwrap();
            let a = engine.task(&TaskId::new("a")).unwrap();
            assert_eq!(a.status, Status::Done);
            assert!(a.run_start.is_none() && a.run_end.is_none());
            assert_eq!(engine.find_running(), None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn first_load_trusts_server_running_flags() {
    LocalSet::new()
        .run_until(async {
            let provider = GatedProvider::new(vec![running_task("y", "current")], vec![]);
            let engine = Engine::new(provider.clone(), RecordingView::new(), manual_config());
            engine.initialize().await.unwrap();
            assert_eq!(engine.find_running(), Some(TaskId::new("y")));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn idle_client_clears_foreign_running_flags_on_refresh() {
    LocalSet::new()
        .run_until(async {
            let provider = std::rc::Rc::new(MemoryProvider::new(
                vec![task("a", "calm", Status::NotStarted)],
                vec![],
            ));
            let engine = Engine::new(
                std::rc::Rc::clone(&provider),
                RecordingView::new(),
                manual_config(),
            );
            engine.initialize().await.unwrap();
            assert_eq!(engine.find_running(), None);

            // Another device starts "a" behind our back.
            provider
                .start_task(&TaskId::new("a"), None, None)
                .await
                .unwrap();

            // Next refresh past the freshness window sees the foreign
            // flag and clears it: running state re-enters only through
            // a local start.
            tokio::time::advance(Duration::from_secs(31)).await;
            engine.refresh_now().await.unwrap();
            assert_eq!(engine.find_running(), None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn local_running_belief_survives_a_stale_snapshot() {
    LocalSet::new()
        .run_until(async {
            let provider = std::rc::Rc::new(MemoryProvider::new(
                vec![
                    task("x", "mine", Status::NotStarted),
                    task("y", "other", Status::NotStarted),
                ],
                vec![],
            ));
            let engine = Engine::new(
                std::rc::Rc::clone(&provider),
                RecordingView::new(),
                manual_config(),
            );
            engine.initialize().await.unwrap();
            engine.start_task(&TaskId::new("x")).await.unwrap();
            assert_eq!(engine.find_running(), Some(TaskId::new("x")));

            // A snapshot claiming "y" runs (taken mid-transition
            // elsewhere) must not displace the local belief.
            provider
                .start_task(&TaskId::new("y"), None, None)
                .await
                .unwrap();
            tokio::time::advance(Duration::from_secs(31)).await;
            engine.refresh_now().await.unwrap();

            assert_eq!(engine.find_running(), Some(TaskId::new("x")));
            let running: Vec<_> = engine
                .tasks()
                .into_iter()
                .filter(taskdeck_core::Task::is_running)
                .collect();
            assert_eq!(running.len(), 1);
        })
        .await;
}
