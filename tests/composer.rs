// tests/composer.rs

mod common;

use std::time::Duration;

use common::recording::{Recorder, RecordingTask};
use common::{init_tracing, with_timeout};
use minibuild::compose::{Composer, GraphExpr, parallel, series, task};
use minibuild::errors::BuildError;
use minibuild::task::TaskRegistry;
use proptest::prelude::*;

fn composer(tasks: Vec<RecordingTask>) -> Composer {
    let mut registry = TaskRegistry::new();
    for t in tasks {
        registry.register(t).unwrap();
    }
    Composer::new(registry)
}

#[tokio::test]
async fn series_runs_in_order() {
    init_tracing();
    let rec = Recorder::new();
    let c = Composer::new(rec.registry(&["a", "b", "c"]));

    let summary = with_timeout(c.execute(&series([task("a"), task("b"), task("c")])))
        .await
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(
        rec.events(),
        vec!["start:a", "end:a", "start:b", "end:b", "start:c", "end:c"]
    );
    assert_eq!(summary.completed, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn series_stops_after_failure() {
    init_tracing();
    let rec = Recorder::new();
    let c = composer(vec![rec.task("a").failing(), rec.task("b")]);

    let summary = c.execute(&series([task("a"), task("b")])).await.unwrap();

    assert!(!summary.is_success());
    assert_eq!(summary.failed_tasks(), vec!["a"]);
    assert_eq!(rec.started(), vec!["a"]);
}

#[tokio::test]
async fn parallel_awaits_siblings_of_a_failed_task() {
    init_tracing();
    let rec = Recorder::new();
    let c = composer(
        vec![
            rec.task("a").failing(),
            rec.task("b").delayed(Duration::from_millis(50)),
        ],
    );

    let summary = with_timeout(c.execute(&parallel([task("a"), task("b")])))
        .await
        .unwrap();

    assert_eq!(summary.failed_tasks(), vec!["a"]);
    assert_eq!(summary.completed, vec!["b"]);
    assert!(rec.finished().contains(&"b".to_string()));
}

#[tokio::test]
async fn parallel_collects_every_failure() {
    let rec = Recorder::new();
    let c = composer(
        vec![rec.task("a").failing(), rec.task("b").failing(), rec.task("c")],
    );

    let summary = c
        .execute(&parallel([task("a"), task("b"), task("c")]))
        .await
        .unwrap();

    let mut failed = summary.failed_tasks();
    failed.sort();
    assert_eq!(failed, vec!["a", "b"]);
    assert_eq!(summary.completed, vec!["c"]);
}

#[tokio::test]
async fn parallel_children_overlap() {
    let rec = Recorder::new();
    let c = composer(
        vec![
            rec.task("a").delayed(Duration::from_millis(50)),
            rec.task("b").delayed(Duration::from_millis(50)),
            rec.task("c").delayed(Duration::from_millis(50)),
        ],
    );

    with_timeout(c.execute(&parallel([task("a"), task("b"), task("c")])))
        .await
        .unwrap();

    assert_eq!(rec.max_concurrency(), 3);
}

#[tokio::test]
async fn failure_inside_nested_parallel_stops_outer_series() {
    init_tracing();
    let rec = Recorder::new();
    let c = composer(
        vec![
            rec.task("clean"),
            rec.task("style").failing(),
            rec.task("markup").delayed(Duration::from_millis(20)),
            rec.task("compile"),
        ],
    );
    let graph = series([
        task("clean"),
        parallel([task("style"), task("markup")]),
        task("compile"),
    ]);

    let summary = with_timeout(c.execute(&graph)).await.unwrap();

    assert_eq!(summary.failed_tasks(), vec!["style"]);
    let started = rec.started();
    assert!(started.contains(&"markup".to_string()));
    assert!(!started.contains(&"compile".to_string()));
    assert_eq!(summary.completed, vec!["clean", "markup"]);
}

#[tokio::test]
async fn fatal_error_rejects_after_siblings_settle() {
    init_tracing();
    let rec = Recorder::new();
    let c = composer(
        vec![
            rec.task("a").fatal(),
            rec.task("b").delayed(Duration::from_millis(30)),
            rec.task("after"),
        ],
    );
    let graph = series([parallel([task("a"), task("b")]), task("after")]);

    let err = with_timeout(c.execute(&graph)).await.unwrap_err();

    assert!(matches!(err, BuildError::Fatal(_)));
    assert!(rec.finished().contains(&"b".to_string()));
    assert!(!rec.started().contains(&"after".to_string()));
}

#[tokio::test]
async fn unknown_task_is_rejected_before_anything_runs() {
    let rec = Recorder::new();
    let c = Composer::new(rec.registry(&["a"]));

    let err = c.execute(&series([task("a"), task("nope")])).await.unwrap_err();

    assert!(matches!(err, BuildError::TaskNotFound(ref n) if n.contains("nope")));
    assert!(rec.events().is_empty());
}

#[tokio::test]
async fn re_execution_repeats_every_task() {
    let rec = Recorder::new();
    let c = Composer::new(rec.registry(&["a", "b"]));
    let graph: GraphExpr = "series(a, parallel(b))".parse().unwrap();

    c.execute(&graph).await.unwrap();
    let first = rec.started();
    rec.clear();
    c.execute(&graph).await.unwrap();

    assert_eq!(first, rec.started());
}

#[tokio::test]
async fn slow_task_times_out_as_ordinary_failure() {
    init_tracing();
    let rec = Recorder::new();
    let c = composer(
        vec![rec.task("slow").delayed(Duration::from_secs(30)), rec.task("fast")],
    )
    .with_task_timeout(Some(Duration::from_millis(50)));

    let summary = with_timeout(c.execute(&parallel([task("slow"), task("fast")])))
        .await
        .unwrap();

    assert_eq!(summary.failed_tasks(), vec!["slow"]);
    assert!(summary.failures[0].message.contains("did not settle"));
    assert_eq!(summary.completed, vec!["fast"]);
}

/// A flat series of tasks where `fail_at` (if in range) fails.
fn series_case() -> impl Strategy<Value = (usize, usize)> {
    (1usize..8).prop_flat_map(|n| (Just(n), 0..n + 2))
}

proptest! {
    #[test]
    fn series_never_runs_past_a_failure((n, fail_at) in series_case()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let rec = Recorder::new();
        let names: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();

        let mut registry = TaskRegistry::new();
        for (i, name) in names.iter().enumerate() {
            let t = rec.task(name);
            registry.register(if i == fail_at { t.failing() } else { t }).unwrap();
        }
        let c = Composer::new(registry);
        let graph = series(names.iter().map(|n| task(n.as_str())));

        let summary = runtime.block_on(c.execute(&graph)).unwrap();

        let expected_runs = if fail_at < n { fail_at + 1 } else { n };
        prop_assert_eq!(rec.started(), names[..expected_runs].to_vec());
        prop_assert_eq!(summary.is_success(), fail_at >= n);
    }

    #[test]
    fn parallel_always_runs_every_child(n in 1usize..8, failing in proptest::collection::vec(any::<bool>(), 8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let rec = Recorder::new();
        let names: Vec<String> = (0..n).map(|i| format!("t{i}")).collect();

        let mut registry = TaskRegistry::new();
        for (i, name) in names.iter().enumerate() {
            let t = rec.task(name);
            registry.register(if failing[i] { t.failing() } else { t }).unwrap();
        }
        let c = Composer::new(registry);
        let graph = parallel(names.iter().map(|n| task(n.as_str())));

        let summary = runtime.block_on(c.execute(&graph)).unwrap();

        let mut finished = rec.finished();
        finished.sort();
        let mut expected = names.clone();
        expected.sort();
        prop_assert_eq!(finished, expected);
        prop_assert_eq!(summary.failures.len(), failing[..n].iter().filter(|f| **f).count());
    }
}
