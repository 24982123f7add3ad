use std::{
    fs::File,
    path::Path,
    sync::{Arc, Mutex},
    time::{Duration, Instant, SystemTime},
};

use binder_core::metrics::{MetricsBackend, ResolutionOutcome, ScriptOutcome, SelectionOutcome};
use binder_script::{
    EngineRouter, ExecutionError, ManagedScript, ScriptArguments, ScriptError, ScriptProperties,
    ScriptStatus,
};
use serde_json::{Value, json};

#[derive(Default)]
struct Recorder {
    loads: Mutex<Vec<ScriptOutcome>>,
    evaluations: Mutex<Vec<ScriptOutcome>>,
}

impl MetricsBackend for Recorder {
    fn record_resolution(&self, _: ResolutionOutcome, _: u64) {}

    fn record_selection(&self, _: &str, _: SelectionOutcome) {}

    fn record_script_load(&self, _: &str, outcome: ScriptOutcome, _: u64) {
        self.loads.lock().unwrap().push(outcome);
    }

    fn record_script_evaluation(&self, _: &str, outcome: ScriptOutcome, _: u64) {
        self.evaluations.lock().unwrap().push(outcome);
    }
}

fn write(path: &Path, text: &str) {
    std::fs::write(path, text).unwrap();
}

/// Push the mtime forward so coarse filesystem clocks still register a change.
fn touch_forward(path: &Path, secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}

fn script(path: &Path, props: impl FnOnce(ScriptProperties) -> ScriptProperties) -> ManagedScript {
    let props = props(ScriptProperties::enabled(path.display().to_string()));
    ManagedScript::new("test", props, EngineRouter::with_defaults())
}

fn args(v: Value) -> ScriptArguments {
    match v {
        Value::Object(m) => m,
        _ => panic!("object expected"),
    }
}

#[tokio::test]
async fn evaluate_before_load_is_not_configured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, r#"fn select(ctx) { "x" }"#);

    let s = script(&path, |p| p);
    assert_eq!(s.status(), ScriptStatus::Unconfigured);
    assert!(!s.is_ready_to_evaluate());

    let err = s.evaluate(ScriptArguments::new()).await.unwrap_err();
    assert!(matches!(err, ScriptError::NotConfigured(_)), "{err:?}");
}

#[tokio::test]
async fn disabled_script_never_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, r#"fn select(ctx) { "x" }"#);

    let mut props = ScriptProperties::enabled(path.display().to_string());
    props.enabled = false;
    let s = ManagedScript::new("test", props, EngineRouter::with_defaults());

    s.warm_up();
    assert!(matches!(s.load_now().await, Err(ScriptError::NotConfigured(_))));
    assert_eq!(s.status(), ScriptStatus::Unconfigured);
}

#[tokio::test]
async fn loads_and_evaluates_rhai() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, r#"fn select(ctx) { ctx.clusters[0] }"#);

    let s = script(&path, |p| p);
    s.load_now().await.unwrap();
    assert_eq!(s.status(), ScriptStatus::Ready);

    let out = s
        .evaluate(args(json!({ "clusters": ["a", "b"] })))
        .await
        .unwrap();
    assert_eq!(out, json!("a"));
}

#[tokio::test]
async fn warm_up_loads_in_background() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    write(&path, r#"{ "fallback": { "select": "x" } }"#);

    let s = script(&path, |p| p);
    s.warm_up();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !s.is_ready_to_evaluate() {
        assert!(Instant::now() < deadline, "script never became ready");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let out = s.evaluate(ScriptArguments::new()).await.unwrap();
    assert_eq!(out["resource"], "x");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timeout_is_an_execution_error_within_bounded_slack() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slow.rhai");
    write(&path, "fn select(ctx) { loop { } }");

    let metrics = Arc::new(Recorder::default());
    let s = script(&path, |p| p.with_timeout_ms(200).with_max_operations(0))
        .with_metrics(metrics.clone());
    s.load_now().await.unwrap();

    let started = Instant::now();
    let err = s.evaluate(ScriptArguments::new()).await.unwrap_err();
    let elapsed = started.elapsed();

    match err {
        ScriptError::Execution {
            source: ExecutionError::Timeout(t),
            ..
        } => assert_eq!(t, Duration::from_millis(200)),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(200) + Duration::from_secs(2), "{elapsed:?}");
    assert_eq!(
        metrics.evaluations.lock().unwrap().as_slice(),
        &[ScriptOutcome::Timeout]
    );
}

#[tokio::test]
async fn raised_error_is_an_execution_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("throw.rhai");
    write(&path, r#"fn select(ctx) { throw "bad input"; }"#);

    let s = script(&path, |p| p);
    s.load_now().await.unwrap();
    let err = s.evaluate(ScriptArguments::new()).await.unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Execution {
            source: ExecutionError::Raised(_),
            ..
        }
    ));
}

#[tokio::test]
async fn invalid_reload_keeps_last_known_good() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, r#"fn select(ctx) { "old" }"#);

    let metrics = Arc::new(Recorder::default());
    let s = script(&path, |p| p).with_metrics(metrics.clone());
    s.load_now().await.unwrap();

    write(&path, "fn select(ctx) { this is not rhai");
    touch_forward(&path, 5);
    let err = s.load_now().await.unwrap_err();
    assert!(matches!(err, ScriptError::Loading { .. }), "{err:?}");

    assert!(s.is_ready_to_evaluate());
    assert_eq!(s.status(), ScriptStatus::Ready);
    assert_eq!(s.evaluate(ScriptArguments::new()).await.unwrap(), json!("old"));
    assert_eq!(
        metrics.loads.lock().unwrap().as_slice(),
        &[ScriptOutcome::Success, ScriptOutcome::Failure]
    );
}

#[tokio::test]
async fn first_load_failure_marks_failed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, "fn not_the_entry_point(ctx) { () }");

    let s = script(&path, |p| p);
    assert!(s.load_now().await.is_err());
    assert_eq!(s.status(), ScriptStatus::Failed);
    assert!(matches!(
        s.evaluate(ScriptArguments::new()).await,
        Err(ScriptError::NotConfigured(_))
    ));
}

#[tokio::test]
async fn unknown_or_missing_extension_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["s.groovy", "selector"] {
        let path = dir.path().join(name);
        write(&path, "whatever");
        let s = script(&path, |p| p);
        assert!(matches!(s.load_now().await, Err(ScriptError::Loading { .. })));
    }
}

#[tokio::test]
async fn unchanged_content_is_not_recompiled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, r#"fn select(ctx) { "same" }"#);

    let metrics = Arc::new(Recorder::default());
    let s = script(&path, |p| p).with_metrics(metrics.clone());
    s.load_now().await.unwrap();
    touch_forward(&path, 5);
    s.load_now().await.unwrap();

    assert_eq!(metrics.loads.lock().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refresh_loop_picks_up_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, r#"fn select(ctx) { "v1" }"#);

    let s = script(&path, |p| p.with_refresh_interval_ms(25));
    s.start_refresh();

    let wait_for = |expected: &'static str| {
        let s = s.clone();
        async move {
            let deadline = Instant::now() + Duration::from_secs(5);
            loop {
                if let Ok(v) = s.evaluate(ScriptArguments::new()).await {
                    if v == json!(expected) {
                        return;
                    }
                }
                assert!(Instant::now() < deadline, "never observed {expected}");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    };

    wait_for("v1").await;
    write(&path, r#"fn select(ctx) { "v2" }"#);
    touch_forward(&path, 5);
    wait_for("v2").await;

    s.shutdown().await;
    assert!(!s.is_ready_to_evaluate());
    assert_eq!(s.status(), ScriptStatus::Unconfigured);
    assert!(matches!(
        s.evaluate(ScriptArguments::new()).await,
        Err(ScriptError::NotConfigured(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_is_not_undone_by_in_flight_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.rhai");
    let mut text: String = (0..20_000)
        .map(|i| format!("fn helper_{i}(x) {{ x + {i} }}\n"))
        .collect();
    text.push_str(r#"fn select(ctx) { "x" }"#);
    write(&path, &text);

    let s = script(&path, |p| p);
    let loading = tokio::spawn({
        let s = s.clone();
        async move { s.load_now().await }
    });
    tokio::time::sleep(Duration::from_millis(30)).await;
    s.shutdown().await;

    let _ = loading.await.unwrap();
    assert!(!s.is_ready_to_evaluate());
    assert_eq!(s.status(), ScriptStatus::Unconfigured);

    assert!(matches!(s.load_now().await, Err(ScriptError::NotConfigured(_))));
    assert!(!s.is_ready_to_evaluate());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn evaluations_see_old_or_new_script_during_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.rhai");
    write(&path, r#"fn select(ctx) { "v1" }"#);

    let s = script(&path, |p| p);
    s.load_now().await.unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let s = s.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..200 {
                    let out = s.evaluate(ScriptArguments::new()).await.unwrap();
                    seen.push(out);
                    tokio::task::yield_now().await;
                }
                seen
            })
        })
        .collect();

    for round in 0..5 {
        let version = if round % 2 == 0 { "v2" } else { "v1" };
        write(&path, &format!(r#"fn select(ctx) {{ "{version}" }}"#));
        s.load_now().await.unwrap();
        assert!(s.is_ready_to_evaluate());
    }

    for reader in readers {
        for out in reader.await.unwrap() {
            assert!(out == json!("v1") || out == json!("v2"), "unexpected {out}");
        }
    }
    // last round (4) published v2
    assert_eq!(s.evaluate(ScriptArguments::new()).await.unwrap(), json!("v2"));
}

#[tokio::test]
async fn bundled_scripts_load() {
    let props = ScriptProperties::enabled("bundled:first-candidate.rhai");
    let s = ManagedScript::new("bundled", props, EngineRouter::with_defaults());
    s.load_now().await.unwrap();

    let out = s
        .evaluate(args(json!({ "clusters": [ { "id": "c1" }, { "id": "c2" } ] })))
        .await
        .unwrap();
    assert_eq!(out["resource"]["id"], "c1");
    assert_eq!(out["rationale"], "first candidate");
}
