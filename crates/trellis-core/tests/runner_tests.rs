use futures::future::{ready, Ready};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::time::sleep;

use trellis_core::assert;
use trellis_core::report::{Collector, Event, EventKind, Speed};
use trellis_core::{ConfigError, Failure, Limit, RunError, Suite, TestContext, TestResult};

type Log = Arc<Mutex<Vec<&'static str>>>;

async fn pass(_: TestContext) -> TestResult {
    Ok(())
}

fn step(log: &Log, label: &'static str) -> impl Fn(TestContext) -> Ready<TestResult> + Send + Sync {
    let log = log.clone();
    move |_| {
        log.lock().push(label);
        ready(Ok(()))
    }
}

fn collected() -> (Suite, Collector) {
    let suite = Suite::new();
    let collector = Collector::new();
    suite.use_reporter(collector.clone()).unwrap();
    (suite, collector)
}

#[tokio::test(start_paused = true)]
async fn test_slow_threshold_is_inherited() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.group("outer", |t| {
                t.set_slow(Limit::Millis(50))?;
                t.test("inner", |_| async {
                    sleep(Duration::from_millis(60)).await;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    let summary = suite.run().await.unwrap();

    let events = collector.events();
    let pass = events
        .iter()
        .find(|e| e.kind() == EventKind::Pass)
        .unwrap();
    let data = pass.timing().unwrap();
    assert_eq!(data.slow, Limit::Millis(50));
    assert!(data.duration >= Duration::from_millis(60));
    assert!(data.duration < Duration::from_millis(75));
    assert_eq!(data.speed(), Speed::Slow);
    assert_eq!(summary.slow, 1);
}

#[tokio::test]
async fn test_event_framing() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.group("outer", |t| {
                t.test("a", pass)?;
                t.group("inner", |t| {
                    t.test("b", pass)?;
                    Ok(())
                })?;
                Ok(())
            })?;
            t.test("c", pass)?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec![
            "start",
            "enter outer",
            "pass outer > a",
            "enter outer > inner",
            "pass outer > inner > b",
            "leave outer > inner",
            "leave outer",
            "pass c",
            "end",
        ]
    );
}

#[tokio::test]
async fn test_fail_then_extra_signals() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.test_callback("flaky", |_, done| {
                done.fail("boom");
                done.pass();
                done.fail("again");
            })?;
            Ok(())
        })
        .unwrap();

    let summary = suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec!["start", "fail flaky", "extra flaky", "extra flaky", "end"]
    );
    let events = collector.events();
    let Event::Extra { value: first, .. } = &events[2] else {
        panic!("expected extra, got {:?}", events[2]);
    };
    assert_eq!(first.count, 2);
    assert!(first.value.is_none());
    let Event::Extra { value: second, .. } = &events[3] else {
        panic!("expected extra, got {:?}", events[3]);
    };
    assert_eq!(second.count, 3);
    assert_eq!(second.value.as_ref().unwrap().to_string(), "again");
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.extras, 2);
}

#[tokio::test]
async fn test_only_selects_matching_subtree() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.only(["outer"])?;
            t.group("outer", |t| {
                t.test("inner", pass)?;
                t.group("deeper", |t| {
                    t.test("leaf", pass)?;
                    Ok(())
                })?;
                Ok(())
            })?;
            t.test("other", pass)?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec![
            "start",
            "enter outer",
            "pass outer > inner",
            "enter outer > deeper",
            "pass outer > deeper > leaf",
            "leave outer > deeper",
            "leave outer",
            "skip other",
            "end",
        ]
    );
}

#[tokio::test]
async fn test_only_with_pattern_and_several_paths() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.only([regex::Regex::new("^keep").unwrap()])?;
            t.only(["exact"])?;
            t.test("keep-1", pass)?;
            t.test("drop", pass)?;
            t.test("exact", pass)?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec!["start", "pass keep-1", "skip drop", "pass exact", "end"]
    );
}

#[tokio::test]
async fn test_nested_only_narrows_selection() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.only(["a"])?;
            t.group("a", |t| {
                t.only(["y"])?;
                t.test("x", pass)?;
                t.test("y", pass)?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec!["start", "enter a", "skip a > x", "pass a > y", "leave a", "end"]
    );
}

#[tokio::test]
async fn test_second_run_is_rejected() {
    let (suite, collector) = collected();
    let (started_tx, started_rx) = oneshot::channel::<()>();
    let started_tx = Arc::new(Mutex::new(Some(started_tx)));
    let release = Arc::new(Notify::new());

    {
        let release = release.clone();
        suite
            .declare(move |t| {
                t.test("blocker", move |_| {
                    let started = started_tx.lock().take();
                    let release = release.clone();
                    async move {
                        if let Some(tx) = started {
                            let _ = tx.send(());
                        }
                        release.notified().await;
                        Ok(())
                    }
                })?;
                Ok(())
            })
            .unwrap();
    }

    let handle = tokio::spawn({
        let suite = suite.clone();
        async move { suite.run().await }
    });
    started_rx.await.unwrap();

    assert!(suite.is_running());
    assert!(matches!(suite.run().await, Err(RunError::Concurrency)));
    assert!(matches!(suite.declare(|_| Ok(())), Err(ConfigError::Locked)));

    release.notify_one();
    let summary = handle.await.unwrap().unwrap();
    assert_eq!(summary.passed, 1);
    assert!(!suite.is_running());

    let starts = collector
        .kinds()
        .into_iter()
        .filter(|k| *k == EventKind::Start)
        .count();
    assert_eq!(starts, 1);
}

#[tokio::test]
async fn test_rerun_yields_identical_structure() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.group("g", |t| {
                t.test("ok", pass)?;
                t.test("bad", |_| async {
                    assert::equal(1, 2)?;
                    Ok(())
                })?;
                Ok(())
            })?;
            t.test_skip("skipped", pass)?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();
    let first = collector.outline();
    collector.take();
    suite.run().await.unwrap();
    let second = collector.outline();

    assert_eq!(first, second);
    assert!(suite.has_reporter());
}

#[tokio::test]
async fn test_hook_order() {
    let (suite, _collector) = collected();
    let log: Log = Arc::default();
    suite
        .declare(|t| {
            t.before_all(step(&log, "root before_all"))?;
            t.after_all(step(&log, "root after_all"))?;
            t.group("outer", |t| {
                t.before(step(&log, "outer before"))?;
                t.after(step(&log, "outer after"))?;
                t.group("inner", |t| {
                    t.before(step(&log, "inner before"))?;
                    t.after(step(&log, "inner after"))?;
                    t.test("body", step(&log, "body"))?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        *log.lock(),
        vec![
            "root before_all",
            "outer before",
            "inner before",
            "body",
            "inner after",
            "outer after",
            "root after_all",
        ]
    );
}

#[tokio::test]
async fn test_hook_failure_fails_the_test() {
    let (suite, collector) = collected();
    let log: Log = Arc::default();
    suite
        .declare(|t| {
            t.before(|_| async { Err(Failure::message("setup broke")) })?;
            t.after(step(&log, "cleanup"))?;
            t.test("guarded", step(&log, "body"))?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(collector.outline(), vec!["start", "fail guarded", "end"]);
    assert_eq!(*log.lock(), vec!["cleanup"]);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_then_late_extra() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.group("g", |t| {
                t.set_timeout(Limit::Millis(50))?;
                t.test("slowpoke", |_| async {
                    sleep(Duration::from_millis(100)).await;
                    Ok(())
                })?;
                Ok(())
            })?;
            t.test("waiter", |_| async {
                sleep(Duration::from_millis(100)).await;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec![
            "start",
            "enter g",
            "fail g > slowpoke",
            "leave g",
            "pass waiter",
            "extra g > slowpoke",
            "end",
        ]
    );
    let events = collector.events();
    let failure = events[2].failure().unwrap();
    assert!(failure.is_timeout());
    assert_eq!(failure.to_string(), "Timeout of 50ms reached");
    let Event::Extra { value, .. } = &events[5] else {
        panic!("expected extra, got {:?}", events[5]);
    };
    assert_eq!(value.count, 1);
    assert!(value.value.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_body_can_change_its_own_timeout() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.test("impatient", |cx| async move {
                cx.set_timeout(Limit::Millis(10))?;
                sleep(Duration::from_millis(50)).await;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    let events = collector.events();
    let failure = events[1].failure().unwrap();
    assert!(matches!(failure, Failure::Timeout(d) if *d == Duration::from_millis(10)));
}

#[tokio::test(start_paused = true)]
async fn test_unlimited_timeout_waits() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.set_timeout(Limit::Unlimited)?;
            t.test("long", |_| async {
                sleep(Duration::from_secs(10)).await;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(collector.outline(), vec!["start", "pass long", "end"]);
}

#[tokio::test]
async fn test_panics_are_isolated() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.test("async panic", |_| async { panic!("kaboom") })?;
            t.test_callback("callback panic", |_, _done| panic!("splat"))?;
            t.test("survivor", pass)?;
            Ok(())
        })
        .unwrap();

    let summary = suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec![
            "start",
            "fail async panic",
            "fail callback panic",
            "pass survivor",
            "end",
        ]
    );
    let events = collector.events();
    assert!(matches!(events[1].failure(), Some(Failure::Panic(msg)) if msg == "kaboom"));
    assert!(matches!(events[2].failure(), Some(Failure::Panic(msg)) if msg == "splat"));
    assert!(!summary.is_success());
}

#[tokio::test]
async fn test_dropped_done_fails() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.test_callback("forgotten", |_, done| drop(done))?;
            t.test_callback("deferred", |_, done| {
                tokio::spawn(async move { done.pass() });
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec!["start", "fail forgotten", "pass deferred", "end"]
    );
    let events = collector.events();
    assert!(matches!(events[1].failure(), Some(Failure::Dropped)));
}

#[tokio::test]
async fn test_skipped_nodes_run_nothing() {
    let (suite, collector) = collected();
    let log: Log = Arc::default();
    suite
        .declare(|t| {
            t.group_skip("wip", |t| {
                t.before_all(step(&log, "wip before_all"))?;
                t.before(step(&log, "wip before"))?;
                t.test("a", step(&log, "a"))?;
                Ok(())
            })?;
            t.test_skip("later", step(&log, "later"))?;
            Ok(())
        })
        .unwrap();

    let summary = suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec!["start", "enter wip", "skip wip > a", "leave wip", "skip later", "end"]
    );
    assert!(log.lock().is_empty());
    assert_eq!(summary.skipped, 2);
    assert!(summary.is_success());
}

#[tokio::test]
async fn test_before_all_failure_skips_children() {
    let (suite, collector) = collected();
    let log: Log = Arc::default();
    suite
        .declare(|t| {
            t.group("g", |t| {
                t.before_all(|_| async { Err(Failure::message("no database")) })?;
                t.after_all(step(&log, "after_all"))?;
                t.test("a", step(&log, "a"))?;
                t.test("b", step(&log, "b"))?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec![
            "start",
            "enter g",
            "fail g",
            "skip g > a",
            "skip g > b",
            "leave g",
            "end",
        ]
    );
    assert_eq!(*log.lock(), vec!["after_all"]);
}

#[tokio::test]
async fn test_after_all_failure_is_reported_on_group() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.after_all(|_| async { Err(Failure::message("root teardown")) })?;
            t.group("g", |t| {
                t.after_all(|_| async { Err(Failure::message("teardown")) })?;
                t.test("a", pass)?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    let summary = suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec!["start", "enter g", "pass g > a", "fail g", "leave g", "error", "end"]
    );
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.hook_failures, 1);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.total(), 1);
    assert!(!summary.is_success());
}

#[tokio::test]
async fn test_after_all_failure_keeps_failed_child_result() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.group("g", |t| {
                t.after_all(|_| async { Err(Failure::message("teardown")) })?;
                t.test("a", |_| async { Err(Failure::message("broken")) })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    let summary = suite.run().await.unwrap();

    assert_eq!(
        collector.outline(),
        vec!["start", "enter g", "fail g > a", "fail g", "leave g", "end"]
    );
    let events = collector.events();
    assert_eq!(events[2].failure().unwrap().to_string(), "broken");
    assert_eq!(events[3].failure().unwrap().to_string(), "teardown");
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.hook_failures, 1);
}

#[tokio::test]
async fn test_assertion_failure_payload() {
    let (suite, collector) = collected();
    suite
        .declare(|t| {
            t.test("math", |_| async {
                assert::deep_equal(
                    trellis_core::Value::array([1, 2]),
                    trellis_core::Value::array([2, 1]),
                )?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();

    suite.run().await.unwrap();

    let events = collector.events();
    let assertion = events[1].failure().unwrap().as_assertion().unwrap();
    assert_eq!(assertion.message, "Expected [1, 2] to deeply equal [2, 1]");

    let json = serde_json::to_value(&events[1]).unwrap();
    assert_eq!(json["type"], "fail");
    assert_eq!(json["value"]["kind"], "assertion");
    assert_eq!(json["path"][0]["name"], "math");
}

#[tokio::test]
async fn test_runs_without_reporter() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("trellis_core=debug")
        .with_test_writer()
        .try_init();

    let suite = Suite::new();
    suite
        .declare(|t| {
            t.test("a", pass)?;
            t.test("b", |_| async { Err("nope".into()) })?;
            Ok(())
        })
        .unwrap();

    let summary = suite.run().await.unwrap();
    assert_eq!(summary.total(), 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);
    assert!(!suite.has_reporter());
}
