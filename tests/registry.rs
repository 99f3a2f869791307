use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use taskgate::{
    Config, Event, EventKind, Handler, Kind, Registry, RegistryError, Subscribe, UnitState, Value,
};

/// Handler that records how many copies of itself run at once.
fn tracked_sleeper(current: Arc<AtomicUsize>, peak: Arc<AtomicUsize>) -> Handler {
    Handler::from_async([Kind::Str], [Kind::Str], move |args| {
        let current = Arc::clone(&current);
        let peak = Arc::clone(&peak);
        async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            args
        }
    })
}

#[tokio::test]
async fn duplicate_names_are_rejected_and_not_counted() {
    let reg = Registry::new(Config::default());
    let h = Handler::func(|| 1i64);

    reg.submit("a", h.clone(), None, Vec::new()).await.unwrap();
    let err = reg.submit("a", h.clone(), None, Vec::new()).await.unwrap_err();
    assert_eq!(err, RegistryError::DuplicateName { name: "a".into() });

    reg.submit("b", h, None, Vec::new()).await.unwrap();
    assert_eq!(reg.total().await, 2);
    assert_eq!(reg.remaining().await, 2);
}

#[tokio::test]
async fn invalid_submissions_never_enter_the_registry() {
    let reg = Registry::new(Config::default());

    let err = reg
        .submit("x", Value::from(5i64), None, Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "invoke_invalid_callable");

    let err = reg
        .submit("y", Handler::func(|n: i64| n), None, vec![Value::from("1")])
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "invoke_type_mismatch");

    let err = reg
        .submit("z", Handler::func(|n: i64| n), None, Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "invoke_arity_mismatch");

    assert_eq!(reg.total().await, 0);
    assert_eq!(reg.run(1).await.err(), Some(RegistryError::Empty));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_unit_gets_one_result_and_ends_done() {
    let reg = Registry::new(Config::default());
    let echo = Handler::func(|s: String| s);

    for name in ["a", "b", "c"] {
        reg.submit(name, echo.clone(), None, vec![Value::from(name)])
            .await
            .unwrap();
    }

    let handle = reg.run(2).await.unwrap();
    let results = tokio::time::timeout(Duration::from_secs(2), handle.results())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(results.len(), 3);
    for name in ["a", "b", "c"] {
        assert_eq!(results[name], vec![Value::from(name)]);
        assert_eq!(reg.status(name).await.unwrap().state, UnitState::Done);
    }
    assert_eq!(reg.remaining().await, 0);
    assert_eq!(reg.running().await, 0);
    assert_eq!(reg.result("b").await, Some(vec![Value::from("b")]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_return_shapes_round_trip() {
    let reg = Registry::new(Config::default());
    reg.submit("a", Handler::func(|| (1i64,)), None, Vec::new())
        .await
        .unwrap();
    reg.submit(
        "b",
        Handler::func(|| (String::from("x"), String::from("y"))),
        None,
        Vec::new(),
    )
    .await
    .unwrap();
    reg.submit("c", Handler::func(|| ()), None, Vec::new())
        .await
        .unwrap();

    let results = reg.run(2).await.unwrap().results().await.unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results["a"], vec![Value::from(1i64)]);
    assert_eq!(results["b"], vec![Value::from("x"), Value::from("y")]);
    assert!(results["c"].is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallelism_never_exceeds_the_limit() {
    let reg = Registry::new(Config::default());
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let h = tracked_sleeper(Arc::clone(&current), Arc::clone(&peak));

    for i in 0..8 {
        let name = format!("unit-{i}");
        reg.submit(name.as_str(), h.clone(), None, vec![Value::from(name.clone())])
            .await
            .unwrap();
    }

    let results = reg.run(2).await.unwrap().results().await.unwrap();
    assert_eq!(results.len(), 8);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert!(peak.load(Ordering::SeqCst) >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wait_returns_once_everything_completed() {
    let reg = Registry::new(Config::default());
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let h = tracked_sleeper(current, peak);

    reg.submit("a", h.clone(), None, vec![Value::from("a")])
        .await
        .unwrap();
    reg.submit("b", h, None, vec![Value::from("b")]).await.unwrap();

    let _handle = reg.run(0).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), reg.wait())
        .await
        .unwrap();

    assert_eq!(reg.results().await.len(), 2);
    let lines = reg.status_lines().await;
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("a, done, "));
    assert!(!lines[0].ends_with(", 0"));
}

#[tokio::test]
async fn post_handler_sees_outputs_when_counts_match() {
    let reg = Registry::new(Config::default());
    let seen = Arc::new(AtomicUsize::new(0));

    let s = Arc::clone(&seen);
    let post = Handler::func(move |n: i64| {
        s.fetch_add(n as usize, Ordering::SeqCst);
    });
    let s = Arc::clone(&seen);
    let mismatched = Handler::func(move |_a: i64, _b: i64| {
        s.fetch_add(1000, Ordering::SeqCst);
    });

    reg.submit("one", Handler::func(|| 5i64), Some(post.into()), Vec::new())
        .await
        .unwrap();
    reg.submit(
        "two",
        Handler::func(|| 7i64),
        Some(mismatched.into()),
        Vec::new(),
    )
    .await
    .unwrap();

    let results = reg.run(2).await.unwrap().results().await.unwrap();
    assert_eq!(results["one"], vec![Value::from(5i64)]);
    assert_eq!(results["two"], vec![Value::from(7i64)]);
    assert_eq!(seen.load(Ordering::SeqCst), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn busy_while_a_run_is_in_flight() {
    let reg = Registry::new(Config::default());
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let gate = Arc::new(tokio::sync::Mutex::new(Some(rx)));

    let blocker = Handler::from_async(Vec::<Kind>::new(), Vec::<Kind>::new(), move |_| {
        let gate = Arc::clone(&gate);
        async move {
            if let Some(rx) = gate.lock().await.take() {
                let _ = rx.await;
            }
            Vec::new()
        }
    });
    reg.submit("slow", blocker, None, Vec::new()).await.unwrap();
    let handle = reg.run(1).await.unwrap();

    reg.submit("late", Handler::func(|| ()), None, Vec::new())
        .await
        .unwrap();
    assert_eq!(reg.run(1).await.err(), Some(RegistryError::Busy));
    assert_eq!(reg.reset().await, Err(RegistryError::Busy));

    tx.send(()).unwrap();
    let first = handle.results().await.unwrap();
    assert!(first.contains_key("slow"));
    assert!(!first.contains_key("late"));

    // Units added during the first run are picked up by the next one.
    let second = reg.run(1).await.unwrap().results().await.unwrap();
    assert!(second.contains_key("late"));
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn failing_handler_records_an_empty_result() {
    let reg = Registry::new(Config::default());
    let bad = Handler::from_async(Vec::<Kind>::new(), [Kind::Int], |_| async {
        vec![Value::from("not an int")]
    });
    reg.submit("bad", bad, None, Vec::new()).await.unwrap();

    let results = reg.run(1).await.unwrap().results().await.unwrap();
    assert_eq!(results["bad"], Vec::<Value>::new());
    assert_eq!(reg.status("bad").await.unwrap().state, UnitState::Done);
}

struct Recorder(Arc<std::sync::Mutex<Vec<EventKind>>>);

#[async_trait::async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        if let Some("solo") = ev.task.as_deref() {
            self.0.lock().unwrap().push(ev.kind);
        }
    }
}

#[tokio::test]
async fn subscribers_observe_the_unit_lifecycle() {
    let kinds = Arc::new(std::sync::Mutex::new(Vec::new()));
    let reg = Registry::builder(Config::default())
        .with_subscribers(vec![Arc::new(Recorder(Arc::clone(&kinds))) as Arc<dyn Subscribe>])
        .build();

    reg.submit("solo", Handler::func(|| true), None, Vec::new())
        .await
        .unwrap();
    reg.run(1).await.unwrap().results().await.unwrap();

    tokio::time::timeout(Duration::from_secs(1), async {
        while kinds.lock().unwrap().len() < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(
        *kinds.lock().unwrap(),
        vec![
            EventKind::UnitQueued,
            EventKind::UnitScheduled,
            EventKind::UnitStarting,
            EventKind::UnitFinished
        ]
    );
}
