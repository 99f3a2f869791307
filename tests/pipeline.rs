use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskgate::{
    BuilderState, Config, Event, EventKind, Executor, Handler, Kind, PipelineError, Subscribe,
    Value,
};

type Log = Arc<Mutex<Vec<String>>>;

fn stage1(log: &Log) -> Handler {
    let log = Arc::clone(log);
    Handler::func(move |n: i64| {
        log.lock().unwrap().push(format!("stage1({n})"));
        format!("2222-{n}")
    })
    .named("stage1")
}

fn stage2(log: &Log) -> Handler {
    let log = Arc::clone(log);
    Handler::func(move |s: String, n: i64| {
        log.lock().unwrap().push(format!("stage2({s},{n})"));
    })
    .named("stage2")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn outputs_then_bound_args_flow_through_stages() {
    let ex = Executor::new(Config::default());
    let log: Log = Arc::default();

    ex.init(Some("label"))
        .append(stage1(&log), vec![Value::from(1i64)])
        .append(stage2(&log), vec![Value::from(4i64)])
        .execute()
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(1), ex.join())
        .await
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["stage1(1)".to_owned(), "stage2(2222-1,4)".to_owned()]
    );
    assert_eq!(ex.gate().in_flight(), 0);
}

#[tokio::test]
async fn mismatch_is_stored_and_nothing_runs() {
    let ex = Executor::new(Config::default());
    let log: Log = Arc::default();

    let chain = ex
        .init(None)
        .append(stage1(&log), vec![Value::from(1i64)])
        .append(stage2(&log), Vec::new());
    assert_eq!(chain.state(), BuilderState::Failed);

    // Frozen: a valid stage after the failure is ignored.
    let chain = chain.append(Handler::func(|| ()), Vec::new());
    let err = chain.execute().await.unwrap_err();
    assert_eq!(
        err,
        PipelineError::ChainArityMismatch {
            stage: 1,
            outputs: 1,
            bound: 0,
            expected: 2
        }
    );

    ex.join().await;
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(ex.idle_builders(), 1);
}

#[tokio::test]
async fn first_stage_must_match_its_bound_args() {
    let ex = Executor::new(Config::default());
    let log: Log = Arc::default();

    let err = ex
        .init(None)
        .append(stage1(&log), vec![Value::from("one")])
        .execute()
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::SignatureMismatch {
            stage: 0,
            expected: vec![Kind::Int],
            actual: vec![Kind::Str]
        }
    );
}

#[tokio::test]
async fn kind_mismatch_names_the_position() {
    let ex = Executor::new(Config::default());
    let log: Log = Arc::default();

    let chain = ex
        .init(None)
        .append(stage1(&log), vec![Value::from(1i64)])
        .append(stage2(&log), vec![Value::from(true)]);
    assert_eq!(
        chain.error(),
        Some(&PipelineError::ChainTypeMismatch {
            stage: 1,
            index: 1,
            expected: Kind::Int,
            actual: Kind::Bool
        })
    );
}

#[tokio::test]
async fn empty_chain_is_an_error() {
    let ex = Executor::new(Config::default());
    let chain = ex.init(Some("nothing"));
    assert_eq!(chain.state(), BuilderState::Building);
    assert_eq!(chain.execute().await, Err(PipelineError::EmptyChain));
}

#[tokio::test]
async fn generated_name_on_first_append() {
    let ex = Executor::new(Config::default());
    let chain = ex.init(None);
    assert_eq!(chain.name(), None);
    assert_eq!(chain.state(), BuilderState::Empty);

    let chain = chain.append(Handler::func(|| 1i64), Vec::new());
    assert_eq!(chain.name().map(str::len), Some(36));
    assert_eq!(chain.state(), BuilderState::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn builders_are_reset_and_reused() {
    let ex = Executor::new(Config::default());
    let log: Log = Arc::default();

    let dropped = ex
        .init(Some("abandoned"))
        .append(stage1(&log), vec![Value::from(9i64)]);
    drop(dropped);
    assert_eq!(ex.idle_builders(), 1);

    let chain = ex.init(None);
    assert_eq!(ex.idle_builders(), 0);
    assert_eq!(chain.state(), BuilderState::Empty);

    chain
        .append(stage1(&log), vec![Value::from(1i64)])
        .append(stage2(&log), vec![Value::from(4i64)])
        .execute()
        .await
        .unwrap();
    ex.join().await;
    assert_eq!(ex.idle_builders(), 1);

    // Same wiring again after the reset.
    ex.init(Some("again"))
        .append(stage1(&log), vec![Value::from(2i64)])
        .append(stage2(&log), vec![Value::from(5i64)])
        .execute()
        .await
        .unwrap();
    ex.join().await;

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "stage1(1)".to_owned(),
            "stage2(2222-1,4)".to_owned(),
            "stage1(2)".to_owned(),
            "stage2(2222-2,5)".to_owned(),
        ]
    );
}

#[tokio::test]
async fn executor_gone() {
    let ex = Executor::new(Config::default());
    let chain = ex.init(Some("orphan"));
    drop(ex);

    let chain = chain.append(Handler::func(|| ()), Vec::new());
    assert_eq!(chain.state(), BuilderState::Ready);
    assert_eq!(chain.execute().await, Err(PipelineError::ExecutorGone));
}

#[tokio::test]
async fn stored_error_wins_over_a_dropped_executor() {
    let ex = Executor::new(Config::default());
    let log: Log = Arc::default();

    let chain = ex
        .init(Some("broken"))
        .append(stage1(&log), vec![Value::from("one")]);
    drop(ex);

    let err = chain.execute().await.unwrap_err();
    assert_eq!(err.as_label(), "pipeline_signature_mismatch");
}

#[tokio::test]
async fn shutdown_rejects_pipelines_even_with_free_slots() {
    let ex = Executor::new(Config::default());
    let log: Log = Arc::default();
    ex.shutdown();

    let err = ex
        .init(Some("late"))
        .append(stage1(&log), vec![Value::from(1i64)])
        .execute()
        .await
        .unwrap_err();
    assert_eq!(err.as_label(), "gate_cancelled");
    assert_eq!(ex.gate().available(), ex.gate().capacity());

    ex.join().await;
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(ex.idle_builders(), 1);
}

struct Failures(Arc<Mutex<Vec<(EventKind, Option<u32>)>>>);

#[async_trait::async_trait]
impl Subscribe for Failures {
    async fn on_event(&self, ev: &Event) {
        if matches!(ev.kind, EventKind::StageFailed | EventKind::ChainFinished) {
            self.0.lock().unwrap().push((ev.kind, ev.stage));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failing_stage_stops_the_chain() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let ex = Executor::builder(Config::default())
        .with_subscribers(vec![Arc::new(Failures(Arc::clone(&seen))) as Arc<dyn Subscribe>])
        .build();
    let log: Log = Arc::default();

    let exploding = Handler::func(|_s: String| -> String { panic!("stage bug") });
    let after = {
        let log = Arc::clone(&log);
        Handler::func(move |s: String| {
            log.lock().unwrap().push(s);
        })
    };

    ex.init(Some("fragile"))
        .append(stage1(&log), vec![Value::from(3i64)])
        .append(exploding, Vec::new())
        .append(after, Vec::new())
        .execute()
        .await
        .unwrap();
    ex.join().await;

    tokio::time::timeout(Duration::from_secs(1), async {
        while seen.lock().unwrap().len() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["stage1(3)".to_owned()]);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (EventKind::StageFailed, Some(1)),
            (EventKind::ChainFinished, None)
        ]
    );
    assert_eq!(ex.gate().in_flight(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pipelines_share_the_gate_with_units() {
    let ex = Executor::new(Config {
        gate_capacity: 1,
        verbose: true,
        ..Config::default()
    });
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let rx = Arc::new(tokio::sync::Mutex::new(Some(rx)));

    let blocker = Handler::from_async(Vec::<Kind>::new(), Vec::<Kind>::new(), move |_| {
        let rx = Arc::clone(&rx);
        async move {
            if let Some(rx) = rx.lock().await.take() {
                let _ = rx.await;
            }
            Vec::new()
        }
    });
    ex.fire_and_forget(Some("holder"), blocker, None, Vec::new())
        .await
        .unwrap();

    let log: Log = Arc::default();
    let pending = {
        let chain = ex
            .init(Some("queued"))
            .append(stage1(&log), vec![Value::from(1i64)]);
        tokio::spawn(chain.execute())
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!pending.is_finished());
    assert!(log.lock().unwrap().is_empty());

    tx.send(()).unwrap();
    pending.await.unwrap().unwrap();
    ex.join().await;
    assert_eq!(*log.lock().unwrap(), vec!["stage1(1)".to_owned()]);
}
