use hub_events::*;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Appends its label to a shared journal.
struct Step {
    label: usize,
    journal: Arc<Mutex<Vec<usize>>>,
}

impl Listener for Step {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers
            .on("handle_run", |step, _args| {
                step.journal.lock().push(step.label);
                Ok(())
            })
            .on("fail", |_step, _args| anyhow::bail!("step failed"))
            .on("panic", |step, _args| panic!("step {} panicked", step.label));
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Run,
    Fail,
    Panic,
    Missing,
}

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![Just(Outcome::Run), Just(Outcome::Fail), Just(Outcome::Panic), Just(Outcome::Missing)]
}

proptest! {
    #[test]
    fn bindings_run_in_order_and_failures_stay_isolated(
        plan in proptest::collection::vec((outcome(), any::<bool>()), 0..24)
    ) {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        let hub = EventHub::builder()
            .async_dispatcher(InlineDispatcher)
            .error_handler(move |_error: InvocationError| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let specs: Vec<_> = plan
            .iter()
            .enumerate()
            .map(|(label, (outcome, is_async))| {
                let step = Arc::new(Step { label, journal: Arc::clone(&journal) });
                let spec = match outcome {
                    Outcome::Run => BindingSpec::new(step),
                    Outcome::Fail => BindingSpec::new(step).handler("fail"),
                    Outcome::Panic => BindingSpec::new(step).handler("panic"),
                    Outcome::Missing => BindingSpec::new(step).handler("no_such_handler"),
                };
                if *is_async { spec.asynchronous() } else { spec }
            })
            .collect();
        hub.register([("run", specs)]).unwrap();

        let report = hub.trigger("run", Args::new());

        let expected: Vec<usize> = plan
            .iter()
            .enumerate()
            .filter(|(_, (outcome, _))| matches!(outcome, Outcome::Run))
            .map(|(label, _)| label)
            .collect();
        prop_assert_eq!(&*journal.lock(), &expected);
        prop_assert_eq!(report.failed, plan.len() - expected.len());
        prop_assert_eq!(failures.load(Ordering::SeqCst), report.failed);
        prop_assert_eq!(report.bindings(), plan.len());
    }

    #[test]
    fn registration_with_any_missing_listener_changes_nothing(
        present in proptest::collection::vec(any::<bool>(), 1..16)
    ) {
        let hub = EventHub::new();
        let journal = Arc::new(Mutex::new(Vec::new()));
        let specs: Vec<_> = present
            .iter()
            .enumerate()
            .map(|(label, present)| {
                if *present {
                    BindingSpec::new(Arc::new(Step { label, journal: Arc::clone(&journal) }))
                } else {
                    BindingSpec::default()
                }
            })
            .collect();

        let result = hub.register([("run", specs)]);

        prop_assert_eq!(result.is_ok(), present.iter().all(|p| *p));
        prop_assert_eq!(hub.is_registered("run"), result.is_ok());
    }
}
