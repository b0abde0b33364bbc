use pubsubhub::*;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

#[derive(Default)]
struct Mailer {
    sent: AtomicUsize,
}

impl Listener for Mailer {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers.on("handle_user_created", |mailer, args| {
            let _id: &i64 = args.get(0)?;
            mailer.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
}

const CONFIG: &str = r#"
[logging]
level = "debug"

[runtime]
worker_threads = 2

[events]
user_created = [
  { listener = "mailer" },
  { listener = "mailer", async = true },
]
"#;

#[test]
fn config_file_wires_the_hub() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("pubsubhub.toml");
    fs::write(&path, CONFIG)?;

    let config: HubConfig = load_config(Some(&path))?;
    assert_eq!(config.runtime.worker_threads, 2);
    assert_eq!(config.events.events["user_created"].len(), 2);

    let mailer = Arc::new(Mailer::default());
    let directory = ListenerDirectory::new().with("mailer", Arc::clone(&mailer));
    let hub = init(&config, &directory)?;
    hub.set_async_dispatcher(Arc::new(InlineDispatcher));

    let report = hub.trigger("user_created", args![7_i64]);

    assert_eq!(report, TriggerReport { invoked: 1, dispatched: 1, failed: 0 });
    assert_eq!(mailer.sent.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn unknown_listener_in_config_is_rejected() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("pubsubhub.toml");
    fs::write(&path, "[events]\nuser_created = [{ listener = \"pager\" }]\n")?;

    let config: HubConfig = load_config(Some(&path))?;
    let hub = EventHub::new();
    let err = wire(&hub, &config, &ListenerDirectory::new()).unwrap_err();

    assert!(matches!(err, HubError::Validation { .. }));
    assert!(hub.events().is_empty());
    Ok(())
}
