use pubsubhub::{Args, Handlers, Listener, ListenerDirectory};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

fn joined(args: &Args) -> anyhow::Result<String> {
    let parts = (0..args.len()).map(|i| args.get::<String>(i).cloned()).collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(" "))
}

/// Greets newly created users.
#[derive(Debug, Default)]
pub(crate) struct Mailer;

impl Listener for Mailer {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers.on("handle_user_created", |_mailer, args| {
            let email = args.get::<String>(0)?;
            info!(%email, "Sending welcome mail");
            Ok(())
        });
    }
}

/// Writes every event it is bound to into the log.
#[derive(Debug, Default)]
pub(crate) struct Audit;

impl Listener for Audit {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers.on("record", |_audit, args| {
            info!(args = %joined(args)?, "Audit record");
            Ok(())
        });
    }
}

/// Counts deliveries.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    pub(crate) deliveries: AtomicU64,
}

impl Listener for Metrics {
    fn handlers(handlers: &mut Handlers<Self>) {
        handlers.on("count", |metrics, _args| {
            metrics.deliveries.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });
    }
}

pub(crate) fn directory(metrics: &Arc<Metrics>) -> ListenerDirectory {
    ListenerDirectory::new()
        .with("mailer", Arc::new(Mailer))
        .with("audit", Arc::new(Audit))
        .with("metrics", Arc::clone(metrics))
}
