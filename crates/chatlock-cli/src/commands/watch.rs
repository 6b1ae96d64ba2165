use std::time::Duration;

use chatlock_core::{IntervalSource, SyncLoop};
use tracing::info;

use crate::app::AppContext;
use crate::cli::WatchArgs;
use crate::ui::TerminalHost;

/// Interval in whole milliseconds, saturating at `u64::MAX`.
fn interval_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

pub fn handle_watch(ctx: &AppContext, args: &WatchArgs) -> anyhow::Result<()> {
    let interval = match args.interval_ms {
        Some(ms) => Duration::from_millis(ms.max(1)),
        None => ctx.config()?.poll_interval(),
    };
    let store = ctx.open_store()?;
    let view = ctx.open_view(&args.view.view)?;
    let host = TerminalHost::new(ctx.ui_context(false), ctx.quiet());

    let mut sync = SyncLoop::bootstrap(store, view, host)?;
    let mut source = IntervalSource::new(interval);
    if let Some(ticks) = args.ticks {
        source = source.with_limit(ticks);
    }

    info!(interval_ms = interval_millis(interval), "watching view");
    sync.run(&mut source)?;

    let (_, view, host) = sync.into_parts();
    info!(
        frames = host.frames(),
        path = %view.path().display(),
        "watch finished"
    );
    Ok(())
}
