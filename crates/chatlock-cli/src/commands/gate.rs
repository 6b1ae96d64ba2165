//! The lock button, the gate prompt and the gate status.

use chatlock_core::view::ViewProvider;
use chatlock_core::{EntryKind, GateState, GateStateMachine, SyncLoop};

use crate::app::AppContext;
use crate::cli::{StatusArgs, UnlockArgs, ViewArgs};
use crate::errors::CliError;
use crate::helpers::prompt_pin;
use crate::ui::{badge, print, receipt, Badge, TerminalHost};

fn kind_label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Chat => "chat",
        EntryKind::Project => "project",
    }
}

pub fn handle_lock(ctx: &AppContext, args: &ViewArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let mut view = ctx.open_view(&args.view)?;
    let mut gate = GateStateMachine::bootstrap(store, &view)?;

    let entry = gate.lock_current(&mut view).map_err(CliError::from)?;
    view.save()?;

    let ui = ctx.ui_context(false);
    if !gate.session().vault().is_synced() {
        eprintln!(
            "{}",
            badge(&ui, Badge::Warn, "Locked, but the vault could not be saved")
        );
    }
    if !ctx.quiet() {
        let title = format!("Locked {}", kind_label(entry.kind));
        print(
            &ui,
            &receipt(
                &ui,
                &title,
                &[("Key", entry.lock_key.as_str()), ("Title", entry.display_title())],
            ),
        );
    }
    Ok(())
}

pub fn handle_unlock(ctx: &AppContext, args: &UnlockArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let mut view = ctx.open_view(&args.view.view)?;
    let mut gate = GateStateMachine::bootstrap(store, &view)?;

    let title = match gate.evaluate(&view) {
        GateState::Gated { title, .. } => title.clone(),
        _ => {
            return Err(CliError::not_found(
                "This item is not locked.",
                "Hint: Run `chatlock status --view <FILE>` to check the view.",
            )
            .into())
        }
    };

    let pin = prompt_pin(&format!("PIN for {}", title), args.no_input)?;
    let outcome = gate.submit_pin(&mut view, &pin).map_err(CliError::from)?;
    view.save()?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false);
        let restored = outcome.restored.to_string();
        let heading = format!("Unlocked {}", kind_label(outcome.kind));
        print(
            &ui,
            &receipt(
                &ui,
                &heading,
                &[("Key", outcome.lock_key.as_str()), ("Restored", restored.as_str())],
            ),
        );
    }
    Ok(())
}

pub fn handle_status(ctx: &AppContext, args: &StatusArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let view = ctx.open_view(&args.view.view)?;
    let location = view.location();
    let host = TerminalHost::new(ctx.ui_context(args.json), false);

    // Bootstrapping draws the current frame.
    let sync = SyncLoop::bootstrap(store, view, host)?;
    tracing::debug!(%location, state = ?sync.gate().state(), "status");
    Ok(())
}
