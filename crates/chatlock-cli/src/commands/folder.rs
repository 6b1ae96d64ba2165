//! The private folder: list locked chats and open one.

use chatlock_core::view::ViewProvider;
use chatlock_core::GateStateMachine;
use tracing::info;

use crate::app::AppContext;
use crate::cli::FolderArgs;
use crate::errors::CliError;
use crate::helpers::prompt_pin;
use crate::ui::overlay::folder_table;
use crate::ui::{header, hint, print, receipt};

pub fn handle_folder(ctx: &AppContext, args: &FolderArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let mut view = ctx.open_view(&args.view.view)?;
    let mut gate = GateStateMachine::bootstrap(store, &view)?;

    gate.open_folder().map_err(CliError::from)?;
    let pin = prompt_pin("Folder PIN", args.no_input)?;
    gate.submit_folder_pin(&pin).map_err(CliError::from)?;

    let ui = ctx.ui_context(args.json);

    let Some(lock_key) = args.open.as_deref() else {
        let items = gate.folder_items();
        if ui.mode.is_json() {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }
        let context = format!("{} locked", items.len());
        print(&ui, &header(&ui, "folder", Some(context.as_str())));
        if items.is_empty() {
            print(&ui, "No locked chats yet.");
        } else {
            print(&ui, &folder_table(&ui, &items));
            if !ctx.quiet() {
                print(&ui, &hint(&ui, "chatlock folder --view <FILE> --open <KEY>"));
            }
        }
        return Ok(());
    };

    let target = gate.unlock_from_folder(lock_key).map_err(CliError::from)?;
    view.navigate(&target)?;
    gate.on_route_tick(&mut view);
    gate.on_view_changed(&mut view);
    view.save()?;
    info!(lock_key, "opened from folder");

    if ui.mode.is_json() {
        let out = serde_json::json!({
            "lockKey": lock_key,
            "location": view.location(),
            "pendingRestore": !gate.session().restore_queue().is_empty(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !ctx.quiet() {
        let location = view.location();
        print(
            &ui,
            &receipt(&ui, "Unlocked chat", &[("Key", lock_key), ("Location", location.as_str())]),
        );
    }
    Ok(())
}
