use chatlock_core::settings::{pin_status, set_pin};
use chatlock_core::storage;

use crate::app::AppContext;
use crate::cli::{PinSetArgs, PinStatusArgs};
use crate::errors::CliError;
use crate::helpers::prompt_new_pin;
use crate::ui::format::format_locked_at;
use crate::ui::{badge, kv, print, receipt, Badge};

pub fn handle_set(ctx: &AppContext, args: &PinSetArgs) -> anyhow::Result<()> {
    let policy = ctx.config()?.pin_policy();
    let mut store = ctx.open_store()?;
    let locked = storage::load_vault(&mut store)?.len();

    let (pin, confirm) = prompt_new_pin(&policy, args.no_input)?;
    set_pin(&mut store, &pin, &confirm, &policy).map_err(CliError::from)?;

    let ui = ctx.ui_context(false);
    if !ctx.quiet() {
        print(&ui, &receipt(&ui, "PIN saved", &[]));
        if locked > 0 {
            print(
                &ui,
                &badge(
                    &ui,
                    Badge::Warn,
                    &format!(
                        "{} item(s) locked earlier still open only with the previous PIN",
                        locked
                    ),
                ),
            );
        }
    }
    Ok(())
}

pub fn handle_status(ctx: &AppContext, args: &PinStatusArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let status = pin_status(&store)?;
    let ui = ctx.ui_context(args.json);

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let state = if status.is_set { "set" } else { "not set" };
    print(&ui, &kv(&ui, "PIN", state));
    if let Some(updated_at) = status.updated_at.as_ref() {
        print(
            &ui,
            &kv(
                &ui,
                "Updated",
                &format_locked_at(Some(updated_at), ui.mode.is_pretty()),
            ),
        );
    }
    Ok(())
}
