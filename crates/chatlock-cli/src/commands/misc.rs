use clap::CommandFactory;
use clap_complete::generate;

use chatlock_core::storage;

use crate::app::{resolve_config_path, resolve_store_path, AppContext};
use crate::cli::{Cli, ConfigInitArgs, ResetArgs};
use crate::config::{write_config, ChatlockConfig};
use crate::errors::CliError;
use crate::helpers::confirm;
use crate::ui::{print, receipt};

pub fn handle_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "chatlock", &mut std::io::stdout());
    Ok(())
}

pub fn handle_reset(ctx: &AppContext, args: &ResetArgs) -> anyhow::Result<()> {
    if !confirm("Forget the PIN and every locked item?", args.yes)? {
        return Ok(());
    }
    let mut store = ctx.open_store()?;
    storage::reset(&mut store)?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false);
        print(&ui, &receipt(&ui, "PIN and locked items cleared", &[]));
    }
    Ok(())
}

pub fn handle_config_init(ctx: &AppContext, args: &ConfigInitArgs) -> anyhow::Result<()> {
    let path = resolve_config_path(ctx.cli())?;
    if path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}. Pass --force to overwrite.",
            path.display()
        ))
        .into());
    }

    let config = ChatlockConfig::new(resolve_store_path(ctx.cli(), None)?);
    write_config(&path, &config)?;

    if !ctx.quiet() {
        let ui = ctx.ui_context(false);
        let config_path = path.display().to_string();
        print(
            &ui,
            &receipt(
                &ui,
                "Config written",
                &[("Config", config_path.as_str()), ("Store", config.store.path.as_str())],
            ),
        );
    }
    Ok(())
}

pub fn handle_config_show(ctx: &AppContext) -> anyhow::Result<()> {
    let config = ctx.config()?;
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    print!("{}", contents);
    Ok(())
}
