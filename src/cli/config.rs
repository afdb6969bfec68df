//! Configuration CLI commands

use clap::Subcommand;
use log::info;

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::Permission;

use super::CliContext;

/// Config subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show every setting and the data locations
    Show,
    /// Print one setting, e.g. `security.lockout_minutes`
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
}

pub fn handle_config_command(ctx: &mut CliContext, cmd: ConfigCommands) -> CheckdeskResult<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("checkdesk configuration");
            println!("=======================");
            println!("Data directory:  {}", ctx.paths.base_dir().display());
            println!("Database:        {}", ctx.paths.database_file().display());
            println!("Settings file:   {}", ctx.paths.settings_file().display());
            println!("Backups:         {}", ctx.paths.backup_dir().display());
            println!("Exports:         {}", ctx.paths.export_dir().display());
            println!("Logs:            {}", ctx.paths.log_dir().display());
            println!();
            let settings = serde_yaml::to_string(&ctx.settings)
                .map_err(|e| CheckdeskError::Config(e.to_string()))?;
            print!("{}", settings);
        }

        ConfigCommands::Get { key } => match ctx.settings.get(&key)? {
            Some(serde_json::Value::String(text)) => println!("{}", text),
            Some(value) => println!("{}", value),
            None => return Err(CheckdeskError::Config(format!("Unknown setting: {}", key))),
        },

        ConfigCommands::Set { key, value } => {
            ctx.require(Permission::SystemConfig)?;
            ctx.settings.set(&key, &value)?;
            ctx.settings.save(&ctx.paths)?;
            info!("event=config_set status=ok key={}", key);
            println!("{} = {}", key, value);
        }
    }

    Ok(())
}
