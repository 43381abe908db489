use crate::ConfigCommand;
use anyhow::{Result, bail};
use ocusage_runtime::Config;
use std::process::ExitCode;

pub fn handle(command: ConfigCommand) -> Result<ExitCode> {
    let path = Config::default_path()?;

    match command {
        ConfigCommand::Path => {
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::starter().save_to(&path)?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}
