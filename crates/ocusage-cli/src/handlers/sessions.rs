use super::load_config;
use crate::SessionFilterArgs;
use crate::presentation;
use anyhow::Result;
use chrono::Utc;
use std::process::ExitCode;

pub async fn handle(filter: SessionFilterArgs, json: bool) -> Result<ExitCode> {
    let config = load_config()?;
    let storage = filter.storage_dir.clone().or(config.storage_dir);

    let sessions =
        ocusage_runtime::list_sessions(filter.cutoff(Utc::now()), storage.as_deref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
    } else {
        print!("{}", presentation::render_sessions(&sessions));
    }

    Ok(ExitCode::SUCCESS)
}
