use ocusage_runtime::DRY_RUN_TARGET;
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` replaces the computed filter,
/// but dry-run write descriptions stay visible.
pub fn init(verbose: bool, dry_run: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), verbose, dry_run);

    // A second init (tests driving `run` twice) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_filter(env: Option<&str>, verbose: bool, dry_run: bool) -> EnvFilter {
    let filter = env
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directives(verbose)));

    if !dry_run {
        return filter;
    }
    match format!("{}=info", DRY_RUN_TARGET).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose { "warn,ocusage=debug" } else { "warn" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_warn() {
        let filter = build_filter(None, false, false).to_string();
        assert!(filter.contains("warn"));
        assert!(!filter.contains("ocusage"));
    }

    #[test]
    fn test_verbose_raises_own_crates() {
        let filter = build_filter(None, true, false).to_string();
        assert!(filter.contains("ocusage=debug"));
        assert!(filter.contains("warn"));
    }

    #[test]
    fn test_dry_run_shows_planned_writes() {
        let filter = build_filter(None, false, true).to_string();
        assert!(filter.contains("ocusage::dry_run=info"));
    }

    #[test]
    fn test_env_filter_keeps_dry_run_output() {
        let filter = build_filter(Some("error"), false, true).to_string();
        assert!(filter.contains("error"));
        assert!(filter.contains("ocusage::dry_run=info"));

        let filter = build_filter(Some("error"), true, false).to_string();
        assert!(!filter.contains("ocusage"));
    }
}
