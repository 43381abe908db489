//! Shell stand-in for the `opencode` executable.
//!
//! Answers `--version`, and `export <id>` by printing a banner followed by
//! `<fixtures>/<id>.json`. A `<id>.fail` marker makes that export exit 1.
//! Every export call appends `<id> <cwd>` to `<fixtures>/calls.log`.

use anyhow::Result;
use std::path::Path;

pub const FAKE_VERSION: &str = "0.0.0-test";
pub const CALLS_LOG: &str = "calls.log";

pub fn script(fixtures_dir: &Path) -> String {
    format!(
        r#"#!/bin/sh
FIXTURES='{fixtures}'
case "$1" in
  --version)
    echo "{version}"
    ;;
  export)
    echo "$2 $(pwd)" >> "$FIXTURES/{log}"
    if [ -f "$FIXTURES/$2.fail" ]; then
      echo "simulated failure for $2" >&2
      exit 1
    fi
    if [ ! -f "$FIXTURES/$2.json" ]; then
      echo "Session not found: $2" >&2
      exit 1
    fi
    echo "Exporting session: $2"
    cat "$FIXTURES/$2.json"
    ;;
  *)
    echo "unknown command: $1" >&2
    exit 2
    ;;
esac
"#,
        fixtures = fixtures_dir.display(),
        version = FAKE_VERSION,
        log = CALLS_LOG,
    )
}

/// Write the script to `path` and mark it executable
pub fn install(path: &Path, fixtures_dir: &Path) -> Result<()> {
    std::fs::write(path, script(fixtures_dir))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Session ids passed to `export`, in call order
pub fn recorded_calls(fixtures_dir: &Path) -> Vec<(String, String)> {
    let Ok(content) = std::fs::read_to_string(fixtures_dir.join(CALLS_LOG)) else {
        return Vec::new();
    };
    content
        .lines()
        .filter_map(|line| {
            let (id, cwd) = line.split_once(' ')?;
            Some((id.to_string(), cwd.to_string()))
        })
        .collect()
}
