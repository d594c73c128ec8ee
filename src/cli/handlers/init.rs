use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::config_path;
use crate::io::kv_store::atomic_write;

const CONFIG_TEMPLATE: &str = r##"# tabdo settings. Every key is optional; the values below are the defaults.
# Change them here or with: td config set <section.key> <value>

[storage]
# Stored data lives in <data dir>/<key>.blob
key = "todo-app-data"

[export]
# File written by `td export` when no path is given
filename = "todo-app-data.json"

[alerts]
# Open tasks whose provisional due date is this many days away (or less)
# show up in `td alerts`
window_days = 7

[sweep]
# Open tasks are archived once their final due date is more than this
# many days in the past
grace_days = 1
"##;

pub fn cmd_init(args: InitArgs, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path(data_dir);
    if path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    fs::create_dir_all(data_dir)?;
    atomic_write(&path, CONFIG_TEMPLATE.as_bytes())?;
    tracing::info!(path = %path.display(), "wrote config");

    println!("Initialized tabdo in {}", data_dir.display());
    Ok(())
}
