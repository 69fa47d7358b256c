//! Inspect an importer snapshot from the command line.
//!
//! Usage: `opsboard-snapshot <snapshot.json> [--viewer <node-id>] [--hierarchy <tree.json>]`
//!
//! Loads the snapshot, builds the dashboard (scoped to `--viewer` when given)
//! and prints the result as JSON on stdout. Config is read from
//! ~/.opsboard/config.json when present.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use opsboard_lib::hierarchy::{Hierarchy, NodeSpec};
use opsboard_lib::services::dashboard::{load_dashboard, DashboardResult};
use opsboard_lib::snapshot::Snapshot;
use opsboard_lib::state::{load_config_or_default, EngineState};

#[derive(Debug, Parser)]
#[command(name = "opsboard-snapshot")]
#[command(about = "Build the operations dashboard from an importer snapshot")]
#[command(long_about = None)]
struct Args {
    /// Snapshot JSON written by the tracker import
    snapshot: PathBuf,

    /// Hierarchy node to scope the dashboard to
    #[arg(long)]
    viewer: Option<String>,

    /// Organisation tree JSON (array of nodes)
    #[arg(long)]
    hierarchy: Option<PathBuf>,
}

fn load_hierarchy(path: &Path) -> anyhow::Result<Hierarchy> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hierarchy {}", path.display()))?;
    let specs: Vec<NodeSpec> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse hierarchy {}", path.display()))?;
    Ok(Hierarchy::from_nodes(specs)?)
}

fn main() -> anyhow::Result<()> {
    let config = load_config_or_default();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter.as_str()))
        .init();

    let args = Args::parse();
    let snapshot = Snapshot::from_path(&args.snapshot)?;

    let mut state = EngineState::new(config);
    if let Some(path) = &args.hierarchy {
        state = state.with_hierarchy(load_hierarchy(path)?);
    }

    let result = load_dashboard(&state, &snapshot, args.viewer.as_deref());
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let DashboardResult::Error { message, .. } = result {
        bail!(message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_positional_and_flags() {
        let args = Args::try_parse_from([
            "opsboard-snapshot",
            "snap.json",
            "--viewer",
            "alpha",
            "--hierarchy",
            "tree.json",
        ])
        .unwrap();
        assert_eq!(args.snapshot, PathBuf::from("snap.json"));
        assert_eq!(args.viewer.as_deref(), Some("alpha"));
        assert_eq!(args.hierarchy, Some(PathBuf::from("tree.json")));
    }

    #[test]
    fn test_args_reject_bad_input() {
        assert!(Args::try_parse_from(["opsboard-snapshot"]).is_err());
        assert!(Args::try_parse_from(["opsboard-snapshot", "snap.json", "--viewer"]).is_err());
        assert!(Args::try_parse_from(["opsboard-snapshot", "snap.json", "--verbose"]).is_err());
        assert!(Args::try_parse_from(["opsboard-snapshot", "a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_args_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
