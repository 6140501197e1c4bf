//! `regscan scan`: load a snapshot and scan it from a root object.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use regscan_core::ScanPipeline;
use regscan_reflect::Snapshot;
use termcolor::ColorChoice;
use tracing::info;

use crate::output::StyledOutput;
use crate::Format;

/// Exit status of a scan whose required lookups failed
const EXIT_ABORTED: u8 = 2;

pub fn execute(
    snapshot_path: &Path,
    root: u64,
    config_path: Option<&Path>,
    format: Format,
    color: ColorChoice,
) -> anyhow::Result<ExitCode> {
    let config = super::load_config(config_path)?;
    let snapshot = Snapshot::from_file(snapshot_path)
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;
    let root_value = snapshot
        .object(root)
        .ok_or_else(|| anyhow!("Object {} not found in {}", root, snapshot_path.display()))?;

    info!(snapshot = %snapshot_path.display(), root, "starting scan");
    let result = ScanPipeline::new(config).scan(snapshot.graph(), &root_value);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => StyledOutput::new(color).scan_result(&result),
    }

    if result.is_aborted() {
        Ok(ExitCode::from(EXIT_ABORTED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
