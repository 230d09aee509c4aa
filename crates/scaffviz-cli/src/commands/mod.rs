pub mod drop;
pub mod info;
pub mod perf;
pub mod plot;
pub mod prepare;
pub mod serve;

use crate::error::{CliError, Result};
use crate::server::View;
use scaffviz::core::manifold::Manifold;
use scaffviz::engine::config::PipelineConfig;
use scaffviz::engine::progress::ProgressReporter;
use scaffviz::engine::table::MoleculeTable;
use scaffviz::workflows;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Opens a table and brings every configured column group up to date.
pub(crate) fn open_prepared(
    path: &Path,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<MoleculeTable> {
    info!("Loading table from {:?}", path);
    let mut table = MoleculeTable::open(path, &config.smiles_column)?;
    let summary = workflows::prepare::run(&mut table, config, reporter)?;
    info!(
        "Table ready: {} descriptor, {} scaffold and {} manifold column(s).",
        summary.descriptors.len(),
        summary.scaffolds.len(),
        summary.manifold.len()
    );
    Ok(table)
}

pub(crate) fn manifold_of(config: &PipelineConfig) -> Option<&dyn Manifold> {
    config.manifold.as_ref().map(|m| m as &dyn Manifold)
}

pub(crate) fn view_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Prepares `path` and builds its plot.
pub(crate) fn build_view(
    path: &Path,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<View> {
    let mut table = open_prepared(path, config, reporter)?;
    let plot = workflows::plot::build(&mut table, &config.plot, manifold_of(config), false)?;
    info!("Built plot with {} point(s).", plot.points.len());
    Ok(View {
        title: view_title(path),
        plot: Arc::new(plot),
    })
}

/// Explicit ports are used as given; otherwise views take consecutive ports starting at `base`.
pub(crate) fn resolve_ports(explicit: &[u16], base: u16, count: usize) -> Result<Vec<u16>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    (0..count)
        .map(|offset| {
            u16::try_from(offset)
                .ok()
                .and_then(|offset| base.checked_add(offset))
                .ok_or_else(|| {
                    CliError::Argument(format!(
                        "Not enough ports above {} for {} view(s)",
                        base, count
                    ))
                })
        })
        .collect()
}
