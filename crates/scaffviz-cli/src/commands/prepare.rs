use super::open_prepared;
use crate::cli::PrepareArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use scaffviz::engine::progress::ProgressReporter;
use tokio::sync::mpsc;
use tracing::info;

pub async fn run(args: PrepareArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let config = build_config(&args.pipeline, &Default::default(), &Default::default())?;
    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the preparation workflow...");
    let table =
        tokio::task::block_in_place(|| open_prepared(&args.input, &config.pipeline, &reporter))?;

    println!(
        "✓ {} molecule(s) in {} with {} column(s).",
        table.row_count(),
        table.path().display(),
        table.column_names().len()
    );
    Ok(())
}
