use super::{build_view, resolve_ports};
use crate::cli::ServeArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::server::{self, View};
use crate::ui::{CliProgressHandler, UiEvent};
use scaffviz::engine::config::validate_views;
use scaffviz::engine::progress::ProgressReporter;
use tokio::sync::mpsc;
use tracing::info;

pub async fn run(args: ServeArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let config = build_config(&args.pipeline, &args.plot, &args.server)?;
    let ports = resolve_ports(&args.server.ports, config.server.port, args.inputs.len())?;
    validate_views(&ports, args.inputs.len(), None)?;

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let views = tokio::task::block_in_place(|| {
        args.inputs
            .iter()
            .map(|input| build_view(input, &config.pipeline, &reporter))
            .collect::<Result<Vec<View>>>()
    })?;

    info!("Starting {} view(s) on {}.", views.len(), config.server.host);
    server::serve_views(&config.server.host, ports.into_iter().zip(views).collect()).await
}
