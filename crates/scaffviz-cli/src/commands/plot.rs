use super::build_view;
use crate::cli::PlotArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::server::render_page;
use crate::ui::{CliProgressHandler, UiEvent};
use scaffviz::engine::progress::ProgressReporter;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::info;

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

pub async fn run(args: PlotArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let config = build_config(&args.pipeline, &args.plot, &Default::default())?;
    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let view =
        tokio::task::block_in_place(|| build_view(&args.input, &config.pipeline, &reporter))?;

    let content = if is_html(&args.output) {
        render_page(&view.title, Some(view.plot.as_ref()))?
    } else {
        serde_json::to_string_pretty(view.plot.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    info!("Writing plot to {:?}", &args.output);
    std::fs::write(&args.output, content)?;
    println!("✓ Plot written to: {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_extension_selects_standalone_page() {
        assert!(is_html(Path::new("plot.html")));
        assert!(is_html(Path::new("plot.HTM")));
        assert!(!is_html(Path::new("plot.json")));
        assert!(!is_html(Path::new("plot")));
    }
}
