use super::{manifold_of, open_prepared, resolve_ports, view_title};
use crate::cli::{PerfArgs, PerfKindChoice, TaskChoice};
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::server::{self, View};
use crate::ui::{CliProgressHandler, UiEvent};
use scaffviz::engine::config::{PipelineConfig, validate_views};
use scaffviz::engine::progress::ProgressReporter;
use scaffviz::workflows::performance::{self, PerformancePlotKind, PredictionSet, TaskKind};
use scaffviz::workflows::plot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

fn task_kind(choice: TaskChoice) -> TaskKind {
    match choice {
        TaskChoice::Regression => TaskKind::Regression,
        TaskChoice::Classification => TaskKind::Classification,
    }
}

fn plot_kind(choice: PerfKindChoice) -> PerformancePlotKind {
    match choice {
        PerfKindChoice::Errors => PerformancePlotKind::Errors,
        PerfKindChoice::Splits => PerformancePlotKind::Splits,
        PerfKindChoice::Predictions => PerformancePlotKind::Predictions,
        PerfKindChoice::Labels => PerformancePlotKind::Labels,
    }
}

fn prediction_paths(list: &str) -> Result<Vec<PathBuf>> {
    let paths: Vec<PathBuf> = list
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();
    if paths.is_empty() {
        return Err(CliError::Argument(format!(
            "No prediction files in '{}'",
            list
        )));
    }
    Ok(paths)
}

/// The joined table is written next to the input as `<stem>_<target>_performance.tsv`.
fn joined_path(input: &Path, target: &str) -> PathBuf {
    let stem = view_title(input);
    input.with_file_name(format!("{}_{}_performance.tsv", stem, target))
}

fn load_predictions(paths: &[PathBuf], target: &str, task: TaskKind) -> Result<PredictionSet> {
    let mut combined: Option<PredictionSet> = None;
    for path in paths {
        let set = PredictionSet::load(path, target, task)?;
        combined = Some(match combined {
            Some(previous) => previous.concat(set)?,
            None => set,
        });
    }
    combined.ok_or_else(|| CliError::Argument("No prediction files given".to_string()))
}

fn build_performance_view(
    input: &Path,
    predictions: &[PathBuf],
    args: &PerfArgs,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<View> {
    let table = open_prepared(input, config, reporter)?;
    let set = load_predictions(predictions, &args.target, task_kind(args.task))?;
    let mut view = performance::prepare_view(
        &table,
        &set,
        plot_kind(args.kind),
        &config.plot.card_columns,
        &config.plot,
        joined_path(input, &args.target),
    )?;
    let plot = plot::build(&mut view.table, &view.plot, manifold_of(config), false)?;
    info!(
        "Built performance plot for '{}' with {} point(s).",
        args.target,
        plot.points.len()
    );
    Ok(View {
        title: format!("{} ({})", view_title(input), args.target),
        plot: Arc::new(plot),
    })
}

pub async fn run(args: PerfArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let config = build_config(&args.pipeline, &args.plot, &args.server)?;
    let ports = resolve_ports(&args.server.ports, config.server.port, args.inputs.len())?;
    validate_views(&ports, args.inputs.len(), Some(args.predictions.len()))?;
    let predictions = args
        .predictions
        .iter()
        .map(|list| prediction_paths(list))
        .collect::<Result<Vec<_>>>()?;

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let views = tokio::task::block_in_place(|| {
        args.inputs
            .iter()
            .zip(&predictions)
            .map(|(input, paths)| {
                build_performance_view(input, paths, &args, &config.pipeline, &reporter)
            })
            .collect::<Result<Vec<View>>>()
    })?;

    server::serve_views(&config.server.host, ports.into_iter().zip(views).collect()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn prediction_lists_split_on_commas() {
        let paths = prediction_paths("cv.tsv, ind.tsv").unwrap();
        assert_eq!(paths, vec![PathBuf::from("cv.tsv"), PathBuf::from("ind.tsv")]);
        assert!(prediction_paths(" , ").is_err());
    }

    #[test]
    fn joined_table_lives_next_to_the_input() {
        assert_eq!(
            joined_path(Path::new("/data/actives.tsv"), "pchembl"),
            PathBuf::from("/data/actives_pchembl_performance.tsv")
        );
    }

    #[test]
    fn several_prediction_files_are_stacked() {
        let dir = tempdir().unwrap();
        let cv = dir.path().join("cv.tsv");
        let ind = dir.path().join("ind.tsv");
        fs::write(&cv, "ID\tp_Label\tp_Prediction\tFold\na\t1\t2\t0\n").unwrap();
        fs::write(&ind, "ID\tp_Label\tp_Prediction\nb\t3\t3\n").unwrap();

        let set = load_predictions(&[cv, ind], "p", TaskKind::Regression).unwrap();
        assert_eq!(set.row_count(), 2);
    }
}
