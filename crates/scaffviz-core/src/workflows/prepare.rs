use crate::engine::config::PipelineConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::table::MoleculeTable;
use tracing::{info, instrument};

/// Column names produced or confirmed by a preparation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareSummary {
    pub descriptors: Vec<String>,
    pub scaffolds: Vec<String>,
    pub scaffold_groups: Vec<String>,
    pub manifold: Vec<String>,
}

/// Brings `table` up to date with the configured generators.
///
/// Column groups that are already current are left alone unless
/// `config.recalculate` is set. The table is persisted after every step.
#[instrument(skip_all, name = "prepare_workflow")]
pub fn run(
    table: &mut MoleculeTable,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<PrepareSummary, EngineError> {
    let mut summary = PrepareSummary::default();

    // === Phase 1: Descriptors ===
    if !config.descriptors.is_empty() {
        reporter.report(Progress::PhaseStart {
            name: "Computing Descriptors",
        });
        summary.descriptors =
            table.add_descriptors(&config.descriptors, config.recalculate, reporter)?;
        reporter.report(Progress::PhaseFinish);
        info!(columns = summary.descriptors.len(), "Descriptors ready.");
    }

    // === Phase 2: Scaffolds and grouping ===
    if !config.scaffolds.is_empty() {
        reporter.report(Progress::PhaseStart {
            name: "Computing Scaffolds",
        });
        summary.scaffolds = table.add_scaffolds(&config.scaffolds, config.recalculate, reporter)?;
        reporter.report(Progress::PhaseFinish);

        reporter.report(Progress::PhaseStart {
            name: "Grouping Scaffolds",
        });
        summary.scaffold_groups = table.create_scaffold_groups(config.plot.mols_per_group)?;
        reporter.report(Progress::PhaseFinish);
        info!(
            scaffolds = summary.scaffolds.len(),
            threshold = config.plot.mols_per_group,
            "Scaffolds ready."
        );
    }

    // === Phase 3: Manifold ===
    if let Some(manifold) = &config.manifold {
        reporter.report(Progress::PhaseStart {
            name: "Projecting Descriptors",
        });
        summary.manifold = table.add_manifold_data(manifold, config.recalculate)?;
        reporter.report(Progress::PhaseFinish);
        info!(columns = ?summary.manifold, "Manifold ready.");
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptors::DescriptorKind;
    use crate::core::manifold::{ManifoldKind, Pca};
    use crate::core::scaffolds::ScaffoldKind;
    use crate::engine::config::PipelineConfigBuilder;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn smiles() -> Vec<String> {
        ["c1ccccc1O", "c1ccccc1N", "C1CCCCC1C", "CCO", "c1ccncc1"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn config(manifold: bool) -> PipelineConfig {
        PipelineConfigBuilder::new()
            .smiles_column("SMILES")
            .descriptors(vec![DescriptorKind::Physchem])
            .scaffolds(vec![ScaffoldKind::Murcko])
            .manifold(manifold.then(|| ManifoldKind::Pca(Pca::default())))
            .mols_per_group(2)
            .height(600)
            .build()
            .unwrap()
    }

    #[test]
    fn run_adds_every_configured_group_and_reports_phases() {
        let dir = tempdir().unwrap();
        let mut table =
            MoleculeTable::from_smiles(dir.path().join("mols.tsv"), smiles(), "SMILES", false)
                .unwrap();
        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&phases);
        let callback = move |event: Progress| {
            if let Progress::PhaseStart { name } = event {
                sink.lock().unwrap().push(name);
            }
        };
        let reporter = ProgressReporter::with_callback(Box::new(callback));

        let summary = run(&mut table, &config(true), &reporter).unwrap();

        assert!(!summary.descriptors.is_empty());
        assert_eq!(summary.scaffolds, vec!["Scaffold_Murcko".to_string()]);
        assert_eq!(
            summary.scaffold_groups,
            vec!["ScaffoldGroup_Scaffold_Murcko_2".to_string()]
        );
        assert_eq!(summary.manifold, vec!["PCA_1".to_string(), "PCA_2".to_string()]);
        assert_eq!(
            *phases.lock().unwrap(),
            vec![
                "Computing Descriptors",
                "Computing Scaffolds",
                "Grouping Scaffolds",
                "Projecting Descriptors"
            ]
        );

        let reopened = MoleculeTable::open(dir.path().join("mols.tsv"), "SMILES").unwrap();
        assert!(reopened.column("PCA_2").is_some());
        assert!(reopened.has_scaffold_groups());
    }

    #[test]
    fn second_run_reuses_existing_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mols.tsv");
        let mut table = MoleculeTable::from_smiles(&path, smiles(), "SMILES", false).unwrap();
        let first = run(&mut table, &config(false), &ProgressReporter::new()).unwrap();

        let mut reopened = MoleculeTable::open(&path, "SMILES").unwrap();
        let before = reopened.frame().clone();
        let second = run(&mut reopened, &config(false), &ProgressReporter::new()).unwrap();

        assert_eq!(first, second);
        assert_eq!(reopened.frame(), &before);
        assert!(second.manifold.is_empty());
    }
}
