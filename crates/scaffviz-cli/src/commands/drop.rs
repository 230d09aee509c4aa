use crate::cli::{DropArgs, GroupChoice};
use crate::error::{CliError, Result};
use scaffviz::core::models::columns::ColumnKind;
use scaffviz::engine::table::MoleculeTable;
use tracing::info;

fn matches_group(kind: &ColumnKind, group: GroupChoice) -> bool {
    matches!(
        (kind, group),
        (ColumnKind::Descriptor { .. }, GroupChoice::Descriptors)
            | (ColumnKind::Scaffold { .. }, GroupChoice::Scaffolds)
            | (ColumnKind::ScaffoldGroup { .. }, GroupChoice::ScaffoldGroups)
            | (ColumnKind::Manifold { .. }, GroupChoice::Manifold)
    )
}

/// Explicit columns first, then every column of the requested kinds, without duplicates.
fn columns_to_drop(table: &MoleculeTable, args: &DropArgs) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for name in &args.columns {
        if name == table.smiles_column() {
            return Err(CliError::Argument(format!(
                "Refusing to drop the SMILES column '{}'",
                name
            )));
        }
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    for name in table.column_names() {
        let kind = table.classify(name);
        if args.kinds.iter().any(|&group| matches_group(&kind, group))
            && !names.iter().any(|n| n == name)
        {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

pub async fn run(args: DropArgs) -> Result<()> {
    let mut table = MoleculeTable::open(&args.input, &args.smiles_column)?;
    let names = columns_to_drop(&table, &args)?;
    if names.is_empty() {
        println!("Nothing to drop.");
        return Ok(());
    }
    info!("Dropping {} column(s) from {:?}", names.len(), table.path());
    let removed = table.remove_columns(&names)?;
    println!(
        "✓ Removed {} column(s) from {}",
        removed.len(),
        table.path().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaffviz::core::descriptors::DescriptorKind;
    use scaffviz::core::scaffolds::ScaffoldKind;
    use scaffviz::engine::progress::ProgressReporter;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn args(columns: &[&str], kinds: Vec<GroupChoice>) -> DropArgs {
        DropArgs {
            input: PathBuf::from("unused.tsv"),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            kinds,
            smiles_column: "SMILES".to_string(),
        }
    }

    #[test]
    fn kinds_expand_to_their_columns() {
        let dir = tempdir().unwrap();
        let mut table = MoleculeTable::from_smiles(
            dir.path().join("t.tsv"),
            vec!["c1ccccc1O".to_string(), "CCO".to_string()],
            "SMILES",
            false,
        )
        .unwrap();
        let reporter = ProgressReporter::new();
        let descriptors = table
            .add_descriptors(&[DescriptorKind::Physchem], false, &reporter)
            .unwrap();
        table
            .add_scaffolds(&[ScaffoldKind::Murcko], false, &reporter)
            .unwrap();

        let names = columns_to_drop(
            &table,
            &args(&["Scaffold_Murcko"], vec![GroupChoice::Descriptors, GroupChoice::Scaffolds]),
        )
        .unwrap();
        assert_eq!(names[0], "Scaffold_Murcko");
        assert_eq!(names.len(), descriptors.len() + 1);

        assert!(matches!(
            columns_to_drop(&table, &args(&["SMILES"], vec![])),
            Err(CliError::Argument(_))
        ));
    }
}
