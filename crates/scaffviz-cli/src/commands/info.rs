use crate::cli::InfoArgs;
use crate::error::Result;
use scaffviz::core::models::columns::ColumnKind;
use scaffviz::engine::table::MoleculeTable;
use std::collections::BTreeMap;

fn kind_label(kind: &ColumnKind) -> &'static str {
    match kind {
        ColumnKind::Smiles => "smiles",
        ColumnKind::Data => "data",
        ColumnKind::Descriptor { .. } => "descriptor",
        ColumnKind::Scaffold { .. } => "scaffold",
        ColumnKind::ScaffoldGroup { .. } => "scaffold group",
        ColumnKind::Manifold { .. } => "manifold",
    }
}

/// Counts columns per kind, keeping the names of everything but descriptors.
fn summarize(table: &MoleculeTable) -> BTreeMap<&'static str, Vec<String>> {
    let mut groups: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for name in table.column_names() {
        let kind = table.classify(name);
        groups
            .entry(kind_label(&kind))
            .or_default()
            .push(name.to_string());
    }
    groups
}

pub async fn run(args: InfoArgs) -> Result<()> {
    let table = MoleculeTable::open(&args.input, &args.smiles_column)?;
    println!("Table: {}", table.path().display());
    println!("Molecules: {}", table.row_count());

    for (kind, names) in summarize(&table) {
        if kind == "descriptor" {
            println!("  {:<15} {} column(s)", kind, names.len());
        } else {
            println!("  {:<15} {}", kind, names.join(", "));
        }
    }

    if table.cache().is_empty() {
        println!("Cache: no recorded column groups");
    } else {
        println!("Cache:");
        for entry in table.cache().entries() {
            println!(
                "  {:<15} {:<30} {} column(s) [{}]",
                entry.kind.as_str(),
                entry.generator,
                entry.columns.len(),
                entry.params
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaffviz::core::scaffolds::ScaffoldKind;
    use scaffviz::engine::progress::ProgressReporter;
    use tempfile::tempdir;

    #[test]
    fn columns_are_grouped_by_kind() {
        let dir = tempdir().unwrap();
        let mut table = MoleculeTable::from_smiles(
            dir.path().join("t.tsv"),
            vec!["c1ccccc1O".to_string(), "CCO".to_string()],
            "SMILES",
            false,
        )
        .unwrap();
        table
            .add_scaffolds(&[ScaffoldKind::Murcko], false, &ProgressReporter::new())
            .unwrap();

        let groups = summarize(&table);
        assert_eq!(groups["smiles"], vec!["SMILES".to_string()]);
        assert_eq!(groups["scaffold"], vec!["Scaffold_Murcko".to_string()]);
        assert!(!groups.contains_key("descriptor"));
    }
}
