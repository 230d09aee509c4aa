use super::cache::{CacheKey, CacheStatus, ColumnCache, hash_cells, hash_matrix};
use super::grouping::group_scaffolds;
use super::progress::{Progress, ProgressReporter};
use crate::core::chem::{Molecule, SmilesError, parse_smiles, write_smiles};
use crate::core::descriptors::Descriptor;
use crate::core::io::traits::TableFile;
use crate::core::io::tsv::{TsvError, TsvFile};
use crate::core::manifold::{Manifold, ManifoldError};
use crate::core::models::columns::{
    ColumnKind, ColumnRegistry, GroupKind, SCAFFOLD_PREFIX, descriptor_column, manifold_column,
    scaffold_column, scaffold_group_column,
};
use crate::core::models::frame::{Column, ColumnData, Frame, FrameError};
use crate::core::scaffolds::Scaffold;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_SMILES_COLUMN: &str = "SMILES";

const BATCH_SIZE: usize = 256;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read table '{path}': {source}")]
    Read { path: String, source: TsvError },

    #[error("Failed to write table '{path}': {source}")]
    Write { path: String, source: TsvError },

    #[error("Failed to write column cache for '{path}': {source}")]
    Cache { path: String, source: io::Error },

    #[error("SMILES column '{column}' not found in table")]
    MissingSmilesColumn { column: String },

    #[error("Column '{0}' not found in table")]
    MissingColumn(String),

    #[error("Table has no descriptor columns; add descriptors before computing a manifold")]
    NoDescriptors,

    #[error("Table has no scaffold columns; add scaffolds before grouping them")]
    NoScaffolds,

    #[error("Generator '{0}' was requested more than once")]
    DuplicateGenerator(String),

    #[error("Invalid table layout: {0}")]
    Frame(#[from] FrameError),

    #[error("Manifold embedding failed: {0}")]
    Manifold(#[from] ManifoldError),
}

/// Freshly computed columns of one group, ready to be stored.
struct ComputedGroup {
    columns: Vec<Column>,
    axis_titles: Vec<String>,
}

/// A compound table backed by a TSV file.
///
/// Derived columns (descriptors, scaffolds, scaffold groups, manifold
/// coordinates) are appended lazily on first request and reused afterwards.
/// Every mutation writes the table and its column cache back to disk.
#[derive(Debug, Clone)]
pub struct MoleculeTable {
    path: PathBuf,
    frame: Frame,
    registry: ColumnRegistry,
    cache: ColumnCache,
}

impl MoleculeTable {
    /// Opens an existing table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Read`] if the file cannot be parsed and
    /// [`TableError::MissingSmilesColumn`] if it lacks the SMILES column.
    pub fn open(path: impl AsRef<Path>, smiles_column: &str) -> Result<Self, TableError> {
        let path = path.as_ref().to_path_buf();
        let cache = ColumnCache::load(&path);
        let registry = registry_for(smiles_column, &cache);
        let frame = TsvFile::read_from_path(&path, &registry).map_err(|source| TableError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if !frame.contains(smiles_column) {
            return Err(TableError::MissingSmilesColumn {
                column: smiles_column.to_string(),
            });
        }
        info!(
            path = %path.display(),
            rows = frame.row_count(),
            columns = frame.column_count(),
            "Loaded molecule table."
        );
        Ok(Self {
            path,
            frame,
            registry,
            cache,
        })
    }

    /// Creates a table holding only a SMILES column and writes it to `path`.
    ///
    /// With `use_existing`, an existing file at `path` is opened instead and
    /// `smiles` is ignored.
    pub fn from_smiles(
        path: impl AsRef<Path>,
        smiles: Vec<String>,
        smiles_column: &str,
        use_existing: bool,
    ) -> Result<Self, TableError> {
        let path = path.as_ref();
        if use_existing && path.exists() {
            info!(path = %path.display(), "Reusing existing table.");
            return Self::open(path, smiles_column);
        }
        let column = Column::text(smiles_column, smiles.into_iter().map(Some).collect());
        Self::from_frame(path, Frame::from_columns(vec![column])?, smiles_column)
    }

    /// Wraps an in-memory frame and writes it to `path`, replacing any previous cache.
    pub fn from_frame(
        path: impl AsRef<Path>,
        frame: Frame,
        smiles_column: &str,
    ) -> Result<Self, TableError> {
        if !frame.contains(smiles_column) {
            return Err(TableError::MissingSmilesColumn {
                column: smiles_column.to_string(),
            });
        }
        let table = Self {
            path: path.as_ref().to_path_buf(),
            frame,
            registry: ColumnRegistry::new(smiles_column),
            cache: ColumnCache::new(),
        };
        table.save()?;
        Ok(table)
    }

    pub fn save(&self) -> Result<(), TableError> {
        self.save_to(&self.path)
    }

    /// Writes the table and its column cache to `path`. The table stays bound to its own path.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let path = path.as_ref();
        TsvFile::write_to_path(&self.frame, path).map_err(|source| TableError::Write {
            path: path.display().to_string(),
            source,
        })?;
        self.cache.save(path).map_err(|source| TableError::Cache {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Table saved.");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn cache(&self) -> &ColumnCache {
        &self.cache
    }

    pub fn registry(&self) -> &ColumnRegistry {
        &self.registry
    }

    pub fn smiles_column(&self) -> &str {
        self.registry.smiles_column()
    }

    pub fn smiles(&self) -> Vec<Option<String>> {
        let Some(column) = self.frame.column(self.smiles_column()) else {
            return vec![None; self.row_count()];
        };
        (0..self.row_count()).map(|row| column.data.text(row)).collect()
    }

    pub fn row_count(&self) -> usize {
        self.frame.row_count()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.frame.column_names()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.frame.column(name)
    }

    pub fn classify(&self, name: &str) -> ColumnKind {
        self.registry.classify(name)
    }

    /// A frame with the columns whose names start with `prefix`.
    pub fn subset(&self, prefix: &str) -> Frame {
        let columns = self.frame.with_prefix(prefix).into_iter().cloned().collect();
        Frame::from_columns(columns).unwrap_or_default()
    }

    fn names_of(&self, group: GroupKind) -> Vec<String> {
        self.frame
            .column_names()
            .into_iter()
            .filter(|name| self.registry.classify(name).group() == Some(group))
            .map(String::from)
            .collect()
    }

    pub fn descriptor_names(&self) -> Vec<String> {
        self.names_of(GroupKind::Descriptor)
    }

    pub fn scaffold_names(&self) -> Vec<String> {
        self.names_of(GroupKind::Scaffold)
    }

    pub fn scaffold_group_names(&self) -> Vec<String> {
        self.names_of(GroupKind::ScaffoldGroup)
    }

    pub fn has_descriptors(&self) -> bool {
        !self.descriptor_names().is_empty()
    }

    pub fn has_scaffolds(&self) -> bool {
        !self.scaffold_names().is_empty()
    }

    pub fn has_scaffold_groups(&self) -> bool {
        !self.scaffold_group_names().is_empty()
    }

    /// All descriptor columns in table order, one row per molecule. Missing cells read as 0.
    pub fn descriptor_matrix(&self) -> DMatrix<f64> {
        let names = self.descriptor_names();
        let columns: Vec<&Column> = names.iter().filter_map(|n| self.frame.column(n)).collect();
        DMatrix::from_fn(self.row_count(), columns.len(), |row, col| {
            columns[col].data.number(row).unwrap_or(0.0)
        })
    }

    /// Adds or replaces a column and persists the table.
    ///
    /// Replacing a derived column drops its cache record, so the group is
    /// recomputed the next time it is requested.
    pub fn add_data(&mut self, name: &str, data: ColumnData) -> Result<(), TableError> {
        self.frame.insert(Column::new(name, data))?;
        if self.cache.forget_column(name) > 0 {
            debug!(column = name, "Overwritten column invalidated its cache record.");
        }
        self.save()
    }

    /// Removes a column and persists the table.
    pub fn remove_data(&mut self, name: &str) -> Result<Column, TableError> {
        let removed = self
            .frame
            .remove(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        self.cache.forget_column(name);
        info!(column = name, "Removed column.");
        self.save()?;
        Ok(removed)
    }

    /// Removes several columns and persists once. Unknown names are an error and nothing is removed.
    pub fn remove_columns(&mut self, names: &[String]) -> Result<Vec<Column>, TableError> {
        if let Some(missing) = names.iter().find(|name| !self.frame.contains(name)) {
            return Err(TableError::MissingColumn(missing.clone()));
        }
        let mut removed = Vec::with_capacity(names.len());
        for name in names {
            if let Some(column) = self.frame.remove(name) {
                self.cache.forget_column(name);
                removed.push(column);
            }
        }
        info!(columns = removed.len(), "Removed columns.");
        self.save()?;
        Ok(removed)
    }

    /// Computes descriptor columns `Descriptor_<label>_<index>` for each generator.
    ///
    /// Returns the names of all descriptor columns of the requested generators.
    /// Molecules that fail to parse receive the generator's placeholder vector.
    pub fn add_descriptors<D: Descriptor>(
        &mut self,
        generators: &[D],
        recalculate: bool,
        reporter: &ProgressReporter,
    ) -> Result<Vec<String>, TableError> {
        ensure_unique(generators.iter().map(|g| g.label()))?;
        let input_hash = self.smiles_hash();
        let mut names = Vec::new();
        for generator in generators {
            let label = generator.label();
            let key = CacheKey::new(
                GroupKind::Descriptor,
                &label,
                generator.params(),
                &input_hash,
            );
            let expected = (0..generator.len())
                .map(|index| descriptor_column(&label, index))
                .collect();
            names.extend(self.ensure_group(&key, expected, recalculate, |table| {
                Ok(table.compute_descriptors(generator, reporter))
            })?);
        }
        Ok(names)
    }

    /// Computes a `Scaffold_<label>` column of canonical scaffold SMILES for each generator.
    ///
    /// Acyclic molecules and unparsable SMILES leave the cell empty.
    pub fn add_scaffolds<S: Scaffold>(
        &mut self,
        generators: &[S],
        recalculate: bool,
        reporter: &ProgressReporter,
    ) -> Result<Vec<String>, TableError> {
        ensure_unique(generators.iter().map(|g| g.label()))?;
        let input_hash = self.smiles_hash();
        let mut names = Vec::new();
        for generator in generators {
            let label = generator.label();
            let key = CacheKey::new(GroupKind::Scaffold, &label, generator.params(), &input_hash);
            names.extend(self.ensure_group(
                &key,
                vec![scaffold_column(&label)],
                recalculate,
                |table| Ok(table.compute_scaffolds(generator, reporter)),
            )?);
        }
        Ok(names)
    }

    /// Groups every scaffold column with the given threshold.
    ///
    /// Scaffolds shared by fewer than `mols_per_group` molecules are labelled
    /// `Other`. Results go to `ScaffoldGroup_<scaffold column>_<mols_per_group>`,
    /// so groupings with different thresholds coexist.
    pub fn create_scaffold_groups(&mut self, mols_per_group: usize) -> Result<Vec<String>, TableError> {
        let scaffolds = self.scaffold_names();
        if scaffolds.is_empty() {
            return Err(TableError::NoScaffolds);
        }
        let mut names = Vec::new();
        for scaffold in scaffolds {
            let values = self.text_values(&scaffold)?;
            let input_hash = hash_cells(values.iter().map(|v| v.as_deref()));
            let name = scaffold_group_column(&scaffold, mols_per_group);
            let key = CacheKey::new(
                GroupKind::ScaffoldGroup,
                format!("{}_{}", scaffold, mols_per_group),
                format!("mols_per_group={}", mols_per_group),
                input_hash,
            );
            names.extend(self.ensure_group(&key, vec![name.clone()], false, |_| {
                let groups = group_scaffolds(&values, mols_per_group);
                Ok(ComputedGroup {
                    columns: vec![Column::text(name.clone(), groups)],
                    axis_titles: Vec::new(),
                })
            })?);
        }
        Ok(names)
    }

    /// The grouping of one scaffold column at the given threshold.
    ///
    /// `scaffold` may be the column name (`Scaffold_Murcko`) or the generator label (`Murcko`).
    pub fn scaffold_groups(&self, scaffold: &str, mols_per_group: usize) -> Result<&Column, TableError> {
        let scaffold = if scaffold.starts_with(SCAFFOLD_PREFIX) {
            scaffold.to_string()
        } else {
            scaffold_column(scaffold)
        };
        let name = scaffold_group_column(&scaffold, mols_per_group);
        self.frame
            .column(&name)
            .ok_or(TableError::MissingColumn(name))
    }

    /// Projects the descriptor matrix and stores the coordinates as `<label>_<dim>`.
    ///
    /// Returns the coordinate column names, dimension 1 first.
    pub fn add_manifold_data(
        &mut self,
        manifold: &dyn Manifold,
        recalculate: bool,
    ) -> Result<Vec<String>, TableError> {
        let names = self.descriptor_names();
        if names.is_empty() {
            return Err(TableError::NoDescriptors);
        }
        let label = manifold.label();
        self.registry.register_manifold(&label);

        let matrix = self.descriptor_matrix();
        let key = CacheKey::new(
            GroupKind::Manifold,
            &label,
            manifold.params(),
            hash_matrix(&names, &matrix),
        );
        let existing = self.manifold_names(&label);
        let mismatched = !existing.is_empty() && existing.len() != manifold.components();
        if mismatched {
            info!(
                manifold = %label,
                found = existing.len(),
                components = manifold.components(),
                "Existing coordinate columns do not match the requested dimensions."
            );
        }
        self.ensure_group(&key, existing, recalculate || mismatched, |_| {
            info!(
                manifold = %label,
                samples = matrix.nrows(),
                features = matrix.ncols(),
                "Computing manifold embedding."
            );
            let embedding = manifold.fit_transform(&matrix)?;
            let columns = embedding
                .coordinates
                .column_iter()
                .enumerate()
                .map(|(dim, values)| {
                    Column::numeric(
                        manifold_column(&label, dim + 1),
                        values.iter().copied().map(Some).collect(),
                    )
                })
                .collect();
            Ok(ComputedGroup {
                columns,
                axis_titles: embedding.axis_titles,
            })
        })
    }

    /// The coordinate columns of one manifold, dimension 1 first.
    pub fn manifold_data(&self, label: &str) -> Frame {
        let columns = self
            .manifold_names(label)
            .iter()
            .filter_map(|name| self.frame.column(name).cloned())
            .collect();
        Frame::from_columns(columns).unwrap_or_default()
    }

    /// Axis titles recorded for a manifold, falling back to the column names.
    pub fn manifold_axis_titles(&self, label: &str) -> Vec<String> {
        match self.cache.entry(GroupKind::Manifold, label) {
            Some(entry) if !entry.axis_titles.is_empty() => entry.axis_titles.clone(),
            _ => self.manifold_names(label),
        }
    }

    fn manifold_names(&self, label: &str) -> Vec<String> {
        let mut dims: Vec<(usize, String)> = self
            .frame
            .column_names()
            .into_iter()
            .filter_map(|name| match self.registry.classify(name) {
                ColumnKind::Manifold { method, dim } if method == label => {
                    Some((dim, name.to_string()))
                }
                _ => None,
            })
            .collect();
        dims.sort();
        dims.into_iter().map(|(_, name)| name).collect()
    }

    fn text_values(&self, name: &str) -> Result<Vec<Option<String>>, TableError> {
        let column = self
            .frame
            .column(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        Ok((0..self.row_count()).map(|row| column.data.text(row)).collect())
    }

    fn smiles_hash(&self) -> String {
        let smiles = self.smiles();
        hash_cells(smiles.iter().map(|s| s.as_deref()))
    }

    /// Serves a column group from the table when its record is current, or computes it.
    ///
    /// Present columns without a cache record are adopted as they are. A
    /// record with a different fingerprint marks the group stale: its old
    /// columns are dropped and the group is recomputed.
    fn ensure_group<F>(
        &mut self,
        key: &CacheKey,
        expected: Vec<String>,
        recalculate: bool,
        compute: F,
    ) -> Result<Vec<String>, TableError>
    where
        F: FnOnce(&Self) -> Result<ComputedGroup, TableError>,
    {
        let present = !expected.is_empty() && expected.iter().all(|c| self.frame.contains(c));
        let status = self.cache.status(key);

        if present && !recalculate {
            match status {
                CacheStatus::Fresh => {
                    debug!(slot = %key.slot(), "Column group is up to date.");
                    return Ok(expected);
                }
                CacheStatus::Unknown => {
                    info!(slot = %key.slot(), "Adopting existing columns into the column cache.");
                    self.cache.record(key, expected.clone(), Vec::new());
                    self.save()?;
                    return Ok(expected);
                }
                CacheStatus::Stale => {
                    info!(slot = %key.slot(), "Parameters or input changed; recomputing column group.");
                }
            }
        }

        let computed = compute(&*self)?;

        let mut obsolete: Vec<String> = expected;
        if let Some(entry) = self.cache.forget(key.kind, &key.generator) {
            obsolete.extend(entry.columns);
        }
        for name in &obsolete {
            self.frame.remove(name);
        }

        let names: Vec<String> = computed.columns.iter().map(|c| c.name.clone()).collect();
        for column in computed.columns {
            self.cache.forget_column(&column.name);
            self.frame.insert(column)?;
        }
        self.cache.record(key, names.clone(), computed.axis_titles);
        self.save()?;
        info!(slot = %key.slot(), columns = names.len(), "Stored column group.");
        Ok(names)
    }

    fn compute_descriptors(&self, generator: &dyn Descriptor, reporter: &ProgressReporter) -> ComputedGroup {
        let label = generator.label();
        let width = generator.len();
        let rows = self.map_molecules(&label, reporter, |mol| generator.compute(mol));
        let failures = rows.iter().filter(|row| row.is_none()).count();
        if failures > 0 {
            warn!(
                generator = %label,
                failures,
                "Some molecules could not be parsed; their descriptors are placeholders."
            );
        }
        let placeholder = generator.placeholder();
        let rows: Vec<&Vec<f64>> = rows
            .iter()
            .map(|row| row.as_ref().unwrap_or(&placeholder))
            .collect();
        let columns = (0..width)
            .map(|index| {
                Column::numeric(
                    descriptor_column(&label, index),
                    rows.iter().map(|row| row.get(index).copied()).collect(),
                )
            })
            .collect();
        ComputedGroup {
            columns,
            axis_titles: Vec::new(),
        }
    }

    fn compute_scaffolds(&self, generator: &dyn Scaffold, reporter: &ProgressReporter) -> ComputedGroup {
        let label = generator.label();
        let values = self.map_molecules(&label, reporter, |mol| {
            write_smiles(&generator.scaffold(mol))
        });
        let failures = values.iter().filter(|v| v.is_none()).count();
        if failures > 0 {
            warn!(
                generator = %label,
                failures,
                "Some molecules could not be parsed; their scaffolds are left empty."
            );
        }
        let cells = values
            .into_iter()
            .map(|value| value.filter(|smiles| !smiles.is_empty()))
            .collect();
        ComputedGroup {
            columns: vec![Column::text(scaffold_column(&label), cells)],
            axis_titles: Vec::new(),
        }
    }

    /// Parses every SMILES and applies `f` in parallel batches, reporting progress per batch.
    fn map_molecules<T, F>(&self, label: &str, reporter: &ProgressReporter, f: F) -> Vec<Option<T>>
    where
        T: Send,
        F: Fn(&Molecule) -> T + Sync,
    {
        let smiles = self.smiles();
        reporter.report(Progress::StatusUpdate {
            text: label.to_string(),
        });
        reporter.report(Progress::TaskStart {
            total: smiles.len() as u64,
        });
        let mut results = Vec::with_capacity(smiles.len());
        for (batch, chunk) in smiles.chunks(BATCH_SIZE).enumerate() {
            let parsed: Vec<Result<T, SmilesError>> = chunk
                .par_iter()
                .map(|cell| parse_smiles(cell.as_deref().unwrap_or("")).map(|mol| f(&mol)))
                .collect();
            for (offset, result) in parsed.into_iter().enumerate() {
                match result {
                    Ok(value) => results.push(Some(value)),
                    Err(e) => {
                        debug!(
                            row = batch * BATCH_SIZE + offset,
                            generator = label,
                            "Could not parse SMILES: {}",
                            e
                        );
                        results.push(None);
                    }
                }
            }
            reporter.report(Progress::TaskIncrement {
                amount: chunk.len() as u64,
            });
        }
        reporter.report(Progress::TaskFinish);
        results
    }
}

fn registry_for(smiles_column: &str, cache: &ColumnCache) -> ColumnRegistry {
    let mut registry = ColumnRegistry::new(smiles_column);
    for entry in cache.entries().filter(|e| e.kind == GroupKind::Manifold) {
        registry.register_manifold(entry.generator.clone());
    }
    registry
}

fn ensure_unique(labels: impl Iterator<Item = String>) -> Result<(), TableError> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.clone()) {
            return Err(TableError::DuplicateGenerator(label));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptors::DescriptorKind;
    use crate::core::manifold::{ManifoldKind, Pca};
    use crate::core::scaffolds::ScaffoldKind;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const COMPOUNDS: &[&str] = &[
        "c1ccccc1CCO",
        "c1ccccc1CC(=O)O",
        "c1ccccc1C",
        "C1CCCCC1N",
        "C1CCCCC1CC",
        "CCCC",
        "not a smiles",
        "c1ccncc1O",
    ];

    fn table() -> (TempDir, MoleculeTable) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("compounds.tsv");
        let smiles = COMPOUNDS.iter().map(|s| s.to_string()).collect();
        let table = MoleculeTable::from_smiles(&path, smiles, DEFAULT_SMILES_COLUMN, false).unwrap();
        (dir, table)
    }

    fn physchem() -> [DescriptorKind; 1] {
        [DescriptorKind::Physchem]
    }

    #[test]
    fn open_requires_smiles_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tsv");
        fs::write(&path, "Name\tValue\na\t1\n").unwrap();
        assert!(matches!(
            MoleculeTable::open(&path, "SMILES"),
            Err(TableError::MissingSmilesColumn { .. })
        ));
    }

    #[test]
    fn descriptors_are_named_and_persisted() {
        let (_dir, mut table) = table();
        let names = table
            .add_descriptors(&physchem(), false, &ProgressReporter::new())
            .unwrap();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "Descriptor_Physchem_0");
        assert!(table.has_descriptors());

        let reopened = MoleculeTable::open(table.path(), "SMILES").unwrap();
        assert_eq!(reopened.descriptor_names(), names);
        assert_eq!(reopened.descriptor_matrix(), table.descriptor_matrix());
        assert!(ColumnCache::sidecar_path(table.path()).exists());
    }

    #[test]
    fn unparsable_smiles_get_placeholder_rows() {
        let (_dir, mut table) = table();
        table
            .add_descriptors(&physchem(), false, &ProgressReporter::new())
            .unwrap();
        let matrix = table.descriptor_matrix();
        assert_eq!(matrix.nrows(), COMPOUNDS.len());
        assert!(matrix.row(6).iter().all(|&v| v == 0.0));
        assert!(matrix.row(0).iter().any(|&v| v != 0.0));
    }

    #[test]
    fn repeated_requests_are_idempotent() {
        let (_dir, mut table) = table();
        let reporter = ProgressReporter::new();
        table.add_descriptors(&physchem(), false, &reporter).unwrap();
        table.add_scaffolds(&[ScaffoldKind::Murcko], false, &reporter).unwrap();
        let before = table.frame().clone();
        let on_disk = fs::read_to_string(table.path()).unwrap();

        table.add_descriptors(&physchem(), false, &reporter).unwrap();
        table.add_scaffolds(&[ScaffoldKind::Murcko], false, &reporter).unwrap();

        assert_eq!(table.frame(), &before);
        assert_eq!(fs::read_to_string(table.path()).unwrap(), on_disk);
    }

    #[test]
    fn changed_parameters_recompute_the_group_in_place() {
        let (_dir, mut table) = table();
        let reporter = ProgressReporter::new();
        let small = [DescriptorKind::MorganFp { radius: 2, n_bits: 64 }];
        let large = [DescriptorKind::MorganFp { radius: 2, n_bits: 128 }];
        table.add_descriptors(&small, false, &reporter).unwrap();
        assert_eq!(table.descriptor_names().len(), 64);

        let names = table.add_descriptors(&large, false, &reporter).unwrap();
        assert_eq!(names.len(), 128);
        assert_eq!(table.descriptor_names().len(), 128);
    }

    #[test]
    fn legacy_columns_without_cache_record_are_adopted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.tsv");
        fs::write(&path, "SMILES\tScaffold_Murcko\nCCO\tlegacy\n").unwrap();
        let mut table = MoleculeTable::open(&path, "SMILES").unwrap();
        table
            .add_scaffolds(&[ScaffoldKind::Murcko], false, &ProgressReporter::new())
            .unwrap();
        assert_eq!(
            table.column("Scaffold_Murcko").unwrap().data.text(0).as_deref(),
            Some("legacy")
        );
        assert!(table.cache().entry(GroupKind::Scaffold, "Murcko").is_some());

        table
            .add_scaffolds(&[ScaffoldKind::Murcko], true, &ProgressReporter::new())
            .unwrap();
        assert_eq!(table.column("Scaffold_Murcko").unwrap().data.text(0), None);
    }

    #[test]
    fn scaffolds_are_canonical_and_grouped_by_threshold() {
        let (_dir, mut table) = table();
        let names = table
            .add_scaffolds(&[ScaffoldKind::Murcko], false, &ProgressReporter::new())
            .unwrap();
        assert_eq!(names, vec!["Scaffold_Murcko"]);
        let scaffolds = table.column("Scaffold_Murcko").unwrap();
        assert_eq!(scaffolds.data.text(0).as_deref(), Some("c1ccccc1"));
        assert_eq!(scaffolds.data.text(5), None);
        assert_eq!(scaffolds.data.text(6), None);

        let groups = table.create_scaffold_groups(3).unwrap();
        assert_eq!(groups, vec!["ScaffoldGroup_Scaffold_Murcko_3"]);
        table.create_scaffold_groups(2).unwrap();
        assert_eq!(table.scaffold_group_names().len(), 2);

        let grouped = table.scaffold_groups("Murcko", 3).unwrap();
        assert_eq!(grouped.data.text(0).as_deref(), Some("c1ccccc1"));
        assert_eq!(grouped.data.text(3).as_deref(), Some("Other"));
        let pairs = table.scaffold_groups("Scaffold_Murcko", 2).unwrap();
        assert_eq!(pairs.data.text(3).as_deref(), Some("C1CCCCC1"));
    }

    #[test]
    fn spelling_variants_of_one_scaffold_share_a_group() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spellings.tsv");
        let smiles = [
            "c1ccc(-c2ccccc2)cc1C",
            "Cc1ccccc1c1ccccc1",
            "C1=CC=CC=C1CC",
            "c1ccccc1CCO",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mut table = MoleculeTable::from_smiles(&path, smiles, DEFAULT_SMILES_COLUMN, false).unwrap();
        table
            .add_scaffolds(&[ScaffoldKind::Murcko], false, &ProgressReporter::new())
            .unwrap();
        table.create_scaffold_groups(2).unwrap();

        let groups = table.scaffold_groups("Murcko", 2).unwrap();
        let values: Vec<Option<String>> = (0..4).map(|row| groups.data.text(row)).collect();
        assert_eq!(values[0].as_deref(), Some("c1ccc(cc1)-c1ccccc1"));
        assert_eq!(values[0], values[1]);
        assert_eq!(values[2].as_deref(), Some("c1ccccc1"));
        assert_eq!(values[2], values[3]);
    }

    #[test]
    fn grouping_without_scaffolds_fails() {
        let (_dir, mut table) = table();
        assert!(matches!(
            table.create_scaffold_groups(5),
            Err(TableError::NoScaffolds)
        ));
    }

    #[test]
    fn manifold_columns_are_one_based_and_reused() {
        let (_dir, mut table) = table();
        let reporter = ProgressReporter::new();
        assert!(matches!(
            table.add_manifold_data(&ManifoldKind::Pca(Pca::default()), false),
            Err(TableError::NoDescriptors)
        ));

        table.add_descriptors(&physchem(), false, &reporter).unwrap();
        let pca = ManifoldKind::Pca(Pca::default());
        let names = table.add_manifold_data(&pca, false).unwrap();
        assert_eq!(names, vec!["PCA_1", "PCA_2"]);
        let titles = table.manifold_axis_titles("PCA");
        assert!(titles[0].starts_with("PC_1 ("));

        let before = table.frame().clone();
        assert_eq!(table.add_manifold_data(&pca, false).unwrap(), names);
        assert_eq!(table.frame(), &before);

        let reopened = MoleculeTable::open(table.path(), "SMILES").unwrap();
        let coordinates = reopened.manifold_data("PCA");
        assert_eq!(coordinates.column_names(), vec!["PCA_1", "PCA_2"]);
        assert!(coordinates.column("PCA_1").unwrap().data.is_numeric());
    }

    #[test]
    fn leftover_dimensions_are_not_adopted() {
        let (_dir, mut table) = table();
        table
            .add_descriptors(&physchem(), false, &ProgressReporter::new())
            .unwrap();
        table
            .add_manifold_data(&ManifoldKind::Pca(Pca::new(3)), false)
            .unwrap();
        fs::remove_file(ColumnCache::sidecar_path(table.path())).unwrap();

        let mut reopened = MoleculeTable::open(table.path(), "SMILES").unwrap();
        let names = reopened
            .add_manifold_data(&ManifoldKind::Pca(Pca::default()), false)
            .unwrap();
        assert_eq!(names, vec!["PCA_1", "PCA_2"]);
        assert!(reopened.column("PCA_3").is_none());
        assert_eq!(reopened.manifold_data("PCA").column_names(), vec!["PCA_1", "PCA_2"]);
    }

    #[test]
    fn removing_a_column_invalidates_its_group() {
        let (_dir, mut table) = table();
        table
            .add_scaffolds(&[ScaffoldKind::Murcko], false, &ProgressReporter::new())
            .unwrap();
        table.remove_data("Scaffold_Murcko").unwrap();
        assert!(!table.has_scaffolds());
        assert!(table.cache().entry(GroupKind::Scaffold, "Murcko").is_none());
        assert!(matches!(
            table.remove_data("Scaffold_Murcko"),
            Err(TableError::MissingColumn(_))
        ));
    }

    #[test]
    fn removing_several_columns_is_all_or_nothing() {
        let (_dir, mut table) = table();
        let names = table
            .add_descriptors(&physchem(), false, &ProgressReporter::new())
            .unwrap();
        let mut request = names.clone();
        request.push("Missing".to_string());
        assert!(matches!(
            table.remove_columns(&request),
            Err(TableError::MissingColumn(name)) if name == "Missing"
        ));
        assert!(table.has_descriptors());

        let removed = table.remove_columns(&names).unwrap();
        assert_eq!(removed.len(), names.len());
        let reopened = MoleculeTable::open(table.path(), "SMILES").unwrap();
        assert!(!reopened.has_descriptors());
        assert!(reopened.cache().is_empty());
    }

    #[test]
    fn added_data_survives_a_round_trip() {
        let (_dir, mut table) = table();
        let values = (0..COMPOUNDS.len())
            .map(|i| (i % 2 == 0).then(|| format!("{}", i)))
            .collect();
        table.add_data("Activity", ColumnData::Text(values)).unwrap();
        let reopened = MoleculeTable::open(table.path(), "SMILES").unwrap();
        assert_eq!(reopened.row_count(), COMPOUNDS.len());
        assert_eq!(reopened.column("Activity"), table.column("Activity"));
        assert_eq!(reopened.column("SMILES"), table.column("SMILES"));
    }

    #[test]
    fn duplicate_generators_are_rejected() {
        let (_dir, mut table) = table();
        let result = table.add_scaffolds(
            &[ScaffoldKind::Murcko, ScaffoldKind::Murcko],
            false,
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(TableError::DuplicateGenerator(_))));
    }
}
