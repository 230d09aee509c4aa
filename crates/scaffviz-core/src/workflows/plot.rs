use crate::core::manifold::Manifold;
use crate::core::models::columns::{ColumnKind, OTHER_GROUP};
use crate::core::models::frame::Column;
use crate::engine::config::PlotConfig;
use crate::engine::error::EngineError;
use crate::engine::table::MoleculeTable;
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Marker symbols assigned to scaffold groups, in order of first appearance.
pub const SYMBOL_SEQUENCE: [&str; 11] = [
    "circle",
    "square",
    "diamond",
    "cross",
    "x",
    "pentagon",
    "hexagram",
    "star",
    "diamond",
    "hourglass",
    "bowtie",
];

const QUALITATIVE_PALETTE: [&str; 10] = [
    "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692", "#b6e880",
    "#ff97ff", "#fecb52",
];
const OTHER_COLOR: &str = "lightgrey";
const CONTINUOUS_SCALE: &str = "Plasma";
const BACKGROUND: &str = "white";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub column: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Coloring {
    None,
    Discrete {
        column: String,
        categories: Vec<Category>,
    },
    Continuous {
        column: String,
        scale: String,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub row: usize,
    pub x: f64,
    pub y: f64,
    /// Index into the discrete categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<usize>,
    /// Value on the continuous colour scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    pub title: Option<String>,
    /// One SMILES per structure column, in [`Cards::structure_columns`] order.
    pub structures: Vec<Option<String>>,
    /// One value per caption column, in [`Cards::caption_columns`] order.
    pub captions: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cards {
    pub title_column: String,
    pub structure_columns: Vec<String>,
    pub caption_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub background: String,
}

/// A scatter plot of a molecule table, ready to be rendered by a viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPlot {
    pub x: Axis,
    pub y: Axis,
    pub coloring: Coloring,
    pub cards: Cards,
    pub layout: Layout,
    pub points: Vec<Point>,
}

/// Builds the scatter plot of `table`.
///
/// The axes are the first two manifold dimensions unless `config.x` / `config.y`
/// override them. Without an explicit colour column, the first scaffold column
/// is grouped with `config.mols_per_group` and drives both colour and marker
/// symbol. Manifold coordinates and scaffold groups are computed and persisted
/// if missing.
///
/// # Errors
///
/// Returns [`EngineError::NoAxes`] if neither a manifold nor both axes are
/// given, and [`EngineError::MissingColumn`] for unknown column names.
#[instrument(skip_all, name = "plot_workflow")]
pub fn build(
    table: &mut MoleculeTable,
    config: &PlotConfig,
    manifold: Option<&dyn Manifold>,
    recalculate: bool,
) -> Result<ScatterPlot, EngineError> {
    let (manifold_columns, manifold_titles) = match manifold {
        Some(manifold) => {
            let columns = table.add_manifold_data(manifold, recalculate)?;
            let titles = table.manifold_axis_titles(&manifold.label());
            (columns, titles)
        }
        None => (Vec::new(), Vec::new()),
    };

    let axis = |explicit: &Option<String>, dim: usize| -> Result<Axis, EngineError> {
        match explicit {
            Some(column) => Ok(Axis {
                column: column.clone(),
                title: column.clone(),
            }),
            None => {
                let column = manifold_columns.get(dim).cloned().ok_or(EngineError::NoAxes)?;
                let title = manifold_titles.get(dim).cloned().unwrap_or_else(|| column.clone());
                Ok(Axis { column, title })
            }
        }
    };
    let x = axis(&config.x, 0)?;
    let y = axis(&config.y, 1)?;

    let mut scaffold_coloring = false;
    let color_column = match &config.color_by {
        Some(column) => Some(column.clone()),
        None if table.has_scaffolds() => {
            let scaffold = table.scaffold_names()[0].clone();
            table.create_scaffold_groups(config.mols_per_group)?;
            let groups = table.scaffold_groups(&scaffold, config.mols_per_group)?;
            scaffold_coloring = true;
            Some(groups.name.clone())
        }
        None => None,
    };

    let x_column = require(table, &x.column)?;
    let y_column = require(table, &y.column)?;
    let color = color_column
        .as_deref()
        .map(|name| require(table, name))
        .transpose()?;

    let cards = card_spec(table, config, &manifold_columns);
    let title_column = table.column(&cards.title_column);
    let structure_columns: Vec<Option<&Column>> = cards
        .structure_columns
        .iter()
        .map(|name| table.column(name))
        .collect();
    let caption_columns: Vec<Option<&Column>> = cards
        .caption_columns
        .iter()
        .map(|name| table.column(name))
        .collect();

    let continuous = color
        .filter(|column| !scaffold_coloring && column.data.is_numeric_like())
        .map(|column| column.data.clone());
    let mut categories: Vec<String> = Vec::new();

    let mut points = Vec::with_capacity(table.row_count());
    let mut skipped = 0usize;
    for row in 0..table.row_count() {
        let (Some(px), Some(py)) = (x_column.data.number(row), y_column.data.number(row)) else {
            skipped += 1;
            continue;
        };
        let (category, value) = match (color, &continuous) {
            (Some(_), Some(data)) => (None, data.number(row)),
            (Some(column), None) => {
                let name = column.data.text(row).unwrap_or_default();
                let index = match categories.iter().position(|c| *c == name) {
                    Some(index) => index,
                    None => {
                        categories.push(name);
                        categories.len() - 1
                    }
                };
                (Some(index), None)
            }
            (None, _) => (None, None),
        };
        points.push(Point {
            row,
            x: px,
            y: py,
            category,
            value,
            title: title_column.and_then(|c| c.data.text(row)),
            structures: structure_columns
                .iter()
                .map(|c| c.and_then(|c| c.data.text(row)))
                .collect(),
            captions: caption_columns
                .iter()
                .map(|c| c.and_then(|c| c.data.text(row)))
                .collect(),
        });
    }
    if skipped > 0 {
        debug!(skipped, "Rows without coordinates were left out of the plot.");
    }

    let coloring = match (color_column, continuous) {
        (Some(column), Some(_)) => {
            let values = points.iter().filter_map(|p| p.value);
            let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            Coloring::Continuous {
                column,
                scale: CONTINUOUS_SCALE.to_string(),
                min: if min.is_finite() { min } else { 0.0 },
                max: if max.is_finite() { max } else { 0.0 },
            }
        }
        (Some(column), None) => Coloring::Discrete {
            column,
            categories: discrete_categories(categories, scaffold_coloring),
        },
        (None, _) => Coloring::None,
    };

    info!(
        points = points.len(),
        x = %x.column,
        y = %y.column,
        "Scatter plot assembled."
    );
    Ok(ScatterPlot {
        x,
        y,
        coloring,
        cards,
        layout: Layout {
            width: config.width,
            height: config.height,
            background: BACKGROUND.to_string(),
        },
        points,
    })
}

fn require<'a>(table: &'a MoleculeTable, name: &str) -> Result<&'a Column, EngineError> {
    table
        .column(name)
        .ok_or_else(|| EngineError::MissingColumn(name.to_string()))
}

/// Colours follow the qualitative palette; `Other` is always grey. Scaffold
/// groups additionally cycle through [`SYMBOL_SEQUENCE`].
fn discrete_categories(names: Vec<String>, with_symbols: bool) -> Vec<Category> {
    let mut palette = QUALITATIVE_PALETTE.iter().cycle();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let color = if name == OTHER_GROUP {
                OTHER_COLOR.to_string()
            } else {
                palette.next().copied().unwrap_or(OTHER_COLOR).to_string()
            };
            let symbol = with_symbols
                .then(|| SYMBOL_SEQUENCE[index % SYMBOL_SEQUENCE.len()].to_string());
            Category {
                name,
                color,
                symbol,
            }
        })
        .collect()
}

/// Hover-card layout: the title, the structures to draw and the captions.
///
/// Captions are the requested card columns that exist in the table, minus
/// descriptor and manifold columns, with the title first.
fn card_spec(table: &MoleculeTable, config: &PlotConfig, manifold_columns: &[String]) -> Cards {
    let title_column = config
        .title_column
        .clone()
        .unwrap_or_else(|| table.smiles_column().to_string());

    let mut structure_columns = vec![table.smiles_column().to_string()];
    structure_columns.extend(table.scaffold_names());

    let excluded = |name: &str| {
        manifold_columns.iter().any(|m| m == name)
            || matches!(
                table.classify(name),
                ColumnKind::Descriptor { .. } | ColumnKind::Manifold { .. }
            )
    };
    let mut caption_columns = vec![title_column.clone()];
    for name in table.column_names() {
        if name != title_column
            && config.card_columns.iter().any(|c| c == name)
            && !excluded(name)
        {
            caption_columns.push(name.to_string());
        }
    }

    Cards {
        title_column,
        structure_columns,
        caption_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptors::DescriptorKind;
    use crate::core::manifold::{ManifoldKind, Pca};
    use crate::core::models::frame::{ColumnData, Frame};
    use crate::core::scaffolds::ScaffoldKind;
    use crate::engine::progress::ProgressReporter;
    use tempfile::{TempDir, tempdir};

    fn prepared_table() -> (TempDir, MoleculeTable) {
        let dir = tempdir().unwrap();
        let smiles = [
            "c1ccccc1CCO",
            "c1ccccc1CC",
            "c1ccccc1N",
            "C1CCCCC1O",
            "C1CCCCC1CN",
            "c1ccncc1C",
        ];
        let frame = Frame::from_columns(vec![
            Column::text("ID", (1..=6).map(|i| Some(format!("mol{}", i))).collect()),
            Column::text("SMILES", smiles.iter().map(|s| Some(s.to_string())).collect()),
            Column::text(
                "Activity",
                ["5.1", "6.2", "", "7.3", "4.4", "5.5"]
                    .iter()
                    .map(|s| (!s.is_empty()).then(|| s.to_string()))
                    .collect(),
            ),
        ])
        .unwrap();
        let mut table =
            MoleculeTable::from_frame(dir.path().join("plot.tsv"), frame, "SMILES").unwrap();
        let reporter = ProgressReporter::new();
        table
            .add_descriptors(&[DescriptorKind::Physchem], false, &reporter)
            .unwrap();
        table
            .add_scaffolds(&[ScaffoldKind::Murcko], false, &reporter)
            .unwrap();
        (dir, table)
    }

    fn pca() -> ManifoldKind {
        ManifoldKind::Pca(Pca::default())
    }

    #[test]
    fn axes_are_required() {
        let (_dir, mut table) = prepared_table();
        let result = build(&mut table, &PlotConfig::default(), None, false);
        assert!(matches!(result, Err(EngineError::NoAxes)));
    }

    #[test]
    fn scaffold_groups_drive_colour_and_symbol_by_default() {
        let (_dir, mut table) = prepared_table();
        let config = PlotConfig {
            mols_per_group: 3,
            card_columns: vec!["Activity".into(), "Descriptor_Physchem_0".into()],
            ..PlotConfig::default()
        };
        let plot = build(&mut table, &config, Some(&pca()), false).unwrap();

        assert_eq!(plot.x.column, "PCA_1");
        assert!(plot.x.title.starts_with("PC_1 ("));
        assert_eq!(plot.points.len(), 6);
        assert_eq!(plot.layout.width, 1600);
        assert_eq!(plot.layout.background, "white");

        let Coloring::Discrete { column, categories } = &plot.coloring else {
            panic!("expected discrete coloring, got {:?}", plot.coloring);
        };
        assert_eq!(column, "ScaffoldGroup_Scaffold_Murcko_3");
        assert_eq!(categories[0].name, "c1ccccc1");
        assert_eq!(categories[0].symbol.as_deref(), Some("circle"));
        let other = categories.iter().find(|c| c.name == "Other").unwrap();
        assert_eq!(other.color, "lightgrey");

        assert_eq!(plot.cards.title_column, "SMILES");
        assert_eq!(plot.cards.structure_columns, vec!["SMILES", "Scaffold_Murcko"]);
        assert_eq!(plot.cards.caption_columns, vec!["SMILES", "Activity"]);
        assert_eq!(plot.points[0].captions[1].as_deref(), Some("5.1"));
    }

    #[test]
    fn numeric_colour_column_uses_a_continuous_scale() {
        let (_dir, mut table) = prepared_table();
        let config = PlotConfig {
            color_by: Some("Activity".into()),
            ..PlotConfig::default()
        };
        let plot = build(&mut table, &config, Some(&pca()), false).unwrap();
        match plot.coloring {
            Coloring::Continuous { min, max, .. } => {
                assert_eq!(min, 4.4);
                assert_eq!(max, 7.3);
            }
            other => panic!("expected continuous coloring, got {:?}", other),
        }
        assert_eq!(plot.points[2].value, None);
    }

    #[test]
    fn explicit_axes_work_without_manifold() {
        let (_dir, mut table) = prepared_table();
        table
            .add_data(
                "Score",
                ColumnData::Numeric((0..6).map(|i| Some(i as f64)).collect()),
            )
            .unwrap();
        let config = PlotConfig {
            x: Some("Activity".into()),
            y: Some("Score".into()),
            color_by: Some("ID".into()),
            ..PlotConfig::default()
        };
        let plot = build(&mut table, &config, None, false).unwrap();
        assert_eq!(plot.points.len(), 5);
        assert!(matches!(plot.coloring, Coloring::Discrete { ref categories, .. } if categories.len() == 5));
    }

    #[test]
    fn unknown_colour_column_is_an_error() {
        let (_dir, mut table) = prepared_table();
        let config = PlotConfig {
            color_by: Some("Missing".into()),
            ..PlotConfig::default()
        };
        let result = build(&mut table, &config, Some(&pca()), false);
        assert!(matches!(result, Err(EngineError::MissingColumn(name)) if name == "Missing"));
    }

    #[test]
    fn plot_serializes_to_json() {
        let (_dir, mut table) = prepared_table();
        let plot = build(&mut table, &PlotConfig::default(), Some(&pca()), false).unwrap();
        let json = serde_json::to_value(&plot).unwrap();
        assert_eq!(json["coloring"]["type"], "discrete");
        assert_eq!(json["points"].as_array().unwrap().len(), 6);
    }
}
