use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, ServerConfig};
use crate::cli::{PipelineArgs, PlotOptions, ScaffoldChoice, ServerOptions};
use crate::error::{CliError, Result};
use scaffviz::core::descriptors::DescriptorKind;
use scaffviz::core::manifold::{ManifoldKind, Pca, Tsne, TsneInit};
use scaffviz::core::scaffolds::ScaffoldKind;
use scaffviz::engine::config::PipelineConfigBuilder;
use std::str::FromStr;
use tracing::debug;

/// Resolves the final configuration. Precedence: CLI flag > `--set` > file > defaults.
pub fn build_config(
    pipeline: &PipelineArgs,
    plot: &PlotOptions,
    server: &ServerOptions,
) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = match &pipeline.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let file_config = apply_set_values(file_config, &pipeline.set_values)?;
    debug!("Configuration after --set overrides: {:?}", file_config);

    let table = file_config.table.unwrap_or_default();
    let descriptors = file_config.descriptors.unwrap_or_default();
    let scaffolds = file_config.scaffolds.unwrap_or_default();
    let manifold = file_config.manifold.unwrap_or_default();
    let file_plot = file_config.plot.unwrap_or_default();
    let file_server = file_config.server.unwrap_or_default();

    let smiles_column = pipeline
        .smiles_column
        .clone()
        .or(table.smiles_column)
        .unwrap_or(defaults.smiles_column);

    let mut descriptor_kinds = Vec::new();
    if !pipeline.no_morgan && descriptors.morgan.unwrap_or(defaults.morgan) {
        descriptor_kinds.push(DescriptorKind::MorganFp {
            radius: pipeline
                .morgan_radius
                .or(descriptors.morgan_radius)
                .unwrap_or(defaults.morgan_radius),
            n_bits: pipeline
                .morgan_bits
                .or(descriptors.morgan_bits)
                .unwrap_or(defaults.morgan_bits),
        });
    }
    if pipeline.physchem || descriptors.physchem.unwrap_or(defaults.physchem) {
        descriptor_kinds.push(DescriptorKind::Physchem);
    }

    let scaffold_kinds = if pipeline.scaffolds.is_empty() {
        let mut kinds = Vec::new();
        if scaffolds.murcko.unwrap_or(defaults.murcko) {
            kinds.push(ScaffoldKind::Murcko);
        }
        if scaffolds.generic_murcko.unwrap_or(defaults.generic_murcko) {
            kinds.push(ScaffoldKind::GenericMurcko);
        }
        kinds
    } else {
        let mut kinds: Vec<ScaffoldKind> = Vec::new();
        for choice in &pipeline.scaffolds {
            let kind = match choice {
                ScaffoldChoice::Murcko => ScaffoldKind::Murcko,
                ScaffoldChoice::GenericMurcko => ScaffoldKind::GenericMurcko,
            };
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    };

    let method = pipeline
        .manifold
        .map(|m| m.as_str().to_string())
        .or(manifold.method.clone())
        .unwrap_or(defaults.manifold);
    let components = pipeline.components.or(manifold.components);
    let manifold_kind = match method.as_str() {
        "none" => None,
        "pca" => Some(ManifoldKind::Pca(Pca {
            components: components.unwrap_or(Pca::default().components),
        })),
        "tsne" => {
            let base = Tsne::default();
            Some(ManifoldKind::Tsne(Tsne {
                components: components.unwrap_or(base.components),
                perplexity: pipeline
                    .perplexity
                    .or(manifold.perplexity)
                    .unwrap_or(base.perplexity),
                learning_rate: manifold.learning_rate.or(base.learning_rate),
                iterations: pipeline
                    .iterations
                    .or(manifold.iterations)
                    .unwrap_or(base.iterations),
                early_exaggeration: manifold
                    .early_exaggeration
                    .unwrap_or(base.early_exaggeration),
                init: manifold.init.unwrap_or(base.init),
                seed: pipeline.seed.or(manifold.seed).unwrap_or(base.seed),
            }))
        }
        other => {
            return Err(CliError::Config(format!(
                "Unknown manifold method '{}'. Expected 'pca', 'tsne' or 'none'.",
                other
            )));
        }
    };

    let card_columns = if plot.card_columns.is_empty() {
        file_plot.card_columns.unwrap_or_default()
    } else {
        plot.card_columns.clone()
    };

    let pipeline_config = PipelineConfigBuilder::new()
        .smiles_column(smiles_column)
        .descriptors(descriptor_kinds)
        .scaffolds(scaffold_kinds)
        .manifold(manifold_kind)
        .recalculate(pipeline.recalculate || file_plot.recalculate.unwrap_or(false))
        .x(plot.x.clone().or(file_plot.x))
        .y(plot.y.clone().or(file_plot.y))
        .color_by(plot.color_by.clone().or(file_plot.color_by))
        .title_column(plot.title_column.clone().or(file_plot.title_column))
        .card_columns(card_columns)
        .mols_per_group(
            pipeline
                .mols_per_group
                .or(file_plot.mols_per_group)
                .unwrap_or(defaults.mols_per_group),
        )
        .height(plot.height.or(file_plot.height).unwrap_or(defaults.height))
        .width(plot.width.or(file_plot.width))
        .build()?;

    Ok(AppConfig {
        pipeline: pipeline_config,
        server: ServerConfig {
            host: server
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or(defaults.host),
            port: file_server.port.unwrap_or(defaults.port),
        },
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid value for {}: {} (expected {})",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let text = || Some(value.to_string());

        macro_rules! section {
            ($name:ident) => {
                config.$name.get_or_insert_with(Default::default)
            };
        }

        match key {
            "table.smiles-column" => section!(table).smiles_column = text(),
            "descriptors.morgan" => section!(descriptors).morgan = Some(parse_value(key, value)?),
            "descriptors.morgan-radius" => {
                section!(descriptors).morgan_radius = Some(parse_value(key, value)?)
            }
            "descriptors.morgan-bits" => {
                section!(descriptors).morgan_bits = Some(parse_value(key, value)?)
            }
            "descriptors.physchem" => {
                section!(descriptors).physchem = Some(parse_value(key, value)?)
            }
            "scaffolds.murcko" => section!(scaffolds).murcko = Some(parse_value(key, value)?),
            "scaffolds.generic-murcko" => {
                section!(scaffolds).generic_murcko = Some(parse_value(key, value)?)
            }
            "manifold.method" => section!(manifold).method = text(),
            "manifold.components" => {
                section!(manifold).components = Some(parse_value(key, value)?)
            }
            "manifold.perplexity" => {
                section!(manifold).perplexity = Some(parse_value(key, value)?)
            }
            "manifold.learning-rate" => {
                section!(manifold).learning_rate = Some(parse_value(key, value)?)
            }
            "manifold.iterations" => {
                section!(manifold).iterations = Some(parse_value(key, value)?)
            }
            "manifold.early-exaggeration" => {
                section!(manifold).early_exaggeration = Some(parse_value(key, value)?)
            }
            "manifold.seed" => section!(manifold).seed = Some(parse_value(key, value)?),
            "manifold.init" => {
                section!(manifold).init = Some(match value {
                    "pca" => TsneInit::Pca,
                    "random" => TsneInit::Random,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: {} (expected 'pca' or 'random')",
                            key, value
                        )));
                    }
                })
            }
            "plot.x" => section!(plot).x = text(),
            "plot.y" => section!(plot).y = text(),
            "plot.color-by" => section!(plot).color_by = text(),
            "plot.title-column" => section!(plot).title_column = text(),
            "plot.card-columns" => {
                section!(plot).card_columns = Some(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(String::from)
                        .collect(),
                )
            }
            "plot.mols-per-group" => {
                section!(plot).mols_per_group = Some(parse_value(key, value)?)
            }
            "plot.height" => section!(plot).height = Some(parse_value(key, value)?),
            "plot.width" => section!(plot).width = Some(parse_value(key, value)?),
            "plot.recalculate" => section!(plot).recalculate = Some(parse_value(key, value)?),
            "server.host" => section!(server).host = text(),
            "server.port" => section!(server).port = Some(parse_value(key, value)?),
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ManifoldChoice;
    use std::fs;
    use tempfile::tempdir;

    fn build(pipeline: &PipelineArgs) -> Result<AppConfig> {
        build_config(pipeline, &PlotOptions::default(), &ServerOptions::default())
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let app = build(&PipelineArgs::default()).unwrap();
        let cfg = app.pipeline;
        let defaults = DefaultsConfig::default();

        assert_eq!(cfg.smiles_column, "SMILES");
        assert_eq!(cfg.descriptors, vec![DescriptorKind::DEFAULT_MORGAN]);
        assert_eq!(cfg.scaffolds, vec![ScaffoldKind::Murcko]);
        assert_eq!(cfg.manifold, Some(ManifoldKind::Pca(Pca::default())));
        assert_eq!(cfg.plot.mols_per_group, defaults.mols_per_group);
        assert_eq!(cfg.plot.width, 2 * defaults.height);
        assert_eq!(app.server.port, defaults.port);
        assert_eq!(app.server.host, defaults.host);
    }

    #[test]
    fn file_values_are_merged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [table]
            smiles-column = "Smiles"
            [descriptors]
            morgan = false
            physchem = true
            [scaffolds]
            murcko = false
            generic-murcko = true
            [manifold]
            method = "tsne"
            perplexity = 5.0
            seed = 7
            [plot]
            mols-per-group = 3
            height = 500
            card-columns = ["Name"]
            [server]
            host = "0.0.0.0"
            port = 8050
            "#,
        )
        .unwrap();
        let args = PipelineArgs {
            config: Some(path),
            ..Default::default()
        };

        let app = build(&args).unwrap();
        let cfg = app.pipeline;
        assert_eq!(cfg.smiles_column, "Smiles");
        assert_eq!(cfg.descriptors, vec![DescriptorKind::Physchem]);
        assert_eq!(cfg.scaffolds, vec![ScaffoldKind::GenericMurcko]);
        match cfg.manifold {
            Some(ManifoldKind::Tsne(tsne)) => {
                assert_eq!(tsne.perplexity, 5.0);
                assert_eq!(tsne.seed, 7);
            }
            other => panic!("expected t-SNE, got {:?}", other),
        }
        assert_eq!(cfg.plot.mols_per_group, 3);
        assert_eq!(cfg.plot.width, 1000);
        assert_eq!(cfg.plot.card_columns, vec!["Name".to_string()]);
        assert_eq!(
            app.server,
            ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8050
            }
        );
    }

    #[test]
    fn cli_overrides_set_which_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[plot]\nmols-per-group = 3\nheight = 500\n").unwrap();
        let args = PipelineArgs {
            config: Some(path),
            mols_per_group: Some(20),
            manifold: Some(ManifoldChoice::None),
            set_values: vec![
                "plot.mols-per-group=4".to_string(),
                "plot.height=600".to_string(),
            ],
            ..Default::default()
        };

        let cfg = build(&args).unwrap().pipeline;
        assert_eq!(cfg.plot.mols_per_group, 20);
        assert_eq!(cfg.plot.height, 600);
        assert!(cfg.manifold.is_none());
    }

    #[test]
    fn set_values_cover_nested_sections() {
        let args = PipelineArgs {
            set_values: vec![
                "descriptors.morgan-bits=1024".to_string(),
                "plot.card-columns=Name, pIC50".to_string(),
                "manifold.components=3".to_string(),
            ],
            ..Default::default()
        };
        let cfg = build(&args).unwrap().pipeline;
        assert_eq!(
            cfg.descriptors,
            vec![DescriptorKind::MorganFp {
                radius: 2,
                n_bits: 1024
            }]
        );
        assert_eq!(
            cfg.plot.card_columns,
            vec!["Name".to_string(), "pIC50".to_string()]
        );
        assert_eq!(cfg.manifold, Some(ManifoldKind::Pca(Pca { components: 3 })));
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in ["plot.height", "plot.colour=red", "plot.height=tall"] {
            let args = PipelineArgs {
                set_values: vec![bad.to_string()],
                ..Default::default()
            };
            assert!(
                matches!(build(&args), Err(CliError::Config(_))),
                "accepted {}",
                bad
            );
        }
    }

    #[test]
    fn manifold_without_descriptors_is_a_config_error() {
        let args = PipelineArgs {
            no_morgan: true,
            ..Default::default()
        };
        assert!(matches!(build(&args), Err(CliError::Config(_))));
    }
}
