// src/config/validate.rs

use std::path::{Component, Path};
use std::str::FromStr;

use crate::compose::GraphExpr;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildError, Result};
use crate::pipeline::PathMatcher;
use crate::project::TaskKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let build_graph = parse_build_graph(&raw)?;
        Ok(ConfigFile::new_unchecked(raw, build_graph))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_env(cfg)?;
    validate_style(cfg)?;
    validate_globs(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    let dist = Path::new(&paths.dist);

    // `clean` removes dist, so it must be a real subdirectory of the project.
    let is_subdir = dist.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && dist.components().any(|c| matches!(c, Component::Normal(_)));
    if !is_subdir {
        return Err(BuildError::ConfigError(format!(
            "[paths].dist must be a relative subdirectory of the project (got {:?})",
            paths.dist
        )));
    }

    if Path::new(&paths.src) == dist {
        return Err(BuildError::ConfigError(format!(
            "[paths].src and [paths].dist must differ (both {:?})",
            paths.src
        )));
    }

    if paths.global_config.trim().is_empty() || paths.project_config.trim().is_empty() {
        return Err(BuildError::ConfigError(
            "[paths].global_config and [paths].project_config must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_env(cfg: &RawConfigFile) -> Result<()> {
    if cfg.env.prefix.is_empty() {
        return Err(BuildError::ConfigError(
            "[env].prefix must not be empty; it limits which variables can be injected"
                .to_string(),
        ));
    }
    if cfg.env.appid_var.is_empty() {
        return Err(BuildError::ConfigError(
            "[env].appid_var must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_style(cfg: &RawConfigFile) -> Result<()> {
    let ext = cfg.style.extension.trim_start_matches('.');
    if ext.is_empty() || ext.contains('/') {
        return Err(BuildError::ConfigError(format!(
            "[style].extension must be a bare extension like \"wxss\" (got {:?})",
            cfg.style.extension
        )));
    }
    Ok(())
}

fn validate_globs(cfg: &RawConfigFile) -> Result<()> {
    let sets: [(&str, &[String], &[String]); 5] = [
        ("style", &cfg.style.files, &cfg.style.exclude),
        ("style.watch", &cfg.style.watch, &[]),
        ("markup", &cfg.markup.files, &cfg.markup.exclude),
        ("static", &cfg.static_files.files, &cfg.static_files.exclude),
        ("compile", &cfg.compile.files, &[]),
    ];

    for (section, include, exclude) in sets {
        PathMatcher::new(include, exclude).map_err(|e| {
            BuildError::ConfigError(format!("[{section}] has an invalid glob: {e:#}"))
        })?;
    }
    PathMatcher::new(&cfg.paths.env_files, &[]).map_err(|e| {
        BuildError::ConfigError(format!("[paths].env_files has an invalid entry: {e:#}"))
    })?;
    Ok(())
}

fn parse_build_graph(cfg: &RawConfigFile) -> Result<GraphExpr> {
    let expr = GraphExpr::from_str(&cfg.graph.build)?;
    expr.validate(|name| TaskKind::from_name(name).is_some())?;
    Ok(expr)
}
