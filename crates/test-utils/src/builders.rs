#![allow(dead_code)]

use minibuild::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults with external tools switched off, so
/// tests never depend on `lessc` or `tsc` being installed.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.style.commands.clear();
        config.compile.commands.clear();
        Self { config }
    }

    pub fn with_graph(mut self, expr: &str) -> Self {
        self.config.graph.build = expr.to_string();
        self
    }

    pub fn with_dist(mut self, dist: &str) -> Self {
        self.config.paths.dist = dist.to_string();
        self
    }

    pub fn with_style_command(mut self, cmd: &str) -> Self {
        self.config.style.commands.push(cmd.to_string());
        self
    }

    pub fn with_compile_command(mut self, cmd: &str) -> Self {
        self.config.compile.commands.push(cmd.to_string());
        self
    }

    pub fn with_global_config(mut self, path: &str) -> Self {
        self.config.paths.global_config = path.to_string();
        self
    }

    pub fn with_strict_placeholders(mut self, strict: bool) -> Self {
        self.config.env.strict_placeholders = strict;
        self
    }

    pub fn with_use_hash(mut self, use_hash: bool) -> Self {
        self.config.watch.use_hash = use_hash;
        self
    }

    pub fn with_task_timeout_secs(mut self, secs: u64) -> Self {
        self.config.graph.task_timeout_secs = Some(secs);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
