// src/config/model.rs

use serde::Deserialize;

use crate::compose::GraphExpr;

/// Top-level configuration as read from `Minibuild.toml`.
///
/// Every section is optional; the defaults reproduce the standard
/// mini-program layout:
///
/// ```toml
/// [paths]
/// src = "src"
/// dist = "dist"
///
/// [style]
/// commands = ["lessc --include-path=. -", "postcss"]
///
/// [graph]
/// build = "series(clean, parallel(project_config, static, markup, style), compile, inject)"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub env: EnvSection,
    #[serde(default)]
    pub style: StyleSection,
    #[serde(default)]
    pub markup: MarkupSection,
    #[serde(default, rename = "static")]
    pub static_files: StaticSection,
    #[serde(default)]
    pub compile: CompileSection,
    #[serde(default)]
    pub remap: RemapSection,
    #[serde(default)]
    pub watch: WatchSection,
    #[serde(default)]
    pub graph: GraphSection,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub env: EnvSection,
    pub style: StyleSection,
    pub markup: MarkupSection,
    pub static_files: StaticSection,
    pub compile: CompileSection,
    pub remap: RemapSection,
    pub watch: WatchSection,
    pub graph: GraphSection,
    /// `graph.build`, parsed.
    pub build_graph: GraphExpr,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile, build_graph: GraphExpr) -> Self {
        Self {
            paths: raw.paths,
            env: raw.env,
            style: raw.style,
            markup: raw.markup,
            static_files: raw.static_files,
            compile: raw.compile,
            remap: raw.remap,
            watch: raw.watch,
            graph: raw.graph,
            build_graph,
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_src")]
    pub src: String,
    #[serde(default = "default_dist")]
    pub dist: String,
    /// Project config document, rewritten into `dist`.
    #[serde(default = "default_project_config")]
    pub project_config: String,
    /// Global config script whose placeholders are injected in place.
    #[serde(default = "default_global_config")]
    pub global_config: String,
    /// Env files, lowest precedence first.
    #[serde(default = "default_env_files")]
    pub env_files: Vec<String>,
}

fn default_src() -> String {
    "src".to_string()
}

fn default_dist() -> String {
    "dist".to_string()
}

fn default_project_config() -> String {
    "project.config.json".to_string()
}

fn default_global_config() -> String {
    "dist/config.js".to_string()
}

fn default_env_files() -> Vec<String> {
    vec![".env".to_string(), ".env.local".to_string()]
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dist: default_dist(),
            project_config: default_project_config(),
            global_config: default_global_config(),
            env_files: default_env_files(),
        }
    }
}

/// `[env]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvSection {
    /// Only variables with this prefix are injectable.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Variable holding the application id written into the project config.
    #[serde(default = "default_appid_var")]
    pub appid_var: String,
    #[serde(default = "default_miniprogram_root")]
    pub miniprogram_root: String,
    /// Fail the inject task on unresolved placeholders instead of
    /// substituting an empty string.
    #[serde(default)]
    pub strict_placeholders: bool,
}

fn default_prefix() -> String {
    "APP_".to_string()
}

fn default_appid_var() -> String {
    "APPID".to_string()
}

fn default_miniprogram_root() -> String {
    "./".to_string()
}

impl Default for EnvSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            appid_var: default_appid_var(),
            miniprogram_root: default_miniprogram_root(),
            strict_placeholders: false,
        }
    }
}

/// `[style]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleSection {
    #[serde(default = "default_style_files")]
    pub files: Vec<String>,
    #[serde(default = "default_style_exclude")]
    pub exclude: Vec<String>,
    /// Patterns that retrigger the style task, shared variables included.
    #[serde(default = "default_style_files")]
    pub watch: Vec<String>,
    /// Shared variables file imported at the top of every style source.
    /// Empty disables the import.
    #[serde(default = "default_style_variables")]
    pub variables: String,
    #[serde(default = "default_style_extension")]
    pub extension: String,
    /// Tools applied in order, each reading stdin and writing stdout.
    #[serde(default = "default_style_commands")]
    pub commands: Vec<String>,
}

fn default_style_files() -> Vec<String> {
    vec!["src/**/*.less".to_string()]
}

fn default_style_exclude() -> Vec<String> {
    vec!["src/styles/**".to_string()]
}

fn default_style_variables() -> String {
    "src/styles/variables.less".to_string()
}

fn default_style_extension() -> String {
    "wxss".to_string()
}

fn default_style_commands() -> Vec<String> {
    vec!["lessc --include-path=. -".to_string(), "postcss".to_string()]
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            files: default_style_files(),
            exclude: default_style_exclude(),
            watch: default_style_files(),
            variables: default_style_variables(),
            extension: default_style_extension(),
            commands: default_style_commands(),
        }
    }
}

/// `[markup]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkupSection {
    #[serde(default = "default_markup_files")]
    pub files: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_markup_files() -> Vec<String> {
    vec!["src/**/*.wxml".to_string()]
}

impl Default for MarkupSection {
    fn default() -> Self {
        Self {
            files: default_markup_files(),
            exclude: Vec::new(),
        }
    }
}

/// `[static]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticSection {
    #[serde(default = "default_static_files")]
    pub files: Vec<String>,
    #[serde(default = "default_static_exclude")]
    pub exclude: Vec<String>,
}

fn default_static_files() -> Vec<String> {
    vec!["src/**/*.{png,jpg,jpeg,gif,js,json}".to_string()]
}

fn default_static_exclude() -> Vec<String> {
    vec!["src/config.json".to_string()]
}

impl Default for StaticSection {
    fn default() -> Self {
        Self {
            files: default_static_files(),
            exclude: default_static_exclude(),
        }
    }
}

/// `[compile]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileSection {
    /// Sources that retrigger the compile task.
    #[serde(default = "default_compile_files")]
    pub files: Vec<String>,
    /// Shell commands run in order from the project root.
    #[serde(default = "default_compile_commands")]
    pub commands: Vec<String>,
}

fn default_compile_files() -> Vec<String> {
    vec!["src/**/*.ts".to_string()]
}

fn default_compile_commands() -> Vec<String> {
    vec![
        "tsc -p tsconfig.json".to_string(),
        "tscpaths -p tsconfig.json -s ./src -o dist".to_string(),
    ]
}

impl Default for CompileSection {
    fn default() -> Self {
        Self {
            files: default_compile_files(),
            commands: default_compile_commands(),
        }
    }
}

/// `[remap]` section: `@alias/` prefixes rewritten to `/alias/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemapSection {
    #[serde(default = "default_aliases")]
    pub aliases: Vec<String>,
}

fn default_aliases() -> Vec<String> {
    vec!["assets".to_string(), "icons".to_string()]
}

impl Default for RemapSection {
    fn default() -> Self {
        Self {
            aliases: default_aliases(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Skip change events whose file content hash is unchanged.
    #[serde(default)]
    pub use_hash: bool,
}

/// `[graph]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSection {
    #[serde(default = "default_build_graph")]
    pub build: String,
    /// Upper bound for a single task, in seconds. Unset means no bound.
    #[serde(default)]
    pub task_timeout_secs: Option<u64>,
}

pub fn default_build_graph() -> String {
    "series(clean, parallel(project_config, static, markup, style), compile, inject)".to_string()
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            build: default_build_graph(),
            task_timeout_secs: None,
        }
    }
}
