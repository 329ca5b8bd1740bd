// src/pipeline/stages/template.rs

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use anyhow::bail;
use regex::{Captures, Regex};
use tracing::info;

use crate::pipeline::record::FileRecord;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([A-Za-z0-9_]+?)__").expect("placeholder regex is valid"));

/// Result of a placeholder pass over some text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub output: String,
    /// Every token seen, in order, with the value it resolved to.
    pub replacements: Vec<(String, Option<String>)>,
}

impl Substitution {
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.replacements
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
    }
}

/// Replace every `__NAME__` token with `vars[NAME]`.
///
/// Tokens with no entry become the empty string.
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> Substitution {
    let mut replacements = Vec::new();
    let output = PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let key = caps[1].to_string();
            let value = vars.get(&key).cloned();
            let rendered = value.clone().unwrap_or_default();
            replacements.push((key, value));
            rendered
        })
        .into_owned();

    Substitution {
        output,
        replacements,
    }
}

/// Stage form of [`substitute`], logging each replacement.
#[derive(Debug, Clone)]
pub struct TemplateSubstitution {
    vars: Arc<BTreeMap<String, String>>,
    strict: bool,
}

impl TemplateSubstitution {
    pub fn new(vars: Arc<BTreeMap<String, String>>, strict: bool) -> Self {
        Self { vars, strict }
    }
}

impl Stage for TemplateSubstitution {
    fn name(&self) -> &str {
        "template"
    }

    fn apply(&self, record: FileRecord) -> StageFuture<'_> {
        Box::pin(async move {
            let result = substitute(record.text()?, &self.vars);

            for (key, value) in &result.replacements {
                match value {
                    Some(v) => info!(file = %record.display_path(), "replace \"{key}\" -> {v}"),
                    None => info!(
                        file = %record.display_path(),
                        "replace \"{key}\" -> <unset>, substituting empty string"
                    ),
                }
            }

            let missing: Vec<&str> = result.unresolved().collect();
            if self.strict && !missing.is_empty() {
                bail!("unresolved placeholders: {}", missing.join(", "));
            }

            Ok(StageOutput::Emit(record.with_contents(result.output)))
        })
    }
}
