// src/pipeline/stages/json_edit.rs

use anyhow::{Context, anyhow};
use serde_json::{Map, Value};

use crate::pipeline::record::FileRecord;
use crate::pipeline::stage::{Stage, StageFuture, StageOutput};

/// Overwrites selected top-level keys of a JSON object document.
///
/// Keys not named in the edit keep their value and their position.
#[derive(Debug, Clone, Default)]
pub struct JsonEdit {
    fields: Map<String, Value>,
}

impl JsonEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn edit(&self, text: &str) -> anyhow::Result<String> {
        let mut doc: Value = serde_json::from_str(text).context("parsing JSON document")?;
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| anyhow!("expected a JSON object at the top level"))?;
        for (k, v) in &self.fields {
            obj.insert(k.clone(), v.clone());
        }
        let mut out = serde_json::to_string_pretty(&doc)?;
        out.push('\n');
        Ok(out)
    }
}

impl Stage for JsonEdit {
    fn name(&self) -> &str {
        "json-edit"
    }

    fn apply(&self, record: FileRecord) -> StageFuture<'_> {
        Box::pin(async move {
            let edited = self
                .edit(record.text()?)
                .with_context(|| format!("editing {}", record.display_path()))?;
            Ok(StageOutput::Emit(record.with_contents(edited)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_only_named_keys_in_place() {
        let edit = JsonEdit::new()
            .set("miniprogramRoot", "./")
            .set("appid", "wx123");
        let input = r#"{"description":"demo","appid":"touristappid","setting":{"es6":true},"miniprogramRoot":"src/"}"#;
        let out = edit.edit(input).unwrap();
        let doc: Value = serde_json::from_str(&out).unwrap();
        let keys: Vec<&str> = doc.as_object().unwrap().keys().map(|k| k.as_str()).collect();

        assert_eq!(keys, vec!["description", "appid", "setting", "miniprogramRoot"]);
        assert_eq!(doc["appid"], "wx123");
        assert_eq!(doc["miniprogramRoot"], "./");
        assert_eq!(doc["setting"]["es6"], true);
    }

    #[test]
    fn editing_twice_is_stable() {
        let edit = JsonEdit::new().set("appid", "wx1");
        let once = edit.edit(r#"{"appid":"a","x":1}"#).unwrap();
        let twice = edit.edit(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(JsonEdit::new().edit("[1,2]").is_err());
    }
}
