// src/task/registry.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{BuildError, Result};

use super::{Task, TaskName};

/// Tasks keyed by their unique name.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Arc<dyn Task>>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Names must be unique within a build.
    pub fn register(&mut self, task: impl Task + 'static) -> Result<()> {
        self.register_arc(Arc::new(task))
    }

    pub fn register_arc(&mut self, task: Arc<dyn Task>) -> Result<()> {
        let name = task.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(BuildError::DuplicateTask(name));
        }
        self.tasks.insert(name, task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Task>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::TaskNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Task>> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BuildContext;
    use crate::task::CleanTask;

    #[test]
    fn duplicate_names_are_rejected() {
        let ctx = BuildContext::on_disk(".");
        let mut reg = TaskRegistry::new();
        reg.register(CleanTask::new("clean", "dist", ctx.clone())).unwrap();
        let err = reg.register(CleanTask::new("clean", "out", ctx)).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateTask(ref n) if n == "clean"));
        assert!(matches!(reg.get("missing"), Err(BuildError::TaskNotFound(_))));
    }
}
