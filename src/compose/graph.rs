// src/compose/graph.rs

//! Graph expressions: `series(...)` / `parallel(...)` trees over task names.
//!
//! ```text
//! series(clean, parallel(project_config, static, markup, style), compile, inject)
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::{BuildError, Result};
use crate::task::TaskName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphExpr {
    Task(TaskName),
    /// Children run strictly in order; the first failure stops the node.
    Series(Vec<GraphExpr>),
    /// Children run concurrently; the node settles once all have settled.
    Parallel(Vec<GraphExpr>),
}

pub fn task(name: impl Into<TaskName>) -> GraphExpr {
    GraphExpr::Task(name.into())
}

pub fn series(children: impl IntoIterator<Item = GraphExpr>) -> GraphExpr {
    GraphExpr::Series(children.into_iter().collect())
}

pub fn parallel(children: impl IntoIterator<Item = GraphExpr>) -> GraphExpr {
    GraphExpr::Parallel(children.into_iter().collect())
}

impl GraphExpr {
    /// Every task name referenced anywhere in the tree, deduplicated.
    pub fn task_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                GraphExpr::Task(name) => {
                    names.insert(name.as_str());
                }
                GraphExpr::Series(children) | GraphExpr::Parallel(children) => {
                    stack.extend(children.iter());
                }
            }
        }
        names
    }

    /// Check structure and that every leaf names a known task.
    pub fn validate(&self, is_known: impl Fn(&str) -> bool) -> Result<()> {
        self.check_structure()?;
        for name in self.task_names() {
            if !is_known(name) {
                return Err(BuildError::TaskNotFound(format!(
                    "graph `{self}` references unknown task '{name}'"
                )));
            }
        }
        Ok(())
    }

    fn check_structure(&self) -> Result<()> {
        match self {
            GraphExpr::Task(name) if name.is_empty() => {
                Err(BuildError::GraphSyntax("empty task name".to_string()))
            }
            GraphExpr::Task(_) => Ok(()),
            GraphExpr::Series(children) | GraphExpr::Parallel(children) => {
                if children.is_empty() {
                    return Err(BuildError::GraphSyntax(format!(
                        "{}() needs at least one child",
                        self.kind()
                    )));
                }
                children.iter().try_for_each(GraphExpr::check_structure)
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            GraphExpr::Task(_) => "task",
            GraphExpr::Series(_) => "series",
            GraphExpr::Parallel(_) => "parallel",
        }
    }
}

impl fmt::Display for GraphExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphExpr::Task(name) => f.write_str(name),
            GraphExpr::Series(children) | GraphExpr::Parallel(children) => {
                write!(f, "{}(", self.kind())?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for GraphExpr {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser { src: s, pos: 0 };
        let expr = parser.expr()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        expr.check_structure()?;
        Ok(expr)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn error(&self, msg: &str) -> BuildError {
        BuildError::GraphSyntax(format!("{msg} at offset {} in `{}`", self.pos, self.src))
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a task name, `series(` or `parallel(`"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn expr(&mut self) -> Result<GraphExpr> {
        let name = self.ident()?;
        let is_node = matches!(name, "series" | "parallel");
        if !is_node || !self.eat('(') {
            return Ok(GraphExpr::Task(name.to_string()));
        }

        let mut children = Vec::new();
        loop {
            if self.eat(')') {
                break;
            }
            children.push(self.expr()?);
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                break;
            }
            return Err(self.error("expected `,` or `)`"));
        }

        Ok(if name == "series" {
            GraphExpr::Series(children)
        } else {
            GraphExpr::Parallel(children)
        })
    }
}
