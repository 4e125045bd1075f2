//! Domain knowledge hierarchy.
//!
//! A read-only tree of areas and nested topics, used to validate catalog topic
//! paths and to print the hierarchy. It plays no part in scoring.

use anyhow::{Context, Result};
use serde_yaml_ng::Value;

use crate::error::DefinitionError;
use crate::model::TopicPath;

/// A named node of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainNode {
    pub name: String,
    pub children: Vec<DomainNode>,
}

impl DomainNode {
    fn leaf(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    pub fn child(&self, name: &str) -> Option<&DomainNode> {
        self.children.iter().find(|c| c.name == name)
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(DomainNode::count).sum::<usize>()
    }
}

/// Areas at the top, topics below, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainTree {
    pub areas: Vec<DomainNode>,
}

impl DomainTree {
    /// Parse a YAML mapping `area -> topic -> ...` whose leaves are lists of
    /// names or empty.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let value: Value = serde_yaml_ng::from_str(content).context("failed to parse domain YAML")?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let areas = children(&value).context("invalid domain hierarchy")?;
        Ok(Self { areas })
    }

    pub fn area(&self, name: &str) -> Option<&DomainNode> {
        self.areas.iter().find(|a| a.name == name)
    }

    /// Whether every segment of `path` exists below `area`.
    pub fn contains_path(&self, area: &str, path: &TopicPath) -> bool {
        let Some(mut node) = self.area(area) else {
            return false;
        };
        for segment in path.segments() {
            match node.child(segment) {
                Some(next) => node = next,
                None => return false,
            }
        }
        true
    }

    /// Total number of nodes, areas included.
    pub fn node_count(&self) -> usize {
        self.areas.iter().map(DomainNode::count).sum()
    }

    /// Indented rendering, two spaces per level.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for area in &self.areas {
            render_node(area, 0, &mut out);
        }
        out
    }
}

fn render_node(node: &DomainNode, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&node.name);
    out.push('\n');
    for child in &node.children {
        render_node(child, depth + 1, out);
    }
}

fn scalar_name(value: &Value) -> Result<String, DefinitionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(DefinitionError::UnexpectedShape {
            expected: "a topic name",
            found: format!("{other:?}"),
        }),
    }
}

fn children(value: &Value) -> Result<Vec<DomainNode>, DefinitionError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(map) => map
            .iter()
            .map(|(key, child)| {
                Ok::<_, DefinitionError>(DomainNode {
                    name: scalar_name(key)?,
                    children: children(child)?,
                })
            })
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::Mapping(_) => children(item),
                scalar => Ok(vec![DomainNode::leaf(scalar_name(scalar)?)]),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|nested| nested.into_iter().flatten().collect()),
        scalar => Ok(vec![DomainNode::leaf(scalar_name(scalar)?)]),
    }
}
