//! Page tree templates
//!
//! A template is a named forest of outlines. Inserting a template plants every
//! top-level outline (and its descendants) under a parent page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a template: either a built-in blueprint or a custom template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "templateType", rename_all = "camelCase")]
pub enum TemplateId {
    /// Built-in blueprint keyed by a stable string key
    #[serde(rename_all = "camelCase")]
    FromBlueprint { blueprint_key: String },
    /// User-defined template stored in the registry
    #[serde(rename_all = "camelCase")]
    Custom { custom_template_id: i64 },
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromBlueprint { blueprint_key } => write!(f, "blueprint '{}'", blueprint_key),
            Self::Custom { custom_template_id } => {
                write!(f, "custom template {}", custom_template_id)
            }
        }
    }
}

/// One page of a template, with its sub-pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    /// Stable identifier of this part, used to map created pages to placeholders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub children: Vec<Outline>,
}

impl Outline {
    pub fn new(title: impl Into<String>, children: Vec<Outline>) -> Self {
        Self {
            part_id: None,
            title: title.into(),
            children,
        }
    }

    /// Number of pages this outline expands to
    pub fn page_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(outline) = stack.pop() {
            count += 1;
            stack.extend(outline.children.iter());
        }
        count
    }
}

/// A named set of outlines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    pub outlines: Vec<Outline>,
    /// Assigned by the registry; absent on templates submitted for creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TemplateId>,
}

impl Template {
    pub fn new(name: impl Into<String>, outlines: Vec<Outline>) -> Self {
        Self {
            name: name.into(),
            outlines,
            id: None,
        }
    }

    pub fn page_count(&self) -> usize {
        self.outlines.iter().map(Outline::page_count).sum()
    }
}

/// Name and id only, for template listings without bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateHeader {
    pub name: String,
    pub id: Option<TemplateId>,
}

impl From<&Template> for TemplateHeader {
    fn from(template: &Template) -> Self {
        Self {
            name: template.name.clone(),
            id: template.id.clone(),
        }
    }
}
