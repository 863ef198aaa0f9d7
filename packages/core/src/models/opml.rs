//! OPML import for templates
//!
//! Each `<outline>` of the document body becomes an [`Outline`]. The page
//! title is the `title` attribute, falling back to `text` since many outliners
//! only write the latter. The template name comes from `<head><title>`.

use crate::models::template::{Outline, Template};
use quick_xml::DeError;
use serde::Deserialize;

/// Name of templates whose OPML head has no title
pub const UNTITLED_TEMPLATE: &str = "template without title";

#[derive(Debug, Deserialize)]
struct Opml {
    #[serde(default)]
    head: OpmlHead,
    #[serde(default)]
    body: OpmlBody,
}

#[derive(Debug, Default, Deserialize)]
struct OpmlHead {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpmlBody {
    #[serde(default, rename = "outline")]
    outlines: Vec<OpmlOutline>,
}

#[derive(Debug, Deserialize)]
struct OpmlOutline {
    #[serde(default, rename = "@title")]
    title: Option<String>,
    #[serde(default, rename = "@text")]
    text: Option<String>,
    #[serde(default, rename = "outline")]
    children: Vec<OpmlOutline>,
}

impl OpmlOutline {
    fn into_outline(self) -> Outline {
        let title = self
            .title
            .filter(|title| !title.trim().is_empty())
            .or(self.text)
            .unwrap_or_default();
        Outline::new(
            title,
            self.children
                .into_iter()
                .map(OpmlOutline::into_outline)
                .collect(),
        )
    }
}

impl Template {
    /// Parse an OPML document into an unsaved template
    ///
    /// # Errors
    ///
    /// Returns error if `xml` is not well-formed or does not have the OPML shape.
    pub fn from_opml(xml: &str) -> Result<Template, DeError> {
        let opml: Opml = quick_xml::de::from_str(xml)?;
        let name = opml
            .head
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNTITLED_TEMPLATE.to_string());
        let outlines = opml
            .body
            .outlines
            .into_iter()
            .map(OpmlOutline::into_outline)
            .collect();
        Ok(Template::new(name, outlines))
    }
}
