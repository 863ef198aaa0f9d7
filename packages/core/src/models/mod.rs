//! Data Models
//!
//! - [`page`] - Pages, page references, locations and snapshots
//! - [`template`] - Template outlines and template identifiers
//! - [`opml`] - OPML import for templates

pub mod opml;
pub mod page;
pub mod template;

pub use page::{EmptyPageRef, Location, OriginalPage, Page, PageId, PageRef};
pub use template::{Outline, Template, TemplateHeader, TemplateId};
