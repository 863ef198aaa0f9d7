//! Placeholder resolution
//!
//! Clients refer to pages they are about to create with placeholder strings.
//! The command creating the page binds its placeholder once the store has
//! assigned the real id; every later command resolves through the same
//! resolver. One resolver lives for exactly one batch.

use crate::models::{PageId, PageRef};
use crate::operations::error::{CommandError, CommandResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IdResolver {
    bindings: HashMap<String, PageId>,
}

impl IdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `placeholder` to `page_id`
    ///
    /// Rebinding to the same id is a no-op; rebinding to a different id fails
    /// with `DuplicateBinding`.
    pub fn bind(&mut self, placeholder: &str, page_id: PageId) -> CommandResult {
        match self.bindings.get(placeholder) {
            Some(existing) if *existing == page_id => Ok(()),
            Some(existing) => Err(CommandError::duplicate_binding(
                placeholder,
                *existing,
                page_id,
            )),
            None => {
                self.bindings.insert(placeholder.to_string(), page_id);
                Ok(())
            }
        }
    }

    /// Resolve a page reference to a real id
    pub fn resolve(&self, page_ref: &PageRef) -> CommandResult<PageId> {
        match page_ref {
            PageRef::Real(id) => Ok(*id),
            PageRef::Placeholder(key) => self
                .bindings
                .get(key)
                .copied()
                .ok_or_else(|| CommandError::unresolved_placeholder(key.as_str())),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
