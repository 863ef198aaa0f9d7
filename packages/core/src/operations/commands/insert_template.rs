use super::validate_placeholder;
use crate::db::PageStore;
use crate::models::{Outline, PageId, PageRef, Template, TemplateId};
use crate::operations::context::ExecutionContext;
use crate::operations::error::{CommandError, CommandResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A page created by [`InsertTemplate`], with the template part it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedPage {
    pub page_id: PageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
}

/// Plant every outline of a template under `parent_id`
///
/// Pages are created parent-first. `placeholders` maps template part ids to
/// the placeholders the created pages are bound to, so later commands in the
/// batch can target them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTemplate {
    pub parent_id: PageRef,
    pub template_id: TemplateId,

    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,

    /// Created pages in creation order, set once applied
    #[serde(default)]
    pub inserted_pages: Vec<InsertedPage>,
}

impl InsertTemplate {
    pub fn new(parent_id: PageRef, template_id: TemplateId) -> Self {
        Self {
            parent_id,
            template_id,
            placeholders: BTreeMap::new(),
            inserted_pages: Vec::new(),
        }
    }

    pub fn with_placeholder(mut self, part_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        self.placeholders.insert(part_id.into(), placeholder.into());
        self
    }

    pub(super) fn validate(&self) -> CommandResult {
        for placeholder in self.placeholders.values() {
            validate_placeholder(placeholder)?;
        }
        let distinct: HashSet<&String> = self.placeholders.values().collect();
        if distinct.len() != self.placeholders.len() {
            return Err(CommandError::validation(
                "Template placeholders must be distinct",
            ));
        }
        Ok(())
    }

    pub(super) fn bound_placeholders(&self) -> Vec<(String, PageId)> {
        self.inserted_pages
            .iter()
            .filter_map(|inserted| {
                let part_id = inserted.part_id.as_ref()?;
                let placeholder = self.placeholders.get(part_id)?;
                Some((placeholder.clone(), inserted.page_id))
            })
            .collect()
    }

    pub(super) async fn apply(
        &mut self,
        store: &dyn PageStore,
        ctx: &mut ExecutionContext,
    ) -> CommandResult {
        let template = ctx
            .templates()
            .get(&self.template_id)
            .await
            .ok_or_else(|| CommandError::template_not_found(self.template_id.clone()))?;
        self.check_part_ids(&template)?;
        let parent = ctx.resolve_page(store, &self.parent_id).await?;

        let mut inserted = Vec::new();
        if let Err(e) = self
            .plant(store, ctx, parent.id, &template, &mut inserted)
            .await
        {
            discard(store, &inserted).await;
            return Err(e);
        }

        tracing::debug!(
            "Inserted {} ({} pages) under page {}",
            self.template_id,
            inserted.len(),
            parent.id
        );
        self.inserted_pages = inserted;
        Ok(())
    }

    fn check_part_ids(&self, template: &Template) -> CommandResult {
        let mut known = HashSet::new();
        let mut stack: Vec<&Outline> = template.outlines.iter().collect();
        while let Some(outline) = stack.pop() {
            if let Some(part_id) = &outline.part_id {
                known.insert(part_id.as_str());
            }
            stack.extend(outline.children.iter());
        }

        match self
            .placeholders
            .keys()
            .find(|part_id| !known.contains(part_id.as_str()))
        {
            Some(unknown) => Err(CommandError::validation(format!(
                "{} has no part '{}'",
                self.template_id, unknown
            ))),
            None => Ok(()),
        }
    }

    async fn plant(
        &self,
        store: &dyn PageStore,
        ctx: &mut ExecutionContext,
        parent_id: PageId,
        template: &Template,
        inserted: &mut Vec<InsertedPage>,
    ) -> CommandResult {
        let mut pending: Vec<(&Outline, PageId)> = template
            .outlines
            .iter()
            .rev()
            .map(|outline| (outline, parent_id))
            .collect();

        while let Some((outline, parent_id)) = pending.pop() {
            let id = store.create_page(parent_id, &outline.title).await?;
            inserted.push(InsertedPage {
                page_id: id,
                part_id: outline.part_id.clone(),
            });

            let placeholder = outline
                .part_id
                .as_ref()
                .and_then(|part_id| self.placeholders.get(part_id));
            if let Some(placeholder) = placeholder {
                ctx.bind(placeholder, id)?;
            }

            pending.extend(outline.children.iter().rev().map(|child| (child, id)));
        }
        Ok(())
    }

    pub(super) async fn revert(&self, store: &dyn PageStore, ctx: &ExecutionContext) -> CommandResult {
        if self.inserted_pages.is_empty() {
            return Err(CommandError::not_applied("insertTemplate"));
        }

        for inserted in self.inserted_pages.iter().rev() {
            if store.get_page(inserted.page_id).await?.is_none() {
                continue;
            }
            ctx.page_in_space(store, inserted.page_id).await?;
            store.delete_page(inserted.page_id).await?;
        }
        Ok(())
    }
}

/// Remove pages planted by a failed apply, newest first
async fn discard(store: &dyn PageStore, inserted: &[InsertedPage]) {
    for page in inserted.iter().rev() {
        if let Err(e) = store.delete_page(page.page_id).await {
            tracing::warn!(
                "Failed to remove page {} of a partially inserted template: {}",
                page.page_id,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryPageStore;
    use crate::services::TemplateRegistry;
    use std::sync::Arc;

    fn blueprint(key: &str) -> TemplateId {
        TemplateId::FromBlueprint {
            blueprint_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_plants_pre_order_and_binds_placeholders() {
        let store = InMemoryPageStore::new();
        let home = store.create_space("TST", "Home").await.unwrap();
        let registry = Arc::new(TemplateRegistry::new());
        let id = registry
            .create(Template::new(
                "Project",
                vec![
                    Outline::new("Overview", vec![Outline::new("Goals", vec![])]),
                    Outline::new("Notes", vec![]),
                ],
            ))
            .await
            .unwrap();
        let template = registry.get(&id).await.unwrap();
        let goals_part = template.outlines[0].children[0].part_id.clone().unwrap();

        let mut ctx = ExecutionContext::new("TST", home, registry);
        let mut cmd = InsertTemplate::new(PageRef::from(home), id).with_placeholder(&goals_part, "j3_1");
        cmd.apply(&store, &mut ctx).await.unwrap();

        let titles: Vec<String> = {
            let mut titles = Vec::new();
            for inserted in &cmd.inserted_pages {
                titles.push(store.get_page(inserted.page_id).await.unwrap().unwrap().title);
            }
            titles
        };
        assert_eq!(titles, vec!["Overview", "Goals", "Notes"]);

        let goals = ctx.resolve(&PageRef::placeholder("j3_1")).unwrap();
        assert_eq!(goals, cmd.inserted_pages[1].page_id);
        assert_eq!(cmd.bound_placeholders(), vec![("j3_1".to_string(), goals)]);

        cmd.revert(&store, &ctx).await.unwrap();
        assert_eq!(store.live_page_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_template_fails() {
        let store = InMemoryPageStore::new();
        let home = store.create_space("TST", "Home").await.unwrap();
        let mut ctx = ExecutionContext::new("TST", home, Arc::new(TemplateRegistry::new()));

        let mut cmd = InsertTemplate::new(PageRef::from(home), blueprint("blueprint:nope"));
        assert_eq!(
            cmd.apply(&store, &mut ctx).await,
            Err(CommandError::template_not_found(blueprint("blueprint:nope")))
        );
    }

    #[tokio::test]
    async fn test_failed_bind_discards_planted_pages() {
        let store = InMemoryPageStore::new();
        let home = store.create_space("TST", "Home").await.unwrap();
        let registry = Arc::new(TemplateRegistry::with_blueprints());
        let template = registry
            .get(&blueprint("blueprint:documentation"))
            .await
            .unwrap();
        let first_part = template.outlines[0].part_id.clone().unwrap();

        let mut ctx = ExecutionContext::new("TST", home, registry);
        ctx.bind("j1", home).unwrap();

        let mut cmd = InsertTemplate::new(PageRef::from(home), blueprint("blueprint:documentation"))
            .with_placeholder(first_part, "j1");
        assert!(matches!(
            cmd.apply(&store, &mut ctx).await,
            Err(CommandError::DuplicateBinding { .. })
        ));
        assert_eq!(store.live_page_count().await, 1);
        assert!(cmd.inserted_pages.is_empty());
    }

    #[test]
    fn test_duplicate_placeholders_are_invalid() {
        let cmd = InsertTemplate::new(PageRef::real(1), blueprint("blueprint:documentation"))
            .with_placeholder("a", "j1")
            .with_placeholder("b", "j1");
        assert!(matches!(cmd.validate(), Err(CommandError::Validation(_))));
    }
}
