//! Template registry
//!
//! Built-in blueprints are fixed at construction. Custom templates are created
//! at runtime, get a sequential id and have their part ids renumbered in
//! pre-order (`"1"`, `"2"`, ...) so placeholder mappings can refer to them.
//!
//! With a [`SettingsStore`] attached the custom templates are written through
//! as one blob under [`CUSTOM_TEMPLATES_KEY`] and survive a restart.

use crate::db::SettingsStore;
use crate::models::{Outline, Template, TemplateHeader, TemplateId};
use crate::services::error::{PageTreeServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const KNOWLEDGE_BASE_BLUEPRINT: &str = "blueprint:knowledge-base";
pub const DOCUMENTATION_BLUEPRINT: &str = "blueprint:documentation";
pub const TEAM_SPACE_BLUEPRINT: &str = "blueprint:team-space";

/// Settings key holding the custom templates
pub const CUSTOM_TEMPLATES_KEY: &str = "pagetree.custom-templates";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomTemplates {
    templates: BTreeMap<i64, Template>,
    /// Last id handed out; ids are never reused after a delete
    next_id: i64,
}

#[derive(Default)]
pub struct TemplateRegistry {
    blueprints: HashMap<String, Template>,
    custom: RwLock<CustomTemplates>,
    settings: Option<Arc<dyn SettingsStore>>,
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.blueprints.keys().collect();
        keys.sort();
        f.debug_struct("TemplateRegistry")
            .field("blueprints", &keys)
            .field("persistent", &self.settings.is_some())
            .finish()
    }
}

impl TemplateRegistry {
    /// Registry without blueprints
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in blueprints
    pub fn with_blueprints() -> Self {
        let mut registry = Self::new();
        for (key, template) in builtin_blueprints() {
            registry.add_blueprint(key, template);
        }
        registry
    }

    /// Keep custom templates in `settings`, loading the ones stored earlier
    ///
    /// # Errors
    ///
    /// Returns error if the stored blob cannot be read or decoded.
    pub async fn with_settings(mut self, settings: Arc<dyn SettingsStore>) -> ServiceResult<Self> {
        if let Some(blob) = settings.get(CUSTOM_TEMPLATES_KEY).await? {
            let stored: CustomTemplates = serde_json::from_slice(&blob)?;
            tracing::info!("Loaded {} custom templates", stored.templates.len());
            self.custom = RwLock::new(stored);
        }
        self.settings = Some(settings);
        Ok(self)
    }

    pub fn add_blueprint(&mut self, key: impl Into<String>, mut template: Template) {
        let key = key.into();
        number_parts(&mut template.outlines);
        template.id = Some(TemplateId::FromBlueprint {
            blueprint_key: key.clone(),
        });
        self.blueprints.insert(key, template);
    }

    pub fn blueprint(&self, key: &str) -> Option<Template> {
        self.blueprints.get(key).cloned()
    }

    pub async fn get(&self, id: &TemplateId) -> Option<Template> {
        match id {
            TemplateId::FromBlueprint { blueprint_key } => self.blueprint(blueprint_key),
            TemplateId::Custom { custom_template_id } => self
                .custom
                .read()
                .await
                .templates
                .get(custom_template_id)
                .cloned(),
        }
    }

    /// Store a custom template and return its id
    ///
    /// # Errors
    ///
    /// `Validation` if the name is blank, there are no outlines, or an
    /// outline has a blank title.
    pub async fn create(&self, mut template: Template) -> ServiceResult<TemplateId> {
        if template.name.trim().is_empty() {
            return Err(PageTreeServiceError::validation(
                "Template name must not be empty",
            ));
        }
        if template.outlines.is_empty() {
            return Err(PageTreeServiceError::validation(
                "Template must contain at least one outline",
            ));
        }
        let mut stack: Vec<&Outline> = template.outlines.iter().collect();
        while let Some(outline) = stack.pop() {
            if outline.title.trim().is_empty() {
                return Err(PageTreeServiceError::validation(
                    "Template outline titles must not be empty",
                ));
            }
            stack.extend(outline.children.iter());
        }

        number_parts(&mut template.outlines);

        let mut custom = self.custom.write().await;
        let next_id = custom.next_id + 1;
        let id = TemplateId::Custom {
            custom_template_id: next_id,
        };
        template.id = Some(id.clone());
        let name = template.name.clone();

        let mut updated = custom.clone();
        updated.next_id = next_id;
        updated.templates.insert(next_id, template);
        self.persist(&updated).await?;
        *custom = updated;

        tracing::info!("Created template '{}' as {}", name, id);
        Ok(id)
    }

    /// Build a custom template from an OPML document and store it
    ///
    /// # Errors
    ///
    /// `Validation` if the document is not OPML or fails [`create`](Self::create)'s checks.
    pub async fn create_from_opml(&self, xml: &str) -> ServiceResult<TemplateId> {
        let template = Template::from_opml(xml)
            .map_err(|e| PageTreeServiceError::validation(format!("Invalid OPML: {}", e)))?;
        self.create(template).await
    }

    /// Delete a custom template; returns false if it did not exist
    pub async fn remove(&self, custom_template_id: i64) -> ServiceResult<bool> {
        let mut custom = self.custom.write().await;
        if !custom.templates.contains_key(&custom_template_id) {
            return Ok(false);
        }

        let mut updated = custom.clone();
        updated.templates.remove(&custom_template_id);
        self.persist(&updated).await?;
        *custom = updated;
        Ok(true)
    }

    async fn persist(&self, custom: &CustomTemplates) -> ServiceResult<()> {
        if let Some(settings) = &self.settings {
            let blob = serde_json::to_vec(custom)?;
            settings.put(CUSTOM_TEMPLATES_KEY, blob).await?;
        }
        Ok(())
    }

    /// Headers of every blueprint (sorted by key) followed by every custom template
    pub async fn list(&self) -> Vec<TemplateHeader> {
        let mut keys: Vec<&String> = self.blueprints.keys().collect();
        keys.sort();
        let mut headers: Vec<TemplateHeader> = keys
            .into_iter()
            .filter_map(|key| self.blueprints.get(key))
            .map(TemplateHeader::from)
            .collect();

        let custom = self.custom.read().await;
        headers.extend(custom.templates.values().map(TemplateHeader::from));
        headers
    }
}

/// Assign part ids `"1"`, `"2"`, ... in pre-order
fn number_parts(outlines: &mut [Outline]) {
    let mut next = 0;
    let mut stack: Vec<&mut Outline> = outlines.iter_mut().rev().collect();
    while let Some(outline) = stack.pop() {
        next += 1;
        outline.part_id = Some(next.to_string());
        stack.extend(outline.children.iter_mut().rev());
    }
}

fn leaf(title: &str) -> Outline {
    Outline::new(title, Vec::new())
}

fn builtin_blueprints() -> Vec<(&'static str, Template)> {
    vec![
        (
            KNOWLEDGE_BASE_BLUEPRINT,
            Template::new(
                "Knowledge base",
                vec![Outline::new(
                    "Knowledge base",
                    vec![leaf("How-to articles"), leaf("Troubleshooting"), leaf("FAQ")],
                )],
            ),
        ),
        (
            DOCUMENTATION_BLUEPRINT,
            Template::new(
                "Documentation",
                vec![Outline::new(
                    "Documentation",
                    vec![
                        leaf("Getting started"),
                        Outline::new("User guide", vec![leaf("Installation"), leaf("Configuration")]),
                        leaf("API reference"),
                        leaf("Release notes"),
                    ],
                )],
            ),
        ),
        (
            TEAM_SPACE_BLUEPRINT,
            Template::new(
                "Team space",
                vec![
                    leaf("Meeting notes"),
                    leaf("Decisions"),
                    leaf("Retrospectives"),
                    leaf("Team members"),
                ],
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemorySettingsStore;

    #[tokio::test]
    async fn test_blueprints_have_numbered_parts() {
        let registry = TemplateRegistry::with_blueprints();
        let doc = registry.blueprint(DOCUMENTATION_BLUEPRINT).unwrap();

        assert_eq!(doc.outlines[0].part_id.as_deref(), Some("1"));
        let guide = &doc.outlines[0].children[1];
        assert_eq!(guide.title, "User guide");
        assert_eq!(guide.part_id.as_deref(), Some("3"));
        assert_eq!(guide.children[1].part_id.as_deref(), Some("5"));
        assert_eq!(doc.page_count(), 7);
    }

    #[tokio::test]
    async fn test_custom_templates_lifecycle() {
        let registry = TemplateRegistry::new();
        let id = registry
            .create(Template::new("Mine", vec![leaf("Root")]))
            .await
            .unwrap();
        assert_eq!(
            id,
            TemplateId::Custom {
                custom_template_id: 1
            }
        );

        let stored = registry.get(&id).await.unwrap();
        assert_eq!(stored.id, Some(id.clone()));
        assert_eq!(registry.list().await.len(), 1);

        assert!(registry.remove(1).await.unwrap());
        assert!(!registry.remove(1).await.unwrap());
        assert!(registry.get(&id).await.is_none());

        let next = registry
            .create(Template::new("Again", vec![leaf("Root")]))
            .await
            .unwrap();
        assert_eq!(
            next,
            TemplateId::Custom {
                custom_template_id: 2
            }
        );
    }

    #[tokio::test]
    async fn test_custom_templates_written_through_settings() {
        let settings = Arc::new(InMemorySettingsStore::new());
        let registry = TemplateRegistry::new()
            .with_settings(settings.clone())
            .await
            .unwrap();
        let id = registry
            .create(Template::new("Mine", vec![Outline::new("Root", vec![leaf("Child")])]))
            .await
            .unwrap();
        registry
            .create(Template::new("Dropped", vec![leaf("Root")]))
            .await
            .unwrap();
        assert!(registry.remove(2).await.unwrap());

        let reloaded = TemplateRegistry::with_blueprints()
            .with_settings(settings)
            .await
            .unwrap();
        let stored = reloaded.get(&id).await.unwrap();
        assert_eq!(stored.name, "Mine");
        assert_eq!(stored.outlines[0].children[0].part_id.as_deref(), Some("2"));
        assert_eq!(reloaded.list().await.len(), 4);

        let next = reloaded
            .create(Template::new("Third", vec![leaf("Root")]))
            .await
            .unwrap();
        assert_eq!(
            next,
            TemplateId::Custom {
                custom_template_id: 3
            }
        );
    }

    #[tokio::test]
    async fn test_failed_write_keeps_registry_unchanged() {
        let settings = Arc::new(BrokenSettings);
        let registry = TemplateRegistry::new()
            .with_settings(settings)
            .await
            .unwrap();
        assert!(matches!(
            registry.create(Template::new("Mine", vec![leaf("Root")])).await,
            Err(PageTreeServiceError::Store(_))
        ));
        assert!(registry.list().await.is_empty());
    }

    struct BrokenSettings;

    #[async_trait::async_trait]
    impl SettingsStore for BrokenSettings {
        async fn get(&self, _key: &str) -> crate::db::StoreResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn put(&self, _key: &str, _value: Vec<u8>) -> crate::db::StoreResult<()> {
            Err(crate::db::StoreError::backend("settings unavailable"))
        }

        async fn remove(&self, _key: &str) -> crate::db::StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_templates() {
        let registry = TemplateRegistry::new();
        assert!(matches!(
            registry.create(Template::new("Empty", vec![])).await,
            Err(PageTreeServiceError::Validation(_))
        ));
        assert!(matches!(
            registry.create(Template::new(" ", vec![leaf("x")])).await,
            Err(PageTreeServiceError::Validation(_))
        ));
    }
}
