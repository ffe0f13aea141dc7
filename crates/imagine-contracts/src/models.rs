use indexmap::IndexMap;

use crate::request::MAX_BATCH_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub capabilities: Vec<String>,
    /// Largest `n` the endpoint accepts for this model in one request.
    pub max_batch: u64,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, capabilities: &[&str], max_batch: u64| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                capabilities: capabilities
                    .iter()
                    .map(|item| (*item).to_string())
                    .collect(),
                max_batch,
            },
        );
    };

    insert("grok-imagine-image", &["image"], MAX_BATCH_SIZE);
    insert("grok-2-image", &["image"], MAX_BATCH_SIZE);

    map
}

#[cfg(test)]
mod tests {
    use super::ModelRegistry;

    #[test]
    fn default_registry_lists_image_models_in_order() {
        let registry = ModelRegistry::default();
        let names: Vec<&str> = registry.list().map(|model| model.name.as_str()).collect();
        assert_eq!(names, vec!["grok-imagine-image", "grok-2-image"]);
    }

    #[test]
    fn ensure_gates_on_capability() {
        let registry = ModelRegistry::default();
        assert!(registry.ensure("grok-imagine-image", "image").is_some());
        assert!(registry.ensure("grok-imagine-image", "video").is_none());
        assert!(registry.ensure("unknown-model", "image").is_none());
    }

    #[test]
    fn by_capability_filters_models() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.by_capability("image").len(), 2);
        assert!(registry.by_capability("text").is_empty());
    }
}
