//! Model catalog: the narrow view of the persistence layer's model metadata
//! the compiler needs to resolve entity fields into associations.

use crate::ast::ModelRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Read-only capability interface over model metadata.
///
/// The compiler only ever reads through this trait; the catalog is owned by
/// the caller.
pub trait ModelCatalog {
    /// Whether `model` declares an attribute named exactly `field`.
    fn has_own_attribute(&self, model: &str, field: &str) -> bool;

    /// Looks up `alias` in the association table of `model`.
    fn resolve_association(&self, model: &str, alias: &str) -> Option<&Association>;

    /// Resolves a model by name.
    fn resolve_model(&self, name: &str) -> Option<ModelRef>;
}

/// One entry of a model's association table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub target: String,
    /// Column on the joined table referencing the source row's `id`.
    #[serde(default)]
    pub foreign_key: Option<String>,
}

/// Introspected metadata for one model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Physical table name, defaults to the lowercased model name.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub attributes: HashSet<String>,
    /// Keyed by the generated association alias, see [`association_alias`].
    #[serde(default)]
    pub associations: HashMap<String, Association>,
}

/// In-memory catalog keyed by model name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    models: HashMap<String, ModelDescriptor>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, name: &str, model: ModelDescriptor) -> Self {
        self.models.insert(name.to_string(), model);
        self
    }

    pub fn insert(&mut self, name: &str, model: ModelDescriptor) {
        self.models.insert(name.to_string(), model);
    }

    pub fn models(&self) -> &HashMap<String, ModelDescriptor> {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl ModelCatalog for StaticCatalog {
    fn has_own_attribute(&self, model: &str, field: &str) -> bool {
        self.models
            .get(model)
            .is_some_and(|descriptor| descriptor.attributes.contains(field))
    }

    fn resolve_association(&self, model: &str, alias: &str) -> Option<&Association> {
        self.models.get(model)?.associations.get(alias)
    }

    fn resolve_model(&self, name: &str) -> Option<ModelRef> {
        let descriptor = self.models.get(name)?;
        Some(ModelRef {
            name: name.to_string(),
            table: descriptor
                .table
                .clone()
                .unwrap_or_else(|| name.to_lowercase()),
        })
    }
}

impl ModelDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    pub fn attributes(mut self, attributes: &[&str]) -> Self {
        self.attributes
            .extend(attributes.iter().map(|attribute| attribute.to_string()));
        self
    }

    /// Registers an association of `source` towards the model named after `field`.
    pub fn association(mut self, field: &str, source: &str, target: &str) -> Self {
        self.associations.insert(
            association_alias(field, source),
            Association {
                target: target.to_string(),
                foreign_key: None,
            },
        );
        self
    }
}

/// Alias under which `model` registers its association for `field`:
/// `ALIAS<field>ALIAS<lowercase model>ALIAS`.
pub fn association_alias(field: &str, model: &str) -> String {
    format!("ALIAS{}ALIAS{}ALIAS", field, model.to_lowercase())
}

/// Strips exactly one trailing `s` or `S`.
///
/// This is a naive heuristic: irregular plurals (`people`) are left alone and
/// singular names ending in `s` (`status`) are mangled.
pub fn naive_singularize(name: &str) -> &str {
    name.strip_suffix(['s', 'S']).unwrap_or(name)
}
