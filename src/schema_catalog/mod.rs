//! Schema catalog: the definition surface shared with the resolution phase.
//!
//! The join tree never validates paths itself; it consumes definitions that
//! the upstream resolution phase already matched against this catalog.
//!
//! # Key Components
//!
//! - [`SchemaDefinition`] - A table or a derived query, shared via `Arc`
//! - [`Association`] - Navigational relationship metadata (target name,
//!   declared foreign keys)
//! - [`SourceSet`] - Ordered alias-to-definition mapping for a FROM clause,
//!   recursive through query-kind definitions
//! - [`SchemaCatalog`] - By-name registry, loadable from a JSON document
//!
//! # Catalog Format
//!
//! ```json
//! {
//!   "definitions": {
//!     "Books": {
//!       "associations": {
//!         "author": { "target": "Authors", "foreignKeys": ["ID"] }
//!       }
//!     },
//!     "Authors": {},
//!     "BooksView": {
//!       "kind": "query",
//!       "origin": "Books",
//!       "sources": [ { "alias": "Books", "definition": "Books" } ]
//!     }
//!   }
//! }
//! ```

pub mod errors;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use errors::SchemaCatalogError;

/// Kind of a schema definition: a base table or a derived (nested) query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Table,
    Query,
}

/// Navigational relationship from one definition to another.
///
/// The target is stored by name; the resolution phase looks the definition up
/// in the catalog when it builds link records. `foreign_keys` lists the fields
/// whose values are copied onto the owning entity, so that access limited to
/// them never needs a JOIN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub name: String,
    pub target: String,
    #[serde(default, rename = "foreignKeys")]
    pub foreign_keys: Vec<String>,
}

/// Ordered alias-to-definition mapping for one FROM clause.
///
/// Order is FROM-clause order and is preserved; root enumeration and alias
/// registration both depend on it.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    entries: Vec<(String, Arc<SchemaDefinition>)>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, definition: Arc<SchemaDefinition>) {
        self.entries.push((alias.into(), definition));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<SchemaDefinition>)> {
        self.entries.iter().map(|(a, d)| (a.as_str(), d))
    }

    pub fn get(&self, alias: &str) -> Option<&Arc<SchemaDefinition>> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved schema definition: a base table or a derived query.
///
/// Derived queries carry the definition they project from (`origin`) and
/// their own nested `sources`, so alias registration can recurse through
/// them without building their trees.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub name: String,
    pub kind: DefinitionKind,
    /// For query-kind definitions: the underlying definition they project from.
    pub origin: Option<Arc<SchemaDefinition>>,
    /// For query-kind definitions: their own FROM sources.
    pub sources: Option<SourceSet>,
    pub associations: HashMap<String, Association>,
}

impl SchemaDefinition {
    /// Build a base-table definition with no associations.
    pub fn table(name: impl Into<String>) -> Self {
        SchemaDefinition {
            name: name.into(),
            kind: DefinitionKind::Table,
            origin: None,
            sources: None,
            associations: HashMap::new(),
        }
    }

    /// Build a derived-query definition projecting from `origin`.
    pub fn query(name: impl Into<String>, origin: Arc<SchemaDefinition>) -> Self {
        SchemaDefinition {
            name: name.into(),
            kind: DefinitionKind::Query,
            origin: Some(origin),
            sources: None,
            associations: HashMap::new(),
        }
    }

    /// Attach an association (builder style, used heavily in tests).
    pub fn with_association(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_keys: &[&str],
    ) -> Self {
        let name = name.into();
        self.associations.insert(
            name.clone(),
            Association {
                name,
                target: target.into(),
                foreign_keys: foreign_keys.iter().map(|k| k.to_string()).collect(),
            },
        );
        self
    }

    pub fn get_association(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }

    pub fn is_query(&self) -> bool {
        self.kind == DefinitionKind::Query
    }
}

// ============================================================================
// Raw (serde) catalog document
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCatalog {
    definitions: HashMap<String, RawDefinition>,
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(default = "default_kind")]
    kind: DefinitionKind,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    sources: Option<Vec<RawSource>>,
    #[serde(default)]
    associations: HashMap<String, RawAssociation>,
}

fn default_kind() -> DefinitionKind {
    DefinitionKind::Table
}

#[derive(Debug, Deserialize)]
struct RawSource {
    alias: String,
    definition: String,
}

#[derive(Debug, Deserialize)]
struct RawAssociation {
    target: String,
    #[serde(default, rename = "foreignKeys")]
    foreign_keys: Vec<String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// By-name registry of resolved, `Arc`-shared schema definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    definitions: HashMap<String, Arc<SchemaDefinition>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON catalog document and resolve all by-name references
    /// (origins, nested sources) into shared definitions.
    pub fn from_json(text: &str) -> Result<Self, SchemaCatalogError> {
        let raw: RawCatalog = serde_json::from_str(text)?;
        let mut catalog = SchemaCatalog::new();
        let mut visiting = HashSet::new();
        for name in raw.definitions.keys() {
            resolve_definition(name, &raw, &mut catalog.definitions, &mut visiting)?;
        }
        log::debug!(
            "Schema catalog loaded with {} definitions",
            catalog.definitions.len()
        );
        Ok(catalog)
    }

    /// Register a programmatically built definition.
    pub fn insert_definition(&mut self, definition: Arc<SchemaDefinition>) {
        self.definitions
            .insert(definition.name.clone(), definition);
    }

    pub fn get(&self, name: &str) -> Result<Arc<SchemaDefinition>, SchemaCatalogError> {
        self.definitions
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaCatalogError::DefinitionNotFound {
                name: name.to_string(),
            })
    }

    pub fn get_opt(&self, name: &str) -> Option<&Arc<SchemaDefinition>> {
        self.definitions.get(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Resolve one raw definition into the shared map, recursing through origin
/// and nested-source references first. `visiting` guards against reference
/// cycles in the document.
fn resolve_definition(
    name: &str,
    raw: &RawCatalog,
    resolved: &mut HashMap<String, Arc<SchemaDefinition>>,
    visiting: &mut HashSet<String>,
) -> Result<Arc<SchemaDefinition>, SchemaCatalogError> {
    if let Some(done) = resolved.get(name) {
        return Ok(Arc::clone(done));
    }
    if !visiting.insert(name.to_string()) {
        return Err(SchemaCatalogError::CircularDefinition {
            name: name.to_string(),
        });
    }

    let raw_def =
        raw.definitions
            .get(name)
            .ok_or_else(|| SchemaCatalogError::DefinitionNotFound {
                name: name.to_string(),
            })?;

    let origin = match &raw_def.origin {
        Some(origin_name) => Some(
            resolve_definition(origin_name, raw, resolved, visiting).map_err(|e| {
                reference_error(e, origin_name, name)
            })?,
        ),
        None => None,
    };

    let sources = match &raw_def.sources {
        Some(raw_sources) => {
            let mut set = SourceSet::new();
            for source in raw_sources {
                let def = resolve_definition(&source.definition, raw, resolved, visiting)
                    .map_err(|e| reference_error(e, &source.definition, name))?;
                set.insert(source.alias.clone(), def);
            }
            Some(set)
        }
        None => None,
    };

    let associations = raw_def
        .associations
        .iter()
        .map(|(assoc_name, raw_assoc)| {
            (
                assoc_name.clone(),
                Association {
                    name: assoc_name.clone(),
                    target: raw_assoc.target.clone(),
                    foreign_keys: raw_assoc.foreign_keys.clone(),
                },
            )
        })
        .collect();

    let definition = Arc::new(SchemaDefinition {
        name: name.to_string(),
        kind: raw_def.kind,
        origin,
        sources,
        associations,
    });

    visiting.remove(name);
    resolved.insert(name.to_string(), Arc::clone(&definition));
    Ok(definition)
}

fn reference_error(
    inner: SchemaCatalogError,
    referenced: &str,
    referenced_by: &str,
) -> SchemaCatalogError {
    match inner {
        SchemaCatalogError::DefinitionNotFound { .. } => SchemaCatalogError::UnknownReference {
            name: referenced.to_string(),
            referenced_by: referenced_by.to_string(),
        },
        other => other,
    }
}
