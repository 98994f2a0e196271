//! Composite and tabular schema registration
//!
//! Centralizes the schema definitions that structured-value parsing and
//! the `list` operation rely on. Schemas are registered in a global
//! catalog before a bridge is constructed; each bridge clones an immutable
//! snapshot for lock-free concurrent reads. Stable schema identifiers are
//! blake3 hashes over name and version.

use blake3::Hasher;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::value::TypeSignature;

/// Schema identifier computed from the schema definition
pub type SchemaId = String;

/// A named record schema: ordered, typed fields.
#[derive(Debug, Clone)]
pub struct CompositeSchema {
    /// Schema name referenced by `composite<name>` signatures
    pub name: String,
    /// Version string folded into the hash
    pub version: String,
    /// Ordered field name/signature pairs
    pub fields: Vec<(String, TypeSignature)>,
    /// Stable identifier for version checking
    pub hash: SchemaId,
}

impl CompositeSchema {
    /// Define a composite schema; the hash is derived from name and version.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        fields: Vec<(String, TypeSignature)>,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let hash = compute_schema_hash(&name, &version);
        Self {
            name,
            version,
            fields,
            hash,
        }
    }

    /// Signature of a field, if declared.
    pub fn field(&self, name: &str) -> Option<&TypeSignature> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, signature)| signature)
    }
}

/// A tabular schema: a row schema plus the key fields indexing the rows.
#[derive(Debug, Clone)]
pub struct TabularSchema {
    /// Schema name referenced by `tabular<name>` signatures
    pub name: String,
    /// Version string folded into the hash
    pub version: String,
    /// Name of the composite schema describing each row
    pub row_schema: String,
    /// Key fields, outermost first
    pub key_fields: Vec<String>,
    /// Stable identifier for version checking
    pub hash: SchemaId,
}

impl TabularSchema {
    /// Define a tabular schema; the hash is derived from name and version.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        row_schema: impl Into<String>,
        key_fields: Vec<String>,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let hash = compute_schema_hash(&name, &version);
        Self {
            name,
            version,
            row_schema: row_schema.into(),
            key_fields,
            hash,
        }
    }
}

/// Global catalog of schema definitions.
pub struct SchemaCatalog {
    composites: RwLock<HashMap<String, Arc<CompositeSchema>>>,
    tabulars: RwLock<HashMap<String, Arc<TabularSchema>>>,
}

static CATALOG: OnceLock<SchemaCatalog> = OnceLock::new();

impl SchemaCatalog {
    /// Access the global catalog singleton.
    pub fn global() -> &'static Self {
        CATALOG.get_or_init(|| SchemaCatalog {
            composites: RwLock::new(HashMap::new()),
            tabulars: RwLock::new(HashMap::new()),
        })
    }

    /// Register a composite schema, replacing any previous definition.
    pub fn register_composite(&self, schema: CompositeSchema) {
        self.composites
            .write()
            .insert(schema.name.clone(), Arc::new(schema));
    }

    /// Register a tabular schema, replacing any previous definition.
    pub fn register_tabular(&self, schema: TabularSchema) {
        self.tabulars
            .write()
            .insert(schema.name.clone(), Arc::new(schema));
    }

    /// Produce an immutable snapshot for a bridge instance.
    pub fn snapshot(&self) -> SchemaSnapshot {
        SchemaSnapshot {
            composites: Arc::new(self.composites.read().clone()),
            tabulars: Arc::new(self.tabulars.read().clone()),
        }
    }
}

/// Immutable per-bridge view of the schema catalog.
#[derive(Clone)]
pub struct SchemaSnapshot {
    composites: Arc<HashMap<String, Arc<CompositeSchema>>>,
    tabulars: Arc<HashMap<String, Arc<TabularSchema>>>,
}

impl SchemaSnapshot {
    /// An empty snapshot, for parsers that never meet structured values.
    pub fn empty() -> Self {
        Self {
            composites: Arc::new(HashMap::new()),
            tabulars: Arc::new(HashMap::new()),
        }
    }

    /// Look up a composite schema by name.
    pub fn composite(&self, name: &str) -> Option<&CompositeSchema> {
        self.composites.get(name).map(Arc::as_ref)
    }

    /// Look up a tabular schema by name.
    pub fn tabular(&self, name: &str) -> Option<&TabularSchema> {
        self.tabulars.get(name).map(Arc::as_ref)
    }

    /// Validate that a schema hash matches the registered version.
    pub fn validate_hash(&self, name: &str, hash: &str) -> bool {
        self.composite(name)
            .map(|schema| schema.hash == hash)
            .or_else(|| self.tabular(name).map(|schema| schema.hash == hash))
            .unwrap_or(false)
    }
}

/// Compute a stable hash for a schema definition
fn compute_schema_hash(name: &str, version: &str) -> SchemaId {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(b"|");
    hasher.update(version.as_bytes());
    let hash = hasher.finalize();
    format!("{}", hash.to_hex())
}
