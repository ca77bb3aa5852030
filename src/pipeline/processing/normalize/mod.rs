use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::constants::DEFAULT_ALIASES;
use crate::error::{Result, SalesError};
use crate::observability::metrics;
use crate::types::{CanonicalKey, RawRecord, StagedRecord};

/// Many-to-one mapping from dirty header spellings to canonical keys.
///
/// Built from canonical key → variants entries and inverted once. Every
/// canonical key is also an alias of itself. A spelling claimed by two
/// different canonical keys is a construction error.
#[derive(Debug, Clone)]
pub struct AliasTable {
    lookup: HashMap<String, CanonicalKey>,
    variants: BTreeMap<CanonicalKey, Vec<String>>,
}

impl AliasTable {
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (CanonicalKey, Vec<S>)>,
        S: Into<String>,
    {
        let mut table = Self {
            lookup: HashMap::new(),
            variants: BTreeMap::new(),
        };

        for key in CanonicalKey::ALL {
            table.insert(key, key.as_str().to_string())?;
        }
        for (key, variants) in entries {
            for variant in variants {
                table.insert(key, variant.into())?;
            }
        }

        Ok(table)
    }

    /// The built-in table covering the header spellings of the three sales exports
    pub fn defaults() -> Result<Self> {
        Self::new(
            DEFAULT_ALIASES
                .iter()
                .map(|(key, variants)| (*key, variants.to_vec())),
        )
    }

    /// Built-in table extended with additional spellings
    pub fn with_overrides(overrides: Vec<(CanonicalKey, Vec<String>)>) -> Result<Self> {
        let mut table = Self::defaults()?;
        for (key, variants) in overrides {
            for variant in variants {
                table.insert(key, variant)?;
            }
        }
        Ok(table)
    }

    fn insert(&mut self, key: CanonicalKey, alias: String) -> Result<()> {
        match self.lookup.get(&alias) {
            Some(existing) if *existing == key => Ok(()),
            Some(existing) => Err(SalesError::AliasConflict {
                alias,
                first: existing.to_string(),
                second: key.to_string(),
            }),
            None => {
                self.lookup.insert(alias.clone(), key);
                self.variants.entry(key).or_default().push(alias);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, header: &str) -> Option<CanonicalKey> {
        self.lookup.get(header).copied()
    }

    /// Known spellings per canonical key, in canonical order
    pub fn variants(&self) -> impl Iterator<Item = (CanonicalKey, &[String])> {
        self.variants.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

/// Trait for mapping source-specific headers onto the canonical schema
pub trait Normalizer {
    fn normalize(&self, record: &RawRecord) -> StagedRecord;
}

/// Renames headers through an [`AliasTable`]; unknown headers pass through.
///
/// Fields are applied left to right. When two columns land on the same
/// canonical key the field stays where it first appeared and the rightmost
/// column's value wins.
pub struct AliasNormalizer {
    table: AliasTable,
}

impl AliasNormalizer {
    pub fn new(table: AliasTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }
}

impl Normalizer for AliasNormalizer {
    fn normalize(&self, record: &RawRecord) -> StagedRecord {
        let mut staged = StagedRecord::new();

        for (name, value) in record.iter() {
            let canonical = self.table.lookup(name);
            let target = canonical.map(|k| k.as_str()).unwrap_or(name);

            if staged.upsert(target, value.clone()) {
                debug!(header = name, field = target, "Header collision; rightmost column wins");
                if let Some(key) = canonical {
                    metrics::normalize::header_collision(key.as_str());
                }
            }
        }

        staged
    }
}
