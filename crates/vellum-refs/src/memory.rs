//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] stores all refs in a `BTreeMap` protected by a
//! `RwLock`, so listings come out sorted without extra work.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;
use vellum_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::{is_tag, Ref};

/// An in-memory implementation of [`RefStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, ObjectId>>,
    head: RwLock<Option<String>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> RefError {
    RefError::Poisoned(e.to_string())
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<Ref>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs.get(name).map(|target| Ref::new(name, *target)))
    }

    fn create_ref(&self, name: &str, target: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        let mut refs = self.refs.write().map_err(poisoned)?;
        if refs.contains_key(name) {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        refs.insert(name.to_string(), target);
        debug!(ref_name = name, target = %target.short_hex(), "created ref");
        Ok(())
    }

    fn update_ref(&self, name: &str, expected: ObjectId, new: ObjectId) -> RefResult<()> {
        if is_tag(name) {
            return Err(RefError::TagImmutable {
                name: name.to_string(),
            });
        }
        let mut refs = self.refs.write().map_err(poisoned)?;
        let current = refs.get_mut(name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;
        if *current != expected {
            return Err(RefError::Conflict {
                name: name.to_string(),
                expected,
                actual: *current,
            });
        }
        *current = new;
        debug!(ref_name = name, from = %expected.short_hex(), to = %new.short_hex(), "moved ref");
        Ok(())
    }

    fn write_ref(&self, name: &str, target: ObjectId) -> RefResult<()> {
        validate_ref_name(name)?;
        let mut refs = self.refs.write().map_err(poisoned)?;
        if is_tag(name) {
            if let Some(existing) = refs.get(name) {
                if *existing != target {
                    return Err(RefError::TagImmutable {
                        name: name.to_string(),
                    });
                }
            }
        }
        refs.insert(name.to_string(), target);
        Ok(())
    }

    fn list_refs(&self, prefix: &str) -> RefResult<Vec<Ref>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| Ref::new(k.clone(), *v))
            .collect())
    }

    fn head(&self) -> RefResult<Option<String>> {
        Ok(self.head.read().map_err(poisoned)?.clone())
    }

    fn set_head(&self, target: &str) -> RefResult<()> {
        validate_ref_name(target)?;
        *self.head.write().map_err(poisoned)? = Some(target.to_string());
        Ok(())
    }
}
