//! The process-wide backend-object table.
//!
//! Every opaque server-side object (`PerfTest`, selector builders, widget
//! handles, …) is stored here behind a `"<TypeName>#<index>"` reference
//! string, mirroring the original `StoreBackendObject`/`GetBackendObject`/
//! `BackendObjectsCleaner` trio. A second map records owner-of links so
//! that destroying a parent cascades to its children.
//!
//! The table is a singleton-shaped capability: callers hold a
//! [`Registry`] (usually behind an `Arc`) rather than reaching through an
//! ambient global, in the same spirit as the capability-handle pattern
//! used elsewhere for runtime-provided services.

use crate::error::ApiCallErr;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Marker trait for anything stored in the backend-object table.
///
/// Blanket-implemented for every `Any + Send + Sync` type; exists only to
/// give the table's public API a named bound instead of spelling out
/// `Any + Send + Sync` at every call site.
pub trait BackendObject: Any + Send + Sync {}
impl<T: Any + Send + Sync> BackendObject for T {}

struct Counters {
    by_type: HashMap<&'static str, u32>,
}

impl Counters {
    fn next(&mut self, type_name: &'static str) -> u32 {
        let counter = self.by_type.entry(type_name).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// The backend-object table: live objects plus owner-of links.
pub struct Registry {
    objects: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    owners: Mutex<HashMap<String, String>>,
    counters: Mutex<Counters>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            owners: Mutex::new(HashMap::new()),
            counters: Mutex::new(Counters {
                by_type: HashMap::new(),
            }),
        }
    }

    /// Stores `obj` under a freshly minted `"<type_name>#<index>"` ref,
    /// optionally recording `owner_ref` as its parent for cascade delete.
    /// Returns the new ref.
    pub fn store<T: BackendObject>(
        &self,
        type_name: &'static str,
        obj: Arc<T>,
        owner_ref: Option<&str>,
    ) -> String {
        let index = self.counters.lock().next(type_name);
        let obj_ref = format!("{type_name}#{index}");
        self.objects.lock().insert(obj_ref.clone(), obj);
        if let Some(owner) = owner_ref {
            self.owners.lock().insert(obj_ref.clone(), owner.to_string());
        }
        tracing::debug!(obj_ref = %obj_ref, owner = ?owner_ref, "stored backend object");
        obj_ref
    }

    /// True iff `obj_ref` currently names a live object.
    #[must_use]
    pub fn contains(&self, obj_ref: &str) -> bool {
        self.objects.lock().contains_key(obj_ref)
    }

    /// Returns the dynamically-typed handle for `obj_ref`.
    ///
    /// # Errors
    /// `Internal("Object does not exist")` if `obj_ref` is unknown.
    pub fn get_dyn(&self, obj_ref: &str) -> Result<Arc<dyn Any + Send + Sync>, ApiCallErr> {
        self.objects
            .lock()
            .get(obj_ref)
            .cloned()
            .ok_or_else(|| ApiCallErr::internal("Object does not exist"))
    }

    /// Returns the handle for `obj_ref` downcast to `T`.
    ///
    /// # Errors
    /// `Internal("Object does not exist")` if `obj_ref` is unknown, or if
    /// it exists but is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, obj_ref: &str) -> Result<Arc<T>, ApiCallErr> {
        let handle = self.get_dyn(obj_ref)?;
        handle
            .downcast::<T>()
            .map_err(|_| ApiCallErr::internal("Object does not exist"))
    }

    /// Removes the given refs and their owner-of links. Unknown refs are
    /// logged and skipped, matching `BackendObjectsCleaner`'s tolerant
    /// behavior. Does not cascade; see [`Registry::remove_cascade`].
    pub fn remove_many(&self, refs: &[String]) {
        let mut objects = self.objects.lock();
        let mut owners = self.owners.lock();
        for obj_ref in refs {
            if objects.remove(obj_ref).is_none() {
                tracing::warn!(obj_ref = %obj_ref, "backendObjectsCleaner: unknown ref, skipped");
            }
            owners.remove(obj_ref);
        }
    }

    /// Removes `obj_ref` and every descendant reachable through owner-of
    /// links (children, grandchildren, …), in parent-then-children order.
    pub fn remove_cascade(&self, obj_ref: &str) {
        let mut to_remove = vec![obj_ref.to_string()];
        let mut frontier = vec![obj_ref.to_string()];
        while let Some(parent) = frontier.pop() {
            let children: Vec<String> = self
                .owners
                .lock()
                .iter()
                .filter(|(_, owner)| **owner == parent)
                .map(|(child, _)| child.clone())
                .collect();
            frontier.extend(children.iter().cloned());
            to_remove.extend(children);
        }
        self.remove_many(&to_remove);
    }
}
