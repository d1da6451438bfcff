// crates/core/src/arena.rs
//! Owned registry of live game-engine instances, one per mounted container.
//!
//! Mounting a game view calls [`EngineArena::register`] and keeps the returned
//! [`ArenaLease`] for as long as the view lives. Dropping the lease is the
//! unmount: the instance leaves the arena and its own `Drop` runs. A second
//! mount on an occupied container is refused instead of silently stacking a
//! duplicate engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

/// Identifies the view container an engine renders into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("an engine is already mounted on container {0}")]
    AlreadyMounted(ContainerId),
}

/// Mounted instances, each tagged with the generation of its registration.
struct Mounted<T> {
    next_generation: u64,
    engines: HashMap<ContainerId, (u64, T)>,
}

type Slots<T> = Arc<Mutex<Mounted<T>>>;

fn lock<T>(slots: &Slots<T>) -> MutexGuard<'_, Mounted<T>> {
    // A panic while holding the lock cannot leave the map half-updated.
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registry of live instances. Cloning shares the same slots.
pub struct EngineArena<T> {
    slots: Slots<T>,
}

impl<T> Clone for EngineArena<T> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<T> Default for EngineArena<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Mounted {
                next_generation: 0,
                engines: HashMap::new(),
            })),
        }
    }
}

impl<T> fmt::Debug for EngineArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineArena")
            .field("mounted", &self.len())
            .finish()
    }
}

impl<T> EngineArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `engine` on `container`.
    ///
    /// On conflict the existing instance stays and `engine` is dropped.
    pub fn register(&self, container: ContainerId, engine: T) -> Result<ArenaLease<T>, ArenaError> {
        let mut slots = lock(&self.slots);
        if slots.engines.contains_key(&container) {
            tracing::warn!(container = %container, "Engine already mounted on container");
            return Err(ArenaError::AlreadyMounted(container));
        }
        let generation = slots.next_generation;
        slots.next_generation += 1;
        slots.engines.insert(container.clone(), (generation, engine));
        tracing::debug!(
            container = %container,
            generation,
            mounted = slots.engines.len(),
            "Engine mounted"
        );
        Ok(ArenaLease {
            container,
            generation,
            slots: Arc::clone(&self.slots),
        })
    }

    /// Tear down the instance on `container`, returning it if one was mounted.
    pub fn unregister(&self, container: &ContainerId) -> Option<T> {
        let removed = lock(&self.slots).engines.remove(container);
        if removed.is_some() {
            tracing::debug!(container = %container, "Engine unmounted");
        }
        removed.map(|(_, engine)| engine)
    }

    pub fn contains(&self, container: &ContainerId) -> bool {
        lock(&self.slots).engines.contains_key(container)
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` against the instance mounted on `container`, if any.
    pub fn with<R>(&self, container: &ContainerId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        lock(&self.slots)
            .engines
            .get_mut(container)
            .map(|(_, engine)| f(engine))
    }
}

/// Held by the mounting view; dropping it unmounts the engine.
///
/// A lease only ever removes the registration it was issued for. Once that
/// engine is unregistered, a later mount on the same container is out of its
/// reach.
#[must_use = "dropping the lease unmounts the engine immediately"]
pub struct ArenaLease<T> {
    container: ContainerId,
    generation: u64,
    slots: Slots<T>,
}

impl<T> ArenaLease<T> {
    pub fn container(&self) -> &ContainerId {
        &self.container
    }
}

impl<T> fmt::Debug for ArenaLease<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaLease")
            .field("container", &self.container)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> Drop for ArenaLease<T> {
    fn drop(&mut self) {
        // Take the instance out first so its Drop runs without the lock held.
        let removed = {
            let mut slots = lock(&self.slots);
            match slots.engines.get(&self.container) {
                Some((generation, _)) if *generation == self.generation => {
                    slots.engines.remove(&self.container)
                }
                _ => None,
            }
        };
        if removed.is_some() {
            tracing::debug!(container = %self.container, "Engine unmounted on lease drop");
        }
        drop(removed);
    }
}
