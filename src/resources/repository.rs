//! Generic reference-counted name registry shared by the texture, shader,
//! material, and camera repositories.
//!
//! Geometry additionally needs id-based lookup (see
//! [`super::geometry::GeometryRepository`]) and is therefore not built on
//! top of this type, though it follows the same refcount contract.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{RenderError, Result};

struct Entry<T> {
    value: T,
    refcount: u32,
    auto_release: bool,
}

/// Name-keyed acquire/release registry.
///
/// - `acquire` on an existing name bumps the refcount and returns it.
/// - `acquire` on a new name calls the supplied constructor and inserts the
///   result with refcount 1 and `auto_release = true`.
/// - `register_default` inserts an entry that `release` will never destroy
///   and that later `acquire` calls for the same (case-insensitive) name
///   cannot shadow.
pub struct Repository<T> {
    label: &'static str,
    entries: FxHashMap<String, Entry<T>>,
    default_names: FxHashSet<String>,
}

impl<T> Repository<T> {
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: FxHashMap::default(),
            default_names: FxHashSet::default(),
        }
    }

    /// Eagerly registers a built-in default. Defaults start at refcount 1
    /// and are never auto-released; they live for the repository's lifetime.
    pub fn register_default(&mut self, name: &str, value: T) {
        self.default_names.insert(name.to_lowercase());
        self.entries.insert(
            name.to_string(),
            Entry { value, refcount: 1, auto_release: false },
        );
    }

    #[must_use]
    pub fn is_default_name(&self, name: &str) -> bool {
        self.default_names.contains(&name.to_lowercase())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name).map(|entry| &mut entry.value)
    }

    #[must_use]
    pub fn refcount(&self, name: &str) -> u32 {
        self.entries.get(name).map_or(0, |entry| entry.refcount)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Acquires `name`, creating it via `create` on first use.
    ///
    /// Empty names are rejected with `NameInvalid`; callers substitute their
    /// repository-specific default on that error. Attempting to (re)create
    /// an entry whose name collides case-insensitively with a registered
    /// default is rejected with `Duplicate` and a warning log, per the
    /// "overriding a default is disallowed" rule.
    pub fn acquire(&mut self, name: &str, create: impl FnOnce() -> Result<T>) -> Result<&T> {
        if name.is_empty() {
            return Err(RenderError::name_invalid(self.label, "empty name"));
        }

        if self.entries.contains_key(name) {
            self.entries.get_mut(name).unwrap().refcount += 1;
            return Ok(&self.entries[name].value);
        }

        if self.is_default_name(name) {
            log::warn!(
                target: "forge_render::repository",
                "refusing to override default {} '{name}'", self.label
            );
            return Err(RenderError::duplicate(self.label, name.to_string()));
        }

        let value = create()?;
        self.entries
            .insert(name.to_string(), Entry { value, refcount: 1, auto_release: true });
        Ok(&self.entries[name].value)
    }

    /// Decrements `name`'s refcount. Returns the owned value if this was the
    /// last reference to an auto-released entry, so the caller can tear down
    /// any backend resources it holds. An unbalanced release (unknown name,
    /// or already at zero) logs a warning and never destroys anything.
    pub fn release(&mut self, name: &str) -> Option<T> {
        let Some(entry) = self.entries.get_mut(name) else {
            log::warn!(target: "forge_render::repository", "release of unknown {} '{name}'", self.label);
            return None;
        };

        if entry.refcount == 0 {
            log::warn!(target: "forge_render::repository", "unbalanced release of {} '{name}'", self.label);
            return None;
        }

        entry.refcount -= 1;
        if entry.refcount == 0 && entry.auto_release {
            return self.entries.remove(name).map(|entry| entry.value);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_acquire_creates_with_refcount_one() {
        let mut repo: Repository<u32> = Repository::new("test");
        let mut created = 0;
        repo.acquire("a", || {
            created += 1;
            Ok(42)
        })
        .unwrap();
        assert_eq!(created, 1);
        assert_eq!(repo.refcount("a"), 1);
    }

    #[test]
    fn repeated_acquire_increments_refcount_without_recreating() {
        let mut repo: Repository<u32> = Repository::new("test");
        let mut created = 0;
        for _ in 0..3 {
            repo.acquire("a", || {
                created += 1;
                Ok(42)
            })
            .unwrap();
        }
        assert_eq!(created, 1);
        assert_eq!(repo.refcount("a"), 3);
    }

    #[test]
    fn release_destroys_only_when_refcount_reaches_zero() {
        let mut repo: Repository<u32> = Repository::new("test");
        repo.acquire("t", || Ok(1)).unwrap();
        repo.acquire("t", || Ok(1)).unwrap();
        repo.acquire("t", || Ok(1)).unwrap();

        assert!(repo.release("t").is_none());
        assert!(repo.release("t").is_none());
        assert!(repo.release("t").is_some());
        assert!(repo.get("t").is_none());
    }

    #[test]
    fn unbalanced_release_does_not_destroy() {
        let mut repo: Repository<u32> = Repository::new("test");
        repo.acquire("t", || Ok(1)).unwrap();
        assert!(repo.release("t").is_some());
        assert!(repo.release("t").is_none());
    }

    #[test]
    fn defaults_are_never_destroyed_and_cannot_be_overridden() {
        let mut repo: Repository<u32> = Repository::new("test");
        repo.register_default("Default", 7);
        assert!(repo.acquire("default", || Ok(99)).is_err());
        assert_eq!(*repo.get("Default").unwrap(), 7);
        assert!(repo.release("Default").is_none());
        assert_eq!(*repo.get("Default").unwrap(), 7);
    }
}
