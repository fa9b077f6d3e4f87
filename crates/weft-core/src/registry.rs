//! Handle registry: the single owner of every live resource record.

use std::collections::BTreeMap;

use weft_common::{CoreError, Handle};

/// Maps handles to live resources. Handles come from the process-wide
/// counter, so a destroyed handle never resolves again.
#[derive(Debug)]
pub struct HandleRegistry<R> {
    entries: BTreeMap<Handle, R>,
}

impl<R> Default for HandleRegistry<R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<R> HandleRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: R) -> Handle {
        let handle = Handle::next();
        self.entries.insert(handle, resource);
        handle
    }

    pub fn resolve(&self, handle: Handle) -> Result<&R, CoreError> {
        self.entries
            .get(&handle)
            .ok_or(CoreError::InvalidHandle(handle))
    }

    pub fn resolve_mut(&mut self, handle: Handle) -> Result<&mut R, CoreError> {
        self.entries
            .get_mut(&handle)
            .ok_or(CoreError::InvalidHandle(handle))
    }

    /// Remove a resource, returning it. The handle is dead afterwards.
    pub fn destroy(&mut self, handle: Handle) -> Result<R, CoreError> {
        self.entries
            .remove(&handle)
            .ok_or(CoreError::InvalidHandle(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live handles in creation order.
    pub fn handles(&self) -> Vec<Handle> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &R)> {
        self.entries.iter().map(|(h, r)| (*h, r))
    }

    /// Remove everything, in creation order.
    pub fn drain(&mut self) -> Vec<(Handle, R)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let mut reg = HandleRegistry::new();
        let h = reg.register("window");
        assert_eq!(*reg.resolve(h).unwrap(), "window");
        assert!(reg.contains(h));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn resolve_after_destroy_fails() {
        let mut reg = HandleRegistry::new();
        let h = reg.register(1u32);
        assert_eq!(reg.destroy(h).unwrap(), 1);
        assert_eq!(reg.resolve(h), Err(CoreError::InvalidHandle(h)));
        assert_eq!(reg.destroy(h), Err(CoreError::InvalidHandle(h)));
        assert!(reg.is_empty());
    }

    #[test]
    fn handles_increase_and_are_not_reused() {
        let mut reg = HandleRegistry::new();
        let a = reg.register(());
        reg.destroy(a).unwrap();
        let b = reg.register(());
        let c = reg.register(());
        assert!(a < b && b < c);
        assert_eq!(reg.handles(), vec![b, c]);
    }

    #[test]
    fn resolve_mut_updates_in_place() {
        let mut reg = HandleRegistry::new();
        let h = reg.register(String::from("a"));
        reg.resolve_mut(h).unwrap().push('b');
        assert_eq!(reg.resolve(h).unwrap(), "ab");
    }

    #[test]
    fn drain_empties_in_order() {
        let mut reg = HandleRegistry::new();
        let a = reg.register('a');
        let b = reg.register('b');
        let drained = reg.drain();
        assert_eq!(drained, vec![(a, 'a'), (b, 'b')]);
        assert!(reg.is_empty());
    }
}
