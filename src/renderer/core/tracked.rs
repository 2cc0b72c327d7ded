use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// GPU resource paired with a process-unique id.
///
/// The id keys bind-group caches and lets callers tell whether a target was
/// recreated (e.g. across `resize`). Clones share the id, since wgpu handles
/// are reference counted and a clone refers to the same resource.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    inner: T,
    id: u64,
}

impl<T> Tracked<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, id: next_id() }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> PartialEq for Tracked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Tracked<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_shared_by_clones() {
        let a = Tracked::new(1u8);
        let b = Tracked::new(1u8);
        let a2 = a.clone();

        assert_ne!(a.id(), b.id());
        assert_eq!(a, a2);
        assert_eq!(*a2, 1);
    }
}
