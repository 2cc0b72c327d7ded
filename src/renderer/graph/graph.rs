//! Pass list
//!
//! `PassList` keeps the pipeline's passes sorted by ascending priority.
//! The sort is stable, so passes of equal priority run in insertion order.

use super::node::RenderPass;

#[derive(Default)]
pub struct PassList {
    passes: Vec<Box<dyn RenderPass>>,
}

impl PassList {
    #[must_use]
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Inserts `pass` and re-sorts. A pass with the same name is replaced
    /// (after its `destroy`).
    pub fn add(&mut self, pass: Box<dyn RenderPass>) {
        if let Some(mut old) = self.remove(pass.name()) {
            log::warn!("Replacing existing pass '{}'", pass.name());
            old.destroy();
        }
        self.passes.push(pass);
        self.passes.sort_by_key(|p| p.priority());
    }

    /// Removes the pass named `name` without destroying it.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn RenderPass>> {
        let index = self.passes.iter().position(|p| p.name() == name)?;
        Some(self.passes.remove(index))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn RenderPass> {
        self.passes.iter().find(|p| p.name() == name).map(AsRef::as_ref)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn RenderPass> {
        match self.passes.iter_mut().find(|p| p.name() == name) {
            Some(pass) => Some(pass.as_mut()),
            None => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn RenderPass> {
        self.passes.iter().map(AsRef::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn RenderPass>> {
        self.passes.iter_mut()
    }

    /// Pass names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Destroys and drops every pass.
    pub fn clear(&mut self) {
        for pass in &mut self.passes {
            pass.destroy();
        }
        self.passes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::core::GpuContext;
    use crate::renderer::graph::{FrameEncoder, PassPriority, PassResult, RenderContext};
    use crate::scene::RenderObject;

    struct Named {
        name: &'static str,
        priority: u32,
        enabled: bool,
    }

    impl RenderPass for Named {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> PassPriority {
            PassPriority(self.priority)
        }
        fn enabled(&self) -> bool {
            self.enabled
        }
        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }
        fn execute(
            &mut self,
            _gpu: &GpuContext,
            _frame: &mut FrameEncoder,
            _ctx: &mut RenderContext,
            _objects: &[RenderObject],
        ) -> Option<PassResult> {
            None
        }
    }

    fn pass(name: &'static str, priority: u32) -> Box<dyn RenderPass> {
        Box::new(Named {
            name,
            priority,
            enabled: true,
        })
    }

    #[test]
    fn sorted_by_priority() {
        let mut list = PassList::new();
        list.add(pass("ui", 700));
        list.add(pass("shadow", 100));
        list.add(pass("transparent", 400));

        let order: Vec<u32> = list.iter().map(|p| p.priority().value()).collect();
        assert_eq!(order, vec![100, 400, 700]);
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let mut list = PassList::new();
        list.add(pass("a", 300));
        list.add(pass("b", 100));
        list.add(pass("c", 300));
        assert_eq!(list.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn remove_and_lookup() {
        let mut list = PassList::new();
        list.add(pass("sky", 200));
        list.add(pass("overlay", 600));

        list.get_mut("sky").unwrap().set_enabled(false);
        assert!(!list.get("sky").unwrap().enabled());

        assert!(list.remove("sky").is_some());
        assert!(list.get("sky").is_none());
        assert_eq!(list.len(), 1);
    }
}
