//! Ordered assembly of child solutions for combination.
//!
//! Sibling subproblems may finish in any order under the concurrent
//! strategy, but the combine callback must see `(payload, solution)` pairs
//! in decomposer order. [`SolutionCombiner`] pins each child to the slot
//! matching its creation index, then yields the pairs in slot order. The
//! solutions come straight from the engine's evaluation results; the tree
//! is never walked a second time to recover them.

/// Index-addressed collector for sibling solutions.
pub struct SolutionCombiner<T, R> {
    payloads: Vec<T>,
    slots: Vec<Option<R>>,
}

impl<T, R> SolutionCombiner<T, R> {
    /// Create a collector for the given child payloads, in decomposer order.
    pub fn new(payloads: Vec<T>) -> Self {
        let slots = payloads.iter().map(|_| None).collect();
        Self { payloads, slots }
    }

    /// Number of child slots.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Whether there are no child slots.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Record the solution for the child at `index`.
    ///
    /// Out-of-range indexes are ignored; the first write to a slot wins.
    pub fn record(&mut self, index: usize, solution: R) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.is_none() {
                *slot = Some(solution);
            }
        }
    }

    /// Whether every slot holds a solution.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Yield `(payload, solution)` pairs in slot order.
    ///
    /// Slots never recorded are dropped, so a complete collector yields one
    /// pair per child.
    pub fn into_pairs(self) -> Vec<(T, R)> {
        self.payloads
            .into_iter()
            .zip(self.slots)
            .filter_map(|(payload, slot)| slot.map(|solution| (payload, solution)))
            .collect()
    }
}
