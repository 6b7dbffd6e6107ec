//! Agent-indexed storage that grows with the population
//!
//! Agent ids are neither contiguous nor known in advance. Stores are
//! indexed directly by id and grow to `highest id + 1` when a larger id
//! appears:
//! - prior contents keep their indices
//! - new cells take the store's fill value
//! - stores never shrink or reindex

use std::ops::{Index, IndexMut};

use crate::AgentId;

/// Vector indexed by agent id
#[derive(Debug, Clone, PartialEq)]
pub struct AgentVec<T> {
    items: Vec<T>,
    fill: T,
}

impl<T: Clone> AgentVec<T> {
    /// Create a vector of `len` cells set to `fill`
    pub fn new(len: usize, fill: T) -> Self {
        Self {
            items: vec![fill.clone(); len],
            fill,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Make `agent` addressable; returns true if the store grew
    pub fn grow_to(&mut self, agent: AgentId) -> bool {
        if agent < self.items.len() {
            return false;
        }
        self.items.resize(agent + 1, self.fill.clone());
        true
    }

    pub fn get(&self, agent: AgentId) -> Option<&T> {
        self.items.get(agent)
    }

    pub fn get_mut(&mut self, agent: AgentId) -> Option<&mut T> {
        self.items.get_mut(agent)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &T)> {
        self.items.iter().enumerate()
    }
}

impl<T> Index<AgentId> for AgentVec<T> {
    type Output = T;

    fn index(&self, agent: AgentId) -> &T {
        &self.items[agent]
    }
}

impl<T> IndexMut<AgentId> for AgentVec<T> {
    fn index_mut(&mut self, agent: AgentId) -> &mut T {
        &mut self.items[agent]
    }
}

/// Square matrix indexed by `(row, column)` agent ids, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMatrix<T> {
    dim: usize,
    cells: Vec<T>,
    fill: T,
}

impl<T: Clone> AgentMatrix<T> {
    /// Create a `dim × dim` matrix set to `fill`
    pub fn new(dim: usize, fill: T) -> Self {
        Self {
            dim,
            cells: vec![fill.clone(); dim * dim],
            fill,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Make `agent` addressable on both axes; returns true if the matrix grew
    pub fn grow_to(&mut self, agent: AgentId) -> bool {
        if agent < self.dim {
            return false;
        }

        let dim = agent + 1;
        let mut cells = vec![self.fill.clone(); dim * dim];
        for row in 0..self.dim {
            let old = &self.cells[row * self.dim..(row + 1) * self.dim];
            cells[row * dim..row * dim + self.dim].clone_from_slice(old);
        }

        self.cells = cells;
        self.dim = dim;
        true
    }

    pub fn get(&self, row: AgentId, col: AgentId) -> Option<&T> {
        if row < self.dim && col < self.dim {
            self.cells.get(row * self.dim + col)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, row: AgentId, col: AgentId) -> Option<&mut T> {
        if row < self.dim && col < self.dim {
            self.cells.get_mut(row * self.dim + col)
        } else {
            None
        }
    }

    /// Cells of one row
    pub fn row(&self, row: AgentId) -> &[T] {
        &self.cells[row * self.dim..(row + 1) * self.dim]
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, col: AgentId) -> impl Iterator<Item = &T> + '_ {
        (0..self.dim).map(move |row| &self.cells[row * self.dim + col])
    }
}

impl<T> Index<(AgentId, AgentId)> for AgentMatrix<T> {
    type Output = T;

    fn index(&self, (row, col): (AgentId, AgentId)) -> &T {
        assert!(col < self.dim, "column {} out of bounds", col);
        &self.cells[row * self.dim + col]
    }
}

impl<T> IndexMut<(AgentId, AgentId)> for AgentMatrix<T> {
    fn index_mut(&mut self, (row, col): (AgentId, AgentId)) -> &mut T {
        assert!(col < self.dim, "column {} out of bounds", col);
        &mut self.cells[row * self.dim + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vec_growth_preserves_contents() {
        let mut v = AgentVec::new(1, 0i32);
        v[0] = 5;

        assert!(v.grow_to(3));
        assert_eq!(v.as_slice(), &[5, 0, 0, 0]);

        assert!(!v.grow_to(2));
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn test_matrix_growth_preserves_contents() {
        let mut m = AgentMatrix::new(2, 0i32);
        m[(0, 1)] = 7;
        m[(1, 0)] = 3;

        assert!(m.grow_to(3));
        assert_eq!(m.dim(), 4);
        assert_eq!(m[(0, 1)], 7);
        assert_eq!(m[(1, 0)], 3);
        assert_eq!(m[(3, 3)], 0);
        assert_eq!(m.row(0), &[0, 7, 0, 0]);
        assert_eq!(m.column(0).copied().collect::<Vec<_>>(), vec![0, 3, 0, 0]);
    }

    #[test]
    fn test_matrix_from_empty() {
        let mut m: AgentMatrix<Option<u8>> = AgentMatrix::new(0, None);
        assert_eq!(m.get(0, 0), None);

        m.grow_to(1);
        m[(1, 0)] = Some(2);
        assert_eq!(m.get(1, 0), Some(&Some(2)));
        assert_eq!(m.get(2, 0), None);
    }

    proptest! {
        #[test]
        fn prop_matrix_growth_is_lossless(
            writes in prop::collection::vec((0usize..12, 0usize..12, any::<i32>()), 0..40),
            target in 0usize..30,
        ) {
            let mut m = AgentMatrix::new(12, 0i32);
            for &(r, c, v) in &writes {
                m[(r, c)] = v;
            }
            let before = m.clone();

            m.grow_to(target);
            prop_assert!(m.dim() >= before.dim());
            for r in 0..before.dim() {
                for c in 0..before.dim() {
                    prop_assert_eq!(m[(r, c)], before[(r, c)]);
                }
            }
            for r in 0..m.dim() {
                for c in 0..m.dim() {
                    if r >= before.dim() || c >= before.dim() {
                        prop_assert_eq!(m[(r, c)], 0);
                    }
                }
            }
        }

        #[test]
        fn prop_vec_growth_is_lossless(
            values in prop::collection::vec(any::<u16>(), 1..20),
            target in 0usize..50,
        ) {
            let mut v = AgentVec::new(values.len(), 0u16);
            for (i, x) in values.iter().enumerate() {
                v[i] = *x;
            }
            v.grow_to(target);
            prop_assert_eq!(&v.as_slice()[..values.len()], values.as_slice());
            prop_assert!(v.len() > target.max(values.len() - 1));
        }
    }
}
