//! Tab order for one top-level window.
//!
//! A [`TabOrder`] is the ordered list of focusable fields in a window.
//! Insertion order is traversal order until a field is explicitly relocated
//! next to another one. Traversal helpers take an eligibility predicate so
//! the caller decides what "focusable right now" means; ties are broken by
//! position alone.
//!
//! ```
//! use horizon_focus::{Direction, TabOrder};
//! use horizon_focus_core::NodeTree;
//!
//! let mut tree = NodeTree::new();
//! let (_, root) = tree.create_window("main");
//! let a = tree.add_child(root, "a").unwrap();
//! let b = tree.add_child(root, "b").unwrap();
//! let c = tree.add_child(root, "c").unwrap();
//!
//! let mut order = TabOrder::new();
//! for field in [a, b, c] {
//!     order.insert(field).unwrap();
//! }
//! order.relocate_before(c, a).unwrap();
//! assert_eq!(order.as_slice(), &[c, a, b]);
//!
//! let after_c = order.scan(Some(0), Direction::Next, |n| n != a);
//! assert_eq!(after_c, Some(b));
//! ```

use horizon_focus_core::logging::targets;
use horizon_focus_core::NodeId;

use crate::error::{FocusError, Result};

/// Direction of tab-order traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Forward, as with Tab.
    Next,
    /// Backward, as with Shift+Tab.
    Previous,
}

impl Direction {
    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Self::Next => Self::Previous,
            Self::Previous => Self::Next,
        }
    }
}

/// Ordered focusable fields of one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabOrder {
    fields: Vec<NodeId>,
}

impl TabOrder {
    /// Create an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field at the end.
    ///
    /// # Errors
    ///
    /// [`FocusError::AlreadyRegistered`] if the field is already present.
    pub fn insert(&mut self, field: NodeId) -> Result<()> {
        if self.contains(field) {
            return Err(FocusError::AlreadyRegistered(field));
        }
        self.fields.push(field);
        tracing::trace!(
            target: targets::TAB_ORDER,
            ?field,
            position = self.fields.len() - 1,
            "inserted field"
        );
        Ok(())
    }

    /// Remove a field, returning where it was.
    pub fn remove(&mut self, field: NodeId) -> Option<usize> {
        let position = self.position(field)?;
        self.fields.remove(position);
        tracing::trace!(target: targets::TAB_ORDER, ?field, position, "removed field");
        Some(position)
    }

    /// Remove every field matching `doomed`. Returns how many were removed.
    pub fn remove_where(&mut self, mut doomed: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.fields.len();
        self.fields.retain(|&n| !doomed(n));
        before - self.fields.len()
    }

    /// Where a field sits.
    pub fn position(&self, field: NodeId) -> Option<usize> {
        self.fields.iter().position(|&n| n == field)
    }

    /// Whether the field is in this order.
    pub fn contains(&self, field: NodeId) -> bool {
        self.fields.contains(&field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in traversal order.
    pub fn as_slice(&self) -> &[NodeId] {
        &self.fields
    }

    /// Iterate fields in traversal order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NodeId> + '_ {
        self.fields.iter().copied()
    }

    /// Move `field` to sit immediately before `other`.
    ///
    /// # Errors
    ///
    /// [`FocusError::NotRegistered`] if either field is missing.
    pub fn relocate_before(&mut self, field: NodeId, other: NodeId) -> Result<()> {
        self.relocate(field, other, 0)
    }

    /// Move `field` to sit immediately after `other`.
    ///
    /// # Errors
    ///
    /// [`FocusError::NotRegistered`] if either field is missing.
    pub fn relocate_after(&mut self, field: NodeId, other: NodeId) -> Result<()> {
        self.relocate(field, other, 1)
    }

    fn relocate(&mut self, field: NodeId, other: NodeId, offset: usize) -> Result<()> {
        self.position(other).ok_or(FocusError::NotRegistered(other))?;
        let from = self.position(field).ok_or(FocusError::NotRegistered(field))?;
        if field == other {
            return Ok(());
        }
        self.fields.remove(from);
        let anchor = self.position(other).unwrap_or(self.fields.len());
        self.fields.insert(anchor + offset, field);
        tracing::trace!(
            target: targets::TAB_ORDER,
            ?field,
            ?other,
            position = anchor + offset,
            "relocated field"
        );
        Ok(())
    }

    /// Place `fields`, in the given order, immediately after `anchor`.
    ///
    /// `anchor` itself and repeated entries in `fields` are skipped.
    ///
    /// # Errors
    ///
    /// [`FocusError::NotRegistered`] if any field is missing; the order is
    /// unchanged in that case.
    pub fn relocate_list_after(&mut self, anchor: NodeId, fields: &[NodeId]) -> Result<()> {
        self.check_all(anchor, fields)?;
        let mut previous = anchor;
        for (i, &field) in fields.iter().enumerate() {
            if field == anchor || fields[..i].contains(&field) {
                continue;
            }
            self.relocate_after(field, previous)?;
            previous = field;
        }
        Ok(())
    }

    /// Place `fields`, in the given order, immediately before `anchor`.
    ///
    /// `anchor` itself and repeated entries in `fields` are skipped.
    ///
    /// # Errors
    ///
    /// [`FocusError::NotRegistered`] if any field is missing; the order is
    /// unchanged in that case.
    pub fn relocate_list_before(&mut self, anchor: NodeId, fields: &[NodeId]) -> Result<()> {
        self.check_all(anchor, fields)?;
        for (i, &field) in fields.iter().enumerate() {
            if field == anchor || fields[..i].contains(&field) {
                continue;
            }
            self.relocate_before(field, anchor)?;
        }
        Ok(())
    }

    fn check_all(&self, anchor: NodeId, fields: &[NodeId]) -> Result<()> {
        std::iter::once(&anchor)
            .chain(fields)
            .find(|&&n| !self.contains(n))
            .map_or(Ok(()), |&n| Err(FocusError::NotRegistered(n)))
    }

    /// First field strictly after (or before) `start` in `direction` for
    /// which `eligible` holds, without wrapping.
    ///
    /// With no `start`, scanning begins at the appropriate end.
    pub fn scan(
        &self,
        start: Option<usize>,
        direction: Direction,
        mut eligible: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        match (direction, start) {
            (Direction::Next, Some(pos)) => {
                self.fields.iter().skip(pos + 1).copied().find(|&n| eligible(n))
            }
            (Direction::Previous, Some(pos)) => self.fields[..pos.min(self.fields.len())]
                .iter()
                .rev()
                .copied()
                .find(|&n| eligible(n)),
            (_, None) => self.first(direction, eligible),
        }
    }

    /// First eligible field when scanning the whole order in `direction`.
    pub fn first(
        &self,
        direction: Direction,
        mut eligible: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        match direction {
            Direction::Next => self.fields.iter().copied().find(|&n| eligible(n)),
            Direction::Previous => self.fields.iter().rev().copied().find(|&n| eligible(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_focus_core::NodeTree;

    fn fields(n: usize) -> (TabOrder, Vec<NodeId>) {
        let mut tree = NodeTree::new();
        let (_, root) = tree.create_window("w");
        let ids: Vec<_> = (0..n)
            .map(|i| tree.add_child(root, format!("f{i}")).unwrap())
            .collect();
        let mut order = TabOrder::new();
        for &id in &ids {
            order.insert(id).unwrap();
        }
        (order, ids)
    }

    #[test]
    fn test_insert_twice_fails() {
        let (mut order, ids) = fields(2);
        assert_eq!(order.insert(ids[0]), Err(FocusError::AlreadyRegistered(ids[0])));
        assert_eq!(order.remove(ids[0]), Some(0));
        order.insert(ids[0]).unwrap();
        assert_eq!(order.as_slice(), &[ids[1], ids[0]]);
    }

    #[test]
    fn test_relocate_before_and_after() {
        let (mut order, f) = fields(4);
        order.relocate_before(f[3], f[1]).unwrap();
        assert_eq!(order.as_slice(), &[f[0], f[3], f[1], f[2]]);

        order.relocate_after(f[0], f[2]).unwrap();
        assert_eq!(order.as_slice(), &[f[3], f[1], f[2], f[0]]);

        // Relocating next to itself is a no-op.
        order.relocate_after(f[1], f[1]).unwrap();
        assert_eq!(order.as_slice(), &[f[3], f[1], f[2], f[0]]);
    }

    #[test]
    fn test_relocate_is_consistent_both_ways() {
        // x before y, whichever is earlier to begin with.
        for (x, y) in [(0, 3), (3, 0)] {
            let (mut order, f) = fields(4);
            order.relocate_before(f[x], f[y]).unwrap();
            let px = order.position(f[x]).unwrap();
            assert_eq!(order.as_slice()[px + 1], f[y]);
            assert_eq!(order.len(), 4);
        }
    }

    #[test]
    fn test_relocate_missing_field() {
        let (mut order, f) = fields(2);
        order.remove(f[1]);
        assert_eq!(order.relocate_after(f[0], f[1]), Err(FocusError::NotRegistered(f[1])));
        assert_eq!(order.relocate_after(f[1], f[0]), Err(FocusError::NotRegistered(f[1])));
    }

    #[test]
    fn test_relocate_list_after() {
        let (mut order, f) = fields(5);
        order.relocate_list_after(f[1], &[f[4], f[1], f[0], f[4]]).unwrap();
        assert_eq!(order.as_slice(), &[f[1], f[4], f[0], f[2], f[3]]);
    }

    #[test]
    fn test_relocate_list_before() {
        let (mut order, f) = fields(5);
        order.relocate_list_before(f[2], &[f[4], f[0]]).unwrap();
        assert_eq!(order.as_slice(), &[f[1], f[4], f[0], f[2], f[3]]);
    }

    #[test]
    fn test_relocate_list_is_atomic_on_error() {
        let (mut order, f) = fields(3);
        order.remove(f[2]);
        let before = order.clone();
        assert!(order.relocate_list_after(f[0], &[f[1], f[2]]).is_err());
        assert_eq!(order, before);
    }

    #[test]
    fn test_scan_does_not_wrap() {
        let (order, f) = fields(4);
        let all = |_| true;
        assert_eq!(order.scan(Some(1), Direction::Next, all), Some(f[2]));
        assert_eq!(order.scan(Some(3), Direction::Next, all), None);
        assert_eq!(order.scan(Some(1), Direction::Previous, all), Some(f[0]));
        assert_eq!(order.scan(Some(0), Direction::Previous, all), None);
        assert_eq!(order.scan(None, Direction::Next, all), Some(f[0]));
        assert_eq!(order.scan(None, Direction::Previous, all), Some(f[3]));
    }

    #[test]
    fn test_scan_skips_ineligible() {
        let (order, f) = fields(4);
        let skip = f[1];
        assert_eq!(order.scan(Some(0), Direction::Next, |n| n != skip), Some(f[2]));
        assert_eq!(order.first(Direction::Previous, |n| n == f[1]), Some(f[1]));
        assert_eq!(order.first(Direction::Next, |_| false), None);
    }

    #[test]
    fn test_remove_where() {
        let (mut order, f) = fields(4);
        let gone = [f[0], f[2]];
        assert_eq!(order.remove_where(|n| gone.contains(&n)), 2);
        assert_eq!(order.as_slice(), &[f[1], f[3]]);
    }

    #[test]
    fn test_direction_reverse() {
        assert_eq!(Direction::Next.reverse(), Direction::Previous);
        assert_eq!(Direction::Previous.reverse(), Direction::Next);
    }
}
