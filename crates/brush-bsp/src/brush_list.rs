//! Arena-backed singly-linked brush list.
//!
//! CSG replaces one fragment with the pieces left after a subtraction while
//! walking the list. Keeping fragments in a slot map and linking them by key
//! makes that replacement O(1), and every fragment is owned by exactly one
//! node at a time.

use slotmap::{SlotMap, new_key_type};

use crate::CompileBrush;

new_key_type! {
    /// Handle to a node of a [`BrushList`].
    pub struct BrushKey;
}

#[derive(Debug, Clone)]
struct BrushNode {
    brush: CompileBrush,
    next: Option<BrushKey>,
}

/// An ordered list of brush fragments.
#[derive(Debug, Clone, Default)]
pub struct BrushList {
    arena: SlotMap<BrushKey, BrushNode>,
    head: Option<BrushKey>,
    tail: Option<BrushKey>,
}

impl BrushList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[inline]
    pub fn head(&self) -> Option<BrushKey> {
        self.head
    }

    /// Key of the node after `key`.
    #[inline]
    pub fn next(&self, key: BrushKey) -> Option<BrushKey> {
        self.arena.get(key).and_then(|node| node.next)
    }

    #[inline]
    pub fn get(&self, key: BrushKey) -> Option<&CompileBrush> {
        self.arena.get(key).map(|node| &node.brush)
    }

    /// Appends a brush at the tail.
    pub fn push(&mut self, brush: CompileBrush) -> BrushKey {
        let key = self.arena.insert(BrushNode { brush, next: None });
        self.link(self.tail, Some(key));
        self.tail = Some(key);
        key
    }

    /// Replaces the node `key` with `fragments`, in order.
    ///
    /// `prev` must be the node before `key` (`None` if `key` is the head).
    /// Returns the key of the last inserted fragment, or `prev` if
    /// `fragments` is empty, so a caller walking the list can continue from
    /// there.
    pub fn splice(
        &mut self,
        prev: Option<BrushKey>,
        key: BrushKey,
        fragments: Vec<CompileBrush>,
    ) -> Option<BrushKey> {
        let next = self.arena.remove(key).and_then(|node| node.next);

        let mut last = prev;
        for brush in fragments {
            let inserted = self.arena.insert(BrushNode { brush, next: None });
            self.link(last, Some(inserted));
            last = Some(inserted);
        }
        self.link(last, next);
        if next.is_none() {
            self.tail = last;
        }
        last
    }

    /// Removes every brush.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates brushes from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Moves the brushes out in list order.
    pub fn into_vec(mut self) -> Vec<CompileBrush> {
        let mut out = Vec::with_capacity(self.arena.len());
        let mut cursor = self.head;
        while let Some(key) = cursor {
            match self.arena.remove(key) {
                Some(node) => {
                    cursor = node.next;
                    out.push(node.brush);
                }
                None => break,
            }
        }
        out
    }

    /// Points `from` (or the head, if `from` is `None`) at `to`.
    fn link(&mut self, from: Option<BrushKey>, to: Option<BrushKey>) {
        match from {
            Some(key) => {
                if let Some(node) = self.arena.get_mut(key) {
                    node.next = to;
                }
            }
            None => self.head = to,
        }
    }
}

impl FromIterator<CompileBrush> for BrushList {
    fn from_iter<I: IntoIterator<Item = CompileBrush>>(iter: I) -> Self {
        let mut list = BrushList::new();
        for brush in iter {
            list.push(brush);
        }
        list
    }
}

/// Iterator over a [`BrushList`].
pub struct Iter<'a> {
    list: &'a BrushList,
    cursor: Option<BrushKey>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CompileBrush;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let node = self.list.arena.get(key)?;
        self.cursor = node.next;
        Some(&node.brush)
    }
}
