//! Recency List Module
//!
//! Implements the ordered recency list used for LRU eviction.

// Sentinel for a missing link.
const NIL: usize = usize::MAX;

// == Handle ==
/// Stable position of an item inside a [`RecencyList`].
///
/// A handle stays valid until its item is removed; the slot may then be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Handle(usize);

#[derive(Debug)]
struct Node<T> {
    item: T,
    prev: usize,
    next: usize,
}

// == Recency List ==
/// Doubly-linked list stored in an arena, ordered by access time.
///
/// - Front = Most recently used
/// - Back = Least recently used
///
/// Links are slot indices instead of pointers, and vacated slots are recycled
/// through a free list, so every operation except draining is O(1).
#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<T> Default for RecencyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyList<T> {
    // == Constructor ==
    /// Creates a new empty list. Does not allocate.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.len
    }

    // == Push Front ==
    /// Inserts an item as the most recently used and returns its handle.
    pub fn push_front(&mut self, item: T) -> Handle {
        let node = Node {
            item,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_front(idx);
        self.len += 1;
        Handle(idx)
    }

    // == Move To Front ==
    /// Marks an item as recently used.
    pub fn move_to_front(&mut self, handle: Handle) {
        if handle.0 == self.head || self.node(handle.0).is_none() {
            return;
        }
        self.unlink(handle.0);
        self.link_front(handle.0);
    }

    // == Remove ==
    /// Detaches an item and frees its slot.
    ///
    /// Returns None if the handle does not point at a live item.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.node(handle.0)?;
        self.unlink(handle.0);
        let node = self.slots[handle.0].take()?;
        self.free.push(handle.0);
        self.len -= 1;
        Some(node.item)
    }

    // == Pop Back ==
    /// Removes and returns the least recently used item.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.tail == NIL {
            return None;
        }
        self.remove(Handle(self.tail))
    }

    // == Back ==
    /// Returns the handle of the least recently used item without removing it.
    pub fn back(&self) -> Option<Handle> {
        (self.tail != NIL).then_some(Handle(self.tail))
    }

    // == Accessors ==
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.node(handle.0).map(|node| &node.item)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .map(|node| &mut node.item)
    }

    // == Iteration ==
    /// Iterates items from most to least recently used.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    // == Drain ==
    /// Removes every item, least recently used first.
    ///
    /// The slot storage keeps its allocation for reuse.
    pub fn drain_lru_first(&mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.len);
        while let Some(item) = self.pop_back() {
            drained.push(item);
        }
        self.slots.clear();
        self.free.clear();
        drained
    }

    // == Link Helpers ==
    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn set_prev(&mut self, idx: usize, prev: usize) {
        if let Some(Some(node)) = self.slots.get_mut(idx) {
            node.prev = prev;
        }
    }

    fn set_next(&mut self, idx: usize, next: usize) {
        if let Some(Some(node)) = self.slots.get_mut(idx) {
            node.next = next;
        }
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        self.set_prev(idx, NIL);
        self.set_next(idx, old_head);
        if old_head == NIL {
            self.tail = idx;
        } else {
            self.set_prev(old_head, idx);
        }
        self.head = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let Some(node) = self.node(idx) else {
            return;
        };
        let (prev, next) = (node.prev, node.next);

        if prev == NIL {
            self.head = next;
        } else {
            self.set_next(prev, next);
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.set_prev(next, prev);
        }
        self.set_prev(idx, NIL);
        self.set_next(idx, NIL);
    }
}

// == Iterator ==
/// Front-to-back iterator over a [`RecencyList`].
pub(crate) struct Iter<'a, T> {
    list: &'a RecencyList<T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let list = self.list;
        let idx = self.cursor;
        let node = list.node(idx)?;
        self.cursor = node.next;
        Some((Handle(idx), &node.item))
    }
}
