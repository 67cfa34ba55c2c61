//! Recency Index Module
//!
//! Doubly linked list over an arena of nodes, ordering keys from most
//! recently used (head) to least recently used (tail).

// == Node Handle ==
/// Stable handle to a node in the recency index.
///
/// Handles are arena slots. A slot is recycled after its node is removed,
/// so a handle must not outlive the key it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<K> {
    /// Back-reference to the owning key; None while the slot is free
    key: Option<K>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

// == Recency Index ==
/// Tracks access order for LRU eviction.
///
/// - Head = most recently used
/// - Tail = least recently used
///
/// Every operation is O(1). Links are plain slot indices, so freeing a
/// node can never leave a dangling reference behind.
#[derive(Debug)]
pub struct RecencyIndex<K> {
    nodes: Vec<Node<K>>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl<K> Default for RecencyIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RecencyIndex<K> {
    // == Constructor ==
    /// Creates a new empty recency index.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Insert Front ==
    /// Adds a key as the most recently used and returns its handle.
    pub fn insert_front(&mut self, key: K) -> NodeId {
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Node {
                    key: Some(key),
                    prev: None,
                    next: None,
                };
                id
            }
            None => {
                self.nodes.push(Node {
                    key: Some(key),
                    prev: None,
                    next: None,
                });
                NodeId(self.nodes.len() - 1)
            }
        };
        self.link_front(id);
        self.len += 1;
        id
    }

    // == Promote To Front ==
    /// Marks a node as most recently used. No-op if it is already the head.
    pub fn promote_to_front(&mut self, id: NodeId) {
        if self.head == Some(id) || !self.is_live(id) {
            return;
        }
        self.unlink(id);
        self.link_front(id);
    }

    // == Remove ==
    /// Unlinks a node and frees its slot, returning its key.
    ///
    /// Returns None for a handle whose slot is already free.
    pub fn remove(&mut self, id: NodeId) -> Option<K> {
        if !self.is_live(id) {
            return None;
        }
        self.unlink(id);
        self.len -= 1;
        self.free.push(id);
        self.nodes[id.0].key.take()
    }

    // == Remove Tail ==
    /// Removes and returns the least recently used key.
    pub fn remove_tail(&mut self) -> Option<K> {
        self.tail.and_then(|id| self.remove(id))
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    // == Peeks ==
    /// Most recently used key.
    pub fn head(&self) -> Option<&K> {
        self.head.and_then(|id| self.key(id))
    }

    /// Least recently used key.
    pub fn tail(&self) -> Option<&K> {
        self.tail.and_then(|id| self.key(id))
    }

    pub fn key(&self, id: NodeId) -> Option<&K> {
        self.nodes.get(id.0).and_then(|node| node.key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Iteration ==
    /// Keys from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            index: self,
            cursor: self.head,
            reverse: false,
        }
    }

    /// Keys from least to most recently used.
    pub fn iter_lru(&self) -> Iter<'_, K> {
        Iter {
            index: self,
            cursor: self.tail,
            reverse: true,
        }
    }

    // == Internal Linking ==
    fn is_live(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.0)
            .map(|node| node.key.is_some())
            .unwrap_or(false)
    }

    fn link_front(&mut self, id: NodeId) {
        self.nodes[id.0].prev = None;
        self.nodes[id.0].next = self.head;

        match self.head {
            Some(old_head) => self.nodes[old_head.0].prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn unlink(&mut self, id: NodeId) {
        let prev = self.nodes[id.0].prev.take();
        let next = self.nodes[id.0].next.take();

        match prev {
            Some(prev) => self.nodes[prev.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next.0].prev = prev,
            None => self.tail = prev,
        }
    }
}

// == Iterator ==
/// Walks the recency list in either direction.
pub struct Iter<'a, K> {
    index: &'a RecencyIndex<K>,
    cursor: Option<NodeId>,
    reverse: bool,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let index = self.index;
        let node = &index.nodes[id.0];
        self.cursor = if self.reverse { node.prev } else { node.next };
        node.key.as_ref()
    }
}
