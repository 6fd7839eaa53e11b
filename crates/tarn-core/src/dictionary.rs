//! Persistent hashed dictionaries.
//!
//! This implementation is a big-endian Patricia trie keyed by the 64-bit
//! structural hash of each key, which provides:
//! - O(min(n, W)) lookup, insert and delete (W = 64 bits)
//! - Structural sharing between versions: an update copies only the path to
//!   the changed tip
//! - O(1) size
//!
//! Keys whose hashes collide share a tip and are told apart by structural
//! equality. Hashing and comparing keys may force their contents, so every
//! operation that looks at keys can fail with an [`Error`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::compare::{compare, equal, hash};
use crate::{Error, List, Thunk, Value};

// ============================================================
// Core Type
// ============================================================

/// An immutable map from values to value thunks.
#[derive(Clone, Default)]
pub struct Dictionary {
    root: Option<Arc<Node>>,
    size: usize,
}

/// One key and its value.
pub type Entry = (Value, Thunk);

enum Node {
    // All entries whose keys hash to `hash`.
    Tip {
        hash: u64,
        entries: Vec<Entry>,
    },
    Bin {
        prefix: u64,
        mask: u64,
        left: Arc<Node>,
        right: Arc<Node>,
    },
}

// ============================================================
// Construction and Queries
// ============================================================

impl Dictionary {
    /// The empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary by assigning `entries` in order.
    ///
    /// # Errors
    ///
    /// Returns the first error met while hashing or comparing keys.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Result<Self, Error> {
        entries
            .into_iter()
            .try_fold(Self::new(), |dictionary, (key, value)| {
                dictionary.insert(key, value)
            })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns true if both dictionaries share the same root.
    #[must_use]
    pub fn ptr_eq(&self, other: &Dictionary) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Look a key up.
    ///
    /// # Errors
    ///
    /// Returns the first error met while hashing or comparing keys.
    pub fn get(&self, key: &Value) -> Result<Option<Thunk>, Error> {
        let Some(mut node) = self.root.as_deref() else {
            return Ok(None);
        };
        let h = hash(key)?;

        loop {
            match node {
                Node::Tip { hash, entries } => {
                    if *hash != h {
                        return Ok(None);
                    }
                    for (k, v) in entries {
                        if equal(k, key)? {
                            return Ok(Some(v.clone()));
                        }
                    }
                    return Ok(None);
                }
                Node::Bin {
                    prefix,
                    mask,
                    left,
                    right,
                } => {
                    if !match_prefix(h, *prefix, *mask) {
                        return Ok(None);
                    }
                    node = if test_bit(h, *mask) {
                        right.as_ref()
                    } else {
                        left.as_ref()
                    };
                }
            }
        }
    }

    /// The value of a key.
    ///
    /// # Errors
    ///
    /// Returns a `KeyError` if the key is absent.
    pub fn index(&self, key: &Value) -> Result<Thunk, Error> {
        self.get(key)?
            .ok_or_else(|| Error::key_error(format!("key {key:?} not found")))
    }

    /// Whether a key is present.
    ///
    /// # Errors
    ///
    /// Returns the first error met while hashing or comparing keys.
    pub fn contains_key(&self, key: &Value) -> Result<bool, Error> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterate over entries in trie order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
            bucket: Default::default(),
        }
    }

    /// Entries sorted by key.
    ///
    /// # Errors
    ///
    /// Returns the first error met while comparing keys.
    pub fn sorted_entries(&self) -> Result<Vec<Entry>, Error> {
        let mut entries: Vec<Entry> = self.iter().cloned().collect();
        let mut failure = None;
        entries.sort_by(|(a, _), (b, _)| match compare(a, b) {
            Ok(ordering) => ordering,
            Err(e) => {
                failure.get_or_insert(e);
                Ordering::Equal
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(entries),
        }
    }

    /// A list of `[key value]` pairs in trie order. Values stay unevaluated.
    #[must_use]
    pub fn to_list(&self) -> List {
        List::from_thunks(self.iter().map(|(key, value)| {
            Thunk::new(List::from_thunks([Thunk::new(key.clone()), value.clone()]))
        }))
    }
}

// ============================================================
// Updates
// ============================================================

impl Dictionary {
    /// Assign a value to a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns the first error met while hashing or comparing keys.
    pub fn insert(&self, key: Value, value: Thunk) -> Result<Dictionary, Error> {
        let h = hash(&key)?;
        match &self.root {
            None => Ok(Dictionary {
                root: Some(tip(h, vec![(key, value)])),
                size: 1,
            }),
            Some(node) => {
                let (root, added) = insert_node(node, h, key, value)?;
                Ok(Dictionary {
                    root: Some(root),
                    size: self.size + usize::from(added),
                })
            }
        }
    }

    /// Remove a key. Removing an absent key returns an unchanged dictionary.
    ///
    /// # Errors
    ///
    /// Returns the first error met while hashing or comparing keys.
    pub fn remove(&self, key: &Value) -> Result<Dictionary, Error> {
        let Some(node) = &self.root else {
            return Ok(self.clone());
        };
        let h = hash(key)?;
        let root = remove_node(node, h, key)?;

        let removed = match &root {
            Some(root) => !Arc::ptr_eq(root, node),
            None => true,
        };
        Ok(Dictionary {
            root,
            size: self.size - usize::from(removed),
        })
    }

    /// Assign every entry of `other` onto this dictionary, so `other` wins on
    /// shared keys.
    ///
    /// # Errors
    ///
    /// Returns the first error met while hashing or comparing keys.
    pub fn merge(&self, other: &Dictionary) -> Result<Dictionary, Error> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        other
            .iter()
            .try_fold(self.clone(), |merged, (key, value)| {
                merged.insert(key.clone(), value.clone())
            })
    }
}

fn tip(hash: u64, entries: Vec<Entry>) -> Arc<Node> {
    Arc::new(Node::Tip { hash, entries })
}

fn insert_node(
    node: &Arc<Node>,
    h: u64,
    key: Value,
    value: Thunk,
) -> Result<(Arc<Node>, bool), Error> {
    match node.as_ref() {
        Node::Tip { hash, entries } => {
            if *hash != h {
                return Ok((join(h, tip(h, vec![(key, value)]), *hash, Arc::clone(node)), true));
            }
            let mut entries = entries.clone();
            for entry in &mut entries {
                if equal(&entry.0, &key)? {
                    entry.1 = value;
                    return Ok((tip(h, entries), false));
                }
            }
            entries.push((key, value));
            Ok((tip(h, entries), true))
        }
        Node::Bin {
            prefix,
            mask,
            left,
            right,
        } => {
            if !match_prefix(h, *prefix, *mask) {
                Ok((join(h, tip(h, vec![(key, value)]), *prefix, Arc::clone(node)), true))
            } else if test_bit(h, *mask) {
                let (new_right, added) = insert_node(right, h, key, value)?;
                Ok((bin(*prefix, *mask, Arc::clone(left), new_right), added))
            } else {
                let (new_left, added) = insert_node(left, h, key, value)?;
                Ok((bin(*prefix, *mask, new_left, Arc::clone(right)), added))
            }
        }
    }
}

fn remove_node(node: &Arc<Node>, h: u64, key: &Value) -> Result<Option<Arc<Node>>, Error> {
    match node.as_ref() {
        Node::Tip { hash, entries } => {
            if *hash != h {
                return Ok(Some(Arc::clone(node)));
            }
            let mut position = None;
            for (i, (k, _)) in entries.iter().enumerate() {
                if equal(k, key)? {
                    position = Some(i);
                    break;
                }
            }
            Ok(match position {
                None => Some(Arc::clone(node)),
                Some(_) if entries.len() == 1 => None,
                Some(i) => {
                    let mut entries = entries.clone();
                    entries.remove(i);
                    Some(tip(h, entries))
                }
            })
        }
        Node::Bin {
            prefix,
            mask,
            left,
            right,
        } => {
            if !match_prefix(h, *prefix, *mask) {
                return Ok(Some(Arc::clone(node)));
            }
            if test_bit(h, *mask) {
                Ok(match remove_node(right, h, key)? {
                    None => Some(Arc::clone(left)),
                    Some(new_right) if Arc::ptr_eq(&new_right, right) => Some(Arc::clone(node)),
                    Some(new_right) => Some(bin(*prefix, *mask, Arc::clone(left), new_right)),
                })
            } else {
                Ok(match remove_node(left, h, key)? {
                    None => Some(Arc::clone(right)),
                    Some(new_left) if Arc::ptr_eq(&new_left, left) => Some(Arc::clone(node)),
                    Some(new_left) => Some(bin(*prefix, *mask, new_left, Arc::clone(right))),
                })
            }
        }
    }
}

fn bin(prefix: u64, mask: u64, left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
    Arc::new(Node::Bin {
        prefix,
        mask,
        left,
        right,
    })
}

// ============================================================
// Iteration
// ============================================================

/// Iterator over dictionary entries; see [`Dictionary::iter`].
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
    bucket: std::slice::Iter<'a, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.bucket.next() {
                return Some(entry);
            }
            match self.stack.pop()? {
                Node::Tip { entries, .. } => self.bucket = entries.iter(),
                Node::Bin { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = &'a Entry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================
// Helper Functions
// ============================================================

/// Test if a bit is set
#[inline]
fn test_bit(key: u64, mask: u64) -> bool {
    key & mask != 0
}

/// The mask of the highest bit in which two prefixes differ
#[inline]
fn branching_bit(p1: u64, p2: u64) -> u64 {
    let x = p1 ^ p2;
    if x == 0 {
        return 0;
    }
    1u64 << (63 - x.leading_zeros())
}

/// Clear the mask bit and every bit below it
#[inline]
fn mask_prefix(key: u64, mask: u64) -> u64 {
    key & (mask.wrapping_neg() ^ mask)
}

#[inline]
fn match_prefix(key: u64, prefix: u64, mask: u64) -> bool {
    mask_prefix(key, mask) == prefix
}

/// Join two subtrees whose prefixes differ
fn join(p1: u64, t1: Arc<Node>, p2: u64, t2: Arc<Node>) -> Arc<Node> {
    let mask = branching_bit(p1, p2);
    let prefix = mask_prefix(p1, mask);
    if test_bit(p1, mask) {
        bin(prefix, mask, t2, t1)
    } else {
        bin(prefix, mask, t1, t2)
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
