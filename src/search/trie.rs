//! Prefix Trie Index
//!
//! Maps lowercased tokens to the ids of the records that contain them. Lookups
//! walk the trie to the node spelled by a query token and collect the ids stored
//! anywhere below it, which gives word-prefix matching for free.

use super::tokenizer::tokenize_folded;
use crate::catalog::{Catalog, Record};

use std::collections::{BTreeSet, HashMap};

/// Record fields that can be indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexField {
    Artist,
    Title,
}

impl IndexField {
    pub const DEFAULT: [IndexField; 2] = [IndexField::Artist, IndexField::Title];

    fn value(self, record: &Record) -> &str {
        match self {
            IndexField::Artist => &record.artist,
            IndexField::Title => &record.title,
        }
    }
}

/// Strategy for merging the match sets of individual query tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reducer {
    /// A record matches if any query token matches it.
    #[default]
    Union,
    /// A record matches only if every query token matches it.
    Intersection,
}

impl Reducer {
    pub fn reduce(self, sets: Vec<BTreeSet<usize>>) -> BTreeSet<usize> {
        let mut sets = sets.into_iter();
        match self {
            Reducer::Union => sets.flatten().collect(),
            Reducer::Intersection => {
                let Some(mut acc) = sets.next() else {
                    return BTreeSet::new();
                };
                for set in sets {
                    acc.retain(|id| set.contains(id));
                    if acc.is_empty() {
                        break;
                    }
                }
                acc
            }
        }
    }
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Ids of records owning the token that ends at this node.
    ids: BTreeSet<usize>,
}

/// Read-only token index over a `Catalog`.
#[derive(Debug)]
pub struct SearchIndex {
    root: TrieNode,
    fields: Vec<IndexField>,
    reducer: Reducer,
    token_count: usize,
}

impl SearchIndex {
    /// Indexes artist and title of every record, merging query tokens by union.
    pub fn build(catalog: &Catalog) -> Self {
        Self::build_with(catalog, &IndexField::DEFAULT, Reducer::Union)
    }

    pub fn build_with(catalog: &Catalog, fields: &[IndexField], reducer: Reducer) -> Self {
        let mut index = Self {
            root: TrieNode::default(),
            fields: fields.to_vec(),
            reducer,
            token_count: 0,
        };

        for record in catalog.records() {
            for field in fields {
                for token in tokenize_folded(field.value(record)) {
                    index.insert(&token, record.id);
                }
            }
        }

        index
    }

    fn insert(&mut self, token: &str, id: usize) {
        let mut node = &mut self.root;
        for ch in token.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.ids.is_empty() {
            self.token_count += 1;
        }
        node.ids.insert(id);
    }

    /// Ids of records matching `text`, in ascending (catalog) order.
    ///
    /// A query without any alphanumeric token matches nothing.
    pub fn query(&self, text: &str) -> BTreeSet<usize> {
        let tokens = tokenize_folded(text);
        if tokens.is_empty() {
            return BTreeSet::new();
        }

        let per_token = tokens
            .iter()
            .map(|token| self.prefix_matches(token))
            .collect();
        self.reducer.reduce(per_token)
    }

    /// Ids of every indexed token that starts with `prefix`.
    fn prefix_matches(&self, prefix: &str) -> BTreeSet<usize> {
        let mut node = &self.root;
        for ch in prefix.chars() {
            match node.children.get(&ch) {
                Some(child) => node = child,
                None => return BTreeSet::new(),
            }
        }

        let mut ids = BTreeSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            ids.extend(current.ids.iter().copied());
            stack.extend(current.children.values());
        }
        ids
    }

    /// Number of distinct tokens in the index.
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }
}
