//! Trie Module
//!
//! Case-insensitive prefix tree used to serve autocomplete suggestions.

use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Default, Clone)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    is_end: bool,
}

// == Trie ==
/// Prefix-search dictionary over case-folded words.
///
/// Words are stored case-folded, so `"Hello"`, `"HELLO"` and `"hello"` are the
/// same word and every search result comes back folded. There is no
/// removal; rebuild the trie when its source vocabulary changes.
///
/// ```
/// use dynamo_cache::cache::Trie;
///
/// let trie: Trie = ["Europe/Paris", "Europe/Berlin", "Asia/Tokyo"].into_iter().collect();
/// assert_eq!(trie.search_sorted("EUROPE/", 25), vec!["europe/berlin", "europe/paris"]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Trie {
    root: TrieNode,
    len: usize,
}

/// Folds a word or prefix one character at a time before it touches the tree.
///
/// Each character is folded on its own, so the result never depends on its
/// neighbours and a prefix folds to a prefix of the folded word.
fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch == 'ς' { 'σ' } else { ch })
        .collect()
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Adds the folded form of `word`.
    ///
    /// Returns false if the word was already present.
    pub fn insert(&mut self, word: &str) -> bool {
        let mut node = &mut self.root;
        for ch in fold(word).chars() {
            node = node.children.entry(ch).or_default();
        }

        if node.is_end {
            return false;
        }
        node.is_end = true;
        self.len += 1;
        true
    }

    // == Search ==
    /// Returns every stored word starting with `prefix`, compared case-folded.
    ///
    /// An empty prefix matches every word.
    pub fn search(&self, prefix: &str) -> HashSet<String> {
        let prefix = fold(prefix);
        match self.find(&prefix) {
            Some(node) => collect(node, prefix),
            None => HashSet::new(),
        }
    }

    /// Matches for `prefix` in lexical order, at most `limit` of them.
    pub fn search_sorted(&self, prefix: &str, limit: usize) -> Vec<String> {
        let sorted: BTreeSet<String> = self.search(prefix).into_iter().collect();
        sorted.into_iter().take(limit).collect()
    }

    /// Checks for an exact (case-folded) word.
    pub fn contains(&self, word: &str) -> bool {
        self.find(&fold(word)).is_some_and(|node| node.is_end)
    }

    // == Size ==
    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find(&self, folded: &str) -> Option<&TrieNode> {
        folded
            .chars()
            .try_fold(&self.root, |node, ch| node.children.get(&ch))
    }
}

/// Gathers every word below `start`, whose path spells `prefix`.
fn collect(start: &TrieNode, prefix: String) -> HashSet<String> {
    let mut words = HashSet::new();
    let mut stack = vec![(start, prefix)];

    while let Some((node, spelled)) = stack.pop() {
        for (ch, child) in &node.children {
            let mut next = spelled.clone();
            next.push(*ch);
            stack.push((child, next));
        }
        if node.is_end {
            words.insert(spelled);
        }
    }
    words
}

impl<S: AsRef<str>> FromIterator<S> for Trie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Trie::new();
        trie.extend(iter);
        trie
    }
}

impl<S: AsRef<str>> Extend<S> for Trie {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word.as_ref());
        }
    }
}
