//! Token trie for noun patterns
//!
//! Patterns are sequences of interned words and one-token wildcards. Lookup
//! walks the trie from a start position and reports every terminal it reaches,
//! so overlapping and nested matches are all visible to the precedence rules.

use lasso::Spur;
use std::collections::HashMap;

use super::MatchBudget;

/// One edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrieKey {
    Word(Spur),
    Any,
}

/// What a complete pattern points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub entry: usize,
    /// Literal (non-wildcard) tokens in the pattern
    pub literal_len: usize,
    /// Global load order of the pattern line
    pub order: usize,
}

/// A terminal reached from some start, ending before token `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieHit {
    pub terminal: Terminal,
    pub end: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: HashMap<Spur, usize>,
    wildcard: Option<usize>,
    terminals: Vec<Terminal>,
}

#[derive(Debug, Clone)]
pub struct TokenTrie {
    nodes: Vec<Node>,
    patterns: usize,
}

impl Default for TokenTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenTrie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            patterns: 0,
        }
    }

    pub fn insert(&mut self, keys: &[TrieKey], terminal: Terminal) {
        let mut node = 0;
        for key in keys {
            let existing = match key {
                TrieKey::Word(spur) => self.nodes[node].children.get(spur).copied(),
                TrieKey::Any => self.nodes[node].wildcard,
            };
            node = match existing {
                Some(next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    match key {
                        TrieKey::Word(spur) => {
                            self.nodes[node].children.insert(*spur, next);
                        }
                        TrieKey::Any => self.nodes[node].wildcard = Some(next),
                    }
                    next
                }
            };
        }
        let terminals = &mut self.nodes[node].terminals;
        if !terminals.iter().any(|t| t.entry == terminal.entry) {
            terminals.push(terminal);
            self.patterns += 1;
        }
    }

    /// Distinct (pattern, entry) pairs stored.
    pub fn len(&self) -> usize {
        self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns == 0
    }

    /// Collect every terminal reachable from `start`. Tokens the lexicon has
    /// never seen are `None` and can only be consumed by a wildcard.
    pub fn matches_at(
        &self,
        keys: &[Option<Spur>],
        start: usize,
        budget: &mut MatchBudget,
        out: &mut Vec<TrieHit>,
    ) {
        let mut stack = vec![(0usize, start)];
        while let Some((node, pos)) = stack.pop() {
            if !budget.step() {
                return;
            }
            let current = &self.nodes[node];
            if pos > start {
                out.extend(current.terminals.iter().map(|&terminal| TrieHit { terminal, end: pos }));
            }
            let Some(key) = keys.get(pos) else { continue };
            if let Some(next) = current.wildcard {
                stack.push((next, pos + 1));
            }
            if let Some(next) = key.and_then(|k| current.children.get(&k)) {
                stack.push((*next, pos + 1));
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
