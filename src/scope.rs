//! Scope trees built from the captures of a single match.
//!
//! A match produces a flat list of captured spans in capture group order. Captures of the
//! same rule nest (`((a)b)`), so the flat list is turned into a forest where every child span
//! is contained in its parent span.

use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;

/// A named span of text, relative to the start of the chunk it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub name: Arc<str>,
    /// Byte offset from the start of the chunk
    pub start: usize,
    /// Length in bytes
    pub length: usize,
    /// Scopes contained in this one, ordered by start
    pub children: Vec<Scope>,
}

impl Scope {
    pub fn new(name: impl Into<Arc<str>>, start: usize, length: usize) -> Self {
        Self {
            name: name.into(),
            start,
            length,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Closed-interval containment: a span sharing a boundary with this one is contained.
    #[inline]
    pub fn contains(&self, start: usize, length: usize) -> bool {
        start >= self.start && start + length <= self.end()
    }

    /// Moves this scope and all of its descendants by `offset` bytes
    pub fn shift(&mut self, offset: usize) {
        let mut stack = vec![self];
        while let Some(scope) = stack.pop() {
            scope.start += offset;
            stack.extend(scope.children.iter_mut());
        }
    }

    /// Iterates depth-first over this scope and its descendants, giving each scope along
    /// with the names of its ancestors, outermost first.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(self, 0)],
            path: Vec::new(),
        }
    }
}

/// Depth-first iterator returned by [`Scope::walk`]
#[derive(Debug)]
pub struct Walk<'s> {
    stack: Vec<(&'s Scope, usize)>,
    path: Vec<&'s str>,
}

impl<'s> Iterator for Walk<'s> {
    type Item = (Vec<&'s str>, &'s Scope);

    fn next(&mut self) -> Option<Self::Item> {
        let (scope, depth) = self.stack.pop()?;
        self.path.truncate(depth);
        let ancestors = self.path.clone();
        self.path.push(scope.name());
        for child in scope.children.iter().rev() {
            self.stack.push((child, depth + 1));
        }
        Some((ancestors, scope))
    }
}

/// A flat run of text and the names of every scope covering it, outermost first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Byte span within the chunk
    pub span: Range<usize>,
    pub scopes: Vec<Arc<str>>,
}

/// Flattens a scope forest covering `len` bytes into consecutive tokens.
///
/// Text not covered by any scope still produces a token, with no scopes. When sibling
/// scopes overlap, the later one wins.
pub fn flatten(roots: &[Scope], len: usize) -> Vec<Token> {
    let mut boundaries = vec![0, len];
    for root in roots {
        for (_, scope) in root.walk() {
            boundaries.push(scope.start.min(len));
            boundaries.push(scope.end().min(len));
        }
    }
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut tokens = Vec::with_capacity(boundaries.len());
    for window in boundaries.windows(2) {
        let (start, end) = (window[0], window[1]);
        let mut scopes = Vec::new();
        let mut level = roots;
        while let Some(scope) = level
            .iter()
            .rev()
            .find(|s| s.start <= start && end <= s.end())
        {
            scopes.push(scope.name.clone());
            level = &scope.children;
        }
        tokens.push(Token {
            span: start..end,
            scopes,
        });
    }
    tokens
}

#[derive(Debug)]
struct Node {
    name: Arc<str>,
    start: usize,
    length: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    #[inline]
    fn contains(&self, start: usize, length: usize) -> bool {
        start >= self.start && start + length <= self.start + self.length
    }
}

/// Turns the captures of a match into a scope forest.
///
/// Push captures in capture group order; a pushed scope may already have children (the
/// result of an embedded language) which are kept as they are.
#[derive(Debug, Default)]
pub struct ScopeTreeBuilder {
    pending: Vec<Scope>,
}

impl ScopeTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: Scope) {
        self.pending.push(scope);
    }

    pub fn build(mut self) -> Vec<Scope> {
        // Stable: an outer capture sharing its start with an inner one comes first
        self.pending.sort_by_key(|s| s.start);

        let mut nodes: Vec<Node> = Vec::with_capacity(self.pending.len());
        let mut roots = Vec::new();
        let mut cursor: Option<usize> = None;

        for scope in self.pending {
            let mut candidate = cursor;
            while let Some(idx) = candidate {
                if nodes[idx].contains(scope.start, scope.length) {
                    break;
                }
                candidate = nodes[idx].parent;
            }

            let idx = insert_subtree(&mut nodes, scope, candidate);
            match candidate {
                Some(parent) => nodes[parent].children.push(idx),
                None => roots.push(idx),
            }
            cursor = Some(idx);
        }

        into_forest(nodes, &roots)
    }
}

/// Copies a scope and its descendants into the arena, returning the index of its root.
/// Descendants are always stored after their parent.
fn insert_subtree(nodes: &mut Vec<Node>, scope: Scope, parent: Option<usize>) -> usize {
    let root = nodes.len();
    let mut stack = vec![(scope, parent)];
    while let Some((scope, parent)) = stack.pop() {
        let idx = nodes.len();
        if let Some(parent) = parent
            && parent >= root
        {
            nodes[parent].children.push(idx);
        }
        nodes.push(Node {
            name: scope.name,
            start: scope.start,
            length: scope.length,
            parent,
            children: Vec::new(),
        });
        for child in scope.children.into_iter().rev() {
            stack.push((child, Some(idx)));
        }
    }
    root
}

fn into_forest(nodes: Vec<Node>, roots: &[usize]) -> Vec<Scope> {
    let mut built: Vec<Option<Scope>> = Vec::with_capacity(nodes.len());
    built.resize_with(nodes.len(), || None);

    // Children are stored after their parent so walking backwards builds them first
    for (idx, node) in nodes.into_iter().enumerate().rev() {
        let children = node
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[idx] = Some(Scope {
            name: node.name,
            start: node.start,
            length: node.length,
            children,
        });
    }

    roots.iter().filter_map(|&root| built[root].take()).collect()
}

/// Builds the scope forest of flat `(start, length, name)` captures given in capture group
/// order.
pub fn build_scope_tree<'a>(
    entries: impl IntoIterator<Item = (usize, usize, &'a str)>,
) -> Vec<Scope> {
    let mut builder = ScopeTreeBuilder::new();
    for (start, length, name) in entries {
        builder.push(Scope::new(name, start, length));
    }
    builder.build()
}
