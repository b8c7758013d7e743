//! Tracking tree for scopes and elements.
//!
//! The tree mirrors the host's visual hierarchy for the subset of nodes
//! that participate in animation. Nodes are arena-allocated and addressed
//! by [`NodeKey`]; the host identifies its own nodes with stable string
//! ids and registers each one together with its containment path (the
//! chain of ancestor ids), which stands in for walking a live visual tree.
//!
//! Removal does not delete: a removed node moves into its parent's
//! freshly-removed set and survives exactly one pass, so classification
//! can pair it with an insertion elsewhere (far-matching). The driving
//! loop must call [`SpriteTree::clear_freshly_removed`] once per pass
//! after classification has consumed the removals.

use std::collections::HashMap;

use crate::geometry::Snapshot;

/// Arena key for one tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u64);

/// Per-pass state of a scope node.
#[derive(Debug, Clone, Default)]
pub struct ScopeState {
    /// A scope only becomes stable once it has survived a full render;
    /// until then its elements fall through to the nearest stable
    /// ancestor.
    pub initial_render_completed: bool,
    /// Measurement from the previous render boundary.
    pub last: Option<Snapshot>,
    /// Measurement from the current render boundary.
    pub current: Option<Snapshot>,
}

/// Per-pass state of an element node.
#[derive(Debug, Clone, Default)]
pub struct ElementState {
    /// Declared identity id, stable across renders.
    pub identity: Option<String>,
    pub role: Option<String>,
    pub last: Option<Snapshot>,
    pub current: Option<Snapshot>,
}

/// What a tree node wraps.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Scope(ScopeState),
    Element(ElementState),
}

/// One node of the tracking tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    key: NodeKey,
    host_id: String,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    /// Children removed this pass, retained for far-matching until
    /// `clear_freshly_removed`.
    freshly_removed: Vec<NodeKey>,
    /// Host ids of this node's ancestors, root first.
    path: Vec<String>,
    removed: bool,
    pub kind: NodeKind,
}

impl TreeNode {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn freshly_removed_children(&self) -> &[NodeKey] {
        &self.freshly_removed
    }

    pub fn is_scope(&self) -> bool {
        matches!(self.kind, NodeKind::Scope(_))
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn scope(&self) -> Option<&ScopeState> {
        match &self.kind {
            NodeKind::Scope(state) => Some(state),
            NodeKind::Element(_) => None,
        }
    }

    pub fn element(&self) -> Option<&ElementState> {
        match &self.kind {
            NodeKind::Element(state) => Some(state),
            NodeKind::Scope(_) => None,
        }
    }

    fn is_stable_scope(&self) -> bool {
        !self.removed
            && self
                .scope()
                .is_some_and(|state| state.initial_render_completed)
    }
}

/// Options for [`SpriteTree::descendants_of`].
#[derive(Default)]
pub struct DescendantOptions<'a> {
    /// Also walk into freshly-removed subtrees.
    pub include_freshly_removed: bool,
    /// Overrides the default visibility rule. Returning `false` skips the
    /// node and its whole subtree.
    pub filter: Option<&'a dyn Fn(&TreeNode) -> bool>,
}

/// Tracking tree over all registered scopes and elements.
///
/// The tree exclusively owns the node graph, including each node's
/// per-pass measurements.
#[derive(Debug, Default)]
pub struct SpriteTree {
    nodes: HashMap<NodeKey, TreeNode>,
    roots: Vec<NodeKey>,
    /// Removed nodes that had no tracked parent.
    freshly_removed_roots: Vec<NodeKey>,
    lookup: HashMap<String, NodeKey>,
    /// Host ids of freshly-removed nodes, resolvable until the next
    /// `clear_freshly_removed`.
    removed_lookup: HashMap<String, NodeKey>,
    next_key: u64,
}

static_assertions::assert_impl_all!(SpriteTree: Send);

impl SpriteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scope. `path` is the chain of host ancestor ids, root
    /// first. Re-registering an already tracked id is a no-op.
    pub fn add_scope(&mut self, id: &str, path: &[&str]) -> NodeKey {
        self.insert(id, path, NodeKind::Scope(ScopeState::default()))
    }

    /// Register an element. Re-registering an already tracked id is a
    /// no-op.
    pub fn add_element(
        &mut self,
        id: &str,
        identity: Option<&str>,
        role: Option<&str>,
        path: &[&str],
    ) -> NodeKey {
        self.insert(
            id,
            path,
            NodeKind::Element(ElementState {
                identity: identity.map(str::to_string),
                role: role.map(str::to_string),
                ..ElementState::default()
            }),
        )
    }

    /// Move an element into its parent's freshly-removed set.
    pub fn remove_element(&mut self, id: &str) {
        self.remove(id);
    }

    /// Move a scope (and its attached subtree) into its parent's
    /// freshly-removed set.
    pub fn remove_scope(&mut self, id: &str) {
        self.remove(id);
    }

    /// Look up the live node for a host id. Unregistered and removed ids
    /// return `None`.
    pub fn lookup_node(&self, id: &str) -> Option<&TreeNode> {
        self.lookup.get(id).map(|key| &self.nodes[key])
    }

    pub fn node(&self, key: NodeKey) -> &TreeNode {
        &self.nodes[&key]
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Whether the scope is currently tracked and has survived a full
    /// render.
    pub fn is_stable(&self, scope_id: &str) -> bool {
        self.lookup_node(scope_id)
            .is_some_and(TreeNode::is_stable_scope)
    }

    /// Flag a scope as having completed its first render; it becomes
    /// stable from the next pass on.
    pub fn mark_initial_render_completed(&mut self, scope_id: &str) {
        if let Some(state) = self.scope_state_mut(scope_id) {
            state.initial_render_completed = true;
        }
    }

    /// Record a scope measurement for the current render boundary,
    /// shifting the previous one into `last`.
    pub fn capture_scope_snapshot(&mut self, scope_id: &str, measured: Snapshot) {
        if let Some(state) = self.scope_state_mut(scope_id) {
            state.last = state.current.take();
            state.current = Some(measured);
        }
    }

    /// Record an element measurement for the current render boundary,
    /// shifting the previous one into `last`.
    pub fn capture_element_snapshot(&mut self, element_id: &str, measured: Snapshot) {
        if let Some(key) = self.lookup.get(element_id).copied()
            && let Some(node) = self.nodes.get_mut(&key)
            && let NodeKind::Element(state) = &mut node.kind
        {
            state.last = state.current.take();
            state.current = Some(measured);
        }
    }

    pub fn scope_state(&self, scope_id: &str) -> Option<&ScopeState> {
        self.lookup_node(scope_id).and_then(TreeNode::scope)
    }

    pub fn element_state(&self, element_id: &str) -> Option<&ElementState> {
        self.lookup_node(element_id).and_then(TreeNode::element)
    }

    /// The retained node for an id removed this pass.
    pub fn freshly_removed_node(&self, id: &str) -> Option<&TreeNode> {
        self.removed_lookup.get(id).map(|key| &self.nodes[key])
    }

    /// Element state for a live or freshly-removed element.
    pub fn element_state_any(&self, element_id: &str) -> Option<&ElementState> {
        self.element_state(element_id).or_else(|| {
            self.freshly_removed_node(element_id)
                .and_then(TreeNode::element)
        })
    }

    /// Pre-order walk of a scope's subtree.
    ///
    /// By default, subtrees owned by stable descendant scopes are skipped
    /// (those scopes manage their own sprites), while unstable descendant
    /// scopes are walked through so their elements fall through to this
    /// scope. A caller-supplied filter replaces that rule entirely.
    pub fn descendants_of(&self, scope_id: &str, options: &DescendantOptions) -> Vec<NodeKey> {
        let Some(start) = self.lookup.get(scope_id).copied() else {
            return Vec::new();
        };
        let mut result = Vec::new();
        self.walk_children(start, options, &mut result);
        result
    }

    /// Element nodes from [`Self::descendants_of`].
    pub fn descendant_elements(&self, scope_id: &str, options: &DescendantOptions) -> Vec<&TreeNode> {
        self.descendants_of(scope_id, options)
            .into_iter()
            .map(|key| &self.nodes[&key])
            .filter(|node| !node.is_scope())
            .collect()
    }

    fn walk_children(&self, key: NodeKey, options: &DescendantOptions, result: &mut Vec<NodeKey>) {
        let node = &self.nodes[&key];
        let mut child_keys: Vec<NodeKey> = node.children.clone();
        if options.include_freshly_removed {
            child_keys.extend(node.freshly_removed.iter().copied());
        }
        for child_key in child_keys {
            let child = &self.nodes[&child_key];
            let visible = match options.filter {
                Some(filter) => filter(child),
                None => !child.is_stable_scope(),
            };
            if visible {
                result.push(child_key);
                self.walk_children(child_key, options, result);
            }
        }
    }

    /// Elements removed from *other* scopes this pass, candidates for
    /// pairing with an insertion under `scope_id`.
    pub fn far_match_candidates_for(&self, scope_id: &str) -> Vec<&TreeNode> {
        let mut candidates = Vec::new();
        let removed_lists = self
            .nodes
            .values()
            .flat_map(|node| node.freshly_removed.iter().copied())
            .chain(self.freshly_removed_roots.iter().copied());
        for key in removed_lists {
            let node = &self.nodes[&key];
            if node.is_scope() {
                continue;
            }
            match self.owning_scope_of(node) {
                Some(owner) if owner == scope_id => {}
                _ => candidates.push(node),
            }
        }
        candidates
    }

    /// Nearest tracked ancestor scope, by parent links.
    pub fn owning_scope_of(&self, node: &TreeNode) -> Option<&str> {
        let mut parent = node.parent;
        while let Some(key) = parent {
            let ancestor = &self.nodes[&key];
            if ancestor.is_scope() && !ancestor.removed {
                return Some(ancestor.host_id());
            }
            parent = ancestor.parent;
        }
        None
    }

    /// Drop every freshly-removed subtree. Must run exactly once per
    /// pass, after classification has consumed the removals; skipping it
    /// leaks detached nodes.
    pub fn clear_freshly_removed(&mut self) {
        let mut to_purge: Vec<NodeKey> = self.freshly_removed_roots.drain(..).collect();
        for node in self.nodes.values_mut() {
            to_purge.extend(node.freshly_removed.drain(..));
        }
        for key in to_purge {
            self.purge(key);
        }
        self.removed_lookup.clear();
    }

    fn purge(&mut self, key: NodeKey) {
        let Some(node) = self.nodes.remove(&key) else {
            return;
        };
        if self.lookup.get(&node.host_id) == Some(&key) {
            self.lookup.remove(&node.host_id);
        }
        for child in node.children.into_iter().chain(node.freshly_removed) {
            self.purge(child);
        }
    }

    fn insert(&mut self, id: &str, path: &[&str], kind: NodeKind) -> NodeKey {
        if let Some(&existing) = self.lookup.get(id) {
            log::debug!("re-registered already tracked node {id}");
            return existing;
        }

        let key = NodeKey(self.next_key);
        self.next_key += 1;

        // Nearest already-tracked ancestor by containment.
        let parent = path
            .iter()
            .rev()
            .find_map(|ancestor| self.lookup.get(*ancestor).copied());

        let node = TreeNode {
            key,
            host_id: id.to_string(),
            parent,
            children: Vec::new(),
            freshly_removed: Vec::new(),
            path: path.iter().map(|p| p.to_string()).collect(),
            removed: false,
            kind,
        };
        self.nodes.insert(key, node);
        self.lookup.insert(id.to_string(), key);

        match parent {
            Some(parent_key) => self
                .nodes
                .get_mut(&parent_key)
                .expect("parent node exists")
                .children
                .push(key),
            None => self.roots.push(key),
        }

        self.graft_existing_under(key);
        key
    }

    /// Re-parent any live node for which the freshly inserted node is a
    /// closer tracked ancestor than its current parent. Registration
    /// order is host-driven, so an ancestor may well arrive after its
    /// descendants.
    fn graft_existing_under(&mut self, new_key: NodeKey) {
        let new_id = self.nodes[&new_key].host_id.clone();
        let mut to_graft = Vec::new();

        for node in self.nodes.values() {
            if node.key == new_key || node.removed {
                continue;
            }
            let Some(new_index) = node.path.iter().position(|p| *p == new_id) else {
                continue;
            };
            let closer = match node.parent {
                None => true,
                Some(parent_key) => {
                    let parent_id = &self.nodes[&parent_key].host_id;
                    match node.path.iter().position(|p| p == parent_id) {
                        Some(parent_index) => new_index > parent_index,
                        None => true,
                    }
                }
            };
            if closer {
                to_graft.push(node.key);
            }
        }

        for key in to_graft {
            let old_parent = self.nodes[&key].parent;
            match old_parent {
                Some(parent_key) => {
                    let parent = self.nodes.get_mut(&parent_key).expect("parent node exists");
                    parent.children.retain(|c| *c != key);
                }
                None => self.roots.retain(|r| *r != key),
            }
            self.nodes.get_mut(&key).expect("grafted node exists").parent = Some(new_key);
            self.nodes
                .get_mut(&new_key)
                .expect("new node exists")
                .children
                .push(key);
        }
    }

    fn remove(&mut self, id: &str) {
        let Some(key) = self.lookup.remove(id) else {
            log::debug!("remove requested for untracked node {id}");
            return;
        };
        self.removed_lookup.insert(id.to_string(), key);
        let parent = {
            let node = self.nodes.get_mut(&key).expect("tracked node exists");
            node.removed = true;
            node.parent
        };
        match parent {
            Some(parent_key) => {
                let parent = self.nodes.get_mut(&parent_key).expect("parent node exists");
                parent.children.retain(|c| *c != key);
                parent.freshly_removed.push(key);
            }
            None => {
                self.roots.retain(|r| *r != key);
                self.freshly_removed_roots.push(key);
            }
        }
    }

    fn scope_state_mut(&mut self, scope_id: &str) -> Option<&mut ScopeState> {
        let key = self.lookup.get(scope_id).copied()?;
        match &mut self.nodes.get_mut(&key)?.kind {
            NodeKind::Scope(state) => Some(state),
            NodeKind::Element(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_ids<'t>(tree: &'t SpriteTree, keys: &[NodeKey]) -> Vec<&'t str> {
        keys.iter()
            .map(|key| tree.node(*key))
            .filter(|node| !node.is_scope())
            .map(|node| node.host_id())
            .collect()
    }

    #[test]
    fn test_add_and_lookup() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        let key = tree.add_element("child", None, None, &["root"]);

        let node = tree.lookup_node("child").unwrap();
        assert_eq!(node.key(), key);
        assert!(!node.is_scope());
        assert_eq!(
            node.parent().map(|p| tree.node(p).host_id().to_string()),
            Some("root".to_string())
        );
        assert!(tree.lookup_node("unknown").is_none());
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        let first = tree.add_element("child", None, None, &["root"]);
        let second = tree.add_element("child", None, None, &["root"]);
        assert_eq!(first, second);
        assert_eq!(tree.lookup_node("root").unwrap().children().len(), 1);
    }

    #[test]
    fn test_attaches_under_nearest_tracked_ancestor() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        // "wrapper" is not tracked; the element skips over it
        tree.add_element("leaf", None, None, &["root", "wrapper", "inner-wrapper"]);
        let leaf = tree.lookup_node("leaf").unwrap();
        assert_eq!(
            leaf.parent().map(|p| tree.node(p).host_id().to_string()),
            Some("root".to_string())
        );
    }

    #[test]
    fn test_late_ancestor_grafts_descendants() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        tree.add_element("leaf", None, None, &["root", "middle"]);
        assert_eq!(tree.lookup_node("root").unwrap().children().len(), 1);

        // The middle scope registers after its descendant
        tree.add_scope("middle", &["root"]);
        let leaf = tree.lookup_node("leaf").unwrap();
        assert_eq!(
            leaf.parent().map(|p| tree.node(p).host_id().to_string()),
            Some("middle".to_string())
        );
        let root_children = tree.lookup_node("root").unwrap().children();
        assert_eq!(root_children.len(), 1);
        assert_eq!(tree.node(root_children[0]).host_id(), "middle");
    }

    #[test]
    fn test_removal_retains_node_for_one_pass() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        tree.add_element("child", None, None, &["root"]);
        tree.remove_element("child");

        assert!(tree.lookup_node("child").is_none());
        let root = tree.lookup_node("root").unwrap();
        assert_eq!(root.children().len(), 0);
        assert_eq!(root.freshly_removed_children().len(), 1);

        tree.clear_freshly_removed();
        let root = tree.lookup_node("root").unwrap();
        assert_eq!(root.freshly_removed_children().len(), 0);
    }

    #[test]
    fn test_descendants_respect_scope_stability() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        tree.mark_initial_render_completed("root");

        // Branch 1: unstable scope, element, stable scope, element
        tree.add_element("level-1-1", None, None, &["root"]);
        tree.add_scope("scope-2-1", &["root", "level-1-1"]);
        tree.add_element("level-3-1", None, None, &["root", "level-1-1", "scope-2-1"]);
        tree.add_scope("scope-4-1", &["root", "level-1-1", "scope-2-1", "level-3-1"]);
        tree.mark_initial_render_completed("scope-4-1");
        tree.add_element(
            "level-5-1",
            None,
            None,
            &["root", "level-1-1", "scope-2-1", "level-3-1", "scope-4-1"],
        );

        // Branch 2: unstable scopes all the way down
        tree.add_element("level-1-2", None, None, &["root"]);
        tree.add_scope("scope-2-2", &["root", "level-1-2"]);
        tree.add_element("level-3-2", None, None, &["root", "level-1-2", "scope-2-2"]);
        tree.add_scope("scope-4-2", &["root", "level-1-2", "scope-2-2", "level-3-2"]);
        tree.add_element(
            "level-5-2",
            None,
            None,
            &["root", "level-1-2", "scope-2-2", "level-3-2", "scope-4-2"],
        );

        let keys = tree.descendants_of("root", &DescendantOptions::default());
        let mut elements = element_ids(&tree, &keys);
        elements.sort_unstable();
        assert_eq!(
            elements,
            vec!["level-1-1", "level-1-2", "level-3-1", "level-3-2", "level-5-2"]
        );
    }

    #[test]
    fn test_descendants_filter_override() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        tree.add_scope("inner", &["root"]);
        tree.mark_initial_render_completed("inner");
        tree.add_element("leaf", None, None, &["root", "inner"]);

        // Default rule hides the stable inner scope's subtree
        let keys = tree.descendants_of("root", &DescendantOptions::default());
        assert!(element_ids(&tree, &keys).is_empty());

        // An always-true filter reaches through it
        let all = |_: &TreeNode| true;
        let keys = tree.descendants_of(
            "root",
            &DescendantOptions {
                filter: Some(&all),
                ..Default::default()
            },
        );
        assert_eq!(element_ids(&tree, &keys), vec!["leaf"]);
    }

    #[test]
    fn test_descendants_include_freshly_removed() {
        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        tree.add_element("gone", None, None, &["root"]);
        tree.remove_element("gone");

        let keys = tree.descendants_of("root", &DescendantOptions::default());
        assert!(element_ids(&tree, &keys).is_empty());

        let keys = tree.descendants_of(
            "root",
            &DescendantOptions {
                include_freshly_removed: true,
                ..Default::default()
            },
        );
        assert_eq!(element_ids(&tree, &keys), vec!["gone"]);
    }

    #[test]
    fn test_far_match_candidates() {
        let mut tree = SpriteTree::new();
        tree.add_scope("scope-a", &[]);
        tree.add_scope("scope-b", &[]);
        tree.add_element("wanderer", None, None, &["scope-a"]);
        tree.remove_element("wanderer");

        let for_b: Vec<&str> = tree
            .far_match_candidates_for("scope-b")
            .iter()
            .map(|n| n.host_id())
            .collect();
        assert_eq!(for_b, vec!["wanderer"]);

        // The element's own scope does not see it as a far match
        assert!(tree.far_match_candidates_for("scope-a").is_empty());

        tree.clear_freshly_removed();
        assert!(tree.far_match_candidates_for("scope-b").is_empty());
    }

    #[test]
    fn test_measurement_capture_shifts() {
        use crate::geometry::{Bounds, Snapshot};

        let mut tree = SpriteTree::new();
        tree.add_scope("root", &[]);
        tree.add_element("el", None, None, &["root"]);

        tree.capture_element_snapshot("el", Snapshot::new(Bounds::new(0.0, 0.0, 10.0, 10.0)));
        tree.capture_element_snapshot("el", Snapshot::new(Bounds::new(5.0, 0.0, 10.0, 10.0)));

        let state = tree.element_state("el").unwrap();
        assert_eq!(state.last.as_ref().unwrap().bounds.left, 0.0);
        assert_eq!(state.current.as_ref().unwrap().bounds.left, 5.0);
    }

    #[test]
    fn test_stability_lifecycle() {
        let mut tree = SpriteTree::new();
        tree.add_scope("scope", &[]);
        assert!(!tree.is_stable("scope"));
        tree.mark_initial_render_completed("scope");
        assert!(tree.is_stable("scope"));
        tree.remove_scope("scope");
        assert!(!tree.is_stable("scope"));
    }
}
