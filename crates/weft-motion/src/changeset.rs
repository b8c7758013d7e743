//! Per-pass classification of changed elements into sprites, grouped per
//! stable scope.
//!
//! The [`ChangesetBuilder`] takes this pass's change sets (freshly
//! inserted and removed elements, plus the host's interruption records)
//! and the tracking tree, pairs matching identities into kept sprites
//! with counterparts, detects in-place movement, and fills one
//! [`Changeset`] per stable scope. Changesets are transient: the caller
//! consumes them, plays the resulting animations, and throws them away.

use std::collections::{HashMap, HashSet};

use crate::geometry::{Bounds, ContextAwareBounds, Snapshot};
use crate::sprite::{ElementRef, InterruptionSnapshot, Sprite, SpriteType};
use crate::tree::{DescendantOptions, ElementState, ScopeState, SpriteTree};

/// Criteria for querying sprites out of a changeset. At least one field
/// must be set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteQuery<'a> {
    pub kind: Option<SpriteType>,
    pub id: Option<&'a str>,
    pub role: Option<&'a str>,
}

/// Grouped sprite sets for one stable scope and one pass.
#[derive(Debug, Default)]
pub struct Changeset {
    /// The scope controlling these sprites.
    pub scope: String,
    pub inserted_sprites: Vec<Sprite>,
    pub removed_sprites: Vec<Sprite>,
    pub kept_sprites: Vec<Sprite>,
}

impl Changeset {
    fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..Self::default()
        }
    }

    pub fn add_sprite(&mut self, sprite: Sprite) {
        match sprite.kind {
            SpriteType::Kept => self.kept_sprites.push(sprite),
            SpriteType::Inserted => self.inserted_sprites.push(sprite),
            SpriteType::Removed => self.removed_sprites.push(sprite),
        }
    }

    pub fn has_sprites(&self) -> bool {
        !self.inserted_sprites.is_empty()
            || !self.removed_sprites.is_empty()
            || !self.kept_sprites.is_empty()
    }

    /// All sprites matching the criteria.
    ///
    /// # Panics
    /// Panics when called with empty criteria.
    pub fn sprites_for(&self, criteria: SpriteQuery) -> Vec<&Sprite> {
        assert!(
            criteria.kind.is_some() || criteria.id.is_some() || criteria.role.is_some(),
            "sprites_for requires at least one criterion"
        );
        let pools: Vec<&[Sprite]> = match criteria.kind {
            Some(SpriteType::Inserted) => vec![&self.inserted_sprites],
            Some(SpriteType::Removed) => vec![&self.removed_sprites],
            Some(SpriteType::Kept) => vec![&self.kept_sprites],
            None => vec![
                &self.kept_sprites,
                &self.inserted_sprites,
                &self.removed_sprites,
            ],
        };
        pools
            .into_iter()
            .flatten()
            .filter(|sprite| criteria.id.is_none() || sprite.id() == criteria.id)
            .filter(|sprite| criteria.role.is_none() || sprite.role() == criteria.role)
            .collect()
    }

    /// The single sprite matching the criteria, if any.
    ///
    /// # Panics
    /// Panics when more than one sprite matches.
    pub fn sprite_for(&self, criteria: SpriteQuery) -> Option<&Sprite> {
        let matches = self.sprites_for(criteria);
        assert!(
            matches.len() <= 1,
            "more than one sprite found matching criteria {criteria:?}"
        );
        matches.into_iter().next()
    }
}

/// Builds the per-scope changesets for one reconciliation pass.
#[derive(Debug, Default)]
pub struct ChangesetBuilder {
    changesets: HashMap<String, Changeset>,
}

impl ChangesetBuilder {
    /// Classify this pass's changes and group the resulting sprites per
    /// stable scope. Unstable scopes receive no changeset and are flagged
    /// to be reconsidered next pass.
    ///
    /// The host must have captured before/after measurements into the
    /// tree for every live element and scope before calling this.
    ///
    /// # Panics
    /// Panics when more than one removed element shares an identity with
    /// a single inserted element.
    pub fn build(
        tree: &mut SpriteTree,
        scopes: &[String],
        freshly_inserted: &[ElementRef],
        freshly_removed: &[ElementRef],
        interruptions: &HashMap<String, InterruptionSnapshot>,
    ) -> Self {
        let inserted_nodes: HashSet<&str> =
            freshly_inserted.iter().map(|e| e.node.as_str()).collect();

        // Elements that moved in place, after subtracting their scope's
        // own positional delta. Walking from every scope can visit an
        // element twice through an unstable ancestor chain, hence the
        // seen set.
        let mut seen: HashSet<String> = HashSet::new();
        let mut freshly_changed: Vec<ElementRef> = Vec::new();
        for scope_id in scopes {
            let Some(scope_state) = tree.scope_state(scope_id).cloned() else {
                continue;
            };
            for node in tree.descendant_elements(scope_id, &DescendantOptions::default()) {
                let element = node.element().expect("descendant_elements yields elements");
                if inserted_nodes.contains(node.host_id()) || seen.contains(node.host_id()) {
                    continue;
                }
                if check_for_changes(element, &scope_state) {
                    seen.insert(node.host_id().to_string());
                    freshly_changed.push(ElementRef {
                        node: node.host_id().to_string(),
                        id: element.identity.clone(),
                        role: element.role.clone(),
                    });
                }
            }
        }

        let mut sprites = classify_sprites(
            tree,
            freshly_inserted,
            freshly_removed,
            &freshly_changed,
            interruptions,
        );

        let mut changesets = HashMap::new();
        for scope_id in scopes {
            if tree.is_stable(scope_id) {
                let mut changeset = Changeset::new(scope_id.clone());
                let scope_state = tree.scope_state(scope_id).cloned().unwrap_or_default();
                let governed: HashSet<String> = tree
                    .descendants_of(
                        scope_id,
                        &DescendantOptions {
                            include_freshly_removed: true,
                            ..Default::default()
                        },
                    )
                    .into_iter()
                    .map(|key| tree.node(key).host_id().to_string())
                    .collect();

                let mut remaining = Vec::with_capacity(sprites.len());
                for mut sprite in sprites {
                    if governed.contains(&sprite.node) {
                        contextualize(&mut sprite, &scope_state);
                        changeset.add_sprite(sprite);
                    } else {
                        remaining.push(sprite);
                    }
                }
                sprites = remaining;

                changesets.insert(scope_id.clone(), changeset);
            } else {
                // This pass's scope set is already decided; new scopes
                // join from the next pass on.
                tree.mark_initial_render_completed(scope_id);
            }
        }

        if !sprites.is_empty() {
            tracing::debug!(
                count = sprites.len(),
                "sprites without a governing stable scope were dropped"
            );
        }

        Self { changesets }
    }

    pub fn changeset_for(&self, scope_id: &str) -> Option<&Changeset> {
        self.changesets.get(scope_id)
    }

    pub fn into_changesets(self) -> HashMap<String, Changeset> {
        self.changesets
    }
}

/// True when the element moved or resized on its own, over and above its
/// scope's repositioning.
fn check_for_changes(element: &ElementState, scope: &ScopeState) -> bool {
    let (Some(el_last), Some(el_current), Some(sc_last), Some(sc_current)) = (
        element.last.as_ref(),
        element.current.as_ref(),
        scope.last.as_ref(),
        scope.current.as_ref(),
    ) else {
        return true;
    };
    let parent_dx = sc_current.bounds.left - sc_last.bounds.left;
    let parent_dy = sc_current.bounds.top - sc_last.bounds.top;

    el_current.bounds.left - el_last.bounds.left - parent_dx != 0.0
        || el_current.bounds.top - el_last.bounds.top - parent_dy != 0.0
        || el_current.bounds.width != el_last.bounds.width
        || el_current.bounds.height != el_last.bounds.height
}

fn classify_sprites(
    tree: &SpriteTree,
    freshly_inserted: &[ElementRef],
    freshly_removed: &[ElementRef],
    freshly_changed: &[ElementRef],
    interruptions: &HashMap<String, InterruptionSnapshot>,
) -> Vec<Sprite> {
    let mut sprites = Vec::new();
    let mut unmatched_removed: Vec<&ElementRef> = freshly_removed.iter().collect();

    for inserted in freshly_inserted {
        let identifier = inserted.identifier();
        let matched: Vec<usize> = unmatched_removed
            .iter()
            .enumerate()
            .filter(|(_, removed)| removed.identifier() == identifier)
            .map(|(index, _)| index)
            .collect();
        assert!(
            matched.len() < 2,
            "multiple matching removed elements found for identity {identifier}"
        );
        let removed = matched
            .first()
            .map(|index| unmatched_removed.swap_remove(*index));
        let interruption = interruptions.get(&inserted.identity_key());

        if removed.is_none() && interruption.is_none() {
            // Plain insertion
            let mut sprite = Sprite::new(
                inserted.node.clone(),
                identifier,
                SpriteType::Inserted,
            );
            if let Some(current) = current_snapshot(tree, &inserted.node) {
                set_final(&mut sprite, &current);
            }
            sprites.push(sprite);
            continue;
        }

        // A matching interruption record always wins over the removed
        // element's geometry, being the more up-to-date mid-flight state.
        let start: Option<Snapshot> = match (interruption, &removed) {
            (Some(record), _) => Some(Snapshot {
                bounds: record.bounds,
                styles: record.styles.clone(),
            }),
            (None, Some(removed)) => current_snapshot(tree, &removed.node),
            (None, None) => unreachable!(),
        };

        let mut sprite = Sprite::new(inserted.node.clone(), identifier.clone(), SpriteType::Kept);
        let counterpart_node = removed
            .map(|r| r.node.clone())
            .unwrap_or_else(|| inserted.node.clone());
        let mut counterpart = Sprite::new(counterpart_node, identifier, SpriteType::Removed);

        // Both sides share one visual start point.
        if let Some(start) = &start {
            set_initial(&mut sprite, start);
            set_initial(&mut counterpart, start);
        }
        if let Some(current) = current_snapshot(tree, &inserted.node) {
            set_final(&mut sprite, &current);
            set_final(&mut counterpart, &current);
        }
        sprite.counterpart = Some(Box::new(counterpart));
        sprites.push(sprite);
    }

    for removed in unmatched_removed {
        let mut sprite = Sprite::new(
            removed.node.clone(),
            removed.identifier(),
            SpriteType::Removed,
        );
        let start = match interruptions.get(&removed.identity_key()) {
            Some(record) => Some(Snapshot {
                bounds: record.bounds,
                styles: record.styles.clone(),
            }),
            None => current_snapshot(tree, &removed.node),
        };
        if let Some(start) = &start {
            set_initial(&mut sprite, start);
        }
        sprites.push(sprite);
    }

    for changed in freshly_changed {
        let mut sprite = Sprite::new(changed.node.clone(), changed.identifier(), SpriteType::Kept);
        let state = tree.element_state(&changed.node);
        let start = match interruptions.get(&changed.identity_key()) {
            Some(record) => Some(Snapshot {
                bounds: record.bounds,
                styles: record.styles.clone(),
            }),
            None => state.and_then(|s| s.last.clone()),
        };
        if let Some(start) = &start {
            set_initial(&mut sprite, start);
        }
        if let Some(current) = state.and_then(|s| s.current.clone()) {
            set_final(&mut sprite, &current);
        }
        sprites.push(sprite);
    }

    sprites
}

/// Latest captured measurement for a live or freshly-removed element.
fn current_snapshot(tree: &SpriteTree, node: &str) -> Option<Snapshot> {
    tree.element_state_any(node).and_then(|s| s.current.clone())
}

fn set_initial(sprite: &mut Sprite, snapshot: &Snapshot) {
    sprite.initial_bounds = Some(ContextAwareBounds::new(snapshot.bounds, Bounds::default()));
    sprite.initial_computed_style = Some(snapshot.styles.clone());
}

fn set_final(sprite: &mut Sprite, snapshot: &Snapshot) {
    sprite.final_bounds = Some(ContextAwareBounds::new(snapshot.bounds, Bounds::default()));
    sprite.final_computed_style = Some(snapshot.styles.clone());
}

/// Re-anchor a sprite's bounds to its controlling scope: initial bounds
/// against the scope's before-render box, final bounds against the
/// after-render box. The counterpart is anchored to the same scope.
fn contextualize(sprite: &mut Sprite, scope: &ScopeState) {
    let before = scope
        .last
        .as_ref()
        .or(scope.current.as_ref())
        .map(|s| s.bounds)
        .unwrap_or_default();
    let after = scope.current.as_ref().map(|s| s.bounds).unwrap_or_default();

    if let Some(bounds) = &mut sprite.initial_bounds {
        bounds.context = before;
    }
    if let Some(bounds) = &mut sprite.final_bounds {
        bounds.context = after;
    }
    if let Some(counterpart) = &mut sprite.counterpart {
        contextualize(counterpart, scope);
    }
}
