//! End-to-end reconciliation pass: snapshot, mutate, classify, generate
//! frames, merge, clean up.

use std::collections::HashMap;

use weft_motion::{
    Bounds, ChangesetBuilder, DescendantOptions, ElementRef, InterruptionSnapshot, MotionInput,
    MotionTiming, Snapshot, SpriteTree, SpriteType, TweenBehavior, Value, generate_frames, merge,
    KeyframeProvider,
};

fn snapshot(left: f64, top: f64, opacity: &str) -> Snapshot {
    Snapshot::new(Bounds::new(left, top, 100.0, 40.0)).with_style("opacity", opacity)
}

#[test]
fn full_pass_produces_a_playable_timeline() {
    let mut tree = SpriteTree::new();

    // Pass 0: the host renders a list scope with two cards.
    tree.add_scope("list", &[]);
    tree.add_element("card-1", Some("card-1"), None, &["list"]);
    tree.add_element("card-2", Some("card-2"), None, &["list"]);
    tree.capture_scope_snapshot("list", snapshot(0.0, 0.0, "1"));
    tree.capture_element_snapshot("card-1", snapshot(0.0, 0.0, "1"));
    tree.capture_element_snapshot("card-2", snapshot(0.0, 50.0, "1"));
    tree.mark_initial_render_completed("list");

    // Pass 1 mutation: card-2 is deleted, card-1 slides up into its
    // place.
    tree.remove_element("card-2");
    tree.capture_scope_snapshot("list", snapshot(0.0, 0.0, "1"));
    tree.capture_element_snapshot("card-1", snapshot(0.0, 50.0, "0.5"));

    let builder = ChangesetBuilder::build(
        &mut tree,
        &["list".to_string()],
        &[],
        &[ElementRef::new("card-2", Some("card-2"), None)],
        &HashMap::<String, InterruptionSnapshot>::new(),
    );

    let changeset = builder.changeset_for("list").expect("stable scope");
    assert_eq!(changeset.kept_sprites.len(), 1);
    assert_eq!(changeset.removed_sprites.len(), 1);

    let kept = &changeset.kept_sprites[0];
    assert_eq!(kept.kind, SpriteType::Kept);
    let delta = kept.bounds_delta().expect("kept sprite has both boundaries");
    assert_eq!(delta.y, 50.0);

    // FLIP: start the element back at its old position and ease to rest.
    let translate = generate_frames(
        kept,
        "y",
        MotionInput::range(Value::from(-delta.y), Value::from(0.0)),
        &MotionTiming::new(Box::new(TweenBehavior::linear())).with_duration(100.0),
    )
    .expect("numeric motion");
    let fade = generate_frames(
        kept,
        "opacity",
        MotionInput::auto(),
        &MotionTiming::new(Box::new(TweenBehavior::linear())).with_duration(200.0),
    )
    .expect("opacity motion");

    let timeline = merge(&[
        KeyframeProvider::from_frames(&translate, 0.0),
        KeyframeProvider::from_frames(&fade, 0.0),
    ]);

    // The slower provider sets the overall duration.
    assert!((timeline.duration_ms - 200.0).abs() < 0.5);
    let first = timeline.keyframes.first().expect("non-empty timeline");
    let last = timeline.keyframes.last().expect("non-empty timeline");
    assert_eq!(first.offset, 0.0);
    assert_eq!(last.offset, 1.0);
    assert_eq!(
        first.properties.get("translateY").map(ToString::to_string),
        Some("-50".to_string())
    );
    assert_eq!(
        last.properties.get("translateY").map(ToString::to_string),
        Some("0".to_string())
    );
    assert_eq!(
        last.properties.get("opacity").map(ToString::to_string),
        Some("0.5".to_string())
    );
    for pair in timeline.keyframes.windows(2) {
        assert!(pair[0].offset < pair[1].offset);
    }

    // The removed card is still visible to far-matching until the
    // driving loop clears the pass.
    assert_eq!(tree.far_match_candidates_for("other-scope").len(), 1);
    tree.clear_freshly_removed();
    assert!(tree.far_match_candidates_for("other-scope").is_empty());
    assert!(
        tree.descendants_of(
            "list",
            &DescendantOptions {
                include_freshly_removed: true,
                ..Default::default()
            }
        )
        .len()
            == 1
    );
}

#[test]
fn far_match_across_scopes_shares_the_start_point() {
    let mut tree = SpriteTree::new();
    tree.add_scope("board", &[]);
    tree.add_scope("column-a", &["board"]);
    tree.add_scope("column-b", &["board"]);
    for scope in ["board", "column-a", "column-b"] {
        tree.capture_scope_snapshot(scope, snapshot(0.0, 0.0, "1"));
        tree.mark_initial_render_completed(scope);
    }
    tree.add_element("ticket-node-1", Some("ticket"), None, &["board", "column-a"]);
    tree.capture_element_snapshot("ticket-node-1", snapshot(10.0, 20.0, "1"));

    // The ticket moves from column A to column B on a brand-new node.
    tree.remove_element("ticket-node-1");
    tree.add_element("ticket-node-2", Some("ticket"), None, &["board", "column-b"]);
    for scope in ["board", "column-a", "column-b"] {
        tree.capture_scope_snapshot(scope, snapshot(0.0, 0.0, "1"));
    }
    tree.capture_element_snapshot("ticket-node-2", snapshot(300.0, 20.0, "1"));

    let builder = ChangesetBuilder::build(
        &mut tree,
        &[
            "board".to_string(),
            "column-a".to_string(),
            "column-b".to_string(),
        ],
        &[ElementRef::new("ticket-node-2", Some("ticket"), None)],
        &[ElementRef::new("ticket-node-1", Some("ticket"), None)],
        &HashMap::new(),
    );

    let column_b = builder.changeset_for("column-b").expect("stable scope");
    assert_eq!(column_b.kept_sprites.len(), 1);
    let kept = &column_b.kept_sprites[0];
    let counterpart = kept.counterpart.as_ref().expect("far-matched counterpart");

    assert_eq!(kept.initial_bounds, counterpart.initial_bounds);
    assert_eq!(kept.initial_bounds.unwrap().element.left, 10.0);
    assert_eq!(kept.final_bounds.unwrap().element.left, 300.0);

    // Neither of the other scopes claims the identity.
    assert!(!builder.changeset_for("column-a").unwrap().has_sprites());
    assert!(!builder.changeset_for("board").unwrap().has_sprites());

    tree.clear_freshly_removed();
}
