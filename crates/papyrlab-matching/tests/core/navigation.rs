use crate::fixtures::{
    pair_registry, result_from, scenario_registry, single_candidate_json, three_candidates_json,
};
use papyrlab_core::{BoundingBox, FragmentId};
use papyrlab_layout::FragmentRegistry;
use papyrlab_matching::{
    AlignmentSession, Displacement, NavOutcome, NavPhase, ScoreSide, ScoreTier, TierThresholds,
};
use proptest::prelude::*;

const PA: FragmentId = FragmentId(0);
const PB: FragmentId = FragmentId(1);

fn bbox(registry: &FragmentRegistry, id: FragmentId) -> BoundingBox {
    registry.fragment(id).unwrap().bbox
}

fn three_candidate_session() -> (AlignmentSession, FragmentRegistry) {
    let registry = pair_registry();
    let mut session = AlignmentSession::default();
    let index = session
        .add_pair(result_from(three_candidates_json()), &registry)
        .unwrap();
    assert_eq!(index, Some(0));
    (session, registry)
}

fn moved_to(outcome: NavOutcome) -> (i32, i32) {
    match outcome {
        NavOutcome::Moved(candidate) => candidate.position,
        other => panic!("expected a move, got {:?}", other),
    }
}

#[test]
fn test_single_candidate_scenario() {
    let mut registry = scenario_registry();
    let mut session = AlignmentSession::default();
    session
        .add_pair(result_from(single_candidate_json()), &registry)
        .unwrap();

    assert!(matches!(session.select_pair(0, &mut registry), NavOutcome::Moved(_)));
    let outcome = session.step(0, 0, &mut registry);

    // Moved top-left = anchor top-left (0, 0) + (dy, dx) = (10, -20)
    assert_eq!(moved_to(outcome), (-20, 10));
    let b = bbox(&registry, FragmentId(1));
    assert_eq!((b.top, b.left), (10, -20));
    assert_eq!(bbox(&registry, FragmentId(0)), BoundingBox::new(0, 0, 100, 100));
    assert_eq!(session.phase(), NavPhase::Previewing);
    assert_eq!(session.active(), Some(0));

    assert_eq!(session.step(0, 1, &mut registry), NavOutcome::BoundaryReached);
    assert_eq!(session.step(0, -1, &mut registry), NavOutcome::BoundaryReached);
}

#[test]
fn test_names_resolve_with_recto_suffix() {
    let (session, _) = three_candidate_session();
    assert_eq!(session.fragments(0), Some((PA, PB)));

    let registry = scenario_registry();
    let mut session = AlignmentSession::default();
    let added = session
        .add_pair(result_from(three_candidates_json()), &registry)
        .unwrap();
    assert_eq!(added, None);
    assert!(session.is_empty());
}

#[test]
fn test_stepping_through_ranks() {
    let (mut session, mut registry) = three_candidate_session();

    assert_eq!(moved_to(session.select_pair(0, &mut registry)), (100, 0));
    assert_eq!(moved_to(session.step(0, 1, &mut registry)), (110, -10));
    assert_eq!(moved_to(session.step(0, 1, &mut registry)), (0, 50));
    assert_eq!(session.step(0, 1, &mut registry), NavOutcome::BoundaryReached);
    assert_eq!(session.state(0).unwrap().current_rank, 2);
    assert_eq!(bbox(&registry, PB).top_left(), (0, 50));

    assert_eq!(moved_to(session.step(0, -2, &mut registry)), (100, 0));
    assert_eq!(session.step(0, -1, &mut registry), NavOutcome::BoundaryReached);
    // The anchor never moves
    assert_eq!(bbox(&registry, PA), BoundingBox::new(0, 0, 100, 100));
}

#[test]
fn test_candidate_details_and_annotations() {
    let (mut session, mut registry) = three_candidate_session();
    session.select_pair(0, &mut registry);

    let candidate = session.current_candidate(0, &registry).unwrap();
    assert_eq!(candidate.rank, 0);
    assert_eq!(candidate.total, 3);
    assert_eq!(candidate.translation_id, 1);
    assert_eq!(candidate.anchor, PA);
    assert_eq!(candidate.moved, PB);

    let points = session.annotations();
    assert_eq!(points.len(), 2);
    assert_eq!((points[0].x, points[0].y), (20.0, 10.0));
    assert_eq!(points[0].tier, ScoreTier::High);
    assert_eq!((points[1].x, points[1].y), (40.0, 30.0));
    assert_eq!(points[1].tier, ScoreTier::Medium);
}

#[test]
fn test_flip_negates_displacement() {
    let (mut session, mut registry) = three_candidate_session();
    session.select_pair(0, &mut registry);
    session.step(0, 1, &mut registry);
    let plain = session.current_candidate(0, &registry).unwrap();

    let outcome = session.set_flip(0, true, &mut registry);
    let flipped = session.current_candidate(0, &registry).unwrap();

    assert!(matches!(outcome, NavOutcome::Moved(_)));
    assert_eq!(flipped.rank, plain.rank);
    assert_eq!(flipped.displacement, -plain.displacement);
    assert_eq!(flipped.anchor, PB);
    assert_eq!(flipped.moved, PA);

    // pb is back on its baseline and pa moves relative to it
    assert_eq!(bbox(&registry, PB).top_left(), (300, 0));
    assert_eq!(bbox(&registry, PA).top_left(), (300 - 110, 10));
}

#[test]
fn test_flipped_annotations_use_b_coordinates() {
    let (mut session, mut registry) = three_candidate_session();
    session.select_pair(0, &mut registry);
    session.set_flip(0, true, &mut registry);

    let points = session.annotations();
    assert_eq!(points.len(), 2);
    assert_eq!((points[0].x, points[0].y), (220.0, 10.0));
    assert_eq!((points[1].x, points[1].y), (240.0, 30.0));
}

#[test]
fn test_set_side_restarts_at_best_rank() {
    let (mut session, mut registry) = three_candidate_session();
    session.select_pair(0, &mut registry);
    session.step(0, 1, &mut registry);
    session.set_flip(0, true, &mut registry);
    session.set_solo(0, true, &registry);

    let outcome = session.set_side(0, ScoreSide::Recto, &mut registry);
    let state = *session.state(0).unwrap();
    assert_eq!(state.side, ScoreSide::Recto);
    assert_eq!(state.current_rank, 0);
    assert!(!state.flip);
    assert!(state.solo);
    assert_eq!(moved_to(outcome), (100, 0));

    // Recto ranking is 1, 2, 3
    assert_eq!(moved_to(session.step(0, 1, &mut registry)), (0, 50));
}

#[test]
fn test_verso_reuses_recto_translation_ids() {
    let (mut session, mut registry) = three_candidate_session();
    session.set_side(0, ScoreSide::Verso, &mut registry);
    let outcome = session.step(0, 1, &mut registry);

    // Verso ranking is 1, 3, 2 over the recto-derived id grid, and id 3
    // takes its displacement from the recto table.
    let candidate = session.current_candidate(0, &registry).unwrap();
    assert_eq!(candidate.translation_id, 3);
    assert_eq!(candidate.displacement, Displacement::new(-10, 110));
    assert_eq!(moved_to(outcome), (110, -10));

    // Annotation samples come from the verso set
    let points = session.annotations();
    assert_eq!(points.len(), 1);
    assert_eq!((points[0].x, points[0].y, points[0].score), (8.0, 8.0, 0.3));
    assert_eq!(points[0].tier, ScoreTier::Low);
}

#[test]
fn test_apply_then_reset_keeps_applied_position() {
    let (mut session, mut registry) = three_candidate_session();
    session.select_pair(0, &mut registry);
    session.step(0, 1, &mut registry);

    assert!(session.state(0).unwrap().apply_enabled);
    assert!(session.apply(0, &registry));
    assert!(!session.apply(0, &registry));
    assert_eq!(session.phase(), NavPhase::Applied);

    session.step(0, 1, &mut registry);
    assert_eq!(bbox(&registry, PB).top_left(), (0, 50));

    session.reset_all(&mut registry);
    assert_eq!(bbox(&registry, PB).top_left(), (110, -10));
    assert_eq!(bbox(&registry, PA).top_left(), (0, 0));
    assert_eq!(session.phase(), NavPhase::Idle);
    assert_eq!(session.active(), None);
    assert!(session.annotations().is_empty());
    // Ranks survive a reset
    assert_eq!(session.state(0).unwrap().current_rank, 2);
}

#[test]
fn test_apply_without_preview_is_noop() {
    let (mut session, registry) = three_candidate_session();
    assert!(!session.apply(0, &registry));
    assert!(!session.apply(7, &registry));
    assert_eq!(session.phase(), NavPhase::Idle);
}

#[test]
fn test_reset_clears_solo_and_flip() {
    let (mut session, mut registry) = three_candidate_session();
    session.select_pair(0, &mut registry);
    session.set_flip(0, true, &mut registry);
    session.set_solo(0, true, &registry);
    assert!(session.is_hidden(FragmentId(2)));

    session.reset_all(&mut registry);
    let state = session.state(0).unwrap();
    assert!(!state.flip);
    assert!(!state.solo);
    assert!(session.hidden().is_empty());
    assert_eq!(bbox(&registry, PA).top_left(), (0, 0));
    assert_eq!(bbox(&registry, PB).top_left(), (300, 0));
}

#[test]
fn test_solo_is_exclusive() {
    let mut registry = pair_registry();
    let mut session = AlignmentSession::default();
    session
        .add_pair(result_from(three_candidates_json()), &registry)
        .unwrap();
    let mut second = single_candidate_json();
    second["fragment_a"] = serde_json::json!("pb");
    second["fragment_b"] = serde_json::json!("pc");
    session.add_pair(result_from(second), &registry).unwrap();

    assert!(session.set_solo(0, true, &registry));
    assert_eq!(session.solo_pair(), Some(0));
    assert_eq!(session.hidden().iter().copied().collect::<Vec<_>>(), vec![FragmentId(2)]);

    assert!(session.set_solo(1, true, &registry));
    assert_eq!(session.solo_pair(), Some(1));
    assert!(!session.state(0).unwrap().solo);
    assert_eq!(session.hidden().iter().copied().collect::<Vec<_>>(), vec![PA]);

    assert!(session.set_solo(1, false, &registry));
    assert_eq!(session.solo_pair(), None);
    assert!(session.hidden().is_empty());
    assert!(!session.set_solo(9, true, &registry));

    // Solo never moves anything
    assert_eq!(bbox(&registry, PB).top_left(), (300, 0));
    session.select_pair(1, &mut registry);
    assert_eq!(bbox(&registry, FragmentId(2)).top_left(), (280, 10));
}

#[test]
fn test_disabling_solo_on_other_pair_keeps_solo() {
    let registry = pair_registry();
    let mut session = AlignmentSession::default();
    session
        .add_pair(result_from(three_candidates_json()), &registry)
        .unwrap();
    let mut second = single_candidate_json();
    second["fragment_a"] = serde_json::json!("pb");
    second["fragment_b"] = serde_json::json!("pc");
    session.add_pair(result_from(second), &registry).unwrap();

    session.set_solo(0, true, &registry);
    assert!(session.set_solo(1, false, &registry));

    assert_eq!(session.solo_pair(), Some(0));
    assert!(session.is_hidden(FragmentId(2)));
    assert!(!session.is_hidden(PA));
}

#[test]
fn test_displacement_overflow_aborts() {
    let mut registry = pair_registry();
    let mut session = AlignmentSession::default();
    let mut far = single_candidate_json();
    far["fragment_a"] = serde_json::json!("pb");
    far["fragment_b"] = serde_json::json!("pc");
    far["recto"]["relative_displacements"] = serde_json::json!([[0, i32::MAX]]);
    session.add_pair(result_from(far), &registry).unwrap();

    // pb sits at left 300, so left + dx overflows
    assert_eq!(session.select_pair(0, &mut registry), NavOutcome::Aborted);
    assert_eq!(bbox(&registry, FragmentId(2)).top_left(), (500, 500));
    assert_eq!(session.active(), None);
}

#[test]
fn test_empty_pair_is_noop() {
    let mut registry = scenario_registry();
    let mut session = AlignmentSession::default();
    let mut empty = single_candidate_json();
    empty["score_grid"] = serde_json::json!([]);
    empty["translation_id_grid"] = serde_json::json!([]);
    session.add_pair(result_from(empty), &registry).unwrap();

    let before: Vec<BoundingBox> = registry.fragments().map(|f| f.bbox).collect();
    assert_eq!(session.select_pair(0, &mut registry), NavOutcome::NoCandidates);
    assert_eq!(session.step(0, 1, &mut registry), NavOutcome::NoCandidates);
    assert_eq!(session.step(0, 0, &mut registry), NavOutcome::NoCandidates);
    let after: Vec<BoundingBox> = registry.fragments().map(|f| f.bbox).collect();

    assert_eq!(before, after);
    assert_eq!(session.active(), None);
    assert!(session.current_candidate(0, &registry).is_none());
}

#[test]
fn test_deleted_fragment_aborts_quietly() {
    let (mut session, mut registry) = three_candidate_session();
    session.select_pair(0, &mut registry);
    registry.remove_fragment(PB);
    session.forget_fragment(PB);

    assert_eq!(session.step(0, 1, &mut registry), NavOutcome::Aborted);
    assert_eq!(session.set_flip(0, true, &mut registry), NavOutcome::Aborted);
    assert!(!session.state(0).unwrap().flip);
    assert_eq!(session.state(0).unwrap().current_rank, 0);
    assert_eq!(bbox(&registry, PA).top_left(), (0, 0));
    assert!(!session.apply(0, &registry));

    session.reset_all(&mut registry);
    assert_eq!(bbox(&registry, PA).top_left(), (0, 0));
}

#[test]
fn test_unknown_pair_aborts() {
    let (mut session, mut registry) = three_candidate_session();
    assert_eq!(session.select_pair(5, &mut registry), NavOutcome::Aborted);
    assert_eq!(session.step(5, 1, &mut registry), NavOutcome::Aborted);
}

#[test]
fn test_custom_thresholds() {
    let (mut session, mut registry) = three_candidate_session();
    session.set_thresholds(TierThresholds::new(0.99, 0.9));
    session.select_pair(0, &mut registry);
    let tiers: Vec<ScoreTier> = session.annotations().iter().map(|p| p.tier).collect();
    assert_eq!(tiers, vec![ScoreTier::Medium, ScoreTier::Low]);
}

#[derive(Debug, Clone)]
enum Action {
    Select,
    Step(i32),
    Flip(bool),
    Side(u8),
    Apply,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::Select),
        (-2i32..=2).prop_map(Action::Step),
        any::<bool>().prop_map(Action::Flip),
        (0u8..3).prop_map(Action::Side),
        Just(Action::Apply),
    ]
}

fn side(n: u8) -> ScoreSide {
    match n {
        0 => ScoreSide::Combined,
        1 => ScoreSide::Recto,
        _ => ScoreSide::Verso,
    }
}

proptest! {
    #[test]
    fn prop_rank_stays_in_bounds(steps in prop::collection::vec(prop_oneof![Just(1i32), Just(-1i32)], 1..30)) {
        let (mut session, mut registry) = three_candidate_session();
        session.select_pair(0, &mut registry);
        for direction in steps {
            session.step(0, direction, &mut registry);
            let rank = session.state(0).unwrap().current_rank;
            prop_assert!(rank <= 2);
        }
    }

    #[test]
    fn prop_reset_restores_last_committed_positions(actions in prop::collection::vec(arb_action(), 1..25)) {
        let (mut session, mut registry) = three_candidate_session();
        let mut committed: Vec<BoundingBox> = registry.fragments().map(|f| f.bbox).collect();

        for action in actions {
            match action {
                Action::Select => {
                    session.select_pair(0, &mut registry);
                }
                Action::Step(d) => {
                    session.step(0, d, &mut registry);
                }
                Action::Flip(f) => {
                    session.set_flip(0, f, &mut registry);
                }
                Action::Side(s) => {
                    session.set_side(0, side(s), &mut registry);
                }
                Action::Apply => {
                    if session.apply(0, &registry) {
                        committed = registry.fragments().map(|f| f.bbox).collect();
                    }
                }
            }
        }

        session.reset_all(&mut registry);
        let restored: Vec<BoundingBox> = registry.fragments().map(|f| f.bbox).collect();
        prop_assert_eq!(restored, committed);
    }
}
