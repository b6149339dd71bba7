use crate::fixtures::{result_from, single_candidate_json, three_candidates_json};
use papyrlab_core::{Error, InputError};
use papyrlab_matching::{Displacement, PairAlignmentResult, ScoreSide};

fn parse(value: serde_json::Value) -> papyrlab_core::Result<PairAlignmentResult> {
    PairAlignmentResult::from_json_str(&value.to_string())
}

#[test]
fn test_valid_artifact() {
    let result = result_from(single_candidate_json());
    assert_eq!(result.fragment_a, "A");
    assert_eq!(result.label(), "A ↔ B");
    assert_eq!(result.displacement(3), Some(Displacement::new(10, -20)));
    assert_eq!(result.displacement(4), None);
    assert!(result.score_grid(ScoreSide::Recto).is_none());
    assert_eq!(result.samples(ScoreSide::Verso).len(), 1);
}

#[test]
fn test_combined_grid_is_sum_of_sides() {
    let result = result_from(three_candidates_json());
    let combined = result.score_grid(ScoreSide::Combined).unwrap();
    assert!((combined[[1, 0]] - 0.6).abs() < 1e-12);
    assert!((combined[[0, 2]] - 0.5).abs() < 1e-12);
    assert_eq!(result.samples(ScoreSide::Verso).len(), 2);
    assert_eq!(result.samples(ScoreSide::Recto).len(), 4);
}

#[test]
fn test_missing_required_fields() {
    for field in ["fragment_a", "translation_id_grid", "recto"] {
        let mut value = single_candidate_json();
        value.as_object_mut().unwrap().remove(field);
        match parse(value) {
            Err(Error::Input(InputError::MissingField { field: f })) => assert_eq!(f, field),
            other => panic!("expected missing {}, got {:?}", field, other),
        }
    }

    let mut value = single_candidate_json();
    value["recto"].as_object_mut().unwrap().remove("scores");
    match parse(value) {
        Err(Error::Input(InputError::MissingField { field })) => assert_eq!(field, "recto.scores"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_needs_some_score_grid() {
    let mut value = single_candidate_json();
    value.as_object_mut().unwrap().remove("score_grid");
    let err = parse(value).unwrap_err();
    assert!(err.to_string().contains("score_grid"));
}

#[test]
fn test_grid_shapes_must_agree() {
    let mut value = single_candidate_json();
    value["score_grid"] = serde_json::json!([[0.1, 0.2]]);
    assert!(matches!(
        parse(value),
        Err(Error::Input(InputError::ShapeMismatch { .. }))
    ));

    let mut value = single_candidate_json();
    value["translation_id_grid"] = serde_json::json!([[1, 2], [3]]);
    assert!(matches!(
        parse(value),
        Err(Error::Input(InputError::RaggedGrid { row: 1, .. }))
    ));
}

#[test]
fn test_sample_lengths_must_agree() {
    let mut value = single_candidate_json();
    value["recto"]["a_coords"] = serde_json::json!([[1.0, 1.0], [2.0, 2.0]]);
    match parse(value) {
        Err(Error::Input(InputError::LengthMismatch {
            field,
            expected,
            actual,
        })) => {
            assert_eq!(field, "recto.a_coords");
            assert_eq!((expected, actual), (1, 2));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_not_json() {
    let err = PairAlignmentResult::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, Error::Json(_)));
}

#[test]
fn test_empty_grid_is_valid_but_empty() {
    let mut value = single_candidate_json();
    value["score_grid"] = serde_json::json!([]);
    value["translation_id_grid"] = serde_json::json!([]);
    let result = parse(value).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_unnegatable_displacement_rejected() {
    let mut value = single_candidate_json();
    value["recto"]["relative_displacements"] = serde_json::json!([[i32::MIN, 0]]);
    match parse(value) {
        Err(Error::Input(InputError::Malformed { reason })) => {
            assert!(reason.contains("recto.relative_displacements[0]"));
        }
        other => panic!("expected a malformed artifact, got {:?}", other),
    }
}
