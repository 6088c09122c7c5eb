// Unit tests for naming and re-split rules

use super::*;

#[test]
fn test_parse_splits_on_final_underscore() {
    let key = SequenceResolver::parse("TVRI_SB_061119_0052").unwrap();
    assert_eq!(key.collection_key, "TVRI_SB_061119");
    assert_eq!(key.ordinal, 52);
}

#[test]
fn test_parse_strips_video_extension() {
    let key = SequenceResolver::parse("TVRI_SB_061119_0052.mp4").unwrap();
    assert_eq!(key.name(), "TVRI_SB_061119_0052");
    let key = SequenceResolver::parse("clip_0007.MOV").unwrap();
    assert_eq!(key.ordinal, 7);
}

#[test]
fn test_parse_rejects_malformed_identifiers() {
    for identifier in ["abcxyz", "_0001", "clip_", "clip_12a", "clip_-1", "clip_99999999999", "clip_0001.txt"] {
        let err = SequenceResolver::parse(identifier).unwrap_err();
        assert!(
            matches!(err, DomainError::MalformedIdentifier(_)),
            "{} should be malformed, got {:?}",
            identifier,
            err
        );
    }
}

#[test]
fn test_successor_and_predecessor_keep_fixed_width() {
    assert_eq!(
        SequenceResolver::successor("TVRI_SB_061119_0052").unwrap().as_deref(),
        Some("TVRI_SB_061119_0053")
    );
    assert_eq!(
        SequenceResolver::predecessor("TVRI_SB_061119_0052").unwrap().as_deref(),
        Some("TVRI_SB_061119_0051")
    );
    assert_eq!(
        SequenceResolver::successor("A_0099").unwrap().as_deref(),
        Some("A_0100")
    );
    assert_eq!(
        SequenceResolver::successor("A_9999").unwrap().as_deref(),
        Some("A_10000")
    );
}

#[test]
fn test_successor_of_formatted_ordinals_for_many_values() {
    for ordinal in [1u32, 2, 9, 10, 99, 999, 1000, 4321] {
        let identifier = format!("KEY_X_{:04}", ordinal);
        assert_eq!(
            SequenceResolver::successor(&identifier).unwrap(),
            Some(format!("KEY_X_{:04}", ordinal + 1))
        );
        if ordinal > MIN_ORDINAL {
            assert_eq!(
                SequenceResolver::predecessor(&identifier).unwrap(),
                Some(format!("KEY_X_{:04}", ordinal - 1))
            );
        }
    }
}

#[test]
fn test_predecessor_of_first_ordinal_is_none() {
    assert_eq!(SequenceResolver::predecessor("A_0001").unwrap(), None);
}

#[test]
fn test_neighbours_of_malformed_identifier_fail() {
    assert!(SequenceResolver::successor("abcxyz").is_err());
    assert!(SequenceResolver::predecessor("abcxyz").is_err());
}

#[test]
fn test_is_video_file() {
    assert!(is_video_file("A_0001.mp4"));
    assert!(is_video_file("A_0001.MKV"));
    assert!(!is_video_file("notes.txt"));
    assert!(!is_video_file("README"));
}

fn stitched(boundary: f64) -> CutSource {
    CutSource::Stitched {
        preview: "stitched/A_0001_x.mp4".to_string(),
        boundary: Some(boundary),
    }
}

#[test]
fn test_remainder_pushed_from_stitched_source() {
    let kept = CutRange::new(TimeSpec::from_seconds(3.0), TimeSpec::from_seconds(12.0)).unwrap();
    let remainder = remainder_range(&stitched(10.0), &kept, 18.0).unwrap();
    assert_eq!(remainder.start.seconds, 12.0);
    assert_eq!(remainder.end.seconds, 18.0);
}

#[test]
fn test_no_remainder_from_raw_source() {
    let kept = CutRange::new(TimeSpec::from_seconds(1.0), TimeSpec::from_seconds(4.0)).unwrap();
    let source = CutSource::Raw("raw/A_0001.mp4".to_string());
    assert!(remainder_range(&source, &kept, 10.0).is_none());
}

#[test]
fn test_no_remainder_when_cut_ends_on_boundary() {
    let kept = CutRange::new(TimeSpec::from_seconds(0.0), TimeSpec::from_seconds(10.0)).unwrap();
    assert!(remainder_range(&stitched(10.0), &kept, 18.0).is_none());
}

#[test]
fn test_clamped_cut_pushes_epsilon_tail() {
    let kept = CutRange::clamp_to(2.0, 40.0, 18.0, 0.05).unwrap();
    let remainder = remainder_range(&stitched(10.0), &kept, 18.0).unwrap();
    assert_eq!(remainder.start.seconds, kept.end.seconds);
    assert_eq!(remainder.end.seconds, 18.0);
}

#[test]
fn test_no_remainder_when_cut_ends_at_source_end() {
    let kept = CutRange::new(TimeSpec::from_seconds(2.0), TimeSpec::from_seconds(18.0)).unwrap();
    assert!(remainder_range(&stitched(10.0), &kept, 18.0).is_none());
}
