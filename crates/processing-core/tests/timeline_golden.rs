use std::path::PathBuf;

use proptest::prelude::*;
use voxreel_common::error::Notice;
use voxreel_processing_core::captions::resolve_overlaps;
use voxreel_processing_core::layout::layout;
use voxreel_processing_core::synthesis::{synthesize, Timeline};
use voxreel_project_model::caption::{captions_are_disjoint, CaptionEntry};
use voxreel_project_model::composition::{Clip, Cutaway, LoadedComposition};
use voxreel_project_model::segment::{check_coverage, FillerReason, SegmentSource};

fn load_fixture() -> LoadedComposition {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("demo-composition")
        .join("composition.json");
    LoadedComposition::load(path).expect("fixture composition should load")
}

fn synthesize_fixture() -> Timeline {
    let loaded = load_fixture();
    let target = loaded
        .composition
        .target_duration
        .expect("fixture has a target duration");
    synthesize(&loaded.composition.clips, target).expect("fixture should synthesize")
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn three_clip_fixture_segments_are_stable() {
    let timeline = synthesize_fixture();

    let signature = timeline
        .segments
        .iter()
        .map(|s| {
            format!(
                "{}|{:.3}|{:.3}|{:.4}|{:.3}",
                s.label(),
                s.output_start,
                s.output_end,
                s.speed_factor,
                s.trim_duration
            )
        })
        .collect::<Vec<_>>();

    assert_eq!(
        signature,
        vec![
            "clip1|0.000|4.000|1.0000|4.000",
            "filler-gap|4.000|5.000|1.0000|1.000",
            "clip2-remainder|5.000|6.000|1.0000|1.000",
            "clip2-cutaway0|6.000|6.600|0.8333|0.500",
            "clip2-remainder|6.600|8.100|1.0000|1.500",
            "clip3|8.100|10.000|0.6667|1.267",
        ]
    );
    check_coverage(&timeline.segments, 10.0).unwrap();
}

#[test]
fn three_clip_fixture_captions_use_original_windows() {
    let timeline = synthesize_fixture();
    let captions: Vec<(&str, f64, f64)> = timeline
        .captions
        .iter()
        .map(|c| (c.text.as_str(), c.start, c.end))
        .collect();
    assert_eq!(
        captions,
        vec![
            ("Hello world", 0.0, 4.0),
            ("Second clip", 5.0, 8.0),
            ("Done", 8.0, 10.0),
        ]
    );
}

#[test]
fn three_clip_fixture_reports_capped_cutaway() {
    let timeline = synthesize_fixture();
    assert_eq!(timeline.notices.len(), 1);
    match &timeline.notices[0] {
        Notice::SpeedFactorClamped {
            sequence,
            requested,
            applied,
        } => {
            assert_eq!(*sequence, 2);
            assert!(close(*requested, 0.5 / 3.0));
            assert!(close(*applied, 1.0 / 1.2));
        }
        other => panic!("unexpected notice: {other:?}"),
    }
}

#[test]
fn three_clip_fixture_media_paths_are_resolved() {
    let loaded = load_fixture();
    let timeline = synthesize(&loaded.composition.clips, 10.0).unwrap();
    let cutaway_media = timeline.segments[3].media().unwrap();
    assert_eq!(cutaway_media, loaded.root.join("media/insert.mp4"));
}

#[test]
fn three_clip_fixture_layout_has_one_box_per_caption() {
    let loaded = load_fixture();
    let timeline = synthesize_fixture();
    let draws = layout(&timeline.captions, &loaded.composition.frame, 48.0);

    let boxes = draws.iter().filter(|d| d.is_box()).count();
    assert_eq!(boxes, 3);
    assert_eq!(draws.len(), 6);
    for draw in &draws {
        assert!(draw.geometry.fits_within(&loaded.composition.frame));
    }
}

#[test]
fn missing_media_keeps_timeline_complete() {
    let clips = vec![
        Clip::new(1, 0.0, 4.0, "Hello world", None),
        Clip::new(2, 5.0, 8.0, "Second clip", Some(PathBuf::from("b.mp4")))
            .with_cutaway(Cutaway::new(6.0, 6.5, None)),
    ];
    let timeline = synthesize(&clips, 10.0).unwrap();
    check_coverage(&timeline.segments, 10.0).unwrap();

    let missing = timeline
        .segments
        .iter()
        .filter(|s| {
            s.source
                == SegmentSource::Filler {
                    reason: FillerReason::MissingMedia,
                }
        })
        .count();
    assert_eq!(missing, 2);
    assert_eq!(timeline.captions.len(), 2);
}

#[derive(Debug, Clone)]
struct ClipShape {
    gap: f64,
    duration: f64,
    cutaway: Option<(f64, f64)>,
    has_media: bool,
}

fn clip_shape() -> impl Strategy<Value = ClipShape> {
    (
        0.0f64..3.0,
        0.05f64..20.0,
        proptest::option::of((-0.2f64..1.2, 0.0f64..1.5)),
        any::<bool>(),
    )
        .prop_map(|(gap, duration, cutaway, has_media)| ClipShape {
            gap,
            duration,
            cutaway,
            has_media,
        })
}

fn build_clips(shapes: &[ClipShape]) -> Vec<Clip> {
    let mut clips = Vec::with_capacity(shapes.len());
    let mut at = 0.0;
    for (i, shape) in shapes.iter().enumerate() {
        let start = at + shape.gap;
        let end = start + shape.duration;
        let media = shape
            .has_media
            .then(|| PathBuf::from(format!("clip{i}.mp4")));
        let mut clip = Clip::new(i as u32 + 1, start, end, format!("caption {i}"), media);
        if let Some((offset, length)) = shape.cutaway {
            let cut_start = start + offset * shape.duration;
            let cut_end = cut_start + length * shape.duration;
            clip = clip.with_cutaway(Cutaway::new(
                cut_start,
                cut_end,
                Some(PathBuf::from(format!("cut{i}.mp4"))),
            ));
        }
        clips.push(clip);
        at = end;
    }
    // Sequence decides order, not input position.
    clips.reverse();
    clips
}

proptest! {
    #[test]
    fn segments_cover_target_exactly(
        shapes in prop::collection::vec(clip_shape(), 1..8),
        target in 0.5f64..120.0,
    ) {
        let clips = build_clips(&shapes);
        let timeline = synthesize(&clips, target).unwrap();

        prop_assert!(check_coverage(&timeline.segments, target).is_ok());
        let total: f64 = timeline.segments.iter().map(|s| s.output_duration()).sum();
        prop_assert!((total - target).abs() < 1e-6);
        for segment in &timeline.segments {
            prop_assert!(segment.speed_factor > 0.0);
            prop_assert!(segment.trim_duration >= 0.0);
        }
    }

    #[test]
    fn one_disjoint_caption_per_clip(
        shapes in prop::collection::vec(clip_shape(), 1..8),
        target in 0.5f64..120.0,
    ) {
        let clips = build_clips(&shapes);
        let timeline = synthesize(&clips, target).unwrap();
        prop_assert_eq!(timeline.captions.len(), clips.len());
        prop_assert!(captions_are_disjoint(&timeline.captions));
    }

    #[test]
    fn resolved_captions_never_overlap(
        raw in prop::collection::vec((0.0f64..30.0, 0.0f64..6.0), 0..20),
    ) {
        let entries: Vec<CaptionEntry> = raw
            .iter()
            .enumerate()
            .map(|(i, (start, len))| CaptionEntry::new(format!("c{i}"), *start, start + len))
            .collect();
        let resolved = resolve_overlaps(entries, 0.01);

        prop_assert!(captions_are_disjoint(&resolved));
        for entry in &resolved {
            prop_assert!(entry.end > entry.start);
        }
    }
}
