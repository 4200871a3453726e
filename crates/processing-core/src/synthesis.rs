//! Timeline synthesis: clips and cutaways to a gapless segment list.
//!
//! # Algorithm
//!
//! 1. **Order** clips by `sequence`; the first clip's start is pinned to 0.
//! 2. **Walk** clips with a running output cursor. Gaps between the cursor
//!    and a clip's start become filler.
//! 3. **Place** each clip: a plain clip becomes one segment, stretched to
//!    the minimum duration when short; a clip with cutaways is split into
//!    remainder and cutaway segments.
//! 4. **Reconcile** against the target duration: pad with filler, or cut
//!    the segment that straddles the target.
//! 5. **Caption** every clip once over its original window, then resolve
//!    caption overlaps.
//!
//! Missing media never aborts a run; the affected segment becomes filler
//! of the same duration and a notice is recorded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use voxreel_common::config::TimelineSettings;
use voxreel_common::error::{Notice, VoxreelError};
use voxreel_project_model::caption::CaptionEntry;
use voxreel_project_model::composition::Clip;
use voxreel_project_model::segment::{FillerReason, Segment, SegmentSource, TIME_EPSILON};

use crate::captions::resolve_overlaps;

/// Errors that abort synthesis.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("no clips found")]
    NoClipsFound,

    #[error("duplicate clip sequence {sequence}")]
    DuplicateSequence { sequence: u32 },

    #[error("clip {sequence} has an invalid window ({start}..{end})")]
    InvalidClipWindow { sequence: u32, start: f64, end: f64 },

    #[error("target duration must be positive and finite, got {value}")]
    InvalidTargetDuration { value: f64 },
}

impl From<SynthesisError> for VoxreelError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::NoClipsFound => VoxreelError::NoClipsFound,
            other => VoxreelError::timeline(other.to_string()),
        }
    }
}

/// Output of a synthesis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// Contiguous segments spanning `[0, target_duration)`.
    pub segments: Vec<Segment>,
    /// One caption per clip, overlap-free.
    pub captions: Vec<CaptionEntry>,
    /// Non-fatal conditions encountered along the way.
    pub notices: Vec<Notice>,
}

impl Timeline {
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.output_end).unwrap_or(0.0)
    }

    pub fn filler_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_filler()).count()
    }
}

/// The timeline synthesis engine.
pub struct TimelineSynthesizer {
    settings: TimelineSettings,
}

impl TimelineSynthesizer {
    /// Create a synthesizer with the given thresholds.
    pub fn new(settings: TimelineSettings) -> Self {
        Self { settings }
    }

    /// Create a synthesizer with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(TimelineSettings::default())
    }

    pub fn settings(&self) -> &TimelineSettings {
        &self.settings
    }

    /// Synthesize a timeline, treating every referenced media path as available.
    pub fn synthesize(
        &self,
        clips: &[Clip],
        target_duration: f64,
    ) -> Result<Timeline, SynthesisError> {
        self.synthesize_with(clips, target_duration, |_| true)
    }

    /// Synthesize a timeline; `media_available` decides whether a referenced
    /// media path can be used or must degrade to filler.
    pub fn synthesize_with<F>(
        &self,
        clips: &[Clip],
        target_duration: f64,
        media_available: F,
    ) -> Result<Timeline, SynthesisError>
    where
        F: Fn(&Path) -> bool,
    {
        if !target_duration.is_finite() || target_duration <= 0.0 {
            return Err(SynthesisError::InvalidTargetDuration {
                value: target_duration,
            });
        }

        let ordered = order_clips(clips)?;

        let mut builder = SegmentBuilder {
            segments: Vec::new(),
            notices: Vec::new(),
            cursor: 0.0,
            media_available: &media_available,
        };
        let mut captions = Vec::with_capacity(ordered.len());

        for (position, clip) in ordered.iter().enumerate() {
            let start = if position == 0 { 0.0 } else { clip.start };

            if start > builder.cursor + TIME_EPSILON {
                builder.push_filler(start, FillerReason::Gap);
            }

            if clip.cutaways.is_empty() {
                self.place_plain_clip(&mut builder, clip, start);
            } else {
                self.place_clip_with_cutaways(&mut builder, clip, start);
            }

            captions.push(CaptionEntry::new(clip.text.clone(), start, clip.end));
        }

        let mut segments = builder.segments;
        let notices = builder.notices;
        reconcile_target(&mut segments, builder.cursor, target_duration);

        let captions = resolve_overlaps(captions, self.settings.caption_epsilon_secs);

        tracing::info!(
            clips = ordered.len(),
            segments = segments.len(),
            captions = captions.len(),
            target_duration,
            notices = notices.len(),
            "Timeline synthesized"
        );

        Ok(Timeline {
            segments,
            captions,
            notices,
        })
    }

    /// One segment for the whole clip, stretched to the minimum duration.
    fn place_plain_clip<F>(&self, builder: &mut SegmentBuilder<'_, F>, clip: &Clip, start: f64)
    where
        F: Fn(&Path) -> bool,
    {
        let original = clip.end - start;
        let min = self.settings.min_clip_duration_secs;
        let (speed_factor, duration) = if original < min {
            (original / min, min)
        } else {
            (1.0, original)
        };

        if speed_factor < 1.0 {
            tracing::debug!(
                sequence = clip.sequence,
                original,
                speed_factor,
                "Stretching short clip to minimum duration"
            );
        }

        builder.push_media(
            clip.sequence,
            clip.source_media.as_deref(),
            |media| SegmentSource::Clip {
                sequence: clip.sequence,
                media,
            },
            start,
            original,
            speed_factor,
            duration,
        );
    }

    /// Remainder and cutaway segments covering the clip window.
    fn place_clip_with_cutaways<F>(
        &self,
        builder: &mut SegmentBuilder<'_, F>,
        clip: &Clip,
        start: f64,
    ) where
        F: Fn(&Path) -> bool,
    {
        let end = clip.end;
        let mut cutaways: Vec<(usize, f64, f64)> = clip
            .cutaways
            .iter()
            .enumerate()
            .map(|(index, c)| (index, c.start.clamp(start, end), c.end.clamp(start, end)))
            .collect();
        cutaways.sort_by(|a, b| a.1.total_cmp(&b.1));

        // A clip whose cutaways all clamp away is a plain clip again.
        if cutaways
            .iter()
            .all(|(_, cut_start, cut_end)| cut_end - cut_start <= TIME_EPSILON)
        {
            for (index, _, _) in cutaways {
                skip_cutaway(builder, clip.sequence, index);
            }
            self.place_plain_clip(builder, clip, start);
            return;
        }

        let mut position = start;
        for (index, cut_start, cut_end) in cutaways {
            // Overlapping cutaways start where the previous one ended.
            let cut_start = cut_start.max(position);
            if cut_end - cut_start <= TIME_EPSILON {
                skip_cutaway(builder, clip.sequence, index);
                continue;
            }

            if cut_start > position + TIME_EPSILON {
                self.place_remainder(builder, clip, position, cut_start);
            }

            let window = cut_end - cut_start;
            let timing = self.cutaway_timing(window);
            if let Some(requested) = timing.requested_speed {
                tracing::info!(
                    sequence = clip.sequence,
                    index,
                    requested,
                    applied = timing.speed_factor,
                    "Cutaway slowdown capped"
                );
                builder.notices.push(Notice::SpeedFactorClamped {
                    sequence: clip.sequence,
                    requested,
                    applied: timing.speed_factor,
                });
            }

            builder.push_media(
                clip.sequence,
                clip.cutaways[index].source_media.as_deref(),
                |media| SegmentSource::Cutaway {
                    sequence: clip.sequence,
                    index,
                    media,
                },
                0.0,
                window,
                timing.speed_factor,
                timing.duration,
            );

            position = cut_end;
        }

        if end > position + TIME_EPSILON {
            self.place_remainder(builder, clip, position, end);
        }
    }

    fn place_remainder<F>(
        &self,
        builder: &mut SegmentBuilder<'_, F>,
        clip: &Clip,
        from: f64,
        to: f64,
    ) where
        F: Fn(&Path) -> bool,
    {
        builder.push_media(
            clip.sequence,
            clip.source_media.as_deref(),
            |media| SegmentSource::ClipRemainder {
                sequence: clip.sequence,
                media,
            },
            from,
            to - from,
            1.0,
            to - from,
        );
    }

    /// Speed and output duration for a cutaway window.
    ///
    /// Short windows are slowed toward the minimum duration, but never by
    /// more than `max_cutaway_slowdown` so captions stay in sync. Long
    /// windows are sped up to fit the maximum duration.
    pub fn cutaway_timing(&self, window: f64) -> CutawayTiming {
        let min = self.settings.min_clip_duration_secs;
        let max = self.settings.max_clip_duration_secs;
        let cap = self.settings.max_cutaway_slowdown.max(1.0);

        if window < min {
            let requested_slowdown = min / window;
            let slowdown = requested_slowdown.min(cap);
            CutawayTiming {
                speed_factor: 1.0 / slowdown,
                duration: window * slowdown,
                requested_speed: (requested_slowdown > cap).then(|| window / min),
            }
        } else if window > max {
            CutawayTiming {
                speed_factor: window / max,
                duration: max,
                requested_speed: None,
            }
        } else {
            CutawayTiming {
                speed_factor: 1.0,
                duration: window,
                requested_speed: None,
            }
        }
    }
}

/// Speed adjustment chosen for one cutaway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutawayTiming {
    pub speed_factor: f64,
    pub duration: f64,
    /// The uncapped speed factor, when the slowdown cap applied.
    pub requested_speed: Option<f64>,
}

fn skip_cutaway<F>(builder: &mut SegmentBuilder<'_, F>, sequence: u32, index: usize) {
    tracing::warn!(sequence, index, "Cutaway window empty after clamping; skipping");
    builder
        .notices
        .push(Notice::CutawaySkipped { sequence, index });
}

/// Synthesize with default thresholds.
pub fn synthesize(clips: &[Clip], target_duration: f64) -> Result<Timeline, SynthesisError> {
    TimelineSynthesizer::with_defaults().synthesize(clips, target_duration)
}

fn order_clips(clips: &[Clip]) -> Result<Vec<&Clip>, SynthesisError> {
    if clips.is_empty() {
        return Err(SynthesisError::NoClipsFound);
    }

    let mut ordered: Vec<&Clip> = clips.iter().collect();
    ordered.sort_by_key(|clip| clip.sequence);

    if let Some(pair) = ordered
        .windows(2)
        .find(|pair| pair[0].sequence == pair[1].sequence)
    {
        return Err(SynthesisError::DuplicateSequence {
            sequence: pair[0].sequence,
        });
    }

    for (position, clip) in ordered.iter().enumerate() {
        let start = if position == 0 { 0.0 } else { clip.start };
        if !start.is_finite() || !clip.end.is_finite() || clip.end <= start {
            return Err(SynthesisError::InvalidClipWindow {
                sequence: clip.sequence,
                start: clip.start,
                end: clip.end,
            });
        }
    }

    if ordered[0].start.abs() > TIME_EPSILON {
        tracing::debug!(
            sequence = ordered[0].sequence,
            start = ordered[0].start,
            "Pinning first clip start to 0"
        );
    }

    Ok(ordered)
}

/// Pad with filler up to the target, or cut the segment that crosses it.
fn reconcile_target(segments: &mut Vec<Segment>, cursor: f64, target: f64) {
    if cursor < target - TIME_EPSILON {
        segments.push(Segment::filler(cursor, target, FillerReason::TrailingPad));
        return;
    }

    if cursor > target + TIME_EPSILON {
        tracing::debug!(
            overrun = cursor - target,
            "Timeline overruns target duration; truncating tail"
        );
        while segments.len() > 1
            && segments
                .last()
                .is_some_and(|last| last.output_start >= target - TIME_EPSILON)
        {
            if let Some(dropped) = segments.pop() {
                tracing::warn!(
                    segment = %dropped.label(),
                    output_start = dropped.output_start,
                    "Dropping segment that starts past the target duration"
                );
            }
        }
    }

    if let Some(last) = segments.last_mut() {
        if last.output_end > target {
            last.truncate_output_end(target);
        } else {
            last.output_end = target;
        }
    }
}

struct SegmentBuilder<'a, F> {
    segments: Vec<Segment>,
    notices: Vec<Notice>,
    cursor: f64,
    media_available: &'a F,
}

impl<F> SegmentBuilder<'_, F>
where
    F: Fn(&Path) -> bool,
{
    fn push_filler(&mut self, end: f64, reason: FillerReason) {
        let segment = Segment::filler(self.cursor, end, reason);
        self.cursor = segment.output_end;
        self.segments.push(segment);
    }

    /// Push a media segment, or same-length filler when the media is unavailable.
    #[allow(clippy::too_many_arguments)]
    fn push_media(
        &mut self,
        sequence: u32,
        media: Option<&Path>,
        source: impl FnOnce(PathBuf) -> SegmentSource,
        trim_start: f64,
        trim_duration: f64,
        speed_factor: f64,
        duration: f64,
    ) {
        let output_start = self.cursor;
        let output_end = output_start + duration;

        let usable = media.filter(|path| (self.media_available)(path));
        let segment = match usable {
            Some(path) => Segment {
                source: source(path.to_path_buf()),
                trim_start,
                trim_duration,
                speed_factor,
                output_start,
                output_end,
            },
            None => {
                tracing::warn!(
                    sequence,
                    media = ?media,
                    output_start,
                    duration,
                    "Media unavailable; substituting filler"
                );
                self.notices.push(Notice::MissingMedia {
                    sequence,
                    media: media.map(Path::to_path_buf),
                    output_start,
                    duration,
                });
                Segment::filler(output_start, output_end, FillerReason::MissingMedia)
            }
        };

        self.cursor = output_end;
        self.segments.push(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxreel_project_model::composition::Cutaway;
    use voxreel_project_model::segment::check_coverage;

    fn media(name: &str) -> Option<PathBuf> {
        Some(PathBuf::from(format!("/media/{name}.mp4")))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_clip_list_is_an_error() {
        assert_eq!(synthesize(&[], 10.0).unwrap_err(), SynthesisError::NoClipsFound);
    }

    #[test]
    fn test_no_clips_maps_to_top_level_error() {
        let err: VoxreelError = SynthesisError::NoClipsFound.into();
        assert!(matches!(err, VoxreelError::NoClipsFound));
    }

    #[test]
    fn test_duplicate_sequence_rejected() {
        let clips = vec![
            Clip::new(1, 0.0, 4.0, "a", media("a")),
            Clip::new(1, 4.0, 8.0, "b", media("b")),
        ];
        assert_eq!(
            synthesize(&clips, 8.0).unwrap_err(),
            SynthesisError::DuplicateSequence { sequence: 1 }
        );
    }

    #[test]
    fn test_inverted_window_rejected() {
        let clips = vec![
            Clip::new(1, 0.0, 4.0, "a", media("a")),
            Clip::new(2, 6.0, 5.0, "b", media("b")),
        ];
        assert!(matches!(
            synthesize(&clips, 8.0).unwrap_err(),
            SynthesisError::InvalidClipWindow { sequence: 2, .. }
        ));
    }

    #[test]
    fn test_clips_are_ordered_by_sequence_not_input_order() {
        let clips = vec![
            Clip::new(2, 4.0, 8.0, "second", media("b")),
            Clip::new(1, 0.0, 4.0, "first", media("a")),
        ];
        let timeline = synthesize(&clips, 8.0).unwrap();
        assert_eq!(timeline.segments[0].sequence(), Some(1));
        assert_eq!(timeline.segments[1].sequence(), Some(2));
        assert_eq!(timeline.captions[0].text, "first");
    }

    #[test]
    fn test_first_clip_start_is_pinned_to_zero() {
        let clips = vec![Clip::new(1, 1.5, 6.0, "late start", media("a"))];
        let timeline = synthesize(&clips, 6.0).unwrap();
        assert_eq!(timeline.segments.len(), 1);
        assert_close(timeline.segments[0].trim_start, 0.0);
        assert_close(timeline.segments[0].trim_duration, 6.0);
        assert_close(timeline.captions[0].start, 0.0);
    }

    #[test]
    fn test_short_clip_is_stretched_to_minimum() {
        let clips = vec![Clip::new(1, 0.0, 1.5, "quick", media("a"))];
        let timeline = synthesize(&clips, 3.0).unwrap();
        let segment = &timeline.segments[0];
        assert_close(segment.output_duration(), 3.0);
        assert_close(segment.speed_factor, 0.5);
        assert_close(segment.trim_duration, 1.5);

        // Captions keep the original window.
        assert_close(timeline.captions[0].end, 1.5);
    }

    #[test]
    fn test_gap_between_clips_becomes_filler() {
        let clips = vec![
            Clip::new(1, 0.0, 4.0, "a", media("a")),
            Clip::new(2, 5.0, 9.0, "b", media("b")),
        ];
        let timeline = synthesize(&clips, 9.0).unwrap();
        assert_eq!(timeline.segments.len(), 3);
        assert_eq!(
            timeline.segments[1].source,
            SegmentSource::Filler {
                reason: FillerReason::Gap
            }
        );
        assert_close(timeline.segments[1].output_start, 4.0);
        assert_close(timeline.segments[1].output_end, 5.0);
        check_coverage(&timeline.segments, 9.0).unwrap();
    }

    #[test]
    fn test_trailing_pad_reaches_target() {
        let clips = vec![Clip::new(1, 0.0, 4.0, "a", media("a"))];
        let timeline = synthesize(&clips, 6.5).unwrap();
        let last = timeline.segments.last().unwrap();
        assert_eq!(
            last.source,
            SegmentSource::Filler {
                reason: FillerReason::TrailingPad
            }
        );
        check_coverage(&timeline.segments, 6.5).unwrap();
    }

    #[test]
    fn test_overrun_truncates_last_segment_only() {
        let clips = vec![
            Clip::new(1, 0.0, 4.0, "a", media("a")),
            Clip::new(2, 4.0, 8.0, "b", media("b")),
        ];
        let timeline = synthesize(&clips, 7.0).unwrap();
        assert_eq!(timeline.segments.len(), 2);
        let last = &timeline.segments[1];
        assert_close(last.output_end, 7.0);
        assert_close(last.trim_duration, 3.0);
        check_coverage(&timeline.segments, 7.0).unwrap();
    }

    #[test]
    fn test_overrun_past_whole_segment_drops_only_trailing_ones() {
        let clips = vec![
            Clip::new(1, 0.0, 4.0, "a", media("a")),
            Clip::new(2, 4.0, 8.0, "b", media("b")),
            Clip::new(3, 8.0, 12.0, "c", media("c")),
        ];
        let timeline = synthesize(&clips, 5.0).unwrap();
        assert_eq!(timeline.segments.len(), 2);
        assert_close(timeline.segments[1].output_end, 5.0);
        check_coverage(&timeline.segments, 5.0).unwrap();
    }

    #[test]
    fn test_missing_media_degrades_to_filler() {
        let clips = vec![
            Clip::new(1, 0.0, 4.0, "a", None),
            Clip::new(2, 4.0, 8.0, "b", media("b")),
        ];
        let timeline = synthesize(&clips, 8.0).unwrap();
        assert_eq!(
            timeline.segments[0].source,
            SegmentSource::Filler {
                reason: FillerReason::MissingMedia
            }
        );
        assert_close(timeline.segments[0].output_duration(), 4.0);
        assert!(matches!(
            timeline.notices[0],
            Notice::MissingMedia { sequence: 1, .. }
        ));
        // Captions are unaffected.
        assert_eq!(timeline.captions.len(), 2);
    }

    #[test]
    fn test_unavailable_media_predicate_degrades_to_filler() {
        let clips = vec![Clip::new(1, 0.0, 4.0, "a", media("gone"))];
        let timeline = TimelineSynthesizer::with_defaults()
            .synthesize_with(&clips, 4.0, |_| false)
            .unwrap();
        assert!(timeline.segments[0].is_filler());
        assert_eq!(timeline.filler_count(), 1);
    }

    #[test]
    fn test_cutaway_splits_clip_into_remainders() {
        let clip = Clip::new(1, 0.0, 10.0, "long clip", media("a"))
            .with_cutaway(Cutaway::new(3.0, 7.0, media("insert")));
        let timeline = synthesize(&[clip], 10.0).unwrap();

        let labels: Vec<String> = timeline.segments.iter().map(Segment::label).collect();
        assert_eq!(
            labels,
            vec!["clip1-remainder", "clip1-cutaway0", "clip1-remainder"]
        );
        assert_close(timeline.segments[1].output_start, 3.0);
        assert_close(timeline.segments[1].output_end, 7.0);
        assert_close(timeline.segments[2].trim_start, 7.0);
        assert_eq!(timeline.captions.len(), 1);
        assert_eq!(timeline.captions[0].text, "long clip");
    }

    #[test]
    fn test_cutaway_slowdown_is_capped() {
        let synthesizer = TimelineSynthesizer::with_defaults();
        let timing = synthesizer.cutaway_timing(0.5);
        assert_close(timing.speed_factor, 1.0 / 1.2);
        assert_close(timing.duration, 0.6);
        assert_close(timing.requested_speed.unwrap(), 0.5 / 3.0);

        let mild = synthesizer.cutaway_timing(2.8);
        assert!(mild.requested_speed.is_none());
        assert_close(mild.duration, 3.0);
    }

    #[test]
    fn test_long_cutaway_is_sped_up_to_maximum() {
        let timing = TimelineSynthesizer::with_defaults().cutaway_timing(20.0);
        assert_close(timing.duration, 15.0);
        assert_close(timing.speed_factor, 20.0 / 15.0);
    }

    #[test]
    fn test_cutaway_outside_window_is_clamped() {
        let clip = Clip::new(1, 0.0, 8.0, "clip", media("a"))
            .with_cutaway(Cutaway::new(6.0, 12.0, media("insert")));
        let timeline = synthesize(&[clip], 8.0).unwrap();
        let cutaway = timeline
            .segments
            .iter()
            .find(|s| matches!(s.source, SegmentSource::Cutaway { .. }))
            .unwrap();
        assert_close(cutaway.trim_duration, 2.0);
    }

    #[test]
    fn test_cutaway_fully_outside_window_is_skipped() {
        let clip = Clip::new(1, 0.0, 5.0, "clip", media("a"))
            .with_cutaway(Cutaway::new(9.0, 12.0, media("insert")));
        let timeline = synthesize(&[clip], 5.0).unwrap();
        assert_eq!(timeline.segments.len(), 1);
        assert!(matches!(
            timeline.notices[0],
            Notice::CutawaySkipped {
                sequence: 1,
                index: 0
            }
        ));
    }

    #[test]
    fn test_short_clip_with_collapsed_cutaway_is_still_stretched() {
        let clip = Clip::new(1, 0.0, 2.0, "short", media("a"))
            .with_cutaway(Cutaway::new(5.0, 6.0, media("insert")));
        let timeline = synthesize(&[clip], 3.0).unwrap();

        assert_eq!(timeline.segments.len(), 1);
        let segment = &timeline.segments[0];
        assert_eq!(segment.label(), "clip1");
        assert_close(segment.output_duration(), 3.0);
        assert_close(segment.speed_factor, 2.0 / 3.0);
        assert!(matches!(
            timeline.notices[0],
            Notice::CutawaySkipped {
                sequence: 1,
                index: 0
            }
        ));
        check_coverage(&timeline.segments, 3.0).unwrap();
    }

    #[test]
    fn test_missing_cutaway_media_becomes_filler_of_same_length() {
        let clip = Clip::new(1, 0.0, 10.0, "clip", media("a"))
            .with_cutaway(Cutaway::new(2.0, 6.0, None));
        let timeline = synthesize(&[clip], 10.0).unwrap();
        assert!(timeline.segments[1].is_filler());
        assert_close(timeline.segments[1].output_duration(), 4.0);
        check_coverage(&timeline.segments, 10.0).unwrap();
    }

    #[test]
    fn test_overlapping_cutaways_do_not_overlap_in_output() {
        let clip = Clip::new(1, 0.0, 12.0, "clip", media("a"))
            .with_cutaway(Cutaway::new(2.0, 6.0, media("x")))
            .with_cutaway(Cutaway::new(5.0, 9.0, media("y")));
        let timeline = synthesize(&[clip], 12.0).unwrap();
        check_coverage(&timeline.segments, 12.0).unwrap();
        let cutaways: Vec<&Segment> = timeline
            .segments
            .iter()
            .filter(|s| matches!(s.source, SegmentSource::Cutaway { .. }))
            .collect();
        assert_eq!(cutaways.len(), 2);
        assert_close(cutaways[1].trim_duration, 3.0);
    }

    #[test]
    fn test_invalid_target_rejected() {
        let clips = vec![Clip::new(1, 0.0, 4.0, "a", media("a"))];
        assert!(matches!(
            synthesize(&clips, 0.0),
            Err(SynthesisError::InvalidTargetDuration { .. })
        ));
        assert!(matches!(
            synthesize(&clips, f64::NAN),
            Err(SynthesisError::InvalidTargetDuration { .. })
        ));
    }
}
