//! Segment indexes of a [`crate::Representation`].
//!
//! Every transport describes its segments differently. The [`RepresentationIndex`] wrapper resolves
//! once, at construction, which implementation handles the parsed description and then exposes a
//! single query contract to the rest of the player.

mod static_index;
pub mod template;
mod template_index;
mod timeline;
pub(crate) mod url;

pub use static_index::StaticIndex;
pub use template_index::TemplateIndex;
pub use timeline::{TimelineEntry, TimelineIndex};

use crate::parsed::ParsedIndex;

/// Description of a single segment returned by index queries.
///
/// `time`, `duration` and `end` are expressed in `timescale` units on the index's own timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: String,
    pub is_init: bool,
    pub time: f64,
    pub duration: f64,
    pub end: f64,
    pub timescale: u64,
    pub number: Option<u64>,
    pub media_urls: Vec<String>,
}

/// Timing of a segment announced outside of the manifest, typically from inside another segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTiming {
    pub time: f64,
    pub duration: f64,
    pub timescale: u64,
}

impl SegmentTiming {
    pub(crate) fn rescale(&self, timescale: u64) -> Self {
        if self.timescale == timescale || self.timescale == 0 {
            return *self;
        }
        let factor = timescale as f64 / self.timescale as f64;
        Self {
            time: self.time * factor,
            duration: self.duration * factor,
            timescale,
        }
    }
}

/// Operations every index kind implements.
pub(crate) trait SegmentIndex {
    fn init_segment(&self) -> Option<Segment>;

    fn segments(&self, from: f64, duration: f64) -> Vec<Segment>;

    fn should_refresh(&self, time: f64, from: f64, to: f64) -> bool;

    fn first_position(&self) -> Option<f64>;

    fn last_position(&self) -> Option<f64>;

    fn check_discontinuity(&self, time: f64) -> Option<f64>;

    fn timescale(&self) -> u64;

    fn set_timescale(&mut self, timescale: u64);

    fn add_segments(
        &mut self,
        next_segments: &[SegmentTiming],
        current_segment: Option<&SegmentTiming>,
    ) -> Vec<SegmentTiming>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexKind {
    Static(StaticIndex),
    Timeline(TimelineIndex),
    Template(TemplateIndex),
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static(_) => "static",
            Self::Timeline(_) => "timeline",
            Self::Template(_) => "template",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationIndex {
    kind: IndexKind,
}

impl RepresentationIndex {
    /// Build the index of the representation `representation_id`, whose bitrate is `bandwidth`.
    ///
    /// Both values are used to resolve `$RepresentationID$` and `$Bandwidth$` in URL templates.
    pub fn from_parsed(parsed: ParsedIndex, representation_id: &str, bandwidth: u64) -> Self {
        let kind = match parsed {
            ParsedIndex::Static { media } => IndexKind::Static(StaticIndex::new(media)),
            ParsedIndex::Timeline {
                timescale,
                index_time_offset,
                initialization,
                media,
                base_urls,
                start_number,
                timeline,
                is_dynamic,
            } => IndexKind::Timeline(TimelineIndex::new(
                timescale,
                index_time_offset,
                initialization,
                media,
                base_urls,
                start_number,
                timeline.into_iter().map(TimelineEntry::from).collect(),
                is_dynamic,
                representation_id,
                bandwidth,
            )),
            ParsedIndex::Template {
                timescale,
                duration,
                start_number,
                index_time_offset,
                initialization,
                media,
                base_urls,
                end,
                is_dynamic,
                maximum_time_data,
            } => IndexKind::Template(TemplateIndex::new(
                timescale,
                duration as f64,
                start_number,
                index_time_offset,
                initialization,
                media,
                base_urls,
                end,
                is_dynamic,
                maximum_time_data,
                representation_id,
                bandwidth,
            )),
        };
        Self { kind }
    }

    /// Index made of a single segment at `media`, used by supplementary tracks.
    pub fn new_static(media: impl Into<String>) -> Self {
        Self {
            kind: IndexKind::Static(StaticIndex::new(media.into())),
        }
    }

    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    pub fn get_type(&self) -> &'static str {
        self.kind.as_str()
    }

    fn inner(&self) -> &dyn SegmentIndex {
        match &self.kind {
            IndexKind::Static(index) => index,
            IndexKind::Timeline(index) => index,
            IndexKind::Template(index) => index,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SegmentIndex {
        match &mut self.kind {
            IndexKind::Static(index) => index,
            IndexKind::Timeline(index) => index,
            IndexKind::Template(index) => index,
        }
    }

    pub fn get_init_segment(&self) -> Option<Segment> {
        self.inner().init_segment()
    }

    /// Segments overlapping `[from, from + duration)`, positions in seconds.
    pub fn get_segments(&self, from: f64, duration: f64) -> Vec<Segment> {
        self.inner().segments(from, duration)
    }

    /// Whether the manifest should be refreshed before answering queries over `[from, to)` at
    /// the playback position `time`.
    pub fn should_refresh(&self, time: f64, from: f64, to: f64) -> bool {
        self.inner().should_refresh(time, from, to)
    }

    pub fn get_first_position(&self) -> Option<f64> {
        self.inner().first_position()
    }

    pub fn get_last_position(&self) -> Option<f64> {
        self.inner().last_position()
    }

    /// Position to seek to when `time` falls in a hole of the segment timeline.
    pub fn check_discontinuity(&self, time: f64) -> Option<f64> {
        self.inner().check_discontinuity(time)
    }

    /// Convert an index time into seconds.
    pub fn scale(&self, time: f64) -> f64 {
        let timescale = self.inner().timescale();
        if timescale == 0 {
            return time;
        }
        time / timescale as f64
    }

    pub fn timescale(&self) -> u64 {
        self.inner().timescale()
    }

    /// Express every time of the index in `timescale` units per second.
    pub fn set_timescale(&mut self, timescale: u64) {
        if timescale == 0 {
            tracing::warn!(index = self.get_type(), "Ignoring zero timescale");
            return;
        }
        self.inner_mut().set_timescale(timescale);
    }

    /// Take over the state of `other`, e.g. after the manifest was refreshed.
    pub fn update(&mut self, other: &RepresentationIndex) {
        if self.get_type() != other.get_type() {
            tracing::debug!(
                from = self.get_type(),
                to = other.get_type(),
                "Representation index changed kind"
            );
        }
        self.kind = other.kind.clone();
    }

    /// Merge segments discovered outside of the manifest.
    ///
    /// Returns the segments that were actually inserted, segments already known are skipped.
    pub fn add_segments(
        &mut self,
        next_segments: &[SegmentTiming],
        current_segment: Option<&SegmentTiming>,
    ) -> Vec<SegmentTiming> {
        self.inner_mut()
            .add_segments(next_segments, current_segment)
    }
}
