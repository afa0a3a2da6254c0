use super::{template::Template, url::resolve_media_urls, Segment, SegmentIndex, SegmentTiming};
use crate::parsed::ParsedTimelineEntry;

/// Tolerance, in timescale units, used when comparing segment boundaries.
const EPSILON: f64 = 1e-6;

/// A run of `repeat_count + 1` consecutive segments of the same duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineEntry {
    pub start: f64,
    pub duration: f64,
    pub repeat_count: u64,
}

impl TimelineEntry {
    pub fn end(&self) -> f64 {
        self.start + self.duration * (self.repeat_count + 1) as f64
    }
}

impl From<ParsedTimelineEntry> for TimelineEntry {
    fn from(entry: ParsedTimelineEntry) -> Self {
        Self {
            start: entry.start,
            duration: entry.duration,
            repeat_count: entry.repeat_count,
        }
    }
}

/// Index listing every segment with its exact timing.
///
/// Index time `t` maps to the position `(t - index_time_offset) / timescale` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineIndex {
    timescale: u64,
    index_time_offset: f64,
    initialization: Option<String>,
    media: String,
    base_urls: Vec<String>,
    start_number: Option<u64>,
    timeline: Vec<TimelineEntry>,
    is_dynamic: bool,
    template: Template,
}

impl TimelineIndex {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timescale: u64,
        index_time_offset: f64,
        initialization: Option<String>,
        media: String,
        base_urls: Vec<String>,
        start_number: Option<u64>,
        timeline: Vec<TimelineEntry>,
        is_dynamic: bool,
        representation_id: &str,
        bandwidth: u64,
    ) -> Self {
        Self {
            timescale: timescale.max(1),
            index_time_offset,
            initialization,
            media,
            base_urls,
            start_number,
            timeline,
            is_dynamic,
            template: Template::for_representation(representation_id, bandwidth),
        }
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    fn to_index_time(&self, position: f64) -> f64 {
        position * self.timescale as f64 + self.index_time_offset
    }

    fn to_position(&self, time: f64) -> f64 {
        (time - self.index_time_offset) / self.timescale as f64
    }

    fn media_segment(&self, time: f64, duration: f64, position_in_timeline: u64) -> Segment {
        let number = self.start_number.map(|n| n + position_in_timeline);

        let mut template = self.template.clone();
        template.insert(Template::TIME, format!("{time}"));
        if let Some(number) = number {
            template.insert(Template::NUMBER, number.to_string());
        }

        Segment {
            id: format!("{time}"),
            is_init: false,
            time,
            duration,
            end: time + duration,
            timescale: self.timescale,
            number,
            media_urls: resolve_media_urls(&self.base_urls, &template.resolve(&self.media)),
        }
    }
}

impl SegmentIndex for TimelineIndex {
    fn init_segment(&self) -> Option<Segment> {
        let initialization = self.initialization.as_ref()?;
        Some(Segment {
            id: "init".to_string(),
            is_init: true,
            time: 0.,
            duration: 0.,
            end: 0.,
            timescale: self.timescale,
            number: None,
            media_urls: resolve_media_urls(&self.base_urls, &self.template.resolve(initialization)),
        })
    }

    fn segments(&self, from: f64, duration: f64) -> Vec<Segment> {
        let from_time = self.to_index_time(from);
        let to_time = self.to_index_time(from + duration);

        let mut segments = Vec::new();
        let mut position_in_timeline = 0;
        for entry in &self.timeline {
            if entry.end() <= from_time {
                position_in_timeline += entry.repeat_count + 1;
                continue;
            }

            for repeat in 0..=entry.repeat_count {
                let time = entry.start + repeat as f64 * entry.duration;
                let current = position_in_timeline;
                position_in_timeline += 1;

                if time + entry.duration <= from_time {
                    continue;
                }
                if time >= to_time {
                    return segments;
                }
                segments.push(self.media_segment(time, entry.duration, current));
            }
        }
        segments
    }

    fn should_refresh(&self, time: f64, _from: f64, to: f64) -> bool {
        if !self.is_dynamic {
            return false;
        }
        match self.last_position() {
            Some(last_position) => to > last_position || time > last_position,
            None => true,
        }
    }

    fn first_position(&self) -> Option<f64> {
        self.timeline
            .first()
            .map(|entry| self.to_position(entry.start))
    }

    fn last_position(&self) -> Option<f64> {
        self.timeline
            .last()
            .map(|entry| self.to_position(entry.end()))
    }

    fn check_discontinuity(&self, time: f64) -> Option<f64> {
        let time = self.to_index_time(time);
        self.timeline.windows(2).find_map(|pair| {
            let hole_start = pair[0].end();
            let hole_end = pair[1].start;
            (hole_end - hole_start > EPSILON && time >= hole_start && time < hole_end)
                .then(|| self.to_position(hole_end))
        })
    }

    fn timescale(&self) -> u64 {
        self.timescale
    }

    fn set_timescale(&mut self, timescale: u64) {
        let (new, old) = (timescale as f64, self.timescale as f64);
        for entry in self.timeline.iter_mut() {
            entry.start = entry.start * new / old;
            entry.duration = entry.duration * new / old;
        }
        self.index_time_offset = self.index_time_offset * new / old;
        self.timescale = timescale;
    }

    fn add_segments(
        &mut self,
        next_segments: &[SegmentTiming],
        current_segment: Option<&SegmentTiming>,
    ) -> Vec<SegmentTiming> {
        let current_time = current_segment.map(|c| c.rescale(self.timescale).time);

        let mut inserted = Vec::new();
        for next in next_segments {
            let scaled = next.rescale(self.timescale);

            // Timing sharing the start of the segment it was read from only tells its
            // duration, which is not trusted enough to deduce the next segment.
            if current_time.is_some_and(|time| (time - scaled.time).abs() < EPSILON) {
                continue;
            }

            match self.timeline.last().copied() {
                Some(last) if scaled.time < last.end() - EPSILON => {
                    tracing::trace!(time = scaled.time, "Segment already in the timeline");
                    continue;
                }
                Some(last)
                    if (scaled.time - last.end()).abs() < EPSILON
                        && (scaled.duration - last.duration).abs() < EPSILON =>
                {
                    if let Some(last) = self.timeline.last_mut() {
                        last.repeat_count += 1;
                    }
                }
                _ => self.timeline.push(TimelineEntry {
                    start: scaled.time,
                    duration: scaled.duration,
                    repeat_count: 0,
                }),
            }
            inserted.push(*next);
        }
        inserted
    }
}
