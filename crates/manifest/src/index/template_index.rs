use super::{template::Template, url::resolve_media_urls, Segment, SegmentIndex, SegmentTiming};
use crate::{clock, parsed::MaximumTimeData};

/// Index of numbered segments sharing the same duration.
///
/// Segment `k` starts at index time `k * duration`, that is at the position
/// `(k * duration - index_time_offset) / timescale` seconds, and is numbered `start_number + k`.
///
/// A dynamic index only exposes the segments which are entirely available, that is ending
/// before the maximum safe position of its `availability`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateIndex {
    timescale: u64,
    duration: f64,
    start_number: u64,
    index_time_offset: f64,
    initialization: Option<String>,
    media: String,
    base_urls: Vec<String>,
    end: Option<f64>,
    is_dynamic: bool,
    availability: Option<MaximumTimeData>,
    template: Template,
}

impl TemplateIndex {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timescale: u64,
        duration: f64,
        start_number: u64,
        index_time_offset: f64,
        initialization: Option<String>,
        media: String,
        base_urls: Vec<String>,
        end: Option<f64>,
        is_dynamic: bool,
        availability: Option<MaximumTimeData>,
        representation_id: &str,
        bandwidth: u64,
    ) -> Self {
        Self {
            timescale: timescale.max(1),
            duration,
            start_number,
            index_time_offset,
            initialization,
            media,
            base_urls,
            end,
            is_dynamic,
            availability,
            template: Template::for_representation(representation_id, bandwidth),
        }
    }

    fn to_index_time(&self, position: f64) -> f64 {
        position * self.timescale as f64 + self.index_time_offset
    }

    fn to_position(&self, time: f64) -> f64 {
        (time - self.index_time_offset) / self.timescale as f64
    }

    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    /// Latest position whose segments can be requested, in seconds.
    fn available_position(&self) -> Option<f64> {
        if !self.is_dynamic {
            return None;
        }
        let data = self.availability.as_ref()?;
        if !data.is_linear {
            return Some(data.maximum_safe_position);
        }
        Some(data.maximum_safe_position + clock::seconds_since(data.time))
    }
}

impl SegmentIndex for TemplateIndex {
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
        if self.duration <= 0. {
            return Vec::new();
        }

        let to_time = self.to_index_time(from + duration);
        let end_time = self.end.map(|end| self.to_index_time(end));
        let available_time = self
            .available_position()
            .map(|position| self.to_index_time(position));
        if !to_time.is_finite() && end_time.is_none() && available_time.is_none() {
            tracing::warn!(
                from,
                duration,
                "Unbounded request on an open-ended template index"
            );
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut k = (self.to_index_time(from) / self.duration).floor().max(0.) as u64;
        loop {
            let time = k as f64 * self.duration;
            if time >= to_time
                || end_time.is_some_and(|end| time >= end)
                || available_time.is_some_and(|available| time + self.duration > available)
            {
                break;
            }

            let number = self.start_number + k;
            let mut template = self.template.clone();
            template
                .insert(Template::NUMBER, number.to_string())
                .insert(Template::TIME, format!("{time}"));

            segments.push(Segment {
                id: number.to_string(),
                is_init: false,
                time,
                duration: self.duration,
                end: time + self.duration,
                timescale: self.timescale,
                number: Some(number),
                media_urls: resolve_media_urls(&self.base_urls, &template.resolve(&self.media)),
            });
            k += 1;
        }
        segments
    }

    fn should_refresh(&self, time: f64, _from: f64, to: f64) -> bool {
        if !self.is_dynamic {
            return false;
        }
        match self.available_position() {
            Some(available) if self.end.is_some_and(|end| end <= available) => false,
            Some(available) => to > available || time > available,
            None => self.end.is_none(),
        }
    }

    fn first_position(&self) -> Option<f64> {
        Some(self.to_position(0.))
    }

    fn last_position(&self) -> Option<f64> {
        match (self.end, self.available_position()) {
            (Some(end), Some(available)) => Some(end.min(available)),
            (end, available) => end.or(available),
        }
    }

    fn check_discontinuity(&self, _time: f64) -> Option<f64> {
        None
    }

    fn timescale(&self) -> u64 {
        self.timescale
    }

    fn set_timescale(&mut self, timescale: u64) {
        let (new, old) = (timescale as f64, self.timescale as f64);
        self.duration = self.duration * new / old;
        self.index_time_offset = self.index_time_offset * new / old;
        self.timescale = timescale;
    }

    fn add_segments(
        &mut self,
        _next_segments: &[SegmentTiming],
        _current_segment: Option<&SegmentTiming>,
    ) -> Vec<SegmentTiming> {
        tracing::warn!("Tried to add segments to a template index");
        Vec::new()
    }
}
