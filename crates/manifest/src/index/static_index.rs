use super::{Segment, SegmentIndex, SegmentTiming};

/// Index of a content made of one file, e.g. a thumbnail track or a side-loaded subtitle file.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticIndex {
    media: String,
}

impl StaticIndex {
    pub fn new(media: String) -> Self {
        Self { media }
    }

    pub fn media(&self) -> &str {
        &self.media
    }
}

impl SegmentIndex for StaticIndex {
    fn init_segment(&self) -> Option<Segment> {
        None
    }

    fn segments(&self, _from: f64, _duration: f64) -> Vec<Segment> {
        vec![Segment {
            id: "0".to_string(),
            is_init: false,
            time: 0.,
            duration: f64::MAX,
            end: f64::MAX,
            timescale: 1,
            number: Some(0),
            media_urls: vec![self.media.clone()],
        }]
    }

    fn should_refresh(&self, _time: f64, _from: f64, _to: f64) -> bool {
        false
    }

    fn first_position(&self) -> Option<f64> {
        None
    }

    fn last_position(&self) -> Option<f64> {
        None
    }

    fn check_discontinuity(&self, _time: f64) -> Option<f64> {
        None
    }

    fn timescale(&self) -> u64 {
        1
    }

    fn set_timescale(&mut self, _timescale: u64) {
        tracing::warn!("Tried to change the timescale of a static index");
    }

    fn add_segments(
        &mut self,
        _next_segments: &[SegmentTiming],
        _current_segment: Option<&SegmentTiming>,
    ) -> Vec<SegmentTiming> {
        tracing::warn!("Tried to add segments to a static index");
        Vec::new()
    }
}
