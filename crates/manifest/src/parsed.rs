//! Transport-agnostic manifest description, as handed over by transport parsers.
//!
//! Every transport (DASH, Smooth, MetaPlaylist...) converts its own document into these value
//! objects, which [`crate::Manifest::new`] then normalizes into the shared period graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{adaptation::AdaptationType, error::ManifestResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedManifest {
    pub id: Option<String>,
    /// `true` when the document already announces that a full refetch is due.
    pub expired: Option<bool>,
    pub transport_type: String,
    pub clock_offset: Option<f64>,
    #[serde(default)]
    pub periods: Vec<ParsedPeriod>,
    pub time_bounds: TimeBounds,
    #[serde(default)]
    pub is_dynamic: bool,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default = "default_true")]
    pub is_last_period_known: bool,
    #[serde(default)]
    pub uris: Vec<String>,
    pub lifetime: Option<f64>,
    pub suggested_presentation_delay: Option<f64>,
    /// Unix timestamp, in seconds.
    pub availability_start_time: Option<f64>,
    /// Unix timestamp, in seconds.
    pub publish_time: Option<f64>,
}

impl ParsedManifest {
    pub fn from_json(data: &str) -> ManifestResult<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

fn default_true() -> bool {
    true
}

/// Time boundaries of the content, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBounds {
    /// Absolute minimum position that can be reached, whatever the timeshift window says.
    pub minimum_safe_position: Option<f64>,
    /// Depth of the seekable window behind the maximum position. `None` means unlimited.
    pub timeshift_depth: Option<f64>,
    pub maximum_time_data: MaximumTimeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaximumTimeData {
    pub live_position: Option<f64>,
    /// When `true`, `live_position` and `maximum_safe_position` move forward with real time from
    /// the instant `time`.
    pub is_linear: bool,
    pub maximum_safe_position: f64,
    /// Instant at which the two positions above were true, see [`crate::clock::now_ms`].
    #[serde(default = "crate::clock::now_ms")]
    pub time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPeriod {
    pub id: String,
    pub start: f64,
    pub duration: Option<f64>,
    #[serde(default)]
    pub adaptations: BTreeMap<AdaptationType, Vec<ParsedAdaptation>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAdaptation {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: AdaptationType,
    pub language: Option<String>,
    #[serde(default)]
    pub closed_caption: bool,
    #[serde(default)]
    pub is_audio_description: bool,
    #[serde(default)]
    pub is_dub: bool,
    #[serde(default)]
    pub is_sign_interpreted: bool,
    #[serde(default)]
    pub representations: Vec<ParsedRepresentation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRepresentation {
    pub id: String,
    pub bitrate: u64,
    pub codecs: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    pub content_protections: Option<ParsedContentProtections>,
    pub index: ParsedIndex,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedContentProtections {
    /// Hex-encoded key ids.
    #[serde(default)]
    pub key_ids: Vec<String>,
}

/// Segment index description. The `type` tag selects the index implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParsedIndex {
    /// A single segment covering the whole content.
    Static { media: String },
    /// Explicitly timed segments.
    #[serde(rename_all = "camelCase")]
    Timeline {
        #[serde(default = "default_timescale")]
        timescale: u64,
        /// Offset, in timescale units, between index time and presentation time.
        #[serde(default)]
        index_time_offset: f64,
        initialization: Option<String>,
        media: String,
        #[serde(default)]
        base_urls: Vec<String>,
        start_number: Option<u64>,
        #[serde(default)]
        timeline: Vec<ParsedTimelineEntry>,
        #[serde(default)]
        is_dynamic: bool,
    },
    /// Numbered segments of a constant duration.
    #[serde(rename_all = "camelCase")]
    Template {
        #[serde(default = "default_timescale")]
        timescale: u64,
        duration: u64,
        #[serde(default = "default_start_number")]
        start_number: u64,
        #[serde(default)]
        index_time_offset: f64,
        initialization: Option<String>,
        media: String,
        #[serde(default)]
        base_urls: Vec<String>,
        /// End of the content in seconds, `None` while it is still growing.
        end: Option<f64>,
        #[serde(default)]
        is_dynamic: bool,
        /// Latest position whose segments are available, for dynamic content.
        maximum_time_data: Option<MaximumTimeData>,
    },
}

fn default_timescale() -> u64 {
    1
}

fn default_start_number() -> u64 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTimelineEntry {
    pub start: f64,
    pub duration: f64,
    /// Number of additional segments of the same duration following this one.
    #[serde(default)]
    pub repeat_count: u64,
}

/// Supplementary track given by the application rather than by the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementaryImageTrack {
    pub mime_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementaryTextTrack {
    pub mime_type: String,
    pub codecs: Option<String>,
    pub url: String,
    pub language: String,
    #[serde(default)]
    pub closed_caption: bool,
}
