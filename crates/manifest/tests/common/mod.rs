use std::collections::BTreeMap;

use iori_manifest::{
    parsed::{
        MaximumTimeData, ParsedAdaptation, ParsedIndex, ParsedPeriod, ParsedRepresentation,
        TimeBounds,
    },
    AdaptationType, Manifest, ManifestEvent, ManifestOptions, ParsedManifest, SharedPeriod,
};
use tokio::sync::mpsc;

use crate::AssertWrapper;

pub const VOD: &str = include_str!("../fixtures/vod.json");
pub const LIVE: &str = include_str!("../fixtures/live.json");
pub const LIVE_UPDATE: &str = include_str!("../fixtures/live-update.json");

pub fn load(data: &str) -> ParsedManifest {
    init_test_tracing();
    ParsedManifest::from_json(data).assert_success()
}

pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("iori_manifest=trace")
        .with_test_writer()
        .try_init();
}

pub fn build(parsed: ParsedManifest) -> Manifest {
    init_test_tracing();
    Manifest::new(parsed, &ManifestOptions::new())
}

/// Period with a single video track whose representation is named after the period.
pub fn period(id: &str, start: f64, duration: Option<f64>) -> ParsedPeriod {
    let mut adaptations = BTreeMap::new();
    adaptations.insert(
        AdaptationType::Video,
        vec![ParsedAdaptation {
            id: "video".to_string(),
            r#type: AdaptationType::Video,
            language: None,
            closed_caption: false,
            is_audio_description: false,
            is_dub: false,
            is_sign_interpreted: false,
            representations: vec![ParsedRepresentation {
                id: format!("{id}-video"),
                bitrate: 1_000_000,
                codecs: Some("avc1.640028".to_string()),
                mime_type: Some("video/mp4".to_string()),
                width: Some(1280),
                height: Some(720),
                frame_rate: None,
                content_protections: None,
                index: ParsedIndex::Static {
                    media: format!("https://example.com/{id}.mp4"),
                },
            }],
        }],
    );
    ParsedPeriod {
        id: id.to_string(),
        start,
        duration,
        adaptations,
    }
}

/// Non-live manifest whose seekable window starts at zero.
pub fn manifest_with(periods: Vec<ParsedPeriod>) -> ParsedManifest {
    ParsedManifest {
        id: None,
        expired: None,
        transport_type: "dash".to_string(),
        clock_offset: None,
        periods,
        time_bounds: TimeBounds {
            minimum_safe_position: Some(0.),
            timeshift_depth: None,
            maximum_time_data: MaximumTimeData {
                live_position: None,
                is_linear: false,
                maximum_safe_position: 100.,
                time: 0.,
            },
        },
        is_dynamic: false,
        is_live: false,
        is_last_period_known: true,
        uris: vec!["https://example.com/manifest.mpd".to_string()],
        lifetime: None,
        suggested_presentation_delay: None,
        availability_start_time: None,
        publish_time: None,
    }
}

pub fn period_ids(periods: &[SharedPeriod]) -> Vec<String> {
    periods.iter().map(SharedPeriod::id).collect()
}

pub fn events(receiver: &mut mpsc::UnboundedReceiver<ManifestEvent>) -> Vec<ManifestEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
