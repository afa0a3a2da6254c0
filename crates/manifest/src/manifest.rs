use std::{
    collections::HashSet,
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, LazyLock, Mutex,
    },
};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::{
    adaptation::{Adaptation, AdaptationType, RepresentationFilter, RepresentationFilterContext},
    clock,
    error::{ManifestResult, MediaError},
    event::{DecipherabilityUpdate, ManifestEvent, Subscribers},
    parsed::{
        ParsedAdaptation, ParsedIndex, ParsedManifest, ParsedRepresentation, SupplementaryImageTrack,
        SupplementaryTextTrack, TimeBounds,
    },
    period::{Adaptations, Period, SharedPeriod},
    representation::{CodecSupportCheck, Decipherability, Representation},
    update::{replace_periods, update_periods},
};

static MANIFEST_ID: AtomicU64 = AtomicU64::new(0);
static IMAGE_ADAPTATION_ID: AtomicU64 = AtomicU64::new(0);
static IMAGE_REPRESENTATION_ID: AtomicU64 = AtomicU64::new(0);
static TEXT_ADAPTATION_ID: AtomicU64 = AtomicU64::new(0);
static TEXT_REPRESENTATION_ID: AtomicU64 = AtomicU64::new(0);

fn generate_id(prefix: &str, counter: &AtomicU64) -> String {
    format!("{prefix}-{}", counter.fetch_add(1, Ordering::Relaxed))
}

/// Signal telling that the manifest must be fetched again entirely.
#[derive(Debug, Clone, Default)]
pub struct ExpirationSignal(Arc<AtomicBool>);

impl ExpirationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_resolved(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Default)]
pub struct ManifestOptions {
    supplementary_image_tracks: Vec<SupplementaryImageTrack>,
    supplementary_text_tracks: Vec<SupplementaryTextTrack>,
    representation_filter: Option<RepresentationFilter>,
    manifest_update_url: Option<String>,
    codec_support: Option<CodecSupportCheck>,
}

impl ManifestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_track(mut self, track: SupplementaryImageTrack) -> Self {
        self.supplementary_image_tracks.push(track);
        self
    }

    pub fn text_track(mut self, track: SupplementaryTextTrack) -> Self {
        self.supplementary_text_tracks.push(track);
        self
    }

    pub fn representation_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Representation, &RepresentationFilterContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.representation_filter = Some(Arc::new(filter));
        self
    }

    pub fn manifest_update_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_update_url = Some(url.into());
        self
    }

    /// Decides which `mimeType;codecs="..."` strings can be played.
    ///
    /// Without it, every representation is considered supported.
    pub fn codec_support<F>(mut self, check: F) -> Self
    where
        F: Fn(AdaptationType, &str) -> bool + Send + Sync + 'static,
    {
        self.codec_support = Some(Arc::new(check));
        self
    }
}

impl fmt::Debug for ManifestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestOptions")
            .field("supplementary_image_tracks", &self.supplementary_image_tracks)
            .field("supplementary_text_tracks", &self.supplementary_text_tracks)
            .field("representation_filter", &self.representation_filter.is_some())
            .field("manifest_update_url", &self.manifest_update_url)
            .field("codec_support", &self.codec_support.is_some())
            .finish()
    }
}

enum UpdateKind {
    Full,
    Partial,
}

/// Description of a content, refreshed in place during playback.
#[derive(Debug)]
pub struct Manifest {
    id: String,
    pub transport: String,
    pub is_dynamic: bool,
    pub is_live: bool,
    pub is_last_period_known: bool,
    pub uris: Vec<String>,
    /// Where to fetch partial refreshes of this manifest.
    pub update_url: Option<String>,
    /// Seconds after which the manifest should be refreshed.
    pub lifetime: Option<f64>,
    pub suggested_presentation_delay: Option<f64>,
    /// Unix timestamp, in seconds.
    pub availability_start_time: Option<f64>,
    /// Unix timestamp, in seconds.
    pub publish_time: Option<f64>,
    /// Difference in milliseconds between the server clock and ours.
    pub clock_offset: Option<f64>,
    pub expired: Option<ExpirationSignal>,
    time_bounds: TimeBounds,
    periods: Vec<SharedPeriod>,
    content_warnings: Vec<MediaError>,
    subscribers: Subscribers,
}

impl Manifest {
    pub fn new(parsed: ParsedManifest, options: &ManifestOptions) -> Self {
        let mut warnings = Vec::new();

        let mut periods: Vec<Period> = parsed
            .periods
            .into_iter()
            .map(|period| {
                Period::new(
                    period,
                    options.representation_filter.as_ref(),
                    options.codec_support.as_ref(),
                    &mut warnings,
                )
            })
            .collect();
        periods.sort_by(|a, b| a.start.total_cmp(&b.start));

        if let Some(first) = periods.first_mut() {
            for track in &options.supplementary_image_tracks {
                add_image_track(first, track, options.codec_support.as_ref(), &mut warnings);
            }
            for track in &options.supplementary_text_tracks {
                add_text_track(first, track, options.codec_support.as_ref(), &mut warnings);
            }
        } else if !options.supplementary_image_tracks.is_empty()
            || !options.supplementary_text_tracks.is_empty()
        {
            tracing::warn!("No period to add supplementary tracks to");
        }

        let manifest = Self {
            id: parsed
                .id
                .unwrap_or_else(|| generate_id("gen-manifest", &MANIFEST_ID)),
            transport: parsed.transport_type,
            is_dynamic: parsed.is_dynamic,
            is_live: parsed.is_live,
            is_last_period_known: parsed.is_last_period_known,
            uris: parsed.uris,
            update_url: options.manifest_update_url.clone(),
            lifetime: parsed.lifetime,
            suggested_presentation_delay: parsed.suggested_presentation_delay,
            availability_start_time: parsed.availability_start_time,
            publish_time: parsed.publish_time,
            clock_offset: parsed.clock_offset,
            expired: parsed.expired.map(|expired| {
                let signal = ExpirationSignal::new();
                if expired {
                    signal.resolve();
                }
                signal
            }),
            time_bounds: parsed.time_bounds,
            periods: periods.into_iter().map(SharedPeriod::new).collect(),
            content_warnings: warnings,
            subscribers: Subscribers::default(),
        };
        tracing::debug!(
            id = %manifest.id,
            transport = %manifest.transport,
            periods = manifest.periods.len(),
            warnings = manifest.content_warnings.len(),
            "Manifest created"
        );
        manifest
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Periods, sorted by start.
    pub fn periods(&self) -> &[SharedPeriod] {
        &self.periods
    }

    /// Non-fatal problems found while building the latest version of the manifest.
    pub fn content_warnings(&self) -> &[MediaError] {
        &self.content_warnings
    }

    pub fn time_bounds(&self) -> &TimeBounds {
        &self.time_bounds
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ManifestEvent> {
        self.subscribers.subscribe()
    }

    pub fn get_url(&self) -> Option<&str> {
        self.uris.first().map(String::as_str)
    }

    pub fn availability_start_date(&self) -> Option<DateTime<Utc>> {
        self.availability_start_time
            .and_then(clock::unix_seconds_to_date)
    }

    pub fn get_period(&self, id: &str) -> Option<SharedPeriod> {
        self.periods.iter().find(|p| p.read().id == id).cloned()
    }

    /// Period playing at `time`.
    pub fn get_period_for_time(&self, time: f64) -> Option<SharedPeriod> {
        self.periods
            .iter()
            .find(|p| p.read().contains_time(time))
            .cloned()
    }

    /// First period starting after `time`.
    pub fn get_next_period(&self, time: f64) -> Option<SharedPeriod> {
        self.periods.iter().find(|p| p.start() > time).cloned()
    }

    /// Period coming after `period`, `None` if it does not exist or if `period` has no known end.
    pub fn get_period_after(&self, period: &SharedPeriod) -> Option<SharedPeriod> {
        let end = period.end()?;
        self.periods
            .iter()
            .find(|p| p.end().map_or(true, |period_end| end < period_end))
            .cloned()
    }

    /// Earliest position that can be played.
    pub fn get_minimum_safe_position(&self) -> f64 {
        let minimum = self.time_bounds.minimum_safe_position.unwrap_or(0.);
        match self.time_bounds.timeshift_depth {
            None => minimum,
            Some(depth) => minimum.max(self.get_maximum_safe_position() - depth),
        }
    }

    /// Position of the live edge, `None` if the content is not live or the edge is unknown.
    pub fn get_live_position(&self) -> Option<f64> {
        if !self.is_live {
            return None;
        }
        let data = &self.time_bounds.maximum_time_data;
        let live_position = data.live_position?;
        if !data.is_linear {
            return Some(live_position);
        }
        Some(live_position + clock::seconds_since(data.time))
    }

    /// Latest position that can be played without waiting for more content.
    pub fn get_maximum_safe_position(&self) -> f64 {
        let data = &self.time_bounds.maximum_time_data;
        if !data.is_linear {
            return data.maximum_safe_position;
        }
        data.maximum_safe_position + clock::seconds_since(data.time)
    }

    /// Refresh the manifest with `new`, an entirely new version of it.
    ///
    /// Every period is replaced: references to the previous ones no longer see updates.
    pub fn replace(&mut self, new: Manifest) -> ManifestResult<()> {
        self.perform_update(new, UpdateKind::Full)
    }

    /// Refresh the manifest with `new`, a partial version of it.
    ///
    /// Periods known by both are updated in place. Periods which can no longer be played are
    /// removed. On error, the manifest is left untouched.
    pub fn update(&mut self, new: Manifest) -> ManifestResult<()> {
        self.perform_update(new, UpdateKind::Partial)
    }

    fn perform_update(&mut self, new: Manifest, kind: UpdateKind) -> ManifestResult<()> {
        let Manifest {
            id: new_id,
            transport,
            is_dynamic,
            is_live,
            is_last_period_known,
            uris,
            lifetime,
            suggested_presentation_delay,
            availability_start_time,
            publish_time,
            clock_offset,
            expired,
            time_bounds,
            periods,
            content_warnings,
            ..
        } = new;

        match kind {
            UpdateKind::Full => {
                replace_periods(&mut self.periods, periods);
                self.time_bounds = time_bounds;
                self.uris = uris;
                self.clock_offset = clock_offset;
            }
            UpdateKind::Partial => {
                update_periods(&mut self.periods, periods)?;
                self.time_bounds.maximum_time_data = time_bounds.maximum_time_data;
                self.update_url = uris.into_iter().next();
            }
        }

        self.availability_start_time = availability_start_time;
        self.expired = expired;
        self.is_dynamic = is_dynamic;
        self.is_live = is_live;
        self.is_last_period_known = is_last_period_known;
        self.lifetime = lifetime;
        self.content_warnings = content_warnings;
        self.suggested_presentation_delay = suggested_presentation_delay;
        self.transport = transport;
        self.publish_time = publish_time;

        if let UpdateKind::Partial = kind {
            self.remove_past_periods();
        }

        tracing::debug!(
            id = %self.id,
            from = %new_id,
            periods = self.periods.len(),
            subscribers = self.subscribers.len(),
            "Manifest updated"
        );
        self.subscribers.emit(ManifestEvent::ManifestUpdate);
        Ok(())
    }

    /// Drop the leading periods ending before the minimum safe position.
    fn remove_past_periods(&mut self) {
        let minimum = self.get_minimum_safe_position();
        let past = self
            .periods
            .iter()
            .take_while(|p| p.end().is_some_and(|end| end <= minimum))
            .count();
        if past > 0 {
            tracing::debug!(count = past, minimum, "Removing periods out of the seekable window");
            self.periods.drain(..past);
        }
    }

    /// Recompute the decipherability of every representation with `is_decipherable`.
    ///
    /// The callback runs on a copy of each representation, with no period locked, so it may read
    /// any period handle. A [`ManifestEvent::DecipherabilityUpdate`] listing the changes is emitted
    /// if at least one representation changed.
    pub fn update_representations_decipherability<F>(&mut self, mut is_decipherable: F)
    where
        F: FnMut(&Representation) -> Decipherability,
    {
        let mut updates = Vec::new();
        for period in &self.periods {
            let candidates: Vec<(AdaptationType, String, Representation)> = {
                let guard = period.read();
                guard
                    .adaptations
                    .iter()
                    .flat_map(|(r#type, adaptations)| {
                        adaptations.iter().flat_map(move |adaptation| {
                            adaptation.representations.iter().map(move |representation| {
                                (*r#type, adaptation.id.clone(), representation.clone())
                            })
                        })
                    })
                    .collect()
            };

            let mut changes = Vec::new();
            for (r#type, adaptation_id, representation) in candidates {
                let decipherable = is_decipherable(&representation);
                if decipherable != representation.decipherable {
                    changes.push((r#type, adaptation_id, representation.id, decipherable));
                }
            }
            if changes.is_empty() {
                continue;
            }

            let mut guard = period.write();
            for (r#type, adaptation_id, representation_id, decipherable) in changes {
                let Some(representation) = guard
                    .adaptations
                    .get_mut(&r#type)
                    .and_then(|adaptations| adaptations.iter_mut().find(|a| a.id == adaptation_id))
                    .and_then(|adaptation| {
                        adaptation
                            .representations
                            .iter_mut()
                            .find(|r| r.id == representation_id)
                    })
                else {
                    continue;
                };
                representation.decipherable = decipherable;
                updates.push(DecipherabilityUpdate {
                    manifest_id: self.id.clone(),
                    period: period.clone(),
                    adaptation_id,
                    adaptation_type: r#type,
                    representation_id,
                    decipherable,
                });
            }
        }

        if updates.is_empty() {
            return;
        }
        tracing::debug!(count = updates.len(), "Decipherability updated");
        self.subscribers
            .emit(ManifestEvent::DecipherabilityUpdate(updates));
    }

    /// Mark every representation protected by one of `key_ids` as not decipherable.
    pub fn add_undecipherable_key_ids(&mut self, key_ids: &[Vec<u8>]) {
        self.update_representations_decipherability(|representation| {
            if key_ids
                .iter()
                .any(|key_id| representation.uses_key_id(key_id))
            {
                Decipherability::NotDecipherable
            } else {
                representation.decipherable
            }
        });
    }

    /// Adaptations of the first period.
    #[deprecated(note = "read the adaptations of a period instead")]
    pub fn adaptations(&self) -> Adaptations {
        warn_deprecated("Manifest::adaptations is deprecated, read the adaptations of a period");
        self.first_period_adaptations()
    }

    #[deprecated(note = "use Period::get_adaptations instead")]
    pub fn get_adaptations(&self) -> Vec<Adaptation> {
        warn_deprecated("Manifest::get_adaptations is deprecated, use Period::get_adaptations");
        self.first_period_adaptations()
            .into_values()
            .flatten()
            .collect()
    }

    #[deprecated(note = "use Period::get_adaptations_for_type instead")]
    pub fn get_adaptations_for_type(&self, r#type: AdaptationType) -> Vec<Adaptation> {
        warn_deprecated(
            "Manifest::get_adaptations_for_type is deprecated, use Period::get_adaptations_for_type",
        );
        self.first_period_adaptations()
            .remove(&r#type)
            .unwrap_or_default()
    }

    #[deprecated(note = "use Period::get_adaptation instead")]
    pub fn get_adaptation(&self, id: &str) -> Option<Adaptation> {
        warn_deprecated("Manifest::get_adaptation is deprecated, use Period::get_adaptation");
        self.first_period_adaptations()
            .into_values()
            .flatten()
            .find(|adaptation| adaptation.id == id)
    }

    fn first_period_adaptations(&self) -> Adaptations {
        self.periods
            .first()
            .map(|period| period.read().adaptations.clone())
            .unwrap_or_default()
    }
}

static DEPRECATION_WARNED: LazyLock<Mutex<HashSet<&'static str>>> =
    LazyLock::new(Default::default);

fn warn_deprecated(message: &'static str) {
    let mut warned = DEPRECATION_WARNED
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if warned.insert(message) {
        tracing::warn!("{message}");
    }
}

fn add_image_track(
    period: &mut Period,
    track: &SupplementaryImageTrack,
    codec_support: Option<&CodecSupportCheck>,
    warnings: &mut Vec<MediaError>,
) {
    let parsed = ParsedAdaptation {
        id: generate_id("gen-image-ada", &IMAGE_ADAPTATION_ID),
        r#type: AdaptationType::Image,
        language: None,
        closed_caption: false,
        is_audio_description: false,
        is_dub: false,
        is_sign_interpreted: false,
        representations: vec![supplementary_representation(
            generate_id("gen-image-rep", &IMAGE_REPRESENTATION_ID),
            &track.mime_type,
            None,
            &track.url,
        )],
    };
    add_supplementary_adaptation(period, parsed, codec_support, warnings);
}

fn add_text_track(
    period: &mut Period,
    track: &SupplementaryTextTrack,
    codec_support: Option<&CodecSupportCheck>,
    warnings: &mut Vec<MediaError>,
) {
    let parsed = ParsedAdaptation {
        id: generate_id("gen-text-ada", &TEXT_ADAPTATION_ID),
        r#type: AdaptationType::Text,
        language: Some(track.language.clone()),
        closed_caption: track.closed_caption,
        is_audio_description: false,
        is_dub: false,
        is_sign_interpreted: false,
        representations: vec![supplementary_representation(
            generate_id("gen-text-rep", &TEXT_REPRESENTATION_ID),
            &track.mime_type,
            track.codecs.clone(),
            &track.url,
        )],
    };
    add_supplementary_adaptation(period, parsed, codec_support, warnings);
}

fn supplementary_representation(
    id: String,
    mime_type: &str,
    codecs: Option<String>,
    url: &str,
) -> ParsedRepresentation {
    ParsedRepresentation {
        id,
        bitrate: 0,
        codecs,
        mime_type: Some(mime_type.to_string()),
        width: None,
        height: None,
        frame_rate: None,
        content_protections: None,
        index: ParsedIndex::Static {
            media: url.to_string(),
        },
    }
}

fn add_supplementary_adaptation(
    period: &mut Period,
    parsed: ParsedAdaptation,
    codec_support: Option<&CodecSupportCheck>,
    warnings: &mut Vec<MediaError>,
) {
    let mut adaptation = Adaptation::new(parsed, None, codec_support, warnings);
    adaptation.manually_added = true;
    if !adaptation.is_supported {
        tracing::warn!(
            adaptation_id = %adaptation.id,
            adaptation_type = %adaptation.r#type,
            "Supplementary track has incompatible codecs"
        );
        warnings.push(MediaError::incompatible_codecs());
    }
    period.add_adaptation(adaptation);
}
