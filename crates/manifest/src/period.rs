use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    adaptation::{Adaptation, AdaptationType, RepresentationFilter},
    error::{MediaError, MediaErrorCode},
    parsed::ParsedPeriod,
    representation::CodecSupportCheck,
};

pub type Adaptations = BTreeMap<AdaptationType, Vec<Adaptation>>;

/// A time-bounded section of the content.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub id: String,
    /// Seconds.
    pub start: f64,
    pub duration: Option<f64>,
    /// `start + duration`, `None` while the period is still growing.
    pub end: Option<f64>,
    pub adaptations: Adaptations,
}

impl Period {
    pub(crate) fn new(
        parsed: ParsedPeriod,
        representation_filter: Option<&RepresentationFilter>,
        codec_support: Option<&CodecSupportCheck>,
        warnings: &mut Vec<MediaError>,
    ) -> Self {
        let duration = parsed.duration.map(|duration| {
            if duration < 0. {
                tracing::warn!(period_id = %parsed.id, duration, "Period ends before it starts");
                warnings.push(MediaError::new(
                    MediaErrorCode::ManifestParseError,
                    format!("Period {} has a negative duration", parsed.id),
                ));
                0.
            } else {
                duration
            }
        });

        let mut adaptations = Adaptations::new();
        for (r#type, parsed_adaptations) in parsed.adaptations {
            for parsed_adaptation in parsed_adaptations {
                if parsed_adaptation.r#type != r#type {
                    tracing::warn!(
                        adaptation_id = %parsed_adaptation.id,
                        adaptation_type = %parsed_adaptation.r#type,
                        listed_as = %r#type,
                        "Adaptation listed under another type"
                    );
                    warnings.push(MediaError::new(
                        MediaErrorCode::ManifestParseError,
                        format!(
                            "Adaptation {} of type {} is listed under {}",
                            parsed_adaptation.id, parsed_adaptation.r#type, r#type
                        ),
                    ));
                }

                let adaptation = Adaptation::new(
                    parsed_adaptation,
                    representation_filter,
                    codec_support,
                    warnings,
                );
                if adaptation.representations.is_empty() {
                    tracing::debug!(adaptation_id = %adaptation.id, "Adaptation without representation dropped");
                    continue;
                }
                if !adaptation.is_supported {
                    warnings.push(MediaError::incompatible_codecs());
                }
                adaptations
                    .entry(adaptation.r#type)
                    .or_default()
                    .push(adaptation);
            }
        }

        Self {
            id: parsed.id,
            start: parsed.start,
            duration,
            end: duration.map(|duration| parsed.start + duration),
            adaptations,
        }
    }

    /// Every adaptation of the period, ordered by type.
    pub fn get_adaptations(&self) -> Vec<&Adaptation> {
        self.adaptations.values().flatten().collect()
    }

    pub fn get_adaptations_for_type(&self, r#type: AdaptationType) -> &[Adaptation] {
        self.adaptations
            .get(&r#type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn get_adaptation(&self, id: &str) -> Option<&Adaptation> {
        self.adaptations.values().flatten().find(|a| a.id == id)
    }

    /// Adaptations with at least one supported representation.
    pub fn get_supported_adaptations(&self, r#type: Option<AdaptationType>) -> Vec<&Adaptation> {
        match r#type {
            Some(r#type) => self
                .get_adaptations_for_type(r#type)
                .iter()
                .filter(|a| a.is_supported)
                .collect(),
            None => self
                .adaptations
                .values()
                .flatten()
                .filter(|a| a.is_supported)
                .collect(),
        }
    }

    /// Whether `time` is in `[start, end)`, an unknown end being unbounded.
    pub fn contains_time(&self, time: f64) -> bool {
        time >= self.start && self.end.map_or(true, |end| time < end)
    }

    pub(crate) fn add_adaptation(&mut self, adaptation: Adaptation) {
        self.adaptations
            .entry(adaptation.r#type)
            .or_default()
            .push(adaptation);
    }

    /// Overwrite this period with `new`, keeping the state learned on the representations both
    /// have in common.
    pub(crate) fn update_in_place(&mut self, new: Period) {
        let mut old_adaptations = std::mem::take(&mut self.adaptations);
        self.adaptations = new
            .adaptations
            .into_iter()
            .map(|(r#type, adaptations)| {
                let old_for_type = old_adaptations.entry(r#type).or_default();
                let adaptations = adaptations
                    .into_iter()
                    .map(|adaptation| {
                        match old_for_type.iter().position(|old| old.id == adaptation.id) {
                            Some(position) => {
                                let mut old = old_for_type.swap_remove(position);
                                old.update_in_place(adaptation);
                                old
                            }
                            None => adaptation,
                        }
                    })
                    .collect();
                (r#type, adaptations)
            })
            .collect();

        self.id = new.id;
        self.start = new.start;
        self.duration = new.duration;
        self.end = new.end;
    }
}

/// Handle to a [`Period`] shared with the rest of the player.
///
/// Cloning the handle does not clone the period: every clone observes the in-place updates done
/// by the manifest on refresh.
#[derive(Debug, Clone)]
pub struct SharedPeriod(Arc<RwLock<Period>>);

impl SharedPeriod {
    pub fn new(period: Period) -> Self {
        Self(Arc::new(RwLock::new(period)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Period> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Period> {
        self.0
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether both handles point to the same period.
    pub fn ptr_eq(&self, other: &SharedPeriod) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> String {
        self.read().id.clone()
    }

    pub fn start(&self) -> f64 {
        self.read().start
    }

    pub fn end(&self) -> Option<f64> {
        self.read().end
    }

    /// Copy of the current state of the period.
    pub fn snapshot(&self) -> Period {
        self.read().clone()
    }

    pub(crate) fn update_in_place(&self, new: Period) {
        self.write().update_in_place(new);
    }

    /// Take the period out of the handle. It is copied when other handles are still alive.
    pub(crate) fn into_period(self) -> Period {
        match Arc::try_unwrap(self.0) {
            Ok(lock) => lock
                .into_inner()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
            Err(shared) => Self(shared).snapshot(),
        }
    }
}
