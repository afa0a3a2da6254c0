use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    error::MediaError,
    parsed::ParsedAdaptation,
    representation::{CodecSupportCheck, Representation},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptationType {
    Audio,
    Video,
    Text,
    Image,
}

impl AdaptationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for AdaptationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a representation filter knows about the track a representation belongs to.
#[derive(Debug, Clone)]
pub struct RepresentationFilterContext<'a> {
    pub buffer_type: AdaptationType,
    pub language: Option<&'a str>,
    pub is_closed_caption: bool,
    pub is_dub: bool,
    pub is_audio_description: bool,
    pub is_sign_interpreted: bool,
}

/// Returns `false` for representations that should not be part of the manifest.
pub type RepresentationFilter =
    Arc<dyn Fn(&Representation, &RepresentationFilterContext<'_>) -> bool + Send + Sync>;

/// A set of interchangeable representations of the same track.
#[derive(Debug, Clone, PartialEq)]
pub struct Adaptation {
    pub id: String,
    pub r#type: AdaptationType,
    pub language: Option<String>,
    pub is_closed_caption: bool,
    pub is_audio_description: bool,
    pub is_dub: bool,
    pub is_sign_interpreted: bool,
    /// `true` when at least one representation has a supported codec.
    pub is_supported: bool,
    /// Added by the application instead of coming from the manifest.
    pub manually_added: bool,
    /// Sorted by ascending bitrate.
    pub representations: Vec<Representation>,
}

impl Adaptation {
    pub(crate) fn new(
        parsed: ParsedAdaptation,
        representation_filter: Option<&RepresentationFilter>,
        codec_support: Option<&CodecSupportCheck>,
        warnings: &mut Vec<MediaError>,
    ) -> Self {
        let mut representations = Vec::with_capacity(parsed.representations.len());
        for parsed_representation in parsed.representations {
            let representation =
                Representation::new(parsed_representation, parsed.r#type, codec_support, warnings);

            let keep = representation_filter.map_or(true, |filter| {
                filter(
                    &representation,
                    &RepresentationFilterContext {
                        buffer_type: parsed.r#type,
                        language: parsed.language.as_deref(),
                        is_closed_caption: parsed.closed_caption,
                        is_dub: parsed.is_dub,
                        is_audio_description: parsed.is_audio_description,
                        is_sign_interpreted: parsed.is_sign_interpreted,
                    },
                )
            });
            if keep {
                representations.push(representation);
            } else {
                tracing::debug!(representation_id = %representation.id, "Representation filtered out");
            }
        }
        representations.sort_by_key(|r| r.bitrate);

        Self {
            id: parsed.id,
            r#type: parsed.r#type,
            language: parsed.language,
            is_closed_caption: parsed.closed_caption,
            is_audio_description: parsed.is_audio_description,
            is_dub: parsed.is_dub,
            is_sign_interpreted: parsed.is_sign_interpreted,
            is_supported: representations.iter().any(|r| r.is_supported),
            manually_added: false,
            representations,
        }
    }

    pub fn get_representation(&self, id: &str) -> Option<&Representation> {
        self.representations.iter().find(|r| r.id == id)
    }

    /// Representations that are both supported and not known to be undecipherable.
    pub fn get_playable_representations(&self) -> Vec<&Representation> {
        self.representations
            .iter()
            .filter(|r| r.is_supported && !r.decipherable.is_not_decipherable())
            .collect()
    }

    /// Distinct bitrates of the representations that can be decrypted, ascending.
    pub fn get_available_bitrates(&self) -> Vec<u64> {
        let mut bitrates: Vec<u64> = self
            .representations
            .iter()
            .filter(|r| !r.decipherable.is_not_decipherable())
            .map(|r| r.bitrate)
            .collect();
        bitrates.sort_unstable();
        bitrates.dedup();
        bitrates
    }

    pub(crate) fn update_in_place(&mut self, new: Adaptation) {
        let mut old_representations = std::mem::take(&mut self.representations);
        self.representations = new
            .representations
            .into_iter()
            .map(|representation| {
                match old_representations
                    .iter()
                    .position(|old| old.id == representation.id)
                {
                    Some(position) => {
                        let mut old = old_representations.swap_remove(position);
                        old.update_in_place(representation);
                        old
                    }
                    None => representation,
                }
            })
            .collect();

        self.r#type = new.r#type;
        self.language = new.language;
        self.is_closed_caption = new.is_closed_caption;
        self.is_audio_description = new.is_audio_description;
        self.is_dub = new.is_dub;
        self.is_sign_interpreted = new.is_sign_interpreted;
        self.is_supported = new.is_supported;
        self.manually_added = new.manually_added;
    }
}
