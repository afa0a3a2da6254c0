use std::sync::Arc;

use crate::{
    adaptation::AdaptationType,
    error::{MediaError, MediaErrorCode},
    index::RepresentationIndex,
    parsed::ParsedRepresentation,
};

/// Decides whether a `mimeType;codecs="..."` string can be played for the given track type.
pub type CodecSupportCheck = Arc<dyn Fn(AdaptationType, &str) -> bool + Send + Sync>;

/// Whether the content of a representation can currently be decrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decipherability {
    Decipherable,
    NotDecipherable,
    #[default]
    Unknown,
}

impl Decipherability {
    pub fn is_not_decipherable(&self) -> bool {
        matches!(self, Self::NotDecipherable)
    }
}

impl From<Option<bool>> for Decipherability {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Decipherable,
            Some(false) => Self::NotDecipherable,
            None => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentProtections {
    pub key_ids: Vec<Vec<u8>>,
}

/// One encoded variant of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    pub id: String,
    /// Bits per second.
    pub bitrate: u64,
    pub codec: Option<String>,
    pub mime_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    pub content_protections: Option<ContentProtections>,
    pub decipherable: Decipherability,
    pub is_supported: bool,
    pub index: RepresentationIndex,
}

impl Representation {
    pub(crate) fn new(
        parsed: ParsedRepresentation,
        adaptation_type: AdaptationType,
        codec_support: Option<&CodecSupportCheck>,
        warnings: &mut Vec<MediaError>,
    ) -> Self {
        let content_protections = parsed.content_protections.map(|protections| {
            let key_ids = protections
                .key_ids
                .iter()
                .filter_map(|key_id| match hex::decode(key_id) {
                    Ok(key_id) => Some(key_id),
                    Err(error) => {
                        tracing::warn!(representation_id = %parsed.id, %key_id, %error, "Invalid key id");
                        warnings.push(MediaError::new(
                            MediaErrorCode::ManifestParseError,
                            format!("Invalid key id \"{key_id}\" in representation {}", parsed.id),
                        ));
                        None
                    }
                })
                .collect();
            ContentProtections { key_ids }
        });

        let index = RepresentationIndex::from_parsed(parsed.index, &parsed.id, parsed.bitrate);
        let mut representation = Self {
            id: parsed.id,
            bitrate: parsed.bitrate,
            codec: parsed.codecs,
            mime_type: parsed.mime_type,
            width: parsed.width,
            height: parsed.height,
            frame_rate: parsed.frame_rate,
            content_protections,
            decipherable: Decipherability::Unknown,
            is_supported: true,
            index,
        };
        if let Some(codec_support) = codec_support {
            representation.is_supported =
                codec_support(adaptation_type, &representation.get_mime_type_string());
        }
        representation
    }

    /// `mimeType;codecs="codec"` string describing the media of this representation.
    pub fn get_mime_type_string(&self) -> String {
        format!(
            "{};codecs=\"{}\"",
            self.mime_type.as_deref().unwrap_or_default(),
            self.codec.as_deref().unwrap_or_default()
        )
    }

    pub fn uses_key_id(&self, key_id: &[u8]) -> bool {
        self.content_protections
            .as_ref()
            .is_some_and(|protections| protections.key_ids.iter().any(|k| k == key_id))
    }

    /// Take the manifest-described properties of `new`, keeping the decipherability learned
    /// from the key system.
    pub(crate) fn update_in_place(&mut self, new: Representation) {
        self.index.update(&new.index);
        self.bitrate = new.bitrate;
        self.codec = new.codec;
        self.mime_type = new.mime_type;
        self.width = new.width;
        self.height = new.height;
        self.frame_rate = new.frame_rate;
        self.content_protections = new.content_protections;
        self.is_supported = new.is_supported;
    }
}
