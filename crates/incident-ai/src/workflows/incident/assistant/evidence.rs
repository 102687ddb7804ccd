use mime::Mime;

pub(crate) const AUDIO_PLACEHOLDER: &str =
    "AI analysis for audio files is in development. The file has been logged as evidence.";
pub(crate) const VIDEO_PLACEHOLDER: &str =
    "AI analysis for video files is in development. The file has been logged as evidence.";
pub(crate) const IMAGE_FALLBACK: &str = "AI analysis could not be generated for this file.";
pub(crate) const DOCUMENT_FALLBACK: &str =
    "AI analysis could not be generated for this document's metadata.";

/// How an evidence file is summarized, chosen from its MIME type. First match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceStrategy {
    /// Multimodal request carrying the image itself.
    Image,
    /// Metadata-only request; the document body is never sent.
    Document,
    Audio,
    Video,
    Unsupported(String),
}

impl EvidenceStrategy {
    pub fn for_mime(mime_type: &str) -> Self {
        let Ok(parsed) = mime_type.trim().parse::<Mime>() else {
            return Self::Unsupported(mime_type.to_string());
        };

        let top_level = parsed.type_();
        if top_level == mime::IMAGE {
            Self::Image
        } else if mime_type.trim() == mime::APPLICATION_PDF.essence_str() {
            Self::Document
        } else if top_level == mime::AUDIO {
            Self::Audio
        } else if top_level == mime::VIDEO {
            Self::Video
        } else {
            Self::Unsupported(mime_type.to_string())
        }
    }

    /// Whether the strategy needs a model call.
    pub fn calls_model(&self) -> bool {
        matches!(self, Self::Image | Self::Document)
    }

    /// Fixed text for strategies that never reach the model.
    pub fn placeholder(&self) -> Option<String> {
        match self {
            Self::Audio => Some(AUDIO_PLACEHOLDER.to_string()),
            Self::Video => Some(VIDEO_PLACEHOLDER.to_string()),
            Self::Unsupported(mime_type) => Some(format!(
                "Analysis for '{mime_type}' files is not yet supported."
            )),
            Self::Image | Self::Document => None,
        }
    }
}
