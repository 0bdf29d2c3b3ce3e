//! Error types for loading, playback and lifecycle misuse.
//!
//! None of these ever escape to the host render loop as a panic; operations
//! return them and the controller reports them through the error surface.

use thiserror::Error;

/// The asset could not be fetched or parsed.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch asset {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("malformed glTF asset: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF buffer {index} is missing its binary blob")]
    MissingBlob { index: usize },
    #[error("glTF buffer {index} uses an unsupported data URI")]
    BufferFormatUnsupported { index: usize },
    #[error("failed to decode base64 buffer data: {0}")]
    Base64Decode(#[from] base64::DecodeError),
    #[error("asset declares no scene")]
    NoScene,
    #[error("asset loader failed: {0}")]
    Loader(String),
}

/// Media playback could not be started.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("autoplay was blocked: {0}")]
    Blocked(String),
    #[error("video source {0} has no frames")]
    NoFrames(String),
    #[error("video source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum ArError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("{operation} called before the model finished loading")]
    NotLoaded { operation: &'static str },
    #[error("{operation} called before the overlay was constructed")]
    NoOverlay { operation: &'static str },
    #[error("the overlay is already constructed")]
    OverlayConstructed,
    #[error("a model load is already in flight")]
    LoadInFlight,
    #[error("the model has already been loaded")]
    AlreadyLoaded,
    #[error("load completion arrived without a load in flight")]
    NoLoadInFlight,
    #[error("the host scene was torn down before the load completed")]
    SessionClosed,
}
