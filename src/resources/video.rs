//! Media sources that feed the overlay's video texture.
//!
//! The overlay only needs two things from a source: a way to start looped,
//! muted playback and (on native targets) the frame to show right now. On the
//! web the browser owns decoding and the renderer samples the `<video>` element
//! directly, so [`VideoSource::current_frame`] returns `None` there.

use std::{future::Future, pin::Pin};

use instant::Instant;

use crate::error::PlaybackError;

pub type VideoFrame = image::RgbaImage;

pub type PlaybackFuture = Pin<Box<dyn Future<Output = Result<(), PlaybackError>>>>;

pub trait VideoSource {
    fn url(&self) -> &str;

    /// Starts playback. Called exactly once, when the overlay is constructed.
    fn play(&mut self) -> PlaybackFuture;

    fn current_frame(&self) -> Option<VideoFrame> {
        None
    }
}

/// Decoded frames cycled at a fixed rate, for native hosts.
pub struct LoopingFrames {
    url: String,
    frames: Vec<VideoFrame>,
    fps: f32,
    started: Option<Instant>,
}

impl LoopingFrames {
    pub fn new(url: impl Into<String>, frames: Vec<VideoFrame>, fps: f32) -> Self {
        Self {
            url: url.into(),
            frames,
            fps,
            started: None,
        }
    }

    /// Decodes encoded images (PNG, JPEG, ...) into frames.
    pub fn from_encoded(
        url: impl Into<String>,
        encoded: &[Vec<u8>],
        fps: f32,
    ) -> anyhow::Result<Self> {
        let frames = encoded
            .iter()
            .map(|bytes| Ok(image::load_from_memory(bytes)?.to_rgba8()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self::new(url, frames, fps))
    }

    pub fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    /// Index of the frame shown `elapsed` seconds after playback started.
    pub fn frame_index(&self, elapsed: f32) -> usize {
        if self.frames.is_empty() {
            return 0;
        }
        let frame = (elapsed.max(0.0) * self.fps.max(0.0)) as usize;
        frame % self.frames.len()
    }
}

impl VideoSource for LoopingFrames {
    fn url(&self) -> &str {
        &self.url
    }

    fn play(&mut self) -> PlaybackFuture {
        let result = if self.frames.is_empty() {
            Err(PlaybackError::NoFrames(self.url.clone()))
        } else {
            self.started = Some(Instant::now());
            Ok(())
        };
        Box::pin(async move { result })
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        let started = self.started?;
        let index = self.frame_index(started.elapsed().as_secs_f32());
        self.frames.get(index).cloned()
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::HtmlVideoSource;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsCast;

    use super::{PlaybackFuture, VideoSource};
    use crate::error::PlaybackError;

    /// A detached `<video>` element set to autoplay, loop and muted playback.
    pub struct HtmlVideoSource {
        url: String,
        element: web_sys::HtmlVideoElement,
    }

    impl HtmlVideoSource {
        pub fn new(url: &str) -> Result<Self, PlaybackError> {
            let document = web_sys::window()
                .and_then(|window| window.document())
                .ok_or_else(|| PlaybackError::Unavailable("no document".to_string()))?;
            let element = document
                .create_element("video")
                .map_err(|e| PlaybackError::Unavailable(format!("{:?}", e)))?
                .dyn_into::<web_sys::HtmlVideoElement>()
                .map_err(|_| PlaybackError::Unavailable("not a video element".to_string()))?;
            element.set_cross_origin(Some("anonymous"));
            element.set_src(url);
            element.set_autoplay(true);
            element.set_loop(true);
            // muted autoplay is the only kind mobile browsers allow
            element.set_muted(true);
            element
                .set_attribute("playsinline", "")
                .map_err(|e| PlaybackError::Unavailable(format!("{:?}", e)))?;
            Ok(Self {
                url: url.to_string(),
                element,
            })
        }

        pub fn element(&self) -> &web_sys::HtmlVideoElement {
            &self.element
        }
    }

    impl VideoSource for HtmlVideoSource {
        fn url(&self) -> &str {
            &self.url
        }

        fn play(&mut self) -> PlaybackFuture {
            let promise = self.element.play();
            Box::pin(async move {
                let promise = promise.map_err(|e| PlaybackError::Blocked(format!("{:?}", e)))?;
                wasm_bindgen_futures::JsFuture::from(promise)
                    .await
                    .map(|_| ())
                    .map_err(|e| PlaybackError::Blocked(format!("{:?}", e)))
            })
        }
    }
}
