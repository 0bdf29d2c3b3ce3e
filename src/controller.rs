//! The AR object: one model, one video overlay, one lifetime.
//!
//! [`ArObject`] ties the [`AssetPresence`] and the [`VideoOverlay`] together:
//!
//! - `init` builds the overlay and starts the asynchronous model load
//! - the load resolves into [`complete_load`](ArObject::complete_load), which
//!   attaches the hidden model
//! - `reveal(pose)` shows model and overlay at the same pose
//! - `update(dt)` runs every frame: clip playback, text idle animation and
//!   keeping the overlay locked to the model
//!
//! Every operation is safe to call in any order; calls that arrive too early are
//! no-ops or return an [`ArError`].

use instant::Duration;

use crate::{
    context::Context,
    data_structures::{
        instance::Pose,
        overlay::{PlaybackState, VideoOverlay},
        presence::AssetPresence,
    },
    error::{ArError, LoadError, PlaybackError},
    flow::{Flow, Mutation, Out, Pending},
    resources::{AssetLoader, LoadedAsset, video::VideoSource},
};

pub struct ArObject {
    ctx: Context,
    loader: Box<dyn AssetLoader>,
    presence: AssetPresence,
    overlay: VideoOverlay,
    elapsed: f64,
}

impl ArObject {
    pub fn new(ctx: Context, loader: Box<dyn AssetLoader>, video: Box<dyn VideoSource>) -> Self {
        Self {
            ctx,
            loader,
            presence: AssetPresence::new(),
            overlay: VideoOverlay::new(video),
            elapsed: 0.0,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn presence(&self) -> &AssetPresence {
        &self.presence
    }

    pub fn overlay(&self) -> &VideoOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut VideoOverlay {
        &mut self.overlay
    }

    /// Total seconds passed to [`update`](Self::update) so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Constructs the overlay and starts the model load.
    pub fn init(&mut self) -> Out<Self> {
        let mut pending: Vec<Pending<Self>> = Vec::new();
        match self.overlay.construct(&self.ctx) {
            Ok(playback) => pending.push(Box::pin(async move {
                let result = playback.await;
                Box::new(move |obj: &mut ArObject| obj.playback_settled(result)) as Mutation<Self>
            })),
            Err(e) => log::warn!("init: {}", e),
        }
        if let Some(load) = self.load() {
            pending.push(load);
        }
        Out::FutFn(pending)
    }

    /**
     * Starts the single model load.
     *
     * Returns `None` (and logs) when a load is already in flight or done. The
     * returned future does not borrow `self`; its mutation calls
     * [`complete_load`](Self::complete_load).
     */
    pub fn load(&mut self) -> Option<Pending<Self>> {
        if let Err(e) = self.presence.begin_load() {
            log::warn!("load ignored: {}", e);
            return None;
        }
        self.ctx.indicator.show();
        let url = self.ctx.config.asset_url.clone();
        log::info!("loading {}", url);
        let load = self.loader.load(&url);
        Some(Box::pin(async move {
            let result = load.await;
            Box::new(move |obj: &mut ArObject| {
                if let Err(e) = obj.complete_load(result) {
                    log::warn!("model unavailable: {}", e);
                }
            }) as Mutation<Self>
        }))
    }

    /**
     * Applies the load outcome and hides the loading indicator.
     *
     * A completion without a matching [`load`](Self::load) is rejected with
     * [`ArError::NoLoadInFlight`] and leaves model, scene and indicator alone.
     */
    pub fn complete_load(&mut self, result: Result<LoadedAsset, LoadError>) -> Result<(), ArError> {
        let outcome = self.presence.settle(&self.ctx, result);
        match &outcome {
            Err(ArError::NoLoadInFlight) => {
                log::warn!("ignoring stray load completion for {}", self.ctx.config.asset_url);
                return outcome;
            }
            Ok(()) => log::info!("model {} ready", self.ctx.config.asset_url),
            Err(ArError::SessionClosed) => {
                log::warn!("scene is gone, discarding {}", self.ctx.config.asset_url)
            }
            Err(e) => {
                log::error!("model loading failed: {}", e);
                self.ctx
                    .errors
                    .report(&format!("Error: model loading failed. {}", e));
            }
        }
        self.ctx.indicator.hide();
        outcome
    }

    pub fn playback_settled(&mut self, result: Result<(), PlaybackError>) {
        if let Err(e) = &result {
            self.ctx
                .errors
                .report(&format!("Failed to start video playback: {}", e));
        }
        self.overlay.playback_settled(result);
    }

    /**
     * Shows model and overlay at `pose`.
     *
     * Before the model is loaded this changes nothing and returns
     * [`ArError::NotLoaded`]. Calling it again with the same pose leaves the
     * scene exactly as one call would.
     */
    pub fn reveal(&mut self, pose: &Pose) -> Result<(), ArError> {
        if self.presence.model().is_none() {
            log::warn!("reveal requested before the model finished loading");
            return Err(ArError::NotLoaded {
                operation: "reveal",
            });
        }
        if self.overlay.mesh().is_none() {
            log::warn!("reveal requested before init");
            return Err(ArError::NoOverlay {
                operation: "reveal",
            });
        }
        self.presence.reveal(pose)?;
        self.overlay.reveal(&self.ctx, pose)
    }

    pub fn update(&mut self, dt: Duration) {
        self.elapsed += dt.as_secs_f64();
        self.presence.update(dt.as_secs_f32(), self.elapsed);
        let model = self.presence.transform();
        self.overlay.sync_to_model(model.as_ref());
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.overlay.state()
    }
}

impl Flow for ArObject {
    fn on_init(&mut self) -> Out<Self> {
        self.init()
    }

    fn on_update(&mut self, dt: Duration) -> Out<Self> {
        self.update(dt);
        Out::Empty
    }
}
