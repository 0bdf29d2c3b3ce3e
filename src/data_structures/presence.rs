//! The loaded model: load state, visibility, clip playback and idle animation.

use cgmath::Rotation3;

use crate::{
    context::Context,
    data_structures::{
        instance::{Pose, Transform},
        scene_graph::{self, NodeRef},
    },
    error::{ArError, LoadError},
    resources::{LoadedAsset, animation::AnimationPlayer},
};

/// Spin applied to the text node every frame, in radians about its local Z.
pub const TEXT_SPIN_PER_FRAME: f32 = 0.01;

/// Vertical position of the text node `elapsed` seconds into the session.
pub fn text_bob_height(elapsed: f64) -> f32 {
    ((elapsed * 2.0).sin() * 0.2 - 0.8) as f32
}

pub struct Model {
    pub root: NodeRef,
    pub text: Option<NodeRef>,
    pub player: Option<AnimationPlayer>,
}

pub enum LoadState {
    NotStarted,
    InFlight,
    Ready(Model),
    Failed,
}

pub struct AssetPresence {
    state: LoadState,
}

impl AssetPresence {
    pub fn new() -> Self {
        Self {
            state: LoadState::NotStarted,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn model(&self) -> Option<&Model> {
        match &self.state {
            LoadState::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, LoadState::InFlight)
    }

    /// World transform of the model root, once loaded.
    pub fn transform(&self) -> Option<Transform> {
        self.model().map(|model| model.root.borrow().transform)
    }

    /// Marks a load as started. Only one load per lifetime is allowed.
    pub fn begin_load(&mut self) -> Result<(), ArError> {
        match self.state {
            LoadState::NotStarted => {
                self.state = LoadState::InFlight;
                Ok(())
            }
            LoadState::InFlight => Err(ArError::LoadInFlight),
            LoadState::Ready(_) | LoadState::Failed => Err(ArError::AlreadyLoaded),
        }
    }

    /**
     * Applies the outcome of the load.
     *
     * On success the root is hidden, the placeholder node suppressed, the text
     * node captured, the root attached to the host scene and the first clip
     * started. Any failure leaves the presence inert in `Failed`. Without a
     * load in flight nothing is touched and `NoLoadInFlight` is returned.
     */
    pub fn settle(
        &mut self,
        ctx: &Context,
        result: Result<LoadedAsset, LoadError>,
    ) -> Result<(), ArError> {
        if !self.is_in_flight() {
            return Err(ArError::NoLoadInFlight);
        }
        self.state = LoadState::Failed;
        let asset = result?;
        if !ctx.scene_alive() {
            return Err(ArError::SessionClosed);
        }

        let config = &ctx.config;
        asset.root.borrow_mut().visible = false;
        let mut text = None;
        scene_graph::traverse(&asset.root, &mut |node| {
            let name = node.borrow().name.clone();
            if name == config.placeholder_node {
                node.borrow_mut().visible = false;
            }
            if name == config.text_node {
                text = Some(node.clone());
            }
        });

        ctx.attach(&asset.root)?;

        let player = asset.clips.into_iter().next().map(|clip| {
            log::info!("playing clip {}", clip.name);
            AnimationPlayer::new(clip, &asset.nodes)
        });
        if text.is_none() {
            log::info!("asset has no {} node", config.text_node);
        }
        self.state = LoadState::Ready(Model {
            root: asset.root,
            text,
            player,
        });
        Ok(())
    }

    pub fn reveal(&mut self, pose: &Pose) -> Result<(), ArError> {
        let LoadState::Ready(model) = &self.state else {
            return Err(ArError::NotLoaded {
                operation: "reveal",
            });
        };
        let mut root = model.root.borrow_mut();
        root.visible = true;
        root.copy_pose(pose);
        Ok(())
    }

    /// Advances the clip by `dt` seconds and animates the text node. No-op until loaded.
    pub fn update(&mut self, dt: f32, elapsed: f64) {
        let LoadState::Ready(model) = &mut self.state else {
            return;
        };
        if let Some(player) = model.player.as_mut() {
            player.advance(dt);
        }
        if let Some(text) = &model.text {
            let mut text = text.borrow_mut();
            let spin = cgmath::Quaternion::from_angle_z(cgmath::Rad(-TEXT_SPIN_PER_FRAME));
            text.transform.rotation = text.transform.rotation * spin;
            text.transform.position.y = text_bob_height(elapsed);
        }
    }
}

impl Default for AssetPresence {
    fn default() -> Self {
        Self::new()
    }
}
