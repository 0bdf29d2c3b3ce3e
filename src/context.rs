use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    data_structures::scene_graph::NodeRef,
    error::ArError,
    host::{ErrorSurface, HostScene, LoadingIndicator, LogErrorSurface, LogIndicator},
};

/// Static configuration of the AR object.
#[derive(Clone, Debug)]
pub struct ArConfig {
    /// Origin-absolute path of the 3D asset.
    pub asset_url: String,
    /// Origin-absolute path of the video shown on the overlay.
    pub video_url: String,
    /// Directory native loaders resolve URLs against.
    pub asset_root: String,
    /// Width and height of the overlay quad in world units.
    pub overlay_size: [f32; 2],
    /// Where the overlay sits before the model is revealed.
    pub overlay_position: [f32; 3],
    pub overlay_visible_on_init: bool,
    /// Sub-node hidden on load.
    pub placeholder_node: String,
    /// Sub-node that gets the idle spin/bob animation.
    pub text_node: String,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            asset_url: "/models/immersaltest.glb".to_string(),
            video_url: "/video/kyoto-takenosato.mp4".to_string(),
            asset_root: "assets".to_string(),
            overlay_size: [0.2, 0.2],
            overlay_position: [1.0, 0.5, 0.0],
            overlay_visible_on_init: false,
            placeholder_node: "Node".to_string(),
            text_node: "Text_Sofa".to_string(),
        }
    }
}

impl ArConfig {
    pub fn with_asset_url(mut self, url: impl Into<String>) -> Self {
        self.asset_url = url.into();
        self
    }

    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = url.into();
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<String>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_overlay_size(mut self, width: f32, height: f32) -> Self {
        self.overlay_size = [width, height];
        self
    }

    pub fn with_overlay_visible_on_init(mut self, visible: bool) -> Self {
        self.overlay_visible_on_init = visible;
        self
    }
}

/**
 * Everything the controller talks to: configuration, the host scene and the
 * UI collaborators.
 *
 * The scene is held weakly. The host owns it and may tear it down at any
 * time, including while a load is still pending.
 */
pub struct Context {
    pub config: ArConfig,
    scene: Weak<RefCell<dyn HostScene>>,
    pub indicator: Box<dyn LoadingIndicator>,
    pub errors: Box<dyn ErrorSurface>,
}

impl Context {
    /// A context that logs progress and failures.
    pub fn new<S: HostScene + 'static>(config: ArConfig, scene: &Rc<RefCell<S>>) -> Self {
        Self::with_collaborators(
            config,
            scene,
            Box::new(LogIndicator),
            Box::new(LogErrorSurface),
        )
    }

    pub fn with_collaborators<S: HostScene + 'static>(
        config: ArConfig,
        scene: &Rc<RefCell<S>>,
        indicator: Box<dyn LoadingIndicator>,
        errors: Box<dyn ErrorSurface>,
    ) -> Self {
        let scene: Rc<RefCell<dyn HostScene>> = scene.clone();
        Self {
            config,
            scene: Rc::downgrade(&scene),
            indicator,
            errors,
        }
    }

    pub fn scene_alive(&self) -> bool {
        self.scene.strong_count() > 0
    }

    /// Attaches `node` unless it already is. Fails once the host dropped its scene.
    pub fn attach(&self, node: &NodeRef) -> Result<(), ArError> {
        let scene = self.scene.upgrade().ok_or(ArError::SessionClosed)?;
        let mut scene = scene.borrow_mut();
        if !scene.is_attached(node) {
            scene.attach(node.clone());
        }
        Ok(())
    }
}
