//! JavaScript bindings for browser AR hosts.
//!
//! The host keeps running its own camera pipeline and renderer. Once per frame
//! it calls [`WebSession::frame`] (or `tick`) and copies the matrices and
//! visibility flags it reads back onto its own objects.

use std::{cell::RefCell, rc::Rc};

use instant::Duration;
use wasm_bindgen::prelude::*;

use crate::{
    context::{ArConfig, Context},
    controller::ArObject,
    data_structures::{
        instance::{Pose, Transform},
        scene_graph::{self, NodeRef},
    },
    flow::{Session, init_logging},
    host::{AlertErrorSurface, LogIndicator, SceneRoot},
    resources::{GltfLoader, video::HtmlVideoSource},
};

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn flatten(transform: &Transform) -> Vec<f32> {
    let matrix: [[f32; 4]; 4] = transform.to_matrix().into();
    matrix.iter().flatten().copied().collect()
}

#[wasm_bindgen]
pub struct WebSession {
    scene: Rc<RefCell<SceneRoot>>,
    video: web_sys::HtmlVideoElement,
    session: Session<ArObject>,
}

#[wasm_bindgen]
impl WebSession {
    /// Creates the AR object, builds the overlay and starts loading the model.
    #[wasm_bindgen(constructor)]
    pub fn new(asset_url: String, video_url: String) -> Result<WebSession, JsValue> {
        init_logging();
        let config = ArConfig::default()
            .with_asset_url(asset_url)
            .with_video_url(video_url);
        let scene = Rc::new(RefCell::new(SceneRoot::new()));
        let source = HtmlVideoSource::new(&config.video_url).map_err(to_js_error)?;
        let video = source.element().clone();
        let loader = GltfLoader::new(config.asset_root.clone());
        let ctx = Context::with_collaborators(
            config,
            &scene,
            Box::new(LogIndicator),
            Box::new(AlertErrorSurface),
        );
        let mut session = Session::new(ArObject::new(ctx, Box::new(loader), Box::new(source)));
        session.init();
        Ok(Self {
            scene,
            video,
            session,
        })
    }

    pub fn tick(&mut self) {
        self.session.tick();
    }

    pub fn frame(&mut self, dt_seconds: f32) {
        // NaN, negative or infinite deltas from JS count as an empty frame
        let dt = Duration::try_from_secs_f32(dt_seconds).unwrap_or_default();
        self.session.frame(dt);
    }

    /// `position` and `scale` are `[x, y, z]`, `rotation` is a quaternion `[x, y, z, w]`.
    pub fn reveal(
        &mut self,
        position: Vec<f32>,
        rotation: Vec<f32>,
        scale: Vec<f32>,
    ) -> Result<(), JsValue> {
        let (&[px, py, pz], &[qx, qy, qz, qw], &[sx, sy, sz]) =
            (position.as_slice(), rotation.as_slice(), scale.as_slice())
        else {
            return Err(JsValue::from_str(
                "expected position[3], rotation[4] and scale[3]",
            ));
        };
        let pose = Pose::from_parts(
            [px, py, pz],
            cgmath::Quaternion::new(qw, qx, qy, qz),
            [sx, sy, sz],
        );
        self.session.flow_mut().reveal(&pose).map_err(to_js_error)
    }

    /// Column-major world matrix of the named model node, once the model is loaded.
    pub fn node_matrix(&self, name: &str) -> Option<Vec<f32>> {
        let root = self.model_root()?;
        scene_graph::world_transforms(&root, &Transform::new())
            .get(name)
            .map(flatten)
    }

    pub fn model_matrix(&self) -> Option<Vec<f32>> {
        self.session.flow().presence().transform().as_ref().map(flatten)
    }

    pub fn model_visible(&self) -> bool {
        self.model_root()
            .map(|root| root.borrow().visible)
            .unwrap_or(false)
    }

    pub fn overlay_matrix(&self) -> Option<Vec<f32>> {
        let mesh = self.session.flow().overlay().mesh()?;
        let transform = mesh.node.borrow().transform;
        Some(flatten(&transform))
    }

    pub fn overlay_visible(&self) -> bool {
        self.session
            .flow()
            .overlay()
            .mesh()
            .map(|mesh| mesh.node.borrow().visible)
            .unwrap_or(false)
    }

    /// Whether the host should re-upload the video frame this frame.
    pub fn take_video_refresh(&mut self) -> bool {
        self.session
            .flow_mut()
            .overlay_mut()
            .mesh_mut()
            .map(|mesh| mesh.texture.take_needs_update())
            .unwrap_or(false)
    }

    pub fn video_element(&self) -> web_sys::HtmlVideoElement {
        self.video.clone()
    }

    pub fn attached_nodes(&self) -> usize {
        self.scene.borrow().nodes().len()
    }
}

impl WebSession {
    fn model_root(&self) -> Option<NodeRef> {
        self.session
            .flow()
            .presence()
            .model()
            .map(|model| model.root.clone())
    }
}
