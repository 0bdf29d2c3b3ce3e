#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use flow_ar::{
    context::{ArConfig, Context},
    controller::ArObject,
    data_structures::{
        instance::Transform,
        scene_graph::{Node, NodeRef},
    },
    error::{LoadError, PlaybackError},
    flow::Out,
    host::{ErrorSurface, LoadingIndicator, SceneRoot},
    resources::{
        AssetLoader, LoadFuture, LoadedAsset,
        animation::{AnimationClip, Channel, Interpolation, Keyframes},
        video::{PlaybackFuture, VideoSource},
    },
};
use futures::channel::oneshot;

/// Counts `show`/`hide` calls.
#[derive(Clone, Default)]
pub struct RecordingIndicator {
    pub shows: Rc<Cell<u32>>,
    pub hides: Rc<Cell<u32>>,
}

impl LoadingIndicator for RecordingIndicator {
    fn show(&mut self) {
        self.shows.set(self.shows.get() + 1);
    }

    fn hide(&mut self) {
        self.hides.set(self.hides.get() + 1);
    }
}

#[derive(Clone, Default)]
pub struct RecordingErrors {
    pub messages: Rc<RefCell<Vec<String>>>,
}

impl ErrorSurface for RecordingErrors {
    fn report(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// Resolves immediately with a prepared result.
pub struct ScriptedLoader {
    result: RefCell<Option<Result<LoadedAsset, LoadError>>>,
    pub calls: Rc<Cell<u32>>,
}

impl ScriptedLoader {
    pub fn new(result: Result<LoadedAsset, LoadError>) -> Self {
        Self {
            result: RefCell::new(Some(result)),
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl AssetLoader for ScriptedLoader {
    fn load(&self, _url: &str) -> LoadFuture {
        self.calls.set(self.calls.get() + 1);
        let result = self
            .result
            .borrow_mut()
            .take()
            .unwrap_or_else(|| Err(LoadError::Loader("loaded twice".to_string())));
        Box::pin(async move { result })
    }
}

/// Resolves once the test sends the result through the returned sender.
pub struct ChannelLoader {
    receiver: RefCell<Option<oneshot::Receiver<Result<LoadedAsset, LoadError>>>>,
}

impl ChannelLoader {
    pub fn new() -> (Self, oneshot::Sender<Result<LoadedAsset, LoadError>>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                receiver: RefCell::new(Some(receiver)),
            },
            sender,
        )
    }
}

impl AssetLoader for ChannelLoader {
    fn load(&self, _url: &str) -> LoadFuture {
        let receiver = self.receiver.borrow_mut().take();
        Box::pin(async move {
            match receiver {
                Some(receiver) => receiver
                    .await
                    .unwrap_or_else(|_| Err(LoadError::Loader("cancelled".to_string()))),
                None => Err(LoadError::Loader("loaded twice".to_string())),
            }
        })
    }
}

pub struct StubVideo {
    pub outcome: Result<(), PlaybackError>,
    pub plays: Rc<Cell<u32>>,
}

impl StubVideo {
    pub fn playing() -> Self {
        Self {
            outcome: Ok(()),
            plays: Rc::new(Cell::new(0)),
        }
    }

    pub fn blocked() -> Self {
        Self {
            outcome: Err(PlaybackError::Blocked("NotAllowedError".to_string())),
            plays: Rc::new(Cell::new(0)),
        }
    }
}

impl VideoSource for StubVideo {
    fn url(&self) -> &str {
        "/video/test.mp4"
    }

    fn play(&mut self) -> PlaybackFuture {
        self.plays.set(self.plays.get() + 1);
        let outcome = self.outcome.clone();
        Box::pin(async move { outcome })
    }
}

/// Clip moving node `target` from y = 0 to y = 1 over `length` seconds.
pub fn rising_clip(name: &str, target: usize, length: f32) -> AnimationClip {
    AnimationClip::new(
        name,
        vec![Channel {
            target,
            keyframes: Keyframes::Translation(vec![
                cgmath::Vector3::new(0.0, 0.0, 0.0),
                cgmath::Vector3::new(0.0, 1.0, 0.0),
            ]),
            timestamps: vec![0.0, length],
            interpolation: Interpolation::Linear,
        }],
    )
}

/**
 * Scene -> Sofa (0) -> { Node (1), Text_Sofa (2) }, plus `Lamp` (3) next to the sofa.
 *
 * Clip `i` raises node `i % 4` over two seconds.
 */
pub fn sofa_asset(clips: usize) -> LoadedAsset {
    let placeholder = Node::new("Node").with_mesh("placeholder").into_ref();
    let text = Node::new("Text_Sofa")
        .with_mesh("text")
        .with_transform(Transform::from(cgmath::Vector3::new(0.0, -0.8, 0.0)))
        .into_ref();
    let mut sofa = Node::new("Sofa").with_mesh("sofa");
    sofa.add_child(placeholder.clone());
    sofa.add_child(text.clone());
    let sofa = sofa.into_ref();
    let lamp = Node::new("Lamp").with_mesh("lamp").into_ref();

    let mut root = Node::new("Scene");
    root.add_child(sofa.clone());
    root.add_child(lamp.clone());

    let nodes: HashMap<usize, NodeRef> = [(0, sofa), (1, placeholder), (2, text), (3, lamp)]
        .into_iter()
        .collect();
    let clips = (0..clips)
        .map(|i| rising_clip(&format!("clip_{i}"), i % 4, 2.0))
        .collect();
    LoadedAsset {
        root: root.into_ref(),
        clips,
        nodes,
    }
}

pub struct Harness {
    pub scene: Rc<RefCell<SceneRoot>>,
    pub indicator: RecordingIndicator,
    pub errors: RecordingErrors,
    pub object: ArObject,
}

impl Harness {
    pub fn new(loader: impl AssetLoader + 'static, video: StubVideo) -> Self {
        Self::with_config(ArConfig::default(), loader, video)
    }

    pub fn with_config(
        config: ArConfig,
        loader: impl AssetLoader + 'static,
        video: StubVideo,
    ) -> Self {
        let scene = Rc::new(RefCell::new(SceneRoot::new()));
        let indicator = RecordingIndicator::default();
        let errors = RecordingErrors::default();
        let ctx = Context::with_collaborators(
            config,
            &scene,
            Box::new(indicator.clone()),
            Box::new(errors.clone()),
        );
        let object = ArObject::new(ctx, Box::new(loader), Box::new(video));
        Self {
            scene,
            indicator,
            errors,
            object,
        }
    }

    /// Runs `init` and applies every resulting future in order.
    pub fn init_and_resolve(&mut self) {
        let out = self.object.init();
        resolve(&mut self.object, out);
    }
}

pub fn resolve(object: &mut ArObject, out: Out<ArObject>) {
    if let Out::FutFn(pending) = out {
        for fut in pending {
            let mutation = futures::executor::block_on(fut);
            mutation(object);
        }
    }
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

pub fn approx_vec(a: cgmath::Vector3<f32>, b: cgmath::Vector3<f32>) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

pub fn approx_quat(a: cgmath::Quaternion<f32>, b: cgmath::Quaternion<f32>) -> bool {
    approx_eq(a.s, b.s) && approx_vec(a.v, b.v)
}
