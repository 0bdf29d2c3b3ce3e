//! Interfaces to the host AR session.
//!
//! The host owns camera tracking, the scene graph and the render loop. This
//! crate only attaches nodes to the host scene and signals progress and
//! failures through the collaborators below.

use crate::data_structures::scene_graph::NodeRef;

pub trait HostScene {
    /// Hands `node` to the scene graph. Attaching the same node twice must not duplicate it.
    fn attach(&mut self, node: NodeRef);

    fn is_attached(&self, node: &NodeRef) -> bool;
}

/// Spinner or progress bar shown while the model loads.
pub trait LoadingIndicator {
    fn show(&mut self);
    fn hide(&mut self);
}

/// Receives human readable failure descriptions. Never influences control flow.
pub trait ErrorSurface {
    fn report(&mut self, message: &str);
}

/// A flat list of top-level nodes, enough for hosts without their own graph.
#[derive(Debug, Default)]
pub struct SceneRoot {
    nodes: Vec<NodeRef>,
}

impl SceneRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }
}

impl HostScene for SceneRoot {
    fn attach(&mut self, node: NodeRef) {
        if self.is_attached(&node) {
            log::warn!("node {} is already attached", node.borrow().name);
            return;
        }
        self.nodes.push(node);
    }

    fn is_attached(&self, node: &NodeRef) -> bool {
        self.nodes.iter().any(|n| std::rc::Rc::ptr_eq(n, node))
    }
}

#[derive(Debug, Default)]
pub struct LogIndicator;

impl LoadingIndicator for LogIndicator {
    fn show(&mut self) {
        log::info!("loading started");
    }

    fn hide(&mut self) {
        log::info!("loading finished");
    }
}

#[derive(Debug, Default)]
pub struct LogErrorSurface;

impl ErrorSurface for LogErrorSurface {
    fn report(&mut self, message: &str) {
        log::error!("{}", message);
    }
}

/// Logs the failure and shows it in a browser alert.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct AlertErrorSurface;

#[cfg(target_arch = "wasm32")]
impl ErrorSurface for AlertErrorSurface {
    fn report(&mut self, message: &str) {
        log::error!("{}", message);
        if let Some(window) = web_sys::window() {
            if window.alert_with_message(message).is_err() {
                log::warn!("could not show alert");
            }
        }
    }
}
