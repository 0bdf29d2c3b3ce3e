//! flow-ar
//!
//! A single augmented-reality object for hosts that already own camera
//! tracking, the scene graph and the render loop. The crate loads a glTF asset
//! asynchronously, keeps it hidden until it is revealed at a world pose, plays
//! its first animation clip and keeps a video-textured quad locked to the
//! model every frame. It runs natively and on the web (WASM).
//!
//! High-level modules
//! - `context`: configuration and the collaborators the object talks to
//! - `controller`: the AR object lifecycle (init, load, reveal, update)
//! - `data_structures`: transforms, scene nodes, the overlay and the model
//! - `error`: load, playback and lifecycle errors
//! - `flow`: the per-frame session driver and async completion handling
//! - `host`: interfaces to the host scene, loading indicator and error surface
//! - `resources`: asset loading, animation clips and video sources
//!

pub mod context;
pub mod controller;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod host;
pub mod resources;
#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
