//! Engine data structures: transforms, scene nodes, the overlay and the model.
//!
//! - `instance` holds the position/rotation/scale transform and the reveal pose
//! - `scene_graph` contains the shared nodes handed to the host scene
//! - `texture` is the video texture with its per-frame refresh flag
//! - `overlay` is the video-textured quad and its playback state
//! - `presence` is the loaded model, its clip player and idle animation

pub mod instance;
pub mod overlay;
pub mod presence;
pub mod scene_graph;
pub mod texture;
