//! The video-textured quad that follows the model.

use crate::{
    context::Context,
    data_structures::{
        instance::{Pose, Transform},
        scene_graph::{Node, NodeRef},
        texture::VideoTexture,
    },
    error::{ArError, PlaybackError},
    resources::video::{PlaybackFuture, VideoSource},
};

/// A vertex of the overlay quad: position in the quad's local space and UV.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// A `width` × `height` quad in the XY plane centred on the origin.
pub fn quad_vertices(width: f32, height: f32) -> [QuadVertex; 4] {
    let (w, h) = (width / 2.0, height / 2.0);
    [
        QuadVertex {
            position: [-w, -h, 0.0],
            tex_coords: [0.0, 1.0],
        },
        QuadVertex {
            position: [w, -h, 0.0],
            tex_coords: [1.0, 1.0],
        },
        QuadVertex {
            position: [w, h, 0.0],
            tex_coords: [1.0, 0.0],
        },
        QuadVertex {
            position: [-w, h, 0.0],
            tex_coords: [0.0, 0.0],
        },
    ]
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayMaterial {
    pub transparent: bool,
    pub double_sided: bool,
    /// Whether the video texture is bound as colour map.
    pub video_bound: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Constructing,
    Playing,
    /// Playback never started; the mesh stays usable with a frozen texture.
    Stalled,
}

pub struct OverlayMesh {
    pub node: NodeRef,
    pub vertices: [QuadVertex; 4],
    pub material: OverlayMaterial,
    pub texture: VideoTexture,
}

/**
 * Owns the video source and the quad that displays it.
 *
 * Construction happens once. Every frame the host's update drives
 * [`sync_to_model`](Self::sync_to_model); nothing here registers callbacks of
 * its own.
 */
pub struct VideoOverlay {
    source: Box<dyn VideoSource>,
    mesh: Option<OverlayMesh>,
    state: PlaybackState,
    revealed: bool,
}

impl VideoOverlay {
    pub fn new(source: Box<dyn VideoSource>) -> Self {
        Self {
            source,
            mesh: None,
            state: PlaybackState::Idle,
            revealed: false,
        }
    }

    /// Builds the quad, attaches it to the host scene and starts playback.
    ///
    /// The returned future resolves when playback started or failed. Its result
    /// goes to [`playback_settled`](Self::playback_settled); the mesh exists
    /// either way.
    pub fn construct(&mut self, ctx: &Context) -> Result<PlaybackFuture, ArError> {
        if self.state != PlaybackState::Idle {
            log::warn!("overlay for {} is already constructed", self.source.url());
            return Err(ArError::OverlayConstructed);
        }
        let [width, height] = ctx.config.overlay_size;
        let node = Node::new("video_overlay")
            .with_mesh("video_quad")
            .with_transform(Transform::from(cgmath::Vector3::from(
                ctx.config.overlay_position,
            )))
            .into_ref();
        node.borrow_mut().visible = ctx.config.overlay_visible_on_init;

        let mut texture = VideoTexture::new();
        texture.mark_needs_update();
        self.mesh = Some(OverlayMesh {
            node: node.clone(),
            vertices: quad_vertices(width, height),
            material: OverlayMaterial {
                transparent: true,
                double_sided: true,
                video_bound: true,
            },
            texture,
        });
        self.state = PlaybackState::Constructing;
        if let Err(e) = ctx.attach(&node) {
            log::warn!("overlay not attached: {}", e);
        }
        log::info!("starting playback of {}", self.source.url());
        Ok(self.source.play())
    }

    pub fn playback_settled(&mut self, result: Result<(), PlaybackError>) {
        self.state = match result {
            Ok(()) => {
                log::info!("playing {}", self.source.url());
                PlaybackState::Playing
            }
            Err(e) => {
                log::error!("Failed to start video playback: {}", e);
                PlaybackState::Stalled
            }
        };
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mesh(&self) -> Option<&OverlayMesh> {
        self.mesh.as_ref()
    }

    pub fn mesh_mut(&mut self) -> Option<&mut OverlayMesh> {
        self.mesh.as_mut()
    }

    pub fn source(&self) -> &dyn VideoSource {
        self.source.as_ref()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Makes the quad visible at `pose` and (re)binds the video texture.
    pub fn reveal(&mut self, ctx: &Context, pose: &Pose) -> Result<(), ArError> {
        let mesh = self.mesh.as_mut().ok_or(ArError::NoOverlay {
            operation: "reveal",
        })?;
        {
            let mut node = mesh.node.borrow_mut();
            node.visible = true;
            node.copy_pose(pose);
        }
        mesh.material.video_bound = true;
        ctx.attach(&mesh.node)?;
        self.revealed = true;
        Ok(())
    }

    /**
     * Per-frame step: follows the model's position and rotation (never its
     * scale) once revealed, and flags the texture for refresh unless playback
     * stalled.
     */
    pub fn sync_to_model(&mut self, model: Option<&Transform>) {
        let Some(mesh) = self.mesh.as_mut() else {
            return;
        };
        if let Some(model) = model.filter(|_| self.revealed) {
            let mut node = mesh.node.borrow_mut();
            node.transform.position = model.position;
            node.transform.rotation = model.rotation;
        }
        if self.state != PlaybackState::Stalled {
            mesh.texture.mark_needs_update();
        }
    }
}
