use std::{collections::HashMap, future::Future, pin::Pin};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::{
    data_structures::scene_graph::{Node, NodeRef, to_scene_node},
    error::LoadError,
    resources::{
        animation::{AnimationClip, Channel, Interpolation, Keyframes},
        binary::load_binary,
    },
};

/**
 * This module contains all logic for loading the model and the media it is
 * paired with from external resources.
 */
pub mod animation;
pub mod binary;
pub mod video;

/// The result of a successful asset load.
pub struct LoadedAsset {
    /// Scene root; its children are the nodes of the asset's scene.
    pub root: NodeRef,
    /// Clips in declaration order.
    pub clips: Vec<AnimationClip>,
    /// Every node of the asset keyed by its index in the source file.
    pub nodes: HashMap<usize, NodeRef>,
}

pub type LoadFuture = Pin<Box<dyn Future<Output = Result<LoadedAsset, LoadError>>>>;

/// Fetches and parses a 3D asset.
///
/// The returned future must not borrow the loader: it may outlive the call and
/// resolves while the host keeps rendering frames.
pub trait AssetLoader {
    fn load(&self, url: &str) -> LoadFuture;
}

/// Loads `.glb`/`.gltf` assets with the `gltf` crate.
#[derive(Clone, Debug)]
pub struct GltfLoader {
    asset_root: String,
}

impl GltfLoader {
    pub fn new(asset_root: impl Into<String>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    /// Parses an asset whose buffers are all embedded (a `.glb`, data URIs or no buffers).
    pub fn parse(bytes: &[u8]) -> Result<LoadedAsset, LoadError> {
        let gltf = gltf::Gltf::from_slice(bytes)?;
        let buffer_data = read_buffers(&gltf)?
            .into_iter()
            .map(|buffer| match buffer {
                BufferData::Loaded(data) => Ok(data),
                BufferData::External(uri) => Err(LoadError::Fetch {
                    url: uri,
                    reason: "external buffers need GltfLoader::load".to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        build_asset(&gltf, &buffer_data)
    }

    async fn load_gltf(asset_root: String, url: String) -> Result<LoadedAsset, LoadError> {
        let bytes = load_binary(&asset_root, &url)
            .await
            .map_err(|e| LoadError::Fetch {
                url: url.clone(),
                reason: format!("{:#}", e),
            })?;
        let gltf = gltf::Gltf::from_slice(&bytes)?;

        let mut buffer_data = Vec::new();
        for buffer in read_buffers(&gltf)? {
            match buffer {
                BufferData::Loaded(data) => buffer_data.push(data),
                BufferData::External(uri) => {
                    let uri = sibling_path(&url, &uri);
                    let bin = load_binary(&asset_root, &uri)
                        .await
                        .map_err(|e| LoadError::Fetch {
                            url: uri.clone(),
                            reason: format!("{:#}", e),
                        })?;
                    buffer_data.push(bin);
                }
            }
        }
        build_asset(&gltf, &buffer_data)
    }
}

impl AssetLoader for GltfLoader {
    fn load(&self, url: &str) -> LoadFuture {
        Box::pin(Self::load_gltf(self.asset_root.clone(), url.to_string()))
    }
}

enum BufferData {
    Loaded(Vec<u8>),
    /// Relative URI of a buffer stored next to the asset.
    External(String),
}

/// Resolves every buffer that lives inside the asset itself: the GLB blob and base64 data URIs.
fn read_buffers(gltf: &gltf::Gltf) -> Result<Vec<BufferData>, LoadError> {
    const DATA_URI_PREFIXES: [&str; 2] = [
        "data:application/octet-stream;base64,",
        "data:application/gltf-buffer;base64,",
    ];

    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf.blob.as_deref().ok_or(LoadError::MissingBlob {
                    index: buffer.index(),
                })?;
                buffers.push(BufferData::Loaded(blob.to_vec()));
            }
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                let payload = DATA_URI_PREFIXES
                    .iter()
                    .find_map(|prefix| uri.strip_prefix(prefix))
                    .ok_or(LoadError::BufferFormatUnsupported {
                        index: buffer.index(),
                    })?;
                buffers.push(BufferData::Loaded(STANDARD.decode(payload)?));
            }
            gltf::buffer::Source::Uri(uri) => buffers.push(BufferData::External(uri.to_string())),
        }
    }
    Ok(buffers)
}

/// Resolves a buffer URI relative to the asset that references it.
fn sibling_path(asset_url: &str, uri: &str) -> String {
    match asset_url.rfind('/') {
        Some(idx) => format!("{}/{}", &asset_url[..idx], uri),
        None => uri.to_string(),
    }
}

fn build_asset(gltf: &gltf::Gltf, buffer_data: &[Vec<u8>]) -> Result<LoadedAsset, LoadError> {
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or(LoadError::NoScene)?;

    let mut nodes = HashMap::new();
    let mut root = Node::new(scene.name().unwrap_or("Scene"));
    for node in scene.nodes() {
        root.add_child(to_scene_node(node, &mut nodes));
    }

    let clips = gltf
        .animations()
        .map(|animation| read_clip(&animation, buffer_data))
        .collect();

    Ok(LoadedAsset {
        root: root.into_ref(),
        clips,
        nodes,
    })
}

fn read_clip(animation: &gltf::Animation, buffer_data: &[Vec<u8>]) -> AnimationClip {
    let name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("clip_{}", animation.index()));
    let mut channels = Vec::new();
    for channel in animation.channels() {
        let reader =
            channel.reader(|buffer| buffer_data.get(buffer.index()).map(|data| data.as_slice()));
        let timestamps: Vec<f32> = match reader.read_inputs() {
            Some(inputs) => inputs.collect(),
            None => {
                log::warn!("no timestamps found in channel {} of {}", channel.index(), name);
                Vec::new()
            }
        };
        let keyframes = match reader.read_outputs() {
            Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                Keyframes::Translation(translations.map(Into::into).collect())
            }
            Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => Keyframes::Rotation(
                rotations
                    .into_f32()
                    .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                    .collect(),
            ),
            Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                Keyframes::Scale(scales.map(Into::into).collect())
            }
            Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => Keyframes::Other,
            None => {
                log::warn!("no keyframes found in channel {} of {}", channel.index(), name);
                Keyframes::Other
            }
        };
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
        };
        let keyframes = if interpolation == Interpolation::CubicSpline {
            strip_tangents(keyframes)
        } else {
            keyframes
        };
        channels.push(Channel {
            target: channel.target().node().index(),
            keyframes,
            timestamps,
            interpolation,
        });
    }
    AnimationClip::new(name, channels)
}

/// Cubic-spline outputs come as (in-tangent, value, out-tangent) triples.
fn strip_tangents(keyframes: Keyframes) -> Keyframes {
    fn values<T: Copy>(triples: Vec<T>) -> Vec<T> {
        triples.chunks_exact(3).map(|triple| triple[1]).collect()
    }
    match keyframes {
        Keyframes::Translation(v) => Keyframes::Translation(values(v)),
        Keyframes::Rotation(v) => Keyframes::Rotation(values(v)),
        Keyframes::Scale(v) => Keyframes::Scale(values(v)),
        Keyframes::Other => Keyframes::Other,
    }
}
