//! Animation clips and the looping player that drives the first one.

use std::collections::HashMap;

use cgmath::VectorSpace;

use crate::data_structures::scene_graph::NodeRef;

#[derive(Clone, Debug)]
pub enum Keyframes {
    Translation(Vec<cgmath::Vector3<f32>>),
    Rotation(Vec<cgmath::Quaternion<f32>>),
    Scale(Vec<cgmath::Vector3<f32>>),
    /// Morph target weights; carried but never applied.
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    Step,
    #[default]
    Linear,
    /// Loaded with its tangents stripped and played back linearly.
    CubicSpline,
}

/// One animated property of one node.
#[derive(Clone, Debug)]
pub struct Channel {
    /// glTF index of the animated node.
    pub target: usize,
    pub keyframes: Keyframes,
    pub timestamps: Vec<f32>,
    pub interpolation: Interpolation,
}

/// An animation clip: a named set of channels.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }

    /// Length of the clip in seconds, the last timestamp of its longest channel.
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .filter_map(|channel| channel.timestamps.last())
            .fold(0.0, |acc: f32, &t| acc.max(t))
    }
}

/// Finds the keyframe pair around `time` and the blend factor between them.
fn bracket(timestamps: &[f32], time: f32) -> Option<(usize, usize, f32)> {
    let first = *timestamps.first()?;
    if timestamps.len() == 1 || time <= first {
        return Some((0, 0, 0.0));
    }
    let last = timestamps.len() - 1;
    if time >= timestamps[last] {
        return Some((last, last, 0.0));
    }
    let next = timestamps.partition_point(|&t| t <= time);
    let prev = next - 1;
    let span = timestamps[next] - timestamps[prev];
    let factor = if span > 0.0 {
        (time - timestamps[prev]) / span
    } else {
        0.0
    };
    Some((prev, next, factor))
}

impl Channel {
    /// Applies the channel's value at `time` to `node`.
    fn apply(&self, node: &NodeRef, time: f32) {
        let Some((prev, next, factor)) = bracket(&self.timestamps, time) else {
            return;
        };
        let factor = match self.interpolation {
            Interpolation::Step => 0.0,
            Interpolation::Linear | Interpolation::CubicSpline => factor,
        };
        let mut node = node.borrow_mut();
        match &self.keyframes {
            Keyframes::Translation(values) => {
                if let (Some(a), Some(b)) = (values.get(prev), values.get(next)) {
                    node.transform.position = a.lerp(*b, factor);
                }
            }
            Keyframes::Rotation(values) => {
                if let (Some(a), Some(b)) = (values.get(prev), values.get(next)) {
                    node.transform.rotation = a.slerp(*b, factor);
                }
            }
            Keyframes::Scale(values) => {
                if let (Some(a), Some(b)) = (values.get(prev), values.get(next)) {
                    node.transform.scale = a.lerp(*b, factor);
                }
            }
            Keyframes::Other => (),
        }
    }
}

/**
 * Plays a single clip in an endless loop.
 *
 * Channels whose target node is not part of the loaded scene are skipped
 * with a warning when the player is created.
 */
pub struct AnimationPlayer {
    clip: AnimationClip,
    targets: HashMap<usize, NodeRef>,
    time: f32,
    duration: f32,
}

impl AnimationPlayer {
    pub fn new(clip: AnimationClip, nodes: &HashMap<usize, NodeRef>) -> Self {
        let mut targets = HashMap::new();
        for channel in clip.channels.iter() {
            match nodes.get(&channel.target) {
                Some(node) => {
                    targets.insert(channel.target, node.clone());
                }
                None => log::warn!(
                    "clip {} animates node {} which is not part of the scene",
                    clip.name,
                    channel.target
                ),
            }
        }
        let duration = clip.duration();
        let player = Self {
            clip,
            targets,
            time: 0.0,
            duration,
        };
        player.apply();
        player
    }

    pub fn clip_name(&self) -> &str {
        &self.clip.name
    }

    /// Current position inside the clip, always within `0..=duration`.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn advance(&mut self, dt: f32) {
        self.time = if self.duration > 0.0 {
            (self.time + dt).rem_euclid(self.duration)
        } else {
            0.0
        };
        self.apply();
    }

    fn apply(&self) {
        for channel in self.clip.channels.iter() {
            if let Some(node) = self.targets.get(&channel.target) {
                channel.apply(node, self.time);
            }
        }
    }
}
