//! Keyframe animation
//!
//! Sampling is stateless: each query binary-searches the keyframe times, so
//! time may move backward (seeking, rewinding) as freely as forward. Past the
//! last keyframe a driver blends back toward its first keyframe over the rest
//! of the loop, which makes `time == duration` sample the same as `time == 0`.

use log::{debug, info, warn};

use crate::foundation::collections::{NodeArena, NodeId, NodeMap};
use crate::foundation::math::{quat_from_xyzw, Quat, Quaternion, Vec3};
use crate::scene::entities::{Channel, Driver, Interpolation, Keyframe, Node, Trs};
use crate::scene::graph::SceneGraph;

const SLERP_EPSILON: f32 = 1.0e-6;

/// Value of one channel at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    /// Translation or scale
    Vector(Vec3),
    /// Rotation
    Rotation(Quat),
}

/// Pair of keyframes bracketing a time, with the blend weight toward `next`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    current: usize,
    next: usize,
    fraction: f32,
}

fn locate(frames: &[Keyframe], time: f32, duration: f32) -> Option<Segment> {
    let last = frames.len().checked_sub(1)?;
    let max_time = frames[last].time;

    if time > max_time {
        let span = duration - max_time;
        let fraction = if span > 0.0 {
            ((time - max_time) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        return Some(Segment { current: last, next: 0, fraction });
    }

    let next = frames.partition_point(|frame| frame.time < time);
    if next == 0 {
        return Some(Segment { current: 0, next: 0, fraction: 0.0 });
    }
    let current = next - 1;
    let span = frames[next].time - frames[current].time;
    let fraction = if span > 0.0 {
        ((time - frames[current].time) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };
    Some(Segment { current, next, fraction })
}

fn vector(frame: &Keyframe) -> Vec3 {
    Vec3::new(frame.value[0], frame.value[1], frame.value[2])
}

fn rotation(frame: &Keyframe) -> Quat {
    let v = &frame.value;
    quat_from_xyzw(v[0], v[1], v[2], v[3])
}

/// Normalized componentwise blend; degenerate blends hold `a`
fn blend_rotation(a: Quat, b: Quat, t: f32) -> Quat {
    let coords = a.coords.lerp(&b.coords, t);
    Quat::try_new(Quaternion::from(coords), SLERP_EPSILON).unwrap_or(a)
}

impl Driver {
    /// Interpolated channel value at `time` within a loop of length `duration`.
    ///
    /// `None` when the driver has no channel or no keyframes.
    pub fn sample(&self, time: f32, duration: f32) -> Option<ChannelValue> {
        let channel = self.channel?;
        let Segment { current, next, fraction } = locate(&self.frames, time, duration)?;
        let (a, b) = (&self.frames[current], &self.frames[next]);

        // A step holds until the next key is actually reached
        let held = if fraction >= 1.0 { b } else { a };

        let value = match channel {
            Channel::Translation | Channel::Scale => match self.interpolation {
                Interpolation::Step => ChannelValue::Vector(vector(held)),
                _ => ChannelValue::Vector(vector(a).lerp(&vector(b), fraction)),
            },
            Channel::Rotation => {
                let (qa, qb) = (rotation(a), rotation(b));
                match self.interpolation {
                    Interpolation::Step => ChannelValue::Rotation(rotation(held)),
                    Interpolation::Slerp => ChannelValue::Rotation(
                        qa.try_slerp(&qb, fraction, SLERP_EPSILON)
                            .unwrap_or_else(|| blend_rotation(qa, qb, fraction)),
                    ),
                    Interpolation::Linear => ChannelValue::Rotation(blend_rotation(qa, qb, fraction)),
                }
            }
        };
        Some(value)
    }

    /// Sample at `time` and write the result into the target node.
    ///
    /// Returns whether the node changed.
    pub fn apply(&self, time: f32, duration: f32, node: &mut Node) -> bool {
        match (self.channel, self.sample(time, duration)) {
            (Some(Channel::Translation), Some(ChannelValue::Vector(v))) => node.position = v,
            (Some(Channel::Scale), Some(ChannelValue::Vector(v))) => node.scale = v,
            (Some(Channel::Rotation), Some(ChannelValue::Rotation(q))) => node.rotation = q,
            _ => return false,
        }
        true
    }
}

/// A driver resolved to the node it animates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverBinding {
    /// Index into the document's drivers
    pub driver: usize,
    /// Animated node
    pub target: NodeId,
}

/// Applies every bound driver to its node
#[derive(Debug, Clone, Default)]
pub struct Animator {
    bindings: Vec<DriverBinding>,
    initial: NodeMap<Trs>,
    duration: f32,
}

impl Animator {
    /// Bind drivers to reachable nodes by name and capture the targets' initial TRS
    pub fn bind(drivers: &[Driver], nodes: &NodeArena<Node>, graph: &SceneGraph, duration: f32) -> Self {
        let mut animator = Self {
            duration,
            ..Self::default()
        };

        for (index, driver) in drivers.iter().enumerate() {
            let Some(target) = graph.node_by_name(&driver.node) else {
                warn!("Driver '{}' targets unknown node '{}'; it will be inert", driver.name, driver.node);
                continue;
            };
            if driver.frames.is_empty() {
                debug!("Driver '{}' has no keyframes", driver.name);
            }
            if !animator.initial.contains_key(target) {
                animator.initial.insert(target, nodes[target].trs());
            }
            animator.bindings.push(DriverBinding { driver: index, target });
        }

        info!(
            "Bound {} of {} drivers, animation duration {:.3}s",
            animator.bindings.len(),
            drivers.len(),
            duration
        );
        animator
    }

    /// Loop length in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Resolved driver bindings in declaration order
    pub fn bindings(&self) -> &[DriverBinding] {
        &self.bindings
    }

    /// Evaluate every bound driver at `time`; returns how many nodes changed
    pub fn evaluate(&self, time: f32, drivers: &[Driver], nodes: &mut NodeArena<Node>) -> usize {
        let mut changed = 0;
        for binding in &self.bindings {
            if drivers[binding.driver].apply(time, self.duration, &mut nodes[binding.target]) {
                changed += 1;
            }
        }
        changed
    }

    /// Restore every animated node to the TRS captured at bind time
    pub fn reset(&self, nodes: &mut NodeArena<Node>) {
        for (target, trs) in &self.initial {
            nodes[target].set_trs(*trs);
        }
    }
}
