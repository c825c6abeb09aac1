//! Joint transforms: TRS values with blending and parent composition.
//!
//! - `interpolate` lerps translation/scale and NLERPs rotation (shortest arc)
//! - `apply_preceding` composes a local transform with its parent's world transform
//!
//! Quaternions are stored as (x, y, z, w).

use serde::{Deserialize, Serialize};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
    ]
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn normalize4(mut q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv_len = len2.sqrt().recip();
        q[0] *= inv_len;
        q[1] *= inv_len;
        q[2] *= inv_len;
        q[3] *= inv_len;
        q
    } else {
        IDENTITY_ROTATION
    }
}

/// Quaternion NLERP with shortest-arc correction.
/// If dot < 0, negate the second quaternion to ensure the shortest path.
/// Returns a normalized quaternion (x,y,z,w).
#[inline]
pub fn nlerp_quat(a: [f32; 4], mut b: [f32; 4], t: f32) -> [f32; 4] {
    if dot4(a, b) < 0.0 {
        b = [-b[0], -b[1], -b[2], -b[3]];
    }
    normalize4([
        lerp_f32(a[0], b[0], t),
        lerp_f32(a[1], b[1], t),
        lerp_f32(a[2], b[2], t),
        lerp_f32(a[3], b[3], t),
    ])
}

/// Hamilton product `a * b` (apply `b` first, then `a`).
#[inline]
pub fn mul_quat(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [ax, ay, az, aw] = a;
    let [bx, by, bz, bw] = b;
    [
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
        aw * bw - ax * bx - ay * by - az * bz,
    ]
}

#[inline]
fn cross3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Rotate a vector by a unit quaternion.
#[inline]
pub fn rotate_vec3(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let u = [q[0], q[1], q[2]];
    let c = cross3(u, v);
    let t = [2.0 * c[0], 2.0 * c[1], 2.0 * c[2]];
    let ut = cross3(u, t);
    [
        v[0] + q[3] * t[0] + ut[0],
        v[1] + q[3] * t[1] + ut[1],
        v[2] + q[3] * t[2] + ut[2],
    ]
}

const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

pub(crate) fn identity_rotation() -> [f32; 4] {
    IDENTITY_ROTATION
}

pub(crate) fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Location of a single joint: translation, rotation (quat x,y,z,w) and scale.
///
/// Depending on where it comes from this is either relative to the parent joint
/// (clip samples) or already composed into skeleton space (a joint's current location).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTransform {
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl JointTransform {
    pub const IDENTITY: JointTransform = JointTransform {
        translation: [0.0, 0.0, 0.0],
        rotation: IDENTITY_ROTATION,
        scale: [1.0, 1.0, 1.0],
    };

    pub fn new(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation(rotation: [f32; 4]) -> Self {
        Self {
            rotation: normalize4(rotation),
            ..Self::IDENTITY
        }
    }

    /// Rotation of `angle` radians about `axis` (normalized internally).
    pub fn from_axis_angle(axis: [f32; 3], angle: f32) -> Self {
        let len = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        let k = s / len;
        Self::from_rotation([axis[0] * k, axis[1] * k, axis[2] * k, c])
    }

    /// Blend from `a` (t = 0) to `b` (t = 1).
    pub fn interpolate(a: &JointTransform, b: &JointTransform, t: f32) -> JointTransform {
        JointTransform {
            translation: lerp_vec3(a.translation, b.translation, t),
            rotation: nlerp_quat(a.rotation, b.rotation, t),
            scale: lerp_vec3(a.scale, b.scale, t),
        }
    }

    /// Compose this (child-local) transform with its parent's world transform, in place.
    /// Scale composes per axis; shear from non-uniform parent scale is not represented.
    pub fn apply_preceding(&mut self, parent: &JointTransform) {
        let scaled = [
            self.translation[0] * parent.scale[0],
            self.translation[1] * parent.scale[1],
            self.translation[2] * parent.scale[2],
        ];
        let rotated = rotate_vec3(parent.rotation, scaled);
        self.translation = [
            parent.translation[0] + rotated[0],
            parent.translation[1] + rotated[1],
            parent.translation[2] + rotated[2],
        ];
        self.rotation = normalize4(mul_quat(parent.rotation, self.rotation));
        self.scale = [
            parent.scale[0] * self.scale[0],
            parent.scale[1] * self.scale[1],
            parent.scale[2] * self.scale[2],
        ];
    }

    /// Non-mutating form of [`JointTransform::apply_preceding`].
    pub fn composed_with(&self, parent: &JointTransform) -> JointTransform {
        let mut out = *self;
        out.apply_preceding(parent);
        out
    }
}
