//! Orbit camera and the world/screen mappings used for drawing and picking.

use glam::{Mat4, Vec3};
use prune_core::picker::Ray;

/// Perspective camera orbiting `target`.
///
/// ### Fields
/// - `target` - Point the camera looks at and orbits around.
/// - `yaw` / `pitch` - Orbit angles in radians; pitch is clamped short of the poles.
/// - `distance` - Distance from `target` to the eye.
/// - `fov_y` - Vertical field of view in radians.
#[derive(Clone, Copy, Debug)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y: f32,
}

const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;
const PITCH_LIMIT: f32 = 1.5;

impl Default for OrbitCamera {
    /// Looks at the middle of the tree from `(15, 15, 15)`-ish.
    fn default() -> Self {
        Self {
            target: Vec3::new(0.0, 5.0, 0.0),
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: 0.45,
            distance: 24.0,
            fov_y: 75f32.to_radians(),
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(cp * sy, sp, cp * cy) * self.distance
    }

    /// Rotates around the target by a screen-space drag in pixels.
    pub fn orbit(&mut self, delta: egui::Vec2) {
        self.yaw -= delta.x * 0.01;
        self.pitch = (self.pitch + delta.y * 0.01).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves towards (positive `scroll`) or away from the target.
    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * 0.001).clamp(0.5, 2.0);
        self.distance = (self.distance * factor).clamp(2.0, 200.0);
    }

    fn view_proj(&self, rect: egui::Rect) -> Mat4 {
        let aspect = (rect.width() / rect.height().max(1.0)).max(1e-3);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, NEAR, FAR);
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        proj * view
    }

    /// Pixels per world unit at view depth 1.
    pub fn focal_px(&self, rect: egui::Rect) -> f32 {
        rect.height() * 0.5 / (self.fov_y * 0.5).tan()
    }

    /// Projects `p` into `rect`.
    ///
    /// ### Returns
    /// The screen position and the view depth of `p`, or `None` when `p`
    /// lies behind the near plane.
    pub fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> Option<(egui::Pos2, f32)> {
        let clip = self.view_proj(rect) * p.extend(1.0);
        if clip.w <= NEAR {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let x = rect.left() + (ndc.x + 1.0) * 0.5 * rect.width();
        let y = rect.top() + (1.0 - ndc.y) * 0.5 * rect.height();
        Some((egui::pos2(x, y), clip.w))
    }

    /// Ray from the eye through screen position `p`.
    pub fn screen_to_ray(&self, p: egui::Pos2, rect: egui::Rect) -> Ray {
        let ndc_x = (p.x - rect.left()) / rect.width() * 2.0 - 1.0;
        let ndc_y = 1.0 - (p.y - rect.top()) / rect.height() * 2.0;
        let aspect = (rect.width() / rect.height().max(1.0)).max(1e-3);
        let half = (self.fov_y * 0.5).tan();

        let eye = self.eye();
        let forward = (self.target - eye).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        Ray::new(
            eye,
            forward + right * (ndc_x * half * aspect) + up * (ndc_y * half),
        )
    }
}
