use eframe::egui::{Pos2, Rect, Vec2, vec2};
use glam::Vec3;

use super::layout::Dimensionality;

/// World height mapped to the viewport in planar mode.
const WORLD_HEIGHT: f32 = 1000.0;
/// Home eye distance, shared by both projections.
const HOME_DISTANCE: f32 = 1000.0;
const RESET_SECONDS: f64 = 1.0;
const FOV_Y_RADIANS: f32 = std::f32::consts::FRAC_PI_4;
const NEAR_PLANE: f32 = 1.0;
const MIN_ZOOM: f32 = 0.05;
const MAX_ZOOM: f32 = 6.0;
const MIN_DISTANCE: f32 = 40.0;
const MAX_DISTANCE: f32 = 20_000.0;
const MAX_PITCH: f32 = 1.45;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    Planar,
    Volumetric,
}

impl ViewMode {
    pub fn dimensionality(self) -> Dimensionality {
        match self {
            Self::Planar => Dimensionality::Planar,
            Self::Volumetric => Dimensionality::Volumetric,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Planar => "2D",
            Self::Volumetric => "3D",
        }
    }
}

/// A node centre after projection.
#[derive(Clone, Copy, Debug)]
pub struct Projected {
    pub screen: Pos2,
    /// Camera-space depth; 0 in planar mode. Larger is farther.
    pub depth: f32,
    /// World-to-screen scale at this depth; multiplies radii.
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CameraState {
    pan: Vec2,
    zoom: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
    target: Vec3,
}

impl CameraState {
    fn home() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            distance: HOME_DISTANCE,
            target: Vec3::ZERO,
        }
    }

    fn lerp(a: Self, b: Self, t: f32) -> Self {
        Self {
            pan: a.pan + (b.pan - a.pan) * t,
            zoom: a.zoom + (b.zoom - a.zoom) * t,
            yaw: a.yaw + (b.yaw - a.yaw) * t,
            pitch: a.pitch + (b.pitch - a.pitch) * t,
            distance: a.distance + (b.distance - a.distance) * t,
            target: a.target.lerp(b.target, t),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct CameraAnimation {
    from: CameraState,
    to: CameraState,
    /// Planar centring needs the viewport scale, so the pan goal is derived
    /// from this world point on each tick when present.
    center_world: Option<Vec3>,
    started_at: f64,
}

fn ease_in_out_cubic(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Owns the projection model and the camera for one engine. The two camera
/// types never exist at once; switching modes swaps the active state while
/// carrying the eye position over.
#[derive(Clone, Copy, Debug)]
pub struct ViewController {
    mode: ViewMode,
    camera: CameraState,
    animation: Option<CameraAnimation>,
}

impl ViewController {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            camera: CameraState::home(),
            animation: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.mode.dimensionality()
    }

    /// Swaps projections, preserving the eye position. Entering planar
    /// forces the eye back onto the z axis at the equivalent zoom; entering
    /// volumetric starts from the straight-on orbit at the equivalent
    /// distance.
    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        self.animation = None;
        match mode {
            ViewMode::Planar => {
                self.camera.zoom = (HOME_DISTANCE / self.camera.distance).clamp(MIN_ZOOM, MAX_ZOOM);
                self.camera.yaw = 0.0;
                self.camera.pitch = 0.0;
            }
            ViewMode::Volumetric => {
                self.camera.distance =
                    (HOME_DISTANCE / self.camera.zoom).clamp(MIN_DISTANCE, MAX_DISTANCE);
            }
        }
        self.mode = mode;
    }

    fn focal_length(rect: Rect) -> f32 {
        rect.height() / (2.0 * (FOV_Y_RADIANS / 2.0).tan())
    }

    fn planar_scale(&self, rect: Rect) -> f32 {
        self.camera.zoom * rect.height() / WORLD_HEIGHT
    }

    fn orbit_axes(&self) -> (Vec3, Vec3, Vec3) {
        let (yaw_sin, yaw_cos) = self.camera.yaw.sin_cos();
        let (pitch_sin, pitch_cos) = self.camera.pitch.sin_cos();
        let offset = Vec3::new(pitch_cos * yaw_sin, pitch_sin, pitch_cos * yaw_cos);
        let forward = -offset;
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let right = if right == Vec3::ZERO { Vec3::X } else { right };
        let up = right.cross(forward);
        (forward, right, up)
    }

    pub fn project(&self, world: Vec3, rect: Rect) -> Option<Projected> {
        match self.mode {
            ViewMode::Planar => {
                let scale = self.planar_scale(rect);
                Some(Projected {
                    screen: rect.center() + self.camera.pan + vec2(world.x, world.y) * scale,
                    depth: 0.0,
                    scale,
                })
            }
            ViewMode::Volumetric => {
                let (forward, right, up) = self.orbit_axes();
                let eye = self.camera.target - forward * self.camera.distance;
                let relative = world - eye;
                let depth = relative.dot(forward);
                if depth < NEAR_PLANE {
                    return None;
                }
                let focal = Self::focal_length(rect);
                let scale = focal / depth;
                let x = relative.dot(right) * scale;
                let y = relative.dot(up) * scale;
                Some(Projected {
                    screen: rect.center() + vec2(x, -y),
                    depth,
                    scale,
                })
            }
        }
    }

    pub fn planar_screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.camera.pan) / self.planar_scale(rect)
    }

    /// Primary-drag pan (planar) or middle-drag pan (volumetric).
    pub fn pan_by(&mut self, rect: Rect, delta: Vec2) {
        self.animation = None;
        match self.mode {
            ViewMode::Planar => self.camera.pan += delta,
            ViewMode::Volumetric => {
                let (_, right, up) = self.orbit_axes();
                let world_per_pixel = self.camera.distance / Self::focal_length(rect);
                self.camera.target -= right * (delta.x * world_per_pixel);
                self.camera.target += up * (delta.y * world_per_pixel);
            }
        }
    }

    /// Orbit rotation. Rotation is disabled in planar mode.
    pub fn orbit_by(&mut self, delta: Vec2) {
        if self.mode != ViewMode::Volumetric {
            return;
        }
        self.animation = None;
        self.camera.yaw -= delta.x * 0.01;
        self.camera.pitch = (self.camera.pitch + delta.y * 0.01).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Scroll zoom. Planar zooms about the pointer so the hovered point
    /// stays put; volumetric dollies the orbit distance.
    pub fn zoom_by(&mut self, rect: Rect, pointer: Pos2, scroll: f32) {
        if scroll.abs() <= f32::EPSILON {
            return;
        }
        self.animation = None;
        let factor = (1.0 + scroll * 0.0018).clamp(0.85, 1.15);
        match self.mode {
            ViewMode::Planar => {
                let world_before = self.planar_screen_to_world(rect, pointer);
                self.camera.zoom = (self.camera.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
                self.camera.pan =
                    pointer - rect.center() - world_before * self.planar_scale(rect);
            }
            ViewMode::Volumetric => {
                self.camera.distance =
                    (self.camera.distance / factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
            }
        }
    }

    /// Animated return to the home eye at (0, 0, 1000).
    pub fn reset(&mut self, now: f64) {
        self.animation = Some(CameraAnimation {
            from: self.camera,
            to: CameraState {
                zoom: 1.0,
                distance: HOME_DISTANCE,
                ..CameraState::home()
            },
            center_world: None,
            started_at: now,
        });
    }

    /// Animated centring on a world point (search jump).
    pub fn center_on(&mut self, world: Vec3, now: f64) {
        let mut to = self.camera;
        to.target = world;
        self.animation = Some(CameraAnimation {
            from: self.camera,
            to,
            center_world: Some(world),
            started_at: now,
        });
    }

    /// Advances any running camera animation. Returns true while animating.
    pub fn tick(&mut self, now: f64, rect: Rect) -> bool {
        let Some(mut animation) = self.animation else {
            return false;
        };

        if let Some(world) = animation.center_world {
            if self.mode == ViewMode::Planar {
                let scale = animation.to.zoom * rect.height() / WORLD_HEIGHT;
                animation.to.pan = vec2(-world.x, -world.y) * scale;
            }
        }

        let t = ((now - animation.started_at) / RESET_SECONDS).clamp(0.0, 1.0) as f32;
        self.camera = CameraState::lerp(animation.from, animation.to, ease_in_out_cubic(t));

        if t >= 1.0 {
            self.animation = None;
            false
        } else {
            self.animation = Some(animation);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::Rect;

    fn viewport() -> Rect {
        Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(800.0, 600.0))
    }

    #[test]
    fn origin_projects_to_viewport_center() {
        let rect = viewport();
        for mode in [ViewMode::Planar, ViewMode::Volumetric] {
            let view = ViewController::new(mode);
            let projected = view.project(Vec3::ZERO, rect).unwrap();
            assert!((projected.screen - rect.center()).length() < 0.01);
        }
    }

    #[test]
    fn planar_projection_has_uniform_scale() {
        let rect = viewport();
        let view = ViewController::new(ViewMode::Planar);
        let a = view.project(Vec3::new(100.0, 0.0, 0.0), rect).unwrap();
        let b = view.project(Vec3::new(100.0, 0.0, 300.0), rect).unwrap();
        // Depth is ignored under the orthographic projection.
        assert_eq!(a.screen, b.screen);
        assert_eq!(a.scale, b.scale);
    }

    #[test]
    fn volumetric_rejects_points_behind_the_eye() {
        let rect = viewport();
        let view = ViewController::new(ViewMode::Volumetric);
        assert!(view.project(Vec3::new(0.0, 0.0, 2000.0), rect).is_none());
        assert!(view.project(Vec3::ZERO, rect).is_some());
    }

    #[test]
    fn rotation_is_disabled_in_planar_mode() {
        let mut view = ViewController::new(ViewMode::Planar);
        let before = view.project(Vec3::new(50.0, 20.0, 0.0), viewport()).unwrap();
        view.orbit_by(vec2(40.0, 25.0));
        let after = view.project(Vec3::new(50.0, 20.0, 0.0), viewport()).unwrap();
        assert_eq!(before.screen, after.screen);
    }

    #[test]
    fn mode_swap_round_trips_the_eye_distance() {
        let mut view = ViewController::new(ViewMode::Planar);
        view.zoom_by(viewport(), viewport().center(), 400.0);
        let zoom_before = view.camera.zoom;

        view.set_mode(ViewMode::Volumetric);
        assert!((view.camera.distance - HOME_DISTANCE / zoom_before).abs() < 0.5);

        view.set_mode(ViewMode::Planar);
        assert!((view.camera.zoom - zoom_before).abs() < 0.01);
    }

    #[test]
    fn reset_animation_lands_on_home() {
        let rect = viewport();
        let mut view = ViewController::new(ViewMode::Planar);
        view.pan_by(rect, vec2(120.0, -60.0));
        view.reset(10.0);

        assert!(view.tick(10.5, rect), "still animating at the midpoint");
        assert!(!view.tick(11.2, rect), "done after one second");
        assert_eq!(view.camera, CameraState::home());
    }

    #[test]
    fn center_on_moves_the_planar_pan() {
        let rect = viewport();
        let mut view = ViewController::new(ViewMode::Planar);
        let world = Vec3::new(200.0, -80.0, 0.0);
        view.center_on(world, 0.0);
        view.tick(2.0, rect);

        let projected = view.project(world, rect).unwrap();
        assert!((projected.screen - rect.center()).length() < 0.5);
    }
}
