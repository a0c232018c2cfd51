//! Compass-view camera planning.
//!
//! Every print gets the same eight exterior views. Camera placement is a
//! pure function of the toolpath bounds, so identical input always produces
//! identical framing.

use glam::{Mat4, Vec3};

use crate::gcode::Bounds;

/// Vertical field of view of the preview cameras, degrees.
pub const FOV_Y_DEGREES: f32 = 60.0;
/// Near clipping plane distance.
pub const NEAR_PLANE: f32 = 0.1;

/// One of the eight fixed compass viewpoints.
///
/// Each view has a fixed horizontal offset direction from the print center;
/// the camera always looks back at the center. [`View::ALL`] lists the
/// views in output order, matching the view index embedded in frame
/// filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
    East,
    NorthEast,
    North,
}

impl View {
    /// All views in rendering and filename-index order.
    pub const ALL: [View; 8] = [
        View::NorthWest,
        View::West,
        View::SouthWest,
        View::South,
        View::SouthEast,
        View::East,
        View::NorthEast,
        View::North,
    ];

    /// Canonical upper-case name used in frame filenames.
    pub fn name(&self) -> &'static str {
        match self {
            View::NorthWest => "NORTH_WEST",
            View::West => "WEST",
            View::SouthWest => "SOUTH_WEST",
            View::South => "SOUTH",
            View::SouthEast => "SOUTH_EAST",
            View::East => "EAST",
            View::NorthEast => "NORTH_EAST",
            View::North => "NORTH",
        }
    }

    /// Unit offset from the print center toward the camera, in the bed
    /// plane. These are the exact historical per-view offsets; preview
    /// framing must stay stable across versions.
    pub fn direction(&self) -> Vec3 {
        use std::f32::consts::FRAC_1_SQRT_2;
        match self {
            View::North => Vec3::new(0.0, 1.0, 0.0),
            View::East => Vec3::new(-1.0, 0.0, 0.0),
            View::South => Vec3::new(0.0, -1.0, 0.0),
            View::West => Vec3::new(1.0, 0.0, 0.0),
            View::NorthWest => Vec3::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0),
            View::NorthEast => Vec3::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0),
            View::SouthEast => Vec3::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0),
            View::SouthWest => Vec3::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0),
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Place the camera for one view.
///
/// The camera orbits the bounds center at `1.5 × diagonal`, elevated above
/// the print's top by at least half the diagonal, the model's Z extent,
/// and a 2-unit floor. The remaining horizontal reach comes from the
/// distance and elevation; if the elevation alone exceeds the orbit
/// distance the camera keeps the full distance horizontally rather than
/// going overhead.
pub fn camera_position(bounds: &Bounds, view: View) -> Vec3 {
    let center = bounds.center().as_vec3();
    let size = bounds.size().as_vec3();

    let camera_distance = bounds.diagonal() as f32 * 1.5;
    let min_height_offset = (bounds.diagonal() as f32 * 0.5).max(size.z).max(2.0);
    let camera_height = bounds.max.z as f32 + min_height_offset;

    let height_above_center = camera_height - center.z;
    let horizontal_sq = camera_distance * camera_distance - height_above_center * height_above_center;
    let horizontal = if horizontal_sq > 0.0 {
        horizontal_sq.sqrt()
    } else {
        camera_distance
    };

    let offset = view.direction() * horizontal;
    Vec3::new(center.x + offset.x, center.y + offset.y, camera_height)
}

/// Combined model-view-projection matrix for one view.
///
/// Right-handed look-at with +Z up, OpenGL clip-space projection. The far
/// plane scales with the scene so large prints never clip.
pub fn mvp_matrix(bounds: &Bounds, camera: Vec3, width: u32, height: u32) -> Mat4 {
    let center = bounds.center().as_vec3();
    let far = bounds.max.as_vec3().length() * 2.0;
    let aspect = width as f32 / height as f32;

    let view = Mat4::look_at_rh(camera, center, Vec3::Z);
    let projection = Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), aspect, NEAR_PLANE, far);
    projection * view
}

/// Fixed key light, shared by all eight views.
///
/// Sits off toward +X/+Y, well above the print, far enough out that the
/// whole toolpath reads as evenly lit.
pub fn light_position(bounds: &Bounds) -> Vec3 {
    let center = bounds.center().as_vec3();
    let distance = (bounds.diagonal() as f32 * 2.0).max(10.0);
    Vec3::new(
        center.x + distance * 0.7,
        center.y + distance * 0.7,
        bounds.max.z as f32 + distance * 1.5,
    )
}
