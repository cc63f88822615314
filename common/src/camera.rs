//! Orthographic camera for 2D simulations

use glam::{Mat4, Vec3};

/// 2D orthographic camera.
///
/// `zoom` is the number of world units from the center of the view to its
/// top edge.
#[derive(Debug, Clone)]
pub struct Camera2D {
    pub position: Vec3,
    pub zoom: f32,
    pub aspect_ratio: f32,
}

impl Camera2D {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            zoom: 1.0,
            aspect_ratio,
        }
    }

    /// Get the view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        let half_width = self.zoom * self.aspect_ratio;
        let half_height = self.zoom;

        let projection = Mat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            -1.0,
            1.0,
        );

        let view = Mat4::from_translation(-self.position);

        projection * view
    }

    pub fn update_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// World units covered by one screen pixel for a viewport `height_px` tall.
    pub fn world_per_pixel(&self, height_px: u32) -> f32 {
        2.0 * self.zoom / height_px.max(1) as f32
    }
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl CameraUniform {
    pub fn from_camera_2d(camera: &Camera2D) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn top_edge_maps_to_clip_space_one() {
        let mut camera = Camera2D::new(2.0);
        camera.zoom = 3.5;
        let top = camera.view_projection() * Vec4::new(0.0, 3.5, 0.0, 1.0);
        assert!((top.y - 1.0).abs() < 1e-6);
        let right = camera.view_projection() * Vec4::new(7.0, 0.0, 0.0, 1.0);
        assert!((right.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pixel_size_follows_zoom() {
        let mut camera = Camera2D::new(1.0);
        camera.zoom = 3.5;
        assert!((camera.world_per_pixel(700) - 0.01).abs() < 1e-7);
    }
}
