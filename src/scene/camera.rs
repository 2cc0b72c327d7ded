use glam::{Mat4, Vec3};

/// Camera abstraction consumed by [`ForwardPipeline::update_context`](crate::renderer::ForwardPipeline::update_context).
///
/// Projection matrices are expected in wgpu clip space (depth `0..1`), as
/// produced by `Mat4::perspective_rh`.
pub trait Camera {
    fn position(&self) -> Vec3;
    fn view_matrix(&self) -> Mat4;
    fn projection_matrix(&self) -> Mat4;

    fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn near(&self) -> f32;
    fn far(&self) -> f32;
}

/// Look-at perspective camera.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    /// `fov` is given in degrees, matching editor conventions.
    #[must_use]
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: fov.to_radians(),
            aspect,
            near,
            far,
        }
    }

    #[must_use]
    pub fn looking_at(mut self, position: Vec3, target: Vec3) -> Self {
        self.position = position;
        self.target = target;
        self
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }
}

impl Camera for PerspectiveCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    fn near(&self) -> f32 {
        self.near
    }

    fn far(&self) -> f32 {
        self.far
    }
}

/// Snapshot of the camera copied into the render context each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraState {
    #[must_use]
    pub fn from_camera(camera: &dyn Camera) -> Self {
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(),
            view_projection: camera.view_projection_matrix(),
            position: camera.position(),
            near: camera.near(),
            far: camera.far(),
        }
    }

    /// Converts a `0..1` depth-buffer value back to a positive view distance.
    #[must_use]
    pub fn linearize_depth(&self, depth: f32) -> f32 {
        self.near * self.far / (self.far - depth * (self.far - self.near))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linearize_depth_maps_planes() {
        let camera = PerspectiveCamera::new(60.0, 1.0, 0.5, 200.0);
        let state = CameraState::from_camera(&camera);

        assert!((state.linearize_depth(0.0) - 0.5).abs() < 1e-4);
        assert!((state.linearize_depth(1.0) - 200.0).abs() < 1e-2);
    }

    #[test]
    fn linearize_depth_inverts_projection() {
        let camera = PerspectiveCamera::new(60.0, 1.0, 0.1, 100.0).looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let state = CameraState::from_camera(&camera);

        // A point 7 units in front of the camera.
        let clip = state.view_projection * Vec3::new(0.0, 0.0, 3.0).extend(1.0);
        let depth = clip.z / clip.w;
        assert!((state.linearize_depth(depth) - 7.0).abs() < 1e-3);
    }
}
