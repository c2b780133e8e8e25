use nalgebra::{Unit, UnitQuaternion, Vector3};

/// Canonical forward axis of a character mesh.
pub fn canonical_forward() -> Vector3<f32> {
    Vector3::new(0.0, 0.0, 1.0)
}

/// World up axis.
pub fn world_up() -> Vector3<f32> {
    Vector3::new(0.0, 1.0, 0.0)
}

/// Shortest-arc rotation taking `from` onto `to`.
///
/// Both vectors are normalized first. Anti-parallel inputs have no unique
/// shortest arc, so the half turn is taken about world up (or about X when the
/// vectors lie on the up axis). Zero-length inputs yield identity.
pub fn shortest_arc(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    let (Some(a), Some(b)) = (from.try_normalize(1.0e-6), to.try_normalize(1.0e-6)) else {
        return UnitQuaternion::identity();
    };
    if let Some(q) = UnitQuaternion::rotation_between(&a, &b) {
        return q;
    }
    let axis = if a.cross(&world_up()).norm_squared() > 1.0e-6 {
        Vector3::y_axis()
    } else {
        Vector3::x_axis()
    };
    UnitQuaternion::from_axis_angle(&axis, std::f32::consts::PI)
}

/// Rotation that makes the canonical forward axis point along `direction`.
pub fn facing_rotation(direction: &Vector3<f32>) -> UnitQuaternion<f32> {
    shortest_arc(&canonical_forward(), direction)
}

/// Applies a local-space yaw (rotation about the body's own up axis).
pub fn rotate_local_yaw(rotation: &UnitQuaternion<f32>, yaw: f32) -> UnitQuaternion<f32> {
    let up: Unit<Vector3<f32>> = Vector3::y_axis();
    rotation * UnitQuaternion::from_axis_angle(&up, yaw)
}

/// Forward direction implied by an orientation.
pub fn forward_from_rotation(rotation: &UnitQuaternion<f32>) -> Vector3<f32> {
    let forward = rotation * canonical_forward();
    forward.try_normalize(1.0e-6).unwrap_or_else(Vector3::zeros)
}

/// Forward direction facing away from an orbit camera with azimuth `camera_yaw`.
pub fn forward_from_camera_yaw(camera_yaw: f32) -> Vector3<f32> {
    let yaw = -camera_yaw + std::f32::consts::FRAC_PI_2;
    Vector3::new(yaw.sin(), 0.0, yaw.cos())
}
