// Row-major 4x4 and 3x3 matrices. Uploads to GL set the transpose flag.
pub type Mat4x4 = [f32; 16];
pub type Mat3x3 = [f32; 9];
pub type Vec3 = [f32; 3];

pub fn mat4x4_identity() -> Mat4x4 {
    [
      1.0, 0.0, 0.0, 0.0,
      0.0, 1.0, 0.0, 0.0,
      0.0, 0.0, 1.0, 0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_translate(x: f32, y: f32, z: f32) -> Mat4x4 {
    [
      1.0, 0.0, 0.0,  x,
      0.0, 1.0, 0.0,  y,
      0.0, 0.0, 1.0,  z,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_scale(x: f32, y: f32, z: f32) -> Mat4x4 {
    [
       x,  0.0, 0.0, 0.0,
      0.0,  y,  0.0, 0.0,
      0.0, 0.0,  z,  0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_rot_x(angle: f32) -> Mat4x4 {
    let c = angle.cos();
    let s = angle.sin();

    [
      1.0, 0.0, 0.0, 0.0,
      0.0,  c,  -s,  0.0,
      0.0,  s,   c,  0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_rot_y(angle: f32) -> Mat4x4 {
    let c = angle.cos();
    let s = angle.sin();

    [
       c,  0.0,  s,  0.0,
      0.0, 1.0, 0.0, 0.0,
      -s,  0.0,  c,  0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_transpose(matrix: Mat4x4) -> Mat4x4 {
    let mut ret = [0.0; 16];
    for i in 0..16 {
        let row = i / 4;
        let col = i % 4;
        ret[col * 4 + row] = matrix[row * 4 + col];
    }
    ret
}

pub fn vec4_dot(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

pub fn mat4x4_row(mat: &Mat4x4, row: usize) -> [f32; 4] {
    let start_idx = row * 4;
    [mat[start_idx], mat[start_idx + 1], mat[start_idx + 2], mat[start_idx + 3]]
}

pub fn mat4x4_col(mat: &Mat4x4, col: usize) -> [f32; 4] {
    [mat[col], mat[4 + col], mat[8 + col], mat[12 + col]]
}

pub fn mat4x4_mul(a: Mat4x4, b: Mat4x4) -> Mat4x4 {
    let mut ret = [0.0; 16];
    for (i, out) in ret.iter_mut().enumerate() {
        let row = i / 4;
        let col = i % 4;
        *out = vec4_dot(mat4x4_row(&a, row), mat4x4_col(&b, col));
    }
    ret
}

pub fn mat4x4_perspective(fov_y_radians: f32, aspect_ratio: f32, near: f32, far: f32) -> Mat4x4 {
    let f = 1.0 / (fov_y_radians * 0.5).tan();
    let range_inv = 1.0 / (near - far);

    [
        f / aspect_ratio, 0.0, 0.0,                          0.0,
        0.0,              f,   0.0,                          0.0,
        0.0,              0.0, (near + far) * range_inv,     (2.0 * near * far) * range_inv,
        0.0,              0.0, -1.0,                         0.0,
    ]
}

/// Right-handed view matrix looking from `eye` towards `target`.
pub fn mat4x4_look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4x4 {
    let forward = vec3_normalize(vec3_sub(eye, target));
    let right = vec3_normalize(vec3_cross(up, forward));
    let true_up = vec3_cross(forward, right);

    [
        right[0],   right[1],   right[2],   -vec3_dot(right, eye),
        true_up[0], true_up[1], true_up[2], -vec3_dot(true_up, eye),
        forward[0], forward[1], forward[2], -vec3_dot(forward, eye),
        0.0,        0.0,        0.0,        1.0,
    ]
}

/// General inverse by cofactor expansion. `None` for singular matrices.
pub fn mat4x4_inverse(m: &Mat4x4) -> Option<Mat4x4> {
    let b00 = m[0] * m[5] - m[1] * m[4];
    let b01 = m[0] * m[6] - m[2] * m[4];
    let b02 = m[0] * m[7] - m[3] * m[4];
    let b03 = m[1] * m[6] - m[2] * m[5];
    let b04 = m[1] * m[7] - m[3] * m[5];
    let b05 = m[2] * m[7] - m[3] * m[6];
    let b06 = m[8] * m[13] - m[9] * m[12];
    let b07 = m[8] * m[14] - m[10] * m[12];
    let b08 = m[8] * m[15] - m[11] * m[12];
    let b09 = m[9] * m[14] - m[10] * m[13];
    let b10 = m[9] * m[15] - m[11] * m[13];
    let b11 = m[10] * m[15] - m[11] * m[14];

    let det = b00 * b11 - b01 * b10 + b02 * b09 + b03 * b08 - b04 * b07 + b05 * b06;
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;

    Some([
        (m[5] * b11 - m[6] * b10 + m[7] * b09) * inv_det,
        (m[2] * b10 - m[1] * b11 - m[3] * b09) * inv_det,
        (m[13] * b05 - m[14] * b04 + m[15] * b03) * inv_det,
        (m[10] * b04 - m[9] * b05 - m[11] * b03) * inv_det,
        (m[6] * b08 - m[4] * b11 - m[7] * b07) * inv_det,
        (m[0] * b11 - m[2] * b08 + m[3] * b07) * inv_det,
        (m[14] * b02 - m[12] * b05 - m[15] * b01) * inv_det,
        (m[8] * b05 - m[10] * b02 + m[11] * b01) * inv_det,
        (m[4] * b10 - m[5] * b08 + m[7] * b06) * inv_det,
        (m[1] * b08 - m[0] * b10 - m[3] * b06) * inv_det,
        (m[12] * b04 - m[13] * b02 + m[15] * b00) * inv_det,
        (m[9] * b02 - m[8] * b04 - m[11] * b00) * inv_det,
        (m[5] * b07 - m[4] * b09 - m[6] * b06) * inv_det,
        (m[0] * b09 - m[1] * b07 + m[2] * b06) * inv_det,
        (m[13] * b01 - m[12] * b03 - m[14] * b00) * inv_det,
        (m[8] * b03 - m[9] * b01 + m[10] * b00) * inv_det,
    ])
}

/// Inverse-transpose of the upper 3x3 block, for transforming normals.
pub fn mat3x3_normal_from_mat4x4(m: &Mat4x4) -> Option<Mat3x3> {
    let (a00, a01, a02) = (m[0], m[1], m[2]);
    let (a10, a11, a12) = (m[4], m[5], m[6]);
    let (a20, a21, a22) = (m[8], m[9], m[10]);

    // Cofactors of the 3x3 block; the inverse-transpose is cofactor / det.
    let c00 = a11 * a22 - a12 * a21;
    let c01 = a12 * a20 - a10 * a22;
    let c02 = a10 * a21 - a11 * a20;
    let c10 = a02 * a21 - a01 * a22;
    let c11 = a00 * a22 - a02 * a20;
    let c12 = a01 * a20 - a00 * a21;
    let c20 = a01 * a12 - a02 * a11;
    let c21 = a02 * a10 - a00 * a12;
    let c22 = a00 * a11 - a01 * a10;

    let det = a00 * c00 + a01 * c01 + a02 * c02;
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv_det = 1.0 / det;

    Some([
        c00 * inv_det, c01 * inv_det, c02 * inv_det,
        c10 * inv_det, c11 * inv_det, c12 * inv_det,
        c20 * inv_det, c21 * inv_det, c22 * inv_det,
    ])
}

/// Transforms a point (w = 1) and divides by the resulting w.
pub fn mat4x4_transform_point(m: &Mat4x4, p: Vec3) -> Vec3 {
    let v = [p[0], p[1], p[2], 1.0];
    let x = vec4_dot(mat4x4_row(m, 0), v);
    let y = vec4_dot(mat4x4_row(m, 1), v);
    let z = vec4_dot(mat4x4_row(m, 2), v);
    let w = vec4_dot(mat4x4_row(m, 3), v);
    let w = if w == 0.0 { 1.0 } else { w };
    [x / w, y / w, z / w]
}

pub fn vec3_sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn vec3_dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn vec3_cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn vec3_length(v: Vec3) -> f32 {
    vec3_dot(v, v).sqrt()
}

pub fn vec3_normalize(v: Vec3) -> Vec3 {
    let len = vec3_length(v);
    if len == 0.0 {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Smallest power of two >= `x`, computed with the shift-or cascade.
/// Exact for every input up to 2^31; zero maps to zero.
pub fn next_power_of_two(x: u32) -> u32 {
    let mut v = x.wrapping_sub(1);
    let mut shift = 1;
    while shift < 32 {
        v |= v >> shift;
        shift <<= 1;
    }
    v.wrapping_add(1)
}

pub fn is_power_of_two(x: u32) -> bool {
    x != 0 && (x & (x - 1)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_eq(a: &[f32], b: &[f32]) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn next_power_of_two_rounds_up() {
        let inputs = [1, 2, 3, 5, 16, 17, 1023, 1024, 1025];
        let expected = [1, 2, 4, 8, 16, 32, 1024, 1024, 2048];
        for (x, want) in inputs.iter().zip(expected) {
            assert_eq!(next_power_of_two(*x), want, "input {x}");
        }
        assert_eq!(next_power_of_two(1 << 31), 1 << 31);
        assert_eq!(next_power_of_two((1 << 30) + 1), 1 << 31);
    }

    #[test]
    fn power_of_two_detection() {
        assert!(!is_power_of_two(0));
        for k in 0..32 {
            assert!(is_power_of_two(1 << k));
        }
        for x in [3, 5, 6, 7, 9, 12, 1023, 1025] {
            assert!(!is_power_of_two(x), "{x}");
        }
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let m = mat4x4_mul(
            mat4x4_translate(1.0, -2.0, 3.0),
            mat4x4_mul(mat4x4_rot_y(0.7), mat4x4_scale(2.0, 3.0, 4.0))
        );
        let inv = mat4x4_inverse(&m).unwrap();
        assert_mat_eq(&mat4x4_mul(m, inv), &mat4x4_identity());
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(mat4x4_inverse(&mat4x4_scale(1.0, 0.0, 1.0)).is_none());
        assert!(mat3x3_normal_from_mat4x4(&mat4x4_scale(0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn normal_matrix_inverts_scale() {
        let m = mat4x4_mul(mat4x4_translate(5.0, 5.0, 5.0), mat4x4_scale(2.0, 4.0, 0.5));
        let n = mat3x3_normal_from_mat4x4(&m).unwrap();
        assert_mat_eq(&n, &[0.5, 0.0, 0.0, 0.0, 0.25, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn look_at_moves_eye_to_origin() {
        let view = mat4x4_look_at([0.0, 0.0, 3.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert_mat_eq(&mat4x4_transform_point(&view, [0.0, 0.0, 3.0]), &[0.0, 0.0, 0.0]);
        assert_mat_eq(&mat4x4_transform_point(&view, [0.0, 0.0, 0.0]), &[0.0, 0.0, -3.0]);
    }

    #[test]
    fn translate_moves_points() {
        let p = mat4x4_transform_point(&mat4x4_translate(1.0, 2.0, 3.0), [1.0, 1.0, 1.0]);
        assert_mat_eq(&p, &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn rot_y_is_right_handed() {
        let p = mat4x4_transform_point(&mat4x4_rot_y(std::f32::consts::FRAC_PI_2), [0.0, 0.0, 1.0]);
        assert_mat_eq(&p, &[1.0, 0.0, 0.0]);
    }
}
