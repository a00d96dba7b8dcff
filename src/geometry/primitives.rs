//! Per-element measures over vertex positions.
//!
//! Polygons are given as their ordered vertex positions. Non-planar polygons
//! are fanned around their barycenter, so the normal is the area-weighted
//! average of the fan triangles and the area is the sum of their areas.

use super::Vec3;

/// Arithmetic mean of `pts`. Returns the origin for an empty slice.
pub fn barycenter(pts: &[Vec3]) -> Vec3 {
    if pts.is_empty() {
        return Vec3::zeros();
    }
    pts.iter().sum::<Vec3>() / pts.len() as f64
}

/// `(b - a) × (c - a)`: twice the signed area vector of a triangle.
pub fn triangle_cross(a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    (b - a).cross(&(c - a))
}

pub fn triangle_area(a: &Vec3, b: &Vec3, c: &Vec3) -> f64 {
    0.5 * triangle_cross(a, b, c).norm()
}

/// Sum of the fan cross products around the barycenter.
///
/// Its norm is twice the polygon area; its direction follows the winding.
fn polygon_cross(pts: &[Vec3]) -> Vec3 {
    let n = pts.len();
    if n < 3 {
        return Vec3::zeros();
    }
    if n == 3 {
        return triangle_cross(&pts[0], &pts[1], &pts[2]);
    }
    let g = barycenter(pts);
    (0..n)
        .map(|i| triangle_cross(&g, &pts[i], &pts[(i + 1) % n]))
        .sum()
}

/// Unit normal of a polygon; zero for degenerate input.
pub fn polygon_normal(pts: &[Vec3]) -> Vec3 {
    let n = polygon_cross(pts);
    let len = n.norm();
    if len > 0.0 { n / len } else { Vec3::zeros() }
}

/// Unsigned area of a polygon.
pub fn polygon_area(pts: &[Vec3]) -> f64 {
    0.5 * polygon_cross(pts).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> [Vec3; 4] {
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ]
    }

    #[test]
    fn triangle_measures() {
        let [a, b, c, _] = square();
        assert_eq!(triangle_area(&a, &b, &c), 2.0);
        assert_eq!(polygon_normal(&[a, b, c]), Vec3::z());
        assert_eq!(polygon_normal(&[a, c, b]), -Vec3::z());
    }

    #[test]
    fn square_measures() {
        let sq = square();
        assert_eq!(barycenter(&sq), Vec3::new(1.0, 1.0, 0.0));
        assert!((polygon_area(&sq) - 4.0).abs() < 1e-12);
        assert!((polygon_normal(&sq) - Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(barycenter(&[]), Vec3::zeros());
        assert_eq!(polygon_area(&square()[..2]), 0.0);
        let collinear = [Vec3::zeros(), Vec3::x(), Vec3::x() * 2.0];
        assert_eq!(polygon_normal(&collinear), Vec3::zeros());
    }
}
