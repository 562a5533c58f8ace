//! Skew estimation from the minimum-area rectangle around dark pixels.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::trace;

/// Largest correction ever applied, in degrees.
pub const MAX_SKEW_DEG: f32 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

/// Estimated clockwise skew of the page content, in degrees within
/// `[-45, 45]`. Returns 0 when there is too little foreground to tell.
pub fn estimate_skew(image: &GrayImage) -> f32 {
    let points = foreground_extremes(image);
    let hull = convex_hull(&points);
    if hull.len() < 3 {
        return 0.0;
    }

    let angle = normalize(min_area_angle(&hull));
    trace!("Hull of {} points, skew {:.2} deg", hull.len(), angle);
    angle.clamp(-MAX_SKEW_DEG, MAX_SKEW_DEG)
}

/// Rotate clockwise by `degrees` about the centre, filling with white.
pub fn rotate(image: &GrayImage, degrees: f32) -> GrayImage {
    rotate_about_center(image, degrees.to_radians(), Interpolation::Bicubic, Luma([255]))
}

/// Undo the estimated skew when it exceeds `tolerance_deg`.
pub fn deskew(image: &GrayImage, tolerance_deg: f32) -> GrayImage {
    let angle = estimate_skew(image);
    if angle.abs() > tolerance_deg {
        trace!("Correcting skew of {:.2} deg", angle);
        rotate(image, -angle)
    } else {
        image.clone()
    }
}

/// Leftmost and rightmost dark pixel of every row. Their hull equals the
/// hull of all dark pixels.
fn foreground_extremes(image: &GrayImage) -> Vec<Point> {
    let level = otsu_level(image);
    let (width, height) = image.dimensions();
    let mut points = Vec::new();

    for y in 0..height {
        let dark = |x: &u32| image.get_pixel(*x, y)[0] <= level;
        let first = (0..width).find(dark);
        let last = (0..width).rev().find(dark);
        if let (Some(first), Some(last)) = (first, last) {
            points.push(Point { x: first as f32, y: y as f32 });
            if last != first {
                points.push(Point { x: last as f32, y: y as f32 });
            }
        }
    }

    points
}

/// Andrew's monotone chain.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y)));

    let mut lower: Vec<Point> = Vec::new();
    for p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point> = Vec::new();
    for p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Edge angle (degrees) of the minimum-area enclosing rectangle, found with
/// rotating calipers over the hull edges.
fn min_area_angle(hull: &[Point]) -> f32 {
    let n = hull.len();
    let mut best_area = f32::MAX;
    let mut best_angle = 0.0;

    for i in 0..n {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % n];
        let (ex, ey) = (p2.x - p1.x, p2.y - p1.y);
        let len = ex.hypot(ey);
        if len < 1e-6 {
            continue;
        }
        let (ux, uy) = (ex / len, ey / len);

        let (mut min_u, mut max_u) = (f32::MAX, f32::MIN);
        let (mut min_v, mut max_v) = (f32::MAX, f32::MIN);
        for p in hull {
            let (dx, dy) = (p.x - p1.x, p.y - p1.y);
            let u = dx * ux + dy * uy;
            let v = -dx * uy + dy * ux;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if area < best_area {
            best_area = area;
            best_angle = uy.atan2(ux).to_degrees();
        }
    }

    best_angle
}

/// Fold a rectangle edge angle into `(-45, 45]`. Any side of the rectangle
/// describes the same skew.
fn normalize(angle: f32) -> f32 {
    let mut folded = angle % 90.0;
    if folded > 45.0 {
        folded -= 90.0;
    } else if folded <= -45.0 {
        folded += 90.0;
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_page() -> GrayImage {
        let mut image = GrayImage::from_pixel(200, 200, Luma([255]));
        for y in 92..108 {
            for x in 30..170 {
                image.put_pixel(x, y, Luma([0]));
            }
        }
        image
    }

    #[test]
    fn test_normalize_folds_into_range() {
        assert_eq!(normalize(0.0), 0.0);
        assert_eq!(normalize(180.0), 0.0);
        assert_eq!(normalize(-90.0), 0.0);
        assert!((normalize(95.0) - 5.0).abs() < 1e-4);
        assert!((normalize(-175.0) - 5.0).abs() < 1e-4);
        assert!((normalize(-50.0) - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_level_bar_has_no_skew() {
        assert!(estimate_skew(&bar_page()).abs() < 0.5);
    }

    #[test]
    fn test_blank_page_has_no_skew() {
        let blank = GrayImage::from_pixel(50, 50, Luma([255]));
        assert_eq!(estimate_skew(&blank), 0.0);
    }

    #[test]
    fn test_rotated_bar_is_detected_and_corrected() {
        let tilted = rotate(&bar_page(), 6.0);
        let angle = estimate_skew(&tilted);
        assert!((angle.abs() - 6.0).abs() < 1.0, "estimated {}", angle);

        let corrected = deskew(&tilted, 0.5);
        assert!(estimate_skew(&corrected).abs() < 1.0);
    }

    #[test]
    fn test_small_skew_is_left_alone() {
        let page = bar_page();
        assert_eq!(deskew(&page, 0.5), page);
    }

    #[test]
    fn test_hull_of_square() {
        let points = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 1.0, y: 0.0 },
            Point { x: 0.5, y: 0.5 },
            Point { x: 1.0, y: 1.0 },
            Point { x: 0.0, y: 1.0 },
        ];
        assert_eq!(convex_hull(&points).len(), 4);
    }
}
