//! Planar predicates shared by every component.
//!
//! All tolerance tests compare squared lengths or cross products against the
//! caller's epsilon directly, so `eps = 0` is always a valid input.

use crate::vec2::Vec2;

/// Signed doubled area of `(a, b, p)`; positive when `p` lies left of `a -> b`.
pub fn orient(a: Vec2, b: Vec2, p: Vec2) -> f64 {
    (b - a).cross(p - a)
}

pub fn is_zero(value: f64, eps: f64) -> bool {
    value <= eps && value >= -eps
}

pub fn are_collinear(a: Vec2, b: Vec2, c: Vec2, eps: f64) -> bool {
    is_zero(orient(a, b, c), eps)
}

pub fn are_close(a: Vec2, b: Vec2, eps: f64) -> bool {
    a.distance_squared(b) <= eps * eps
}

/// Returns true if the quad `aa bb cc dd`, listed counter-clockwise, is strictly convex
pub fn is_convex_quad(aa: Vec2, bb: Vec2, cc: Vec2, dd: Vec2) -> bool {
    let v = [bb - aa, cc - bb, dd - cc, aa - dd];
    let z = [
        v[0].cross(v[1]),
        v[1].cross(v[2]),
        v[2].cross(v[3]),
        v[3].cross(v[0]),
    ];
    z.iter().all(|&z| z > 0.)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius_squared: f64,
}

impl Circle {
    /// Circumcircle of three points.
    ///
    /// A collinear triple has no finite circumcircle; it gets an infinite
    /// radius around its centroid so that every point counts as inside.
    pub fn circumscribe(aa: Vec2, bb: Vec2, cc: Vec2) -> Self {
        //   { (o[0] - A[0])^2 + (o[1] - A[1])^2 = r^2
        //   { (o[0] - B[0])^2 + (o[1] - B[1])^2 = r^2
        //   { (o[0] - C[0])^2 + (o[1] - C[1])^2 = r^2
        //
        //   { o[0] 2 (A[0] - B[0]) + o[1] 2 (A[1] - B[1]) = A^2 - B^2
        //   { o[0] 2 (B[0] - C[0]) + o[1] 2 (B[1] - C[1]) = B^2 - C^2
        let a = [
            (aa.x - bb.x) * 2.0,
            (aa.y - bb.y) * 2.0,
            (bb.x - cc.x) * 2.0,
            (bb.y - cc.y) * 2.0,
        ];
        let b = [
            aa.length_squared() - bb.length_squared(),
            bb.length_squared() - cc.length_squared(),
        ];

        let det = a[0] * a[3] - a[1] * a[2];
        let center = Vec2::new(
            (b[0] * a[3] - a[1] * b[1]) / det,
            (a[0] * b[1] - b[0] * a[2]) / det,
        );
        if det == 0. || !center.is_finite() {
            return Self {
                center: Vec2::new(
                    (aa.x + bb.x + cc.x) / 3.,
                    (aa.y + bb.y + cc.y) / 3.,
                ),
                radius_squared: f64::INFINITY,
            };
        }

        Self {
            center,
            radius_squared: center.distance_squared(aa),
        }
    }

    /// The circle having segment `a b` as its diameter.
    pub fn diametral(a: Vec2, b: Vec2) -> Self {
        Self {
            center: a.midpoint(b),
            radius_squared: a.distance_squared(b) * 0.25,
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.center.distance_squared(p) < self.radius_squared
    }

    pub fn bounds(&self) -> Rect {
        let r = self.radius_squared.sqrt();
        Rect::new(
            Vec2::new(self.center.x - r, self.center.y - r),
            Vec2::new(self.center.x + r, self.center.y + r),
        )
    }
}

/// Parametric crossing of lines `a1 a2` and `b1 b2`.
///
/// Returns `(s, t)` such that `a1 + (a2 - a1) * s == b1 + (b2 - b1) * t`, or
/// `None` when the lines are parallel.
pub fn lines_cross_args(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<(f64, f64)> {
    //       a1
    //      /
    // b1__/_______ b2
    //    /
    //   a2
    //
    //  { (ax2 - ax1) s  +  (bx1 - bx2) t  =  bx1 - ax1
    //  { (ay2 - ay1) s  +  (by1 - by2) t  =  by1 - ay1
    let aa1 = a2.x - a1.x;
    let bb1 = b1.x - b2.x;
    let aa2 = a2.y - a1.y;
    let bb2 = b1.y - b2.y;
    let cc1 = b1.x - a1.x;
    let cc2 = b1.y - a1.y;

    let det = aa1 * bb2 - bb1 * aa2;
    if det == 0. {
        return None;
    }
    let inv = 1.0 / det;
    let s = (cc1 * bb2 - bb1 * cc2) * inv;
    let t = (aa1 * cc2 - cc1 * aa2) * inv;
    if s.is_finite() && t.is_finite() {
        Some((s, t))
    } else {
        None
    }
}

/// Returns true if the open sight line `from -> to` passes through segment `a b`.
///
/// Touching the segment exactly at `to` does not block the view.
pub fn blocks_sight(from: Vec2, to: Vec2, a: Vec2, b: Vec2) -> bool {
    match lines_cross_args(from, to, a, b) {
        Some((s, t)) => s > 0. && s < 1. && (0. ..=1.).contains(&t),
        None => false,
    }
}

/// Linear interpolation of a scalar along `a b`, with `p` projected and clamped onto the segment.
pub fn interpolate_along(a: Vec2, value_a: f64, b: Vec2, value_b: f64, p: Vec2) -> f64 {
    let d = b - a;
    let len2 = d.length_squared();
    if len2 <= f64::MIN_POSITIVE {
        return 0.5 * (value_a + value_b);
    }
    let t = ((p - a).dot(d) / len2).clamp(0., 1.);
    value_a + t * (value_b - value_a)
}

/// Seed value at `p` on segment `a b`; a missing endpoint seed defers to the other one.
pub fn seed_along(
    a: Vec2,
    seed_a: Option<f64>,
    b: Vec2,
    seed_b: Option<f64>,
    p: Vec2,
) -> Option<f64> {
    match (seed_a, seed_b) {
        (Some(sa), Some(sb)) => Some(interpolate_along(a, sa, b, sb, p)),
        (Some(s), None) | (None, Some(s)) => Some(s),
        (None, None) => None,
    }
}

/// Barycentric seed value at `p` inside a triangle; falls back to the mean of the known seeds.
pub fn seed_in_triangle(corners: [Vec2; 3], seeds: [Option<f64>; 3], p: Vec2) -> Option<f64> {
    if let [Some(s0), Some(s1), Some(s2)] = seeds {
        let e0 = corners[1] - corners[0];
        let e1 = corners[2] - corners[0];
        let denom = e0.cross(e1);
        if denom != 0. {
            let d = p - corners[0];
            let w1 = d.cross(e1) / denom;
            let w2 = e0.cross(d) / denom;
            let w0 = 1.0 - w1 - w2;
            return Some(w0 * s0 + w1 * s1 + w2 * s2);
        }
    }
    mean_seed(&seeds)
}

pub fn mean_seed(seeds: &[Option<f64>]) -> Option<f64> {
    let known: Vec<f64> = seeds.iter().flatten().copied().collect();
    if known.is_empty() {
        None
    } else {
        Some(known.iter().sum::<f64>() / known.len() as f64)
    }
}

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Bounding box of `points`, or `None` when the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |r, p| r.union_point(p)))
    }

    pub fn union_point(&self, p: Vec2) -> Self {
        Self {
            min: Vec2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Vec2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: Vec2::new(self.min.x - margin, self.min.y - margin),
            max: Vec2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        self.min.midpoint(self.max)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
