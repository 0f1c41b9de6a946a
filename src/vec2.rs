use std::ops::{Add, Mul, Sub};

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2::new(0., 0.);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(*self)
    }

    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    pub fn distance_squared(&self, rhs: Vec2) -> f64 {
        (*self - rhs).length_squared()
    }

    pub fn dot(&self, rhs: Vec2) -> f64 {
        (self.x * rhs.x) + (self.y * rhs.y)
    }

    pub fn cross(&self, rhs: Vec2) -> f64 {
        (self.x * rhs.y) - (self.y * rhs.x)
    }

    pub fn midpoint(&self, rhs: Vec2) -> Vec2 {
        Vec2::new((self.x + rhs.x) * 0.5, (self.y + rhs.y) * 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add<Vec2> for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x.add(rhs.x),
            y: self.y.add(rhs.y),
        }
    }
}

impl Sub<Vec2> for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x.sub(rhs.x),
            y: self.y.sub(rhs.y),
        }
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x.mul(rhs),
            y: self.y.mul(rhs),
        }
    }
}
