use serde::{Deserialize, Serialize};

/// Absolute screen position in physical pixels.
/// Serialized as a two-element array, `[x, y]`, to keep config files terse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Rectangular selection defined by the two corners a drag runs between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: Point,
    pub end: Point,
}

impl Region {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Linear interpolation along the drag path, `t` in 0.0–1.0.
    pub fn lerp(&self, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        let x = self.start.x as f64 + (self.end.x - self.start.x) as f64 * t;
        let y = self.start.y as f64 + (self.end.y - self.start.y) as f64 * t;
        Point::new(x.round() as i32, y.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_reads_from_toml_array() {
        #[derive(Deserialize)]
        struct Wrapper {
            at: Point,
        }
        let w: Wrapper = toml::from_str("at = [617, 1050]").unwrap();
        assert_eq!(w.at, Point::new(617, 1050));
    }

    #[test]
    fn lerp_hits_both_corners() {
        let region = Region::new(Point::new(523, 183), Point::new(1397, 1013));
        assert_eq!(region.lerp(0.0), region.start);
        assert_eq!(region.lerp(1.0), region.end);
        assert_eq!(region.lerp(0.5), Point::new(960, 598));
    }
}
