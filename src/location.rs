//! Integer positions at the three resolutions a map is addressed in.
//!
//! A [`TilePosition`] covers 4x4 [`WalkPosition`]s and a `WalkPosition`
//! covers 8x8 [`PixelPosition`]s. Converting down a resolution truncates.

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

macro_rules! position_type {
    ($(#[$meta:meta])* $name:ident, $pixels:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            pub x: i32,
            pub y: i32,
        }

        impl $name {
            /// Pixels along one side of the cell addressed by this position type.
            pub const PIXELS: i32 = $pixels;

            #[inline]
            pub const fn new(x: i32, y: i32) -> Self {
                $name { x, y }
            }

            #[inline]
            pub fn offset(self, dx: i32, dy: i32) -> Self {
                $name::new(self.x + dx, self.y + dy)
            }

            /// Chebyshev distance.
            #[inline]
            pub fn queen_wise_distance(self, other: Self) -> i32 {
                (self.x - other.x).abs().max((self.y - other.y).abs())
            }

            #[inline]
            pub fn squared_distance(self, other: Self) -> i32 {
                let dx = self.x - other.x;
                let dy = self.y - other.y;
                dx * dx + dy * dy
            }

            pub fn distance(self, other: Self) -> f64 {
                (self.squared_distance(other) as f64).sqrt()
            }

            pub fn rounded_distance(self, other: Self) -> i32 {
                (0.5 + self.distance(other)) as i32
            }

            /// Top left pixel of the addressed cell.
            #[inline]
            pub fn to_pixel(self) -> PixelPosition {
                PixelPosition::new(self.x * $pixels, self.y * $pixels)
            }

            /// Center pixel of the addressed cell.
            #[inline]
            pub fn center(self) -> PixelPosition {
                PixelPosition::new(self.x * $pixels + $pixels / 2, self.y * $pixels + $pixels / 2)
            }
        }

        impl Add for $name {
            type Output = $name;

            #[inline]
            fn add(self, other: $name) -> $name {
                $name::new(self.x + other.x, self.y + other.y)
            }
        }

        impl Sub for $name {
            type Output = $name;

            #[inline]
            fn sub(self, other: $name) -> $name {
                $name::new(self.x - other.x, self.y - other.y)
            }
        }

        impl Add<i32> for $name {
            type Output = $name;

            #[inline]
            fn add(self, value: i32) -> $name {
                $name::new(self.x + value, self.y + value)
            }
        }

        impl Sub<i32> for $name {
            type Output = $name;

            #[inline]
            fn sub(self, value: i32) -> $name {
                $name::new(self.x - value, self.y - value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "({}, {})", self.x, self.y)
            }
        }
    };
}

position_type!(
    /// Position in pixels.
    PixelPosition,
    1
);

position_type!(
    /// Position in mini tiles, the resolution walkability is known at.
    WalkPosition,
    WALK_PIXEL_SIZE
);

position_type!(
    /// Position in tiles, the resolution buildings are placed at.
    TilePosition,
    TILE_PIXEL_SIZE
);

impl From<TilePosition> for WalkPosition {
    fn from(t: TilePosition) -> WalkPosition {
        WalkPosition::new(t.x * TILE_WALK_SIZE, t.y * TILE_WALK_SIZE)
    }
}

impl From<WalkPosition> for TilePosition {
    fn from(w: WalkPosition) -> TilePosition {
        TilePosition::new(w.x / TILE_WALK_SIZE, w.y / TILE_WALK_SIZE)
    }
}

impl From<PixelPosition> for WalkPosition {
    fn from(p: PixelPosition) -> WalkPosition {
        WalkPosition::new(p.x / WALK_PIXEL_SIZE, p.y / WALK_PIXEL_SIZE)
    }
}

impl From<PixelPosition> for TilePosition {
    fn from(p: PixelPosition) -> TilePosition {
        TilePosition::new(p.x / TILE_PIXEL_SIZE, p.y / TILE_PIXEL_SIZE)
    }
}

impl From<WalkPosition> for PixelPosition {
    fn from(w: WalkPosition) -> PixelPosition {
        w.to_pixel()
    }
}

impl From<TilePosition> for PixelPosition {
    fn from(t: TilePosition) -> PixelPosition {
        t.to_pixel()
    }
}

impl PixelPosition {
    /// The game's integer approximation of euclidean distance, used for ground path lengths.
    pub fn approx_distance(self, other: PixelPosition) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        let min = dx.min(dy);
        let max = dx.max(dy);

        if min < (max >> 2) {
            return max;
        }

        let min_calc = (3 * min) >> 3;
        (min_calc >> 5) + min_calc + max - (max >> 4) - (max >> 6)
    }

    /// Distance from this pixel to the pixel rectangle covered by `size` tiles starting at `top_left`.
    pub fn distance_to_rectangle(self, top_left: TilePosition, size: TilePosition) -> i32 {
        let tl = top_left.to_pixel();
        let br = (top_left + size).to_pixel() - 1;

        if self.x >= tl.x {
            if self.x <= br.x {
                if self.y > br.y {
                    self.y - br.y
                } else if self.y < tl.y {
                    tl.y - self.y
                } else {
                    0
                }
            } else if self.y > br.y {
                self.rounded_distance(br)
            } else if self.y < tl.y {
                self.rounded_distance(PixelPosition::new(br.x, tl.y))
            } else {
                self.x - br.x
            }
        } else if self.y > br.y {
            self.rounded_distance(PixelPosition::new(tl.x, br.y))
        } else if self.y < tl.y {
            self.rounded_distance(tl)
        } else {
            tl.x - self.x
        }
    }
}

fn orientation(a: PixelPosition, b: PixelPosition, c: PixelPosition) -> i64 {
    let value = (b.x - a.x) as i64 * (c.y - a.y) as i64 - (b.y - a.y) as i64 * (c.x - a.x) as i64;
    value.signum()
}

fn on_segment(a: PixelPosition, b: PixelPosition, p: PixelPosition) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether the closed segments `[a, b]` and `[c, d]` share at least one point.
pub fn segments_intersect(a: PixelPosition, b: PixelPosition, c: PixelPosition, d: PixelPosition) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(a, b, c))
        || (o2 == 0 && on_segment(a, b, d))
        || (o3 == 0 && on_segment(c, d, a))
        || (o4 == 0 && on_segment(c, d, b))
}

/// Grows the box `[top_left, bottom_right]` so that it contains `p`.
pub fn include_in_bounding_box(top_left: &mut TilePosition, bottom_right: &mut TilePosition, p: TilePosition) {
    top_left.x = top_left.x.min(p.x);
    top_left.y = top_left.y.min(p.y);
    bottom_right.x = bottom_right.x.max(p.x);
    bottom_right.y = bottom_right.y.max(p.y);
}

/// Moves `p` inside `[top_left, bottom_right]`. If the box is inverted the bottom right wins.
pub fn fit_to_bounding_box(p: &mut TilePosition, top_left: TilePosition, bottom_right: TilePosition) {
    if p.x < top_left.x {
        p.x = top_left.x;
    }
    if p.x > bottom_right.x {
        p.x = bottom_right.x;
    }
    if p.y < top_left.y {
        p.y = top_left.y;
    }
    if p.y > bottom_right.y {
        p.y = bottom_right.y;
    }
}

/// The ring of cells just outside the rectangle `size` cells wide starting at `top_left`.
pub fn outer_border(top_left: WalkPosition, size: WalkPosition) -> Vec<WalkPosition> {
    inner_border(top_left - 1, size + 2)
}

/// The cells on the edge of the rectangle `size` cells wide starting at `top_left`.
pub fn inner_border(top_left: WalkPosition, size: WalkPosition) -> Vec<WalkPosition> {
    let mut border = Vec::new();

    for dy in 0..size.y {
        for dx in 0..size.x {
            if dy == 0 || dy == size.y - 1 || dx == 0 || dx == size.x - 1 {
                border.push(top_left.offset(dx, dy));
            }
        }
    }

    border
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_conversions_truncate() {
        let p = PixelPosition::new(75, 40);
        assert_eq!(WalkPosition::from(p), WalkPosition::new(9, 5));
        assert_eq!(TilePosition::from(p), TilePosition::new(2, 1));
        assert_eq!(WalkPosition::from(TilePosition::new(3, 2)), WalkPosition::new(12, 8));
        assert_eq!(TilePosition::new(3, 2).center(), PixelPosition::new(112, 80));
        assert_eq!(WalkPosition::new(1, 1).center(), PixelPosition::new(12, 12));
    }

    #[test]
    fn approx_distance_matches_axis_distance() {
        let a = PixelPosition::new(0, 0);
        assert_eq!(a.approx_distance(PixelPosition::new(100, 0)), 100);
        assert_eq!(a.approx_distance(PixelPosition::new(100, 10)), 100);

        assert_eq!(a.approx_distance(PixelPosition::new(100, 100)), 131);
    }

    #[test]
    fn distance_to_rectangle_sides_and_corners() {
        let tl = TilePosition::new(1, 1);
        let size = TilePosition::new(2, 1);

        // Inside.
        assert_eq!(PixelPosition::new(40, 40).distance_to_rectangle(tl, size), 0);
        // West and north.
        assert_eq!(PixelPosition::new(22, 40).distance_to_rectangle(tl, size), 10);
        assert_eq!(PixelPosition::new(40, 2).distance_to_rectangle(tl, size), 30);
        // East edge is the last covered pixel.
        assert_eq!(PixelPosition::new(100, 40).distance_to_rectangle(tl, size), 5);
        // North west corner.
        assert_eq!(PixelPosition::new(29, 28).distance_to_rectangle(tl, size), 5);
    }

    #[test]
    fn crossing_and_disjoint_segments() {
        let p = PixelPosition::new;
        assert!(segments_intersect(p(0, 0), p(10, 10), p(0, 10), p(10, 0)));
        assert!(!segments_intersect(p(0, 0), p(10, 0), p(0, 5), p(10, 5)));
        assert!(segments_intersect(p(0, 0), p(10, 0), p(10, 0), p(10, 5)));
        assert!(!segments_intersect(p(0, 0), p(4, 0), p(5, 0), p(9, 0)));
    }

    #[test]
    fn outer_border_rings_the_rectangle() {
        let border = outer_border(WalkPosition::new(2, 2), WalkPosition::new(2, 1));
        assert_eq!(border.len(), 10);
        assert!(border.contains(&WalkPosition::new(1, 1)));
        assert!(border.contains(&WalkPosition::new(4, 3)));
        assert!(!border.contains(&WalkPosition::new(2, 2)));
    }

    #[test]
    fn fit_to_inverted_box_prefers_bottom_right() {
        let mut p = TilePosition::new(0, 0);
        fit_to_bounding_box(&mut p, TilePosition::new(5, 5), TilePosition::new(3, 3));
        assert_eq!(p, TilePosition::new(3, 3));
    }
}
