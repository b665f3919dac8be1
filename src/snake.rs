use std::collections::{HashSet, VecDeque};

use crate::geometry::rescale;
use crate::Px;

use Direction::*;

pub const STARTING_LENGTH: usize = 4;

/// One board cell, in pixel coordinates. Always a multiple of the current
/// cell size while a game is live.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Point {
    pub x: Px,
    pub y: Px,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    /// A direction change is legal only across axes: no 180 degree reversal,
    /// and repeating the current axis is pointless.
    pub fn is_perpendicular(self, other: Direction) -> bool {
        self.horizontal() != other.horizontal()
    }

    fn horizontal(self) -> bool {
        matches!(self, Left | Right)
    }

    /// One cell step from `from`, wrapping toroidally at the board edges.
    pub fn step(self, from: Point, cell: Px, bounds: (Px, Px)) -> Point {
        let (width, height) = bounds;
        match self {
            Left => Point {
                x: (if from.x == 0 { width } else { from.x }) - cell,
                y: from.y,
            },
            Up => Point {
                x: from.x,
                y: (if from.y == 0 { height } else { from.y }) - cell,
            },
            Right => {
                let x = from.x + cell;
                Point { x: if x == width { 0 } else { x }, y: from.y }
            }
            Down => {
                let y = from.y + cell;
                Point { x: from.x, y: if y == height { 0 } else { y } }
            }
        }
    }
}

/// The segment chain, head at the front, plus an occupancy set mirroring it.
/// The set is what collision checks and food placement consult, instead of
/// reading pixels back from the drawing surface.
pub struct Body {
    segments: VecDeque<Point>,
    occupied: HashSet<Point>,
}

impl Body {
    /// The initial body: STARTING_LENGTH segments on the origin row, one
    /// cell apart, head rightmost.
    pub fn start(origin: (Px, Px), cell: Px) -> Self {
        let segments: VecDeque<Point> = (0..STARTING_LENGTH)
            .map(|i| Point {
                x: origin.0 + (STARTING_LENGTH - 1 - i) as Px * cell,
                y: origin.1,
            })
            .collect();
        let occupied = segments.iter().copied().collect();
        Body { segments, occupied }
    }

    pub fn head(&self) -> Point {
        self.segments[0]
    }

    pub fn tail(&self) -> Point {
        *self.segments.back().unwrap()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.occupied.contains(&p)
    }

    pub fn segments(&self) -> impl Iterator<Item = Point> + '_ {
        self.segments.iter().copied()
    }

    /// Grow by one: a new head is inserted, nothing vacates.
    pub fn grow(&mut self, new_head: Point) {
        self.segments.push_front(new_head);
        self.occupied.insert(new_head);
    }

    /// Plain move: the tail segment is recycled as the new head. Returns the
    /// vacated cell so the caller can erase it. Constant-size, the chain is
    /// never reallocated.
    pub fn slide(&mut self, new_head: Point) -> Point {
        let vacated = self.segments.pop_back().unwrap();
        self.occupied.remove(&vacated);
        self.segments.push_front(new_head);
        self.occupied.insert(new_head);
        vacated
    }

    /// Move every segment to a new cell size, keeping the legacy truncating
    /// arithmetic, and rebuild the occupancy set.
    pub fn rescale(&mut self, old: Px, new: Px) {
        for seg in self.segments.iter_mut() {
            seg.x = rescale(old, new, seg.x);
            seg.y = rescale(old, new, seg.y);
        }
        self.occupied = self.segments.iter().copied().collect();
    }

    /// Replace the whole chain, head first. Test hook, also keeps the
    /// occupancy set consistent.
    pub fn replace(&mut self, segments_head_first: &[Point]) {
        self.segments = segments_head_first.iter().copied().collect();
        self.occupied = segments_head_first.iter().copied().collect();
    }
}
