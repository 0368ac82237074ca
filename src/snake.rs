use std::collections::VecDeque;

use crate::utils::Point;

/// Heading of the snake. Variants are listed in clockwise order; turning
/// right walks forward through this cycle and turning left walks back.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Clockwise cycle, also the slot order of the direction one-hot block.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// Position in the clockwise cycle.
    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    /// 90° counter-clockwise.
    pub fn left(&self) -> Direction {
        match self {
            Direction::Up => Direction::Left,
            Direction::Right => Direction::Up,
            Direction::Down => Direction::Right,
            Direction::Left => Direction::Down,
        }
    }

    /// 90° clockwise.
    pub fn right(&self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub fn opposite(&self) -> Direction {
        self.right().right()
    }

    /// Coordinate offset (dx, dy) of one step in this direction.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// Relative steering command. Action indices are fixed:
/// 0 = turn left, 1 = straight, 2 = turn right.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Turn {
    Left,
    Straight,
    Right,
}

impl Turn {
    pub const COUNT: usize = 3;

    pub fn from_action(action: usize) -> Option<Turn> {
        match action {
            0 => Some(Turn::Left),
            1 => Some(Turn::Straight),
            2 => Some(Turn::Right),
            _ => None,
        }
    }

    pub fn action(&self) -> usize {
        match self {
            Turn::Left => 0,
            Turn::Straight => 1,
            Turn::Right => 2,
        }
    }

    pub fn apply(&self, dir: Direction) -> Direction {
        match self {
            Turn::Left => dir.left(),
            Turn::Straight => dir,
            Turn::Right => dir.right(),
        }
    }
}

/// Snake body, oldest segment (tail) at the front, head at the back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Point>,
}

impl Snake {
    /// Builds a snake from segments listed tail first.
    pub fn new(segments: &[Point]) -> Snake {
        debug_assert!(segments.len() >= 2, "a snake starts with at least two segments");
        Snake { body: segments.iter().copied().collect() }
    }

    pub fn head(&self) -> Point {
        self.body[self.body.len() - 1]
    }

    pub fn tail(&self) -> Point {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.body.contains(&p)
    }

    /// Segments from tail to head.
    pub fn segments(&self) -> impl Iterator<Item = Point> + '_ {
        self.body.iter().copied()
    }

    /// Pushes a new head. Unless `grow` is set the tail is dropped, keeping
    /// the length unchanged.
    pub fn advance(&mut self, new_head: Point, grow: bool) {
        self.body.push_back(new_head);
        if !grow {
            self.body.pop_front();
        }
    }
}
