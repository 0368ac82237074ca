use rand::Rng;

use crate::border::Border;
use crate::snake::Snake;
use crate::utils::Point;

/// Where the apple sits on a fresh board.
pub const START_APPLE: Point = Point::new(10, 10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Food {
    /// `None` once the snake covers every cell.
    pub position: Option<Point>,
}

impl Food {
    pub fn new() -> Self {
        Self { position: Some(START_APPLE) }
    }

    /// Moves the apple to a uniformly random cell not covered by the snake,
    /// by rejection sampling. When the snake covers the whole board the
    /// apple is removed and `false` is returned.
    pub fn respawn<R: Rng + ?Sized>(&mut self, snake: &Snake, border: &Border, rng: &mut R) -> bool {
        if snake.len() >= border.cells() {
            self.position = None;
            return false;
        }
        loop {
            let pos = Point::new(
                rng.gen_range(0..border.width as i32),
                rng.gen_range(0..border.height as i32),
            );
            if !snake.contains(pos) {
                self.position = Some(pos);
                return true;
            }
        }
    }
}

impl Default for Food {
    fn default() -> Self {
        Self::new()
    }
}
