//! Grid rules: movement, collisions, growth and apple placement.

use rand::Rng;

use crate::border::Border;
use crate::food::Food;
use crate::snake::{Direction, Snake, Turn};
use crate::utils::Point;

/// game size in cells
pub const GRID_WIDTH: u32 = 20;
pub const GRID_HEIGHT: u32 = 20;

/// Body on a fresh board, tail first.
pub const START_BODY: [Point; 2] = [Point::new(5, 5), Point::new(5, 6)];
pub const START_DIRECTION: Direction = Direction::Right;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved one cell, length unchanged.
    Moved,
    /// Ate the apple and grew by one segment.
    Ate,
    /// Head left the board; the snake is dead.
    HitWall,
    /// Head ran into the body; the snake is dead.
    HitSelf,
    /// The snake was already dead, nothing changed.
    AlreadyDead,
}

impl StepOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, StepOutcome::HitWall | StepOutcome::HitSelf | StepOutcome::AlreadyDead)
    }
}

/// Snake, apple, heading and death flag on a fixed 20×20 board.
#[derive(Debug, Clone)]
pub struct GridEnvironment {
    border: Border,
    snake: Snake,
    food: Food,
    direction: Direction,
    dead: bool,
    random_start_apple: bool,
}

impl GridEnvironment {
    pub fn new() -> Self {
        Self {
            border: Border::new(GRID_WIDTH, GRID_HEIGHT),
            snake: Snake::new(&START_BODY),
            food: Food::new(),
            direction: START_DIRECTION,
            dead: false,
            random_start_apple: false,
        }
    }

    /// Places the first apple of every episode on a random free cell instead
    /// of the fixed start cell.
    pub fn with_random_start_apple(mut self, enabled: bool) -> Self {
        self.random_start_apple = enabled;
        self
    }

    /// Back to the fixed start position.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.snake = Snake::new(&START_BODY);
        self.direction = START_DIRECTION;
        self.dead = false;
        self.food = Food::new();
        if self.random_start_apple {
            self.food.respawn(&self.snake, &self.border, rng);
        }
    }

    /// Advances one tick.
    ///
    /// Collisions are checked against the body as it was before the move, so
    /// running into the current tail cell is fatal even though the tail would
    /// have moved away.
    pub fn step<R: Rng + ?Sized>(&mut self, turn: Turn, rng: &mut R) -> StepOutcome {
        if self.dead {
            return StepOutcome::AlreadyDead;
        }

        self.direction = turn.apply(self.direction);
        let new_head = self.snake.head().offset(self.direction.delta());

        if !self.border.is_inside(new_head) {
            self.dead = true;
            return StepOutcome::HitWall;
        }
        if self.snake.contains(new_head) {
            self.dead = true;
            return StepOutcome::HitSelf;
        }

        if self.food.position == Some(new_head) {
            self.snake.advance(new_head, true);
            // board full: the apple is removed, the next move is fatal
            self.food.respawn(&self.snake, &self.border, rng);
            StepOutcome::Ate
        } else {
            self.snake.advance(new_head, false);
            StepOutcome::Moved
        }
    }

    /// Puts the apple on `p`. Refuses cells off the board or under the snake.
    pub fn place_apple(&mut self, p: Point) -> bool {
        if !self.border.is_inside(p) || self.snake.contains(p) {
            return false;
        }
        self.food.position = Some(p);
        true
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    /// `None` only after the snake has filled the board.
    pub fn apple(&self) -> Option<Point> {
        self.food.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn border(&self) -> &Border {
        &self.border
    }

    /// Manhattan distance from the head to the apple, 0 without an apple.
    pub fn apple_distance(&self) -> i32 {
        self.food.position.map_or(0, |apple| self.snake.head().manhattan(apple))
    }
}

impl Default for GridEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
