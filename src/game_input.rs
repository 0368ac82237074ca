use crate::game::{GRID_HEIGHT, GRID_WIDTH, GridEnvironment};
use crate::snake::Direction;

/// Number of board cells in the occupancy plane.
pub const GRID_CELLS: usize = (GRID_WIDTH * GRID_HEIGHT) as usize;

/// Length of an encoded state: occupancy plane + apple (x, y) + direction one-hot.
pub const STATE_DIM: usize = GRID_CELLS + 2 + 4;

const APPLE_X: usize = GRID_CELLS;
const APPLE_Y: usize = GRID_CELLS + 1;
const DIRECTION_OFFSET: usize = GRID_CELLS + 2;

/// Turns a board snapshot into the network's input vector.
///
/// Layout:
/// - `[0, 400)`: 1.0 where a body segment sits, row-major (`y * 20 + x`).
///   The apple is not marked here.
/// - `400, 401`: apple x and y divided by 19.
/// - `402..406`: direction one-hot in `[Up, Right, Down, Left]` order.
pub struct GameInput;

impl GameInput {
    pub fn from_game(game: &GridEnvironment) -> Vec<f32> {
        let mut input = vec![0.0f32; STATE_DIM];
        let border = game.border();

        for segment in game.snake().segments() {
            input[border.index_of(segment)] = 1.0;
        }

        if let Some(apple) = game.apple() {
            input[APPLE_X] = apple.x as f32 / (GRID_WIDTH - 1) as f32;
            input[APPLE_Y] = apple.y as f32 / (GRID_HEIGHT - 1) as f32;
        }

        input[DIRECTION_OFFSET + Self::direction_slot(game.direction())] = 1.0;
        input
    }

    /// Slot of `dir` inside the one-hot block. Persisted weights depend on
    /// this order, so it must never change.
    pub fn direction_slot(dir: Direction) -> usize {
        dir.index()
    }
}
