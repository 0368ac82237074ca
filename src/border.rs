use crate::utils::Point;

/// Rectangular playing field, cells `0..width` × `0..height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub width: u32,
    pub height: u32,
}

impl Border {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_inside(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as u32) < self.width && (p.y as u32) < self.height
    }

    pub fn cells(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Row-major index of an inside cell.
    pub fn index_of(&self, p: Point) -> usize {
        p.y as usize * self.width as usize + p.x as usize
    }
}
