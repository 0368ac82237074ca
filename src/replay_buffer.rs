use rand::Rng;

/// A single experience tuple (s, a, r, s', done).
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub done: bool,
}

/// Ring replay buffer: once full, each insert overwrites the oldest entry.
pub struct ReplayBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    next: usize, // next overwrite position, also the oldest entry once full
}

/// Transitions drawn by [`ReplayBuffer::sample`]. Borrows the buffer, so it
/// cannot outlive the next insert.
pub struct Batch<'a> {
    items: Vec<&'a Transition>,
}

impl<'a> Batch<'a> {
    pub fn from_refs(items: Vec<&'a Transition>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Transition> + '_ {
        self.items.iter().copied()
    }
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be positive");
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    /// Stores owned copies of both state vectors.
    pub fn add(&mut self, state: &[f32], action: usize, reward: f32, next_state: &[f32], done: bool) {
        self.push(Transition {
            state: state.to_vec(),
            action,
            reward,
            next_state: next_state.to_vec(),
            done,
        });
    }

    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.next] = transition;
            self.next = (self.next + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Are there at least `batch_size` transitions to learn from.
    pub fn is_ready(&self, batch_size: usize) -> bool {
        self.buffer.len() >= batch_size
    }

    /// `batch_size` uniform draws with replacement; `None` when empty.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Option<Batch<'_>> {
        if self.buffer.is_empty() {
            return None;
        }
        let n = self.buffer.len();
        let items = (0..batch_size).map(|_| &self.buffer[rng.gen_range(0..n)]).collect();
        Some(Batch { items })
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let (newer, older) = if self.buffer.len() < self.capacity {
            self.buffer.split_at(self.buffer.len())
        } else {
            self.buffer.split_at(self.next)
        };
        older.iter().chain(newer.iter())
    }
}
