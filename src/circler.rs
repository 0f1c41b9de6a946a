use crate::mesh::{Mesh, Triangle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Turn {
    Clockwise,
    CounterClockwise,
    Done,
}

/// Walks the fan of triangles around one vertex.
///
/// Starting from `start`, the walk first turns clockwise (across the edge that
/// leaves the vertex) until it is back at `start` or runs into the boundary. In
/// the latter case it resumes counter-clockwise from `start` until the other
/// side of the boundary. Every incident triangle is yielded exactly once, in a
/// reproducible order.
pub struct Circler<'a> {
    triangles: &'a [Triangle],
    vertex: usize,
    start: usize,
    current: Option<usize>,
    turn: Turn,
    budget: usize,
}

impl<'a> Circler<'a> {
    pub fn new(triangles: &'a [Triangle], start: usize, vertex: usize) -> Self {
        let turn = match triangles.get(start) {
            Some(t) if t.index_of(vertex).is_some() => Turn::Clockwise,
            _ => Turn::Done,
        };
        Self {
            triangles,
            vertex,
            start,
            current: Some(start),
            turn,
            budget: triangles.len(),
        }
    }

    fn step(&self, triangle: usize, turn: Turn) -> Option<usize> {
        let t = &self.triangles[triangle];
        let i = t.index_of(self.vertex)?;
        match turn {
            Turn::Clockwise => t.adjacent[i],
            Turn::CounterClockwise => t.adjacent[(i + 2) % 3],
            Turn::Done => None,
        }
    }
}

impl<'a> Iterator for Circler<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.turn == Turn::Done || self.budget == 0 {
            return None;
        }
        let current = self.current?;
        self.budget -= 1;

        match self.turn {
            Turn::Clockwise => match self.step(current, Turn::Clockwise) {
                Some(next) if next == self.start => self.turn = Turn::Done,
                Some(next) => self.current = Some(next),
                None => {
                    self.current = self.step(self.start, Turn::CounterClockwise);
                    self.turn = match self.current {
                        Some(_) => Turn::CounterClockwise,
                        None => Turn::Done,
                    };
                }
            },
            Turn::CounterClockwise => {
                self.current = self.step(current, Turn::CounterClockwise);
                if self.current.is_none() {
                    self.turn = Turn::Done;
                }
            }
            Turn::Done => {}
        }
        Some(current)
    }
}

impl Mesh {
    /// Fan around `vertex` starting from its back-reference. Empty for a
    /// vertex that has not been placed yet.
    pub fn circler(&self, vertex: usize) -> Circler<'_> {
        let start = self
            .vertices
            .get(vertex)
            .and_then(|v| v.triangle)
            .unwrap_or(usize::MAX);
        Circler::new(&self.triangles, start, vertex)
    }

    pub fn circler_from(&self, start: usize, vertex: usize) -> Circler<'_> {
        Circler::new(&self.triangles, start, vertex)
    }
}
