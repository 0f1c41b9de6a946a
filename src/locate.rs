use tracing::warn;

use crate::{
    geometry::{are_close, is_zero, orient, Rect},
    mesh::{Mesh, Triangle},
    vec2::Vec2,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    /// The query coincides with mesh vertex `vertex`, a corner of `triangle`.
    Vertex { triangle: usize, vertex: usize },
    /// The query lies on edge slot `edge` of `triangle`.
    Edge { triangle: usize, edge: usize },
    /// The query lies strictly inside the triangle.
    Triangle(usize),
    /// The walk left the mesh through a boundary edge.
    NotFound,
    /// The walk ran out of steps before reaching a verdict.
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Location {
    pub hit: Hit,
    pub steps: usize,
}

impl Location {
    fn new(hit: Hit, steps: usize) -> Self {
        Self { hit, steps }
    }

    pub fn triangle(&self) -> Option<usize> {
        match self.hit {
            Hit::Vertex { triangle, .. } | Hit::Edge { triangle, .. } | Hit::Triangle(triangle) => {
                Some(triangle)
            }
            Hit::NotFound | Hit::Aborted => None,
        }
    }
}

impl Mesh {
    /// Visibility walk from `start` (or triangle 0) toward `p`.
    ///
    /// The walk gives up after three times as many steps as there are
    /// triangles and reports [`Hit::Aborted`]; on a well-formed mesh that never
    /// happens.
    pub fn locate(&self, p: Vec2, start: Option<usize>, eps: f64) -> Location {
        if self.triangles.is_empty() {
            return Location::new(Hit::NotFound, 0);
        }
        let mut current = start.filter(|&t| t < self.triangles.len()).unwrap_or(0);
        let cap = self.triangles.len() * 3;

        let mut steps = 0;
        loop {
            if steps >= cap {
                warn!(x = p.x, y = p.y, steps, "point walk aborted");
                return Location::new(Hit::Aborted, steps);
            }
            steps += 1;

            let t = &self.triangles[current];
            let cross = [0, 1, 2].map(|i| {
                let (a, b) = t.edge(i);
                orient(self.pos(a), self.pos(b), p)
            });
            let mut worst = 0;
            for i in 1..3 {
                if cross[i] < cross[worst] {
                    worst = i;
                }
            }

            if is_zero(cross[worst], eps) {
                let (a, b) = t.edge(worst);
                let (pa, pb) = (self.pos(a), self.pos(b));
                if are_close(p, pa, eps) {
                    return Location::new(Hit::Vertex { triangle: current, vertex: a }, steps);
                }
                if are_close(p, pb, eps) {
                    return Location::new(Hit::Vertex { triangle: current, vertex: b }, steps);
                }
                if Rect::from_corners(pa, pb).expand(eps).contains(p) {
                    return Location::new(Hit::Edge { triangle: current, edge: worst }, steps);
                }
                if cross[worst] >= 0. {
                    return Location::new(Hit::Triangle(current), steps);
                }
            } else if cross[worst] > 0. {
                return Location::new(Hit::Triangle(current), steps);
            }

            match t.adjacent[worst] {
                Some(next) => current = next,
                None => return Location::new(Hit::NotFound, steps),
            }
        }
    }

    /// Finds the triangle holding the directed edge `start -> end` by walking
    /// the fan of `start`.
    pub fn find_edge(&self, start: usize, end: usize) -> Location {
        self.search_fan(start, end, |t| t.index_of_edge(start, end))
    }

    /// Like [`Mesh::find_edge`], accepting the edge in either direction.
    pub fn find_edge_undirected(&self, start: usize, end: usize) -> Location {
        self.search_fan(start, end, |t| t.index_of_edge_undirected(start, end))
    }

    fn search_fan(
        &self,
        start: usize,
        end: usize,
        slot: impl Fn(&Triangle) -> Option<usize>,
    ) -> Location {
        if start == end {
            return Location::new(Hit::Aborted, 0);
        }
        let mut steps = 0;
        for triangle in self.circler(start) {
            steps += 1;
            if let Some(edge) = slot(&self.triangles[triangle]) {
                return Location::new(Hit::Edge { triangle, edge }, steps);
            }
        }
        Location::new(Hit::NotFound, steps)
    }
}
