//! Point and segment insertion on top of the topology primitives.

use std::collections::VecDeque;

use snafu::{ensure, OptionExt};
use tracing::{debug, trace};

use crate::{
    config::TriangulatorConfig,
    error::{
        BrokenAdjacencySnafu, MeshError, NoCrossingSnafu, NoEntranceTriangleSnafu,
        SegmentLeavesMeshSnafu, VertexOutOfRangeSnafu,
    },
    geometry::{are_collinear, lines_cross_args, mean_seed, orient, seed_along, seed_in_triangle},
    locate::{Hit, Location},
    mesh::{ConstraintEdge, Mesh, Vertex},
    vec2::Vec2,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new vertex was created and the mesh around it legalized.
    Inserted(usize),
    /// The point coincides with an existing vertex; nothing changed.
    Existing(usize),
    /// The point lies outside the mesh.
    Outside,
    /// The point walk gave up.
    Aborted { steps: usize },
}

impl InsertOutcome {
    pub fn vertex(&self) -> Option<usize> {
        match *self {
            InsertOutcome::Inserted(v) | InsertOutcome::Existing(v) => Some(v),
            InsertOutcome::Outside | InsertOutcome::Aborted { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentOutcome {
    Inserted { start: usize, end: usize },
    /// One endpoint could not be placed, so the segment was not inserted.
    Skipped(InsertOutcome),
}

/// Builds a constrained Delaunay triangulation inside an existing mesh,
/// usually a super-structure produced by the caller.
#[derive(Clone, Debug)]
pub struct Triangulator {
    pub(crate) mesh: Mesh,
    pub(crate) config: TriangulatorConfig,
    last_found: Option<usize>,
}

impl Triangulator {
    pub fn new(mesh: Mesh, config: TriangulatorConfig) -> Self {
        Self {
            mesh,
            config,
            last_found: None,
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }

    pub fn config(&self) -> &TriangulatorConfig {
        &self.config
    }

    /// Locates `p`, starting from wherever the previous walk ended.
    pub fn locate(&mut self, p: Vec2) -> Location {
        let location = self.mesh.locate(p, self.last_found, self.config.eps);
        if let Some(triangle) = location.triangle() {
            self.last_found = Some(triangle);
        }
        location
    }

    /// Inserts an isolated point.
    ///
    /// Without an explicit `seed` the new vertex interpolates one from the
    /// triangle or edge it lands on.
    pub fn try_insert_point(
        &mut self,
        x: f64,
        y: f64,
        seed: Option<f64>,
        id: Option<&str>,
    ) -> Result<InsertOutcome, MeshError> {
        self.insert_point_with(Vec2::new(x, y), seed, id, None)
    }

    pub(crate) fn insert_point_with(
        &mut self,
        p: Vec2,
        seed: Option<f64>,
        id: Option<&str>,
        affected: Option<&mut Vec<usize>>,
    ) -> Result<InsertOutcome, MeshError> {
        if !p.is_finite() {
            return Ok(InsertOutcome::Outside);
        }
        let location = self.locate(p);
        let (produced, vertex) = match location.hit {
            Hit::Vertex { vertex, .. } => return Ok(InsertOutcome::Existing(vertex)),
            Hit::NotFound => return Ok(InsertOutcome::Outside),
            Hit::Aborted => {
                return Ok(InsertOutcome::Aborted {
                    steps: location.steps,
                })
            }
            Hit::Edge { triangle, edge } => {
                let (a, b) = self.mesh.triangles[triangle].edge(edge);
                let seed = seed.or_else(|| {
                    let (va, vb) = (&self.mesh.vertices[a], &self.mesh.vertices[b]);
                    seed_along(va.pos, va.seed, vb.pos, vb.seed, p)
                });
                let vertex = self.push_vertex(p, seed, id);
                (self.mesh.split_edge(triangle, edge, vertex)?.to_vec(), vertex)
            }
            Hit::Triangle(triangle) => {
                let t = self.mesh.triangles[triangle];
                let seed = seed.or_else(|| {
                    let seeds = t.vertices.map(|v| self.mesh.vertices[v].seed);
                    seed_in_triangle(self.mesh.corners(&t), seeds, p)
                });
                let vertex = self.push_vertex(p, seed, id);
                (self.mesh.split_triangle(triangle, vertex)?.to_vec(), vertex)
            }
        };

        self.mesh.legalize(&produced, affected)?;
        trace!(vertex, x = p.x, y = p.y, "inserted point");
        Ok(InsertOutcome::Inserted(vertex))
    }

    fn push_vertex(&mut self, pos: Vec2, seed: Option<f64>, id: Option<&str>) -> usize {
        self.mesh.push_vertex(Vertex {
            pos,
            id: id.map(str::to_owned),
            seed,
            triangle: None,
        })
    }

    /// Marks the existing edge between `a` and `b` as required. Returns false
    /// when no such edge exists. Marking an edge twice changes nothing.
    pub fn set_constraint(
        &mut self,
        a: usize,
        b: usize,
        id: Option<&str>,
    ) -> Result<bool, MeshError> {
        ensure!(a < self.mesh.vertices.len(), VertexOutOfRangeSnafu { index: a });
        ensure!(b < self.mesh.vertices.len(), VertexOutOfRangeSnafu { index: b });
        let Hit::Edge { triangle, edge } = self.mesh.find_edge_undirected(a, b).hit else {
            return Ok(false);
        };
        if self.mesh.triangles[triangle].is_constrained(edge) {
            return Ok(true);
        }

        let (start, end) = self.mesh.triangles[triangle].edge(edge);
        self.add_constraint_record(triangle, edge, start, end, id);

        if let Some(neighbor) = self.mesh.triangles[triangle].adjacent[edge] {
            let back = self.mesh.triangles[neighbor]
                .index_of_edge(end, start)
                .context(BrokenAdjacencySnafu {
                    triangle: neighbor,
                    start: end,
                    end: start,
                })?;
            if !self.mesh.triangles[neighbor].is_constrained(back) {
                self.add_constraint_record(neighbor, back, end, start, id);
            }
        }
        Ok(true)
    }

    fn add_constraint_record(
        &mut self,
        triangle: usize,
        edge: usize,
        start: usize,
        end: usize,
        id: Option<&str>,
    ) {
        let record = self.mesh.push_constraint(ConstraintEdge {
            start,
            end,
            triangle,
            id: id.map(str::to_owned),
        });
        self.mesh.triangles[triangle].constraints[edge] = Some(record);
    }

    /// The triangle around `start` whose corner angle contains the direction
    /// toward `end`. Returns it with its two other corners, counter-clockwise.
    pub fn entrance_triangle(
        &self,
        start: usize,
        end: usize,
    ) -> Result<(usize, usize, usize), MeshError> {
        let eps = self.config.eps;
        let pu = self.mesh.vertex(start)?.pos;
        let pv = self.mesh.vertex(end)?.pos;
        for triangle in self.mesh.circler(start) {
            let t = &self.mesh.triangles[triangle];
            let Some(i) = t.index_of(start) else { continue };
            let next = t.vertices[(i + 1) % 3];
            let prev = t.vertices[(i + 2) % 3];
            let (pn, pp) = (self.mesh.pos(next), self.mesh.pos(prev));

            let left_of_next = orient(pu, pn, pv);
            let right_of_prev = orient(pu, pp, pv);
            if left_of_next < -eps || right_of_prev > eps {
                continue;
            }
            if left_of_next <= eps && (pn - pu).dot(pv - pu) <= 0. {
                continue;
            }
            if right_of_prev >= -eps && (pp - pu).dot(pv - pu) <= 0. {
                continue;
            }
            return Ok((triangle, next, prev));
        }
        NoEntranceTriangleSnafu { start, end }.fail()
    }

    /// Forces the segment between vertices `a` and `b` into the mesh.
    ///
    /// Crossed edges are flipped away where possible and split at the
    /// crossing where not (constrained, non-convex, or
    /// [`TriangulatorConfig::exact_split`]). Every triangle touched is
    /// legalized once at the end; the segment pieces themselves are never
    /// flipped since they are constrained.
    pub fn insert_segment(
        &mut self,
        a: usize,
        b: usize,
        id: Option<&str>,
    ) -> Result<(), MeshError> {
        let eps = self.config.eps;
        let mut work = VecDeque::from([(a, b)]);
        let mut produced = Vec::new();
        let mut steps = 0;

        while let Some((u, v)) = work.pop_front() {
            steps += 1;
            if u == v || self.set_constraint(u, v, id)? {
                continue;
            }

            let (triangle, next, prev) = self.entrance_triangle(u, v)?;
            let (pu, pv) = (self.mesh.pos(u), self.mesh.pos(v));
            let (pn, pp) = (self.mesh.pos(next), self.mesh.pos(prev));

            if are_collinear(pu, pv, pn, eps) {
                work.push_back((u, next));
                work.push_back((next, v));
                continue;
            }
            if are_collinear(pu, pv, pp, eps) {
                work.push_back((u, prev));
                work.push_back((prev, v));
                continue;
            }

            let far = self.mesh.triangles[triangle]
                .index_of_edge(next, prev)
                .context(BrokenAdjacencySnafu {
                    triangle,
                    start: next,
                    end: prev,
                })?;
            let (s, t) = lines_cross_args(pu, pv, pn, pp)
                .filter(|&(s, t)| s > 0. && (0. ..=1.).contains(&t))
                .context(NoCrossingSnafu {
                    start: u,
                    end: v,
                    triangle,
                })?;
            ensure!(
                self.mesh.triangles[triangle].adjacent[far].is_some(),
                SegmentLeavesMeshSnafu {
                    start: u,
                    end: v,
                    triangle,
                }
            );

            let flippable =
                !self.config.exact_split && self.mesh.can_flip(triangle, far, false)?.legal;
            if flippable {
                if let Some(pair) = self.mesh.flip(triangle, far, false)? {
                    produced.extend(pair);
                    work.push_back((u, v));
                    continue;
                }
            }

            let w = pu + (pv - pu) * s;
            let seed = {
                let (vu, vv) = (&self.mesh.vertices[u], &self.mesh.vertices[v]);
                let (vn, vp) = (&self.mesh.vertices[next], &self.mesh.vertices[prev]);
                mean_seed(&[
                    seed_along(vu.pos, vu.seed, vv.pos, vv.seed, w),
                    seed_along(vn.pos, vn.seed, vp.pos, vp.seed, pn + (pp - pn) * t),
                ])
            };
            let steiner = self.push_vertex(w, seed, None);
            produced.extend(self.mesh.split_edge(triangle, far, steiner)?);
            trace!(u, v, steiner, "split crossed edge ({next}, {prev})");
            work.push_back((u, steiner));
            work.push_back((steiner, v));
        }

        let flips = self.mesh.legalize(&produced, None)?;
        debug!(a, b, steps, flips, "inserted segment");
        Ok(())
    }

    /// Inserts both endpoints, then the segment between them.
    pub fn insert_segment_between(
        &mut self,
        a: Vec2,
        b: Vec2,
        id: Option<&str>,
    ) -> Result<SegmentOutcome, MeshError> {
        let start = self.insert_point_with(a, None, None, None)?;
        let Some(start) = start.vertex() else {
            return Ok(SegmentOutcome::Skipped(start));
        };
        let end = self.insert_point_with(b, None, None, None)?;
        let Some(end) = end.vertex() else {
            return Ok(SegmentOutcome::Skipped(end));
        };
        self.insert_segment(start, end, id)?;
        Ok(SegmentOutcome::Inserted { start, end })
    }
}
