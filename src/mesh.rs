//! Append-only arenas of vertices, triangles, circumcircles and constraint
//! records.
//!
//! Every relation is a plain index into one of the arenas; `None` stands for
//! "no relation" (boundary edge, unconstrained edge, vertex not yet placed).
//! Indices are never reused or moved, so indices taken before a mutation stay
//! valid after it.

use std::collections::HashMap;

use snafu::ensure;

use crate::{
    error::{
        DegenerateTriangleSnafu, MeshError, NonManifoldEdgeSnafu, TriangleOutOfRangeSnafu,
        VertexOutOfRangeSnafu,
    },
    geometry::{orient, Circle},
    vec2::Vec2,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub pos: Vec2,
    pub id: Option<String>,
    /// Local target triangle area.
    pub seed: Option<f64>,
    /// Any triangle incident to this vertex, used to seed walks.
    pub triangle: Option<usize>,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self::at(Vec2::new(x, y))
    }

    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            id: None,
            seed: None,
            triangle: None,
        }
    }

    pub fn with_seed(mut self, seed: f64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Three counter-clockwise vertex indices plus one adjacency and one
/// constraint slot per edge. Edge `i` runs from `vertices[i]` to
/// `vertices[(i + 1) % 3]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triangle {
    pub vertices: [usize; 3],
    pub adjacent: [Option<usize>; 3],
    pub constraints: [Option<usize>; 3],
}

impl Triangle {
    pub fn new(vertices: [usize; 3]) -> Self {
        Self {
            vertices,
            adjacent: [None; 3],
            constraints: [None; 3],
        }
    }

    pub(crate) fn with_links(
        vertices: [usize; 3],
        adjacent: [Option<usize>; 3],
        constraints: [Option<usize>; 3],
    ) -> Self {
        Self {
            vertices,
            adjacent,
            constraints,
        }
    }

    /// Rotates the slot triples so that `edge` becomes edge 0.
    pub fn orient(&self, edge: usize) -> Triangle {
        let r = |i: usize| (i + edge) % 3;
        Triangle {
            vertices: [self.vertices[r(0)], self.vertices[r(1)], self.vertices[r(2)]],
            adjacent: [self.adjacent[r(0)], self.adjacent[r(1)], self.adjacent[r(2)]],
            constraints: [
                self.constraints[r(0)],
                self.constraints[r(1)],
                self.constraints[r(2)],
            ],
        }
    }

    pub fn index_of(&self, vertex: usize) -> Option<usize> {
        self.vertices.iter().position(|&v| v == vertex)
    }

    /// Index of the directed edge `start -> end`.
    pub fn index_of_edge(&self, start: usize, end: usize) -> Option<usize> {
        (0..3).find(|&i| self.vertices[i] == start && self.vertices[(i + 1) % 3] == end)
    }

    /// Index of the edge joining `a` and `b` in either direction.
    pub fn index_of_edge_undirected(&self, a: usize, b: usize) -> Option<usize> {
        self.index_of_edge(a, b).or_else(|| self.index_of_edge(b, a))
    }

    pub fn edge(&self, i: usize) -> (usize, usize) {
        (self.vertices[i], self.vertices[(i + 1) % 3])
    }

    /// The corner not touched by edge `i`.
    pub fn apex(&self, i: usize) -> usize {
        self.vertices[(i + 2) % 3]
    }

    pub fn is_constrained(&self, i: usize) -> bool {
        self.constraints[i].is_some()
    }
}

/// One directed side of a required edge. An interior required edge has a
/// record on each side, both carrying the same `id`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintEdge {
    pub start: usize,
    pub end: usize,
    pub triangle: usize,
    pub id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) circles: Vec<Circle>,
    pub(crate) constraints: Vec<ConstraintEdge>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh from a bootstrap triangulation.
    ///
    /// Triangles are re-wound counter-clockwise where needed, adjacency is
    /// linked through shared edges, circumcircles and vertex back-references
    /// are filled in. No constraints are created.
    pub fn from_triangles(
        vertices: Vec<Vertex>,
        triangles: &[[usize; 3]],
    ) -> Result<Self, MeshError> {
        let mut mesh = Mesh {
            vertices,
            ..Default::default()
        };

        let mut directed: HashMap<(usize, usize), usize> =
            HashMap::with_capacity(triangles.len() * 3);
        for &[a, b, c] in triangles {
            for v in [a, b, c] {
                ensure!(v < mesh.vertices.len(), VertexOutOfRangeSnafu { index: v });
            }
            let area = orient(mesh.pos(a), mesh.pos(b), mesh.pos(c));
            ensure!(area != 0., DegenerateTriangleSnafu { a, b, c });
            let vertices = if area > 0. { [a, b, c] } else { [a, c, b] };

            let ti = mesh.push_triangle(Triangle::new(vertices));
            for i in 0..3 {
                let (s, e) = mesh.triangles[ti].edge(i);
                ensure!(
                    directed.insert((s, e), ti).is_none(),
                    NonManifoldEdgeSnafu { start: s, end: e }
                );
            }
        }

        for ti in 0..mesh.triangles.len() {
            for i in 0..3 {
                let (s, e) = mesh.triangles[ti].edge(i);
                mesh.triangles[ti].adjacent[i] = directed.get(&(e, s)).copied();
            }
        }
        Ok(mesh)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    pub fn constraints(&self) -> &[ConstraintEdge] {
        &self.constraints
    }

    pub fn vertex(&self, index: usize) -> Result<&Vertex, MeshError> {
        self.vertices
            .get(index)
            .ok_or_else(|| VertexOutOfRangeSnafu { index }.build())
    }

    pub fn triangle(&self, index: usize) -> Result<&Triangle, MeshError> {
        self.triangles
            .get(index)
            .ok_or_else(|| TriangleOutOfRangeSnafu { index }.build())
    }

    pub fn circle(&self, index: usize) -> Result<&Circle, MeshError> {
        self.circles
            .get(index)
            .ok_or_else(|| TriangleOutOfRangeSnafu { index }.build())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Appends a free vertex. It is not part of the triangulation until a
    /// split places it.
    pub fn push_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub(crate) fn pos(&self, vertex: usize) -> Vec2 {
        self.vertices[vertex].pos
    }

    pub(crate) fn corners(&self, triangle: &Triangle) -> [Vec2; 3] {
        triangle.vertices.map(|v| self.pos(v))
    }

    pub(crate) fn circumcircle_of(&self, triangle: &Triangle) -> Circle {
        let [a, b, c] = self.corners(triangle);
        Circle::circumscribe(a, b, c)
    }

    /// Overwrites slot `index`, refreshing its circle, the back-references of
    /// its corners and the owner of each constraint record it carries.
    pub(crate) fn put_triangle(&mut self, index: usize, triangle: Triangle) {
        self.circles[index] = self.circumcircle_of(&triangle);
        self.triangles[index] = triangle;
        self.claim(index);
    }

    pub(crate) fn push_triangle(&mut self, triangle: Triangle) -> usize {
        let index = self.triangles.len();
        self.circles.push(self.circumcircle_of(&triangle));
        self.triangles.push(triangle);
        self.claim(index);
        index
    }

    fn claim(&mut self, index: usize) {
        let triangle = self.triangles[index];
        for v in triangle.vertices {
            self.vertices[v].triangle = Some(index);
        }
        for c in triangle.constraints.into_iter().flatten() {
            self.constraints[c].triangle = index;
        }
    }

    pub(crate) fn push_constraint(&mut self, edge: ConstraintEdge) -> usize {
        self.constraints.push(edge);
        self.constraints.len() - 1
    }
}
