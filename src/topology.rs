//! Atomic edits of the triangle graph.
//!
//! Each edit rewrites a fixed set of triangle slots, repairs the adjacency of
//! the (at most two) far neighbours through [`Mesh::set_adjacent`] and lets
//! [`Mesh::put_triangle`] refresh circles, back-references and constraint
//! owners. Nothing here looks at the Delaunay property; that is the
//! legalizer's job.

use smallvec::{smallvec, SmallVec};
use snafu::{ensure, OptionExt};
use tracing::trace;

use crate::{
    error::{BrokenAdjacencySnafu, MeshError, VertexOutOfRangeSnafu},
    geometry::is_convex_quad,
    mesh::{ConstraintEdge, Mesh, Triangle},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlipCheck {
    /// The diagonal can be swapped without producing an overlapping pair.
    pub legal: bool,
    /// The opposite apex lies strictly inside the triangle's circumcircle.
    pub recommended: bool,
}

impl Mesh {
    /// Points the slot of `triangle` holding the directed edge `start -> end`
    /// at `neighbor`.
    pub fn set_adjacent(
        &mut self,
        triangle: usize,
        start: usize,
        end: usize,
        neighbor: Option<usize>,
    ) -> Result<(), MeshError> {
        let edge = self
            .triangle(triangle)?
            .index_of_edge(start, end)
            .context(BrokenAdjacencySnafu {
                triangle,
                start,
                end,
            })?;
        self.triangles[triangle].adjacent[edge] = neighbor;
        Ok(())
    }

    fn repair_far(
        &mut self,
        far: Option<usize>,
        start: usize,
        end: usize,
        neighbor: usize,
    ) -> Result<(), MeshError> {
        match far {
            Some(far) => self.set_adjacent(far, start, end, Some(neighbor)),
            None => Ok(()),
        }
    }

    /// Cuts record `record` at vertex `at`. The record keeps the first half and
    /// the returned record, sharing its id, takes the second half.
    fn split_constraint(&mut self, record: Option<usize>, at: usize) -> Option<usize> {
        let record = record?;
        let old = &mut self.constraints[record];
        let tail = ConstraintEdge {
            start: at,
            end: old.end,
            triangle: old.triangle,
            id: old.id.clone(),
        };
        old.end = at;
        Some(self.push_constraint(tail))
    }

    /// The triangle across the directed edge `start -> end` of `triangle`,
    /// with the slot of the same edge on its side.
    fn neighbor_across(
        &self,
        triangle: usize,
        start: usize,
        end: usize,
    ) -> Result<Option<(usize, usize)>, MeshError> {
        let t = &self.triangles[triangle];
        let Some(edge) = t.index_of_edge(start, end) else {
            return Ok(None);
        };
        let Some(n) = t.adjacent[edge] else {
            return Ok(None);
        };
        let back = self
            .triangle(n)?
            .index_of_edge(end, start)
            .context(BrokenAdjacencySnafu {
                triangle: n,
                start: end,
                end: start,
            })?;
        Ok(Some((n, back)))
    }

    /// Replaces `triangle` by three triangles sharing `vertex` as apex.
    ///
    /// `vertex` must lie strictly inside `triangle`. Slot `triangle` keeps the
    /// piece over its old edge 0, the two other pieces are appended.
    pub fn split_triangle(
        &mut self,
        triangle: usize,
        vertex: usize,
    ) -> Result<[usize; 3], MeshError> {
        ensure!(vertex < self.vertices.len(), VertexOutOfRangeSnafu { index: vertex });
        let old = *self.triangle(triangle)?;
        let [i0, i1, i2] = old.vertices;

        let t0 = triangle;
        let t1 = self.triangles.len();
        let t2 = t1 + 1;

        self.push_triangle(Triangle::with_links(
            [i1, i2, vertex],
            [old.adjacent[1], Some(t2), Some(t0)],
            [old.constraints[1], None, None],
        ));
        self.push_triangle(Triangle::with_links(
            [i2, i0, vertex],
            [old.adjacent[2], Some(t0), Some(t1)],
            [old.constraints[2], None, None],
        ));
        self.put_triangle(
            t0,
            Triangle::with_links(
                [i0, i1, vertex],
                [old.adjacent[0], Some(t1), Some(t2)],
                [old.constraints[0], None, None],
            ),
        );

        self.repair_far(old.adjacent[1], i2, i1, t1)?;
        self.repair_far(old.adjacent[2], i0, i2, t2)?;

        trace!(triangle, vertex, "split triangle into {t0}, {t1}, {t2}");
        Ok([t0, t1, t2])
    }

    /// Splits edge `edge` of `triangle` at `vertex`, which must lie on that
    /// edge.
    ///
    /// A boundary edge gives two triangles, an interior edge splits both
    /// incident triangles for four. A constraint on the edge is cut into two
    /// records per side, each keeping the original id.
    pub fn split_edge(
        &mut self,
        triangle: usize,
        edge: usize,
        vertex: usize,
    ) -> Result<SmallVec<[usize; 4]>, MeshError> {
        ensure!(vertex < self.vertices.len(), VertexOutOfRangeSnafu { index: vertex });
        let o0 = self.triangle(triangle)?.orient(edge);
        let [i0, i1, i2] = o0.vertices;
        let i3 = vertex;

        let Some((neighbor, back)) = self.neighbor_across(triangle, i0, i1)? else {
            //        i2
            //       /  \
            //     t0 -- t1
            //     /  |   \
            //   i0 - i3 - i1
            let t0 = triangle;
            let t1 = self.triangles.len();
            let a = o0.constraints[0];
            let a_tail = self.split_constraint(a, i3);

            self.push_triangle(Triangle::with_links(
                [i1, i2, i3],
                [o0.adjacent[1], Some(t0), None],
                [o0.constraints[1], None, a_tail],
            ));
            self.put_triangle(
                t0,
                Triangle::with_links(
                    [i2, i0, i3],
                    [o0.adjacent[2], None, Some(t1)],
                    [o0.constraints[2], a, None],
                ),
            );
            self.repair_far(o0.adjacent[1], i2, i1, t1)?;

            trace!(triangle, vertex, "split boundary edge ({i0}, {i1})");
            return Ok(smallvec![t0, t1]);
        };

        let o1 = self.triangles[neighbor].orient(back);
        let i4 = o1.vertices[2];

        //          i2
        //        /  |  \
        //      t0   |   t3
        //     /     |     \
        //   i0 ---- i3 ---- i1
        //     \     |     /
        //      t1   |   t2
        //        \  |  /
        //          i4
        let t0 = triangle;
        let t1 = neighbor;
        let t2 = self.triangles.len();
        let t3 = t2 + 1;

        let a = o0.constraints[0];
        let a_tail = self.split_constraint(a, i3);
        let b = o1.constraints[0];
        let b_tail = self.split_constraint(b, i3);

        self.push_triangle(Triangle::with_links(
            [i4, i1, i3],
            [o1.adjacent[2], Some(t3), Some(t1)],
            [o1.constraints[2], b, None],
        ));
        self.push_triangle(Triangle::with_links(
            [i1, i2, i3],
            [o0.adjacent[1], Some(t0), Some(t2)],
            [o0.constraints[1], None, a_tail],
        ));
        self.put_triangle(
            t0,
            Triangle::with_links(
                [i2, i0, i3],
                [o0.adjacent[2], Some(t1), Some(t3)],
                [o0.constraints[2], a, None],
            ),
        );
        self.put_triangle(
            t1,
            Triangle::with_links(
                [i0, i4, i3],
                [o1.adjacent[1], Some(t2), Some(t0)],
                [o1.constraints[1], None, b_tail],
            ),
        );

        self.repair_far(o0.adjacent[1], i2, i1, t3)?;
        self.repair_far(o1.adjacent[2], i1, i4, t2)?;

        trace!(triangle, neighbor, vertex, "split interior edge ({i0}, {i1})");
        Ok(smallvec![t0, t1, t2, t3])
    }

    /// Checks whether edge `edge` of `triangle` may be flipped.
    pub fn can_flip(
        &self,
        triangle: usize,
        edge: usize,
        force: bool,
    ) -> Result<FlipCheck, MeshError> {
        let a = self.triangle(triangle)?.orient(edge);
        let [i0, i1, i2] = a.vertices;
        let constrained = a.constraints[0].is_some();
        if constrained && !force {
            return Ok(FlipCheck::default());
        }
        let Some((neighbor, back)) = self.neighbor_across(triangle, i0, i1)? else {
            return Ok(FlipCheck::default());
        };
        let i3 = self.triangles[neighbor].apex(back);

        let legal = is_convex_quad(self.pos(i1), self.pos(i2), self.pos(i0), self.pos(i3));
        let recommended = legal && !constrained && self.circles[triangle].contains(self.pos(i3));
        Ok(FlipCheck { legal, recommended })
    }

    /// Swaps the diagonal shared by `triangle` and its neighbour across
    /// `edge`. Returns `None`, leaving the mesh untouched, when the flip is not
    /// legal. A forced flip of a constrained diagonal carries both records
    /// over to the new diagonal.
    pub fn flip(
        &mut self,
        triangle: usize,
        edge: usize,
        force: bool,
    ) -> Result<Option<[usize; 2]>, MeshError> {
        if !self.can_flip(triangle, edge, force)?.legal {
            return Ok(None);
        }
        let a = self.triangles[triangle].orient(edge);
        let [i0, i1, i2] = a.vertices;
        let Some((neighbor, back)) = self.neighbor_across(triangle, i0, i1)? else {
            return Ok(None);
        };
        let b = self.triangles[neighbor].orient(back);
        let i3 = b.vertices[2];

        //        i2                 i2
        //       /  \               /|\
        //     i0----i1    ->     i0 | i1
        //       \  /               \|/
        //        i3                 i3
        let t0 = triangle;
        let t1 = neighbor;
        let (ca, cb) = (a.constraints[0], b.constraints[0]);
        if let Some(c) = ca {
            self.constraints[c].start = i3;
            self.constraints[c].end = i2;
        }
        if let Some(c) = cb {
            self.constraints[c].start = i2;
            self.constraints[c].end = i3;
        }

        self.put_triangle(
            t0,
            Triangle::with_links(
                [i0, i3, i2],
                [b.adjacent[1], Some(t1), a.adjacent[2]],
                [b.constraints[1], ca, a.constraints[2]],
            ),
        );
        self.put_triangle(
            t1,
            Triangle::with_links(
                [i3, i1, i2],
                [b.adjacent[2], a.adjacent[1], Some(t0)],
                [b.constraints[2], a.constraints[1], cb],
            ),
        );

        self.repair_far(a.adjacent[1], i2, i1, t1)?;
        self.repair_far(b.adjacent[1], i3, i0, t0)?;

        trace!(t0, t1, "flipped ({i0}, {i1}) to ({i3}, {i2})");
        Ok(Some([t0, t1]))
    }
}
