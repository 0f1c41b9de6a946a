//! Ruppert-style refinement driven by the per-vertex seed field.
//!
//! A required segment is encroached when a visible vertex lies strictly inside
//! its diametral circle; encroached segments are split at their midpoint. A
//! triangle is bad when its area exceeds the mean seed of its corners; bad
//! triangles get a Steiner point at their circumcenter unless that point would
//! encroach a segment, in which case the segment is split first. Segments
//! always take priority.

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, trace, warn};

use crate::{
    config::RefineConfig,
    error::MeshError,
    geometry::{are_close, blocks_sight, mean_seed, orient, seed_along, Circle, Rect},
    insert::{InsertOutcome, Triangulator},
    locate::Hit,
    mesh::Vertex,
    spatial_index::VertexIndex,
    vec2::Vec2,
};

/// Region in which the refiner may place circumcenters.
pub trait Domain {
    fn contains(&self, p: Vec2) -> bool;
}

impl Domain for Rect {
    fn contains(&self, p: Vec2) -> bool {
        Rect::contains(self, p)
    }
}

impl<F: Fn(Vec2) -> bool> Domain for F {
    fn contains(&self, p: Vec2) -> bool {
        self(p)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefineReport {
    pub segment_splits: usize,
    pub steiner_points: usize,
    /// Bad triangles left alone: circumcenter outside the domain, on an
    /// existing vertex or off the mesh.
    pub skipped: usize,
    /// Circumcenter insertions whose point walk ran out of steps. Non-zero
    /// means the adjacency is corrupt.
    pub aborted: usize,
}

type SegmentKey = (usize, usize);

fn segment_key(a: usize, b: usize) -> SegmentKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

struct Refiner<'a, D> {
    tri: &'a mut Triangulator,
    domain: &'a D,
    bounds: Rect,
    super_vertices: usize,
    index: VertexIndex,
    active: BTreeSet<SegmentKey>,
    segments: VecDeque<SegmentKey>,
    triangles: VecDeque<usize>,
    affected: Vec<usize>,
    report: RefineReport,
}

impl<'a, D: Domain> Refiner<'a, D> {
    fn pos(&self, v: usize) -> Vec2 {
        self.tri.mesh.pos(v)
    }

    fn is_bad(&self, triangle: usize) -> bool {
        let mesh = &self.tri.mesh;
        let t = &mesh.triangles[triangle];
        if t.vertices.iter().any(|&v| v < self.super_vertices) {
            return false;
        }
        let seeds = t.vertices.map(|v| mesh.vertices[v].seed);
        if seeds.iter().any(Option::is_none) {
            return false;
        }
        let Some(target) = mean_seed(&seeds) else {
            return false;
        };
        let [a, b, c] = mesh.corners(t);
        orient(a, b, c).abs() * 0.5 > target
    }

    fn diametral(&self, key: SegmentKey) -> Circle {
        Circle::diametral(self.pos(key.0), self.pos(key.1))
    }

    /// `p` can be seen from the middle of `key` without crossing another
    /// active segment.
    fn visible(&self, key: SegmentKey, p: Vec2) -> bool {
        let center = self.pos(key.0).midpoint(self.pos(key.1));
        self.active
            .iter()
            .filter(|&&other| other != key)
            .all(|&(a, b)| !blocks_sight(center, p, self.pos(a), self.pos(b)))
    }

    fn encroaches(&self, key: SegmentKey, p: Vec2) -> bool {
        let eps = self.tri.config.eps;
        self.diametral(key).contains(p)
            && !are_close(p, self.pos(key.0), eps)
            && !are_close(p, self.pos(key.1), eps)
            && self.visible(key, p)
    }

    fn is_encroached(&self, key: SegmentKey) -> bool {
        let circle = self.diametral(key);
        self.index
            .query(&circle.bounds())
            .any(|v| self.encroaches(key, self.pos(v)))
    }

    fn collect_affected(&mut self) {
        for triangle in std::mem::take(&mut self.affected) {
            if self.is_bad(triangle) {
                self.triangles.push_back(triangle);
            }
        }
    }

    fn split_segment(&mut self, key: SegmentKey) -> Result<(), MeshError> {
        let (a, b) = key;
        let Hit::Edge { triangle, edge } = self.tri.mesh.find_edge_undirected(a, b).hit else {
            self.active.remove(&key);
            return Ok(());
        };

        let (va, vb) = (&self.tri.mesh.vertices[a], &self.tri.mesh.vertices[b]);
        let mid = va.pos.midpoint(vb.pos);
        let seed = seed_along(va.pos, va.seed, vb.pos, vb.seed, mid);
        let vertex = self.tri.mesh.push_vertex(Vertex {
            pos: mid,
            id: None,
            seed,
            triangle: None,
        });
        let produced = self.tri.mesh.split_edge(triangle, edge, vertex)?;
        self.tri.mesh.legalize(&produced, Some(&mut self.affected))?;
        self.index.insert(mid, vertex);
        self.active.remove(&key);
        self.report.segment_splits += 1;
        trace!(a, b, vertex, "split encroached segment");

        for sub in [segment_key(a, vertex), segment_key(vertex, b)] {
            self.active.insert(sub);
        }
        for sub in [segment_key(a, vertex), segment_key(vertex, b)] {
            if self.is_encroached(sub) {
                self.segments.push_back(sub);
            }
        }
        self.collect_affected();
        Ok(())
    }

    fn split_triangle(&mut self, triangle: usize) -> Result<(), MeshError> {
        if !self.is_bad(triangle) {
            return Ok(());
        }
        let center = self.tri.mesh.circles[triangle].center;
        if !self.bounds.contains(center) || !self.domain.contains(center) {
            self.report.skipped += 1;
            return Ok(());
        }

        let encroached: Vec<SegmentKey> = self
            .active
            .iter()
            .copied()
            .filter(|&key| self.diametral(key).contains(center) && self.visible(key, center))
            .collect();
        if !encroached.is_empty() {
            self.segments.extend(encroached);
            self.triangles.push_back(triangle);
            return Ok(());
        }

        let t = self.tri.mesh.triangles[triangle];
        let seed = mean_seed(&t.vertices.map(|v| self.tri.mesh.vertices[v].seed));
        match self
            .tri
            .insert_point_with(center, seed, None, Some(&mut self.affected))?
        {
            InsertOutcome::Inserted(vertex) => {
                self.index.insert(center, vertex);
                self.report.steiner_points += 1;
                trace!(triangle, vertex, "inserted circumcenter");
            }
            InsertOutcome::Existing(_) | InsertOutcome::Outside => {
                self.report.skipped += 1;
            }
            InsertOutcome::Aborted { steps } => {
                warn!(triangle, steps, "circumcenter walk aborted");
                self.report.aborted += 1;
            }
        }
        self.collect_affected();
        Ok(())
    }

    fn run(mut self) -> Result<RefineReport, MeshError> {
        let mesh = &self.tri.mesh;
        for v in self.super_vertices..mesh.vertices.len() {
            if mesh.vertices[v].triangle.is_some() {
                self.index.insert(mesh.vertices[v].pos, v);
            }
        }
        if self.index.is_empty() {
            return Ok(self.report);
        }

        for triangle in 0..mesh.triangles.len() {
            if self.is_bad(triangle) {
                self.triangles.push_back(triangle);
            }
        }
        self.active = mesh
            .constraints
            .iter()
            .map(|c| segment_key(c.start, c.end))
            .collect();
        let initial: Vec<SegmentKey> = self
            .active
            .iter()
            .copied()
            .filter(|&key| self.is_encroached(key))
            .collect();
        self.segments.extend(initial);
        debug!(
            segments = self.segments.len(),
            triangles = self.triangles.len(),
            "refinement started"
        );

        loop {
            if let Some(key) = self.segments.pop_front() {
                self.split_segment(key)?;
            } else if let Some(triangle) = self.triangles.pop_front() {
                self.split_triangle(triangle)?;
            } else {
                break;
            }
        }

        debug!(
            segment_splits = self.report.segment_splits,
            steiner_points = self.report.steiner_points,
            skipped = self.report.skipped,
            aborted = self.report.aborted,
            "refinement finished"
        );
        Ok(self.report)
    }
}

impl Triangulator {
    /// Refines inside the configured bounds, or inside the bounding box of the
    /// non-super vertices.
    pub fn refine(&mut self, config: &RefineConfig) -> Result<RefineReport, MeshError> {
        let bounds = self.refine_bounds(config);
        self.refine_in(config, &bounds)
    }

    /// Refines, placing circumcenters only where `domain` accepts them.
    pub fn refine_in<D: Domain>(
        &mut self,
        config: &RefineConfig,
        domain: &D,
    ) -> Result<RefineReport, MeshError> {
        if self.mesh.vertices.len() <= config.super_vertices {
            return Ok(RefineReport::default());
        }
        let bounds = self.refine_bounds(config);
        Refiner {
            tri: self,
            domain,
            bounds,
            super_vertices: config.super_vertices,
            index: VertexIndex::new(),
            active: BTreeSet::new(),
            segments: VecDeque::new(),
            triangles: VecDeque::new(),
            affected: Vec::new(),
            report: RefineReport::default(),
        }
        .run()
    }

    fn refine_bounds(&self, config: &RefineConfig) -> Rect {
        config.bounds.unwrap_or_else(|| {
            Rect::from_points(
                self.mesh
                    .vertices
                    .iter()
                    .skip(config.super_vertices)
                    .map(|v| v.pos),
            )
            .unwrap_or(Rect::new(Vec2::ZERO, Vec2::ZERO))
        })
    }
}
