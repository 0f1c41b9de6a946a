//! R-tree over mesh vertices, queried by axis-aligned boxes.

use rstar::{RTree, RTreeObject, AABB};

use crate::{geometry::Rect, vec2::Vec2};

#[derive(Clone, Copy, Debug)]
struct IndexedVertex {
    pos: Vec2,
    vertex: usize,
}

impl RTreeObject for IndexedVertex {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.pos.x, self.pos.y])
    }
}

fn envelope_of(rect: &Rect) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y])
}

#[derive(Default)]
pub(crate) struct VertexIndex {
    tree: RTree<IndexedVertex>,
}

impl VertexIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn insert(&mut self, pos: Vec2, vertex: usize) {
        self.tree.insert(IndexedVertex { pos, vertex });
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Vertices whose position lies in `rect`, borders included.
    pub fn query<'a>(&'a self, rect: &Rect) -> impl Iterator<Item = usize> + 'a {
        self.tree
            .locate_in_envelope(&envelope_of(rect))
            .map(|entry| entry.vertex)
    }
}
