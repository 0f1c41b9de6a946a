use crate::geometry::Rect;

/// Upper bound on how many times one undirected diagonal may be flipped in a
/// single legalization pass. Near-cocircular clusters would otherwise flip the
/// same diagonal back and forth forever.
pub const MAX_FLIPS_PER_DIAGONAL: u8 = 5;

#[derive(Clone, Debug)]
pub struct TriangulatorConfig {
    /// Vertex-merge distance, point-on-segment tolerance, collinearity and
    /// inside-triangle threshold. Zero is a valid value.
    pub eps: f64,

    /// Always split crossed edges with a Steiner point while inserting a
    /// segment, even where a flip would do.
    pub exact_split: bool,
}

impl Default for TriangulatorConfig {
    fn default() -> Self {
        Self {
            eps: 1e-9,
            exact_split: false,
        }
    }
}

impl TriangulatorConfig {
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn with_exact_split(mut self, exact_split: bool) -> Self {
        self.exact_split = exact_split;
        self
    }
}

#[derive(Clone, Debug)]
pub struct RefineConfig {
    /// Number of leading vertices that belong to the bootstrap super-structure.
    /// They are never indexed for encroachment and any triangle touching one is
    /// never considered bad.
    pub super_vertices: usize,

    /// Region outside of which circumcenters are never inserted. Defaults to the
    /// bounding box of the non-super vertices.
    pub bounds: Option<Rect>,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            super_vertices: 3,
            bounds: None,
        }
    }
}
