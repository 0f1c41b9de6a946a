use snafu::Snafu;

/// Failures raised by the triangulation engine.
///
/// Every variant except the input-range checks signals either a bug in an
/// earlier mutation or input that was not preprocessed; none of them are
/// retried inside the crate.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum MeshError {
    #[snafu(display(
        "triangle {triangle} does not contain directed edge ({start} -> {end}), topology is broken"
    ))]
    BrokenAdjacency {
        triangle: usize,
        start: usize,
        end: usize,
    },

    #[snafu(display("no triangle around vertex {start} opens toward vertex {end}"))]
    NoEntranceTriangle { start: usize, end: usize },

    #[snafu(display(
        "segment ({start} -> {end}) does not cross the far edge of triangle {triangle}"
    ))]
    NoCrossing {
        start: usize,
        end: usize,
        triangle: usize,
    },

    #[snafu(display("segment ({start} -> {end}) leaves the mesh through triangle {triangle}"))]
    SegmentLeavesMesh {
        start: usize,
        end: usize,
        triangle: usize,
    },

    #[snafu(display("triangle index {index} is out of range"))]
    TriangleOutOfRange { index: usize },

    #[snafu(display("vertex index {index} is out of range"))]
    VertexOutOfRange { index: usize },

    #[snafu(display("triangle ({a}, {b}, {c}) is degenerate"))]
    DegenerateTriangle { a: usize, b: usize, c: usize },

    #[snafu(display("edge ({start}, {end}) is shared by more than two triangles"))]
    NonManifoldEdge { start: usize, end: usize },
}
