mod circler;
mod config;
mod error;
pub mod geometry;
mod insert;
mod legalize;
mod locate;
mod mesh;
mod refine;
mod spatial_index;
mod topology;
pub mod validate;
mod vec2;

pub use {
    circler::Circler,
    config::{RefineConfig, TriangulatorConfig, MAX_FLIPS_PER_DIAGONAL},
    error::MeshError,
    geometry::{Circle, Rect},
    insert::{InsertOutcome, SegmentOutcome, Triangulator},
    locate::{Hit, Location},
    mesh::{ConstraintEdge, Mesh, Triangle, Vertex},
    refine::{Domain, RefineReport},
    topology::FlipCheck,
    vec2::Vec2,
};

#[cfg(test)]
mod test;
