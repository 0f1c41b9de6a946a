//! Structural audits of a [`Mesh`].
//!
//! These walk every arena, so they cost linear time or worse; tests call them
//! after each mutation, production callers at most once per build.

use snafu::{ensure, Snafu};

use crate::{
    geometry::{orient, Circle},
    mesh::Mesh,
};

#[derive(Debug, Snafu, Clone, PartialEq)]
pub enum InvariantViolation {
    #[snafu(display("triangle {triangle} is not wound counter-clockwise"))]
    Winding { triangle: usize },

    #[snafu(display(
        "triangle {triangle} edge {edge} points at a neighbour that does not point back"
    ))]
    AsymmetricAdjacency { triangle: usize, edge: usize },

    #[snafu(display("cached circumcircle of triangle {triangle} is stale"))]
    StaleCircle { triangle: usize },

    #[snafu(display("constraint record {record} does not match the slot of triangle {triangle}"))]
    ConstraintOwner { record: usize, triangle: usize },

    #[snafu(display(
        "constrained edge {edge} of triangle {triangle} has no matching record on the other side"
    ))]
    UnpairedConstraint { triangle: usize, edge: usize },

    #[snafu(display("vertex {vertex} refers to triangle {triangle}, which does not contain it"))]
    StaleBackReference { vertex: usize, triangle: usize },

    #[snafu(display("edge {edge} of triangle {triangle} is not locally Delaunay"))]
    NotDelaunay { triangle: usize, edge: usize },
}

fn same_circle(cached: &Circle, fresh: &Circle) -> bool {
    if cached.radius_squared.is_infinite() || fresh.radius_squared.is_infinite() {
        return cached.radius_squared == fresh.radius_squared;
    }
    let tolerance = 1e-9 * (1. + fresh.radius_squared);
    cached.center.distance_squared(fresh.center) <= tolerance
        && (cached.radius_squared - fresh.radius_squared).abs() <= tolerance
}

/// Checks winding, adjacency symmetry, circle cache, constraint pairing and
/// vertex back-references.
pub fn check_mesh(mesh: &Mesh) -> Result<(), InvariantViolation> {
    let triangles = mesh.triangles();

    for (ti, t) in triangles.iter().enumerate() {
        let [a, b, c] = mesh.corners(t);
        ensure!(orient(a, b, c) > 0., WindingSnafu { triangle: ti });
        ensure!(
            same_circle(&mesh.circles()[ti], &Circle::circumscribe(a, b, c)),
            StaleCircleSnafu { triangle: ti }
        );

        for edge in 0..3 {
            let (start, end) = t.edge(edge);
            if let Some(n) = t.adjacent[edge] {
                let back = triangles
                    .get(n)
                    .and_then(|other| other.index_of_edge(end, start).map(|i| (other, i)));
                let Some((other, back)) = back else {
                    return AsymmetricAdjacencySnafu { triangle: ti, edge }.fail();
                };
                ensure!(
                    other.adjacent[back] == Some(ti),
                    AsymmetricAdjacencySnafu { triangle: ti, edge }
                );

                if let Some(record) = t.constraints[edge] {
                    let paired = other.constraints[back].map(|r| &mesh.constraints()[r]);
                    ensure!(
                        paired.map_or(false, |r| r.id == mesh.constraints()[record].id),
                        UnpairedConstraintSnafu { triangle: ti, edge }
                    );
                }
            }

            if let Some(record) = t.constraints[edge] {
                let r = &mesh.constraints()[record];
                ensure!(
                    r.start == start && r.end == end && r.triangle == ti,
                    ConstraintOwnerSnafu {
                        record,
                        triangle: ti
                    }
                );
            }
        }
    }

    for (record, r) in mesh.constraints().iter().enumerate() {
        let owned = triangles
            .get(r.triangle)
            .and_then(|t| t.index_of_edge(r.start, r.end).map(|i| t.constraints[i]))
            .flatten();
        ensure!(
            owned == Some(record),
            ConstraintOwnerSnafu {
                record,
                triangle: r.triangle
            }
        );
    }

    for (vertex, v) in mesh.vertices().iter().enumerate() {
        if let Some(triangle) = v.triangle {
            ensure!(
                triangles
                    .get(triangle)
                    .map_or(false, |t| t.index_of(vertex).is_some()),
                StaleBackReferenceSnafu { vertex, triangle }
            );
        }
    }
    Ok(())
}

/// Checks that no unconstrained interior edge has its opposite apex strictly
/// inside the circumcircle. `tolerance` is relative to the squared radius.
pub fn check_delaunay(mesh: &Mesh, tolerance: f64) -> Result<(), InvariantViolation> {
    let triangles = mesh.triangles();
    for (ti, t) in triangles.iter().enumerate() {
        let circle = &mesh.circles()[ti];
        for edge in 0..3 {
            if t.is_constrained(edge) {
                continue;
            }
            let Some(n) = t.adjacent[edge] else { continue };
            let (start, end) = t.edge(edge);
            let Some(back) = triangles[n].index_of_edge(end, start) else {
                return AsymmetricAdjacencySnafu { triangle: ti, edge }.fail();
            };
            let apex = mesh.vertices()[triangles[n].apex(back)].pos;
            ensure!(
                circle.center.distance_squared(apex) >= circle.radius_squared * (1. - tolerance),
                NotDelaunaySnafu { triangle: ti, edge }
            );
        }
    }
    Ok(())
}
