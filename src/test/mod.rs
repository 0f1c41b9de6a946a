use std::f64::consts::PI;

use crate::{
    geometry::{blocks_sight, lines_cross_args, orient},
    validate::{check_delaunay, check_mesh},
    Circle, Hit, InsertOutcome, Mesh, MeshError, Rect, RefineConfig, SegmentOutcome,
    Triangulator, TriangulatorConfig, Vec2, Vertex, MAX_FLIPS_PER_DIAGONAL,
};

fn super_triangle(bounds: Rect) -> Mesh {
    let c = bounds.center();
    let d = bounds.width().max(bounds.height()).max(1.);
    let vertices = vec![
        Vertex::new(c.x - 20. * d, c.y - 10. * d),
        Vertex::new(c.x + 20. * d, c.y - 10. * d),
        Vertex::new(c.x, c.y + 20. * d),
    ];
    Mesh::from_triangles(vertices, &[[0, 1, 2]]).unwrap()
}

fn triangulator(bounds: Rect, config: TriangulatorConfig) -> Triangulator {
    Triangulator::new(super_triangle(bounds), config)
}

fn ten_by_ten() -> Rect {
    Rect::new(Vec2::ZERO, Vec2::new(10., 10.))
}

fn square_mesh() -> Mesh {
    let vertices = vec![
        Vertex::new(0., 0.),
        Vertex::new(2., 0.),
        Vertex::new(2., 2.),
        Vertex::new(0., 2.),
    ];
    Mesh::from_triangles(vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
}

/// Deterministic scatter in `[0, 10)^2`.
fn scatter(count: usize) -> Vec<Vec2> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 10.
    };
    (0..count).map(|_| Vec2::new(next(), next())).collect()
}

fn triangle_area(mesh: &Mesh, triangle: usize) -> f64 {
    let t = &mesh.triangles()[triangle];
    let [a, b, c] = t.vertices.map(|v| mesh.vertices()[v].pos);
    orient(a, b, c) * 0.5
}

fn insert(tri: &mut Triangulator, p: Vec2, seed: Option<f64>) -> usize {
    tri.try_insert_point(p.x, p.y, seed, None)
        .unwrap()
        .vertex()
        .unwrap()
}

#[test]
fn point_insertion_keeps_every_invariant() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default());
    for p in scatter(80) {
        let outcome = tri.try_insert_point(p.x, p.y, None, None).unwrap();
        assert!(matches!(outcome, InsertOutcome::Inserted(_)));
        check_mesh(tri.mesh()).unwrap();
    }
    check_delaunay(tri.mesh(), 1e-9).unwrap();
    assert_eq!(tri.mesh().vertex_count(), 83);
    assert_eq!(tri.mesh().triangle_count(), 1 + 2 * 80);
}

#[test]
fn splits_and_flips_change_counts_as_expected() {
    let mut mesh = square_mesh();
    assert_eq!(mesh.triangle_count(), 2);

    let e = mesh.triangles()[0].index_of_edge(2, 0).unwrap();
    mesh.flip(0, e, false).unwrap().unwrap();
    assert_eq!(mesh.triangle_count(), 2);
    check_mesh(&mesh).unwrap();

    let inner = mesh.push_vertex(Vertex::new(1.5, 0.8));
    let containing = (0..mesh.triangle_count())
        .find(|&t| {
            let [a, b, c] = mesh.triangles()[t].vertices.map(|v| mesh.vertices()[v].pos);
            let p = Vec2::new(1.5, 0.8);
            orient(a, b, p) > 0. && orient(b, c, p) > 0. && orient(c, a, p) > 0.
        })
        .unwrap();
    mesh.split_triangle(containing, inner).unwrap();
    assert_eq!(mesh.triangle_count(), 4);
    check_mesh(&mesh).unwrap();

    let boundary = mesh.push_vertex(Vertex::new(0., 1.));
    let (t, e) = (0..mesh.triangle_count())
        .find_map(|t| mesh.triangles()[t].index_of_edge(3, 0).map(|e| (t, e)))
        .unwrap();
    mesh.split_edge(t, e, boundary).unwrap();
    assert_eq!(mesh.triangle_count(), 5);
    check_mesh(&mesh).unwrap();

    let (t, e) = (0..mesh.triangle_count())
        .find_map(|t| mesh.triangles()[t].index_of_edge(inner, 2).map(|e| (t, e)))
        .unwrap();
    let midway = mesh.push_vertex(Vertex::new(1.75, 1.4));
    mesh.split_edge(t, e, midway).unwrap();
    assert_eq!(mesh.triangle_count(), 7);
    check_mesh(&mesh).unwrap();
}

#[test]
fn circler_walks_full_and_partial_fans() {
    let mesh = square_mesh();
    let mut around_zero: Vec<usize> = mesh.circler(0).collect();
    around_zero.sort_unstable();
    assert_eq!(around_zero, vec![0, 1]);
    assert_eq!(mesh.circler(1).collect::<Vec<_>>(), vec![0]);
    assert_eq!(mesh.circler(3).collect::<Vec<_>>(), vec![1]);
    let from_second: Vec<usize> = mesh.circler_from(1, 0).collect();
    assert_eq!(from_second.first(), Some(&1));
    assert_eq!(from_second.len(), 2);

    let mut tri = Triangulator::new(mesh, TriangulatorConfig::default());
    let v = insert(&mut tri, Vec2::new(1.5, 0.5), None);
    let mut fan: Vec<usize> = tri.mesh().circler(v).collect();
    fan.sort_unstable();
    fan.dedup();
    assert_eq!(fan.len(), tri.mesh().circler(v).count());
    let incident = tri
        .mesh()
        .triangles()
        .iter()
        .filter(|t| t.index_of(v).is_some())
        .count();
    assert_eq!(fan.len(), incident);
}

#[test]
fn find_edge_respects_direction() {
    let mesh = square_mesh();
    assert_eq!(
        mesh.find_edge(0, 2).hit,
        Hit::Edge {
            triangle: 1,
            edge: 0
        }
    );
    assert_eq!(
        mesh.find_edge(2, 0).hit,
        Hit::Edge {
            triangle: 0,
            edge: 2
        }
    );
    assert!(matches!(mesh.find_edge_undirected(1, 0).hit, Hit::Edge { .. }));
    assert_eq!(mesh.find_edge(1, 3).hit, Hit::NotFound);
    assert_eq!(mesh.find_edge(1, 1).hit, Hit::Aborted);
}

#[test]
fn point_on_interior_edge_splits_four_ways() {
    let mut tri = Triangulator::new(square_mesh(), TriangulatorConfig::default());

    let location = tri.locate(Vec2::new(1., 1.));
    let Hit::Edge { triangle, edge } = location.hit else {
        panic!("expected an edge hit, got {location:?}");
    };
    let (a, b) = tri.mesh().triangles()[triangle].edge(edge);
    assert!(matches!((a, b), (0, 2) | (2, 0)));

    let outcome = tri.try_insert_point(1., 1., Some(0.5), Some("center")).unwrap();
    assert_eq!(outcome, InsertOutcome::Inserted(4));
    assert_eq!(tri.mesh().triangle_count(), 4);
    assert_eq!(tri.mesh().vertices()[4].id.as_deref(), Some("center"));
    check_mesh(tri.mesh()).unwrap();
    check_delaunay(tri.mesh(), 1e-9).unwrap();
}

#[test]
fn insertion_near_existing_vertex_is_a_no_op() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default());
    let v = insert(&mut tri, Vec2::new(2., 2.), Some(1.));
    insert(&mut tri, Vec2::new(7., 3.), Some(1.));
    let before = tri.mesh().clone();

    let again = tri.try_insert_point(2., 2., None, None).unwrap();
    assert_eq!(again, InsertOutcome::Existing(v));
    let close = tri.try_insert_point(2. + 1e-12, 2., None, None).unwrap();
    assert_eq!(close, InsertOutcome::Existing(v));

    assert_eq!(tri.mesh().triangles(), before.triangles());
    assert_eq!(tri.mesh().vertex_count(), before.vertex_count());
}

#[test]
fn points_outside_the_mesh_are_reported() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default());
    let outcome = tri.try_insert_point(1e6, 1e6, None, None).unwrap();
    assert_eq!(outcome, InsertOutcome::Outside);
    assert_eq!(tri.mesh().vertex_count(), 3);
    assert_eq!(tri.mesh().triangle_count(), 1);
}

#[test]
fn broken_adjacency_aborts_the_walk() {
    let mut mesh = square_mesh();
    // point the boundary edge (1, 2) back into the mesh so the walk ping-pongs
    mesh.triangles[0].adjacent[1] = Some(1);
    let location = mesh.locate(Vec2::new(3., 1.), Some(0), 1e-9);
    assert_eq!(location.hit, Hit::Aborted);
    assert_eq!(location.steps, mesh.triangle_count() * 3);
}

#[test]
fn out_of_range_indices_are_errors() {
    let mut mesh = square_mesh();
    assert_eq!(
        mesh.legalize(&[7], None).unwrap_err(),
        MeshError::TriangleOutOfRange { index: 7 }
    );
    let tri = Triangulator::new(mesh, TriangulatorConfig::default());
    assert_eq!(
        tri.entrance_triangle(0, 9).unwrap_err(),
        MeshError::VertexOutOfRange { index: 9 }
    );
}

#[test]
fn legalizer_terminates_on_cocircular_ring() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default());
    for k in 0..64 {
        let angle = 2. * PI * k as f64 / 64.;
        insert(&mut tri, Vec2::new(5. + 4. * angle.cos(), 5. + 4. * angle.sin()), None);
    }
    insert(&mut tri, Vec2::new(5., 5.), None);
    check_mesh(tri.mesh()).unwrap();
    check_delaunay(tri.mesh(), 1e-6).unwrap();

    let mut mesh = tri.into_mesh();
    let everything: Vec<usize> = (0..mesh.triangle_count()).collect();
    let n = mesh.vertex_count();
    let flips = mesh.legalize(&everything, None).unwrap();
    assert!(flips <= MAX_FLIPS_PER_DIAGONAL as usize * n * (n - 1) / 2);
    check_mesh(&mesh).unwrap();
}

#[test]
fn seeds_are_interpolated_when_missing() {
    let mut tri = Triangulator::new(square_mesh(), TriangulatorConfig::default());
    for v in 0..4 {
        tri.mesh.vertices[v].seed = Some(2.);
    }
    let v = insert(&mut tri, Vec2::new(1.5, 0.5), None);
    assert!((tri.mesh().vertices()[v].seed.unwrap() - 2.).abs() < 1e-12);
    let w = insert(&mut tri, Vec2::new(1., 0.), None);
    assert!((tri.mesh().vertices()[w].seed.unwrap() - 2.).abs() < 1e-12);
}

#[test]
fn constraint_records_follow_splits() {
    let mut tri = Triangulator::new(square_mesh(), TriangulatorConfig::default());
    assert!(tri.set_constraint(0, 2, Some("diag")).unwrap());
    assert_eq!(tri.mesh().constraints().len(), 2);
    // marking twice changes nothing
    assert!(tri.set_constraint(2, 0, Some("diag")).unwrap());
    assert_eq!(tri.mesh().constraints().len(), 2);
    assert!(!tri.set_constraint(1, 3, None).unwrap());

    insert(&mut tri, Vec2::new(1., 1.), None);
    assert_eq!(tri.mesh().constraints().len(), 4);
    assert!(tri
        .mesh()
        .constraints()
        .iter()
        .all(|c| c.id.as_deref() == Some("diag")));
    check_mesh(tri.mesh()).unwrap();
}

fn square_sides(tri: &mut Triangulator, corners: [Vec2; 4], id: &str) -> [usize; 4] {
    let v = corners.map(|p| insert(tri, p, Some(1.)));
    for i in 0..4 {
        tri.insert_segment(v[i], v[(i + 1) % 4], Some(id)).unwrap();
        check_mesh(tri.mesh()).unwrap();
    }
    v
}

#[test]
fn boundary_square_is_tiled_by_two_triangles() {
    let unit = Rect::new(Vec2::ZERO, Vec2::new(1., 1.));
    let mut tri = triangulator(unit, TriangulatorConfig::default());
    let corners = [
        Vec2::new(0., 0.),
        Vec2::new(1., 0.),
        Vec2::new(1., 1.),
        Vec2::new(0., 1.),
    ];
    let v = square_sides(&mut tri, corners, "square");
    let mesh = tri.mesh();

    assert_eq!(mesh.constraints().len(), 8);
    assert!(mesh
        .constraints()
        .iter()
        .all(|c| c.id.as_deref() == Some("square")));

    let inside = mesh
        .triangles()
        .iter()
        .filter(|t| t.vertices.iter().all(|c| v.contains(c)))
        .count();
    assert_eq!(inside, 2);

    for t in mesh.triangles() {
        for edge in 0..3 {
            if t.is_constrained(edge) {
                continue;
            }
            let (a, b) = t.edge(edge);
            let (pa, pb) = (mesh.vertices()[a].pos, mesh.vertices()[b].pos);
            for i in 0..4 {
                let Some((s, u)) = lines_cross_args(pa, pb, corners[i], corners[(i + 1) % 4]) else {
                    continue;
                };
                let interior = |x: f64| x > 1e-9 && x < 1. - 1e-9;
                assert!(!(interior(s) && interior(u)), "edge ({a}, {b}) crosses the square");
            }
        }
    }
    check_delaunay(mesh, 1e-9).unwrap_or_else(|e| panic!("{e}"));
}

fn constrained_length(mesh: &Mesh, id: &str) -> f64 {
    mesh.constraints()
        .iter()
        .filter(|c| c.id.as_deref() == Some(id))
        .map(|c| mesh.vertices()[c.start].pos.distance_squared(mesh.vertices()[c.end].pos).sqrt())
        .sum()
}

fn cut_through_scatter(config: TriangulatorConfig) -> Triangulator {
    let mut tri = triangulator(ten_by_ten(), config);
    for p in scatter(60) {
        if (p.y - 5.).abs() > 0.2 {
            insert(&mut tri, p, None);
        }
    }
    let outcome = tri
        .insert_segment_between(Vec2::new(0.5, 5.), Vec2::new(9.5, 5.), Some("cut"))
        .unwrap();
    assert!(matches!(outcome, SegmentOutcome::Inserted { .. }));
    check_mesh(tri.mesh()).unwrap();
    tri
}

#[test]
fn segment_insertion_by_flipping() {
    let tri = cut_through_scatter(TriangulatorConfig::default());
    let mesh = tri.mesh();
    // every interior piece carries one record per side
    assert!((constrained_length(mesh, "cut") - 18.).abs() < 1e-9);
    for c in mesh.constraints() {
        let (a, b) = (mesh.vertices()[c.start].pos, mesh.vertices()[c.end].pos);
        assert!((a.y - 5.).abs() < 1e-9 && (b.y - 5.).abs() < 1e-9);
    }
    check_delaunay(mesh, 1e-9).unwrap();
}

#[test]
fn segment_insertion_with_exact_splits() {
    let tri = cut_through_scatter(TriangulatorConfig::default().with_exact_split(true));
    let mesh = tri.mesh();
    assert!((constrained_length(mesh, "cut") - 18.).abs() < 1e-9);
    assert!(mesh.constraints().len() > 2);
    for c in mesh.constraints() {
        let (a, b) = (mesh.vertices()[c.start].pos, mesh.vertices()[c.end].pos);
        assert!((a.y - 5.).abs() < 1e-9 && (b.y - 5.).abs() < 1e-9);
    }
}

#[test]
fn segment_from_unplaced_vertex_has_no_entrance() {
    let mut tri = Triangulator::new(square_mesh(), TriangulatorConfig::default());
    let free = tri.mesh.push_vertex(Vertex::new(1., 1.));
    assert_eq!(
        tri.insert_segment(free, 0, None).unwrap_err(),
        MeshError::NoEntranceTriangle {
            start: free,
            end: 0
        }
    );
}

#[test]
fn segment_outside_the_mesh_is_skipped() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default());
    let outcome = tri
        .insert_segment_between(Vec2::new(1., 1.), Vec2::new(1e6, 1.), None)
        .unwrap();
    assert_eq!(outcome, SegmentOutcome::Skipped(InsertOutcome::Outside));
    assert!(tri.mesh().constraints().is_empty());
}

#[test]
fn zero_eps_is_accepted() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default().with_eps(0.));
    let points = scatter(30);
    let first = insert(&mut tri, points[0], None);
    for &p in &points[1..] {
        insert(&mut tri, p, None);
    }
    assert_eq!(
        tri.try_insert_point(points[0].x, points[0].y, None, None).unwrap(),
        InsertOutcome::Existing(first)
    );
    let a = insert(&mut tri, Vec2::new(0.25, 0.25), None);
    let b = insert(&mut tri, Vec2::new(9.75, 9.75), None);
    tri.insert_segment(a, b, Some("diag")).unwrap();
    check_mesh(tri.mesh()).unwrap();
}

fn circle_in_square(tri: &mut Triangulator, seed: f64) {
    let corners = [
        Vec2::new(0., 0.),
        Vec2::new(10., 0.),
        Vec2::new(10., 10.),
        Vec2::new(0., 10.),
    ];
    let square: Vec<usize> = corners.iter().map(|&p| insert(tri, p, Some(seed))).collect();
    let ring: Vec<usize> = (0..24)
        .map(|k| {
            let angle = 2. * PI * k as f64 / 24.;
            insert(tri, Vec2::new(5. + 4. * angle.cos(), 5. + 4. * angle.sin()), Some(seed))
        })
        .collect();
    for i in 0..square.len() {
        tri.insert_segment(square[i], square[(i + 1) % square.len()], Some("outer"))
            .unwrap();
    }
    for i in 0..ring.len() {
        tri.insert_segment(ring[i], ring[(i + 1) % ring.len()], Some("circle"))
            .unwrap();
    }
}

fn largest_inner_area(mesh: &Mesh) -> f64 {
    (0..mesh.triangle_count())
        .filter(|&t| mesh.triangles()[t].vertices.iter().all(|&v| v >= 3))
        .map(|t| triangle_area(mesh, t))
        .fold(0., f64::max)
}

/// Triangles larger than their mean seed whose circumcenter lies in `bounds`.
fn oversized_triangles(mesh: &Mesh, bounds: &Rect) -> usize {
    (0..mesh.triangle_count())
        .filter(|&t| {
            let vertices = mesh.triangles()[t].vertices;
            if vertices.iter().any(|&v| v < 3) {
                return false;
            }
            let seeds: Vec<f64> = vertices
                .iter()
                .filter_map(|&v| mesh.vertices()[v].seed)
                .collect();
            seeds.len() == 3
                && triangle_area(mesh, t) > seeds.iter().sum::<f64>() / 3.
                && bounds.contains(mesh.circles()[t].center)
        })
        .count()
}

/// Constraint records with a visible vertex strictly inside their diametral
/// circle.
fn encroached_records(mesh: &Mesh) -> usize {
    let key = |a: usize, b: usize| (a.min(b), a.max(b));
    let pos = |v: usize| mesh.vertices()[v].pos;
    let records = mesh.constraints();
    records
        .iter()
        .filter(|r| {
            let circle = Circle::diametral(pos(r.start), pos(r.end));
            let mid = pos(r.start).midpoint(pos(r.end));
            (0..mesh.vertex_count()).any(|v| {
                v != r.start
                    && v != r.end
                    && circle.contains(pos(v))
                    && records.iter().all(|o| {
                        key(o.start, o.end) == key(r.start, r.end)
                            || !blocks_sight(mid, pos(v), pos(o.start), pos(o.end))
                    })
            })
        })
        .count()
}

#[test]
fn refinement_converges_on_circle_in_square() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default());
    circle_in_square(&mut tri, 1.);
    check_mesh(tri.mesh()).unwrap();
    let before = largest_inner_area(tri.mesh());

    let report = tri.refine(&RefineConfig::default()).unwrap();
    assert!(report.steiner_points > 0);
    assert!(report.segment_splits > 0);
    assert_eq!(report.aborted, 0);
    check_mesh(tri.mesh()).unwrap();
    check_delaunay(tri.mesh(), 1e-6).unwrap();
    assert_eq!(oversized_triangles(tri.mesh(), &ten_by_ten()), 0);
    assert_eq!(encroached_records(tri.mesh()), 0);

    let after = largest_inner_area(tri.mesh());
    assert!(after < before, "largest area {after} did not shrink from {before}");
}

#[test]
fn refinement_respects_domain_predicate() {
    let mut tri = triangulator(ten_by_ten(), TriangulatorConfig::default());
    circle_in_square(&mut tri, 1.);
    let center = Vec2::new(5., 5.);
    let outside_circle = |p: Vec2| p.distance_squared(center) >= 16.;
    let report = tri.refine_in(&RefineConfig::default(), &outside_circle).unwrap();
    assert!(report.skipped > 0);
    assert_eq!(report.aborted, 0);
    check_mesh(tri.mesh()).unwrap();

    // ring midpoints sit just inside the circle, circumcenters never do
    let steiner_inside = tri.mesh().vertices()[3 + 28..]
        .iter()
        .filter(|v| v.pos.distance_squared(center) < 15.5)
        .count();
    assert_eq!(steiner_inside, 0);
}

#[test]
fn refinement_reports_aborted_walks() {
    let vertices = vec![
        Vertex::new(0., 0.).with_seed(0.1),
        Vertex::new(4., 0.).with_seed(0.1),
        Vertex::new(2., 1.).with_seed(0.1),
        Vertex::new(2., -3.),
    ];
    let mut mesh = Mesh::from_triangles(vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap();
    // the obtuse triangle's circumcenter lies across (0, 1); loop that edge
    // back onto itself so the walk never gets there
    let edge = mesh.triangles()[0].index_of_edge(0, 1).unwrap();
    mesh.triangles[0].adjacent[edge] = Some(0);

    let mut tri = Triangulator::new(mesh, TriangulatorConfig::default());
    let config = RefineConfig {
        super_vertices: 0,
        bounds: None,
    };
    let report = tri.refine(&config).unwrap();
    assert_eq!(report.aborted, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.steiner_points, 0);
    assert_eq!(tri.mesh().vertex_count(), 4);
}
