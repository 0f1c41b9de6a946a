use std::f64::consts::PI;

use cdt_mesher as cdt;
use macroquad::prelude::*;

const SCALE: f32 = 50.;

fn window_conf() -> Conf {
    Conf {
        window_title: "cdt_mesher".to_owned(),
        window_width: 640,
        window_height: 640,
        high_dpi: true,
        ..Default::default()
    }
}

fn build(seed: f64) -> Result<cdt::Triangulator, cdt::MeshError> {
    let super_triangle = cdt::Mesh::from_triangles(
        vec![
            cdt::Vertex::new(-100., -50.),
            cdt::Vertex::new(110., -50.),
            cdt::Vertex::new(5., 110.),
        ],
        &[[0, 1, 2]],
    )?;
    let mut triangulator =
        cdt::Triangulator::new(super_triangle, cdt::TriangulatorConfig::default());

    let square = [(0., 0.), (10., 0.), (10., 10.), (0., 10.)];
    let circle = (0..32).map(|k| {
        let angle = 2. * PI * k as f64 / 32.;
        (5. + 3.5 * angle.cos(), 5. + 3.5 * angle.sin())
    });

    let mut outer = vec![];
    for (x, y) in square {
        if let Some(v) = triangulator.try_insert_point(x, y, Some(seed), Some("outer"))?.vertex() {
            outer.push(v);
        }
    }
    let mut ring = vec![];
    for (x, y) in circle {
        if let Some(v) = triangulator.try_insert_point(x, y, Some(seed * 0.25), None)?.vertex() {
            ring.push(v);
        }
    }
    for contour in [&outer, &ring] {
        for i in 0..contour.len() {
            triangulator.insert_segment(contour[i], contour[(i + 1) % contour.len()], None)?;
        }
    }
    Ok(triangulator)
}

#[macroquad::main(window_conf)]
async fn main() {
    let mut triangulator = build(0.5).unwrap();
    let coarse = triangulator.mesh().clone();
    let report = triangulator.refine(&cdt::RefineConfig::default()).unwrap();
    let fine = triangulator.into_mesh();
    println!("{report:?}");

    let mut refined = true;
    loop {
        if is_key_pressed(KeyCode::Space) {
            refined = !refined;
        }
        clear_background(BLACK);

        let mesh = if refined { &fine } else { &coarse };
        let origin =
            Vec2::new(screen_width() * 0.5, screen_height() * 0.5) - Vec2::splat(5. * SCALE);
        let to_screen = |v: usize| {
            let p = mesh.vertices()[v].pos;
            Vec2::new(origin.x + p.x as f32 * SCALE, origin.y + (10. - p.y as f32) * SCALE)
        };

        for triangle in mesh.triangles() {
            if triangle.vertices.iter().any(|&v| v < 3) {
                continue;
            }
            for i in 0..3 {
                let (a, b) = triangle.edge(i);
                let (a, b) = (to_screen(a), to_screen(b));
                let color = if triangle.is_constrained(i) { RED } else { WHITE };
                draw_line(a.x, a.y, b.x, b.y, 1., color);
            }
        }
        draw_text(
            if refined { "refined (space)" } else { "constrained (space)" },
            10.,
            20.,
            20.,
            GRAY,
        );

        next_frame().await
    }
}
