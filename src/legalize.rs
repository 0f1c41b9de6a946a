use std::collections::HashMap;

use tracing::debug;

use crate::{config::MAX_FLIPS_PER_DIAGONAL, error::MeshError, mesh::Mesh};

fn diagonal_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Mesh {
    /// Flips edges around `seeds` until every reachable unconstrained edge is
    /// locally Delaunay, or its diagonal has been flipped
    /// [`MAX_FLIPS_PER_DIAGONAL`] times.
    ///
    /// Every popped triangle is appended to `affected` when given. Returns the
    /// number of flips performed.
    pub fn legalize(
        &mut self,
        seeds: &[usize],
        mut affected: Option<&mut Vec<usize>>,
    ) -> Result<usize, MeshError> {
        let mut stack = seeds.to_vec();
        let mut flip_counts: HashMap<(usize, usize), u8> = HashMap::new();
        let mut flips = 0;

        while let Some(triangle) = stack.pop() {
            if let Some(affected) = affected.as_deref_mut() {
                affected.push(triangle);
            }

            for edge in 0..3 {
                let (a, b) = self.triangle(triangle)?.edge(edge);
                let key = diagonal_key(a, b);
                if flip_counts.get(&key).copied().unwrap_or(0) >= MAX_FLIPS_PER_DIAGONAL {
                    continue;
                }
                let check = self.can_flip(triangle, edge, false)?;
                if !(check.legal && check.recommended) {
                    continue;
                }
                if let Some([t0, t1]) = self.flip(triangle, edge, false)? {
                    *flip_counts.entry(key).or_insert(0) += 1;
                    flips += 1;
                    stack.push(triangle);
                    stack.push(t0);
                    stack.push(t1);
                    break;
                }
            }
        }

        debug!(seeds = seeds.len(), flips, "legalized");
        Ok(flips)
    }
}
