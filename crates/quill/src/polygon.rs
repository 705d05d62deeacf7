use crate::Point;

/// A simple polygon with a triangulation computed once at construction.
///
/// Vertices are usually given in unit space (`0.0..=1.0` on both axes) and
/// scaled to a bounding box at draw time.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
    triangles: Vec<[u32; 3]>,
}

impl Polygon {
    /// Triangulate `vertices` by ear clipping. Either winding order is accepted.
    ///
    /// Self-intersecting input still produces triangles, but they may overlap.
    pub fn new(vertices: impl Into<Vec<Point>>) -> Self {
        let vertices = vertices.into();
        let triangles = triangulate(&vertices);
        Self {
            vertices,
            triangles,
        }
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Triangles as indices into [`Polygon::vertices`].
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }
}

fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a - o).perp_dot(b - o)
}

fn signed_area(vertices: &[Point]) -> f32 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].perp_dot(vertices[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

fn in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

fn triangulate(vertices: &[Point]) -> Vec<[u32; 3]> {
    let n = vertices.len();
    if n < 3 {
        return Vec::new();
    }

    // Work on a counter-clockwise (positive area) index ring
    let mut ring: Vec<usize> = (0..n).collect();
    if signed_area(vertices) < 0.0 {
        ring.reverse();
    }

    let mut triangles = Vec::with_capacity(n - 2);
    let mut i = 0;
    let mut misses = 0;

    while ring.len() > 3 {
        let len = ring.len();
        let prev = ring[(i + len - 1) % len];
        let curr = ring[i % len];
        let next = ring[(i + 1) % len];
        let (a, b, c) = (vertices[prev], vertices[curr], vertices[next]);

        let convex = cross(a, b, c) > 0.0;
        let is_ear = convex
            && ring
                .iter()
                .filter(|&&j| j != prev && j != curr && j != next)
                .all(|&j| !in_triangle(vertices[j], a, b, c));

        if is_ear {
            triangles.push([prev as u32, curr as u32, next as u32]);
            ring.remove(i % len);
            misses = 0;
        } else {
            i += 1;
            misses += 1;
        }

        // Degenerate or self-intersecting input: clip whatever is left
        if misses >= ring.len() {
            let len = ring.len();
            let prev = ring[(i + len - 1) % len];
            let curr = ring[i % len];
            let next = ring[(i + 1) % len];
            triangles.push([prev as u32, curr as u32, next as u32]);
            ring.remove(i % len);
            misses = 0;
        }

        i %= ring.len();
    }

    triangles.push([ring[0] as u32, ring[1] as u32, ring[2] as u32]);
    triangles
}
