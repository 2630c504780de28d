//! Coherent noise and periodic noise fields for terrain classification.
//!
//! `PerlinNoise` is a seeded 3D gradient noise; `NoiseField` samples one
//! layer of it over a chunk-sized window. Distinct layers are separated along
//! the third axis so that two layers drawn from the same seed can be
//! differenced meaningfully.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Distance along the z axis between two consecutive noise layers.
pub const NOISE_LAYER_DIFF: i32 = 100;

const GRAD3: [[f64; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Quintic smoothstep.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Gradient noise over a seeded permutation table.
///
/// Holds no mutable state: one instance can be shared by any number of
/// readers, and each chunk generation builds its own from the world seed.
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl PerlinNoise {
    /// Permutation table shuffled by a `StdRng` seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        table.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&table);
        perm[256..].copy_from_slice(&table);
        Self { perm }
    }

    #[inline]
    fn hash(&self, x: i32, y: i32, z: i32) -> usize {
        let x = (x & 255) as usize;
        let y = (y & 255) as usize;
        let z = (z & 255) as usize;
        self.perm[self.perm[self.perm[x] as usize + y] as usize + z] as usize % 12
    }

    /// Noise at (x, y, z), roughly within [-1, 1].
    pub fn noise_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, yi, zi) = (x.floor() as i32, y.floor() as i32, z.floor() as i32);
        let (xf, yf, zf) = (x - x.floor(), y - y.floor(), z - z.floor());
        let corner = |dx: i32, dy: i32, dz: i32| {
            let g = self.hash(xi + dx, yi + dy, zi + dz);
            dot3(g, xf - dx as f64, yf - dy as f64, zf - dz as f64)
        };

        let (u, v, w) = (fade(xf), fade(yf), fade(zf));
        let near = lerp(
            v,
            lerp(u, corner(0, 0, 0), corner(1, 0, 0)),
            lerp(u, corner(0, 1, 0), corner(1, 1, 0)),
        );
        let far = lerp(
            v,
            lerp(u, corner(0, 0, 1), corner(1, 0, 1)),
            lerp(u, corner(0, 1, 1), corner(1, 1, 1)),
        );
        lerp(w, near, far)
    }
}

#[inline]
fn dot3(grad_idx: usize, x: f64, y: f64, z: f64) -> f64 {
    let g = &GRAD3[grad_idx];
    g[0] * x + g[1] * y + g[2] * z
}

/// A `width * height` window of one noise layer.
///
/// Indexing wraps with a bitmask, so both dimensions must be powers of two.
pub struct NoiseField {
    width: usize,
    height: usize,
    values: Vec<f64>,
}

impl NoiseField {
    /// Sample `layer` of `source` over the window starting at world
    /// coordinates (`origin_x`, `origin_y`).
    ///
    /// `feature_size` is the sampling stride: larger values give broader
    /// features.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not a power of two.
    pub fn new(
        source: &PerlinNoise,
        origin_x: i32,
        origin_y: i32,
        width: usize,
        height: usize,
        feature_size: i32,
        layer: i32,
    ) -> Self {
        assert!(
            width.is_power_of_two() && height.is_power_of_two(),
            "noise field dimensions must be powers of two, got {width}x{height}"
        );

        let mut field = Self {
            width,
            height,
            values: vec![0.0; width * height],
        };
        let fs = feature_size as f64;
        let z = (layer * NOISE_LAYER_DIFF) as f64;
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let value = source.noise_3d(
                    (x + origin_x) as f64 / fs,
                    (y + origin_y) as f64 / fs,
                    z,
                );
                field.set_sample(x, y, value);
            }
        }
        field
    }

    /// Build a throwaway noise source for `seed` and sample one layer of it.
    pub fn from_seed(
        seed: u64,
        origin_x: i32,
        origin_y: i32,
        width: usize,
        height: usize,
        feature_size: i32,
        layer: i32,
    ) -> Self {
        let source = PerlinNoise::new(seed);
        Self::new(&source, origin_x, origin_y, width, height, feature_size, layer)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (x as usize & (self.width - 1)) + (y as usize & (self.height - 1)) * self.width
    }

    /// Value at (x, y), wrapping around both axes.
    #[inline]
    pub fn sample(&self, x: i32, y: i32) -> f64 {
        self.values[self.index(x, y)]
    }

    fn set_sample(&mut self, x: i32, y: i32, value: f64) {
        let i = self.index(x, y);
        self.values[i] = value;
    }

    /// Row-major values, `width * height` long.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}
