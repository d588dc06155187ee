//! SLIC superpixels over a square, power-of-two RGBA-8888 texture.
//!
//! ```text
//! Slic::new ──► seeded ──► step() × N ──► output() / output_mean() / output_stddev()
//! ```
//!
//! ## Seeding
//!
//! The image is split into a `k × k` grid of `s × s` cells (`k = width / s`).
//! Each cluster starts at its cell center, is moved to the lowest-gradient
//! pixel of the `n × n` window around it, and takes the average color of
//! its cell.
//!
//! ## Step
//!
//! Every pixel within `s` of a cluster center (clipped to the image) is
//! scored against that cluster:
//!
//! ```text
//! D = color distance (channels in [0, 1]) + (m / s) · spatial distance
//! ```
//!
//! and ends up owned by the cluster with the lowest `D`. With
//! [`Accumulation::Incremental`] a cluster adds a pixel to its running sums
//! every time it improves that pixel's best distance, even if a later
//! cluster takes the pixel over. [`Accumulation::Assigned`] sums only the
//! final owners. Each cluster's mean color (and its center, with
//! `recenter`) is then recomputed from its sums. A cluster with empty sums
//! keeps its old state.
//!
//! Iteration stops after the requested number of steps; there is no
//! convergence test.

use crate::texture::{Encoding, Result, TexError, Texture};
use serde::{Deserialize, Serialize};

/// Color term of the SLIC distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorDistance {
    /// `sqrt(dr² + dg² + db² + da²)`.
    #[default]
    Euclidean,
    /// `sqrt(dr² + dg² + db²·da²)`: blue and alpha multiplied. Reproduces
    /// output of older tools; opaque images ignore blue entirely.
    Legacy,
}

impl ColorDistance {
    fn eval(self, a: &[u8], b: &[u8]) -> f32 {
        let d = |i: usize| (a[i] as f32 - b[i] as f32) / 255.0;
        let (dr, dg, db, da) = (d(0), d(1), d(2), d(3));
        match self {
            ColorDistance::Euclidean => (dr * dr + dg * dg + db * db + da * da).sqrt(),
            ColorDistance::Legacy => (dr * dr + dg * dg + db * db * da * da).sqrt(),
        }
    }
}

/// Which pixels feed a cluster's sums during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accumulation {
    /// Every improvement during the scan counts, including pixels later
    /// taken over by another cluster.
    #[default]
    Incremental,
    /// Only pixels a cluster still owns once every cluster has been scanned.
    Assigned,
}

/// Clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicParams {
    /// Superpixel edge `s`; a power of two below the image width.
    pub size: u32,
    /// Compactness `m`.
    pub compactness: f32,
    /// Gradient search window `n`; odd and below `s`.
    pub neighborhood: u32,
    /// Move centers to the centroid of their pixels after each step.
    pub recenter: bool,
    pub distance: ColorDistance,
    pub accumulation: Accumulation,
}

impl Default for SlicParams {
    fn default() -> Self {
        Self {
            size: 16,
            compactness: 10.0,
            neighborhood: 3,
            recenter: true,
            distance: ColorDistance::Euclidean,
            accumulation: Accumulation::Incremental,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cluster {
    pub x: u32,
    pub y: u32,
    /// Mean color.
    pub pixel: [u8; 4],
}

#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    count: u64,
    x: u64,
    y: u64,
    pixel: [u64; 4],
}

impl Accum {
    fn add(&mut self, x: u32, y: u32, pixel: &[u8]) {
        self.count += 1;
        self.x += x as u64;
        self.y += y as u64;
        for (sum, &v) in self.pixel.iter_mut().zip(pixel) {
            *sum += v as u64;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Assignment {
    dist: f32,
    cluster: Option<usize>,
}

const UNASSIGNED: Assignment = Assignment {
    dist: f32::INFINITY,
    cluster: None,
};

/// A clustering run borrowing its source texture.
pub struct Slic<'a> {
    tex: &'a Texture,
    params: SlicParams,
    k: u32,
    clusters: Vec<Cluster>,
    assignments: Vec<Assignment>,
    steps: usize,
}

impl<'a> Slic<'a> {
    /// Validate the texture and parameters, then seed the clusters.
    pub fn new(tex: &'a Texture, params: SlicParams) -> Result<Self> {
        let w = tex.width();
        if w != tex.height() || !w.is_power_of_two() || tex.encoding() != Encoding::Rgba8888 {
            log::debug!(
                "invalid width={w}, height={}, encoding={}",
                tex.height(),
                tex.encoding()
            );
            return Err(TexError::Validation(format!(
                "slic needs a square power-of-two RGBA-8888 texture, got {w}x{} {}",
                tex.height(),
                tex.encoding()
            )));
        }
        let SlicParams {
            size: s,
            neighborhood: n,
            compactness: m,
            ..
        } = params;
        if !s.is_power_of_two() || s >= w || n >= s || n % 2 != 1 || !m.is_finite() || m < 0.0 {
            log::debug!("invalid s={s}, width={w}, n={n}, m={m}");
            return Err(TexError::Validation(format!(
                "slic needs power-of-two s < {w}, odd n < s and finite m >= 0; got s={s}, n={n}, m={m}"
            )));
        }

        let k = w / s;
        let mut slic = Self {
            tex,
            params,
            k,
            clusters: Vec::with_capacity((k * k) as usize),
            assignments: vec![UNASSIGNED; w as usize * w as usize],
            steps: 0,
        };
        slic.seed();
        Ok(slic)
    }

    fn gradient(&self, x: i64, y: i64) -> f32 {
        let norm = |a: &[u8], b: &[u8]| {
            a.iter()
                .zip(b)
                .map(|(&p, &q)| {
                    let d = p as f32 - q as f32;
                    d * d
                })
                .sum::<f32>()
                .sqrt()
        };
        let t = self.tex;
        norm(t.pixel_clamped(x + 1, y), t.pixel_clamped(x - 1, y))
            + norm(t.pixel_clamped(x, y + 1), t.pixel_clamped(x, y - 1))
    }

    fn seed(&mut self) {
        let s = self.params.size;
        let half_n = (self.params.neighborhood / 2) as i64;
        let n = self.params.neighborhood as i64;
        let last = self.tex.width() as i64 - 1;
        let area = (s * s) as u64;

        self.clusters.clear();
        for i in 0..self.k {
            for j in 0..self.k {
                let cx = (s * j + s / 2) as i64;
                let cy = (s * i + s / 2) as i64;

                let (mut best, mut best_g) = ((cx, cy), f32::INFINITY);
                for y in cy - half_n..cy - half_n + n {
                    for x in cx - half_n..cx - half_n + n {
                        let g = self.gradient(x, y);
                        if g < best_g {
                            best = (x, y);
                            best_g = g;
                        }
                    }
                }

                let mut sum = [0u64; 4];
                for y in i * s..(i + 1) * s {
                    for x in j * s..(j + 1) * s {
                        for (acc, &c) in sum.iter_mut().zip(self.tex.pixel(x, y)) {
                            *acc += c as u64;
                        }
                    }
                }

                self.clusters.push(Cluster {
                    x: best.0.clamp(0, last) as u32,
                    y: best.1.clamp(0, last) as u32,
                    pixel: sum.map(|v| (v / area) as u8),
                });
            }
        }
    }

    /// Run one assignment/update pass.
    pub fn step(&mut self) {
        let w = self.tex.width();
        let s = self.params.size as i64;
        let last = w as i64 - 1;
        let spatial = self.params.compactness / self.params.size as f32;
        self.assignments.fill(UNASSIGNED);
        let mut accums = vec![Accum::default(); self.clusters.len()];

        for (c, cluster) in self.clusters.iter().enumerate() {
            let (cx, cy) = (cluster.x as i64, cluster.y as i64);
            let (x0, y0) = ((cx - s).max(0), (cy - s).max(0));
            let (x1, y1) = ((cx + s).min(last), (cy + s).min(last));
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let pixel = self.tex.pixel(x as u32, y as u32);
                    let (dx, dy) = ((x - cx) as f32, (y - cy) as f32);
                    let dist = self.params.distance.eval(&cluster.pixel, pixel)
                        + spatial * (dx * dx + dy * dy).sqrt();
                    let a = &mut self.assignments[(y * w as i64 + x) as usize];
                    if a.cluster.is_none() || dist < a.dist {
                        *a = Assignment {
                            dist,
                            cluster: Some(c),
                        };
                        accums[c].add(x as u32, y as u32, pixel);
                    }
                }
            }
        }

        if self.params.accumulation == Accumulation::Assigned {
            accums = self.accumulate();
        }
        for (cluster, acc) in self.clusters.iter_mut().zip(&accums) {
            if acc.count == 0 {
                continue;
            }
            if self.params.recenter {
                cluster.x = (acc.x / acc.count) as u32;
                cluster.y = (acc.y / acc.count) as u32;
            }
            cluster.pixel = acc.pixel.map(|v| (v / acc.count) as u8);
        }
        self.steps += 1;
        log::debug!("slic step={}", self.steps);
    }

    /// Run `steps` passes.
    pub fn solve(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    /// Sums over the current owners of each pixel.
    fn accumulate(&self) -> Vec<Accum> {
        let w = self.tex.width();
        let mut accums = vec![Accum::default(); self.clusters.len()];
        for (i, a) in self.assignments.iter().enumerate() {
            let Some(c) = a.cluster else { continue };
            let (x, y) = (i as u32 % w, i as u32 / w);
            accums[c].add(x, y, self.tex.pixel(x, y));
        }
        accums
    }

    pub fn params(&self) -> &SlicParams {
        &self.params
    }

    /// Clusters per axis.
    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Cluster in grid row `i`, column `j`.
    pub fn cluster(&self, i: u32, j: u32) -> &Cluster {
        &self.clusters[(i * self.k + j) as usize]
    }

    /// Index into [`clusters`](Self::clusters) of the cluster owning `(x, y)`.
    pub fn owner(&self, x: u32, y: u32) -> Option<usize> {
        self.assignments[y as usize * self.tex.width() as usize + x as usize].cluster
    }

    fn render(&self, color: impl Fn(usize) -> [u8; 4]) -> Result<Texture> {
        if self.steps == 0 {
            return Err(TexError::Validation(
                "slic output requested before any step".to_string(),
            ));
        }
        let w = self.tex.width();
        let mut out = Texture::with_size(w, w, Encoding::Rgba8888)?;
        for (i, a) in self.assignments.iter().enumerate() {
            if let Some(c) = a.cluster {
                out.set_pixel(i as u32 % w, i as u32 / w, &color(c));
            }
        }
        Ok(out)
    }

    /// Each pixel takes the source color at its cluster's center.
    pub fn output(&self) -> Result<Texture> {
        self.render(|c| {
            let cl = &self.clusters[c];
            let p = self.tex.pixel(cl.x, cl.y);
            [p[0], p[1], p[2], p[3]]
        })
    }

    /// Each pixel takes its cluster's mean color.
    pub fn output_mean(&self) -> Result<Texture> {
        self.render(|c| self.clusters[c].pixel)
    }

    /// Per-cluster RGB standard deviation, stretched so the largest
    /// deviation in the image maps to 255. Alpha is opaque.
    pub fn output_stddev(&self) -> Result<Texture> {
        let accums = self.accumulate();
        let means: Vec<[f64; 3]> = accums
            .iter()
            .map(|a| {
                let n = a.count.max(1) as f64;
                [a.pixel[0] as f64 / n, a.pixel[1] as f64 / n, a.pixel[2] as f64 / n]
            })
            .collect();

        let mut var = vec![[0f64; 3]; accums.len()];
        let w = self.tex.width();
        for (i, a) in self.assignments.iter().enumerate() {
            let Some(c) = a.cluster else { continue };
            let p = self.tex.pixel(i as u32 % w, i as u32 / w);
            for ch in 0..3 {
                let d = p[ch] as f64 - means[c][ch];
                var[c][ch] += d * d;
            }
        }
        let stddev: Vec<[f64; 3]> = var
            .iter()
            .zip(&accums)
            .map(|(v, a)| v.map(|s| (s / a.count.max(1) as f64).sqrt()))
            .collect();

        let max = stddev.iter().flatten().copied().fold(0.0f64, f64::max);
        let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
        self.render(|c| {
            let d = stddev[c].map(|v| (v * scale + 0.5).min(255.0) as u8);
            [d[0], d[1], d[2], 255]
        })
    }
}
