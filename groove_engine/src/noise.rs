// One-dimensional smoothed gradient noise.
//
// A Perlin-style noise function over the real line: every integer lattice
// point gets a gradient of +1 or -1 (the parity of a hashed permutation
// entry), each gradient contributes its signed distance to the sample point,
// and the two contributions are blended with the quintic fade curve
// 6t^5 - 15t^4 + 10t^3. The output is continuous, smooth, and bounded by
// [-1, 1]; `sample` scales it by an amplitude.
//
// The permutation is a Fisher-Yates shuffle of 0..=255 drawn from a
// `GrooveRng` seeded once at construction, stored twice over (512 entries) so
// `perm[xi + 1]` never needs a wrap. It is never mutated afterwards, so an
// engine can be read from the hot path freely.
//
// Each performer owns its own `NoiseEngine`; there is no shared instance.
//
// **Critical constraint: determinism.** Same seed, same x, same frequency,
// same amplitude -> bit-identical output.

use groove_prng::GrooveRng;

/// Seed used when a caller does not supply one.
pub const DEFAULT_NOISE_SEED: u64 = 0x6e6f_6973_6521;

const PERM_SIZE: usize = 256;

#[derive(Clone, Debug)]
pub struct NoiseEngine {
    perm: [u8; PERM_SIZE * 2],
}

impl NoiseEngine {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        GrooveRng::new(seed).shuffle(&mut table);
        let mut perm = [0u8; PERM_SIZE * 2];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i % PERM_SIZE];
        }
        NoiseEngine { perm }
    }

    /// Raw noise at `x`, in [-1, 1]. Exactly 0 on every integer.
    pub fn noise(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return 0.0;
        }
        let floor = x.floor();
        let xi = (floor as i64).rem_euclid(PERM_SIZE as i64) as usize;
        let xf = x - floor;

        let left = gradient(self.perm[xi], xf);
        let right = gradient(self.perm[xi + 1], xf - 1.0);
        lerp(left, right, fade(xf))
    }

    /// `noise(x * frequency) * amplitude`, in [-amplitude, amplitude].
    pub fn sample(&self, x: f64, frequency: f64, amplitude: f64) -> f64 {
        self.noise(x * frequency) * amplitude
    }
}

impl Default for NoiseEngine {
    fn default() -> Self {
        NoiseEngine::new(DEFAULT_NOISE_SEED)
    }
}

/// Quintic smoothstep: zero first and second derivatives at 0 and 1.
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Gradient of +1 or -1 picked by hash parity, dotted with the distance.
fn gradient(hash: u8, distance: f64) -> f64 {
    if hash & 1 == 0 { distance } else { -distance }
}
