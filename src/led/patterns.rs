//! Per-state LED animations and colour helpers.
//!
//! Every pattern draws a layered base wave plus random accents (sparkles,
//! comets, sparks). Frame count and frame interval are per pattern; the
//! renderer owns timing and cancellation.

use crate::state::AssistantState;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f32::consts::TAU;
use std::sync::OnceLock;
use std::time::Duration;

/// One pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor` (saturating).
    #[must_use]
    pub fn fade(self, factor: f32) -> Self {
        let scale = |c: u8| (f32::from(c) * factor) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Channel-wise saturating sum.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self::new(
            self.r.saturating_add(other.r),
            self.g.saturating_add(other.g),
            self.b.saturating_add(other.b),
        )
    }

    /// Gamma 2.2 correction for smoother low levels.
    #[must_use]
    pub fn gamma(self) -> Self {
        let lut = gamma_lut();
        Self::new(
            lut[usize::from(self.r)],
            lut[usize::from(self.g)],
            lut[usize::from(self.b)],
        )
    }
}

fn gamma_lut() -> &'static [u8; 256] {
    static LUT: OnceLock<[u8; 256]> = OnceLock::new();
    LUT.get_or_init(|| {
        let mut lut = [0u8; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = ((i as f32 / 255.0).powf(2.2) * 255.0 + 0.5) as u8;
        }
        lut
    })
}

/// HSV to RGB; `h` wraps, `s` and `v` in 0.0–1.0.
#[must_use]
pub fn hsv(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0);
    let sector = (h * 6.0) as u32;
    let f = h * 6.0 - sector as f32;
    let p = (255.0 * v * (1.0 - s)) as u8;
    let q = (255.0 * v * (1.0 - f * s)) as u8;
    let t = (255.0 * v * (1.0 - (1.0 - f) * s)) as u8;
    let v = (255.0 * v) as u8;
    match sector % 6 {
        0 => Rgb::new(v, t, p),
        1 => Rgb::new(q, v, p),
        2 => Rgb::new(p, v, t),
        3 => Rgb::new(p, q, v),
        4 => Rgb::new(t, p, v),
        _ => Rgb::new(v, p, q),
    }
}

/// Classic 0–255 colour wheel: green → red → blue → green.
#[must_use]
pub fn wheel(pos: u8) -> Rgb {
    let pos = u16::from(pos);
    let ramp = |x: u16| (x * 3) as u8;
    if pos < 85 {
        Rgb::new(ramp(pos), 255 - ramp(pos), 0)
    } else if pos < 170 {
        let pos = pos - 85;
        Rgb::new(255 - ramp(pos), 0, ramp(pos))
    } else {
        let pos = pos - 170;
        Rgb::new(0, ramp(pos), 255 - ramp(pos))
    }
}

/// Raised-cosine brightness levels for the `pulse` verb, 0.15 to 1.0.
pub fn pulse_levels(steps: usize) -> impl Iterator<Item = f32> {
    (0..steps).map(move |i| {
        let phase = i as f32 / steps as f32 * TAU;
        0.15 + 0.85 * (0.5 * (1.0 - phase.cos()))
    })
}

/// 0.0–1.0 sine wave.
fn wave(x: f32) -> f32 {
    0.5 * (1.0 + x.sin())
}

/// Gaussian falloff used for comet tails and highlight bands.
fn falloff(distance: f32, sigma: f32) -> f32 {
    (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

/// Index `offset` pixels behind `head`, wrapping around the strip.
fn behind(head: usize, offset: usize, len: usize) -> usize {
    (head as isize - offset as isize).rem_euclid(len as isize) as usize
}

/// A state animation.
pub trait Pattern: Send {
    /// Frames in one pass of the animation.
    fn steps(&self) -> usize;
    /// Delay after each frame.
    fn frame_interval(&self) -> Duration;
    /// Draw frame `step` into `pixels`.
    fn render(&mut self, step: usize, pixels: &mut [Rgb]);
}

/// Pattern for `state`, or `None` for `Idle` (strip dark).
#[must_use]
pub fn pattern_for(state: AssistantState, led_count: usize) -> Option<Box<dyn Pattern>> {
    pattern_with_rng(state, led_count, StdRng::from_entropy())
}

/// Like [`pattern_for`] with a caller-supplied RNG.
#[must_use]
pub fn pattern_with_rng(
    state: AssistantState,
    led_count: usize,
    rng: StdRng,
) -> Option<Box<dyn Pattern>> {
    match state {
        AssistantState::Idle => None,
        AssistantState::Listening => Some(Box::new(Aurora { rng })),
        AssistantState::WakeDetected => Some(Box::new(Vortex { rng })),
        AssistantState::Conversation => Some(Box::new(Waves { rng })),
        AssistantState::Thinking => Some(Box::new(Comets { rng })),
        AssistantState::Speaking => Some(Box::new(Nebula::new(led_count, rng))),
    }
}

/// Listening: cool multi-hue aurora with sparkles.
struct Aurora {
    rng: StdRng,
}

impl Pattern for Aurora {
    fn steps(&self) -> usize {
        96
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(18)
    }

    fn render(&mut self, step: usize, pixels: &mut [Rgb]) {
        let n = pixels.len();
        if n == 0 {
            return;
        }
        let t = step as f32 * 0.06;
        for (i, px) in pixels.iter_mut().enumerate() {
            let x = i as f32;
            let hue = 0.52
                + 0.12 * (x * 0.08 - t).sin()
                + 0.06 * (x * 0.20 + t * 0.8).sin()
                + 0.03 * (x * 0.30 - t * 0.5).sin();
            let v = 0.30
                + 0.40 * wave(x * 0.25 + t)
                + 0.20 * wave(x * 0.12 - t * 0.7)
                + 0.10 * wave(x * 0.18 + t * 0.4);
            let s = 0.70 + 0.25 * wave(x * 0.15 - t * 0.9);
            *px = hsv(hue, s.min(1.0), v.min(1.0)).gamma();
        }

        for _ in 0..(n / 15).max(2) {
            let idx = self.rng.gen_range(0..n);
            let sparkle = hsv(0.55 + 0.20 * self.rng.r#gen::<f32>(), 0.20, 1.0);
            let level = 0.30 + self.rng.r#gen::<f32>() * 0.40;
            pixels[idx] = pixels[idx].add(sparkle.fade(level).gamma());
        }
    }
}

/// Wake detected: warm vortex with a bright arc and confetti.
struct Vortex {
    rng: StdRng,
}

impl Pattern for Vortex {
    fn steps(&self) -> usize {
        72
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(20)
    }

    fn render(&mut self, step: usize, pixels: &mut [Rgb]) {
        let n = pixels.len();
        if n == 0 {
            return;
        }
        let phi = step as f32 * 0.30;
        for (i, px) in pixels.iter_mut().enumerate() {
            let x = i as f32;
            let hue = 0.08 + 0.08 * (x * 0.08 + phi).sin() + 0.04 * (x * 0.15 - phi * 0.6).sin();
            let v = 0.20 + 0.30 * wave(x * 0.20 - phi * 1.5) + 0.15 * wave(x * 0.10 + phi * 0.8);
            let s = 0.80 + 0.15 * wave(x * 0.12 + phi * 0.5);
            *px = hsv(hue, s, v).gamma();
        }

        let tail = (n / 3).max(12);
        let head = (step * 4) % n;
        for k in 0..tail {
            let pos = behind(head, k, n);
            let f = falloff(k as f32, tail as f32 * 0.35);
            let hue = 0.10 - 0.03 * (k as f32 / tail as f32);
            let arc = hsv(hue, 1.0, (0.5 + 0.9 * f).min(1.0));
            pixels[pos] = pixels[pos].add(arc.gamma());
        }

        for _ in 0..(n / 6).max(3) {
            let idx = self.rng.gen_range(0..n);
            let h = 0.05 + 0.15 * self.rng.r#gen::<f32>();
            let s = 0.5 + 0.5 * self.rng.r#gen::<f32>();
            let v = 0.8 + 0.2 * self.rng.r#gen::<f32>();
            pixels[idx] = pixels[idx].add(hsv(h, s, v).gamma());
        }
    }
}

/// Conversation: green waves with a travelling highlight band.
struct Waves {
    rng: StdRng,
}

impl Pattern for Waves {
    fn steps(&self) -> usize {
        96
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(14)
    }

    fn render(&mut self, step: usize, pixels: &mut [Rgb]) {
        let n = pixels.len();
        if n == 0 {
            return;
        }
        let off = step as f32 * 0.12;
        for (i, px) in pixels.iter_mut().enumerate() {
            let x = i as f32;
            let hue = 0.32
                + 0.12 * (x * 0.07 + off).sin()
                + 0.06 * (x * 0.16 - off * 0.8).sin()
                + 0.03 * (x * 0.25 + off * 0.6).sin();
            let v = 0.25
                + 0.40 * wave(x * 0.23 + off)
                + 0.25 * wave(x * 0.09 - off * 1.3)
                + 0.10 * wave(x * 0.14 + off * 0.5);
            let s = 0.60 + 0.35 * wave(x * 0.12 - off);
            *px = hsv(hue, s.min(1.0), v.min(1.0)).gamma();
        }

        let center = (step * 3) % n;
        let sigma = (n as f32 * 0.10).max(4.0);
        for (i, px) in pixels.iter_mut().enumerate() {
            let dx = behind(i, center, n).min(behind(center, i, n));
            let f = falloff(dx as f32, sigma) * 0.7;
            if f > 0.02 {
                *px = px.add(hsv(0.45, 0.30, (0.6 + f).min(1.0)).gamma());
            }
        }

        for _ in 0..(n / 12).max(2) {
            let idx = self.rng.gen_range(0..n);
            let level = 0.30 + self.rng.r#gen::<f32>() * 0.30;
            pixels[idx] = pixels[idx].add(hsv(0.20, 0.20, 1.0).fade(level).gamma());
        }
    }
}

/// Thinking: rainbow cascade with two counter-rotating comets and glitter.
struct Comets {
    rng: StdRng,
}

impl Pattern for Comets {
    fn steps(&self) -> usize {
        120
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(12)
    }

    fn render(&mut self, step: usize, pixels: &mut [Rgb]) {
        let n = pixels.len();
        if n == 0 {
            return;
        }
        let c = step as f32;
        let base_shift = step * 5;
        for (i, px) in pixels.iter_mut().enumerate() {
            let x = i as f32;
            let colour = wheel(((base_shift + i * 4) % 256) as u8);
            let v = 0.20 + 0.25 * wave(x * 0.16 - c * 0.14) + 0.15 * wave(x * 0.08 + c * 0.10);
            *px = colour.fade(v).gamma();
        }

        let tail = (n / 3).max(15);
        let head_fwd = (step * 3) % n;
        let head_rev = behind(0, (step * 3) % n, n);
        for k in 0..tail {
            let f = falloff(k as f32, tail as f32 * 0.35);
            let level = 0.5 + 0.9 * f;
            let along = k as f32 * 256.0 / tail as f32;
            let fwd = wheel(((along + c * 8.0) as i64).rem_euclid(256) as u8);
            let rev = wheel(((along - c * 8.0) as i64).rem_euclid(256) as u8);
            let p1 = behind(head_fwd, k, n);
            let p2 = behind(head_rev, k, n);
            pixels[p1] = pixels[p1].add(fwd.fade(level).gamma());
            pixels[p2] = pixels[p2].add(rev.fade(level).gamma());
        }

        let glitter = Rgb::new(240, 240, 240);
        for _ in 0..(n / 8).max(3) {
            let idx = self.rng.gen_range(0..n);
            let level = 0.40 + self.rng.r#gen::<f32>() * 0.40;
            pixels[idx] = pixels[idx].add(glitter.fade(level).gamma());
        }
    }
}

/// Speaking: magenta nebula with decaying, blurred sparks.
struct Nebula {
    rng: StdRng,
    energy: Vec<f32>,
    colours: Vec<Rgb>,
}

const NEBULA_PALETTE: [Rgb; 8] = [
    Rgb::new(255, 0, 255),
    Rgb::new(230, 0, 255),
    Rgb::new(200, 0, 255),
    Rgb::new(255, 40, 200),
    Rgb::new(255, 80, 230),
    Rgb::new(190, 20, 210),
    Rgb::new(255, 100, 255),
    Rgb::new(220, 50, 255),
];

impl Nebula {
    fn new(led_count: usize, mut rng: StdRng) -> Self {
        let colours = (0..led_count)
            .map(|_| NEBULA_PALETTE[rng.gen_range(0..NEBULA_PALETTE.len())])
            .collect();
        Self {
            rng,
            energy: vec![0.0; led_count],
            colours,
        }
    }
}

impl Pattern for Nebula {
    fn steps(&self) -> usize {
        96
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(18)
    }

    fn render(&mut self, step: usize, pixels: &mut [Rgb]) {
        let n = pixels.len().min(self.energy.len());
        if n == 0 {
            return;
        }
        let t = step as f32;
        for (i, px) in pixels.iter_mut().enumerate() {
            let x = i as f32;
            let hue = 0.83 + 0.06 * (x * 0.10 + t * 0.14).sin() + 0.03 * (x * 0.18 - t * 0.25).sin();
            let v = 0.25 + 0.30 * wave(x * 0.18 + t * 0.28) + 0.20 * wave(x * 0.12 - t * 0.22);
            let s = 0.75 + 0.20 * wave(x * 0.15 + t * 0.18);
            *px = hsv(hue, s, v).gamma();
        }

        for e in &mut self.energy {
            *e *= 0.85;
        }
        for _ in 0..(n / 6).max(2) {
            let i = self.rng.gen_range(0..n);
            self.energy[i] = (self.energy[i] + 0.8 + self.rng.r#gen::<f32>() * 0.4).min(1.0);
            self.colours[i] = NEBULA_PALETTE[self.rng.gen_range(0..NEBULA_PALETTE.len())];
        }

        for i in 0..n {
            let blurred = 0.50 * self.energy[i]
                + 0.25 * self.energy[behind(i, 1, n)]
                + 0.25 * self.energy[(i + 1) % n];
            pixels[i] = pixels[i].add(self.colours[i].fade(blurred.min(1.0)).gamma());
        }
    }
}
