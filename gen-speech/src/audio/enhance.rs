//! Optional post-processing of the merged narration.
//!
//! Effects run in a fixed order (noise gate, compressor, reverb) and never
//! change the number of samples. The result is hard clipped to `[-1, 1]`.

use serde::{Deserialize, Serialize};

use super::AudioBuffer;

fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(1e-9).log10()
}

fn ms_to_samples(ms: f32, sample_rate: u32) -> usize {
    ((ms.max(0.0) / 1000.0) * sample_rate as f32).round() as usize
}

/// One-pole smoothing coefficient for a time constant in milliseconds.
fn time_coefficient(ms: f32, sample_rate: u32) -> f32 {
    let samples = (ms / 1000.0) * sample_rate as f32;
    if samples <= 1.0 {
        0.0
    } else {
        (-1.0 / samples).exp()
    }
}

/// Selected effects, each disabled when `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Enhancement {
    pub noise_gate: Option<NoiseGate>,
    pub compressor: Option<Compressor>,
    pub reverb: Option<Reverb>,
}

impl Enhancement {
    pub fn is_enabled(&self) -> bool {
        self.noise_gate.is_some() || self.compressor.is_some() || self.reverb.is_some()
    }

    /// Apply the enabled effects in place.
    pub fn apply(&self, buffer: &mut AudioBuffer) {
        if !self.is_enabled() {
            return;
        }
        let sample_rate = buffer.sample_rate;
        if let Some(gate) = &self.noise_gate {
            log::debug!("Applying noise gate at {} dBFS", gate.threshold_db);
            gate.process(&mut buffer.samples, sample_rate);
        }
        if let Some(compressor) = &self.compressor {
            log::debug!(
                "Applying compressor {}:1 above {} dBFS",
                compressor.ratio,
                compressor.threshold_db
            );
            compressor.process(&mut buffer.samples, sample_rate);
        }
        if let Some(reverb) = &self.reverb {
            log::debug!("Applying reverb (room size {})", reverb.room_size);
            reverb.process(&mut buffer.samples, sample_rate);
        }
        buffer.clip();
    }
}

/// Attenuates windows whose RMS level falls below a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseGate {
    /// Windows quieter than this (dBFS) are attenuated
    pub threshold_db: f32,
    /// Gain applied to gated windows (dB, negative)
    pub floor_db: f32,
    pub window_ms: f32,
    /// Length of the gain ramp between open and closed
    pub ramp_ms: f32,
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self {
            threshold_db: -45.0,
            floor_db: -30.0,
            window_ms: 20.0,
            ramp_ms: 5.0,
        }
    }
}

impl NoiseGate {
    pub fn process(&self, samples: &mut [f32], sample_rate: u32) {
        let window = ms_to_samples(self.window_ms, sample_rate).max(1);
        let floor = db_to_gain(self.floor_db).min(1.0);
        let threshold = db_to_gain(self.threshold_db);
        let ramp = ms_to_samples(self.ramp_ms, sample_rate).max(1);
        let step = (1.0 - floor) / ramp as f32;

        let targets: Vec<f32> = samples
            .chunks(window)
            .map(|w| {
                let rms = (w.iter().map(|s| s * s).sum::<f32>() / w.len() as f32).sqrt();
                if rms < threshold { floor } else { 1.0 }
            })
            .collect();

        let mut gain = targets.first().copied().unwrap_or(1.0);
        for (i, sample) in samples.iter_mut().enumerate() {
            let target = targets[i / window];
            if gain < target {
                gain = (gain + step).min(target);
            } else if gain > target {
                gain = (gain - step).max(target);
            }
            *sample *= gain;
        }
    }
}

/// Feed-forward peak compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Compressor {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub makeup_db: f32,
}

impl Default for Compressor {
    fn default() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 3.0,
            attack_ms: 5.0,
            release_ms: 80.0,
            makeup_db: 2.0,
        }
    }
}

impl Compressor {
    pub fn process(&self, samples: &mut [f32], sample_rate: u32) {
        let attack = time_coefficient(self.attack_ms, sample_rate);
        let release = time_coefficient(self.release_ms, sample_rate);
        let ratio = self.ratio.max(1.0);
        let makeup = db_to_gain(self.makeup_db);
        let mut envelope = 0.0f32;

        for sample in samples.iter_mut() {
            let level = sample.abs();
            let coeff = if level > envelope { attack } else { release };
            envelope = coeff * envelope + (1.0 - coeff) * level;

            let level_db = gain_to_db(envelope);
            let reduction_db = if level_db > self.threshold_db {
                (self.threshold_db + (level_db - self.threshold_db) / ratio) - level_db
            } else {
                0.0
            };
            *sample *= db_to_gain(reduction_db) * makeup;
        }
    }
}

/// Schroeder reverb: parallel damped comb filters into series all-passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reverb {
    /// 0.0 (small) to 1.0 (large)
    pub room_size: f32,
    /// High-frequency damping inside the combs, 0.0 to 1.0
    pub damping: f32,
    /// Wet signal share of the output, 0.0 to 1.0
    pub wet: f32,
}

impl Default for Reverb {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            wet: 0.2,
        }
    }
}

// Delay lengths tuned at 44.1 kHz, scaled to the buffer's rate.
const COMB_DELAYS: [usize; 4] = [1116, 1188, 1277, 1356];
const ALLPASS_DELAYS: [usize; 2] = [556, 441];
const ALLPASS_FEEDBACK: f32 = 0.5;

struct Comb {
    buffer: Vec<f32>,
    pos: usize,
    feedback: f32,
    damping: f32,
    filter_state: f32,
}

impl Comb {
    fn new(len: usize, feedback: f32, damping: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            pos: 0,
            feedback,
            damping,
            filter_state: 0.0,
        }
    }

    fn tick(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.filter_state = output * (1.0 - self.damping) + self.filter_state * self.damping;
        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

struct AllPass {
    buffer: Vec<f32>,
    pos: usize,
}

impl AllPass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            pos: 0,
        }
    }

    fn tick(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let output = delayed - input;
        self.buffer[self.pos] = input + delayed * ALLPASS_FEEDBACK;
        self.pos = (self.pos + 1) % self.buffer.len();
        output
    }
}

impl Reverb {
    pub fn process(&self, samples: &mut [f32], sample_rate: u32) {
        let scale = sample_rate as f32 / 44_100.0;
        let scaled = |d: usize| ((d as f32) * scale).round() as usize;
        let feedback = 0.7 + 0.28 * self.room_size.clamp(0.0, 1.0);
        let damping = self.damping.clamp(0.0, 1.0) * 0.4;
        let wet = self.wet.clamp(0.0, 1.0);

        let mut combs: Vec<Comb> = COMB_DELAYS
            .iter()
            .map(|d| Comb::new(scaled(*d), feedback, damping))
            .collect();
        let mut allpasses: Vec<AllPass> = ALLPASS_DELAYS
            .iter()
            .map(|d| AllPass::new(scaled(*d)))
            .collect();

        // the tail past the last input sample is dropped
        for sample in samples.iter_mut() {
            let dry = *sample;
            let mut out = combs.iter_mut().map(|c| c.tick(dry)).sum::<f32>() / combs.len() as f32;
            for allpass in &mut allpasses {
                out = allpass.tick(out);
            }
            *sample = dry * (1.0 - wet) + out * wet;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn sine(amplitude: f32, secs: f32) -> Vec<f32> {
        let n = (secs * RATE as f32) as usize;
        (0..n)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / RATE as f32).sin())
            .collect()
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_disabled_is_identity() {
        let mut buffer = AudioBuffer::new(sine(0.5, 0.1), RATE);
        let original = buffer.clone();
        Enhancement::default().apply(&mut buffer);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_noise_gate_attenuates_quiet_windows_only() {
        let mut samples = sine(0.001, 0.5);
        samples.extend(sine(0.5, 0.5));
        let half = samples.len() / 2;

        NoiseGate::default().process(&mut samples, RATE);

        assert!(peak(&samples[..half]) < 0.001 * 0.1);
        // past the ramp the loud half is untouched
        assert!((peak(&samples[half + 400..]) - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_compressor_reduces_loud_peaks() {
        let mut samples = sine(0.9, 0.5);
        let compressor = Compressor {
            makeup_db: 0.0,
            ..Compressor::default()
        };
        compressor.process(&mut samples, RATE);
        let settled = &samples[samples.len() / 2..];
        assert!(peak(settled) < 0.6, "peak {}", peak(settled));
    }

    #[test]
    fn test_compressor_leaves_quiet_signal() {
        let mut samples = sine(0.01, 0.2);
        let original = samples.clone();
        let compressor = Compressor {
            makeup_db: 0.0,
            ..Compressor::default()
        };
        compressor.process(&mut samples, RATE);
        assert_eq!(samples, original);
    }

    #[test]
    fn test_reverb_adds_tail_within_length() {
        let mut samples = vec![0.0f32; RATE as usize];
        samples[0] = 1.0;
        Reverb::default().process(&mut samples, RATE);

        assert_eq!(samples.len(), RATE as usize);
        let tail_energy: f32 = samples[RATE as usize / 10..].iter().map(|s| s * s).sum();
        assert!(tail_energy > 0.0);
    }

    #[test]
    fn test_apply_preserves_length_and_clips() {
        let mut buffer = AudioBuffer::new(sine(1.0, 0.3), RATE);
        let len = buffer.len();
        let enhancement = Enhancement {
            noise_gate: Some(NoiseGate::default()),
            compressor: Some(Compressor {
                makeup_db: 24.0,
                ..Compressor::default()
            }),
            reverb: Some(Reverb::default()),
        };
        enhancement.apply(&mut buffer);

        assert_eq!(buffer.len(), len);
        assert!(buffer.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let enhancement: Enhancement = toml::from_str(
            r#"
            [compressor]
            ratio = 4.0
            "#,
        )
        .unwrap();
        assert!(enhancement.noise_gate.is_none());
        let compressor = enhancement.compressor.unwrap();
        assert_eq!(compressor.ratio, 4.0);
        assert_eq!(compressor.threshold_db, -18.0);
    }
}
