use crate::error::AudioError;

/// Pleine échelle d'un signal PCM 16 bits signé.
pub const PCM16_FULL_SCALE: f32 = 32767.0;

/// Signal audio décodé, échantillons entrelacés.
///
/// Les amplitudes sont exprimées dans l'échelle de `full_scale`
/// (32767 pour un signal issu de PCM 16 bits), référence 0 dBFS.
///
/// # Example
/// ```
/// use mw_audio::signal::AudioSignal;
/// let signal = AudioSignal::from_pcm16(&[0i16; 16000], 8000, 2).unwrap();
/// assert_eq!(signal.frames(), 8000);
/// assert!((signal.duration_ms() - 1000.0).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Debug)]
pub struct AudioSignal {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    full_scale: f32,
}

impl AudioSignal {
    /// Construit un signal à partir d'échantillons entrelacés.
    ///
    /// Une trame incomplète en fin de buffer est ignorée.
    ///
    /// # Errors
    /// Returns `AudioError::InvalidParameter` if `sample_rate` or `channels`
    /// is zero, or if `full_scale` is not a positive finite value.
    pub fn new(
        mut samples: Vec<f32>,
        sample_rate: u32,
        channels: u16,
        full_scale: f32,
    ) -> Result<Self, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidParameter {
                name: "sample_rate",
                reason: "doit être > 0".into(),
            });
        }
        if channels == 0 {
            return Err(AudioError::InvalidParameter {
                name: "channels",
                reason: "doit être > 0".into(),
            });
        }
        if !(full_scale.is_finite() && full_scale > 0.0) {
            return Err(AudioError::InvalidParameter {
                name: "full_scale",
                reason: format!("doit être fini et > 0 ({full_scale})"),
            });
        }
        let whole = samples.len() - samples.len() % usize::from(channels);
        samples.truncate(whole);
        Ok(Self {
            samples,
            sample_rate,
            channels,
            full_scale,
        })
    }

    /// Signal issu de PCM 16 bits signé, pleine échelle 32767.
    ///
    /// # Errors
    /// Same as [`AudioSignal::new`].
    pub fn from_pcm16(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Self, AudioError> {
        let samples = samples.iter().map(|&s| f32::from(s)).collect();
        Self::new(samples, sample_rate, channels, PCM16_FULL_SCALE)
    }

    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[must_use]
    pub fn full_scale(&self) -> f32 {
        self.full_scale
    }

    /// Nombre de trames (échantillons par canal).
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    /// Durée totale en millisecondes.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.frames() as f64 * 1000.0 / f64::from(self.sample_rate)
    }

    /// Index de trame correspondant à `ms` (arrondi inférieur).
    #[inline]
    #[must_use]
    pub fn frame_at_ms(&self, ms: u64) -> usize {
        let frame = u128::from(ms) * u128::from(self.sample_rate) / 1000;
        usize::try_from(frame).unwrap_or(usize::MAX)
    }

    /// Trames conservées après troncature à `max_ms`.
    #[must_use]
    pub fn truncated_frames(&self, max_ms: u64) -> usize {
        self.frames().min(self.frame_at_ms(max_ms))
    }

    /// Durée analysée après troncature à `max_ms`, en millisecondes (arrondi inférieur).
    #[must_use]
    pub fn truncated_ms(&self, max_ms: u64) -> u64 {
        let frames = self.truncated_frames(max_ms) as u128;
        (frames * 1000 / u128::from(self.sample_rate)) as u64
    }

    /// Découpe les `max_ms` premières millisecondes en chunks de `chunk_ms`.
    ///
    /// Le dernier chunk peut être plus court. Les bornes sont calculées en
    /// millisecondes puis converties en trames, sans dérive d'arrondi.
    ///
    /// # Errors
    /// Returns `AudioError::InvalidParameter` if `chunk_ms` is zero.
    ///
    /// # Example
    /// ```
    /// use mw_audio::signal::AudioSignal;
    /// // 2.5 s à 8 kHz mono
    /// let signal = AudioSignal::from_pcm16(&[0i16; 20_000], 8000, 1).unwrap();
    /// let chunks: Vec<_> = signal.chunks(1000, 60_000).unwrap().collect();
    /// assert_eq!(chunks.len(), 3);
    /// assert_eq!(chunks[2].frames(), 4000);
    /// ```
    pub fn chunks(&self, chunk_ms: u32, max_ms: u64) -> Result<Chunks<'_>, AudioError> {
        if chunk_ms == 0 {
            return Err(AudioError::InvalidParameter {
                name: "chunk_duration_ms",
                reason: "doit être > 0".into(),
            });
        }
        let end_frame = self.truncated_frames(max_ms);
        let span = u128::from(chunk_ms) * u128::from(self.sample_rate);
        let count = (end_frame as u128 * 1000).div_ceil(span);
        Ok(Chunks {
            signal: self,
            chunk_ms: u64::from(chunk_ms),
            index: 0,
            count: usize::try_from(count).unwrap_or(usize::MAX),
            end_frame,
        })
    }
}

/// Itérateur sur les chunks d'un signal tronqué.
pub struct Chunks<'a> {
    signal: &'a AudioSignal,
    chunk_ms: u64,
    index: usize,
    count: usize,
    end_frame: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.count {
            return None;
        }
        let i = self.index as u64;
        let start = self.signal.frame_at_ms(i * self.chunk_ms).min(self.end_frame);
        let end = self
            .signal
            .frame_at_ms((i + 1) * self.chunk_ms)
            .min(self.end_frame);
        let ch = usize::from(self.signal.channels);
        let chunk = Chunk {
            index: self.index,
            samples: &self.signal.samples[start * ch..end * ch],
            channels: self.signal.channels,
        };
        self.index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

/// Tranche contiguë d'un signal, unité de décision silence / non-silence.
#[derive(Clone, Copy, Debug)]
pub struct Chunk<'a> {
    /// Position du chunk dans le fichier.
    pub index: usize,
    /// Échantillons entrelacés du chunk.
    pub samples: &'a [f32],
    /// Nombre de canaux.
    pub channels: u16,
}

impl Chunk<'_> {
    /// Nombre de trames du chunk.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Durée du chunk en millisecondes.
    #[must_use]
    pub fn duration_ms(&self, sample_rate: u32) -> f64 {
        self.frames() as f64 * 1000.0 / f64::from(sample_rate.max(1))
    }

    /// Root-mean-square amplitude over all channels. 0 for an empty chunk.
    ///
    /// # Example
    /// ```
    /// use mw_audio::signal::Chunk;
    /// let chunk = Chunk { index: 0, samples: &[3.0, -3.0, 3.0, -3.0], channels: 1 };
    /// assert!((chunk.rms() - 3.0).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn rms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();
        (sum_sq / self.samples.len() as f64).sqrt()
    }

    /// Niveau en dBFS, `-inf` pour un chunk parfaitement muet.
    ///
    /// # Example
    /// ```
    /// use mw_audio::signal::Chunk;
    /// let silent = Chunk { index: 0, samples: &[0.0; 8], channels: 1 };
    /// assert_eq!(silent.dbfs(32767.0), f64::NEG_INFINITY);
    /// ```
    #[must_use]
    pub fn dbfs(&self, full_scale: f32) -> f64 {
        let rms = self.rms();
        if rms > 0.0 {
            20.0 * (rms / f64::from(full_scale)).log10()
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(seconds: f64, rate: u32) -> AudioSignal {
        let n = (seconds * f64::from(rate)) as usize;
        AudioSignal::from_pcm16(&vec![100i16; n], rate, 1).unwrap()
    }

    #[test]
    fn chunk_count_is_ceil_of_duration() {
        let signal = mono(3.5, 8000);
        assert_eq!(signal.chunks(1000, 60_000).unwrap().len(), 4);
        let signal = mono(3.0, 8000);
        assert_eq!(signal.chunks(1000, 60_000).unwrap().len(), 3);
    }

    #[test]
    fn last_chunk_holds_remainder() {
        let signal = mono(2.25, 8000);
        let durations: Vec<f64> = signal
            .chunks(1000, 60_000)
            .unwrap()
            .map(|c| c.duration_ms(8000))
            .collect();
        assert_eq!(durations, vec![1000.0, 1000.0, 250.0]);
    }

    #[test]
    fn exact_multiple_keeps_full_last_chunk() {
        let signal = mono(2.0, 8000);
        let last = signal.chunks(500, 60_000).unwrap().last().unwrap();
        assert!((last.duration_ms(8000) - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn truncation_caps_analyzed_frames() {
        let signal = mono(90.0, 8000);
        assert_eq!(signal.truncated_ms(60_000), 60_000);
        let frames: usize = signal.chunks(1000, 60_000).unwrap().map(|c| c.frames()).sum();
        assert_eq!(frames, 60 * 8000);
    }

    #[test]
    fn zero_max_duration_yields_no_chunk() {
        let signal = mono(5.0, 44_100);
        assert_eq!(signal.chunks(1000, 0).unwrap().count(), 0);
    }

    #[test]
    fn empty_signal_yields_no_chunk() {
        let signal = AudioSignal::from_pcm16(&[], 44_100, 2).unwrap();
        assert_eq!(signal.chunks(1000, 60_000).unwrap().len(), 0);
    }

    #[test]
    fn chunks_are_frame_aligned_for_stereo() {
        // 1.5 s stéréo à 44.1 kHz
        let signal = AudioSignal::from_pcm16(&vec![1i16; 44_100 * 3], 44_100, 2).unwrap();
        let chunks: Vec<_> = signal.chunks(1000, 60_000).unwrap().collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].samples.len(), 88_200);
        assert_eq!(chunks[1].samples.len(), 44_100);
    }

    #[test]
    fn odd_rate_boundaries_do_not_drift() {
        // 22.05 trames par ms : les bornes restent exactes au niveau du fichier
        let signal = mono(1.0, 22_050);
        let total: usize = signal.chunks(7, 60_000).unwrap().map(|c| c.frames()).sum();
        assert_eq!(total, 22_050);
    }

    #[test]
    fn incomplete_trailing_frame_is_dropped() {
        let signal = AudioSignal::new(vec![0.0; 5], 8000, 2, 1.0).unwrap();
        assert_eq!(signal.samples().len(), 4);
        assert_eq!(signal.frames(), 2);
    }

    #[test]
    fn invalid_construction_is_rejected() {
        assert!(AudioSignal::new(vec![], 0, 1, 1.0).is_err());
        assert!(AudioSignal::new(vec![], 8000, 0, 1.0).is_err());
        assert!(AudioSignal::new(vec![], 8000, 1, 0.0).is_err());
        assert!(mono(1.0, 8000).chunks(0, 1000).is_err());
    }

    #[test]
    fn full_scale_square_wave_is_zero_dbfs() {
        let samples = [32767.0f32, -32767.0, 32767.0, -32767.0];
        let chunk = Chunk {
            index: 0,
            samples: &samples,
            channels: 1,
        };
        assert!(chunk.dbfs(PCM16_FULL_SCALE).abs() < 1e-9);
    }
}
