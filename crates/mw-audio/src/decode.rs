use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AudioError;
use crate::signal::AudioSignal;

/// Decode an audio file into interleaved 16-bit scaled samples.
///
/// Supports WAV, MP3, OGG/Vorbis, FLAC, AAC via symphonia.
///
/// # Errors
/// Returns `AudioError::Io` if the file cannot be opened and
/// `AudioError::DecodeError` if the container or codec cannot be parsed.
///
/// # Example
/// ```no_run
/// use mw_audio::decode::decode_file;
/// let signal = decode_file("Dia 19-10-26/mic1.wav").unwrap();
/// println!("{} ms", signal.duration_ms());
/// ```
pub fn decode_file(path: impl AsRef<Path>) -> Result<AudioSignal, AudioError> {
    decode_file_limited(path, None)
}

/// Décode au plus `max_ms` millisecondes d'un fichier audio.
///
/// La lecture des paquets s'arrête dès que la limite est atteinte, ce qui
/// évite de décoder des heures d'enregistrement pour n'en analyser qu'une minute.
///
/// # Errors
/// Same as [`decode_file`].
pub fn decode_file_limited(
    path: impl AsRef<Path>,
    max_ms: Option<u64>,
) -> Result<AudioSignal, AudioError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| AudioError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mss = MediaSourceStream::new(
        Box::new(file),
        symphonia::core::io::MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::DecodeError(format!("{}: {e}", path.display())))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            AudioError::DecodeError(format!("{}: aucune piste audio", path.display()))
        })?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeError(format!("{}: {e}", path.display())))?;

    let mut all_samples: Vec<i16> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<i16>> = None;
    let mut max_sample_frames: usize = 0;

    loop {
        if let (Some(limit), Some(rate), Some(ch)) = (max_ms, sample_rate, channels) {
            let limit_frames = u128::from(limit) * u128::from(rate) / 1000;
            let decoded_frames = (all_samples.len() / usize::from(ch.max(1))) as u128;
            if decoded_frames >= limit_frames {
                log::trace!("Limite de {limit} ms atteinte pour {}", path.display());
                break;
            }
        }

        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) if all_samples.is_empty() => {
                return Err(AudioError::DecodeError(format!("{}: {e}", path.display())));
            }
            Err(e) => {
                log::warn!("Audio decode packet error: {e}");
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Audio decode frame error: {e}");
                continue;
            }
            Err(SymphoniaError::IoError(e)) => {
                log::warn!("Audio decode I/O error: {e}");
                break;
            }
            Err(e) => {
                return Err(AudioError::DecodeError(format!("{}: {e}", path.display())));
            }
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count() as u16);

        let num_frames = decoded.capacity();
        // Reuse SampleBuffer: only reallocate if this packet is bigger than current capacity
        if sample_buf.is_none() || num_frames > max_sample_frames {
            sample_buf = Some(SampleBuffer::<i16>::new(num_frames as u64, spec));
            max_sample_frames = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);
        all_samples.extend_from_slice(buf.samples());
    }

    let sample_rate = sample_rate.ok_or_else(|| {
        AudioError::DecodeError(format!("{}: fréquence d'échantillonnage inconnue", path.display()))
    })?;
    let channels = channels.unwrap_or(1);

    if let Some(limit) = max_ms {
        let limit_frames = u128::from(limit) * u128::from(sample_rate) / 1000;
        let limit_samples = usize::try_from(limit_frames)
            .unwrap_or(usize::MAX)
            .saturating_mul(usize::from(channels));
        all_samples.truncate(limit_samples);
    }

    log::debug!(
        "Decoded {} samples @ {}Hz ({} ch) from {}",
        all_samples.len(),
        sample_rate,
        channels,
        path.display()
    );

    AudioSignal::from_pcm16(&all_samples, sample_rate, channels)
}
