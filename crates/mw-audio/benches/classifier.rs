use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mw_audio::classifier::classify;
use mw_audio::signal::AudioSignal;
use mw_core::config::{AggregationPolicy, AnalysisConfig};

fn bench_classify(c: &mut Criterion) {
    // 60 s stéréo à 44.1 kHz, enveloppe lentement variable
    let samples: Vec<i16> = (0..44_100 * 60 * 2)
        .map(|i| {
            let t = (i / 2) as f32 / 44_100.0;
            let env = 0.5 + 0.5 * (t * 0.7).sin();
            (env * 8000.0 * (t * 440.0 * std::f32::consts::TAU).sin()) as i16
        })
        .collect();
    let signal = AudioSignal::from_pcm16(&samples, 44_100, 2).unwrap_or_else(|e| panic!("{e}"));

    let default = AnalysisConfig::default();
    c.bench_function("classify_60s_stereo", |b| {
        b.iter(|| classify("bench.wav", black_box(&signal), &default));
    });

    let variance = AnalysisConfig {
        policy: AggregationPolicy::LevelVariance,
        chunk_duration_ms: 100,
        ..AnalysisConfig::default()
    };
    c.bench_function("classify_60s_stereo_variance_100ms", |b| {
        b.iter(|| classify("bench.wav", black_box(&signal), &variance));
    });
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
