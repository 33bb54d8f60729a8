use super::*;

fn pcm(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Arc<AudioPcm> {
    Arc::new(AudioPcm {
        sample_rate,
        channels,
        interleaved_f32: samples,
    })
}

#[test]
fn narration_and_music_are_summed_with_fixed_gains() {
    let mut graph = AudioGraph::open(4, 2).unwrap();
    graph
        .schedule(pcm(4, 1, vec![0.5; 8]), NARRATION_GAIN, false)
        .unwrap();
    graph
        .schedule(pcm(4, 2, vec![1.0; 4]), MUSIC_GAIN, true)
        .unwrap();

    let out = graph.render_merged(2.0).unwrap();
    assert_eq!(out.frames(), 8);
    assert_eq!(out.channels, 2);
    for s in &out.interleaved_f32 {
        assert!((s - 0.7).abs() < 1e-6, "sample {s}");
    }
}

#[test]
fn music_loops_past_its_native_length() {
    let mut graph = AudioGraph::open(4, 1).unwrap();
    // Two-frame ramp that repeats.
    graph.schedule(pcm(4, 1, vec![0.0, 1.0]), 1.0, true).unwrap();
    let out = graph.render_merged(2.0).unwrap();
    assert_eq!(out.interleaved_f32, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn non_looping_narration_ends_with_silence() {
    let mut graph = AudioGraph::open(4, 1).unwrap();
    graph.schedule(pcm(4, 1, vec![0.25; 2]), 1.0, false).unwrap();
    let out = graph.render_merged(1.0).unwrap();
    assert_eq!(out.interleaved_f32, vec![0.25, 0.25, 0.0, 0.0]);
}

#[test]
fn resamples_to_graph_rate() {
    let mut graph = AudioGraph::open(8, 1).unwrap();
    graph.schedule(pcm(4, 1, vec![0.0, 1.0, 1.0, 1.0]), 1.0, false).unwrap();
    let out = graph.render_merged(1.0).unwrap();
    assert_eq!(out.frames(), 8);
    assert!((out.interleaved_f32[1] - 0.5).abs() < 1e-6);
    assert!((out.duration_secs() - 1.0).abs() < 1e-12);
}

#[test]
fn closed_graph_rejects_work_and_mix_clamps() {
    let mut graph = AudioGraph::open(4, 1).unwrap();
    graph.schedule(pcm(4, 1, vec![0.9; 4]), 1.0, false).unwrap();
    graph.schedule(pcm(4, 1, vec![0.9; 4]), 1.0, false).unwrap();
    let out = graph.render_merged(1.0).unwrap();
    assert!(out.interleaved_f32.iter().all(|s| (*s - 1.0).abs() < 1e-6));
    assert!(matches!(
        graph.render_merged(f64::NAN),
        Err(crate::foundation::error::ReelcastError::InvalidAudioDuration(_))
    ));

    graph.close();
    assert!(!graph.is_open());
    assert_eq!(graph.source_count(), 0);
    assert!(graph.schedule(pcm(4, 1, vec![0.0]), 1.0, false).is_err());
    assert!(graph.render_merged(1.0).is_err());
    graph.close();
}

#[test]
fn zero_rate_graph_is_rejected() {
    assert!(AudioGraph::open(0, 2).is_err());
    assert!(AudioGraph::open(48_000, 0).is_err());
}
