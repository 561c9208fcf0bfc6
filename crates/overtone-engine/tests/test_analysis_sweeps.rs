//! THD curves, digital sweeps and shared-engine determinism.

use overtone_engine::render::THD_GRAPH_POINTS;
use overtone_engine::{Engine, FilterSubject, RenderRequest};
use overtone_patch::{DitherType, Patch};
use pretty_assertions::assert_eq;

const SR: f64 = 48_000.0;

// ============================================================================
// THD curves
// ============================================================================

#[test]
fn test_clean_patch_has_flat_zero_curve() {
    let engine = Engine::new();
    let graph = engine.thd_graph(&Patch::default()).unwrap();
    assert_eq!(graph.frequencies.len(), THD_GRAPH_POINTS);
    assert!(graph.thd.iter().all(|&t| t == 0.0));
}

#[test]
fn test_memoryless_shaping_is_frequency_independent() {
    let engine = Engine::new();
    let patch = Patch {
        distortion: 0.2,
        distortion_odd: 1.0,
        distortion_tanh: 0.0,
        ..Patch::default()
    };
    let graph = engine.thd_graph(&patch).unwrap();
    let first = graph.thd[0];
    assert!(first > 1.0);
    for thd in &graph.thd {
        assert!((thd - first).abs() / first < 0.02, "{} vs {}", thd, first);
    }
}

#[test]
fn test_speaker_distortion_depends_on_frequency() {
    let engine = Engine::new();
    let patch = Patch {
        speaker_amount: 1.0,
        speaker_resonance_hz: 80.0,
        speaker_nonlinearity: 5.0,
        ..Patch::default()
    };
    let graph = engine.thd_graph(&patch).unwrap();
    let low = graph.thd[0];
    let high = graph.thd[THD_GRAPH_POINTS - 1];
    assert!(low > 10.0 * high, "low {} high {}", low, high);
}

// ============================================================================
// Digital sweeps
// ============================================================================

#[test]
fn test_gaussian_dither_linearizes() {
    let engine = Engine::new();
    let patch = Patch {
        digital_bit_depth: 10,
        digital_dither_type: DitherType::Gaussian,
        digital_dither_level: 2.0,
        ..Patch::default()
    };
    let preview = engine.digital_preview(&patch, SR).unwrap();
    // without dither the midpoint would snap to a code
    let mid = preview.dither_linear[20];
    let input = preview.linearity_inputs[20];
    assert!((mid - input).abs() < 0.1, "{} vs {}", mid, input);
}

#[test]
fn test_subtractive_dither_keeps_linearity() {
    let engine = Engine::new();
    let patch = Patch {
        digital_bit_depth: 8,
        digital_dither_level: 2.0,
        digital_dither_subtract: true,
        ..Patch::default()
    };
    let preview = engine.digital_preview(&patch, SR).unwrap();
    for (x, y) in preview.linearity_inputs.iter().zip(&preview.dither_linear) {
        assert!((x - y).abs() < 0.05, "{} vs {}", x, y);
    }
}

// ============================================================================
// Shared engine
// ============================================================================

#[test]
fn test_engine_shared_across_threads() {
    let engine = Engine::new();
    let patch = Patch {
        balance: 0.0,
        distortion: 0.5,
        oversample_times: 3,
        jitter_adc_ns: 500.0,
        ..Patch::default()
    };
    let request = RenderRequest::mono(SR, patch.clone());
    let reference = engine.render(&request).unwrap();

    std::thread::scope(|scope| {
        let renders: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.render(&request).unwrap()))
            .collect();
        let preview = scope.spawn(|| engine.detailed_preview(&patch, FilterSubject::Off, SR));
        for handle in renders {
            assert_eq!(handle.join().unwrap().buffer, reference.buffer);
        }
        assert!(preview.join().unwrap().is_ok());
    });
    assert_eq!(engine.kernels().cached_oversamplers(), 1);
}
