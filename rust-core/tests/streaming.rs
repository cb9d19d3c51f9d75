use std::f64::consts::TAU;

use num_complex::Complex;
use spectral_stream::{
    Dft, DftConfig, Domain, DomainObserver, SlidingDft, SlidingDftConfig, SpectralFormat,
    SpectralTransform, Stft, StftConfig, WindowType,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn cosine(len: usize, cycles_per_sample: f64, amplitude: f64, phase: f64) -> Vec<f32> {
    (0..len)
        .map(|n| (amplitude * (TAU * cycles_per_sample * n as f64 + phase).cos()) as f32)
        .collect()
}

// Impulse through an 8-point transform: unit bins with zero phase, and the
// inverse gives the impulse back.
#[test]
fn impulse_scenario() {
    init_logging();
    let mut dft = Dft::new(DftConfig {
        window_size: 8,
        format: SpectralFormat::MagPhase,
        precise: true,
        ..DftConfig::default()
    })
    .unwrap();

    let impulse = [1.0f32, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    let mut output = Vec::new();
    let mut frames = 0;
    for &x in impulse.iter().chain([0.0f32; 8].iter()) {
        output.push(dft.read_next());
        if dft.feed(x) {
            frames += 1;
            if frames == 1 {
                for bin in dft.bins() {
                    assert!((bin.re - 1.0).abs() < 1e-6);
                    assert!(bin.im.abs() < 1e-6);
                }
            }
        }
    }
    assert_eq!(frames, 2);

    // One window of latency
    assert!(output[..8].iter().all(|&y| y == 0.0));
    for (y, x) in output[8..].iter().zip(&impulse) {
        assert!((y - x).abs() < 1e-6, "{} vs {}", y, x);
    }
}

// Round trip identity without padding or windowing, across sizes.
#[test]
fn frame_round_trip_all_sizes() {
    init_logging();
    for window in 1..=64 {
        let mut dft = Dft::new(DftConfig {
            window_size: window,
            ..DftConfig::default()
        })
        .unwrap();
        let input: Vec<f32> = (0..window).map(|n| ((n * 37) % 11) as f32 - 5.0).collect();
        let mut output = vec![0.0f32; window];

        dft.forward(&input);
        dft.inverse(Some(&mut output));

        for (y, x) in output.iter().zip(&input) {
            assert!((y - x).abs() < 1e-3 * x.abs().max(1.0), "window {}", window);
        }
    }
}

// A steady sinusoid comes back unchanged, one window late, with no
// amplitude ripple at hop boundaries.
#[test]
fn overlap_add_has_no_beating() {
    init_logging();
    let window = 256;
    for (hop, window_type, inverse_window) in [
        (64, WindowType::Hann, false),
        (64, WindowType::Hann, true),
        (128, WindowType::Hann, false),
        (32, WindowType::Rectangular, false),
    ] {
        let mut stft = Stft::new(StftConfig {
            window_size: window,
            hop_size: hop,
            window_type,
            inverse_window,
            ..StftConfig::default()
        })
        .unwrap();

        let input = cosine(12 * window, 12.0 / window as f64, 0.5, 0.0);
        let output: Vec<f32> = input
            .iter()
            .map(|&x| {
                let y = stft.read_next();
                stft.feed(x);
                y
            })
            .collect();

        // Skip the partially overlapped start-up region
        for t in 2 * window..output.len() {
            let expected = input[t - window];
            assert!(
                (output[t] - expected).abs() < 1e-4,
                "hop {} t {}: {} vs {}",
                hop,
                t,
                output[t],
                expected
            );
        }
    }
}

// Edits made while inverse_on_next() is true are what comes out next.
#[test]
fn synthesis_only_stft() {
    init_logging();
    let window = 64;
    let mut stft = Stft::new(StftConfig {
        window_size: window,
        hop_size: window / 4,
        window_type: WindowType::Hann,
        format: SpectralFormat::MagPhase,
        ..StftConfig::default()
    })
    .unwrap();

    let mut output = Vec::new();
    for _ in 0..12 * window {
        if stft.inverse_on_next() {
            stft.frame_mut().zero();
            stft.bins_mut()[4] = Complex::new(32.0, 0.0);
        }
        output.push(stft.read_next());
    }

    // Bin 4 with magnitude N/2 resynthesizes a unit-amplitude cosine whose
    // period equals the hop, so every frame starts in phase
    for t in 2 * window..output.len() {
        let expected = (TAU * 4.0 * t as f64 / window as f64).cos() as f32;
        assert!(
            (output[t] - expected).abs() < 1e-3,
            "t {}: {} vs {}",
            t,
            output[t],
            expected
        );
    }
}

// A bin-centered cosine reads its amplitude after one transform length,
// whatever its phase.
#[test]
fn sliding_dft_convergence() {
    init_logging();
    let size = 256;
    for &phase in &[0.0, 1.0, 2.5, -1.7] {
        for &k in &[1usize, 17, 100] {
            let mut sdft = SlidingDft::<f64>::new(SlidingDftConfig {
                size_dft: size,
                bin_lo: k.saturating_sub(2),
                bin_hi: k + 3,
                ..SlidingDftConfig::default()
            })
            .unwrap();

            for x in cosine(size, k as f64 / size as f64, 0.8, phase) {
                sdft.forward(x as f64);
            }
            assert!((sdft.bin(k).norm() - 0.8).abs() < 1e-6, "k {} phase {}", k, phase);
        }
    }
}

// Resizing mid-stream leaves no trace of earlier input.
#[test]
fn resize_resets_everything() {
    init_logging();
    let config = StftConfig {
        window_size: 128,
        hop_size: 32,
        window_type: WindowType::Hann,
        format: SpectralFormat::MagFreq,
        ..StftConfig::default()
    };
    let mut stft = Stft::new(config.clone()).unwrap();
    let noise: Vec<f32> = (0..1000).map(|n| ((n * 7919 % 101) as f32 / 50.0) - 1.0).collect();
    for &x in &noise {
        stft.read_next();
        stft.feed(x);
    }

    stft.resize(128, 0).unwrap();
    let mut fresh = Stft::new(config).unwrap();

    let input = cosine(600, 0.05, 1.0, 0.0);
    for &x in &input {
        assert_eq!(stft.read_next(), fresh.read_next());
        stft.feed(x);
        fresh.feed(x);
    }

    let mut sdft = SlidingDft::<f64>::new(SlidingDftConfig {
        size_dft: 64,
        bin_lo: 0,
        bin_hi: 33,
        ..SlidingDftConfig::default()
    })
    .unwrap();
    for &x in &noise {
        sdft.forward(x as f64);
    }
    sdft.resize(64, 0, 33).unwrap();
    assert!(sdft.bins().iter().all(|b| b.norm() == 0.0));
}

// One domain drives the bin width of every registered transform.
#[test]
fn domain_broadcast() {
    init_logging();
    let mut domain = Domain::new(48000.0).unwrap();
    let mut dft = Dft::new(DftConfig::default()).unwrap();
    let mut stft = Stft::new(StftConfig::default()).unwrap();
    let mut sdft = SlidingDft::<f32>::new(SlidingDftConfig::default()).unwrap();

    {
        let mut observers: [&mut dyn DomainObserver; 3] = [&mut dft, &mut stft, &mut sdft];
        domain.set_sample_rate(96000.0, &mut observers).unwrap();
        assert!(domain.set_sample_rate(-5.0, &mut observers).is_err());
    }

    assert!((dft.frame().bin_freq() - 93.75).abs() < 1e-9);
    assert!((stft.frame().bin_freq() - 93.75).abs() < 1e-9);
    assert!((sdft.bin_freq() - 93.75).abs() < 1e-9);
    assert!((stft.units_hop() - 256.0 / 96000.0).abs() < 1e-12);
}
