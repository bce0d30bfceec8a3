use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tonemodem_core::spectrum::SpectralAnalyzer;
use tonemodem_core::sync::{find_preamble, PreambleScanner};
use tonemodem_core::tone::synthesize_tone;
use tonemodem_core::ModemConfig;

fn preamble(config: &ModemConfig) -> Vec<f32> {
    synthesize_tone(
        config.preamble.frequency,
        config.preamble_samples(),
        config.sample_rate,
        0.5,
        0,
    )
}

#[test]
fn test_detect_preamble_after_silence() {
    let config = ModemConfig::default();
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);

    // Two scan steps of silence: the window at 0 is silent, the one at 6615
    // overlaps the first half of the preamble.
    let mut samples = vec![0.0; 13230];
    samples.extend(preamble(&config));
    samples.extend(vec![0.0; 4000]);

    let detected = find_preamble(&mut analyzer, &samples, &config);
    assert_eq!(detected, Some(6615), "First overlapping window should match");
}

#[test]
fn test_detect_preamble_at_signal_start() {
    let config = ModemConfig::default();
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);
    let samples = preamble(&config);
    assert_eq!(find_preamble(&mut analyzer, &samples, &config), Some(0));
}

#[test]
fn test_detected_window_overlaps_preamble() {
    let config = ModemConfig::default();
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);
    let window = config.preamble_samples();

    for lead in [1000usize, 7000, 20000, 33333] {
        let mut samples = vec![0.0; lead];
        samples.extend(preamble(&config));

        let start = find_preamble(&mut analyzer, &samples, &config)
            .unwrap_or_else(|| panic!("No preamble found after {} samples", lead));
        assert!(
            start <= lead && lead < start + window,
            "lead={} start={}",
            lead,
            start
        );
    }
}

#[test]
fn test_detect_preamble_with_noise() {
    let config = ModemConfig::default();
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);

    let mut rng = StdRng::seed_from_u64(12345);
    let noise = Normal::new(0.0f32, 0.2).unwrap();
    let mut tone = preamble(&config);
    for s in tone.iter_mut() {
        *s += noise.sample(&mut rng);
    }

    let mut samples = vec![0.0; 13230];
    samples.extend(tone);

    assert_eq!(find_preamble(&mut analyzer, &samples, &config), Some(6615));
}

#[test]
fn test_interfering_tone_before_preamble() {
    let config = ModemConfig::default();
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);

    // 1 kHz is a symbol frequency, far from the 400 Hz preamble
    let lead = 2 * 13230;
    let mut samples = synthesize_tone(1000.0, lead, config.sample_rate, 0.5, 0);
    samples.extend(preamble(&config));

    let start = find_preamble(&mut analyzer, &samples, &config).expect("Preamble not found");
    assert!(
        start == lead || start == lead - 6615,
        "Preamble detected at {}",
        start
    );
}

#[test]
fn test_wrong_frequency_not_detected() {
    let config = ModemConfig::default();
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);

    for freq in [300.0, 430.0, 600.0] {
        let samples = synthesize_tone(freq, 3 * 13230, config.sample_rate, 0.5, 0);
        assert_eq!(
            find_preamble(&mut analyzer, &samples, &config),
            None,
            "{} Hz mistaken for preamble",
            freq
        );
    }
}

#[test]
fn test_piecewise_scan_matches_whole_scan() {
    let config = ModemConfig::default();
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);

    let mut samples = vec![0.0; 20000];
    samples.extend(preamble(&config));

    let mut whole = PreambleScanner::new(&config);
    let expected = whole.scan(&mut analyzer, &samples, samples.len());
    assert!(expected.is_some());

    let mut piecewise = PreambleScanner::new(&config);
    let mut found = None;
    let mut available = 0;
    while found.is_none() && available < samples.len() {
        available = (available + 1234).min(samples.len());
        found = piecewise.scan(&mut analyzer, &samples, available);
    }
    assert_eq!(found, expected);
    assert_eq!(piecewise.next_start(), whole.next_start());
}

#[test]
fn test_search_limit_bounds_batch_detection() {
    let config = ModemConfig::default().with_preamble_search(2.0);
    let mut analyzer = SpectralAnalyzer::new(config.sample_rate);

    let mut samples = vec![0.0; 3 * 44100];
    samples.extend(preamble(&config));
    assert_eq!(find_preamble(&mut analyzer, &samples, &config), None);

    let wider = config.with_preamble_search(5.0);
    assert!(find_preamble(&mut analyzer, &samples, &wider).is_some());
}
