//! Fuzz target: `PeakRatioAlgorithm` + `VitalEstimator::gate`
//!
//! Interprets arbitrary bytes as an interleaved IR/red window of any length
//! and asserts that estimation never panics and that anything surviving the
//! gate lies inside its physiologic range.
//!
//! cargo fuzz run fuzz_estimator

#![no_main]

use libfuzzer_sys::fuzz_target;
use synklinx::app::ports::VitalsAlgorithm;
use synklinx::config::SystemConfig;
use synklinx::plausibility::Measurement;
use synklinx::vitals::VitalEstimator;
use synklinx::vitals::algorithm::PeakRatioAlgorithm;

fuzz_target!(|data: &[u8]| {
    // First byte picks the sample rate; the rest are 3-byte samples, IR then red.
    let Some((&rate, rest)) = data.split_first() else {
        return;
    };
    let words: Vec<u32> = rest
        .chunks_exact(3)
        .map(|c| u32::from(c[0]) << 16 | u32::from(c[1]) << 8 | u32::from(c[2]))
        .collect();
    let ir: Vec<u32> = words.iter().step_by(2).copied().collect();
    let red: Vec<u32> = words.iter().skip(1).step_by(2).copied().collect();

    let algorithm = PeakRatioAlgorithm::new(u16::from(rate.max(1)));
    let raw = algorithm.estimate(&ir, &red);
    assert!(raw.heart_rate_valid || raw.heart_rate == 0);
    assert!(raw.spo2_valid || raw.spo2 == 0);

    let estimator = VitalEstimator::new(algorithm, &SystemConfig::default());
    let reading = estimator.gate(raw);
    if let Measurement::Valid(hr) = reading.heart_rate {
        assert!((40..=200).contains(&hr), "heart rate {hr} escaped the gate");
    }
    if let Measurement::Valid(spo2) = reading.spo2 {
        assert!((70..=100).contains(&spo2), "SpO2 {spo2} escaped the gate");
    }
});
