//! Fuzz target: register decoders for the MAX30102 FIFO and MCP9808
//! ambient-temperature register.
//!
//! Every 6-byte FIFO record must decode to two 18-bit intensities, and every
//! 16-bit temperature word to a value inside the part's representable range.
//!
//! cargo fuzz run fuzz_sensor_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use synklinx::drivers::max3010x::decode_sample;
use synklinx::drivers::mcp9808::decode_temperature;

fuzz_target!(|data: &[u8]| {
    for record in data.chunks_exact(6) {
        let mut raw = [0u8; 6];
        raw.copy_from_slice(record);
        let sample = decode_sample(&raw);
        assert!(sample.infrared < 1 << 18);
        assert!(sample.red < 1 << 18);
    }

    for word in data.chunks_exact(2) {
        let celsius = decode_temperature(u16::from_be_bytes([word[0], word[1]]));
        assert!(celsius.is_finite());
        assert!((-256.0..256.0).contains(&celsius));
    }
});
