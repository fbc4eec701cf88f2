//! Fuzz target: persisted `ConfigValue` decoding
//!
//! NVS blobs can be truncated or stale after a firmware change.  Decoding
//! arbitrary bytes must fail cleanly, and any value that does decode must
//! answer its integer accessors consistently.
//!
//! cargo fuzz run fuzz_config_value

#![no_main]

use heatrelay::config::ConfigValue;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = postcard::from_bytes::<ConfigValue>(data) else {
        return;
    };
    if let Some(small) = value.as_i32() {
        assert_eq!(value.as_i64(), Some(i64::from(small)));
    }
    let _ = value.as_str();
});
