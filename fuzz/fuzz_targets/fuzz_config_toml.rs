#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // stackup.toml parsing must never panic
        if let Ok(settings) = toml::from_str::<stackup::Settings>(content) {
            let _ = settings.validate(std::path::Path::new("stackup.toml"));
        }
    }
});
