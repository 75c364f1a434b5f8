#![no_main]

use chart_model::Resolution;
use fretchart::edit::clipboard::parse_clipboard;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_clipboard(text, Resolution::DEFAULT);
    }
});
