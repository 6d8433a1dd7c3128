#![no_main]
use libfuzzer_sys::fuzz_target;
use petcut::header::rewrite_dimensions;
use petcut::{Modality, Parameters};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let (dims, rest) = data.split_at(3);
    if let Ok(text) = std::str::from_utf8(rest) {
        let (x, y, z) = (dims[0] as usize + 1, dims[1] as usize + 1, dims[2] as usize + 1);
        let rewritten = rewrite_dimensions(text, x, y, z);
        assert_eq!(rewritten.split('\n').count(), text.split('\n').count());
        if let Ok(params) = Parameters::parse(&rewritten, Modality::Ct) {
            assert_eq!(params.dimensions(), (x, y, z));
        }
    }
});
