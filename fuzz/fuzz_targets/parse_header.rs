#![no_main]
use libfuzzer_sys::fuzz_target;
use petcut::{Modality, Parameters};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        for &modality in &[Modality::Pet, Modality::Ct] {
            if let Ok(params) = Parameters::parse(text, modality) {
                let _ = params.data_type();
                let _ = params.frame_len();
                let _ = params.aspect();
                let _ = params.calibrated_scale_factors();
            }
        }
    }
});
