//! Synthetic scan file pairs for the integration tests.
#![allow(dead_code)]

use byteordered::{ByteOrdered, Endianness};
use petcut::{DataType, Modality};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Description of a synthetic scan file pair.
#[derive(Debug, Clone)]
pub struct ScanSpec {
    pub modality: Modality,
    pub data_type: DataType,
    pub x: usize,
    pub y: usize,
    pub z: usize,
    pub scale_factors: Vec<f64>,
    pub endianness: Endianness,
}

impl ScanSpec {
    pub fn new(modality: Modality, data_type: DataType, (x, y, z): (usize, usize, usize)) -> Self {
        ScanSpec {
            modality,
            data_type,
            x,
            y,
            z,
            scale_factors: vec![1.],
            endianness: Endianness::Little,
        }
    }

    pub fn frames(mut self, scale_factors: &[f64]) -> Self {
        self.scale_factors = scale_factors.to_vec();
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.endianness = Endianness::Big;
        self
    }

    pub fn nframes(&self) -> usize {
        self.scale_factors.len()
    }

    pub fn frame_len(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Raw stored value of voxel `[p, r, c]` of frame `f`.
    pub fn raw(&self, f: usize, p: usize, r: usize, c: usize) -> f32 {
        raw_value(f * self.frame_len() + p * self.x * self.y + r * self.x + c)
    }

    pub fn header_text(&self) -> String {
        let mut text = String::from("# synthetic scan header\n");
        if self.modality == Modality::Pet {
            text.push_str(
                "axial_blocks 4\n\
                 axial_crystals_per_block 13\n\
                 axial_crystal_pitch 0.1\n\
                 isotope_branching_fraction 0.5\n",
            );
        }
        text.push_str(&format!(
            "data_type {}\nx_dimension {}\ny_dimension {}\nz_dimension {}\n\
             total_frames {}\npixel_size 0.4\ncalibration_factor 2.0\n",
            self.data_type as i64,
            self.x,
            self.y,
            self.z,
            self.nframes()
        ));
        for (f, sf) in self.scale_factors.iter().enumerate() {
            text.push_str(&format!(
                "frame {}\nscale_factor {}\nframe_duration 60\n",
                f, sf
            ));
        }
        text
    }

    /// Write the header and data files in `dir`, returning the data path.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let data_path = dir.join(name);
        std::fs::write(dir.join(format!("{}.hdr", name)), self.header_text()).unwrap();

        let file = BufWriter::new(File::create(&data_path).unwrap());
        let mut out = ByteOrdered::runtime(file, self.endianness);
        for i in 0..self.frame_len() * self.nframes() {
            let v = raw_value(i);
            match self.data_type {
                DataType::Uint8 => out.write_u8(v as u8),
                DataType::Int16 => out.write_i16(v as i16),
                DataType::Int32 => out.write_i32(v as i32),
                DataType::Float32 => out.write_f32(v),
            }
            .unwrap();
        }
        out.into_inner().flush().unwrap();
        data_path
    }
}

/// Raw stored value at the given voxel offset of a data file, which fits
/// every pack format.
pub fn raw_value(offset: usize) -> f32 {
    (offset % 251) as f32
}
