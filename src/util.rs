//! Private utility module: file naming conventions.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// The part of a file name before its first dot.
pub fn name_stem(filename: &str) -> &str {
    filename.split('.').next().unwrap_or(filename)
}

/// The file name of the given path, lossily converted.
pub fn file_name_of<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Path of the header file which accompanies a data file, which is the
/// data file path with `.hdr` appended.
pub fn header_path_for<P: AsRef<Path>>(data_path: P) -> PathBuf {
    let mut s: OsString = data_path.as_ref().as_os_str().to_owned();
    s.push(".hdr");
    PathBuf::from(s)
}

/// Name of the `index`-th sub-volume of a file: `_s{index}` is appended to
/// the stem, and the remaining extensions are kept.
pub fn sub_volume_name(parent: &str, index: usize) -> String {
    let mut pieces: Vec<&str> = parent.split('.').collect();
    let stem = format!("{}_s{}", pieces[0], index);
    pieces[0] = &stem;
    pieces.join(".")
}

/// Name of the scratch file backing the entity with the given file name.
pub fn scratch_name(filename: &str) -> String {
    format!("{}.dat", name_stem(filename))
}

/// Derive a subject identifier from a data file name. Names made of at
/// least four `_` separated pieces combine the first and the stem of the
/// fourth piece, other names use the first piece.
pub fn subject_id_from(filename: &str) -> String {
    let pieces: Vec<&str> = filename.split('_').collect();
    if pieces.len() >= 4 {
        format!("{}{}", pieces[0], name_stem(pieces[3]))
    } else {
        pieces[0].to_string()
    }
}
