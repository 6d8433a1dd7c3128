//! Memory-mapped scratch storage for decoded volumes.
//!
//! Every live entity keeps its voxels in one scratch file, named after the
//! entity (`{stem}.dat`) inside a [`ScratchSpace`] directory. A file is
//! first filled under a hidden temporary name and only takes the entity's
//! name once committed, so that a failed decode or cut never disturbs the
//! file it would replace. The file is removed when its [`ScratchFile`]
//! handle is dropped. A private space is removed once the last file handle
//! referencing it goes away.
//!
//! [`ScratchSpace`]: ./struct.ScratchSpace.html
//! [`ScratchFile`]: ./struct.ScratchFile.html

use crate::error::{Result, ScanError};
use crate::util::scratch_name;
use memmap2::MmapMut;
use std::fs::{self, File};
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{Builder, TempDir};

#[derive(Debug)]
enum ScratchRoot {
    Private(TempDir),
    Fixed(PathBuf),
}

/// A directory holding scratch files. Cloning the space is cheap, and all
/// clones refer to the same directory.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: Arc<ScratchRoot>,
}

impl ScratchSpace {
    /// Create a fresh private temporary directory.
    pub fn private() -> Result<ScratchSpace> {
        let dir = TempDir::new()?;
        log::debug!("Created scratch directory {}", dir.path().display());
        Ok(ScratchSpace {
            root: Arc::new(ScratchRoot::Private(dir)),
        })
    }

    /// Use the given directory, creating it if needed. The directory itself
    /// is never removed.
    pub fn in_dir<P: Into<PathBuf>>(dir: P) -> Result<ScratchSpace> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(ScratchSpace {
            root: Arc::new(ScratchRoot::Fixed(dir)),
        })
    }

    /// The scratch directory.
    pub fn path(&self) -> &Path {
        match &*self.root {
            ScratchRoot::Private(dir) => dir.path(),
            ScratchRoot::Fixed(dir) => dir,
        }
    }

    /// Create an uncommitted scratch file for the entity named `name`,
    /// sized to hold `len` voxels.
    #[allow(unsafe_code)]
    pub fn allocate(&self, name: &str, len: usize) -> Result<ScratchFile> {
        let target = self.path().join(scratch_name(name));
        let prefix = format!(".{}.", scratch_name(name));
        let (file, path): (File, PathBuf) = Builder::new()
            .prefix(&prefix)
            .suffix(".part")
            .tempfile_in(self.path())?
            .keep()
            .map_err(|e| e.error)?;
        let mut staged = ScratchFile {
            mmap: None,
            path,
            target,
            len,
            owns_file: true,
            _space: self.clone(),
        };
        if len > 0 {
            file.set_len((len * mem::size_of::<f32>()) as u64)?;
            // SAFETY: the file was just created under a unique name in this
            // space and is only accessed through the returned handle.
            staged.mmap = Some(unsafe { MmapMut::map_mut(&file)? });
        }
        log::debug!("Allocated scratch file {} ({} voxels)", staged.path.display(), len);
        Ok(staged)
    }
}

/// A memory-mapped file of `f32` voxels, deleted on drop.
#[derive(Debug)]
pub struct ScratchFile {
    mmap: Option<MmapMut>,
    path: PathBuf,
    target: PathBuf,
    len: usize,
    owns_file: bool,
    _space: ScratchSpace,
}

impl ScratchFile {
    /// Current location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the file once committed.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Whether the file was moved to its entity's name.
    pub fn is_committed(&self) -> bool {
        self.path == self.target
    }

    /// Number of voxels.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the file holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Immutable view of the voxels.
    pub fn as_slice(&self) -> &[f32] {
        match &self.mmap {
            // mappings are page aligned and sized in whole voxels
            Some(m) => bytemuck::cast_slice(&m[..]),
            None => &[],
        }
    }

    /// Mutable view of the voxels.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        match &mut self.mmap {
            Some(m) => bytemuck::cast_slice_mut(&mut m[..]),
            None => &mut [],
        }
    }

    /// Copy `values` into the file, which must hold exactly as many voxels.
    pub fn store<'a, I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a f32>,
    {
        let len = self.len;
        let mut n = 0;
        for (d, v) in self.as_mut_slice().iter_mut().zip(values) {
            *d = *v;
            n += 1;
        }
        if n != len {
            return Err(ScanError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("staged {} voxels into a scratch file of {}", n, len),
            )));
        }
        Ok(())
    }

    /// Check that [`commit`](#method.commit) would not take over a file
    /// other than `replacing`.
    ///
    /// # Errors
    ///
    /// - `ScanError::ScratchConflict` if another file already has this
    ///   file's name.
    pub fn check_commit(&self, replacing: Option<&ScratchFile>) -> Result<()> {
        let replaces = replacing.map_or(false, |old| old.path == self.target);
        if !self.is_committed() && !replaces && self.target.exists() {
            return Err(ScanError::ScratchConflict(self.target.clone()));
        }
        Ok(())
    }

    /// Move the file to its entity's name. If `replacing` currently holds
    /// that name, its file is replaced and it no longer removes anything
    /// when dropped.
    pub fn commit(&mut self, replacing: Option<&mut ScratchFile>) -> Result<()> {
        if self.is_committed() {
            return Ok(());
        }
        self.check_commit(replacing.as_deref())?;
        fs::rename(&self.path, &self.target)?;
        if let Some(old) = replacing {
            if old.path == self.target {
                old.owns_file = false;
            }
        }
        log::debug!("Committed scratch file {}", self.target.display());
        self.path = self.target.clone();
        Ok(())
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        drop(self.mmap.take());
        if !self.owns_file {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed scratch file {}", self.path.display()),
            Err(e) => log::debug!("Could not remove scratch file {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_lifecycle() {
        let space = ScratchSpace::private().unwrap();
        let dir = space.path().to_owned();
        let path = {
            let mut f = space.allocate("mouse.pet.img", 6).unwrap();
            assert_eq!(f.target(), dir.join("mouse.dat"));
            assert!(!f.is_committed());
            assert!(f.path().exists());
            assert_eq!(f.len(), 6);
            f.as_mut_slice()[5] = 2.5;

            f.commit(None).unwrap();
            assert_eq!(f.path(), dir.join("mouse.dat"));
            assert_eq!(f.as_slice()[5], 2.5);
            assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
            f.path().to_owned()
        };
        assert!(!path.exists());
        drop(space);
        assert!(!dir.exists());
    }

    #[test]
    fn uncommitted_file_is_removed() {
        let space = ScratchSpace::private().unwrap();
        let f = space.allocate("a", 3).unwrap();
        let path = f.path().to_owned();
        drop(f);
        assert!(!path.exists());
        assert_eq!(fs::read_dir(space.path()).unwrap().count(), 0);
    }

    #[test]
    fn private_dir_outlives_space_handle() {
        let space = ScratchSpace::private().unwrap();
        let mut f = space.allocate("a", 3).unwrap();
        let dir = space.path().to_owned();
        drop(space);
        assert!(dir.exists());
        f.store(&[1., 2., 3.]).unwrap();
        assert_eq!(f.as_slice(), &[1., 2., 3.]);
        drop(f);
        assert!(!dir.exists());
    }

    #[test]
    fn store_checks_length() {
        let space = ScratchSpace::private().unwrap();
        let mut f = space.allocate("b", 3).unwrap();
        assert!(f.store(&[1., 2.]).is_err());
    }

    #[test]
    fn commit_never_takes_over_a_foreign_file() {
        let space = ScratchSpace::private().unwrap();
        let mut first = space.allocate("m1.pet.img", 2).unwrap();
        first.store(&[1., 1.]).unwrap();
        first.commit(None).unwrap();

        let mut namesake = space.allocate("m1.ct.img", 2).unwrap();
        match namesake.commit(None) {
            Err(ScanError::ScratchConflict(p)) => assert_eq!(p, first.path()),
            other => panic!("unexpected result {:?}", other),
        }
        drop(namesake);
        assert!(first.path().exists());

        let mut second = space.allocate("m1.pet.img", 2).unwrap();
        second.store(&[2., 2.]).unwrap();
        second.commit(Some(&mut first)).unwrap();
        drop(first);
        assert!(second.path().exists());
        assert_eq!(second.as_slice(), &[2., 2.]);
    }
}
