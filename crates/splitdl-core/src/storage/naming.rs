//! Free destination name claiming (`file.zip` -> `file.1.zip`).
//!
//! A name is claimed by creating the file with `create_new`, so two runs
//! racing for the same destination can never end up sharing one file.

use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// `stem.N.ext`, the counter inserted before the final extension only.
fn numbered(path: &Path, n: u32) -> PathBuf {
    let mut name = path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(format!(".{}", n));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

fn create_new(path: &Path) -> io::Result<File> {
    File::options()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)
}

/// Creates and returns the first free name among `path` and `stem.N.ext`
/// for N in `1..=max_attempts`. Creation is atomic: a name another process
/// or thread created first is skipped. If every candidate is taken, `path`
/// itself is truncated and reused.
pub fn claim_unique(path: &Path, max_attempts: u32) -> io::Result<(File, PathBuf)> {
    let candidates = std::iter::once(path.to_path_buf())
        .chain((1..=max_attempts).map(|n| numbered(path, n)));
    for candidate in candidates {
        match create_new(&candidate) {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    tracing::warn!(
        path = %path.display(),
        max_attempts,
        "no free numbered name left, overwriting"
    );
    let file = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    Ok((file, path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Barrier};

    fn claim(path: &Path, max_attempts: u32) -> PathBuf {
        claim_unique(path, max_attempts).unwrap().1
    }

    #[test]
    fn free_name_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("file.zip");
        assert_eq!(claim(&p, 1000), p);
        assert!(p.exists());
    }

    #[test]
    fn taken_name_gets_counter_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("file.zip");
        std::fs::write(&p, b"x").unwrap();
        assert_eq!(claim(&p, 1000), dir.path().join("file.1.zip"));
        assert_eq!(claim(&p, 1000), dir.path().join("file.2.zip"));
        assert_eq!(std::fs::read(&p).unwrap(), b"x");
    }

    #[test]
    fn only_last_extension_is_split() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("backup.tar.gz");
        std::fs::write(&p, b"x").unwrap();
        assert_eq!(claim(&p, 1000), dir.path().join("backup.tar.1.gz"));
    }

    #[test]
    fn name_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("README");
        std::fs::write(&p, b"x").unwrap();
        assert_eq!(claim(&p, 1000), dir.path().join("README.1"));
    }

    #[test]
    fn skips_taken_candidates_and_falls_back_at_cap() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.bin");
        std::fs::write(&p, b"original").unwrap();
        for n in 1..=3 {
            std::fs::write(dir.path().join(format!("a.{}.bin", n)), b"x").unwrap();
        }
        assert_eq!(claim(&p, 5), dir.path().join("a.4.bin"));

        // Cap reached: every candidate taken, the original name is truncated.
        assert_eq!(claim(&p, 3), p);
        assert_eq!(std::fs::metadata(&p).unwrap().len(), 0);
    }

    #[test]
    fn concurrent_claims_never_share_a_name() {
        const THREADS: usize = 16;
        for _ in 0..20 {
            let dir = tempfile::tempdir().unwrap();
            let p = Arc::new(dir.path().join("x.bin"));
            let barrier = Arc::new(Barrier::new(THREADS));
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let p = Arc::clone(&p);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        claim(&p, 1000)
                    })
                })
                .collect();
            let names: HashSet<PathBuf> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(names.len(), THREADS);
        }
    }
}
