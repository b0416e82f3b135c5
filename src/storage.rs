//! Capture directory housekeeping.
//!
//! Captured stills are named `motion-YYYYMMDD-HHMMSS.jpg`, so sorting names
//! sorts captures oldest-first. [`DiskBudgetKeeper`] uses that to delete the
//! oldest captures whenever free space drops below a floor.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

/// Prefix shared by every capture file.
pub const CAPTURE_PREFIX: &str = "motion-";

/// Extension of every capture file.
pub const CAPTURE_EXTENSION: &str = ".jpg";

/// File name for a capture taken at `time`, to the second.
pub fn capture_file_name<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("motion-%Y%m%d-%H%M%S.jpg").to_string()
}

/// Whether a file name follows the `motion-*.jpg` convention.
pub fn is_capture_file_name(name: &str) -> bool {
    name.len() > CAPTURE_PREFIX.len() + CAPTURE_EXTENSION.len()
        && name.starts_with(CAPTURE_PREFIX)
        && name.ends_with(CAPTURE_EXTENSION)
}

/// List capture files in `dir`, oldest first.
///
/// Directories and files that don't follow the naming convention are skipped.
pub fn list_capture_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(is_capture_file_name);
        if is_file && matches {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Reports how many bytes are available to unprivileged writers under a path.
pub trait FreeSpaceProbe: Send + Sync {
    fn free_bytes(&self, dir: &Path) -> io::Result<u64>;
}

impl<F> FreeSpaceProbe for F
where
    F: Fn(&Path) -> io::Result<u64> + Send + Sync,
{
    fn free_bytes(&self, dir: &Path) -> io::Result<u64> {
        self(dir)
    }
}

/// Free space as reported by `statvfs(3)`: `f_bavail * f_frsize`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

impl FreeSpaceProbe for StatvfsProbe {
    #[cfg(unix)]
    fn free_bytes(&self, dir: &Path) -> io::Result<u64> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(dir.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: c_path is a valid NUL-terminated string and stat is a
        // properly sized out-parameter that statvfs fully initializes on success.
        let stat = unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
                return Err(io::Error::last_os_error());
            }
            stat
        };
        Ok(stat.f_bavail as u64 * stat.f_frsize as u64)
    }

    #[cfg(not(unix))]
    fn free_bytes(&self, _dir: &Path) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "free space query is only implemented on unix",
        ))
    }
}

/// Reports unlimited free space without touching the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedProbe;

impl FreeSpaceProbe for UnlimitedProbe {
    fn free_bytes(&self, _dir: &Path) -> io::Result<u64> {
        Ok(u64::MAX)
    }
}

/// Outcome of one [`DiskBudgetKeeper::ensure_free`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reclaim {
    /// Files removed, in deletion order
    pub deleted: Vec<PathBuf>,
    /// Free bytes after the last check
    pub free_bytes: u64,
    /// Whether the floor was reached
    pub satisfied: bool,
}

/// Keeps a minimum amount of free space in the capture directory by deleting
/// the oldest captures.
pub struct DiskBudgetKeeper {
    probe: Box<dyn FreeSpaceProbe>,
}

impl std::fmt::Debug for DiskBudgetKeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskBudgetKeeper").finish_non_exhaustive()
    }
}

impl Default for DiskBudgetKeeper {
    fn default() -> Self {
        Self::new(StatvfsProbe)
    }
}

impl DiskBudgetKeeper {
    pub fn new(probe: impl FreeSpaceProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
        }
    }

    /// Delete oldest captures in `dir` until at least `min_free_bytes` are free.
    ///
    /// Free space is re-read after every deletion and deletion stops as soon
    /// as the floor is met. Running out of captures before that is not an
    /// error; the returned [`Reclaim`] has `satisfied == false`. A file that
    /// can't be removed is logged and skipped.
    ///
    /// # Errors
    /// Fails only if free space can't be queried or the directory can't be listed.
    pub fn ensure_free(&self, dir: &Path, min_free_bytes: u64) -> io::Result<Reclaim> {
        let mut free_bytes = self.probe.free_bytes(dir)?;
        let mut deleted = Vec::new();

        if free_bytes >= min_free_bytes {
            return Ok(Reclaim {
                deleted,
                free_bytes,
                satisfied: true,
            });
        }

        for path in list_capture_files(dir)? {
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Could not delete {}: {}", path.display(), e);
                continue;
            }
            log::info!("Deleted {} to avoid filling disk", path.display());
            deleted.push(path);

            free_bytes = self.probe.free_bytes(dir)?;
            if free_bytes >= min_free_bytes {
                return Ok(Reclaim {
                    deleted,
                    free_bytes,
                    satisfied: true,
                });
            }
        }

        log::warn!(
            "Only {} bytes free in {} after deleting {} capture(s); wanted {}",
            free_bytes,
            dir.display(),
            deleted.len(),
            min_free_bytes
        );
        Ok(Reclaim {
            deleted,
            free_bytes,
            satisfied: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_capture_file_name_format() {
        let time = FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 7, 4, 5, 6)
            .unwrap();
        assert_eq!(capture_file_name(&time), "motion-20260307-040506.jpg");
    }

    #[test]
    fn test_capture_names_sort_chronologically() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let earlier = capture_file_name(&tz.with_ymd_and_hms(2026, 9, 30, 23, 59, 59).unwrap());
        let later = capture_file_name(&tz.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_is_capture_file_name() {
        assert!(is_capture_file_name("motion-20261019-140322.jpg"));
        assert!(!is_capture_file_name("motion-.jpg"));
        assert!(!is_capture_file_name("motion-20261019-140322.jpeg"));
        assert!(!is_capture_file_name("holiday.jpg"));
        assert!(!is_capture_file_name("motion-notes.txt"));
    }

    #[test]
    fn test_list_capture_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "motion-20261019-140000.jpg",
            "motion-20261018-090000.jpg",
            "keep.jpg",
            "motion-20261019-120000.jpg",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("motion-dir.jpg")).unwrap();

        let names: Vec<String> = list_capture_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "motion-20261018-090000.jpg",
                "motion-20261019-120000.jpg",
                "motion-20261019-140000.jpg"
            ]
        );
    }

    #[test]
    fn test_ensure_free_noop_when_enough_space() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("motion-20261019-140000.jpg");
        std::fs::write(&file, b"x").unwrap();

        let keeper = DiskBudgetKeeper::new(|_: &Path| -> io::Result<u64> { Ok(1_000) });
        let reclaim = keeper.ensure_free(dir.path(), 1_000).unwrap();
        assert!(reclaim.satisfied);
        assert!(reclaim.deleted.is_empty());
        assert!(file.exists());
    }

    #[test]
    fn test_ensure_free_probe_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let keeper = DiskBudgetKeeper::new(|_: &Path| -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::Other, "statvfs failed"))
        });
        assert!(keeper.ensure_free(dir.path(), 1).is_err());
    }

    #[test]
    fn test_unlimited_probe_never_reads_the_directory() {
        let keeper = DiskBudgetKeeper::new(UnlimitedProbe);
        let reclaim = keeper
            .ensure_free(Path::new("/nonexistent/motion-captures"), u64::MAX)
            .unwrap();
        assert!(reclaim.satisfied);
        assert!(reclaim.deleted.is_empty());
        assert_eq!(reclaim.free_bytes, u64::MAX);
    }

    #[cfg(unix)]
    #[test]
    fn test_statvfs_reports_space_for_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StatvfsProbe.free_bytes(dir.path()).is_ok());
        assert!(StatvfsProbe.free_bytes(&dir.path().join("missing")).is_err());
    }
}
