//! Per-run work areas.
//!
//! A [`WorkArea`] names every on-disk location a conversion touches: the
//! run's root directory, the frame directory and its numbered file pattern,
//! the intermediate video and the final GIF. The paths are derived once from
//! the source file name and never reused across runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Directory (under the work root) the extracted frames are written to.
const FRAMES_DIR: &str = "p";
/// File name of the muxed intermediate video.
const INTERMEDIATE: &str = "temp.mp4";

/// Every path a single conversion reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkArea {
    /// `<temp_root>/<namespace>/<run_id>`
    pub root: PathBuf,
    /// `<root>/p`
    pub frames_dir: PathBuf,
    /// printf-style frame file name, e.g. `img-%04d.png`.
    pub frame_pattern: String,
    /// `<root>/temp.mp4`
    pub intermediate: PathBuf,
    /// `<base>.gif`
    pub output_name: String,
    /// `<root>/<base>.gif`
    pub output: PathBuf,
}

impl WorkArea {
    /// Derive the work area for `source`.
    ///
    /// The GIF is named after the part of the file name before its first
    /// dot; `digits` is the zero-padded width of the frame counter.
    ///
    /// # Errors
    ///
    /// [`gf_core::Error::Validation`] if the path is empty, the file name has
    /// no extension, or nothing precedes the first dot.
    pub fn derive(
        source: &Path,
        temp_root: &Path,
        namespace: &str,
        run_id: &str,
        digits: usize,
    ) -> gf_core::Result<Self> {
        if source.as_os_str().is_empty() {
            return Err(gf_core::Error::Validation("missing source file name".into()));
        }

        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let Some((base, _ext)) = file_name.split_once('.') else {
            return Err(gf_core::Error::Validation(format!(
                "invalid source file name {file_name:?}: no extension"
            )));
        };

        let base = base.trim();
        if base.is_empty() {
            return Err(gf_core::Error::Validation(format!(
                "invalid source file name {file_name:?}: empty base name"
            )));
        }

        let root = temp_root.join(namespace).join(run_id);
        let output_name = format!("{base}.gif");

        Ok(Self {
            frames_dir: root.join(FRAMES_DIR),
            frame_pattern: format!("img-%0{digits}d.png"),
            intermediate: root.join(INTERMEDIATE),
            output: root.join(&output_name),
            output_name,
            root,
        })
    }

    /// `<frames_dir>/<frame_pattern>`, the path ffmpeg reads or writes frames at.
    pub fn frame_path_pattern(&self) -> PathBuf {
        self.frames_dir.join(&self.frame_pattern)
    }

    /// Create the frame directory and any missing parents.
    pub fn ensure_frames_dir(&self) -> gf_core::Result<()> {
        fs::create_dir_all(&self.frames_dir)?;
        Ok(())
    }

    /// Remove what this run no longer needs.
    ///
    /// The frame directory always goes (unless `keep_frames`); after a
    /// failure the whole root goes with it. Errors are logged, not returned,
    /// because cleanup runs on paths that already have an outcome.
    pub fn cleanup(&self, succeeded: bool, keep_frames: bool) {
        let target = if succeeded {
            if keep_frames {
                return;
            }
            &self.frames_dir
        } else {
            &self.root
        };

        match fs::remove_dir_all(target) {
            Ok(()) => tracing::debug!(path = %target.display(), "Removed work files"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %target.display(), "Cleanup failed: {e}"),
        }
    }

    /// Move the finished GIF to `dest` and return the final path.
    ///
    /// Tries a rename first (same filesystem) and falls back to
    /// copy + remove.
    pub fn finalize(&self, dest: &Path) -> gf_core::Result<PathBuf> {
        if !self.output.exists() {
            return Err(gf_core::Error::pipeline(
                "finalize",
                format!("output file does not exist: {}", self.output.display()),
            ));
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if fs::rename(&self.output, dest).is_err() {
            fs::copy(&self.output, dest).map_err(|e| {
                gf_core::Error::pipeline(
                    "finalize",
                    format!("failed to copy output to {}: {e}", dest.display()),
                )
            })?;
            if let Err(e) = fs::remove_file(&self.output) {
                tracing::warn!(path = %self.output.display(), "Failed to remove copied output: {e}");
            }
        }

        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(source: &str, digits: usize) -> gf_core::Result<WorkArea> {
        WorkArea::derive(
            Path::new(source),
            Path::new("/tmp"),
            "gifforge",
            "1234567",
            digits,
        )
    }

    #[test]
    fn derives_paths_from_source_name() {
        let wa = area("/home/x/crimea.mp4", 4).unwrap();
        assert_eq!(wa.output_name, "crimea.gif");
        assert_eq!(wa.frame_pattern, "img-%04d.png");
        assert_eq!(wa.root, PathBuf::from("/tmp/gifforge/1234567"));
        assert_eq!(wa.frames_dir, PathBuf::from("/tmp/gifforge/1234567/p"));
        assert_eq!(wa.intermediate, PathBuf::from("/tmp/gifforge/1234567/temp.mp4"));
        assert_eq!(wa.output, PathBuf::from("/tmp/gifforge/1234567/crimea.gif"));
        assert_eq!(
            wa.frame_path_pattern(),
            PathBuf::from("/tmp/gifforge/1234567/p/img-%04d.png")
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(area("/v/a.mkv", 3).unwrap(), area("/v/a.mkv", 3).unwrap());
    }

    #[test]
    fn base_name_stops_at_first_dot() {
        let wa = area("/v/holiday.2019.mov", 5).unwrap();
        assert_eq!(wa.output_name, "holiday.gif");
        assert_eq!(wa.frame_pattern, "img-%05d.png");
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(area("", 3).is_err());
        assert!(area("/v/noextension", 3).is_err());
        assert!(area("/v/.hidden", 3).is_err());
    }

    #[test]
    fn cleanup_removes_frames_on_success_and_root_on_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let wa =
            WorkArea::derive(Path::new("clip.mp4"), tmp.path(), "gifforge", "1", 3).unwrap();
        wa.ensure_frames_dir().unwrap();
        fs::write(wa.frames_dir.join("img-001.png"), b"png").unwrap();
        fs::write(&wa.output, b"gif").unwrap();

        wa.cleanup(true, false);
        assert!(!wa.frames_dir.exists());
        assert!(wa.output.exists());

        wa.cleanup(false, false);
        assert!(!wa.root.exists());
    }

    #[test]
    fn cleanup_keeps_frames_when_asked() {
        let tmp = tempfile::tempdir().unwrap();
        let wa =
            WorkArea::derive(Path::new("clip.mp4"), tmp.path(), "gifforge", "2", 3).unwrap();
        wa.ensure_frames_dir().unwrap();
        wa.cleanup(true, true);
        assert!(wa.frames_dir.exists());
    }

    #[test]
    fn finalize_moves_gif() {
        let tmp = tempfile::tempdir().unwrap();
        let wa =
            WorkArea::derive(Path::new("clip.mp4"), tmp.path(), "gifforge", "3", 3).unwrap();
        fs::create_dir_all(&wa.root).unwrap();
        fs::write(&wa.output, b"GIF89a").unwrap();

        let dest = tmp.path().join("out").join("clip.gif");
        let final_path = wa.finalize(&dest).unwrap();
        assert_eq!(final_path, dest);
        assert_eq!(fs::read(&dest).unwrap(), b"GIF89a");
        assert!(!wa.output.exists());
    }

    #[test]
    fn finalize_fails_when_output_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let wa =
            WorkArea::derive(Path::new("clip.mp4"), tmp.path(), "gifforge", "4", 3).unwrap();
        assert!(wa.finalize(&tmp.path().join("clip.gif")).is_err());
    }
}
