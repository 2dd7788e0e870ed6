//! Probed properties of the source video.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::workspace::WorkArea;

/// Pixel dimensions of the primary video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameSize {
    pub width: u16,
    pub height: u16,
}

/// What the pipeline knows about its input.
///
/// The work area is attached once, by the first stage that needs it, and
/// read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct VideoDescription {
    pub source_path: PathBuf,
    pub frame_rate: Option<f32>,
    #[serde(serialize_with = "as_secs")]
    pub duration: Duration,
    pub size: Option<FrameSize>,
    #[serde(skip)]
    work_area: OnceLock<WorkArea>,
}

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl VideoDescription {
    /// A description with only the mandatory properties filled in.
    pub fn new(source_path: PathBuf, duration: Duration) -> Self {
        Self {
            source_path,
            frame_rate: None,
            duration,
            size: None,
            work_area: OnceLock::new(),
        }
    }

    /// The attached work area, if a stage has derived it yet.
    pub fn work_area(&self) -> Option<&WorkArea> {
        self.work_area.get()
    }

    /// Return the work area, deriving and attaching it on first use.
    ///
    /// `derive` runs at most once per successful attachment; a failed
    /// derivation leaves the cell empty.
    pub fn work_area_or_init(
        &self,
        derive: impl FnOnce(&Path) -> gf_core::Result<WorkArea>,
    ) -> gf_core::Result<&WorkArea> {
        if let Some(existing) = self.work_area.get() {
            return Ok(existing);
        }
        let area = derive(&self.source_path)?;
        // A concurrent caller may have won; either value is from the same source.
        let _ = self.work_area.set(area);
        self.work_area
            .get()
            .ok_or_else(|| gf_core::Error::Internal("work area was not attached".into()))
    }

    /// The attached work area, or an error naming the stage that needed it.
    pub fn require_work_area(&self, stage: &str) -> gf_core::Result<&WorkArea> {
        self.work_area.get().ok_or_else(|| {
            gf_core::Error::pipeline(stage, "work area has not been derived yet")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(source: &Path) -> gf_core::Result<WorkArea> {
        WorkArea::derive(source, Path::new("/tmp"), "gifforge", "42", 3)
    }

    #[test]
    fn work_area_is_attached_once() {
        let video = VideoDescription::new(PathBuf::from("/v/clip.mp4"), Duration::from_secs(9));
        assert!(video.work_area().is_none());
        assert!(video.require_work_area("mux").is_err());

        let first = video.work_area_or_init(derive).unwrap().clone();
        let second = video
            .work_area_or_init(|_| panic!("must not derive twice"))
            .unwrap();
        assert_eq!(&first, second);
        assert_eq!(video.require_work_area("mux").unwrap().output_name, "clip.gif");
    }

    #[test]
    fn failed_derivation_leaves_cell_empty() {
        let video = VideoDescription::new(PathBuf::new(), Duration::from_secs(9));
        assert!(video.work_area_or_init(derive).is_err());
        assert!(video.work_area().is_none());
    }

    #[test]
    fn serializes_duration_as_seconds() {
        let mut video =
            VideoDescription::new(PathBuf::from("/v/clip.mp4"), Duration::from_millis(12_900));
        video.size = Some(FrameSize { width: 640, height: 360 });
        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["duration"], 12);
        assert_eq!(json["size"]["width"], 640);
        assert!(json.get("work_area").is_none());
    }
}
