//! External media tools (ffprobe / ffmpeg).

use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use crate::process::CommandRunner;

use super::types::{MediaError, MediaResult};

/// Duration assumed when a video cannot be probed.
const FALLBACK_DURATION_SECS: f64 = 60.0;

const PROBE_TIMEOUT: Duration = Duration::from_secs(60);
const STORYBOARD_TIMEOUT: Duration = Duration::from_secs(300);

/// Media probing and proxy generation.
pub trait MediaTools {
    /// Duration of `path` in seconds, 0.0 when unknown.
    fn duration(&self, path: &Path) -> f64;

    /// Render a contact sheet for `video` into `out_image`.
    fn storyboard(&self, video: &Path, out_image: &Path) -> MediaResult<()>;
}

/// Contact sheet geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryboardLayout {
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub scale_width: u32,
}

impl Default for StoryboardLayout {
    fn default() -> Self {
        Self {
            tiles_x: 4,
            tiles_y: 4,
            scale_width: 320,
        }
    }
}

impl StoryboardLayout {
    pub fn frame_count(&self) -> u32 {
        self.tiles_x.max(1) * self.tiles_y.max(1)
    }

    /// ffmpeg filter sampling `frame_count` frames evenly over `duration`.
    pub fn filter(&self, duration: f64) -> String {
        let duration = if duration > 0.0 && duration.is_finite() {
            duration
        } else {
            FALLBACK_DURATION_SECS
        };
        format!(
            "fps={}/{:.6},scale={}:-1,tile={}x{}",
            self.frame_count(),
            duration,
            self.scale_width,
            self.tiles_x.max(1),
            self.tiles_y.max(1)
        )
    }
}

/// [`MediaTools`] backed by the ffprobe and ffmpeg binaries on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTools {
    layout: StoryboardLayout,
}

impl FfmpegTools {
    pub fn new(layout: StoryboardLayout) -> Self {
        Self { layout }
    }
}

impl MediaTools for FfmpegTools {
    fn duration(&self, path: &Path) -> f64 {
        let mut cmd = Command::new("ffprobe");
        cmd.arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path);

        let output = match CommandRunner::new()
            .with_timeout(PROBE_TIMEOUT)
            .run("ffprobe", cmd, None)
        {
            Ok(o) if o.success => o,
            Ok(o) => {
                tracing::debug!("ffprobe failed for {}: {}", path.display(), o.stderr.trim());
                return 0.0;
            }
            Err(e) => {
                tracing::debug!("ffprobe unavailable for {}: {}", path.display(), e);
                return 0.0;
            }
        };

        output
            .stdout
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0)
    }

    fn storyboard(&self, video: &Path, out_image: &Path) -> MediaResult<()> {
        if !video.exists() {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }
        if let Some(parent) = out_image.parent() {
            fs::create_dir_all(parent).map_err(|e| MediaError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let filter = self.layout.filter(self.duration(video));
        tracing::debug!("Storyboard filter for {}: {}", video.display(), filter);

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-y")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(&filter)
            .arg("-frames:v")
            .arg("1")
            .arg(out_image);

        let output = CommandRunner::new()
            .with_timeout(STORYBOARD_TIMEOUT)
            .run("ffmpeg", cmd, None)?;

        if !output.success {
            return Err(MediaError::CommandFailed {
                tool: "ffmpeg".to_string(),
                exit_code: output.exit_code.unwrap_or(-1),
                message: output.stderr.trim().to_string(),
            });
        }
        if !out_image.exists() {
            return Err(MediaError::MissingOutput {
                tool: "ffmpeg".to_string(),
                path: out_image.to_path_buf(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_spreads_frames_over_duration() {
        let layout = StoryboardLayout::default();
        assert_eq!(
            layout.filter(32.0),
            "fps=16/32.000000,scale=320:-1,tile=4x4"
        );
    }

    #[test]
    fn filter_assumes_a_minute_when_duration_unknown() {
        let layout = StoryboardLayout {
            tiles_x: 3,
            tiles_y: 2,
            scale_width: 160,
        };
        assert_eq!(layout.filter(0.0), "fps=6/60.000000,scale=160:-1,tile=3x2");
        assert_eq!(layout.filter(f64::NAN), "fps=6/60.000000,scale=160:-1,tile=3x2");
    }

    #[test]
    fn storyboard_of_missing_file_fails_early() {
        let tools = FfmpegTools::default();
        let err = tools
            .storyboard(Path::new("/no/such/video.mp4"), Path::new("/tmp/x.jpg"))
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
