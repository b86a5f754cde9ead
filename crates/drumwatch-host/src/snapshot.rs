//! Rendering and publishing snapshots.
//!
//! Each render re-reads the maintenance flags, composes the scene at the
//! given instant and replaces the output file. The file is written to a
//! sibling temporary path and renamed into place, so a reader never sees
//! a half-written image.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::DateTime;
use chrono_tz::Tz;
use drumwatch_core::clock::minutes_until_next_phase;
use drumwatch_core::config::DrumwatchConfig;
use drumwatch_core::maintenance::MaintenanceFlags;
use drumwatch_core::roster::Roster;
use drumwatch_render::{
    Raster, RenderContext, RenderedScene, TapTarget, UnitPlan, WallClockJitter, compose_scene,
};
use tracing::{debug, info, warn};

use crate::error::HostError;
use crate::refresh::RefreshSource;

/// Renders snapshots and publishes them to the output file.
#[derive(Debug)]
pub struct Snapshotter {
    ctx: RenderContext,
    width: u32,
    height: u32,
    output_path: PathBuf,
    flags_path: PathBuf,
    jitter: WallClockJitter,
    tap: Option<TapTarget>,
}

impl Snapshotter {
    /// Create a snapshotter for the configured size and file locations.
    pub fn new(config: &DrumwatchConfig, ctx: RenderContext) -> Self {
        Self {
            ctx,
            width: config.render.width,
            height: config.render.height,
            output_path: config.output.path.clone(),
            flags_path: config.output.flags_path.clone(),
            jitter: WallClockJitter::new(),
            tap: None,
        }
    }

    /// The plant time zone renders are evaluated in.
    pub const fn time_zone(&self) -> Tz {
        self.ctx.roster().time_zone()
    }

    /// Whether `source` should produce a render.
    ///
    /// A tap with a position only counts if it lands on the tap target of
    /// the last published image.
    pub fn accepts(&self, source: RefreshSource) -> bool {
        match (source, self.tap) {
            (RefreshSource::Tap(Some((x, y))), Some(tap)) => tap.activate(x, y).is_some(),
            _ => true,
        }
    }

    /// Render the battery at `now` and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Encode`] if the image cannot be encoded, or
    /// [`HostError::Output`] if the snapshot cannot be written.
    pub async fn render(&mut self, now: DateTime<Tz>) -> Result<RenderedScene, HostError> {
        let flags = load_flags(&self.flags_path);
        let scene = compose_scene(
            &now,
            &flags,
            self.width,
            self.height,
            &self.ctx,
            &mut self.jitter,
        );
        log_units(self.ctx.roster(), &now, &scene.units);

        write_snapshot(&self.output_path, &scene.image).await?;
        self.tap = Some(scene.tap);
        info!(
            at = %now.format("%Y-%m-%d %H:%M %Z"),
            offline = scene.units.iter().filter(|p| p.state.is_offline()).count(),
            path = %self.output_path.display(),
            "snapshot published"
        );
        Ok(scene)
    }
}

/// Read the flags file. A malformed file counts as no flags set.
pub fn load_flags(path: &Path) -> MaintenanceFlags {
    match MaintenanceFlags::from_file(path) {
        Ok(flags) => flags,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable maintenance flags");
            MaintenanceFlags::default()
        }
    }
}

/// Write `image` as PNG to `path` via a temporary sibling file.
///
/// # Errors
///
/// Returns [`HostError::Encode`] if encoding fails, or
/// [`HostError::Output`] naming the file that failed.
pub async fn write_snapshot(path: &Path, image: &Raster) -> Result<(), HostError> {
    let bytes = image.encode_png()?;

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|source| HostError::Output {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| HostError::Output {
            path: path.to_path_buf(),
            source,
        })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn log_units(roster: &Roster, now: &DateTime<Tz>, units: &[UnitPlan]) {
    for plan in units {
        match plan.state.phase_state() {
            Some(state) => {
                let next_change = roster
                    .unit(plan.id)
                    .and_then(|unit| unit.cycle_start)
                    .map(|start| minutes_until_next_phase(&start, now));
                debug!(
                    unit = plan.id,
                    phase = state.phase.display_name(),
                    progress = state.progress,
                    start = plan.time_label.as_deref().unwrap_or("-"),
                    next_phase = state.phase.next().display_name(),
                    next_phase_in_min = next_change,
                    "drum in cycle"
                );
            }
            None if plan.state.is_offline() => {
                debug!(unit = plan.id, "unit under maintenance");
            }
            None => debug!(unit = plan.id, "unit in service"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use drumwatch_core::roster::PLANT_TIME_ZONE;
    use drumwatch_render::Typeface;

    fn scratch_dir(name: &str) -> PathBuf {
        let unique = format!(
            "drumwatch_test_{name}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir).ok();
        dir
    }

    fn snapshotter(dir: &Path) -> Snapshotter {
        let mut config = DrumwatchConfig::default();
        config.render.width = 200;
        config.render.height = 120;
        config.output.path = dir.join("out.png");
        config.output.flags_path = dir.join("flags.yaml");
        let ctx = RenderContext::new(Roster::coking_battery().unwrap(), Typeface::Bitmap);
        Snapshotter::new(&config, ctx)
    }

    fn noon() -> DateTime<Tz> {
        PLANT_TIME_ZONE
            .with_ymd_and_hms(2025, 8, 8, 12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn publishes_complete_png_and_no_temp_file() {
        let dir = scratch_dir("publish");
        let mut snap = snapshotter(&dir);
        let scene = snap.render(noon()).await.unwrap();

        let bytes = std::fs::read(dir.join("out.png")).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (200, 120));
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(decoded.as_raw().as_slice(), scene.image.as_bytes());
        assert!(!dir.join("out.png.tmp").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn flags_are_reread_each_render() {
        let dir = scratch_dir("flags");
        let mut snap = snapshotter(&dir);
        let first = snap.render(noon()).await.unwrap();
        assert!(first.units.iter().all(|p| !p.state.is_offline()));

        std::fs::write(dir.join("flags.yaml"), "maintenance_DC101A: true\n").unwrap();
        let second = snap.render(noon()).await.unwrap();
        let offline: Vec<_> = second
            .units
            .iter()
            .filter(|p| p.state.is_offline())
            .map(|p| p.id)
            .collect();
        assert_eq!(offline, ["DC-101A"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn malformed_flags_mean_nothing_offline() {
        let dir = scratch_dir("malformed");
        let path = dir.join("flags.yaml");
        std::fs::write(&path, "maintenance_R1: [unterminated\n").unwrap();
        assert_eq!(load_flags(&path), MaintenanceFlags::default());
        assert_eq!(load_flags(&dir.join("missing.yaml")), MaintenanceFlags::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn positioned_taps_must_hit_the_image() {
        let dir = scratch_dir("taps");
        let mut snap = snapshotter(&dir);
        assert!(snap.accepts(RefreshSource::Tap(Some((5_000, 5_000)))));
        snap.render(noon()).await.unwrap();

        assert!(snap.accepts(RefreshSource::Tap(Some((10, 10)))));
        assert!(!snap.accepts(RefreshSource::Tap(Some((5_000, 5_000)))));
        assert!(snap.accepts(RefreshSource::Tap(None)));
        assert!(snap.accepts(RefreshSource::Tick));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn temp_file_sits_next_to_output() {
        assert_eq!(
            temp_path(Path::new("/var/lib/drumwatch/drumwatch.png")),
            PathBuf::from("/var/lib/drumwatch/drumwatch.png.tmp")
        );
    }
}
