//! Export helpers for JSON links and CSV tables.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use conic_orbits::OrbitError;
use conic_patched::PatchedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Orbit(#[from] OrbitError),
    #[error(transparent)]
    Patched(#[from] PatchedError),
    #[error("invalid sampling: {0}")]
    InvalidSampling(String),
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

pub mod json {
    //! Saved-link encoding: `{"g", "r", "v", "t"}` for orbits and `{"sys", "b", "o"}` for
    //! orbits around a body. Floats survive a round trip bit for bit.

    use std::io::Write;
    use std::path::Path;

    use conic_orbits::Orbit;
    use conic_patched::{OrbitAround, OrbitAroundRecord, SystemCatalog};

    use crate::{ExportError, writer_for_path};

    pub fn orbit_to_string(orbit: &Orbit) -> Result<String, ExportError> {
        Ok(serde_json::to_string(orbit)?)
    }

    pub fn orbit_from_str(contents: &str) -> Result<Orbit, ExportError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn orbit_around_to_string(orbit: &OrbitAround) -> Result<String, ExportError> {
        Ok(serde_json::to_string(&orbit.to_record())?)
    }

    pub fn orbit_around_from_str(
        contents: &str,
        catalog: &SystemCatalog,
    ) -> Result<OrbitAround, ExportError> {
        let record: OrbitAroundRecord = serde_json::from_str(contents)?;
        Ok(OrbitAround::from_record(&record, catalog)?)
    }

    /// Write a pretty-printed list of saved links to `path` (`-` for stdout).
    pub fn write_orbit_arounds(path: &Path, orbits: &[OrbitAround]) -> Result<(), ExportError> {
        let records: Vec<OrbitAroundRecord> = orbits.iter().map(OrbitAround::to_record).collect();
        let mut writer = writer_for_path(path)?;
        serde_json::to_writer_pretty(&mut writer, &records)?;
        writer.flush()?;
        Ok(())
    }
}

pub mod table {
    //! CSV tabulation of sampled ephemerides and trajectory segments.

    use std::io::Write;

    use conic_orbits::Orbit;
    use conic_patched::{EventKind, Segment};
    use serde::Serialize;

    use crate::ExportError;

    /// One sample of an orbit's state.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct EphemerisRow {
        pub t_s: f64,
        pub x_m: f64,
        pub y_m: f64,
        pub z_m: f64,
        pub vx_m_s: f64,
        pub vy_m_s: f64,
        pub vz_m_s: f64,
        pub distance_m: f64,
        pub speed_m_s: f64,
        pub ta_rad: f64,
    }

    /// Sample `orbit` at `samples` evenly spaced times over `[t0, t1]`, both ends included.
    pub fn sample_ephemeris(
        orbit: &Orbit,
        t0: f64,
        t1: f64,
        samples: usize,
    ) -> Result<Vec<EphemerisRow>, ExportError> {
        if samples < 2 || !(t1 > t0) {
            return Err(ExportError::InvalidSampling(format!(
                "need at least two samples over an increasing window, got {samples} over [{t0}, {t1}]"
            )));
        }
        let step = (t1 - t0) / (samples - 1) as f64;
        (0..samples)
            .map(|i| -> Result<EphemerisRow, ExportError> {
                let t = if i + 1 == samples { t1 } else { t0 + step * i as f64 };
                let (r, v) = orbit.state_vector_at_t(t)?;
                Ok(EphemerisRow {
                    t_s: t,
                    x_m: r.x,
                    y_m: r.y,
                    z_m: r.z,
                    vx_m_s: v.x,
                    vy_m_s: v.y,
                    vz_m_s: v.z,
                    distance_m: r.norm(),
                    speed_m_s: v.norm(),
                    ta_rad: orbit.ta_at_t(t)?,
                })
            })
            .collect()
    }

    pub fn write_ephemeris<W: Write>(writer: W, rows: &[EphemerisRow]) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Summary of one [`Segment`].
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct SegmentRow {
        pub body: String,
        pub t_start_s: f64,
        pub t_end_s: f64,
        pub event: String,
        pub eccentricity: f64,
        pub periapsis_m: f64,
        pub inclination_deg: f64,
    }

    impl From<&Segment> for SegmentRow {
        fn from(segment: &Segment) -> Self {
            let orbit = segment.orbit.orbit();
            let system = segment.orbit.system();
            let event = match segment.end.map(|event| event.kind) {
                None => "end".to_string(),
                Some(EventKind::ExitSoi) => "exit_soi".to_string(),
                Some(EventKind::EnterAtmosphere) => "enter_atmosphere".to_string(),
                Some(EventKind::CollideSurface) => "collide_surface".to_string(),
                Some(EventKind::EnterSoi(child)) => format!("enter_soi:{}", system.body(child).name()),
                Some(EventKind::Intercept(child)) => format!("intercept:{}", system.body(child).name()),
            };
            SegmentRow {
                body: segment.orbit.body().name().to_string(),
                t_start_s: segment.t_start,
                t_end_s: segment.t_end,
                event,
                eccentricity: orbit.eccentricity(),
                periapsis_m: orbit.periapsis(),
                inclination_deg: orbit.inclination().to_degrees(),
            }
        }
    }

    pub fn write_segments<W: Write>(writer: W, segments: &[Segment]) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for segment in segments {
            csv.serialize(SegmentRow::from(segment))?;
        }
        csv.flush()?;
        Ok(())
    }
}
