//! # MPC observatory catalogue
//!
//! Parses the Minor Planet Center `ObsCodes` flat file into topocentric
//! site geometry. Each data line carries a three-character code, a
//! longitude in degrees east of Greenwich, and the parallax constants
//! ρ·cosφ′ and ρ·sinφ′ in Earth radii. On load the longitude is scaled
//! to fractions of a revolution and the parallax constants to AU, the
//! units the ranging geometry works in.
//!
//! Codes whose parallax constants are both zero (space telescopes,
//! roving observers) map to `None`: their observations must carry an
//! explicit geocentric offset instead.
//!
//! The file may be the raw `ObsCodes.html` download; column-heading
//! lines and the enclosing `<pre>` tags do not parse as data and are
//! quietly ignored.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8Path;
use nalgebra::Vector3;

use crate::astro::local_sidereal_time;
use crate::constants::{ParallaxMap, ERAU, MJD};
use crate::errors::Digest2Error;

/// Where the MPC publishes the observatory code file.
pub const OBS_CODES_URL: &str = "https://www.minorplanetcenter.net/iau/lists/ObsCodes.html";

/// A ground-based observatory.
#[derive(Debug, Clone, PartialEq)]
pub struct Observer {
    /// East longitude, fractions of a revolution.
    pub longitude: f64,
    /// ρ·cosφ′, AU.
    pub rho_cos_phi: f64,
    /// ρ·sinφ′, AU.
    pub rho_sin_phi: f64,
    /// Observatory name, when the catalogue line carries one.
    pub name: Option<String>,
}

impl Observer {
    /// Geocentric position of the site at `mjd`, equatorial frame, AU.
    ///
    /// The site rotates with the Earth; local sidereal time turns the
    /// stored parallax constants into an inertial direction.
    pub(crate) fn site_vector(&self, mjd: MJD) -> Vector3<f64> {
        let lst = local_sidereal_time(mjd, self.longitude);
        Vector3::new(
            self.rho_cos_phi * lst.cos(),
            self.rho_cos_phi * lst.sin(),
            self.rho_sin_phi,
        )
    }
}

fn parse_field(line: &str, range: std::ops::Range<usize>) -> Option<f64> {
    let field = line.get(range)?.trim();
    if field.is_empty() {
        // blank fields default to 0
        return Some(0.);
    }
    field.parse().ok()
}

/// Parse one catalogue line. `None` for lines that are not data
/// (headings, markup, malformed entries).
fn parse_obs_code_line(line: &str) -> Option<(String, Option<Arc<Observer>>)> {
    if line.len() < 30 || !line.is_char_boundary(30) {
        return None;
    }
    let code = line.get(0..3)?;

    let longitude = parse_field(line, 4..13)?;
    if !(0. ..360.).contains(&longitude) {
        return None;
    }
    let rho_cos_phi = parse_field(line, 13..21)?;
    if !(0. ..=1.).contains(&rho_cos_phi) {
        return None;
    }
    let rho_sin_phi = parse_field(line, 21..30)?;
    if !(-1. ..=1.).contains(&rho_sin_phi) {
        return None;
    }

    let observer = if rho_cos_phi == 0. && rho_sin_phi == 0. {
        None
    } else {
        let name = line.get(30..).map(str::trim).filter(|n| !n.is_empty());
        Some(Arc::new(Observer {
            longitude: longitude / 360.,
            rho_cos_phi: rho_cos_phi * ERAU,
            rho_sin_phi: rho_sin_phi * ERAU,
            name: name.map(str::to_string),
        }))
    };
    Some((code.to_string(), observer))
}

/// Parse catalogue text into the code map.
///
/// Return
/// ------
/// * the map, or [`Digest2Error::UnreadableObsCodeFile`] when not a
///   single line parsed as data.
pub fn parse_obs_codes(text: &str, source: &str) -> Result<ParallaxMap, Digest2Error> {
    let mut map = ParallaxMap::default();
    for line in text.lines() {
        if let Some((code, observer)) = parse_obs_code_line(line) {
            map.insert(code, observer);
        }
    }
    if map.is_empty() {
        return Err(Digest2Error::UnreadableObsCodeFile(source.to_string()));
    }
    Ok(map)
}

/// Read an observatory code file from disk.
pub fn load_obs_codes(path: &Utf8Path) -> Result<ParallaxMap, Digest2Error> {
    let text = std::fs::read_to_string(path)?;
    parse_obs_codes(&text, path.as_str())
}

/// Download a fresh copy of the catalogue to `path`.
pub fn fetch_obs_codes(path: &Utf8Path) -> Result<(), Digest2Error> {
    let body = ureq::get(OBS_CODES_URL).call()?.into_string()?;
    let mut f = std::fs::File::create(path)?;
    f.write_all(body.as_bytes())?;
    Ok(())
}
