//! # MPC 80-column observation reader
//!
//! Parses astrometric records in the Minor Planet Center 80-column
//! format and groups them into validated [`Tracklet`]s.
//!
//! ## Overview
//! -----------------
//! This module provides:
//! - A line-level error type [`ParseObsError`] describing parsing
//!   failures.
//! - [`parse_obs80`], converting a single 80-column line into an
//!   [`Observation`] with angles in **radians** and the epoch in
//!   **MJD (UTC)**.
//! - [`split_tracklets`], the stream-level routine that groups
//!   consecutive records of the same designation, applies satellite
//!   second lines, and keeps only groups that validate as tracklets.
//!
//! ## Units & conventions
//! -----------------
//! - RA is sexagesimal hours (`HH MM SS.SS`), Dec signed sexagesimal
//!   degrees; both become radians.
//! - Magnitudes are reduced to V band: B − 0.8, V unchanged, any other
//!   band + 0.4. A blank magnitude field stays 0 ("absent").
//! - The observatory code (columns 78–80) must exist in the parallax
//!   map; codes without parallax constants, and records flagged `S` in
//!   column 15, are space-based and take their geocentric offset from
//!   the following `s` second line.
//!
//! ## Error handling
//! -----------------
//! Line-level failures are typed ([`ParseObsError`]). At the stream
//! level they are not fatal: an unparseable line simply closes the
//! current group, mirroring how observatory submissions interleave
//! junk with data. Groups that fail tracklet validation (too few
//! observations, broken time order, no motion) are dropped before the
//! solver ever sees them.

use std::io::BufRead;

use nalgebra::Vector3;
use thiserror::Error;

use crate::constants::{ParallaxMap, AU};
use crate::conversion::{parse_dec_to_deg, parse_ra_to_deg};
use crate::errors::Digest2Error;
use crate::observations::{Observation, ObservingSite, Tracklet};
use crate::time::frac_date_to_mjd;

/// Line-level parsing errors for MPC 80-column observations.
#[derive(Error, Debug, PartialEq)]
pub enum ParseObsError {
    #[error("The line is too short")]
    TooShortLine,
    #[error("Error parsing RA: {0}")]
    InvalidRA(String),
    #[error("Invalid Dec value: {0}")]
    InvalidDec(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid magnitude: {0}")]
    InvalidMagnitude(String),
    #[error("Unknown observatory code: {0}")]
    UnknownObservatory(String),
}

/// Parse a single 80-column line into a designation and an
/// [`Observation`].
///
/// Arguments
/// -----------------
/// * `line` – one 80-column ASCII record.
/// * `sites` – the observatory code map.
///
/// Return
/// ----------
/// * `(designation, observation)`, or the [`ParseObsError`] describing
///   the first field that failed.
///
/// Field layout (subset used here)
/// -----------------
/// * `0..12` – designation.
/// * `14` – `'S'` flags a space-based record.
/// * `15..32` – fractional calendar date.
/// * `32..44` – right ascension.
/// * `44..56` – declination.
/// * `65..70` – magnitude, band letter in `70`.
/// * `77..80` – observatory code.
pub fn parse_obs80(
    line: &str,
    sites: &ParallaxMap,
) -> Result<(String, Observation), ParseObsError> {
    if line.len() < 80 || !line.is_ascii() {
        return Err(ParseObsError::TooShortLine);
    }

    let designation = line[0..12].trim().to_string();

    let time = frac_date_to_mjd(line[15..32].trim())
        .map_err(|_| ParseObsError::InvalidDate(line[15..32].trim().to_string()))?;

    let ra = parse_ra_to_deg(line[32..44].trim())
        .ok_or_else(|| ParseObsError::InvalidRA(line[32..44].trim().to_string()))?
        .to_radians();

    let dec = parse_dec_to_deg(line[44..56].trim())
        .ok_or_else(|| ParseObsError::InvalidDec(line[44..56].trim().to_string()))?
        .to_radians();

    let mut vmag = 0.;
    let mag_field = line[65..70].trim();
    if !mag_field.is_empty() {
        vmag = mag_field
            .parse::<f64>()
            .map_err(|_| ParseObsError::InvalidMagnitude(mag_field.to_string()))?;
        // reduce to V band
        match line.as_bytes()[70] {
            b'V' => {}
            b'B' => vmag -= 0.8,
            _ => vmag += 0.4,
        }
    }

    let site_code = line[77..80].to_string();
    let parallax = sites
        .get(&site_code)
        .ok_or_else(|| ParseObsError::UnknownObservatory(site_code.clone()))?;

    let site = match parallax {
        Some(parallax) if line.as_bytes()[14] != b'S' => ObservingSite::Ground {
            parallax: parallax.clone(),
        },
        // offset filled by the satellite second line, when present
        _ => ObservingSite::Spacecraft {
            offset: Vector3::zeros(),
        },
    };

    Ok((
        designation,
        Observation {
            time,
            ra,
            dec,
            vmag,
            site,
            site_code,
        },
    ))
}

fn parse_offset_field(field: &str) -> Option<f64> {
    let v: f64 = field[1..].trim().parse().ok()?;
    match field.as_bytes()[0] {
        b'-' => Some(-v),
        b'+' | b' ' => Some(v),
        _ => None,
    }
}

/// Apply a satellite second line (`s` in column 15) to the matching
/// space-based observation parsed from the line before it.
///
/// The second line must repeat the designation, date and code of its
/// first line; anything else leaves the observation untouched, as does
/// an unparseable offset.
fn apply_sat_offset(line: &str, designation: &str, obs: &mut Observation) {
    let ObservingSite::Spacecraft { offset } = &mut obs.site else {
        return;
    };
    if line[0..12].trim() != designation
        || frac_date_to_mjd(line[15..32].trim()) != Ok(obs.time)
        || line[77..80] != obs.site_code
    {
        return;
    }

    let (Some(x), Some(y), Some(z)) = (
        parse_offset_field(&line[34..46]),
        parse_offset_field(&line[46..58]),
        parse_offset_field(&line[58..70]),
    ) else {
        return;
    };

    let scale = match line.as_bytes()[32] {
        b'1' => 1. / AU, // kilometers
        b'2' => 1.,      // AU
        _ => return,
    };
    *offset = Vector3::new(x, y, z) * scale;
}

/// Split an 80-column observation stream into validated tracklets.
///
/// The stream must be grouped by object and chronological within each
/// object; no sorting is attempted. Lines that fail to parse close the
/// current group, and groups that do not validate are dropped without
/// comment. Read errors are fatal.
pub fn split_tracklets<R: BufRead>(
    reader: R,
    sites: &ParallaxMap,
) -> Result<Vec<Tracklet>, Digest2Error> {
    let mut tracklets = Vec::new();
    let mut designation = String::new();
    let mut group = crate::constants::Observations::new();

    let mut flush =
        |designation: &str, group: &mut crate::constants::Observations| {
            if let Ok(tracklet) = Tracklet::new(designation, std::mem::take(group)) {
                tracklets.push(tracklet);
            }
        };

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.len() != 80 || !line.is_ascii() {
            continue;
        }
        if line.as_bytes()[14] == b's' {
            if let Some(obs) = group.last_mut() {
                apply_sat_offset(line, &designation, obs);
            }
            continue;
        }
        match parse_obs80(line, sites) {
            Err(_) => {
                flush(&designation, &mut group);
            }
            Ok((desig, obs)) => {
                if group.is_empty() || desig != designation {
                    flush(&designation, &mut group);
                    designation = desig;
                }
                group.push(obs);
            }
        }
    }
    flush(&designation, &mut group);
    Ok(tracklets)
}
