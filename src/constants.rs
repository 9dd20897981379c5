use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use smallvec::SmallVec;

use crate::observations::Observation;
use crate::observers::Observer;

pub const EPS: f64 = 1e-6;
pub const T2000: f64 = 51544.5; // J2000 Epoch for MJD
pub const RADEG: f64 = std::f64::consts::PI / 180.0; // Degrees -> radians conversion factor
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0; // arcsecond -> radians conversion factor
pub const RADHMS: f64 = std::f64::consts::PI / (12.0 * 3600.0); // seconds of RA -> radians

// Constants
pub const DPI: f64 = 2. * std::f64::consts::PI;
pub const AU: f64 = 149_597_870.7;

/// Earth equatorial radius (GRS1980/WGS84), in meter
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;
pub const ERAU: f64 = (EARTH_MAJOR_AXIS / 1000.) / AU;

/// Gaussian gravitational constant
pub const GAUSS_GRAV: f64 = 0.01720209895;
pub const GAUSS_GRAV_SQUARED: f64 = GAUSS_GRAV * GAUSS_GRAV;
pub const GAUSS_GRAV_INV: f64 = 1. / GAUSS_GRAV;

// type def
pub type Degree = f64;
pub type Radian = f64;
pub type ArcSec = f64;
/// a mpc code observatory made of three characters
pub type MpcCode = String;
/// Modified Julian Date
pub type MJD = f64; // time in modified julian date

// Type definitions for tracklets and observations

/// The observations of a single object, kept inline for the common
/// two-to-six observation tracklet.
pub type Observations = SmallVec<[Observation; 6]>;

/// Observatory codes mapped to their topocentric geometry.
/// `None` marks codes without parallax constants (space telescopes and
/// roving observers), whose observations carry an explicit offset.
pub type ParallaxMap = HashMap<MpcCode, Option<Arc<Observer>>, RandomState>;

/// Per-site observational error overrides, in radians.
pub type ObsErrMap = HashMap<MpcCode, Radian, RandomState>;
