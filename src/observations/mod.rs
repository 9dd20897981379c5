//! Astrometric observations and tracklets.
//!
//! An [`Observation`] is one timed sky measurement tied to either a
//! ground-based site (parallax constants) or a spacecraft (explicit
//! geocentric offset). A [`Tracklet`] is the ordered short arc of one
//! object, validated on construction so the solver never sees fewer
//! than two observations, a broken time order, or an arc with no
//! motion at all.

pub mod mpc_80col;

use std::sync::Arc;

use nalgebra::Vector3;
use thiserror::Error;

use crate::constants::{MpcCode, Observations, Radian, MJD};
use crate::observers::Observer;

/// Where an observation was made from.
#[derive(Debug, Clone)]
pub enum ObservingSite {
    /// A catalogued ground station; the shared parallax constants
    /// identify the site for the endpoint-synthesis rules.
    Ground { parallax: Arc<Observer> },
    /// A satellite or space telescope, with its offset from the
    /// geocentre in equatorial AU.
    Spacecraft { offset: Vector3<f64> },
}

/// A single timed sky measurement.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Epoch, MJD UTC.
    pub time: MJD,
    /// Right ascension, radians.
    pub ra: Radian,
    /// Declination, radians.
    pub dec: Radian,
    /// Apparent V magnitude; 0 when the record carries none.
    pub vmag: f64,
    /// Site geometry.
    pub site: ObservingSite,
    /// The reporting site code, used to look up configured
    /// observational errors.
    pub site_code: MpcCode,
}

impl Observation {
    /// Geocentre-to-observer vector at the observation time,
    /// equatorial frame, AU.
    pub(crate) fn earth_observer_vector(&self) -> Vector3<f64> {
        match &self.site {
            ObservingSite::Ground { parallax } => parallax.site_vector(self.time),
            ObservingSite::Spacecraft { offset } => *offset,
        }
    }

    /// The site's parallax constants, for ground-based observations.
    pub(crate) fn ground_parallax(&self) -> Option<&Arc<Observer>> {
        match &self.site {
            ObservingSite::Ground { parallax } => Some(parallax),
            ObservingSite::Spacecraft { .. } => None,
        }
    }
}

/// Why a group of observations cannot form a tracklet.
#[derive(Error, Debug, PartialEq)]
pub enum TrackletError {
    #[error("a tracklet needs at least two observations, got {0}")]
    TooFewObservations(usize),
    #[error("observation times must be positive and strictly increasing")]
    NonMonotonicTimes,
    #[error("no motion between the first and last observation")]
    NoMotion,
}

/// The observations of one object over a short arc.
#[derive(Debug, Clone)]
pub struct Tracklet {
    pub designation: String,
    observations: Observations,
}

impl Tracklet {
    /// Validate a group of observations into a tracklet.
    pub fn new(
        designation: impl Into<String>,
        observations: Observations,
    ) -> Result<Self, TrackletError> {
        if observations.len() < 2 {
            return Err(TrackletError::TooFewObservations(observations.len()));
        }
        // the first time must be positive (an unset epoch parses as 0)
        // and times must increase after that
        let mut t0 = 0.;
        for obs in &observations {
            if obs.time <= t0 {
                return Err(TrackletError::NonMonotonicTimes);
            }
            t0 = obs.time;
        }
        let first = &observations[0];
        let last = &observations[observations.len() - 1];
        if first.ra == last.ra && first.dec == last.dec {
            return Err(TrackletError::NoMotion);
        }
        Ok(Tracklet {
            designation: designation.into(),
            observations,
        })
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Mean of the reported V magnitudes, or 21.0 when no observation
    /// carries one: the typical limiting magnitude of the surveys the
    /// scores are calibrated against.
    pub fn mean_vmag(&self) -> f64 {
        let mut sum = 0.;
        let mut count = 0u32;
        for obs in &self.observations {
            if obs.vmag > 0. {
                sum += obs.vmag;
                count += 1;
            }
        }
        if count > 0 {
            sum / count as f64
        } else {
            21.
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::constants::ERAU;

    pub(crate) fn test_site() -> Arc<Observer> {
        Arc::new(Observer {
            longitude: 248.39981 / 360.,
            rho_cos_phi: 0.84947 * ERAU,
            rho_sin_phi: 0.52647 * ERAU,
            name: Some("LPL/Spacewatch II".into()),
        })
    }

    pub(crate) fn ground_obs(site: &Arc<Observer>, time: MJD, ra: Radian, dec: Radian) -> Observation {
        Observation {
            time,
            ra,
            dec,
            vmag: 21.,
            site: ObservingSite::Ground {
                parallax: site.clone(),
            },
            site_code: "291".into(),
        }
    }
}

#[cfg(test)]
mod observations_test {
    use smallvec::smallvec;

    use super::test_support::*;
    use super::*;

    #[test]
    fn test_tracklet_validation() {
        let site = test_site();
        let good: Observations = smallvec![
            ground_obs(&site, 53264.15206, 4.24635, 0.36431),
            ground_obs(&site, 53264.15621, 4.24634, 0.36427),
        ];
        assert!(Tracklet::new("NE00030", good.clone()).is_ok());

        // too few
        let one: Observations = smallvec![good[0].clone()];
        assert_eq!(
            Tracklet::new("NE00030", one).unwrap_err(),
            TrackletError::TooFewObservations(1)
        );

        // unset epoch
        let mut zero_time = good.clone();
        zero_time[0].time = 0.;
        assert_eq!(
            Tracklet::new("NE00030", zero_time).unwrap_err(),
            TrackletError::NonMonotonicTimes
        );

        // times out of order
        let mut swapped = good.clone();
        swapped.reverse();
        assert_eq!(
            Tracklet::new("NE00030", swapped).unwrap_err(),
            TrackletError::NonMonotonicTimes
        );

        // no motion
        let mut frozen = good;
        frozen[1].ra = frozen[0].ra;
        frozen[1].dec = frozen[0].dec;
        assert_eq!(
            Tracklet::new("NE00030", frozen).unwrap_err(),
            TrackletError::NoMotion
        );
    }

    #[test]
    fn test_mean_vmag() {
        let site = test_site();
        let mut obs: Observations = smallvec![
            ground_obs(&site, 53264.15206, 4.24635, 0.36431),
            ground_obs(&site, 53264.15621, 4.24634, 0.36427),
            ground_obs(&site, 53264.16017, 4.24633, 0.36424),
        ];
        obs[0].vmag = 21.1;
        obs[1].vmag = 0.; // missing magnitude is skipped
        obs[2].vmag = 20.7;
        let tk = Tracklet::new("NE00030", obs.clone()).unwrap();
        assert!((tk.mean_vmag() - 20.9).abs() < 1e-12);

        for o in obs.iter_mut() {
            o.vmag = 0.;
        }
        let tk = Tracklet::new("NE00030", obs).unwrap();
        assert_eq!(tk.mean_vmag(), 21.);
    }
}
