//! Least-squares fit of timed sky positions to great-circle motion.
//!
//! The fit rotates the observations into a frame where the great circle
//! through the first and last directions is the equator, then fits the
//! rotated longitude and latitude independently as linear functions of
//! time. Short arcs make both angles small and nearly linear, so this is
//! an ordinary unweighted linear least squares per axis.
//!
//! The result interpolates (or mildly extrapolates) a sky position for
//! any time, and carries the root-mean-square of the angular residuals,
//! the crate-wide measure of astrometric consistency of a tracklet.

use nalgebra::{Matrix3, Vector3};

use crate::constants::{Radian, DPI, MJD};
use crate::errors::Digest2Error;

/// A linear motion fit along a great circle.
#[derive(Debug, Clone)]
pub struct GreatCircleFit {
    /// equatorial -> arc frame rotation; rows are the frame axes
    rot: Matrix3<f64>,
    t_mean: f64,
    lon_mean: f64,
    lon_rate: f64,
    lat_mean: f64,
    lat_rate: f64,
    rms: Radian,
}

fn unit_vector(ra: Radian, dec: Radian) -> Vector3<f64> {
    let (sd, cd) = dec.sin_cos();
    let (sr, cr) = ra.sin_cos();
    Vector3::new(cr * cd, sr * cd, sd)
}

impl GreatCircleFit {
    /// Fit great-circle motion through timed equatorial positions.
    ///
    /// Arguments
    /// ---------
    /// * `times`: observation epochs, strictly increasing MJD.
    /// * `sky`: matching `(ra, dec)` pairs in radians.
    ///
    /// Return
    /// ------
    /// * the fit, or [`Digest2Error::DegenerateGreatCircle`] when the
    ///   first and last directions do not span a plane (equal or
    ///   antipodal positions).
    pub fn new(times: &[MJD], sky: &[(Radian, Radian)]) -> Result<Self, Digest2Error> {
        debug_assert_eq!(times.len(), sky.len());
        debug_assert!(times.len() >= 2);

        let points: Vec<Vector3<f64>> = sky.iter().map(|&(ra, dec)| unit_vector(ra, dec)).collect();

        // frame: x along the first direction, z along the pole of the
        // great circle through the endpoint directions
        let pole = points[0].cross(&points[points.len() - 1]);
        let pole_norm = pole.norm();
        if !(pole_norm > 1e-12) {
            return Err(Digest2Error::DegenerateGreatCircle);
        }
        let z = pole / pole_norm;
        let x = points[0];
        let y = z.cross(&x);
        let rot = Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);

        // rotated longitudes grow along the arc; unwrap against the
        // previous one so the linear fit never sees a 2π step
        let mut lons = Vec::with_capacity(points.len());
        let mut lats = Vec::with_capacity(points.len());
        let mut prev = 0.;
        for p in &points {
            let q = rot * p;
            let mut lon = q.y.atan2(q.x);
            while lon - prev > std::f64::consts::PI {
                lon -= DPI;
            }
            while lon - prev < -std::f64::consts::PI {
                lon += DPI;
            }
            prev = lon;
            lons.push(lon);
            lats.push(q.z.asin());
        }

        let n = times.len() as f64;
        let t_mean = times.iter().sum::<f64>() / n;
        let t_sq: f64 = times.iter().map(|t| (t - t_mean) * (t - t_mean)).sum();

        let lsq = |vals: &[f64]| {
            let mean = vals.iter().sum::<f64>() / n;
            let rate = times
                .iter()
                .zip(vals)
                .map(|(t, v)| (t - t_mean) * v)
                .sum::<f64>()
                / t_sq;
            (mean, rate)
        };
        let (lon_mean, lon_rate) = lsq(&lons);
        let (lat_mean, lat_rate) = lsq(&lats);

        let mut sum_sq = 0.;
        for ((t, lon), lat) in times.iter().zip(&lons).zip(&lats) {
            let dlon = lon - (lon_mean + lon_rate * (t - t_mean));
            let dlat = lat - (lat_mean + lat_rate * (t - t_mean));
            let dlon = dlon * lat.cos();
            sum_sq += dlon * dlon + dlat * dlat;
        }

        Ok(GreatCircleFit {
            rot,
            t_mean,
            lon_mean,
            lon_rate,
            lat_mean,
            lat_rate,
            rms: (sum_sq / n).sqrt(),
        })
    }

    /// Fitted sky position at time `t`, as `(ra, dec)` in radians with
    /// `ra` normalised to `[0, 2π)`.
    pub fn position(&self, t: MJD) -> (Radian, Radian) {
        let dt = t - self.t_mean;
        let lon = self.lon_mean + self.lon_rate * dt;
        let lat = self.lat_mean + self.lat_rate * dt;
        let (sl, cl) = lon.sin_cos();
        let (sb, cb) = lat.sin_cos();
        let v = self.rot.transpose() * Vector3::new(cb * cl, cb * sl, sb);
        (v.y.atan2(v.x).rem_euclid(DPI), v.z.asin())
    }

    /// Root-mean-square of the angular residuals, radians.
    pub fn rms(&self) -> Radian {
        self.rms
    }
}

#[cfg(test)]
mod great_circle_test {
    use approx::assert_relative_eq;

    use super::*;
    use crate::constants::RADSEC;

    #[test]
    fn test_exact_motion_has_zero_rms() {
        let times = [0., 0.01, 0.02];
        let sky = [(0., 0.), (0.001, 0.), (0.002, 0.)];
        let fit = GreatCircleFit::new(&times, &sky).unwrap();
        assert_relative_eq!(fit.rms(), 0., epsilon = 1e-12);
        let (ra, dec) = fit.position(0.005);
        assert_relative_eq!(ra, 0.0005, epsilon = 1e-12);
        assert_relative_eq!(dec, 0., epsilon = 1e-12);
    }

    #[test]
    fn test_two_point_fit_interpolates() {
        let times = [10., 11.];
        let sky = [(1., 0.2), (1.01, 0.21)];
        let fit = GreatCircleFit::new(&times, &sky).unwrap();
        assert_relative_eq!(fit.rms(), 0., epsilon = 1e-12);
        let (ra, dec) = fit.position(10.);
        assert_relative_eq!(ra, 1., epsilon = 1e-12);
        assert_relative_eq!(dec, 0.2, epsilon = 1e-12);
        let (ra, dec) = fit.position(11.);
        assert_relative_eq!(ra, 1.01, epsilon = 1e-12);
        assert_relative_eq!(dec, 0.21, epsilon = 1e-12);
    }

    #[test]
    fn test_perturbed_residuals() {
        // symmetric ±1e-5 rad latitude noise about the equator leaves the
        // linear fit flat; the residual rms follows in closed form
        let times = [0., 0.01, 0.02];
        let sky = [(0., 1e-5), (0.001, -2e-5), (0.002, 1e-5)];
        let fit = GreatCircleFit::new(&times, &sky).unwrap();
        assert_relative_eq!(fit.rms(), 1.414213798075454e-5, epsilon = 1e-12);
    }

    #[test]
    fn test_short_tracklet_rms_arcsec() {
        // three Spacewatch-cadence observations spanning twelve minutes
        let times = [53264.15206, 53264.15621, 53264.16017];
        let sky = [
            (4.246354799619772, 0.36430693809190634),
            (4.246338073547773, 0.3642734859479098),
            (4.246322801916818, 0.36423857936286996),
        ];
        let fit = GreatCircleFit::new(&times, &sky).unwrap();
        assert_relative_eq!(fit.rms() / RADSEC, 0.15195965531210837, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_positions_rejected() {
        let times = [0., 1.];
        let sky = [(1., 0.5), (1., 0.5)];
        assert!(matches!(
            GreatCircleFit::new(&times, &sky),
            Err(Digest2Error::DegenerateGreatCircle)
        ));
    }
}
