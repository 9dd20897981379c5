//! Low-level astronomy used by the ranging search: approximate solar
//! ephemeris, sidereal time, the H–V phase relation and instantaneous
//! two-body elements.
//!
//! All vectors are Cartesian [`Vector3<f64>`] in AU. Angles are radians
//! unless a name says otherwise; inclinations cross the crate boundary in
//! degrees because the population model bins them that way.

use nalgebra::Vector3;

use crate::constants::{RADEG, T2000};

/// Rotate `v` about the X axis by the angle whose sine and cosine are
/// `sin` and `cos`.
///
/// With the obliquity of the ecliptic this maps equatorial J2000
/// coordinates into ecliptic coordinates. The caller keeps the sine and
/// cosine so the trigonometry is not recomputed per candidate orbit.
#[inline]
pub fn rotate_x(v: &Vector3<f64>, sin: f64, cos: f64) -> Vector3<f64> {
    Vector3::new(v.x, cos * v.y + sin * v.z, cos * v.z - sin * v.y)
}

/// Approximate geocentric solar coordinates, per the USNO low-accuracy
/// formula.
///
/// Arguments
/// ---------
/// * `mjd`: epoch of interest, modified Julian date (UTC).
///
/// Return
/// ------
/// * the Earth-to-Sun vector in equatorial J2000 coordinates (AU),
/// * the sine and cosine of the obliquity of the ecliptic at `mjd`.
///
/// The published coefficients are in degrees; degrees are converted to
/// radians only at the trig call sites to keep the constants recognisable.
pub fn solar_ephemeris(mjd: f64) -> (Vector3<f64>, f64, f64) {
    let d = mjd - T2000;
    let g = 357.529 + 0.98560028 * d; // mean anomaly of sun, in degrees
    let q = 280.459 + 0.98564736 * d; // mean longitude of sun, in degrees
    let g2 = g + g;
    let (sg, cg) = (g * RADEG).sin_cos();
    let (sg2, cg2) = (g2 * RADEG).sin_cos();

    // ecliptic longitude, in degrees still
    let l = q + 1.915 * sg + 0.020 * sg2;

    // distance in AU
    let r = 1.00014 - 0.01671 * cg - 0.00014 * cg2;

    // obliquity of ecliptic in degrees
    let e = 23.439 - 0.00000036 * d;
    let (soe, coe) = (e * RADEG).sin_cos();

    // equatorial coordinates
    let (sl, cl) = (l * RADEG).sin_cos();
    let rsl = r * sl;
    (Vector3::new(r * cl, rsl * coe, rsl * soe), soe, coe)
}

/// Local sidereal time for an observatory, in radians.
///
/// `longitude` is east of Greenwich in fractions of a revolution, as the
/// MPC observatory file stores it after scaling.
pub fn local_sidereal_time(mjd: f64, longitude: f64) -> f64 {
    let t = (mjd - 15019.5) / 36525.;
    let th = (6.6460656 + (2400.051262 + 0.00002581 * t) * t) / 24.;
    let ut = (mjd - 0.5).rem_euclid(1.);
    (th + ut + longitude).rem_euclid(1.) * std::f64::consts::TAU
}

/// Absolute magnitude H from an apparent V magnitude.
///
/// Arguments
/// ---------
/// * `vmag`: apparent V-band magnitude.
/// * `observer_object`, `sun_object`: vectors to the candidate object (AU).
/// * `observer_dist`, `sun_dist`: their precomputed magnitudes.
///
/// Uses the (H, G) phase relation with G = 0.15. An object within a
/// fraction of a degree of the anti-solar direction gets the sentinel
/// H = 30 rather than a singular phase integral.
pub fn absolute_magnitude(
    vmag: f64,
    observer_object: &Vector3<f64>,
    sun_object: &Vector3<f64>,
    observer_dist: f64,
    sun_dist: f64,
) -> f64 {
    let rdelta = observer_dist * sun_dist;
    let cos_psi = observer_object.dot(sun_object) / rdelta;

    if cos_psi < -0.9999 {
        // looking straight into the sun
        return 30.;
    }

    let tan_half = (1. - cos_psi * cos_psi).sqrt() / (1. + cos_psi);
    let phi1 = (-3.33 * tan_half.powf(0.63)).exp();
    let phi2 = (-1.87 * tan_half.powf(1.22)).exp();
    vmag - 5. * rdelta.log10() + 2.5 * (0.85 * phi1 + 0.15 * phi2).log10()
}

/// Instantaneous two-body elements from a heliocentric state vector.
#[derive(Debug, Clone, Copy)]
pub struct TwoBodyElements {
    /// Semi-major axis, AU.
    pub semi_major_axis: f64,
    /// Eccentricity.
    pub eccentricity: f64,
    /// Inclination to the reference plane, degrees.
    pub inclination: f64,
    /// Specific angular momentum vector, in the scaled velocity units.
    pub momentum: Vector3<f64>,
}

/// Solve two-body elements from position and velocity.
///
/// Arguments
/// ---------
/// * `position`: sun-to-object vector, AU.
/// * `velocity`: object velocity pre-scaled by the inverse Gaussian
///   gravitational constant, so the gravitational parameter drops out of
///   the vis-viva relation.
/// * `sun_dist`: |position|, precomputed by the caller.
///
/// Return
/// ------
/// * `None` when the solution is outside the stable region: a ≥ 100 AU or
///   e > 0.99. Both gates also keep the intermediate square roots real.
pub fn two_body_elements(
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    sun_dist: f64,
) -> Option<TwoBodyElements> {
    let momentum = position.cross(velocity);
    let h_sq = momentum.norm_squared();
    let h_mag = h_sq.sqrt();

    // semi-major axis, and its inverse for the eccentricity below
    let v_sq = velocity.norm_squared();
    let t = 2. - sun_dist * v_sq;

    // stability: require a < 100
    if sun_dist > t * 100. {
        return None;
    }
    let semi_major_axis = sun_dist / t;
    let inv_a = t / sun_dist;

    // the gate on a above keeps the radicand positive
    let eccentricity = (1. - h_sq * inv_a).sqrt();

    // stability: require e < .99
    if eccentricity > 0.99 {
        return None;
    }

    // hz >= |h| catches loss of precision in the cross product near i = 0
    let inclination = if momentum.z >= h_mag {
        0.
    } else {
        (momentum.z / h_mag).acos() / RADEG
    };

    Some(TwoBodyElements {
        semi_major_axis,
        eccentricity,
        inclination,
        momentum,
    })
}
