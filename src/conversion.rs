//! Parsing and conversion of sexagesimal astronomical coordinates.

use crate::constants::{ArcSec, Degree, Radian};

/// Parse a right ascension string in sexagesimal hours (`HH MM SS.SS`)
/// into degrees.
///
/// Return
/// ------
/// * `None` if the string does not have exactly three whitespace-
///   separated numeric fields.
pub fn parse_ra_to_deg(ra: &str) -> Option<Degree> {
    let parts: Vec<&str> = ra.split_whitespace().collect();
    if parts.len() != 3 {
        return None;
    }

    let h: f64 = parts[0].parse().ok()?;
    let m: f64 = parts[1].parse().ok()?;
    let s: f64 = parts[2].parse().ok()?;

    Some((h + m / 60.0 + s / 3600.0) * 15.0)
}

/// Parse a declination string in signed sexagesimal degrees
/// (`±DD MM SS.S`) into degrees.
///
/// Return
/// ------
/// * `None` if the string does not have exactly three whitespace-
///   separated fields or the degree field carries no parseable value.
pub fn parse_dec_to_deg(dec: &str) -> Option<Degree> {
    let parts: Vec<&str> = dec.split_whitespace().collect();
    if parts.len() != 3 {
        return None;
    }

    let (sign, d_field) = match parts[0].as_bytes().first()? {
        b'-' => (-1.0, &parts[0][1..]),
        b'+' => (1.0, &parts[0][1..]),
        _ => (1.0, parts[0]),
    };
    let d: f64 = d_field.parse().ok()?;
    let m: f64 = parts[1].parse().ok()?;
    let s: f64 = parts[2].parse().ok()?;

    Some(sign * (d + m / 60.0 + s / 3600.0))
}

/// Convert an angle from arcseconds to radians.
#[inline]
pub fn arcsec_to_rad(arcsec: ArcSec) -> Radian {
    (arcsec / 3600.0).to_radians()
}

/// Convert an angle from radians to arcseconds.
#[inline]
pub fn rad_to_arcsec(rad: Radian) -> ArcSec {
    rad.to_degrees() * 3600.0
}

#[cfg(test)]
mod conversion_test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_parse_ra_to_deg() {
        let ra = parse_ra_to_deg("16 13 11.57").unwrap();
        assert_relative_eq!(ra, (16. + 13. / 60. + 11.57 / 3600.) * 15., epsilon = 1e-12);

        assert!(parse_ra_to_deg("16 13").is_none());
        assert!(parse_ra_to_deg("XX YY ZZ.ZZ").is_none());
    }

    #[test]
    fn test_parse_dec_to_deg() {
        let dec = parse_dec_to_deg("+20 52 23.7").unwrap();
        assert_relative_eq!(dec, 20. + 52. / 60. + 23.7 / 3600., epsilon = 1e-12);

        let dec = parse_dec_to_deg("-14 47 03.2").unwrap();
        assert_relative_eq!(dec, -(14. + 47. / 60. + 3.2 / 3600.), epsilon = 1e-12);

        // a bare degree field reads as north
        let dec = parse_dec_to_deg("05 00 00.0").unwrap();
        assert_relative_eq!(dec, 5.);

        assert!(parse_dec_to_deg("-AA BB CC.C").is_none());
    }

    #[test]
    fn test_arcsec_roundtrip() {
        assert_relative_eq!(rad_to_arcsec(arcsec_to_rad(1.)), 1., epsilon = 1e-12);
        assert_relative_eq!(arcsec_to_rad(648000.), std::f64::consts::PI, epsilon = 1e-12);
    }
}
