use hifitime::{Epoch, TimeScale};

/// Transformation from an MPC fractional date (`YYYY MM DD.ddddd`) to
/// modified julian date (MJD)
///
/// Argument
/// --------
/// * date_str: the date with a fractional day, e.g. `"2004 09 16.15206"`
///
/// Return
/// ------
/// * the input date as a modified julian date (UTC)
pub fn frac_date_to_mjd(date_str: &str) -> Result<f64, String> {
    let parts: Vec<&str> = date_str.split_whitespace().collect();
    if parts.len() != 3 {
        return Err("invalid format, expected: YYYY MM DD.ddddd".to_string());
    }

    let year: i32 = parts[0].parse().map_err(|_| "invalid year")?;
    let month: u8 = parts[1].parse().map_err(|_| "invalid month")?;
    let day_fraction: f64 = parts[2].parse().map_err(|_| "invalid fractional day")?;
    if !(day_fraction >= 1.0) {
        return Err("invalid fractional day".to_string());
    }

    let day = day_fraction.trunc();
    let fraction = day_fraction - day;

    let epoch = Epoch::maybe_from_gregorian(
        year,
        month,
        day as u8,
        0,
        0,
        0,
        0,
        TimeScale::UTC,
    )
    .map_err(|e| e.to_string())?;

    Ok(epoch.to_mjd_utc_days() + fraction)
}
