//! Endpoint synthesis: reduce a tracklet to two observations that carry
//! its motion.
//!
//! The ranging search wants exactly two directions. Rather than the raw
//! first and last observation, the arc is reduced to synthetic
//! observations near its 17th and 83rd temporal percentiles, where a
//! straight-line fit of uniformly weighted points pivots. Percentiles,
//! not percents, so irregularly spaced observations still land inside
//! the covered arc.
//!
//! Which observations can be merged into a fit is constrained by the
//! site geometry: only observations sharing one set of parallax
//! constants, spanning less than ~3 hours, move together rigidly enough
//! for a single great-circle fit. Space-based observations never merge;
//! for them the percentile observations are used as they are.

use std::sync::Arc;

use crate::constants::{Radian, MJD};
use crate::errors::Digest2Error;
use crate::great_circle::GreatCircleFit;
use crate::observations::{Observation, ObservingSite};
use crate::observers::Observer;

/// Longest span one synthesised endpoint may absorb, days (≈ 3 hours).
const MAX_FIT_SPAN: f64 = 0.125;

/// The two observations carrying the motion vector, with the residual
/// rms of the fits that produced them. An rms of zero means no fit
/// applied, and downstream error clipping falls back to the site
/// default.
pub(crate) struct SynthesizedEndpoints {
    pub first: Observation,
    pub last: Observation,
    pub first_rms: Radian,
    pub last_rms: Radian,
    /// Great-circle rms over the whole tracklet, zero for two
    /// observations.
    pub arc_rms: Radian,
}

fn parallax(obs: &Observation) -> &Arc<Observer> {
    match &obs.site {
        ObservingSite::Ground { parallax } => parallax,
        // space-based arcs take the percentile path before any caller
        // reaches for parallax constants
        ObservingSite::Spacecraft { .. } => unreachable!("ground-based observation expected"),
    }
}

fn fit_range(observations: &[Observation]) -> Result<GreatCircleFit, Digest2Error> {
    let times: Vec<MJD> = observations.iter().map(|o| o.time).collect();
    let sky: Vec<(Radian, Radian)> = observations.iter().map(|o| (o.ra, o.dec)).collect();
    GreatCircleFit::new(&times, &sky)
}

/// Reduce a validated tracklet (≥ 2 observations, increasing times) to
/// its two motion-vector endpoints.
pub(crate) fn synthesize(
    observations: &[Observation],
) -> Result<SynthesizedEndpoints, Digest2Error> {
    let n = observations.len();
    debug_assert!(n >= 2);

    if n == 2 {
        // simplest case, the only two points given
        return Ok(SynthesizedEndpoints {
            first: observations[0].clone(),
            last: observations[1].clone(),
            first_rms: 0.,
            last_rms: 0.,
            arc_rms: 0.,
        });
    }

    let fit = fit_range(observations)?;
    let arc_rms = fit.rms();

    // scan site information: are all observations from one ground
    // station, and is anything space-based present
    let par0 = observations[0].ground_parallax();
    let mut space_based = par0.is_none();
    let mut all_same_site = true;
    for obs in &observations[1..] {
        match obs.ground_parallax() {
            Some(par) => {
                if par0.map_or(true, |p0| !Arc::ptr_eq(p0, par)) {
                    all_same_site = false;
                }
            }
            None => space_based = true,
        }
    }

    let fs = (n - 1) as f64 / 6.;
    let is = fs as usize;
    let fs = fs - is as f64;

    // interpolating against a moving observer is not meaningful; with
    // space-based observations present just take the observations at
    // the percentiles and let the site default cover the error
    if space_based {
        return Ok(SynthesizedEndpoints {
            first: observations[is].clone(),
            last: observations[n - 1 - is].clone(),
            first_rms: 0.,
            last_rms: 0.,
            arc_rms,
        });
    }

    // percentile times t17 and t83 by interpolation into the ordered arc
    let t17 = observations[is].time + (observations[is + 1].time - observations[is].time) * fs;
    let is83 = n - 1 - is;
    let t83 = observations[is83].time - (observations[is83].time - observations[is83 - 1].time) * fs;

    // single site and a short arc: the full fit stands in for both
    // endpoints, and its rms becomes their observational-error floor
    if all_same_site && observations[n - 1].time - observations[0].time < MAX_FIT_SPAN {
        let mut first = observations[0].clone();
        first.time = t17;
        (first.ra, first.dec) = fit.position(t17);

        let mut last = observations[n - 1].clone();
        last.time = t83;
        (last.ra, last.dec) = fit.position(t83);

        return Ok(SynthesizedEndpoints {
            first,
            last,
            first_rms: arc_rms,
            last_rms: arc_rms,
            arc_rms,
        });
    }

    // the involved case: one fit over everything is not appropriate, but
    // better endpoints than the raw first and last observation usually
    // exist. Split off an initial and a final sub-arc, each on a single
    // parallax reference and under the span limit, growing both inward
    // from the ends, the shorter side first, until either side stalls or
    // they meet.
    let mut o1 = 0;
    let mut o2 = n - 1;
    let par1 = parallax(&observations[0]);
    let par2 = parallax(&observations[n - 1]);
    let t1 = observations[0].time;
    let t2 = observations[n - 1].time;
    loop {
        let next = &observations[o1 + 1];
        let dt1 = next.time - t1;
        if !Arc::ptr_eq(parallax(next), par1) || dt1 > MAX_FIT_SPAN {
            // initial sub-arc settled; extend only the final one
            while o2 - 1 > o1 {
                let prev = &observations[o2 - 1];
                if !Arc::ptr_eq(parallax(prev), par2) || t2 - prev.time > MAX_FIT_SPAN {
                    break;
                }
                o2 -= 1;
            }
            break;
        }
        let prev = &observations[o2 - 1];
        let dt2 = t2 - prev.time;
        if !Arc::ptr_eq(parallax(prev), par2) || dt2 > MAX_FIT_SPAN {
            // final sub-arc settled; extend only the initial one
            while o1 + 1 < o2 {
                let next = &observations[o1 + 1];
                if !Arc::ptr_eq(parallax(next), par1) || next.time - t1 > MAX_FIT_SPAN {
                    break;
                }
                o1 += 1;
            }
            break;
        }

        if dt1 < dt2 {
            o1 += 1;
        } else {
            o2 -= 1;
        }

        if o2 == o1 + 1 {
            break;
        }
    }

    let covers_all = o2 == o1 + 1;
    let (first, first_rms) = one_endpoint(observations, 0, o1, covers_all, t17)?;
    let (last, last_rms) = one_endpoint(observations, o2, n - 1, covers_all, t83)?;
    Ok(SynthesizedEndpoints {
        first,
        last,
        first_rms,
        last_rms,
        arc_rms,
    })
}

/// Synthesize one endpoint from the sub-arc `observations[o1..=o2]`.
///
/// `covers_all` says the two sub-arcs exhaust the tracklet; the target
/// percentile time `pt` then gives way to the sub-arc's own midpoint or
/// median. All observations here are ground-based.
fn one_endpoint(
    observations: &[Observation],
    o1: usize,
    o2: usize,
    covers_all: bool,
    pt: MJD,
) -> Result<(Observation, Radian), Digest2Error> {
    // a single observation is its own endpoint
    if o1 == o2 {
        return Ok((observations[o1].clone(), 0.));
    }

    // two observations
    if o1 + 1 == o2 {
        // with observations between the sub-arcs and the percentile off
        // this one, the inner end of the pair is the best stand-in
        if !covers_all {
            let (end, dt) = if o1 == 0 {
                let end = &observations[o2];
                (end, end.time - pt)
            } else {
                let end = &observations[o1];
                (end, pt - end.time)
            };
            if dt < 0. {
                return Ok((end.clone(), 0.));
            }
        }

        // interpolate along the great circle connecting the pair
        let fit = fit_range(&observations[o1..=o2])?;
        let tr = if covers_all {
            (observations[o1].time + observations[o2].time) * 0.5
        } else {
            pt
        };
        let mut synth = observations[o2].clone();
        synth.time = tr;
        (synth.ra, synth.dec) = fit.position(tr);
        return Ok((synth, 0.));
    }

    // three or more observations: synthesize on the sub-arc's own fit
    let mut template = &observations[o1];
    let tr = if covers_all {
        // median time of the sub-arc
        let is = (o1 + o2) / 2;
        let mut tr = observations[is].time;
        if is + is < o1 + o2 {
            tr = (tr + observations[is + 1].time) * 0.5;
        }
        tr
    } else {
        // the percentile, clamped onto the sub-arc
        let dt = if o1 == 0 {
            template = &observations[o2];
            template.time - pt
        } else {
            pt - template.time
        };
        if dt < 0. {
            template.time
        } else {
            pt
        }
    };

    let fit = fit_range(&observations[o1..=o2])?;
    let mut synth = template.clone();
    synth.time = tr;
    (synth.ra, synth.dec) = fit.position(tr);
    Ok((synth, fit.rms()))
}
