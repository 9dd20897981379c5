//! The per-tracklet ranging search.
//!
//! One workspace is allocated per solve and dropped at its end; nothing
//! here is shared between tracklets. The search walks a 2-D continuous
//! space of (heliocentric distance, motion angle), solving a candidate
//! two-body orbit at every probe and tagging the population-model bin
//! it lands in. Both axes are explored by adaptive bisection: a segment
//! is split while its probes keep discovering bins, is always split
//! down to a floor step, and gets `AGE_LIMIT` extra chances after it
//! stops producing, so thin slivers of class regions are not skipped
//! over.
//!
//! Tags live in two nested scopes. Distance-scope tags reset at each
//! probed distance and tell the angle search when it has stopped finding
//! anything. Tracklet-scope tags accumulate across distances; a bin
//! contributes to the population sums exactly once per tracklet, on
//! first promotion from distance scope.

use std::collections::HashSet;
use std::f64::consts::PI;

use ahash::RandomState;
use nalgebra::Vector3;

use crate::astro::{absolute_magnitude, rotate_x, solar_ephemeris, two_body_elements};
use crate::constants::{Radian, GAUSS_GRAV_INV, GAUSS_GRAV_SQUARED};
use crate::errors::Digest2Error;
use crate::observations::{Observation, Tracklet};
use crate::population::classes::{CLASS_LIST, UNBOUNDED_CLASSES};
use crate::rng::SolverRng;
use crate::solver::{endpoints, Scores, Solver};

/// Search floor and ceiling in heliocentric distance, AU.
pub(crate) const MIN_DISTANCE: f64 = 0.05;
pub(crate) const MAX_DISTANCE: f64 = 100.;
/// Distance segments are always split down to this length, AU.
const MIN_DISTANCE_STEP: f64 = 0.2;
/// Angle segments are always split down to this length, radians.
const MIN_ANGLE_STEP: f64 = 0.1;
/// Extra chances a dry branch gets before being pruned. Values above 1
/// proved expensive for negligible benefit.
const AGE_LIMIT: u32 = 1;

type BinSet = HashSet<usize, RandomState>;

/// Tag sets and running sums for one scored class.
#[derive(Default)]
struct ClassStats {
    d_in_class: BinSet,
    d_non_class: BinSet,
    tag_in_class: BinSet,
    tag_non_class: BinSet,
    sum_all_in_class: f64,
    sum_all_non_class: f64,
    sum_unk_in_class: f64,
    sum_unk_non_class: f64,
}

pub(crate) struct TrackletWorkspace<'a> {
    solver: &'a Solver,
    rng: &'a mut dyn SolverRng,
    vmag: f64,

    // motion-vector endpoints and their clipped errors
    first: Observation,
    last: Observation,
    first_obs_err: Radian,
    last_obs_err: Radian,
    no_obs_err: bool,
    pub(crate) arc_rms: Radian,

    // distance-independent geometry, computed once per tracklet
    inv_dt: f64,
    inv_dt_sq: f64,
    sin_obliquity: f64,
    cos_obliquity: f64,
    sun_observer0: Vector3<f64>,
    sun_observer1: Vector3<f64>,

    // direction-offset dependent
    observer_object_unit0: Vector3<f64>,
    observer_object_unit1: Vector3<f64>,

    // distance dependent
    sun_object0: Vector3<f64>,
    sun_object0_mag: f64,
    observer1_object0: Vector3<f64>,
    observer1_object0_mag: f64,
    observer1_object0_mag_sq: f64,
    theta_z: f64,
    hmag: f64,
    hmag_bin: usize,

    // distance-scope tags
    d_any_tag: bool,
    d_tag: BinSet,
    class_stats: Vec<ClassStats>,
}

impl<'a> TrackletWorkspace<'a> {
    pub(crate) fn new(
        solver: &'a Solver,
        tracklet: &Tracklet,
        vmag: f64,
        rng: &'a mut dyn SolverRng,
    ) -> Result<Self, Digest2Error> {
        let ep = endpoints::synthesize(tracklet.observations())?;

        let first_obs_err = solver.clip_err(ep.first_rms, &ep.first.site_code);
        let last_obs_err = solver.clip_err(ep.last_rms, &ep.last.site_code);
        let no_obs_err = first_obs_err == 0. && last_obs_err == 0.;

        let dt = ep.last.time - ep.first.time;
        let inv_dt = 1. / dt;

        // sun-observer vectors in the ecliptic frame; the obliquity at
        // the first endpoint serves the whole solve
        let (sun_earth0, soe, coe) = solar_ephemeris(ep.first.time);
        let (sun_earth1, _, _) = solar_ephemeris(ep.last.time);
        let sun_observer0 = rotate_x(
            &(ep.first.earth_observer_vector() - sun_earth0),
            soe,
            coe,
        );
        let sun_observer1 = rotate_x(
            &(ep.last.earth_observer_vector() - sun_earth1),
            soe,
            coe,
        );

        let class_stats = (0..solver.class_compute.len())
            .map(|_| ClassStats::default())
            .collect();

        Ok(TrackletWorkspace {
            solver,
            rng,
            vmag,
            first: ep.first,
            last: ep.last,
            first_obs_err,
            last_obs_err,
            no_obs_err,
            arc_rms: ep.arc_rms,
            inv_dt,
            inv_dt_sq: inv_dt * inv_dt,
            sin_obliquity: soe,
            cos_obliquity: coe,
            sun_observer0,
            sun_observer1,
            observer_object_unit0: Vector3::zeros(),
            observer_object_unit1: Vector3::zeros(),
            sun_object0: Vector3::zeros(),
            sun_object0_mag: 0.,
            observer1_object0: Vector3::zeros(),
            observer1_object0_mag: 0.,
            observer1_object0_mag_sq: 0.,
            theta_z: 0.,
            hmag: 0.,
            hmag_bin: 0,
            d_any_tag: false,
            d_tag: BinSet::default(),
            class_stats,
        })
    }

    /// Run the search and convert the accumulated sums into scores.
    pub(crate) fn score(&mut self) -> Vec<Scores> {
        // seed the end distances explicitly, then bisect between them
        self.search_distance(MIN_DISTANCE);
        self.search_distance(MAX_DISTANCE);
        self.d_range(MIN_DISTANCE, MAX_DISTANCE, 0);

        self.class_stats
            .iter()
            .zip(&self.solver.class_compute)
            .map(|(stats, &class)| {
                let raw = score_fraction(
                    stats.sum_all_in_class,
                    stats.sum_all_non_class,
                    class,
                );
                let no_id = score_fraction(
                    stats.sum_unk_in_class,
                    stats.sum_unk_non_class,
                    class,
                );
                Scores { raw, no_id }
            })
            .collect()
    }

    /// Explore a distance range by bisection.
    ///
    /// `age` counts consecutive dry midpoints; a fresh tag or a segment
    /// above the floor step resets it.
    fn d_range(&mut self, d1: f64, d2: f64, age: u32) {
        let dmid = (d1 + d2) * 0.5;

        if self.search_distance(dmid) || d2 - d1 > MIN_DISTANCE_STEP {
            self.d_range(d1, dmid, 0);
            self.d_range(dmid, d2, 0);
            return;
        }

        if age < AGE_LIMIT {
            self.d_range(d1, dmid, age + 1);
            self.d_range(dmid, d2, age + 1);
        }
    }

    /// Search angle space at one candidate distance, under each of the
    /// nine half-error direction offsets.
    ///
    /// Returns whether any bin was newly tagged at tracklet scope. With
    /// both observational errors zero the offsets are all no-ops and the
    /// first iteration decides the distance.
    fn search_distance(&mut self, d: f64) -> bool {
        self.clear_distance_tags();
        let mut new_tag = false;

        for rx in [-1., 0., 1.] {
            for dx in [-1., 0., 1.] {
                self.offset_motion_vector(rx, dx);
                self.solve_distance_geometry(d);
                if self.search_angles() {
                    new_tag = true;
                }
                if self.no_obs_err {
                    return new_tag;
                }
            }
        }
        new_tag
    }

    fn clear_distance_tags(&mut self) {
        self.d_any_tag = false;
        self.d_tag.clear();
        for stats in &mut self.class_stats {
            stats.d_in_class.clear();
            stats.d_non_class.clear();
        }
    }

    /// Perturb the endpoint directions by half an observational error,
    /// in opposite senses, and refresh the line-of-sight unit vectors.
    fn offset_motion_vector(&mut self, rx: f64, dx: f64) {
        self.observer_object_unit0 = self.offset_unit(&self.first, self.first_obs_err, rx, dx);
        self.observer_object_unit1 = self.offset_unit(&self.last, self.last_obs_err, -rx, -dx);
    }

    fn offset_unit(&self, obs: &Observation, obs_err: Radian, rx: f64, dx: f64) -> Vector3<f64> {
        let (sdec, cdec) = (obs.dec + dx * obs_err * 0.5).sin_cos();
        let (sra, cra) = (obs.ra + rx * obs_err * 0.5 * cdec).sin_cos();
        rotate_x(
            &Vector3::new(cra * cdec, sra * cdec, sdec),
            self.sin_obliquity,
            self.cos_obliquity,
        )
    }

    /// Geometry that depends only on the candidate distance `d` along
    /// the first line of sight: object position, the second observer's
    /// line of sight to it, and the absolute magnitude this distance
    /// implies for the tracklet's V magnitude.
    fn solve_distance_geometry(&mut self, d: f64) {
        let observer_object0 = self.observer_object_unit0 * d;

        self.sun_object0 = self.sun_observer0 + observer_object0;
        self.sun_object0_mag = self.sun_object0.norm();

        self.observer1_object0 = self.sun_object0 - self.sun_observer1;
        self.observer1_object0_mag_sq = self.observer1_object0.norm_squared();
        self.observer1_object0_mag = self.observer1_object0_mag_sq.sqrt();

        self.hmag = absolute_magnitude(
            self.vmag,
            &observer_object0,
            &self.sun_object0,
            d,
            self.sun_object0_mag,
        );
        self.hmag_bin = self.solver.partition.h_bin(self.hmag);
    }

    /// The motion angles bounding bound orbits at the current distance.
    ///
    /// Solving the quadratic in the far-endpoint distance that makes the
    /// orbital energy zero gives the two parabolic-limit geometries; the
    /// corresponding angles bracket every elliptical solution. `None`
    /// when the discriminant is non-positive or not finite: no bound
    /// orbit passes through this geometry at all.
    fn solve_angle_range(&mut self) -> Option<(f64, f64)> {
        let th = self.observer1_object0.dot(&self.observer_object_unit1)
            / self.observer1_object0_mag;
        self.theta_z = th.acos();

        let aa = self.inv_dt_sq;
        let bb = -2. * self.observer1_object0_mag * th * aa;
        let cc = self.observer1_object0_mag_sq * aa
            - 2. * GAUSS_GRAV_SQUARED / self.sun_object0_mag;
        let dsc = bb * bb - 4. * aa * cc;

        // written with ! so NaN and infinity fail the gate too
        if !(dsc > 0.) {
            return None;
        }

        let sd = dsc.sqrt();
        let inv2aa = 0.5 / aa;

        let mut ang1 = 0.;
        let mut ang2 = 0.;
        let mut sd1 = -sd;
        loop {
            let d2 = (-bb + sd1) * inv2aa;
            let d2s = d2 * d2;
            let nns =
                d2s + self.observer1_object0_mag_sq - 2. * d2 * self.observer1_object0_mag * th;
            let nn = nns.sqrt();
            let ca =
                (nns + self.observer1_object0_mag_sq - d2s) / (2. * nn * self.observer1_object0_mag);
            let sa = d2 * self.theta_z.sin() / nn;
            ang2 = 2. * sa.atan2(1. + ca);

            if sd1 == sd {
                break;
            }

            // first root becomes ang1, second ang2
            ang1 = ang2;
            sd1 = sd;
        }
        Some((ang1, ang2))
    }

    /// Search the angle range at the current distance, then promote the
    /// bins this distance reached into tracklet scope, accumulating the
    /// population sums for each first-time promotion.
    fn search_angles(&mut self) -> bool {
        let Some((ang1, ang2)) = self.solve_angle_range() else {
            return false;
        };

        self.a_range(ang1, ang2, 0);

        if !self.d_any_tag {
            return false;
        }

        let mut new_tag = false;
        let solver = self.solver;
        for &bx in &self.d_tag {
            for (cx, &class) in solver.class_compute.iter().enumerate() {
                let stats = &mut self.class_stats[cx];
                if stats.d_in_class.contains(&bx) && stats.tag_in_class.insert(bx) {
                    new_tag = true;
                    stats.sum_all_in_class += solver.all.class[class][bx];
                    stats.sum_unk_in_class += solver.unk.class[class][bx];
                }
                if stats.d_non_class.contains(&bx) && stats.tag_non_class.insert(bx) {
                    new_tag = true;
                    stats.sum_all_non_class +=
                        solver.all.ss[bx] - solver.all.class[class][bx];
                    stats.sum_unk_non_class +=
                        solver.unk.ss[bx] - solver.unk.class[class][bx];
                }
            }
        }
        new_tag
    }

    /// Explore an angle range by bisection, like [`Self::d_range`] over
    /// distance. The midpoint gets a jiggle from the injected random
    /// source so closely adjacent distances probe different angles.
    fn a_range(&mut self, ang1: f64, ang2: f64, age: u32) {
        let d3 = (ang2 - ang1) / 3.;
        let mid = ang1 + d3 + d3 * self.rng.next_f64();

        if self.tag_angle(mid) || d3 > MIN_ANGLE_STEP {
            self.a_range(ang1, mid, 0);
            self.a_range(mid, ang2, 0);
            return;
        }

        if age < AGE_LIMIT {
            self.a_range(ang1, mid, age + 1);
            self.a_range(mid, ang2, age + 1);
        }
    }

    /// Solve the orbit at one (distance, angle) probe and tag its bin.
    ///
    /// Returns whether some class newly tagged the bin at distance
    /// scope, the signal for the angle search to keep refining here.
    fn tag_angle(&mut self, angle: f64) -> bool {
        // velocity from the triangle closed by the two lines of sight,
        // scaled so the gravitational parameter drops out downstream
        let s = self.observer1_object0_mag * angle.sin() / (PI - angle - self.theta_z).sin();
        let velocity = (self.observer_object_unit1 * s - self.observer1_object0)
            * (self.inv_dt * GAUSS_GRAV_INV);

        let Some(elements) =
            two_body_elements(&self.sun_object0, &velocity, self.sun_object0_mag)
        else {
            return false;
        };

        let q = elements.semi_major_axis * (1. - elements.eccentricity);
        let Some((iq, ie, ii)) = self.solver.partition.qei_bins(
            q,
            elements.eccentricity,
            elements.inclination,
        ) else {
            return false;
        };
        let bx = self
            .solver
            .partition
            .flat_index(iq, ie, ii, self.hmag_bin);

        let mut new_tag = false;
        for (cx, &class) in self.solver.class_compute.iter().enumerate() {
            let stats = &mut self.class_stats[cx];
            let in_class = (CLASS_LIST[class].is_class)(
                q,
                elements.eccentricity,
                elements.inclination,
                self.hmag,
            );
            if in_class {
                if stats.d_in_class.insert(bx) {
                    new_tag = true;
                }
            } else if stats.d_non_class.insert(bx) {
                new_tag = true;
            }
        }
        if new_tag {
            // an orbit exists at this distance, and this bin meets the
            // 2-D search surface here
            self.d_any_tag = true;
            self.d_tag.insert(bx);
        }
        new_tag
    }
}

fn score_fraction(in_class: f64, non_class: f64, class: usize) -> f64 {
    let total = in_class + non_class;
    if total > 0. {
        100. * in_class / total
    } else if class < UNBOUNDED_CLASSES {
        100.
    } else {
        0.
    }
}
