//! # The digest2 solver
//!
//! Scores a short-arc tracklet against the binned Solar-System
//! population model by statistical ranging.
//!
//! ## Overview
//!
//! A [`Solver`] owns everything that is constant across tracklets: the
//! two population histograms (complete and not-yet-discovered), the
//! ordered list of orbit classes to score, and the observational-error
//! configuration. It is immutable after construction, so one instance
//! can serve any number of concurrent [`Solver::solve`] calls; each
//! call allocates its own workspace and runs CPU-bound to completion,
//! with no locks and no I/O.
//!
//! ## Pipeline
//!
//! 1. The tracklet is reduced to two motion-vector endpoints with an
//!    observational-error floor ([`endpoints`]).
//! 2. The (distance × motion angle) orbit space consistent with those
//!    endpoints is explored adaptively, each candidate orbit tagging
//!    the population bin it falls in (`workspace`).
//! 3. Tagged bins turn into per-class population sums, and the sums
//!    into two percentage scores per class ([`Scores`]): `raw` against
//!    the complete modelled population, `no_id` against the residual
//!    population that object identification could not have removed.
//!
//! Scores are population fractions, not Bayesian probabilities. They
//! answer: of the modelled objects that could have produced this
//! tracklet, what share belongs to the class?
//!
//! ## Example
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use digest2::{Lcg, PopulationFile, Solver, Tracklet};
//!
//! # fn tracklets() -> Vec<Tracklet> { unimplemented!() }
//! let model = PopulationFile::read(Utf8Path::new("digest2.model"))?;
//! let solver = Solver::new(model, (0..4).collect(), Default::default(),
//!     digest2::DEFAULT_OBS_ERR)?;
//!
//! let mut rng = Lcg::default();
//! for tracklet in tracklets() {
//!     let (rms, scores) = solver.solve(&tracklet, tracklet.mean_vmag(), &mut rng)?;
//!     println!("{} {rms:.2} NEO {:.0}", tracklet.designation, scores[1].raw);
//! }
//! # Ok::<(), digest2::Digest2Error>(())
//! ```

pub(crate) mod endpoints;
mod workspace;

use crate::constants::{ArcSec, ObsErrMap, Radian, RADSEC};
use crate::conversion::rad_to_arcsec;
use crate::errors::Digest2Error;
use crate::observations::Tracklet;
use crate::population::classes::CLASS_LIST;
use crate::population::{BinPartition, PopulationCounts, PopulationFile};
use crate::rng::SolverRng;
use workspace::TrackletWorkspace;

/// Default observational error when neither the configuration nor the
/// site map says otherwise: one arc second, in radians.
pub const DEFAULT_OBS_ERR: Radian = RADSEC;

/// Largest accepted observational error, arc seconds.
pub const MAX_OBS_ERR_ARCSEC: ArcSec = 10.;

/// The score pair for one orbit class, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// Share of the complete modelled population consistent with the
    /// tracklet that lies in the class.
    pub raw: f64,
    /// Same share against the modelled-minus-identified population.
    pub no_id: f64,
}

/// The immutable scoring engine. See the [module docs](self).
pub struct Solver {
    pub(crate) partition: BinPartition,
    pub(crate) all: PopulationCounts,
    pub(crate) unk: PopulationCounts,
    pub(crate) class_compute: Vec<usize>,
    obs_err_map: ObsErrMap,
    obs_err_default: Radian,
}

impl Solver {
    /// Build a solver from a population model and error configuration.
    ///
    /// Arguments
    /// ---------
    /// * `model`: the population model, validated here.
    /// * `class_compute`: indexes into [`CLASS_LIST`], in output order.
    /// * `obs_err_map`: per-site observational errors, radians.
    /// * `obs_err_default`: fallback observational error, radians.
    ///
    /// Return
    /// ------
    /// * the solver, or the error that makes the configuration
    ///   unusable: an inconsistent model, a class index out of range,
    ///   or an observational error that is negative, non-finite or
    ///   above [`MAX_OBS_ERR_ARCSEC`].
    pub fn new(
        model: PopulationFile,
        class_compute: Vec<usize>,
        obs_err_map: ObsErrMap,
        obs_err_default: Radian,
    ) -> Result<Self, Digest2Error> {
        let partition = model.partition()?;

        if let Some(&bad) = class_compute.iter().find(|&&c| c >= CLASS_LIST.len()) {
            return Err(Digest2Error::InvalidSolverParameter(format!(
                "class index {bad} out of range"
            )));
        }

        let limit = MAX_OBS_ERR_ARCSEC * RADSEC;
        for &err in obs_err_map.values().chain([&obs_err_default]) {
            if !(0. ..=limit).contains(&err) {
                return Err(Digest2Error::ObsErrTooLarge(rad_to_arcsec(err)));
            }
        }

        Ok(Solver {
            partition,
            all: model.all,
            unk: model.unk,
            class_compute,
            obs_err_map,
            obs_err_default,
        })
    }

    /// The class indexes this solver scores, in output order.
    pub fn classes(&self) -> &[usize] {
        &self.class_compute
    }

    /// Score one tracklet.
    ///
    /// Arguments
    /// ---------
    /// * `tracklet`: a validated tracklet.
    /// * `vmag`: the apparent V magnitude to reduce, typically
    ///   [`Tracklet::mean_vmag`].
    /// * `rng`: the random source jiggling the angle search. Reseed a
    ///   deterministic source before each call for repeatable scores.
    ///
    /// Return
    /// ------
    /// * the great-circle rms of the tracklet in arc seconds, and one
    ///   [`Scores`] per entry of `class_compute`.
    pub fn solve(
        &self,
        tracklet: &Tracklet,
        vmag: f64,
        rng: &mut dyn SolverRng,
    ) -> Result<(ArcSec, Vec<Scores>), Digest2Error> {
        let mut workspace = TrackletWorkspace::new(self, tracklet, vmag, rng)?;
        let scores = workspace.score();
        Ok((rad_to_arcsec(workspace.arc_rms), scores))
    }

    /// The observational error to assume for one motion-vector
    /// endpoint, all angles in radians.
    ///
    /// Precedence: a configured zero suppresses errors outright; a
    /// missing measured rms falls back to the configured value; and
    /// otherwise the larger of the two wins.
    pub(crate) fn clip_err(&self, measured_rms: Radian, site_code: &str) -> Radian {
        let default_err = self
            .obs_err_map
            .get(site_code)
            .copied()
            .unwrap_or(self.obs_err_default);
        if default_err == 0. {
            return 0.;
        }
        if measured_rms == 0. {
            return default_err;
        }
        default_err.max(measured_rms)
    }
}

#[cfg(test)]
mod solver_test {
    use super::*;
    use crate::population::PopulationCounts;

    fn test_solver(obs_err_map: ObsErrMap, obs_err_default: Radian) -> Solver {
        let file = PopulationFile {
            astorb_date: "2026-08-01".into(),
            astorb_lines: 0,
            q_part: vec![1.3, 100.],
            e_part: vec![1.1],
            i_part: vec![180.],
            h_part: vec![18., 30.],
            bin_count: 4,
            last_h: 1,
            all: PopulationCounts::zeroed(4),
            unk: PopulationCounts::zeroed(4),
        };
        Solver::new(file, (0..CLASS_LIST.len()).collect(), obs_err_map, obs_err_default).unwrap()
    }

    #[test]
    fn test_clip_err_precedence() {
        let mut map = ObsErrMap::default();
        map.insert("703".into(), 2. * RADSEC);
        map.insert("F51".into(), 0.);
        let solver = test_solver(map, RADSEC);

        // configured zero beats any measured rms
        assert_eq!(solver.clip_err(5. * RADSEC, "F51"), 0.);
        // no measured rms: the configured value
        assert_eq!(solver.clip_err(0., "703"), 2. * RADSEC);
        // the larger of measured and configured wins
        assert_eq!(solver.clip_err(3. * RADSEC, "703"), 3. * RADSEC);
        assert_eq!(solver.clip_err(1. * RADSEC, "703"), 2. * RADSEC);
        // unknown site: the default applies
        assert_eq!(solver.clip_err(0., "291"), RADSEC);
        assert_eq!(solver.clip_err(4. * RADSEC, "291"), 4. * RADSEC);
    }

    #[test]
    fn test_construction_rejects_bad_parameters() {
        let file = PopulationFile {
            astorb_date: String::new(),
            astorb_lines: 0,
            q_part: vec![1.3, 100.],
            e_part: vec![1.1],
            i_part: vec![180.],
            h_part: vec![18., 30.],
            bin_count: 4,
            last_h: 1,
            all: PopulationCounts::zeroed(4),
            unk: PopulationCounts::zeroed(4),
        };

        // class index out of range
        assert!(matches!(
            Solver::new(file.clone(), vec![99], ObsErrMap::default(), RADSEC),
            Err(Digest2Error::InvalidSolverParameter(_))
        ));

        // observational error above the cap
        assert!(matches!(
            Solver::new(
                file.clone(),
                vec![0],
                ObsErrMap::default(),
                11. * RADSEC
            ),
            Err(Digest2Error::ObsErrTooLarge(_))
        ));

        // inconsistent model
        let mut broken = file;
        broken.bin_count = 5;
        assert!(matches!(
            Solver::new(broken, vec![0], ObsErrMap::default(), RADSEC),
            Err(Digest2Error::InvalidModel(_))
        ));
    }
}
