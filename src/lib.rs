//! Statistical ranging of short-arc minor-planet astrometry into
//! dynamical orbit-class scores, after the digest2 algorithm.

pub mod astro;
pub mod config;
pub mod constants;
mod conversion;
pub mod errors;
pub mod great_circle;
pub mod observations;
pub mod observers;
pub mod population;
pub mod rng;
pub mod solver;
pub mod time;

pub use config::{Digest2Config, OutputOptions};
pub use constants::{ArcSec, Degree, MpcCode, ObsErrMap, Observations, ParallaxMap, Radian, MJD};
pub use errors::Digest2Error;
pub use great_circle::GreatCircleFit;
pub use observations::mpc_80col::split_tracklets;
pub use observations::{Observation, ObservingSite, Tracklet, TrackletError};
pub use observers::Observer;
pub use population::classes::{class_index, ClassEntry, CLASS_LIST};
pub use population::{BinPartition, PopulationCounts, PopulationFile, MODEL_FILE_NAME};
pub use rng::{Lcg, PlatformRng, SolverRng, REPEATABLE_SEED};
pub use solver::{Scores, Solver, DEFAULT_OBS_ERR};
