//! The binned Solar-System population model.
//!
//! The model is a 4-D histogram over perihelion distance `q`,
//! eccentricity `e`, inclination `i` and absolute magnitude `H`.
//! Each bin carries a total population count and one count per orbit
//! class; counts are stored divided by the square root of the bin
//! volume, a weighting applied once when the file is built and relied
//! on here so scores stay comparable across bins of very different
//! extent.
//!
//! Two histograms travel together: `all`, the complete modelled
//! population, and `unk`, the residual after subtracting objects that
//! are catalogued and readily identifiable. The solver reads both and
//! never writes either.

pub mod classes;

use std::fs::File;
use std::io::{BufReader, BufWriter};

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::errors::Digest2Error;
use crate::population::classes::CLASS_LIST;

/// Default file name for the combined population model.
pub const MODEL_FILE_NAME: &str = "digest2.model";

/// The four quantile partitions defining the bin lattice.
///
/// Each axis is a strictly increasing sequence of upper bin edges. The
/// bin of a value is the first edge above it; a value above the last
/// edge is outside the model, except on the H axis which clamps into
/// its last bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinPartition {
    q: Vec<f64>,
    e: Vec<f64>,
    i: Vec<f64>,
    h: Vec<f64>,
    last_h: usize,
}

impl BinPartition {
    pub fn new(
        q: Vec<f64>,
        e: Vec<f64>,
        i: Vec<f64>,
        h: Vec<f64>,
    ) -> Result<Self, Digest2Error> {
        for axis in [&q, &e, &i, &h] {
            if axis.is_empty() {
                return Err(Digest2Error::InvalidModel("empty bin partition".into()));
            }
            if axis.windows(2).any(|w| !(w[0] < w[1])) {
                return Err(Digest2Error::InvalidModel(
                    "bin partition edges must increase strictly".into(),
                ));
            }
        }
        let last_h = h.len() - 1;
        Ok(BinPartition { q, e, i, h, last_h })
    }

    /// Number of bins in the flat lattice.
    pub fn bin_count(&self) -> usize {
        self.q.len() * self.e.len() * self.i.len() * self.h.len()
    }

    /// Index of the last H bin, where high magnitudes clamp.
    pub fn last_h(&self) -> usize {
        self.last_h
    }

    /// Flatten four axis indexes into the lattice index.
    #[inline]
    pub fn flat_index(&self, iq: usize, ie: usize, ii: usize, ih: usize) -> usize {
        ((iq * self.e.len() + ie) * self.i.len() + ii) * self.h.len() + ih
    }

    /// Axis indexes back from a flat lattice index.
    #[inline]
    pub fn unflatten(&self, x: usize) -> (usize, usize, usize, usize) {
        let ih = x % self.h.len();
        let x = x / self.h.len();
        let ii = x % self.i.len();
        let x = x / self.i.len();
        (x / self.e.len(), x % self.e.len(), ii, ih)
    }

    fn axis_bin(axis: &[f64], v: f64) -> Option<usize> {
        axis.iter().position(|&edge| v < edge)
    }

    /// Bin indexes for orbital elements, `None` when any element lies
    /// outside the modelled region.
    pub fn qei_bins(&self, q: f64, e: f64, i: f64) -> Option<(usize, usize, usize)> {
        Some((
            Self::axis_bin(&self.q, q)?,
            Self::axis_bin(&self.e, e)?,
            Self::axis_bin(&self.i, i)?,
        ))
    }

    /// Bin index for an absolute magnitude; clamps into the last bin.
    pub fn h_bin(&self, h: f64) -> usize {
        Self::axis_bin(&self.h, h).unwrap_or(self.last_h)
    }
}

/// Population counts over the flat bin lattice: the full modelled count
/// `ss` and one subset count per class, in [`CLASS_LIST`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub ss: Vec<f64>,
    pub class: Vec<Vec<f64>>,
}

impl PopulationCounts {
    /// Zeroed counts for `bin_count` bins.
    pub fn zeroed(bin_count: usize) -> Self {
        PopulationCounts {
            ss: vec![0.; bin_count],
            class: vec![vec![0.; bin_count]; CLASS_LIST.len()],
        }
    }

    fn check(&self, bin_count: usize, label: &str) -> Result<(), Digest2Error> {
        if self.ss.len() != bin_count {
            return Err(Digest2Error::InvalidModel(format!(
                "{label}: expected {bin_count} bins, found {}",
                self.ss.len()
            )));
        }
        if self.class.len() != CLASS_LIST.len() {
            return Err(Digest2Error::InvalidModel(format!(
                "{label}: expected {} class vectors, found {}",
                CLASS_LIST.len(),
                self.class.len()
            )));
        }
        for (c, counts) in self.class.iter().enumerate() {
            if counts.len() != bin_count {
                return Err(Digest2Error::InvalidModel(format!(
                    "{label}: class {c} has {} bins",
                    counts.len()
                )));
            }
            if counts
                .iter()
                .zip(&self.ss)
                .any(|(&cl, &ss)| !(0. ..=ss).contains(&cl))
            {
                return Err(Digest2Error::InvalidModel(format!(
                    "{label}: class {c} count outside [0, ss]"
                )));
            }
        }
        Ok(())
    }
}

/// On-disk population model: provenance, the partitions, and the two
/// histograms. Field order is the wire order of the binary encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationFile {
    /// Date of the orbit catalogue the histogram was built from.
    pub astorb_date: String,
    /// Line count of that catalogue.
    pub astorb_lines: u64,
    pub q_part: Vec<f64>,
    pub e_part: Vec<f64>,
    pub i_part: Vec<f64>,
    pub h_part: Vec<f64>,
    pub bin_count: u64,
    pub last_h: u64,
    /// Complete modelled population.
    pub all: PopulationCounts,
    /// Modelled population minus known identifiable objects.
    pub unk: PopulationCounts,
}

impl PopulationFile {
    /// Decode a model file written by the histogram builder.
    pub fn read(path: &Utf8Path) -> Result<Self, Digest2Error> {
        let f = File::open(path)?;
        let model: PopulationFile = bincode::deserialize_from(BufReader::new(f))?;
        Ok(model)
    }

    /// Encode back to disk, same layout [`PopulationFile::read`] expects.
    pub fn write(&self, path: &Utf8Path) -> Result<(), Digest2Error> {
        let f = File::create(path)?;
        bincode::serialize_into(BufWriter::new(f), self)?;
        Ok(())
    }

    /// Validate internal consistency and build the bin partition.
    pub fn partition(&self) -> Result<BinPartition, Digest2Error> {
        let partition = BinPartition::new(
            self.q_part.clone(),
            self.e_part.clone(),
            self.i_part.clone(),
            self.h_part.clone(),
        )?;
        let bins = partition.bin_count();
        if self.bin_count as usize != bins {
            return Err(Digest2Error::InvalidModel(format!(
                "declared bin count {} does not match partitions ({bins})",
                self.bin_count
            )));
        }
        if self.last_h as usize != partition.last_h() {
            return Err(Digest2Error::InvalidModel(format!(
                "declared last H index {} does not match the H partition",
                self.last_h
            )));
        }
        self.all.check(bins, "all")?;
        self.unk.check(bins, "unk")?;
        if self.unk.ss.iter().zip(&self.all.ss).any(|(&u, &a)| u > a) {
            return Err(Digest2Error::InvalidModel(
                "unknown population exceeds the complete population".into(),
            ));
        }
        Ok(partition)
    }
}
