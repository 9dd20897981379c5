//! The digest2 configuration file.
//!
//! A small line-oriented format: empty lines and `#` comments are
//! ignored, every other line is a keyword, an `obserr` assignment, or
//! an orbit-class name.
//!
//! ```text
//! # report the raw score too, repeatably
//! raw
//! noid
//! repeatable
//! obserr = 0.7
//! obserr 704 = 1
//! NEO
//! N22
//! poss
//! ```
//!
//! Keywords toggle output (`headings`/`noheadings`, `rms`/`norms`,
//! `raw`/`noid`, `poss`) and determinism (`repeatable`/`random`).
//! `obserr` lines set the assumed observational error in arc seconds,
//! globally or per observatory code. Class names, spelled exactly as
//! the abbreviation or long form, select the score columns; naming any
//! class restricts scoring to the named ones unless `poss` asks for
//! the other-possibilities column back.

use camino::Utf8Path;
use regex::Regex;

use crate::constants::{ObsErrMap, ParallaxMap, Radian};
use crate::conversion::arcsec_to_rad;
use crate::errors::Digest2Error;
use crate::population::classes::{class_index, CLASS_LIST};
use crate::solver::{DEFAULT_OBS_ERR, MAX_OBS_ERR_ARCSEC};

/// Which columns the driver prints.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub headings: bool,
    pub rms: bool,
    pub raw: bool,
    pub noid: bool,
    /// Append scores above half a percent for classes without a column.
    pub class_possible: bool,
    /// Classes with a dedicated column, as [`crate::CLASS_LIST`] indexes.
    pub class_columns: Vec<usize>,
}

/// Everything the configuration file controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest2Config {
    /// Classes the solver computes, in column order.
    pub class_compute: Vec<usize>,
    /// Reseed the deterministic generator per tracklet.
    pub repeatable: bool,
    /// Per-site observational errors, radians.
    pub obs_err_map: ObsErrMap,
    /// Fallback observational error, radians.
    pub obs_err_default: Radian,
    pub output: OutputOptions,
}

impl Default for Digest2Config {
    fn default() -> Self {
        let class_compute: Vec<usize> = (0..CLASS_LIST.len()).collect();
        Digest2Config {
            output: OutputOptions {
                headings: true,
                rms: true,
                raw: false,
                noid: true,
                class_possible: true,
                class_columns: class_compute[..4].to_vec(),
            },
            class_compute,
            repeatable: false,
            obs_err_map: ObsErrMap::default(),
            obs_err_default: DEFAULT_OBS_ERR,
        }
    }
}

impl Digest2Config {
    /// Read and parse a configuration file.
    pub fn from_file(path: &Utf8Path, sites: &ParallaxMap) -> Result<Self, Digest2Error> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, sites)
    }

    /// Parse configuration text.
    ///
    /// Arguments
    /// ---------
    /// * `text`: the file contents.
    /// * `sites`: the observatory code map, validating `obserr` codes.
    ///
    /// Return
    /// ------
    /// * the configuration, or the error naming the offending line.
    pub fn parse(text: &str, sites: &ParallaxMap) -> Result<Self, Digest2Error> {
        let mut config = Digest2Config::default();
        // the first raw/noid keyword, and the first class name, each
        // reset their defaults before taking effect
        let mut raw_spec = false;
        let mut class_spec = false;

        let obserr_re = Regex::new(r"^[ \t]*(.*?)[ \t]*=[ \t]*(.+)$").expect("static regex");

        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line {
                "headings" => config.output.headings = true,
                "noheadings" => config.output.headings = false,
                "rms" => config.output.rms = true,
                "norms" => config.output.rms = false,
                "raw" => {
                    if !raw_spec {
                        raw_spec = true;
                        config.output.noid = false;
                    }
                    config.output.raw = true;
                }
                "noid" => {
                    if !raw_spec {
                        raw_spec = true;
                        config.output.raw = false;
                    }
                    config.output.noid = true;
                }
                "poss" => {
                    if !class_spec {
                        class_spec = true;
                        config.output.class_columns.clear();
                    }
                    config.output.class_possible = true;
                }
                "repeatable" => config.repeatable = true,
                "random" => config.repeatable = false,
                _ => {
                    if let Some(rest) = line.strip_prefix("obserr") {
                        parse_obserr(rest, &obserr_re, sites, &mut config)
                            .map_err(|e| annotate(e, line))?;
                    } else if let Some(cx) = class_index(line) {
                        if !class_spec {
                            class_spec = true;
                            config.output.class_columns.clear();
                            config.output.class_possible = false;
                        }
                        config.output.class_columns.push(cx);
                    } else {
                        return Err(Digest2Error::InvalidConfig(format!(
                            "unrecognized line: {line}"
                        )));
                    }
                }
            }
        }

        if class_spec && !config.output.class_possible {
            config.class_compute = config.output.class_columns.clone();
        }
        Ok(config)
    }
}

fn annotate(err: Digest2Error, line: &str) -> Digest2Error {
    match err {
        Digest2Error::InvalidConfig(msg) => {
            Digest2Error::InvalidConfig(format!("{msg} (line: {line})"))
        }
        other => other,
    }
}

fn parse_obserr(
    rest: &str,
    obserr_re: &Regex,
    sites: &ParallaxMap,
    config: &mut Digest2Config,
) -> Result<(), Digest2Error> {
    let caps = obserr_re
        .captures(rest)
        .ok_or_else(|| Digest2Error::InvalidConfig("invalid format for obserr".into()))?;
    let err: f64 = caps[2]
        .parse()
        .map_err(|_| Digest2Error::InvalidConfig("invalid obserr value".into()))?;
    if err > MAX_OBS_ERR_ARCSEC {
        return Err(Digest2Error::ObsErrTooLarge(err));
    }
    let code = &caps[1];
    if code.is_empty() {
        config.obs_err_default = arcsec_to_rad(err);
        return Ok(());
    }
    if !sites.contains_key(code) {
        return Err(Digest2Error::UnknownObservatory(code.to_string()));
    }
    config.obs_err_map.insert(code.to_string(), arcsec_to_rad(err));
    Ok(())
}

#[cfg(test)]
mod config_test {
    use std::sync::Arc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::constants::{ERAU, RADSEC};
    use crate::observers::Observer;

    fn sites() -> ParallaxMap {
        let mut map = ParallaxMap::default();
        for code in ["291", "704", "F51"] {
            map.insert(
                code.into(),
                Some(Arc::new(Observer {
                    longitude: 0.5,
                    rho_cos_phi: 0.8 * ERAU,
                    rho_sin_phi: 0.5 * ERAU,
                    name: None,
                })),
            );
        }
        map
    }

    #[test]
    fn test_defaults() {
        let config = Digest2Config::default();
        assert_eq!(config.class_compute.len(), CLASS_LIST.len());
        assert_eq!(config.output.class_columns, vec![0, 1, 2, 3]);
        assert!(config.output.headings && config.output.rms && config.output.noid);
        assert!(!config.output.raw);
        assert!(config.output.class_possible);
        assert!(!config.repeatable);
        assert_relative_eq!(config.obs_err_default, RADSEC);
    }

    #[test]
    fn test_keywords_and_obserr() {
        let text = "\
# comment
noheadings
norms
raw
repeatable
obserr = 0.7
obserr 704 = 1
obserrF51=.3
";
        let config = Digest2Config::parse(text, &sites()).unwrap();
        assert!(!config.output.headings && !config.output.rms);
        // the first raw/noid keyword wins the exclusive default
        assert!(config.output.raw && !config.output.noid);
        assert!(config.repeatable);
        assert_relative_eq!(config.obs_err_default, 0.7 * RADSEC);
        assert_relative_eq!(config.obs_err_map["704"], RADSEC);
        assert_relative_eq!(config.obs_err_map["F51"], 0.3 * RADSEC);
        // class selection untouched
        assert_eq!(config.class_compute.len(), CLASS_LIST.len());
    }

    #[test]
    fn test_raw_and_noid_together() {
        let config = Digest2Config::parse("raw\nnoid\n", &sites()).unwrap();
        assert!(config.output.raw && config.output.noid);
    }

    #[test]
    fn test_class_selection_restricts_scoring() {
        let text = "NEO\nHungaria gr.\nJTr\n";
        let config = Digest2Config::parse(text, &sites()).unwrap();
        assert_eq!(config.output.class_columns, vec![1, 5, 13]);
        assert_eq!(config.class_compute, vec![1, 5, 13]);
        assert!(!config.output.class_possible);
    }

    #[test]
    fn test_class_selection_with_poss_keeps_all_classes() {
        let text = "Int\nNEO\nN22\nN18\nposs\n";
        let config = Digest2Config::parse(text, &sites()).unwrap();
        assert_eq!(config.output.class_columns, vec![0, 1, 2, 3]);
        assert_eq!(config.class_compute.len(), CLASS_LIST.len());
        assert!(config.output.class_possible);
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            Digest2Config::parse("obserr = 11\n", &sites()),
            Err(Digest2Error::ObsErrTooLarge(_))
        ));
        assert!(matches!(
            Digest2Config::parse("obserr 999 = 1\n", &sites()),
            Err(Digest2Error::UnknownObservatory(_))
        ));
        assert!(matches!(
            Digest2Config::parse("obserr = banana\n", &sites()),
            Err(Digest2Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Digest2Config::parse("Neo\n", &sites()),
            Err(Digest2Error::InvalidConfig(_))
        ));
    }
}
