//! Score one tracklet end to end against a small synthetic population
//! model, without any data files on disk.
//!
//! ```bash
//! cargo run --example score_tracklet
//! ```

use std::sync::Arc;

use digest2::constants::ERAU;
use digest2::{
    split_tracklets, Lcg, ObsErrMap, Observer, ParallaxMap, PopulationCounts, PopulationFile,
    Solver, CLASS_LIST, DEFAULT_OBS_ERR,
};

const OBSERVATIONS: &str = "\
     NE00030  C2004 09 16.15206 16 13 11.57 +20 52 23.7          21.1 Vd     291
     NE00030  C2004 09 16.15621 16 13 11.34 +20 52 16.8          20.8 Vd     291
     NE00030  C2004 09 16.16017 16 13 11.13 +20 52 09.6          20.7 Vd     291
";

/// One object per bin; class membership from the predicates at the bin
/// centres. A real run loads the astorb-derived model file instead.
fn toy_model() -> PopulationFile {
    let q_part = vec![0.7, 1., 1.3, 1.67, 2.1, 2.5, 2.8, 3.25, 5.5, 100.];
    let e_part = vec![0.2, 0.4, 0.6, 0.8, 1.1];
    let i_part = vec![5., 10., 20., 40., 90., 180.];
    let h_part = vec![12., 16., 18., 20., 22., 24., 26.];
    let bins = q_part.len() * e_part.len() * i_part.len() * h_part.len();

    let centers = |edges: &[f64], lower0: f64| {
        let mut lower = lower0;
        edges
            .iter()
            .map(|&upper| {
                let c = (lower + upper) * 0.5;
                lower = upper;
                c
            })
            .collect::<Vec<_>>()
    };

    let mut all = PopulationCounts::zeroed(bins);
    let mut x = 0;
    for &q in &centers(&q_part, 0.) {
        for &e in &centers(&e_part, 0.) {
            for &i in &centers(&i_part, 0.) {
                for &h in &centers(&h_part, 10.) {
                    all.ss[x] = 1.;
                    for (c, entry) in CLASS_LIST.iter().enumerate() {
                        if (entry.is_class)(q, e, i, h) {
                            all.class[c][x] = 1.;
                        }
                    }
                    x += 1;
                }
            }
        }
    }

    PopulationFile {
        astorb_date: "synthetic".into(),
        astorb_lines: 0,
        bin_count: bins as u64,
        last_h: (h_part.len() - 1) as u64,
        q_part,
        e_part,
        i_part,
        h_part,
        unk: all.clone(),
        all,
    }
}

fn main() -> Result<(), digest2::Digest2Error> {
    // a one-entry observatory catalogue is enough for the sample arc
    let mut sites = ParallaxMap::default();
    sites.insert(
        "291".into(),
        Some(Arc::new(Observer {
            longitude: 248.39981 / 360.,
            rho_cos_phi: 0.84947 * ERAU,
            rho_sin_phi: 0.52647 * ERAU,
            name: Some("LPL/Spacewatch II".into()),
        })),
    );

    let solver = Solver::new(
        toy_model(),
        (0..CLASS_LIST.len()).collect(),
        ObsErrMap::default(),
        DEFAULT_OBS_ERR,
    )?;

    let mut rng = Lcg::default();
    for tracklet in split_tracklets(OBSERVATIONS.as_bytes(), &sites)? {
        let (rms, scores) = solver.solve(&tracklet, tracklet.mean_vmag(), &mut rng)?;
        println!("{}  rms {rms:.2}\"", tracklet.designation);
        for (entry, s) in CLASS_LIST.iter().zip(&scores) {
            if s.raw > 0.5 {
                println!("  {:3}  raw {:5.1}  no-ID {:5.1}", entry.abbr, s.raw, s.no_id);
            }
        }
    }
    Ok(())
}
