//! Shared fixtures: a synthetic population model and a known NEO
//! tracklet.

use std::sync::Arc;

use smallvec::smallvec;

use digest2::constants::ERAU;
use digest2::{Observation, ObservingSite, Observer, PopulationCounts, PopulationFile, Tracklet, CLASS_LIST};

/// Bin edges loosely following the populated part of element space.
pub fn partitions() -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
    (
        vec![
            0.4, 0.7, 0.8, 0.9, 1., 1.1, 1.2, 1.3, 1.4, 1.5, 1.67, 1.8, 2., 2.2, 2.4, 2.6, 2.8,
            3.25, 5., 5.5, 10., 100.,
        ],
        vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.7, 0.9, 1.1],
        vec![2., 5., 10., 15., 20., 25., 30., 40., 60., 90., 180.],
        vec![
            6., 8., 10., 12., 14., 15., 16., 17., 18., 19., 20., 21., 22., 23., 24., 25., 26.,
        ],
    )
}

fn centers(edges: &[f64], lower0: f64) -> Vec<f64> {
    let mut lower = lower0;
    edges
        .iter()
        .map(|&upper| {
            let c = (lower + upper) * 0.5;
            lower = upper;
            c
        })
        .collect()
}

/// A population model with one object per bin; class counts follow the
/// class predicates evaluated at the bin centres, and the unknown
/// population is half of everything.
pub fn synthetic_model() -> PopulationFile {
    let (q_part, e_part, i_part, h_part) = partitions();
    let bins = q_part.len() * e_part.len() * i_part.len() * h_part.len();

    let q_centers = centers(&q_part, 0.);
    let e_centers = centers(&e_part, 0.);
    let i_centers = centers(&i_part, 0.);
    let h_centers = centers(&h_part, 4.);

    let mut all = PopulationCounts::zeroed(bins);
    let mut x = 0;
    for &q in &q_centers {
        for &e in &e_centers {
            for &i in &i_centers {
                for &h in &h_centers {
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

    let mut unk = all.clone();
    unk.ss.iter_mut().for_each(|v| *v *= 0.5);
    unk.class
        .iter_mut()
        .for_each(|counts| counts.iter_mut().for_each(|v| *v *= 0.5));

    PopulationFile {
        astorb_date: "2026-08-01".into(),
        astorb_lines: bins as u64,
        bin_count: bins as u64,
        last_h: (h_part.len() - 1) as u64,
        q_part,
        e_part,
        i_part,
        h_part,
        all,
        unk,
    }
}

pub fn spacewatch() -> Arc<Observer> {
    Arc::new(Observer {
        longitude: 248.39981 / 360.,
        rho_cos_phi: 0.84947 * ERAU,
        rho_sin_phi: 0.52647 * ERAU,
        name: Some("LPL/Spacewatch II".into()),
    })
}

/// Three real observations of a fast-moving near-Earth object.
pub fn neo_tracklet() -> Tracklet {
    let site = spacewatch();
    let obs = |time, ra, dec, vmag| Observation {
        time,
        ra,
        dec,
        vmag,
        site: ObservingSite::Ground {
            parallax: site.clone(),
        },
        site_code: "291".into(),
    };
    Tracklet::new(
        "NE00030",
        smallvec![
            obs(53264.15206, 4.246354799619772, 0.36430693809190634, 21.1),
            obs(53264.15621, 4.246338073547773, 0.3642734859479098, 20.8),
            obs(53264.16017, 4.246322801916818, 0.36423857936286996, 20.7),
        ],
    )
    .unwrap()
}
