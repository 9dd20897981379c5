use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use smallvec::smallvec;

use digest2::constants::ERAU;
use digest2::{
    Lcg, ObsErrMap, Observation, ObservingSite, Observer, PopulationCounts, PopulationFile,
    Solver, SolverRng, Tracklet, CLASS_LIST, DEFAULT_OBS_ERR, REPEATABLE_SEED,
};

fn synthetic_model() -> PopulationFile {
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
    let (qc, ec, ic, hc) = (
        centers(&q_part, 0.),
        centers(&e_part, 0.),
        centers(&i_part, 0.),
        centers(&h_part, 10.),
    );

    let mut all = PopulationCounts::zeroed(bins);
    let mut x = 0;
    for &q in &qc {
        for &e in &ec {
            for &i in &ic {
                for &h in &hc {
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
        astorb_date: "bench".into(),
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

fn neo_tracklet() -> Tracklet {
    let site = Arc::new(Observer {
        longitude: 248.39981 / 360.,
        rho_cos_phi: 0.84947 * ERAU,
        rho_sin_phi: 0.52647 * ERAU,
        name: None,
    });
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

fn bench_solve(c: &mut Criterion) {
    let solver = Solver::new(
        synthetic_model(),
        (0..CLASS_LIST.len()).collect(),
        ObsErrMap::default(),
        DEFAULT_OBS_ERR,
    )
    .unwrap();
    let tracklet = neo_tracklet();
    let vmag = tracklet.mean_vmag();

    c.bench_function("solve_neo_tracklet", |b| {
        let mut rng = Lcg::default();
        b.iter(|| {
            rng.reseed(REPEATABLE_SEED);
            solver.solve(&tracklet, vmag, &mut rng).unwrap()
        })
    });
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
