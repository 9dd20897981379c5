//! Dynamical orbit classes and their membership predicates.
//!
//! Each class is a closed-form region of `(q, e, i, H)` space: perihelion
//! distance in AU, eccentricity, inclination in degrees, absolute
//! magnitude. The list order is fixed because the population model file
//! stores one count vector per class, by position.

use crate::constants::RADEG;

/// Number of classes scored out of 100 when the search finds no bound
/// orbit at all: the first two entries (MPC interesting and NEO) are
/// unbounded outward, so an empty search still supports them.
pub(crate) const UNBOUNDED_CLASSES: usize = 2;

/// A scored orbit class.
pub struct ClassEntry {
    /// Three-letter column tag.
    pub abbr: &'static str,
    /// Column heading / configuration long form.
    pub heading: &'static str,
    /// Membership predicate on `(q, e, i, H)`.
    pub is_class: fn(q: f64, e: f64, i: f64, h: f64) -> bool,
}

/// The scored classes, in population-model order.
pub const CLASS_LIST: [ClassEntry; 15] = [
    ClassEntry {
        abbr: "Int",
        heading: "MPC interest.",
        is_class: is_mpc_interesting,
    },
    ClassEntry {
        abbr: "NEO",
        heading: "NEO(q < 1.3)",
        is_class: is_neo,
    },
    ClassEntry {
        abbr: "N22",
        heading: "NEO(H <= 22)",
        is_class: is_neo_h22,
    },
    ClassEntry {
        abbr: "N18",
        heading: "NEO(H <= 18)",
        is_class: is_neo_h18,
    },
    ClassEntry {
        abbr: "MC",
        heading: "Mars Crosser",
        is_class: is_mars_crosser,
    },
    ClassEntry {
        abbr: "Hun",
        heading: "Hungaria gr.",
        is_class: is_hungaria,
    },
    ClassEntry {
        abbr: "Pho",
        heading: "Phocaea group",
        is_class: is_phocaea,
    },
    ClassEntry {
        abbr: "MB1",
        heading: "Inner MB",
        is_class: is_inner_main_belt,
    },
    ClassEntry {
        abbr: "Pal",
        heading: "Pallas group",
        is_class: is_pallas,
    },
    ClassEntry {
        abbr: "Han",
        heading: "Hansa group",
        is_class: is_hansa,
    },
    ClassEntry {
        abbr: "MB2",
        heading: "Middle MB",
        is_class: is_middle_main_belt,
    },
    ClassEntry {
        abbr: "MB3",
        heading: "Outer MB",
        is_class: is_outer_main_belt,
    },
    ClassEntry {
        abbr: "Hil",
        heading: "Hilda group",
        is_class: is_hilda,
    },
    ClassEntry {
        abbr: "JTr",
        heading: "Jupiter tr.",
        is_class: is_jupiter_trojan,
    },
    ClassEntry {
        abbr: "JFC",
        heading: "Jupiter Comet",
        is_class: is_jupiter_family_comet,
    },
];

/// Resolve a configuration name, abbreviation or long form, spelled
/// exactly as listed.
pub fn class_index(name: &str) -> Option<usize> {
    CLASS_LIST
        .iter()
        .position(|c| c.abbr == name || c.heading == name)
}

// any of: q < 1.3, e >= .5, i >= 40, Q > 10
fn is_mpc_interesting(q: f64, e: f64, i: f64, _h: f64) -> bool {
    q < 1.3 || e >= 0.5 || i >= 40. || q * (1. + e) / (1. - e) > 10.
}

fn is_neo(q: f64, _e: f64, _i: f64, _h: f64) -> bool {
    q < 1.3
}

// H rounded to nearest integer <= 22
fn is_neo_h22(q: f64, _e: f64, _i: f64, h: f64) -> bool {
    q < 1.3 && h < 22.5
}

// H rounded to nearest integer <= 18
fn is_neo_h18(q: f64, _e: f64, _i: f64, h: f64) -> bool {
    q < 1.3 && h < 18.5
}

// 1.3 <= q < 1.67, Q > 1.58
fn is_mars_crosser(q: f64, e: f64, _i: f64, _h: f64) -> bool {
    q < 1.67 && q >= 1.3 && q * (1. + e) / (1. - e) > 1.58
}

// 1.78 < a < 2, e <= .18, 16 <= i <= 34
fn is_hungaria(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if e > 0.18 || !(16. ..=34.).contains(&i) {
        return false;
    }
    let a = q / (1. - e);
    a < 2. && a > 1.78
}

// q >= 1.5, 2.2 < a < 2.45, 20 <= i <= 27
fn is_phocaea(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if q < 1.5 || !(20. ..=27.).contains(&i) {
        return false;
    }
    let a = q / (1. - e);
    a < 2.45 && a > 2.2
}

// q >= 1.67, 2.1 < a < 2.5, i below a line from 7° at the inner edge
// to 17° at the outer
fn is_inner_main_belt(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if q < 1.67 {
        return false;
    }
    let a = q / (1. - e);
    a < 2.5 && a > 2.1 && i < ((a - 2.1) / 0.4) * 10. + 7.
}

// 2.5 < a < 2.8, e <= .35, 24 <= i <= 37
fn is_pallas(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if e > 0.35 || !(24. ..=37.).contains(&i) {
        return false;
    }
    let a = q / (1. - e);
    a < 2.8 && a > 2.5
}

// 2.55 < a < 2.72, e <= .25, 20 <= i <= 23.5
fn is_hansa(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if e > 0.25 || !(20. ..=23.5).contains(&i) {
        return false;
    }
    let a = q / (1. - e);
    a < 2.72 && a > 2.55
}

// 2.5 < a < 2.8, e <= .45, i <= 20
fn is_middle_main_belt(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if e > 0.45 || i > 20. {
        return false;
    }
    let a = q / (1. - e);
    a < 2.8 && a > 2.5
}

// 2.8 < a < 3.25, e <= .4, i below a line from 20° at the inner edge
// to 36° at the outer
fn is_outer_main_belt(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if e > 0.4 {
        return false;
    }
    let a = q / (1. - e);
    a > 2.8 && a < 3.25 && i < ((a - 2.8) / 0.45) * 16. + 20.
}

// 3.9 < a < 4.02, e <= .4, i <= 18
fn is_hilda(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if i > 18. || e > 0.4 {
        return false;
    }
    let a = q / (1. - e);
    a > 3.9 && a < 4.02
}

// 5.05 < a < 5.35, e <= .22, i <= 38
fn is_jupiter_trojan(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if e > 0.22 || i > 38. {
        return false;
    }
    let a = q / (1. - e);
    a > 5.05 && a < 5.35
}

// q >= 1.3 and Tisserand parameter w.r.t. Jupiter between 2 and 3
fn is_jupiter_family_comet(q: f64, e: f64, i: f64, _h: f64) -> bool {
    if q < 1.3 {
        return false;
    }
    let tj = 5.2 * (1. - e) / q + 2. * (q * (1. + e) / 5.2).sqrt() * (i * RADEG).cos();
    tj < 3. && tj > 2.
}
