//! Field naming conventions: units of measure and regime-specific fields
//!
//! Field names coming out of the solver are loosely structured:
//! `U`, `Ux`, `U_x`, `mag(U)`, `UMean`, `thermo:psi`. Lookups first try the
//! name as written, then the wrapped name (`mag(U)` → `U`), then the name
//! with its component suffix removed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::Compressibility;

/// Units that do not depend on the compressibility regime
static UNITS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Time", "s"),
        ("U", "m/s"),
        ("T", "K"),
        ("rho", "kg/m3"),
        ("k", "m2/s2"),
        ("epsilon", "m2/s3"),
        ("omega", "1/s"),
        ("nut", "m2/s"),
        ("nu", "m2/s"),
        ("alphat", "kg/m/s"),
        ("vorticity", "1/s"),
        ("Q", "1/s2"),
        ("distance", "m"),
        ("x", "m"),
        ("y", "m"),
        ("z", "m"),
        ("forces", "N"),
        ("force", "N"),
        ("moments", "N m"),
        ("moment", "N m"),
    ])
});

/// Pressure-like fields: kinematic in incompressible solvers, Pa otherwise
const PRESSURE_LIKE: [&str; 4] = ["p", "p_rgh", "pMean", "wallShearStress"];

/// Fields that only carry meaning in compressible simulations
const COMPRESSIBLE_ONLY: [&str; 12] = [
    "rho", "psi", "Ma", "h", "e", "he", "gamma", "Cp", "Cv", "rhoU", "rhoE", "rhoPhi",
];

/// Reductions that keep the unit of their argument
const UNIT_PRESERVING: [&str; 8] = [
    "mag",
    "max",
    "min",
    "average",
    "areaAverage",
    "weightedAverage",
    "weightedAreaAverage",
    "volAverage",
];

/// Vector fields whose components are written as `Ux`, `Uy`, `Uz`
const VECTOR_NAMES: [&str; 5] = ["U", "UMean", "wallShearStress", "vorticity", "forces"];

static WRAPPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<op>[A-Za-z]+)\((?P<inner>[^()]*)\)$").expect("static regex")
});

/// Strip one `op(...)` wrapper when `op` preserves units
fn unwrap_reduction(name: &str) -> Option<&str> {
    let captures = WRAPPED.captures(name)?;
    let op = captures.name("op")?.as_str();
    UNIT_PRESERVING
        .contains(&op)
        .then(|| captures.name("inner").map(|m| m.as_str()))
        .flatten()
}

/// Strip any `op(...)` wrapper
fn unwrap_any(name: &str) -> &str {
    WRAPPED
        .captures(name)
        .and_then(|c| c.name("inner"))
        .map(|m| m.as_str())
        .unwrap_or(name)
}

/// Remove a component suffix (`_x`, `_mag`, `Ux` → `U`)
pub fn strip_component(name: &str) -> &str {
    for suffix in ["_x", "_y", "_z", "_mag"] {
        if let Some(base) = name.strip_suffix(suffix) {
            return base;
        }
    }
    for suffix in ["x", "y", "z"] {
        if let Some(base) = name.strip_suffix(suffix) {
            if VECTOR_NAMES.contains(&base) {
                return base;
            }
        }
    }
    name
}

/// Base quantity of a displayed name, used for regime checks
pub fn base_name(name: &str) -> &str {
    let name = strip_component(unwrap_any(name));
    name.strip_suffix("Prime2Mean")
        .or_else(|| name.strip_suffix("Mean"))
        .filter(|base| !base.is_empty())
        .unwrap_or(name)
}

fn lookup(name: &str, regime: Compressibility) -> Option<&'static str> {
    if PRESSURE_LIKE.contains(&name) {
        return Some(match regime {
            Compressibility::Incompressible => "m2/s2",
            Compressibility::Compressible => "Pa",
        });
    }
    UNITS.get(name).copied()
}

/// Unit of measure for a field or column name, if known
///
/// ```rust
/// use ofpost_rs::context::{units::unit_for, Compressibility};
///
/// assert_eq!(unit_for("mag(U)", Compressibility::Incompressible), Some("m/s"));
/// assert_eq!(unit_for("p", Compressibility::Compressible), Some("Pa"));
/// assert_eq!(unit_for("yPlus", Compressibility::Compressible), None);
/// ```
pub fn unit_for(name: &str, regime: Compressibility) -> Option<&'static str> {
    lookup(name, regime)
        .or_else(|| unwrap_reduction(name).and_then(|inner| lookup(inner, regime)))
        .or_else(|| lookup(strip_component(name), regime))
        .or_else(|| {
            name.strip_suffix("Mean")
                .and_then(|base| lookup(strip_component(base), regime))
        })
}

/// Label with the unit appended in brackets, as axis and legend text
pub fn with_unit(label: &str, unit: Option<&str>) -> String {
    match unit {
        Some(u) if !u.is_empty() => format!("{} [{}]", label, u),
        _ => label.to_string(),
    }
}

/// Whether a field name is known to hold a 3-vector
pub fn is_vector_name(name: &str) -> bool {
    VECTOR_NAMES.contains(&name)
}

/// Whether a field only makes sense in a compressible simulation
pub fn is_compressible_only(name: &str) -> bool {
    let base = base_name(name);
    base.starts_with("thermo:") || COMPRESSIBLE_ONLY.contains(&base)
}
