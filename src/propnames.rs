//! Purpose: Constants for the conventional property names of computation records.
//! Exports: Property-name string constants.
//! Role: Shared vocabulary so different callers agree on key spelling.
//! Invariants: Pure data; values are stable once published.
//!
//! Records carry no schema, so interoperability rests on callers spelling
//! property names the same way. Using these constants instead of bare string
//! literals lets the compiler catch the typos the store itself never will.

/// The configuration of the structure being computed, usually a name.
pub const CONFIGURATION: &str = "configuration";

/// The computational methodology, usually a method name; richer structures
/// are allowed when finer recording is wanted.
pub const METHOD: &str = "method";

/// Atomic coordinates: a list of element symbol plus three floats, in Angstrom.
pub const COORDINATES: &str = "coordinates";

/// The electronic energy of the system, in Hartree.
pub const ELECTRON_ENERGY: &str = "electron_energy";

/// The zero-point correction to the base energy, in Hartree.
pub const ZERO_POINT_CORRECTION: &str = "zero_point_correction";

/// The thermal correction to the Gibbs free energy, in Hartree.
pub const GIBBS_THERMAL_CORRECTION: &str = "gibbs_thermal_correction";

/// The counterpoise correction for the basis set superposition error, in Hartree.
pub const COUNTERPOISE_CORRECTION: &str = "counterpoise_correction";
