//! Physical constants. Energies are in MeV.

/// Electron rest mass energy [MeV].
pub const ELECTRON_REST_MASS_ENERGY: f64 = 0.510_998_95;

/// Fine structure constant.
pub const FINE_STRUCTURE_CONSTANT: f64 = 7.297_352_569_3e-3;

/// Thomas-Fermi screening coefficient, (9π²/128)^(1/3).
pub const THOMAS_FERMI_COEFFICIENT: f64 = 0.885;
