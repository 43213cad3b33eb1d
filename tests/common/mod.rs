// Shared fixtures for the integration tests.
#![allow(dead_code)]

use mc_collision::{build_atom, Atom, AtomData, CollisionConfig};

pub const CUTOFF_COSINE: f64 = 0.999999;

/// Gold-like tables: electron channels on a 1-100 MeV grid, photon channels
/// on a 1 keV-10 MeV grid.
pub const GOLD_TABLES: &str = r#"{
    "name": "Au",
    "atomic_number": 79,
    "electron_energy_grid": [1.0, 10.0, 100.0],
    "elastic": {
        "cutoff_cosine": 0.999999,
        "cutoff_cross_section": { "values": [3.0, 2.0, 1.0] },
        "total_cross_section": { "values": [10.0, 10.0, 10.0] },
        "moment_preserving_cross_section": { "values": [1.0, 1.0], "threshold_index": 1 },
        "cutoff_distribution": {
            "bins": [
                { "energy": 1.0, "outgoing": [-1.0, 0.0, 0.9, 0.999999], "pdf": [0.01, 0.1, 10.0, 1000.0] },
                { "energy": 100.0, "outgoing": [-1.0, 0.0, 0.9, 0.999999], "pdf": [0.01, 0.1, 10.0, 5000.0] }
            ],
            "scheme": "LinLin"
        }
    },
    "bremsstrahlung": {
        "cross_section": { "values": [0.5, 0.5, 0.5] },
        "photon_energy": {
            "bins": [
                { "energy": 1.0, "outgoing": [1e-4, 1.0], "pdf": [2.0, 1.0] },
                { "energy": 100.0, "outgoing": [1e-4, 100.0], "pdf": [2.0, 1.0] }
            ]
        }
    },
    "ionization": [
        {
            "subshell": 1,
            "binding_energy": 0.08,
            "cross_section": { "values": [0.1, 0.1, 0.1] },
            "knock_on_energy": {
                "bins": [
                    { "energy": 1.0, "outgoing": [1e-4, 0.46], "pdf": [2.0, 1.0] },
                    { "energy": 100.0, "outgoing": [1e-4, 49.96], "pdf": [2.0, 1.0] }
                ]
            }
        },
        {
            "subshell": 2,
            "binding_energy": 0.01,
            "cross_section": { "values": [0.2, 0.2], "threshold_index": 1 },
            "knock_on_energy": {
                "bins": [
                    { "energy": 1.0, "outgoing": [1e-4, 0.495], "pdf": [2.0, 1.0] },
                    { "energy": 100.0, "outgoing": [1e-4, 49.995], "pdf": [2.0, 1.0] }
                ]
            }
        }
    ],
    "excitation": {
        "cross_section": { "values": [1.0, 1.0, 1.0] },
        "energy_loss_energies": [1.0, 100.0],
        "energy_loss": [1e-5, 2e-5]
    },
    "photoatomic": {
        "energy_grid": [1e-3, 1.0, 10.0],
        "incoherent_cross_section": { "values": [1.0, 2.0, 1.0] },
        "photoelectric_cross_section": { "values": [5.0, 0.1, 0.01] },
        "photoelectron_binding_energy": 0.08
    }
}"#;

pub fn gold_tables() -> AtomData {
    AtomData::from_json_str(GOLD_TABLES).unwrap()
}

pub fn gold(number_density: f64, config: &CollisionConfig) -> Atom {
    build_atom(&gold_tables(), number_density, config).unwrap()
}
