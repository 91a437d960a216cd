//! Molecular weights and display labels for the gases used in atmospheric models.
//!
//! Molecules are identified by their canonical chemical formula (e.g. `"H2O"`,
//! `"CH4"`, `"N2"`, `"HE"`). Lookups ignore case so that both `"He"` and `"HE"`
//! resolve to helium.

use crate::errors::{TaurexError, TaurexResult};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Information about a known molecule.
#[derive(Debug, Clone)]
pub struct MoleculeInfo {
    /// The canonical formula of this molecule.
    pub formula: &'static str,
    /// Molecular weight in g/mol.
    pub weight: f64,
    /// LaTeX label used when presenting the molecule.
    pub texlabel: &'static str,
}

const fn molecule(formula: &'static str, weight: f64, texlabel: &'static str) -> MoleculeInfo {
    MoleculeInfo {
        formula,
        weight,
        texlabel,
    }
}

static MOLECULES: &[MoleculeInfo] = &[
    molecule("H", 1.00794, "H"),
    molecule("H2", 2.01588, "H$_2$"),
    molecule("HE", 4.002602, "He"),
    molecule("N2", 28.0134, "N$_2$"),
    molecule("O2", 31.9988, "O$_2$"),
    molecule("AR", 39.948, "Ar"),
    molecule("H2O", 18.01528, "H$_2$O"),
    molecule("CH4", 16.04246, "CH$_4$"),
    molecule("CO", 28.0101, "CO"),
    molecule("CO2", 44.0095, "CO$_2$"),
    molecule("NH3", 17.03052, "NH$_3$"),
    molecule("O3", 47.9982, "O$_3$"),
    molecule("NO", 30.0061, "NO"),
    molecule("N2O", 44.0128, "N$_2$O"),
    molecule("OH", 17.00734, "OH"),
    molecule("HCN", 27.0253, "HCN"),
    molecule("C2H2", 26.0373, "C$_2$H$_2$"),
    molecule("C2H4", 28.0532, "C$_2$H$_4$"),
    molecule("C2H6", 30.069, "C$_2$H$_6$"),
    molecule("H2S", 34.08088, "H$_2$S"),
    molecule("PH3", 33.99758, "PH$_3$"),
    molecule("SO2", 64.0638, "SO$_2$"),
    molecule("HCL", 36.46094, "HCl"),
    molecule("TIO", 63.8664, "TiO"),
    molecule("VO", 66.9409, "VO"),
    molecule("FEH", 56.85294, "FeH"),
    molecule("SIO", 44.0849, "SiO"),
    molecule("NA", 22.98977, "Na"),
    molecule("K", 39.0983, "K"),
];

/// Registry of known molecules keyed by upper-cased formula
#[derive(Debug)]
pub struct MoleculeRegistry {
    molecules: HashMap<String, MoleculeInfo>,
}

/// Global molecule registry.
pub static MOLECULE_REGISTRY: LazyLock<MoleculeRegistry> = LazyLock::new(MoleculeRegistry::new);

impl Default for MoleculeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MoleculeRegistry {
    pub fn new() -> Self {
        let molecules = MOLECULES
            .iter()
            .map(|m| (m.formula.to_uppercase(), m.clone()))
            .collect();
        Self { molecules }
    }

    /// Looks up a molecule by formula, ignoring case.
    pub fn lookup(&self, formula: &str) -> Option<&MoleculeInfo> {
        self.molecules.get(&formula.to_uppercase())
    }
}

/// Molecular weight of `gas` in g/mol
///
/// Fails with [`TaurexError::LookupFailure`] for an unknown identifier.
pub fn molecular_weight(gas: &str) -> TaurexResult<f64> {
    MOLECULE_REGISTRY
        .lookup(gas)
        .map(|m| m.weight)
        .ok_or_else(|| TaurexError::lookup("molecule", gas))
}

/// LaTeX label for `gas`, falling back to the identifier itself
pub fn molecule_texlabel(gas: &str) -> String {
    MOLECULE_REGISTRY
        .lookup(gas)
        .map(|m| m.texlabel.to_string())
        .unwrap_or_else(|| gas.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_background_gases() {
        assert_relative_eq!(molecular_weight("H2").unwrap(), 2.01588);
        assert_relative_eq!(molecular_weight("HE").unwrap(), 4.002602);
        assert_relative_eq!(molecular_weight("N2").unwrap(), 28.0134);
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(
            molecular_weight("He").unwrap(),
            molecular_weight("HE").unwrap()
        );
        assert_eq!(
            molecular_weight("h2o").unwrap(),
            molecular_weight("H2O").unwrap()
        );
    }

    #[test]
    fn test_unknown_molecule() {
        match molecular_weight("XYZ") {
            Err(TaurexError::LookupFailure { kind, name }) => {
                assert_eq!(kind, "molecule");
                assert_eq!(name, "XYZ");
            }
            other => panic!("Expected lookup failure, got {:?}", other),
        }
    }

    #[test]
    fn test_texlabel() {
        assert_eq!(molecule_texlabel("H2O"), "H$_2$O");
        assert_eq!(molecule_texlabel("CH4"), "CH$_4$");
        assert_eq!(molecule_texlabel("Unobtainium"), "Unobtainium");
    }

    #[test]
    fn test_table_has_no_duplicates() {
        assert_eq!(MOLECULE_REGISTRY.molecules.len(), MOLECULES.len());
    }
}
