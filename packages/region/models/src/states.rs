//! Mexican state catalog.
//!
//! Maps INEGI state codes to the short names used in reports, the official
//! names used by SESNSP and CONAPO files, and the INE abbreviations. Name
//! resolution goes through a static alias table so incidence and population
//! datasets join even when they spell a state differently.

use crate::{NATIONAL_LABEL, RegionKey, StateCode};

/// One entry of the state catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    /// Numeric INEGI code.
    pub code: u8,
    /// Common short name (e.g. `"Coahuila"`).
    pub name: &'static str,
    /// Official long-form name (e.g. `"Coahuila de Zaragoza"`).
    pub official_name: &'static str,
    /// Electoral abbreviation (e.g. `"COAH"`).
    pub abbreviation: &'static str,
}

const fn info(
    code: u8,
    name: &'static str,
    official_name: &'static str,
    abbreviation: &'static str,
) -> StateInfo {
    StateInfo {
        code,
        name,
        official_name,
        abbreviation,
    }
}

/// All 32 states in code order.
pub const STATES: &[StateInfo] = &[
    info(1, "Aguascalientes", "Aguascalientes", "AGS"),
    info(2, "Baja California", "Baja California", "BC"),
    info(3, "Baja California Sur", "Baja California Sur", "BCS"),
    info(4, "Campeche", "Campeche", "CAMP"),
    info(5, "Coahuila", "Coahuila de Zaragoza", "COAH"),
    info(6, "Colima", "Colima", "COL"),
    info(7, "Chiapas", "Chiapas", "CHIS"),
    info(8, "Chihuahua", "Chihuahua", "CHIH"),
    info(9, "Ciudad de México", "Ciudad de México", "CDMX"),
    info(10, "Durango", "Durango", "DGO"),
    info(11, "Guanajuato", "Guanajuato", "GTO"),
    info(12, "Guerrero", "Guerrero", "GRO"),
    info(13, "Hidalgo", "Hidalgo", "HGO"),
    info(14, "Jalisco", "Jalisco", "JAL"),
    info(15, "Estado de México", "México", "MEX"),
    info(16, "Michoacán", "Michoacán de Ocampo", "MICH"),
    info(17, "Morelos", "Morelos", "MOR"),
    info(18, "Nayarit", "Nayarit", "NAY"),
    info(19, "Nuevo León", "Nuevo León", "NL"),
    info(20, "Oaxaca", "Oaxaca", "OAX"),
    info(21, "Puebla", "Puebla", "PUE"),
    info(22, "Querétaro", "Querétaro", "QRO"),
    info(23, "Quintana Roo", "Quintana Roo", "QROO"),
    info(24, "San Luis Potosí", "San Luis Potosí", "SLP"),
    info(25, "Sinaloa", "Sinaloa", "SIN"),
    info(26, "Sonora", "Sonora", "SON"),
    info(27, "Tabasco", "Tabasco", "TAB"),
    info(28, "Tamaulipas", "Tamaulipas", "TAMPS"),
    info(29, "Tlaxcala", "Tlaxcala", "TLAX"),
    info(30, "Veracruz", "Veracruz de Ignacio de la Llave", "VER"),
    info(31, "Yucatán", "Yucatán", "YUC"),
    info(32, "Zacatecas", "Zacatecas", "ZAC"),
];

/// Spellings that are neither the short nor the official name but appear
/// in published files.
const ALIASES: &[(&str, u8)] = &[
    ("Distrito Federal", 9),
    ("Estado de Mexico", 15),
    ("Querétaro de Arteaga", 22),
    ("Michoacan", 16),
    ("Nuevo Leon", 19),
    ("Yucatan", 31),
    ("San Luis Potosi", 24),
    ("Queretaro", 22),
    ("Ciudad de Mexico", 9),
];

/// Names that refer to the whole country.
const NATIONAL_NAMES: &[&str] = &[NATIONAL_LABEL, "Estados Unidos Mexicanos", "República Mexicana"];

/// Looks up the catalog entry for a state code.
#[must_use]
pub fn state_info(code: StateCode) -> &'static StateInfo {
    // StateCode is validated to 1..=32, so the index is always in range.
    &STATES[usize::from(code.value()) - 1]
}

/// Short display name for a state (`"Coahuila"`, `"Estado de México"`).
#[must_use]
pub fn state_name(code: StateCode) -> &'static str {
    state_info(code).name
}

/// Electoral abbreviation for a state (`"CDMX"`).
#[must_use]
pub fn state_abbr(code: StateCode) -> &'static str {
    state_info(code).abbreviation
}

/// Resolves a state or country name to a region key.
///
/// Accepts short names, official names, known aliases and the national
/// names, compared case-insensitively after trimming. Returns `None` for an
/// unknown name; callers treat that as a data error.
#[must_use]
pub fn resolve_name(name: &str) -> Option<RegionKey> {
    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }

    if NATIONAL_NAMES
        .iter()
        .any(|candidate| candidate.to_lowercase() == wanted)
    {
        return Some(RegionKey::National);
    }

    let code = STATES
        .iter()
        .find(|state| {
            state.name.to_lowercase() == wanted || state.official_name.to_lowercase() == wanted
        })
        .map(|state| state.code)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| alias.to_lowercase() == wanted)
                .map(|(_, code)| *code)
        })?;

    StateCode::new(u32::from(code)).ok().map(RegionKey::State)
}

/// Human-readable label for any region key: the state short name, the
/// padded municipality code, or [`NATIONAL_LABEL`].
#[must_use]
pub fn region_label(key: RegionKey) -> String {
    match key {
        RegionKey::National => NATIONAL_LABEL.to_string(),
        RegionKey::State(code) => state_name(code).to_string(),
        RegionKey::Municipality(code) => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(code: u32) -> StateCode {
        StateCode::new(code).unwrap()
    }

    #[test]
    fn catalog_is_in_code_order() {
        assert_eq!(STATES.len(), 32);
        for (i, entry) in STATES.iter().enumerate() {
            assert_eq!(usize::from(entry.code), i + 1, "out of order: {}", entry.name);
        }
    }

    #[test]
    fn abbreviations_and_names() {
        assert_eq!(state_abbr(state(9)), "CDMX");
        assert_eq!(state_name(state(15)), "Estado de México");
        assert_eq!(state_info(state(30)).official_name, "Veracruz de Ignacio de la Llave");
    }

    #[test]
    fn resolves_official_and_short_names() {
        assert_eq!(resolve_name("Coahuila de Zaragoza"), Some(RegionKey::State(state(5))));
        assert_eq!(resolve_name("Coahuila"), Some(RegionKey::State(state(5))));
        assert_eq!(resolve_name("México"), Some(RegionKey::State(state(15))));
        assert_eq!(resolve_name("Estado de México"), Some(RegionKey::State(state(15))));
        assert_eq!(
            resolve_name("Veracruz de Ignacio de la Llave"),
            Some(RegionKey::State(state(30)))
        );
    }

    #[test]
    fn resolves_aliases_case_insensitively() {
        assert_eq!(resolve_name("distrito federal"), Some(RegionKey::State(state(9))));
        assert_eq!(resolve_name("  MICHOACÁN DE OCAMPO "), Some(RegionKey::State(state(16))));
    }

    #[test]
    fn resolves_national_names() {
        assert_eq!(resolve_name("Estados Unidos Mexicanos"), Some(RegionKey::National));
        assert_eq!(resolve_name("Nacional"), Some(RegionKey::National));
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(resolve_name("Texas"), None);
        assert_eq!(resolve_name(""), None);
    }

    #[test]
    fn every_catalog_name_resolves_to_its_code() {
        for entry in STATES {
            let expected = Some(RegionKey::State(state(u32::from(entry.code))));
            assert_eq!(resolve_name(entry.name), expected, "{}", entry.name);
            assert_eq!(resolve_name(entry.official_name), expected, "{}", entry.official_name);
        }
    }
}
