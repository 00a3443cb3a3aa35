//! Feature-code taxonomy for GeoNames entities.
//!
//! Every entity carries a [`GeoType`] decoded from the dump's feature code
//! column. The numeric values are stable: they are persisted in the index
//! file, so reordering or renumbering them invalidates existing maps.
//! Odd values mark historical/secondary variants that the builder drops.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Classification of a geographic entity.
///
/// Three families (political, administrative, populated/area) plus the
/// `Undef` sentinel for anything the parser does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GeoType {
    Undef = 0,

    PolitIndep = 2,
    PolitSect = 4,
    PolitFree = 6,
    PolitSemi = 8,
    PolitDep = 10,
    PolitHist = 11,

    Adm1 = 12,
    Adm2 = 14,
    Adm3 = 16,
    Adm4 = 18,
    Adm5 = 20,
    AdmDiv = 22,
    AdmHist1 = 23,
    AdmHist2 = 25,
    AdmHist3 = 27,
    AdmHist4 = 29,
    AdmHistDiv = 31,

    PopulCap = 32,
    PopulGov = 34,
    PopulAdm1 = 36,
    PopulAdm2 = 38,
    PopulAdm3 = 40,
    PopulAdm4 = 42,
    PopulPlace = 44,
    Popul = 46,
    PopulSect = 47,
    PopulFarm = 49,
    PopulLoc = 51,
    PopulRelig = 53,
    PopulAbandoned = 55,
    PopulDestroyed = 57,
    PopulHist = 59,
    PopulCapHist = 61,

    AreaRegion = 62,
    AreaRegionEcon = 64,
    AreaRegionHist = 65,
}

/// First value past the administrative range; everything at or above it is
/// treated as a city by [`GeoType::is_city`].
const ADM_END: u32 = 32;

/// Feature codes as they appear in column 7 of the dump.
const TYPE_CODES: &[(GeoType, &str)] = &[
    (GeoType::PolitIndep, "PCLI"),
    (GeoType::PolitSect, "PCLIX"),
    (GeoType::PolitFree, "PCLF"),
    (GeoType::PolitSemi, "PCLS"),
    (GeoType::PolitDep, "PCLD"),
    (GeoType::PolitHist, "PCLH"),
    (GeoType::Adm1, "ADM1"),
    (GeoType::Adm2, "ADM2"),
    (GeoType::Adm3, "ADM3"),
    (GeoType::Adm4, "ADM4"),
    (GeoType::Adm5, "ADM5"),
    (GeoType::AdmDiv, "ADMD"),
    (GeoType::AdmHist1, "ADM1H"),
    (GeoType::AdmHist2, "ADM2H"),
    (GeoType::AdmHist3, "ADM3H"),
    (GeoType::AdmHist4, "ADM4H"),
    (GeoType::AdmHistDiv, "ADMDH"),
    (GeoType::PopulCap, "PPLC"),
    (GeoType::PopulGov, "PPLG"),
    (GeoType::PopulAdm1, "PPLA"),
    (GeoType::PopulAdm2, "PPLA2"),
    (GeoType::PopulAdm3, "PPLA3"),
    (GeoType::PopulAdm4, "PPLA4"),
    (GeoType::PopulPlace, "PPLS"),
    (GeoType::Popul, "PPL"),
    (GeoType::PopulSect, "PPLX"),
    (GeoType::PopulFarm, "PPLF"),
    (GeoType::PopulLoc, "PPLL"),
    (GeoType::PopulRelig, "PPLR"),
    (GeoType::PopulAbandoned, "PPLQ"),
    (GeoType::PopulDestroyed, "PPLW"),
    (GeoType::PopulHist, "PPLH"),
    (GeoType::PopulCapHist, "PPLCH"),
    (GeoType::AreaRegion, "RGN"),
    (GeoType::AreaRegionEcon, "RGNE"),
    (GeoType::AreaRegionHist, "RGNH"),
];

static CODE_TO_TYPE: Lazy<HashMap<&'static str, GeoType>> =
    Lazy::new(|| TYPE_CODES.iter().map(|&(t, c)| (c, t)).collect());

impl GeoType {
    /// Decodes a feature code (e.g. `"PPLA"`); unknown codes map to `Undef`.
    pub fn from_code(code: &str) -> GeoType {
        CODE_TO_TYPE.get(code).copied().unwrap_or(GeoType::Undef)
    }

    /// The textual feature code, or `""` for `Undef`.
    pub fn to_code(self) -> &'static str {
        TYPE_CODES
            .iter()
            .find(|&&(t, _)| t == self)
            .map(|&(_, c)| c)
            .unwrap_or("")
    }

    /// Decodes the persisted numeric value; unknown values map to `Undef`.
    pub fn from_u32(value: u32) -> GeoType {
        TYPE_CODES
            .iter()
            .find(|&&(t, _)| t as u32 == value)
            .map(|&(t, _)| t)
            .unwrap_or(GeoType::Undef)
    }

    /// Marker for the secondary/historical feature set, dropped on ingest.
    pub fn is_extra(self) -> bool {
        (self as u32) & 1 == 1
    }

    pub fn is_country(self) -> bool {
        self == GeoType::PolitIndep
    }

    pub fn is_province(self) -> bool {
        self == GeoType::Adm1
    }

    pub fn is_city(self) -> bool {
        self as u32 >= ADM_END
    }
}
