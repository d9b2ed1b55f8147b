//! Federal district classification table
//!
//! Maps each of the eight federal districts to its regions, keyed by the
//! two-digit, zero-padded region code with the uppercase region name as the
//! value. Names are spelled exactly as they appear in registry addresses.

/// One federal district and the regions it contains
#[derive(Debug, PartialEq, Eq)]
pub struct FederalDistrict {
    pub name: &'static str,
    /// `(region code, region name)` pairs
    pub regions: &'static [(&'static str, &'static str)],
}

impl FederalDistrict {
    pub fn contains_code(&self, code: &str) -> bool {
        self.regions.iter().any(|(c, _)| *c == code)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.regions.iter().any(|(_, n)| *n == name)
    }
}

pub const CENTRAL: FederalDistrict = FederalDistrict {
    name: "ЦЕНТРАЛЬНЫЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("31", "БЕЛГОРОДСКАЯ"),
        ("32", "БРЯНСКАЯ"),
        ("33", "ВЛАДИМИРСКАЯ"),
        ("36", "ВОРОНЕЖСКАЯ"),
        ("37", "ИВАНОВСКАЯ"),
        ("40", "КАЛУЖСКАЯ"),
        ("44", "КОСТРОМСКАЯ"),
        ("46", "КУРСКАЯ"),
        ("48", "ЛИПЕЦКАЯ"),
        ("77", "МОСКВА"),
        ("50", "МОСКОВСКАЯ"),
        ("57", "ОРЛОВСКАЯ"),
        ("62", "РЯЗАНСКАЯ"),
        ("67", "СМОЛЕНСКАЯ"),
        ("68", "ТАМБОВСКАЯ"),
        ("69", "ТВЕРСКАЯ"),
        ("71", "ТУЛЬСКАЯ"),
        ("76", "ЯРОСЛАВСКАЯ"),
    ],
};

pub const NORTHWESTERN: FederalDistrict = FederalDistrict {
    name: "СЕВЕРО-ЗАПАДНЫЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("29", "АРХАНГЕЛЬСКАЯ"),
        ("35", "ВОЛОГОДСКАЯ"),
        ("39", "КАЛИНИНГРАДСКАЯ"),
        ("10", "КАРЕЛИЯ"),
        ("11", "КОМИ"),
        ("47", "ЛЕНИНГРАДСКАЯ"),
        ("51", "МУРМАНСКАЯ"),
        ("83", "НЕНЕЦКИЙ"),
        ("53", "НОВГОРОДСКАЯ"),
        ("60", "ПСКОВСКАЯ"),
        ("78", "САНКТ-ПЕТЕРБУРГ"),
    ],
};

pub const SOUTHERN: FederalDistrict = FederalDistrict {
    name: "ЮЖНЫЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("01", "АДЫГЕЯ"),
        ("30", "АСТРАХАНСКАЯ"),
        ("34", "ВОЛГОГРАДСКАЯ"),
        ("08", "КАЛМЫКИЯ"),
        ("23", "КРАСНОДАРСКИЙ"),
        ("91", "КРЫМ"),
        ("61", "РОСТОВСКАЯ"),
        ("92", "СЕВАСТОПОЛЬ"),
    ],
};

pub const NORTH_CAUCASIAN: FederalDistrict = FederalDistrict {
    name: "СЕВЕРО-КАВКАЗСКИЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("05", "ДАГЕСТАН"),
        ("06", "ИНГУШЕТИЯ"),
        ("07", "КАБАРДИНО-БАЛКАРСКАЯ"),
        ("09", "КАРАЧАЕВО-ЧЕРКЕССКАЯ"),
        ("15", "СЕВЕРНАЯ ОСЕТИЯ - АЛАНИЯ"),
        ("26", "СТАВРОПОЛЬСКИЙ"),
        ("20", "ЧЕЧЕНСКАЯ"),
    ],
};

pub const VOLGA: FederalDistrict = FederalDistrict {
    name: "ПРИВОЛЖСКИЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("02", "БАШКОРТОСТАН"),
        ("43", "КИРОВСКАЯ"),
        ("12", "МАРИЙ ЭЛ"),
        ("13", "МОРДОВИЯ"),
        ("52", "НИЖЕГОРОДСКАЯ"),
        ("56", "ОРЕНБУРГСКАЯ"),
        ("58", "ПЕНЗЕНСКАЯ"),
        ("59", "ПЕРМСКИЙ"),
        ("63", "САМАРСКАЯ"),
        ("64", "САРАТОВСКАЯ"),
        ("16", "ТАТАРСТАН"),
        ("18", "УДМУРТСКАЯ"),
        ("73", "УЛЬЯНОВСКАЯ"),
        ("21", "ЧУВАШСКАЯ"),
    ],
};

pub const URAL: FederalDistrict = FederalDistrict {
    name: "УРАЛЬСКИЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("45", "КУРГАНСКАЯ"),
        ("66", "СВЕРДЛОВСКАЯ"),
        ("72", "ТЮМЕНСКАЯ"),
        ("86", "ХАНТЫ-МАНСИЙСКИЙ"),
        ("74", "ЧЕЛЯБИНСКАЯ"),
        ("89", "ЯМАЛО-НЕНЕЦКИЙ"),
    ],
};

pub const SIBERIAN: FederalDistrict = FederalDistrict {
    name: "СИБИРСКИЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("04", "АЛТАЙ"),
        ("22", "АЛТАЙСКИЙ"),
        ("38", "ИРКУТСКАЯ"),
        ("42", "КЕМЕРОВСКАЯ"),
        ("24", "КРАСНОЯРСКИЙ"),
        ("54", "НОВОСИБИРСКАЯ"),
        ("55", "ОМСКАЯ"),
        ("70", "ТОМСКАЯ"),
        ("17", "ТЫВА"),
        ("19", "ХАКАСИЯ"),
    ],
};

pub const FAR_EASTERN: FederalDistrict = FederalDistrict {
    name: "ДАЛЬНЕВОСТОЧНЫЙ ФЕДЕРАЛЬНЫЙ ОКРУГ",
    regions: &[
        ("28", "АМУРСКАЯ"),
        ("03", "БУРЯТИЯ"),
        ("79", "ЕВРЕЙСКАЯ"),
        ("75", "ЗАБАЙКАЛЬСКИЙ"),
        ("41", "КАМЧАТСКИЙ"),
        ("49", "МАГАДАНСКАЯ"),
        ("25", "ПРИМОРСКИЙ"),
        ("14", "САХА /ЯКУТИЯ/"),
        ("65", "САХАЛИНСКАЯ"),
        ("27", "ХАБАРОВСКИЙ"),
        ("87", "ЧУКОТСКИЙ"),
    ],
};

static FEDERAL_DISTRICTS: [FederalDistrict; 8] = [
    CENTRAL,
    NORTHWESTERN,
    SOUTHERN,
    NORTH_CAUCASIAN,
    VOLGA,
    URAL,
    SIBERIAN,
    FAR_EASTERN,
];

/// Read-only view over a set of federal districts
///
/// The table is `Copy` and holds only `'static` data, so every chunk task
/// gets its own handle without synchronization.
#[derive(Debug, Clone, Copy)]
pub struct DistrictTable {
    districts: &'static [FederalDistrict],
}

impl DistrictTable {
    /// The embedded table of all eight federal districts
    pub fn standard() -> Self {
        Self {
            districts: &FEDERAL_DISTRICTS,
        }
    }

    /// Build a table over an explicit set of districts
    pub fn new(districts: &'static [FederalDistrict]) -> Self {
        Self { districts }
    }

    pub fn districts(&self) -> &'static [FederalDistrict] {
        self.districts
    }

    /// District whose region map has `code` as a key
    pub fn district_by_code(&self, code: &str) -> Option<&'static FederalDistrict> {
        self.districts.iter().find(|d| d.contains_code(code))
    }

    /// District whose region map has `name` as a value (exact match, uppercase)
    pub fn district_by_name(&self, name: &str) -> Option<&'static FederalDistrict> {
        self.districts.iter().find(|d| d.contains_name(name))
    }

    pub fn region_count(&self) -> usize {
        self.districts.iter().map(|d| d.regions.len()).sum()
    }
}

impl Default for DistrictTable {
    fn default() -> Self {
        Self::standard()
    }
}
