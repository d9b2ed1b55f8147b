//! Company record schema and classification predicates
//!
//! Registry entries are JSON objects with four required identity fields and an
//! optional `data` section holding the primary activity code (ОКВЭД) and the
//! legal address. Only the fields used for filtering and for the output row
//! are decoded; everything else in the object is ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::districts::DistrictTable;
use crate::error::DecodeError;

/// Separator written after every address segment except the building
const ADDRESS_SEPARATOR: &str = ", ";

// ============================================================================
// Wire schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCompany {
    name: String,
    full_name: String,
    inn: String,
    kpp: String,
    data: Option<RawCompanyData>,
}

#[derive(Debug, Deserialize)]
struct RawCompanyData {
    #[serde(rename = "СвОКВЭД")]
    activity: Option<RawActivity>,
    #[serde(rename = "СвАдресЮЛ")]
    legal_address: Option<RawLegalAddress>,
}

#[derive(Debug, Deserialize)]
struct RawActivity {
    #[serde(rename = "СвОКВЭДОсн")]
    primary: Option<RawActivityCode>,
}

#[derive(Debug, Deserialize)]
struct RawActivityCode {
    #[serde(rename = "КодОКВЭД")]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLegalAddress {
    #[serde(rename = "АдресРФ")]
    russian: Option<RawAddress>,
}

#[derive(Debug, Deserialize)]
struct RawAddress {
    #[serde(rename = "Индекс")]
    index: Option<String>,
    #[serde(rename = "Регион")]
    region: Option<RawRegion>,
    #[serde(rename = "КодРегион")]
    region_code: Option<String>,
    #[serde(rename = "Город")]
    city: Option<RawCity>,
    #[serde(rename = "Улица")]
    street: Option<RawStreet>,
    #[serde(rename = "Дом")]
    building: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRegion {
    #[serde(rename = "НаимРегион")]
    name: Option<String>,
    #[serde(rename = "ТипРегион")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    #[serde(rename = "НаимГород")]
    name: Option<String>,
    #[serde(rename = "ТипГород")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStreet {
    #[serde(rename = "НаимУлица")]
    name: Option<String>,
    #[serde(rename = "ТипУлица")]
    kind: Option<String>,
}

/// Registry extracts use empty strings and nulls interchangeably for "absent"
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// Domain types
// ============================================================================

/// One decoded registry entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub full_name: String,
    /// Taxpayer identification number (ИНН)
    pub inn: String,
    /// Registration reason code (КПП)
    pub kpp: String,
    /// Primary activity classifier code, e.g. "62.01"
    pub industry_code: Option<String>,
    pub address: Option<Address>,
}

/// Legal address inside the Russian Federation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub postal_index: Option<String>,
    pub region: Option<AddressPart>,
    /// Two-digit region code, e.g. "77"
    pub region_code: Option<String>,
    pub city: Option<AddressPart>,
    pub street: Option<AddressPart>,
    pub building: Option<String>,
}

/// A named address component with its type abbreviation ("г.", "ул.", ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressPart {
    pub name: Option<String>,
    pub kind: Option<String>,
}

impl AddressPart {
    fn new(name: Option<String>, kind: Option<String>) -> Self {
        Self {
            name: present(name),
            kind: present(kind),
        }
    }

    /// `kind + joiner + name`, or just the name when the type is missing.
    /// `None` without a name.
    fn render(&self, joiner: &str) -> Option<String> {
        let name = self.name.as_deref()?;
        Some(match self.kind.as_deref() {
            Some(kind) => format!("{kind}{joiner}{name}"),
            None => name.to_string(),
        })
    }
}

impl From<RawAddress> for Address {
    fn from(raw: RawAddress) -> Self {
        Self {
            postal_index: present(raw.index),
            region: raw.region.map(|r| AddressPart::new(r.name, r.kind)),
            region_code: present(raw.region_code),
            city: raw.city.map(|c| AddressPart::new(c.name, c.kind)),
            street: raw.street.map(|s| AddressPart::new(s.name, s.kind)),
            building: present(raw.building),
        }
    }
}

impl From<RawCompany> for Record {
    fn from(raw: RawCompany) -> Self {
        let (activity, legal_address) = match raw.data {
            Some(data) => (data.activity, data.legal_address),
            None => (None, None),
        };

        let industry_code = activity
            .and_then(|a| a.primary)
            .and_then(|p| present(p.code));
        let address = legal_address
            .and_then(|a| a.russian)
            .map(Address::from);

        Self {
            name: raw.name,
            full_name: raw.full_name,
            inn: raw.inn,
            kpp: raw.kpp,
            industry_code,
            address,
        }
    }
}

/// The tuple persisted for every matching record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRow {
    pub name: String,
    pub full_name: String,
    /// Primary activity classifier code
    pub okved: String,
    pub inn: String,
    pub kpp: String,
    pub address: String,
}

impl CompanyRow {
    /// Build the output row; `None` when the record has no activity code
    pub fn from_record(record: &Record) -> Option<Self> {
        let okved = record.industry_code.clone()?;
        Some(Self {
            name: record.name.clone(),
            full_name: record.full_name.clone(),
            okved,
            inn: record.inn.clone(),
            kpp: record.kpp.clone(),
            address: assemble_address(record),
        })
    }
}

impl Record {
    pub fn to_row(&self) -> Option<CompanyRow> {
        CompanyRow::from_record(self)
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Decode one raw JSON object into a [`Record`].
///
/// The identity fields `name`, `full_name`, `inn` and `kpp` must be present
/// strings. Missing levels of the nested `data` section decode to `None`.
pub fn decode(raw: &Value) -> Result<Record, DecodeError> {
    if !raw.is_object() {
        return Err(DecodeError::NotAnObject);
    }
    let company = RawCompany::deserialize(raw)?;
    Ok(Record::from(company))
}

/// True iff the primary activity code starts with `prefix`
pub fn matches_industry(record: &Record, prefix: &str) -> bool {
    record
        .industry_code
        .as_deref()
        .is_some_and(|code| code.starts_with(prefix))
}

/// Cross-check the region code and region name against the district table.
///
/// The code is looked up among region keys and the uppercased name among
/// region values; the record matches only when both resolve to the same
/// federal district. A missing code or name, or either one unknown to every
/// district, never matches.
pub fn matches_district(record: &Record, table: &DistrictTable) -> bool {
    let Some(address) = record.address.as_ref() else {
        return false;
    };
    let region_name = address.region.as_ref().and_then(|r| r.name.as_deref());
    let (Some(region_name), Some(region_code)) = (region_name, address.region_code.as_deref())
    else {
        return false;
    };

    let region_name = region_name.to_uppercase();
    match (
        table.district_by_code(region_code),
        table.district_by_name(&region_name),
    ) {
        (Some(by_code), Some(by_name)) => by_code.name == by_name.name,
        _ => false,
    }
}

/// Build the display address.
///
/// Segments in order: postal index, region (`type name`), city (`typename`),
/// street (`typename`), building. Each segment but the building is followed
/// by `", "`; absent segments are skipped, so an address without a building
/// keeps the trailing separator of the last segment written.
pub fn assemble_address(record: &Record) -> String {
    let mut out = String::new();
    let Some(address) = record.address.as_ref() else {
        return out;
    };

    let segments = [
        address.postal_index.clone(),
        address.region.as_ref().and_then(|r| r.render(" ")),
        address.city.as_ref().and_then(|c| c.render("")),
        address.street.as_ref().and_then(|s| s.render("")),
    ];
    for segment in segments.into_iter().flatten() {
        out.push_str(&segment);
        out.push_str(ADDRESS_SEPARATOR);
    }

    if let Some(building) = address.building.as_deref() {
        out.push_str(building);
    }

    out
}
