//! Hospital status document
//!
//! The single document this application reads and writes, stored at
//! `hospitalData/status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::ModelError;

/// Collection holding the status document
pub const STATUS_COLLECTION: &str = "hospitalData";

/// Document id of the status document
pub const STATUS_DOCUMENT: &str = "status";

/// Field the store fills with its own clock on every write
pub const LAST_UPDATED_FIELD: &str = "lastUpdated";

/// The eight tracked blood types, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::OPositive,
        BloodType::ONegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
    ];

    /// Key used in the stored document
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloodType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownBloodType(s.to_string()))
    }
}

/// Per-type blood unit counts. Always holds all eight types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<BloodType, i64>", into = "BTreeMap<BloodType, i64>")]
pub struct BloodUnits(BTreeMap<BloodType, i64>);

impl Default for BloodUnits {
    fn default() -> Self {
        Self(BloodType::ALL.into_iter().map(|t| (t, 0)).collect())
    }
}

impl From<BTreeMap<BloodType, i64>> for BloodUnits {
    fn from(map: BTreeMap<BloodType, i64>) -> Self {
        let mut units = Self::default();
        units.0.extend(map);
        units
    }
}

impl From<BloodUnits> for BTreeMap<BloodType, i64> {
    fn from(units: BloodUnits) -> Self {
        units.0
    }
}

impl BloodUnits {
    pub fn get(&self, blood_type: BloodType) -> i64 {
        self.0.get(&blood_type).copied().unwrap_or(0)
    }

    pub fn set(&mut self, blood_type: BloodType, units: i64) {
        self.0.insert(blood_type, units);
    }

    /// Sum over all eight counts, saturating at the `i64` bounds
    pub fn total(&self) -> i64 {
        self.0.values().fold(0i64, |acc, n| acc.saturating_add(*n))
    }

    /// Counts in display order
    pub fn iter(&self) -> impl Iterator<Item = (BloodType, i64)> + '_ {
        self.0.iter().map(|(t, n)| (*t, *n))
    }

    /// Lenient read of a stored `bloodUnits` map: unknown keys are ignored,
    /// missing or non-integer counts read as 0.
    fn from_value(value: &Map<String, Value>) -> Self {
        let mut units = Self::default();
        for blood_type in BloodType::ALL {
            units.set(blood_type, read_count(value.get(blood_type.as_str())));
        }
        units
    }
}

/// The hospital status document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HospitalStatus {
    pub blood_units: BloodUnits,
    pub oxygen_cylinders: i64,
    pub icu_beds: i64,
    pub general_beds: i64,
    pub doctors_available: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl HospitalStatus {
    /// Decode a stored document, reading missing or malformed fields as zero.
    ///
    /// Only a body that is not a JSON object is rejected.
    pub fn from_document(data: &Value) -> Result<Self, ModelError> {
        let object = data.as_object().ok_or(ModelError::NotAnObject)?;

        let blood_units = object
            .get("bloodUnits")
            .and_then(Value::as_object)
            .map(BloodUnits::from_value)
            .unwrap_or_default();

        let last_updated = object
            .get(LAST_UPDATED_FIELD)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Self {
            blood_units,
            oxygen_cylinders: read_count(object.get("oxygenCylinders")),
            icu_beds: read_count(object.get("icuBeds")),
            general_beds: read_count(object.get("generalBeds")),
            doctors_available: read_count(object.get("doctorsAvailable")),
            last_updated,
        })
    }

    pub fn total_blood_units(&self) -> i64 {
        self.blood_units.total()
    }

    pub fn total_beds(&self) -> i64 {
        self.icu_beds.saturating_add(self.general_beds)
    }
}

/// Read a count the way a falsy-to-zero fallback would: absent, null or
/// non-numeric values become 0.
///
/// Counts are whole units, so fractional values are truncated toward zero
/// (`4.7` reads as 4) instead of being carried through to the totals.
fn read_count(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blood_type_order_and_keys() {
        let keys: Vec<_> = BloodType::ALL.iter().map(|t| t.as_str()).collect();
        assert_eq!(keys, vec!["A+", "A-", "B+", "B-", "O+", "O-", "AB+", "AB-"]);
    }

    #[test]
    fn test_blood_type_parse() {
        assert_eq!("ab-".parse::<BloodType>().unwrap(), BloodType::AbNegative);
        assert_eq!(" O+ ".parse::<BloodType>().unwrap(), BloodType::OPositive);
        assert!("C+".parse::<BloodType>().is_err());
    }

    #[test]
    fn test_totals() {
        let mut status = HospitalStatus::default();
        for (i, blood_type) in BloodType::ALL.into_iter().enumerate() {
            status.blood_units.set(blood_type, i as i64 + 1);
        }
        status.icu_beds = 4;
        status.general_beds = 19;

        assert_eq!(status.total_blood_units(), 36);
        assert_eq!(status.total_beds(), 23);
    }

    #[test]
    fn test_totals_saturate_at_bounds() {
        let status =
            HospitalStatus::from_document(&json!({"icuBeds": i64::MAX, "generalBeds": 1})).unwrap();
        assert_eq!(status.total_beds(), i64::MAX);

        let mut status = HospitalStatus::default();
        status.blood_units.set(BloodType::APositive, i64::MAX);
        status.blood_units.set(BloodType::ONegative, i64::MAX);
        assert_eq!(status.total_blood_units(), i64::MAX);

        status.icu_beds = i64::MIN;
        status.general_beds = -1;
        assert_eq!(status.total_beds(), i64::MIN);
    }

    #[test]
    fn test_fractional_counts_truncate() {
        let status = HospitalStatus::from_document(&json!({"oxygenCylinders": 4.7})).unwrap();
        assert_eq!(status.oxygen_cylinders, 4);
    }

    #[test]
    fn test_serialize_uses_document_field_names() {
        let mut status = HospitalStatus::default();
        status.blood_units.set(BloodType::APositive, 5);
        status.oxygen_cylinders = 2;

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["bloodUnits"]["A+"], 5);
        assert_eq!(value["bloodUnits"]["AB-"], 0);
        assert_eq!(value["oxygenCylinders"], 2);
        assert!(value["lastUpdated"].is_null());
    }

    #[test]
    fn test_from_document_lenient() {
        let doc = json!({
            "bloodUnits": {"A+": 3, "B-": "many", "X+": 9},
            "icuBeds": 2,
            "generalBeds": null,
            "doctorsAvailable": 4.0,
            "lastUpdated": "2026-03-01T10:00:00Z"
        });

        let status = HospitalStatus::from_document(&doc).unwrap();
        assert_eq!(status.blood_units.get(BloodType::APositive), 3);
        assert_eq!(status.blood_units.get(BloodType::BNegative), 0);
        assert_eq!(status.total_blood_units(), 3);
        assert_eq!(status.oxygen_cylinders, 0);
        assert_eq!(status.icu_beds, 2);
        assert_eq!(status.general_beds, 0);
        assert_eq!(status.doctors_available, 4);
        assert!(status.last_updated.is_some());
    }

    #[test]
    fn test_from_document_missing_blood_units() {
        let status = HospitalStatus::from_document(&json!({"oxygenCylinders": 7})).unwrap();
        assert_eq!(status.blood_units, BloodUnits::default());
        assert_eq!(status.oxygen_cylinders, 7);
        assert!(status.last_updated.is_none());
    }

    #[test]
    fn test_from_document_rejects_non_object() {
        assert!(matches!(
            HospitalStatus::from_document(&json!([1, 2])),
            Err(ModelError::NotAnObject)
        ));
    }

    #[test]
    fn test_deserialize_partial_blood_units_fills_missing() {
        let status: HospitalStatus =
            serde_json::from_value(json!({"bloodUnits": {"O-": 1}})).unwrap();
        assert_eq!(status.blood_units.iter().count(), 8);
        assert_eq!(status.blood_units.get(BloodType::ONegative), 1);
    }
}
