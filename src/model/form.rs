//! Editable resource form values
//!
//! The local copy of the status document that the Resources view edits,
//! plus the input coercion applied to every keystroke.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::status::{BloodType, BloodUnits, HospitalStatus};
use super::ModelError;

/// A single editable field of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceField {
    BloodUnits(BloodType),
    OxygenCylinders,
    IcuBeds,
    GeneralBeds,
    DoctorsAvailable,
}

impl ResourceField {
    /// All fields in form order
    pub fn all() -> impl Iterator<Item = ResourceField> {
        BloodType::ALL
            .into_iter()
            .map(ResourceField::BloodUnits)
            .chain([
                ResourceField::OxygenCylinders,
                ResourceField::DoctorsAvailable,
                ResourceField::IcuBeds,
                ResourceField::GeneralBeds,
            ])
    }
}

impl fmt::Display for ResourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceField::BloodUnits(t) => write!(f, "bloodUnits.{}", t),
            ResourceField::OxygenCylinders => f.write_str("oxygenCylinders"),
            ResourceField::IcuBeds => f.write_str("icuBeds"),
            ResourceField::GeneralBeds => f.write_str("generalBeds"),
            ResourceField::DoctorsAvailable => f.write_str("doctorsAvailable"),
        }
    }
}

impl FromStr for ResourceField {
    type Err = ModelError;

    /// Parse a field path such as `bloodUnits.A+` or `icuBeds`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(blood_type) = s.strip_prefix("bloodUnits.") {
            return blood_type
                .parse()
                .map(ResourceField::BloodUnits)
                .map_err(|_| ModelError::UnknownField(s.to_string()));
        }

        match s {
            "oxygenCylinders" => Ok(ResourceField::OxygenCylinders),
            "icuBeds" => Ok(ResourceField::IcuBeds),
            "generalBeds" => Ok(ResourceField::GeneralBeds),
            "doctorsAvailable" => Ok(ResourceField::DoctorsAvailable),
            _ => Err(ModelError::UnknownField(s.to_string())),
        }
    }
}

/// Coerce raw input to a count.
///
/// Parses an optional sign and the leading run of digits after any leading
/// whitespace. Input without a leading number, or one that overflows, is 0.
pub fn coerce_count(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());

    rest[..digits_end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(0)
}

/// Local form state, seeded to zero
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceForm {
    pub blood_units: BloodUnits,
    pub oxygen_cylinders: i64,
    pub icu_beds: i64,
    pub general_beds: i64,
    pub doctors_available: i64,
}

impl ResourceForm {
    pub fn get(&self, field: ResourceField) -> i64 {
        match field {
            ResourceField::BloodUnits(t) => self.blood_units.get(t),
            ResourceField::OxygenCylinders => self.oxygen_cylinders,
            ResourceField::IcuBeds => self.icu_beds,
            ResourceField::GeneralBeds => self.general_beds,
            ResourceField::DoctorsAvailable => self.doctors_available,
        }
    }

    /// Return a copy with one field replaced by the coerced input
    pub fn with_input(&self, field: ResourceField, input: &str) -> Self {
        let value = coerce_count(input);
        let mut next = self.clone();
        match field {
            ResourceField::BloodUnits(t) => next.blood_units.set(t, value),
            ResourceField::OxygenCylinders => next.oxygen_cylinders = value,
            ResourceField::IcuBeds => next.icu_beds = value,
            ResourceField::GeneralBeds => next.general_beds = value,
            ResourceField::DoctorsAvailable => next.doctors_available = value,
        }
        next
    }

    /// Hydrate from a remote document.
    ///
    /// A document without a `bloodUnits` map keeps this form's blood counts;
    /// every other missing count becomes 0.
    pub fn hydrate(&self, data: &Value) -> Result<Self, ModelError> {
        let status = HospitalStatus::from_document(data)?;
        let has_blood_units = data.get("bloodUnits").map_or(false, Value::is_object);

        Ok(Self {
            blood_units: if has_blood_units {
                status.blood_units
            } else {
                self.blood_units.clone()
            },
            oxygen_cylinders: status.oxygen_cylinders,
            icu_beds: status.icu_beds,
            general_beds: status.general_beds,
            doctors_available: status.doctors_available,
        })
    }

    /// Body of a full-document write, without the server timestamp field
    pub fn to_document(&self) -> Result<Map<String, Value>, ModelError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(ModelError::NotAnObject),
        }
    }
}

impl From<&HospitalStatus> for ResourceForm {
    fn from(status: &HospitalStatus) -> Self {
        Self {
            blood_units: status.blood_units.clone(),
            oxygen_cylinders: status.oxygen_cylinders,
            icu_beds: status.icu_beds,
            general_beds: status.general_beds,
            doctors_available: status.doctors_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count("5"), 5);
        assert_eq!(coerce_count("  42"), 42);
        assert_eq!(coerce_count("12abc"), 12);
        assert_eq!(coerce_count("-3"), -3);
        assert_eq!(coerce_count("+7"), 7);
        assert_eq!(coerce_count("3.9"), 3);
        assert_eq!(coerce_count("abc"), 0);
        assert_eq!(coerce_count(""), 0);
        assert_eq!(coerce_count("-"), 0);
        assert_eq!(coerce_count("e5"), 0);
        assert_eq!(coerce_count("99999999999999999999999"), 0);
    }

    #[test]
    fn test_field_paths() {
        assert_eq!(
            "bloodUnits.AB+".parse::<ResourceField>().unwrap(),
            ResourceField::BloodUnits(BloodType::AbPositive)
        );
        assert_eq!(
            "icuBeds".parse::<ResourceField>().unwrap(),
            ResourceField::IcuBeds
        );
        assert!("bloodUnits.Z".parse::<ResourceField>().is_err());
        assert!("beds".parse::<ResourceField>().is_err());

        for field in ResourceField::all() {
            assert_eq!(field.to_string().parse::<ResourceField>().unwrap(), field);
        }
        assert_eq!(ResourceField::all().count(), 12);
    }

    #[test]
    fn test_with_input_is_immutable_update() {
        let form = ResourceForm::default();
        let next = form.with_input(ResourceField::BloodUnits(BloodType::APositive), "5");

        assert_eq!(form.get(ResourceField::BloodUnits(BloodType::APositive)), 0);
        assert_eq!(next.get(ResourceField::BloodUnits(BloodType::APositive)), 5);
    }

    #[test]
    fn test_with_input_non_numeric_is_zero() {
        let form = ResourceForm {
            oxygen_cylinders: 12,
            ..Default::default()
        };
        let next = form.with_input(ResourceField::OxygenCylinders, "lots");
        assert_eq!(next.oxygen_cylinders, 0);
    }

    #[test]
    fn test_hydrate_keeps_blood_units_when_absent() {
        let form = ResourceForm::default()
            .with_input(ResourceField::BloodUnits(BloodType::ONegative), "8");

        let hydrated = form.hydrate(&json!({"icuBeds": 3})).unwrap();
        assert_eq!(hydrated.blood_units.get(BloodType::ONegative), 8);
        assert_eq!(hydrated.icu_beds, 3);
        assert_eq!(hydrated.general_beds, 0);

        let replaced = form.hydrate(&json!({"bloodUnits": {"A+": 1}})).unwrap();
        assert_eq!(replaced.blood_units.get(BloodType::ONegative), 0);
        assert_eq!(replaced.blood_units.get(BloodType::APositive), 1);
    }

    #[test]
    fn test_to_document_has_no_timestamp() {
        let doc = ResourceForm::default().to_document().unwrap();
        assert!(doc.contains_key("bloodUnits"));
        assert!(doc.contains_key("doctorsAvailable"));
        assert!(!doc.contains_key("lastUpdated"));
    }
}
