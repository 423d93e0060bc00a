//! Input validation for the add-school body and the list-schools query.
//!
//! Both validators collect every field failure before returning, so a
//! caller receives either a fully typed value or the complete error list.

use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::geo::{Coordinates, LATITUDE_RANGE, LONGITUDE_RANGE};

/// Maximum school name length in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum address length in characters.
pub const MAX_ADDRESS_LEN: usize = 500;

const ADD_SCHOOL_FIELDS: [&str; 4] = ["name", "address", "latitude", "longitude"];

/// A validated add-school request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchool {
    /// School name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Location.
    pub location: Coordinates,
}

/// Raw list-schools query parameters, as received.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ListSchoolsQuery {
    /// Reference latitude.
    pub latitude: Option<String>,
    /// Reference longitude.
    pub longitude: Option<String>,
}

/// Labels used in messages for a bounded coordinate field.
struct CoordinateField {
    key: &'static str,
    label: &'static str,
    range: (f64, f64),
}

const LATITUDE: CoordinateField = CoordinateField {
    key: "latitude",
    label: "Latitude",
    range: LATITUDE_RANGE,
};

const LONGITUDE: CoordinateField = CoordinateField {
    key: "longitude",
    label: "Longitude",
    range: LONGITUDE_RANGE,
};

impl CoordinateField {
    fn required(&self) -> FieldError {
        FieldError::new(self.key, format!("{} is required", self.label))
    }

    fn not_a_number(&self) -> FieldError {
        FieldError::new(self.key, format!("{} must be a valid number", self.label))
    }

    fn out_of_range(&self) -> FieldError {
        let (min, max) = self.range;
        FieldError::new(
            self.key,
            format!("{} must be between {} and {}", self.label, min, max),
        )
    }

    fn check_range(&self, value: f64) -> Result<f64, FieldError> {
        let (min, max) = self.range;
        if (min..=max).contains(&value) {
            Ok(value)
        } else {
            Err(self.out_of_range())
        }
    }

    /// Validate a JSON value. Numeric strings are accepted and converted.
    fn from_json(&self, value: Option<&Value>) -> Result<f64, FieldError> {
        let number = match value {
            None | Some(Value::Null) => return Err(self.required()),
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| self.not_a_number())?,
            Some(Value::String(s)) => parse_number(s).ok_or_else(|| self.not_a_number())?,
            Some(_) => return Err(self.not_a_number()),
        };
        self.check_range(number)
    }

    /// Validate a query-string value.
    fn from_query(&self, value: Option<&str>) -> Result<f64, FieldError> {
        let Some(raw) = value else {
            return Err(self.required());
        };
        if raw.trim().is_empty() {
            return Err(self.required());
        }
        let number = parse_number(raw).ok_or_else(|| self.not_a_number())?;
        self.check_range(number)
    }
}

/// Strict float parse. Rejects trailing garbage, NaN and infinities.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

struct TextField {
    key: &'static str,
    label: &'static str,
    max_len: usize,
}

const NAME: TextField = TextField {
    key: "name",
    label: "School name",
    max_len: MAX_NAME_LEN,
};

const ADDRESS: TextField = TextField {
    key: "address",
    label: "Address",
    max_len: MAX_ADDRESS_LEN,
};

impl TextField {
    fn from_json(&self, value: Option<&Value>) -> Result<String, FieldError> {
        match value {
            None | Some(Value::Null) => Err(FieldError::new(
                self.key,
                format!("{} is required", self.label),
            )),
            Some(Value::String(s)) if s.is_empty() => Err(FieldError::new(
                self.key,
                format!("{} is required", self.label),
            )),
            Some(Value::String(s)) if s.chars().count() > self.max_len => Err(FieldError::new(
                self.key,
                format!("{} must be less than {} characters", self.label, self.max_len),
            )),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(FieldError::new(
                self.key,
                format!("{} must be a string", self.label),
            )),
        }
    }
}

/// Validate an add-school JSON body.
pub fn validate_new_school(body: &Value) -> Result<NewSchool, Vec<FieldError>> {
    let Some(object) = body.as_object() else {
        return Err(vec![FieldError::new(
            "body",
            "Request body must be a JSON object",
        )]);
    };

    let mut errors = unknown_fields(object);

    let name = NAME.from_json(object.get("name"));
    let address = ADDRESS.from_json(object.get("address"));
    let latitude = LATITUDE.from_json(object.get("latitude"));
    let longitude = LONGITUDE.from_json(object.get("longitude"));

    match (name, address, latitude, longitude) {
        (Ok(name), Ok(address), Ok(latitude), Ok(longitude)) if errors.is_empty() => {
            Ok(NewSchool {
                name,
                address,
                location: Coordinates::new(latitude, longitude),
            })
        }
        (name, address, latitude, longitude) => {
            errors.extend(name.err());
            errors.extend(address.err());
            errors.extend(latitude.err());
            errors.extend(longitude.err());
            Err(errors)
        }
    }
}

fn unknown_fields(object: &Map<String, Value>) -> Vec<FieldError> {
    object
        .keys()
        .filter(|key| !ADD_SCHOOL_FIELDS.contains(&key.as_str()))
        .map(|key| FieldError::new(key.as_str(), format!("\"{key}\" is not allowed")))
        .collect()
}

/// Validate list-schools query parameters into a reference point.
pub fn validate_reference_point(query: &ListSchoolsQuery) -> Result<Coordinates, Vec<FieldError>> {
    let latitude = LATITUDE.from_query(query.latitude.as_deref());
    let longitude = LONGITUDE.from_query(query.longitude.as_deref());

    match (latitude, longitude) {
        (Ok(latitude), Ok(longitude)) => Ok(Coordinates::new(latitude, longitude)),
        (latitude, longitude) => Err(latitude.err().into_iter().chain(longitude.err()).collect()),
    }
}
