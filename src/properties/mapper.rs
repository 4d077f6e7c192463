// src/properties/mapper.rs
//! The typed property mapper.
//!
//! Callers hand in a flat `name → value` map such as
//! `{"Status": "Done", "Tags": ["a", "b"], "Due": "2024-05-01"}` and a schema
//! fetched from the database. The mapper checks each entry against its
//! declared type and produces either a [`PropertyValue`] or a
//! [`PropertyError`] for it. It never fails as a whole; whether errors abort
//! a write is the caller's decision.

use crate::model::{DateInput, PropertyDefinition, PropertySchema, PropertyType, PropertyValue};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

lazy_static::lazy_static! {
    static ref DAY_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$")
        .expect("Failed to compile date regex - this is a bug in the code");
}

/// Why one property could not be mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingReason {
    UnknownProperty,
    MissingType,
    MissingOptions,
    InvalidOption,
    ExpectedList,
    InvalidDate,
    InvalidNumber,
    InvalidRelationId,
    RollupNotSupported,
    UnsupportedType,
}

impl MappingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownProperty => "unknown_property",
            Self::MissingType => "missing_type",
            Self::MissingOptions => "missing_options",
            Self::InvalidOption => "invalid_option",
            Self::ExpectedList => "expected_list",
            Self::InvalidDate => "invalid_date",
            Self::InvalidNumber => "invalid_number",
            Self::InvalidRelationId => "invalid_relation_id",
            Self::RollupNotSupported => "rollup_not_supported",
            Self::UnsupportedType => "unsupported_type",
        }
    }
}

impl fmt::Display for MappingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected property, with the allowed options when they help fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyError {
    pub property: String,
    pub reason: MappingReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Outcome of mapping a whole input map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMapping {
    pub mapped: IndexMap<String, PropertyValue>,
    pub errors: Vec<PropertyError>,
}

impl PropertyMapping {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The mapped values as the `properties` object of a page write.
    pub fn to_api_properties(&self) -> serde_json::Map<String, Value> {
        self.mapped
            .iter()
            .map(|(name, value)| (name.clone(), value.to_api_value()))
            .collect()
    }
}

/// Maps every input entry against the schema, in input order.
pub fn map_properties(schema: &PropertySchema, input: &IndexMap<String, Value>) -> PropertyMapping {
    let mut mapping = PropertyMapping::default();

    for (name, value) in input {
        let Some(definition) = schema.get(name) else {
            mapping.errors.push(PropertyError {
                property: name.clone(),
                reason: MappingReason::UnknownProperty,
                options: None,
            });
            continue;
        };

        match map_value(definition, value) {
            Ok(mapped) => {
                mapping.mapped.insert(name.clone(), mapped);
            }
            Err(reason) => {
                let options = matches!(
                    reason,
                    MappingReason::InvalidOption | MappingReason::MissingOptions
                )
                .then(|| definition.options.clone());
                log::debug!("Rejected property '{}': {}", name, reason);
                mapping.errors.push(PropertyError {
                    property: name.clone(),
                    reason,
                    options,
                });
            }
        }
    }

    mapping
}

fn map_value(definition: &PropertyDefinition, value: &Value) -> Result<PropertyValue, MappingReason> {
    let options = &definition.options;
    match &definition.property_type {
        PropertyType::Untyped => Err(MappingReason::MissingType),
        PropertyType::Rollup => Err(MappingReason::RollupNotSupported),
        PropertyType::Select | PropertyType::Status | PropertyType::MultiSelect
            if options.is_empty() =>
        {
            Err(MappingReason::MissingOptions)
        }
        PropertyType::Select => pick_option(options, value).map(PropertyValue::Select),
        PropertyType::Status => pick_option(options, value).map(PropertyValue::Status),
        PropertyType::MultiSelect => {
            let items = value.as_array().ok_or(MappingReason::ExpectedList)?;
            let names: Vec<String> = items.iter().map(stringify).collect();
            // All or nothing: one stray name rejects the whole property.
            if names.iter().any(|name| !options.contains(name)) {
                return Err(MappingReason::InvalidOption);
            }
            Ok(PropertyValue::MultiSelect(names))
        }
        PropertyType::Title => Ok(PropertyValue::Title(stringify(value))),
        PropertyType::RichText => Ok(PropertyValue::RichText(stringify(value))),
        PropertyType::Checkbox => Ok(PropertyValue::Checkbox(is_truthy(value))),
        PropertyType::Date => map_date(value).map(PropertyValue::Date),
        PropertyType::Number => match value {
            Value::Number(number) => Ok(PropertyValue::Number(number.clone())),
            _ => Err(MappingReason::InvalidNumber),
        },
        PropertyType::Relation => {
            let items = value.as_array().ok_or(MappingReason::ExpectedList)?;
            items
                .iter()
                .map(|item| match item.as_str() {
                    Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
                    _ => Err(MappingReason::InvalidRelationId),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(PropertyValue::Relation)
        }
        PropertyType::Url => Ok(PropertyValue::Url(stringify(value))),
        PropertyType::Email => Ok(PropertyValue::Email(stringify(value))),
        PropertyType::PhoneNumber => Ok(PropertyValue::PhoneNumber(stringify(value))),
        PropertyType::Other(_) => Err(MappingReason::UnsupportedType),
    }
}

fn pick_option(options: &[String], value: &Value) -> Result<String, MappingReason> {
    let name = stringify(value);
    if options.contains(&name) {
        Ok(name)
    } else {
        Err(MappingReason::InvalidOption)
    }
}

/// Shape check only: `2024-13-40` passes, calendar validity is Notion's call.
fn map_date(value: &Value) -> Result<DateInput, MappingReason> {
    match value {
        Value::String(day) if DAY_REGEX.is_match(day) => Ok(DateInput::Day(day.clone())),
        Value::Object(date) if date.contains_key("start") => {
            Ok(DateInput::Structured(value.clone()))
        }
        _ => Err(MappingReason::InvalidDate),
    }
}

/// Text form of any JSON value: strings verbatim, `null` empty, the rest as JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
