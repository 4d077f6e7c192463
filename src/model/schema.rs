//! Database schemas as seen by the property mapper.

use crate::constants::UNTITLED;
use crate::types::NotionId;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// The declared type of a database property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Checkbox,
    Date,
    Relation,
    Url,
    Email,
    PhoneNumber,
    Rollup,
    /// A type Notion knows but the relay does not write (people, files, formula, ...).
    Other(String),
    /// The schema entry carried no `type` at all.
    Untyped,
}

impl PropertyType {
    /// Parse the Notion API type tag.
    pub fn from_api_name(name: &str) -> Self {
        match name {
            "title" => Self::Title,
            "rich_text" => Self::RichText,
            "number" => Self::Number,
            "select" => Self::Select,
            "multi_select" => Self::MultiSelect,
            "status" => Self::Status,
            "checkbox" => Self::Checkbox,
            "date" => Self::Date,
            "relation" => Self::Relation,
            "url" => Self::Url,
            "email" => Self::Email,
            "phone_number" => Self::PhoneNumber,
            "rollup" => Self::Rollup,
            "" => Self::Untyped,
            other => Self::Other(other.to_string()),
        }
    }

    /// The Notion API type tag.
    pub fn api_name(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Number => "number",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Status => "status",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Relation => "relation",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Rollup => "rollup",
            Self::Other(name) => name,
            Self::Untyped => "",
        }
    }

    /// Whether values of this type must be drawn from a declared option set.
    pub fn is_enumerated(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect | Self::Status)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// One named property of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub property_type: PropertyType,
    /// Allowed option names, in declaration order. Empty for non-enumerated types.
    pub options: Vec<String>,
}

impl PropertyDefinition {
    pub fn new(property_type: PropertyType) -> Self {
        Self {
            property_type,
            options: Vec::new(),
        }
    }

    pub fn with_options<I, S>(property_type: PropertyType, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            property_type,
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

/// Immutable snapshot of a database's property types, keyed by property name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySchema {
    properties: IndexMap<String, PropertyDefinition>,
}

impl PropertySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mostly for assembling schemas by hand.
    pub fn with_property(mut self, name: impl Into<String>, definition: PropertyDefinition) -> Self {
        self.properties.insert(name.into(), definition);
        self
    }

    /// Builds a schema from the `properties` object of a database or page.
    ///
    /// Page properties carry a type but no option list, so enumerated
    /// properties read from a page come out with no allowed options.
    pub fn from_properties(properties: &IndexMap<String, Value>) -> Self {
        let properties = properties
            .iter()
            .map(|(name, raw)| {
                let type_name = raw.get("type").and_then(Value::as_str).unwrap_or_default();
                let property_type = PropertyType::from_api_name(type_name);
                let options = if property_type.is_enumerated() {
                    extract_option_names(raw, type_name)
                } else {
                    Vec::new()
                };
                (
                    name.clone(),
                    PropertyDefinition {
                        property_type,
                        options,
                    },
                )
            })
            .collect();
        Self { properties }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(name)
    }

    /// Name of the first title-typed property, the one Notion shows as the row title.
    pub fn title_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, def)| def.property_type == PropertyType::Title)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyDefinition)> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Reads `{<type>: {options: [{name}]}}`, skipping options without a name.
fn extract_option_names(raw: &Value, type_name: &str) -> Vec<String> {
    raw.get(type_name)
        .and_then(|config| config.get("options"))
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|opt| opt.get("name").and_then(Value::as_str))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Client-facing view of a database schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSummary {
    pub database_id: NotionId,
    pub title: String,
    pub properties: Vec<PropertySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySummary {
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl SchemaSummary {
    pub fn new(database_id: NotionId, title: &str, schema: &PropertySchema) -> Self {
        let title = if title.is_empty() { UNTITLED } else { title };
        let properties = schema
            .iter()
            .map(|(name, def)| PropertySummary {
                name: name.clone(),
                property_type: def.property_type.to_string(),
                options: def
                    .property_type
                    .is_enumerated()
                    .then(|| def.options.clone()),
            })
            .collect();
        Self {
            database_id,
            title: title.to_string(),
            properties,
        }
    }
}
