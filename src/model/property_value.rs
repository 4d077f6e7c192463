use serde::{Serialize, Serializer};
use serde_json::{json, Number, Value};

/// A validated, type-tagged value ready to be written to one property.
///
/// Values are produced by the property mapper; each variant serializes to
/// the exact property-value JSON the Notion API expects for its type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(String),
    RichText(String),
    Number(Number),
    Select(String),
    Status(String),
    MultiSelect(Vec<String>),
    Checkbox(bool),
    Date(DateInput),
    Relation(Vec<String>),
    Url(String),
    Email(String),
    PhoneNumber(String),
}

/// The two accepted shapes of a date value.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// A `YYYY-MM-DD` calendar day, written as the range start.
    Day(String),
    /// A caller-built `{start, end?, time_zone?}` object, written verbatim.
    Structured(Value),
}

impl PropertyValue {
    /// Returns the Notion API type name for this property value.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Title(_) => "title",
            PropertyValue::RichText(_) => "rich_text",
            PropertyValue::Number(_) => "number",
            PropertyValue::Select(_) => "select",
            PropertyValue::Status(_) => "status",
            PropertyValue::MultiSelect(_) => "multi_select",
            PropertyValue::Checkbox(_) => "checkbox",
            PropertyValue::Date(_) => "date",
            PropertyValue::Relation(_) => "relation",
            PropertyValue::Url(_) => "url",
            PropertyValue::Email(_) => "email",
            PropertyValue::PhoneNumber(_) => "phone_number",
        }
    }

    /// The Notion property-value JSON for this value.
    pub fn to_api_value(&self) -> Value {
        match self {
            PropertyValue::Title(text) => json!({ "title": text_content(text) }),
            PropertyValue::RichText(text) => json!({ "rich_text": text_content(text) }),
            PropertyValue::Number(number) => json!({ "number": number }),
            PropertyValue::Select(name) => json!({ "select": { "name": name } }),
            PropertyValue::Status(name) => json!({ "status": { "name": name } }),
            PropertyValue::MultiSelect(names) => {
                let options: Vec<Value> = names.iter().map(|name| json!({ "name": name })).collect();
                json!({ "multi_select": options })
            }
            PropertyValue::Checkbox(checked) => json!({ "checkbox": checked }),
            PropertyValue::Date(DateInput::Day(day)) => json!({ "date": { "start": day } }),
            PropertyValue::Date(DateInput::Structured(date)) => json!({ "date": date }),
            PropertyValue::Relation(ids) => {
                let targets: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
                json!({ "relation": targets })
            }
            PropertyValue::Url(url) => json!({ "url": url }),
            PropertyValue::Email(email) => json!({ "email": email }),
            PropertyValue::PhoneNumber(phone) => json!({ "phone_number": phone }),
        }
    }
}

impl Serialize for PropertyValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_api_value().serialize(serializer)
    }
}

/// A single plain-text rich-text run, the shape shared by titles, rich text and blocks.
pub fn text_content(text: &str) -> Value {
    json!([{ "type": "text", "text": { "content": text } }])
}
