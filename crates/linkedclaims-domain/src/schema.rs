//! Claim schemas and the schema registry
//!
//! A schema lists the fields a claim of a given type may carry. Field
//! descriptions are rendered into prompts verbatim, so editing a description
//! here changes what the model is told without touching prompt code.

use crate::error::{SchemaError, UnknownSchemaError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Well-known LinkedClaims field names
pub mod field_names {
    /// Entity the claim is about
    pub const SUBJECT: &str = "subject";
    /// Claim type
    pub const CLAIM: &str = "claim";
    /// Optional object URI
    pub const OBJECT: &str = "object";
    /// Statement text
    pub const STATEMENT: &str = "statement";
    /// Namespaced aspect
    pub const ASPECT: &str = "aspect";
    /// Quantity
    pub const AMOUNT: &str = "amt";
    /// Unit of the quantity
    pub const UNIT: &str = "unit";
    /// Effective date
    pub const EFFECTIVE_DATE: &str = "effectiveDate";
    /// Extraction confidence
    pub const CONFIDENCE: &str = "confidence";
}

/// Value type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    String,
    /// Integer or decimal
    Number,
    /// Calendar date (`YYYY-MM-DD`)
    Date,
    /// One of `allowed_values`
    Enum,
    /// URI with a scheme
    Uri,
}

impl FieldType {
    /// Name used in prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date (YYYY-MM-DD)",
            FieldType::Enum => "enum",
            FieldType::Uri => "URI",
        }
    }
}

/// Definition of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name as it appears in model output
    pub name: String,

    /// Value type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Whether the field must be present and non-empty
    #[serde(default)]
    pub required: bool,

    /// Allowed values for enum fields, in prompt order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,

    /// Instruction rendered verbatim into prompts
    pub description: String,
}

impl FieldSpec {
    /// Create a field definition
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
            allowed_values: None,
            description: description.into(),
        }
    }

    /// Restrict to a set of values (makes the field an enum)
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_type = FieldType::Enum;
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `value` is in the allowed set (always true for non-enum fields)
    pub fn allows(&self, value: &str) -> bool {
        match &self.allowed_values {
            Some(values) => values.iter().any(|v| v == value),
            None => true,
        }
    }
}

/// A named, versioned claim shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Identifier, also the expected `claim` value
    pub name: String,

    /// Definition version
    #[serde(default = "default_version")]
    pub version: u32,

    /// What claims of this type express
    pub description: String,

    /// Ordered field definitions
    pub fields: Vec<FieldSpec>,
}

fn default_version() -> u32 {
    1
}

impl Schema {
    /// Create a schema, checking its invariants
    ///
    /// # Errors
    /// Returns error if field names repeat, no field is required, or an enum
    /// field has no allowed values
    pub fn new(
        name: impl Into<String>,
        version: u32,
        description: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Result<Self, SchemaError> {
        let schema = Self {
            name: name.into(),
            version,
            description: description.into(),
            fields,
        };
        schema.check()?;
        Ok(schema)
    }

    /// Verify schema invariants
    pub fn check(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if field.field_type == FieldType::Enum
                && field.allowed_values.as_ref().map_or(true, |v| v.is_empty())
            {
                return Err(SchemaError::EmptyEnum {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        if !self.fields.iter().any(|f| f.required) {
            return Err(SchemaError::NoRequiredFields(self.name.clone()));
        }

        Ok(())
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Required fields in definition order
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Whether a field is defined and required
    pub fn is_required(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.required)
    }
}

/// Read-only index of schemas by name
///
/// Built once at startup and shared (by reference or `Arc`) across
/// concurrent extraction calls.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    schemas: Vec<Schema>,
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in LinkedClaims schemas
    /// (`impact`, `rated`, `same_as`)
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for schema in builtin::all() {
            registry.schemas.insert(schema.name.clone(), schema);
        }
        registry
    }

    /// Add a schema
    ///
    /// # Errors
    /// Returns error if the schema is invalid or the name is taken
    pub fn register(&mut self, schema: Schema) -> Result<(), SchemaError> {
        schema.check()?;
        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::AlreadyRegistered(schema.name));
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Register every schema defined in a TOML document
    ///
    /// ```toml
    /// [[schemas]]
    /// name = "volunteered"
    /// description = "Volunteer hours"
    ///
    /// [[schemas.fields]]
    /// name = "subject"
    /// type = "string"
    /// required = true
    /// description = "Who volunteered"
    /// ```
    pub fn load_toml(&mut self, toml_str: &str) -> Result<usize, SchemaError> {
        let file: SchemaFile =
            toml::from_str(toml_str).map_err(|e| SchemaError::Parse(e.to_string()))?;
        let count = file.schemas.len();
        for schema in file.schemas {
            self.register(schema)?;
        }
        Ok(count)
    }

    /// Get a schema by name
    pub fn get_schema(&self, name: &str) -> Result<&Schema, UnknownSchemaError> {
        self.schemas
            .get(name)
            .ok_or_else(|| UnknownSchemaError(name.to_string()))
    }

    /// All schemas, ordered by name
    pub fn list_schemas(&self) -> Vec<&Schema> {
        self.schemas.values().collect()
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

mod builtin {
    use super::field_names::*;
    use super::{FieldSpec, FieldType, Schema};

    fn common_fields(claim_type: &str) -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(
                SUBJECT,
                FieldType::String,
                true,
                "The organization, person, or entity the claim is about, named as in the text.",
            ),
            FieldSpec::new(
                CLAIM,
                FieldType::Enum,
                true,
                "The claim type. Always the literal value shown in the allowed values.",
            )
            .with_allowed_values([claim_type]),
            FieldSpec::new(
                STATEMENT,
                FieldType::String,
                true,
                "A concise, self-contained sentence stating the claim, faithful to the source text.",
            ),
        ]
    }

    fn quantity_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new(
                AMOUNT,
                FieldType::Number,
                false,
                "The numeric quantity stated in the text, as a bare number without separators or currency symbols. Omit if the text gives no number.",
            ),
            FieldSpec::new(
                UNIT,
                FieldType::String,
                false,
                "Unit of the amount (e.g. USD, people, tons CO2). Required whenever amt is given.",
            ),
            FieldSpec::new(
                EFFECTIVE_DATE,
                FieldType::Date,
                false,
                "Date the claimed fact took effect, as YYYY-MM-DD. If only a year is stated use the last day of that year.",
            ),
        ]
    }

    fn confidence_field() -> FieldSpec {
        FieldSpec::new(
            CONFIDENCE,
            FieldType::Number,
            true,
            "Number between 0 and 1: how certain you are that the text states this claim, not whether the claim is true.",
        )
    }

    fn impact() -> Schema {
        let mut fields = common_fields("impact");
        fields.push(FieldSpec::new(
            ASPECT,
            FieldType::String,
            false,
            "Namespaced category of the impact, e.g. impact:social, impact:environmental:carbon, impact:financial.",
        ));
        fields.extend(quantity_fields());
        fields.push(confidence_field());
        Schema {
            name: "impact".to_string(),
            version: 1,
            description: "Measurable outcomes an entity reports having achieved.".to_string(),
            fields,
        }
    }

    fn rated() -> Schema {
        let mut fields = common_fields("rated");
        fields.push(FieldSpec::new(
            ASPECT,
            FieldType::String,
            true,
            "Namespaced quality being rated, e.g. quality:service, quality:transparency.",
        ));
        fields.push(FieldSpec::new(
            OBJECT,
            FieldType::Uri,
            false,
            "URI of the thing being rated, if the text gives one.",
        ));
        fields.extend(quantity_fields());
        fields.push(confidence_field());
        Schema {
            name: "rated".to_string(),
            version: 1,
            description: "Assessments or ratings of an entity's quality.".to_string(),
            fields,
        }
    }

    fn same_as() -> Schema {
        let mut fields = common_fields("same_as");
        fields.push(FieldSpec::new(
            OBJECT,
            FieldType::Uri,
            true,
            "URI of another identifier that refers to the same entity as the subject.",
        ));
        fields.push(confidence_field());
        Schema {
            name: "same_as".to_string(),
            version: 1,
            description: "Statements that two identifiers refer to the same entity.".to_string(),
            fields,
        }
    }

    pub(super) fn all() -> Vec<Schema> {
        vec![impact(), rated(), same_as()]
    }
}
