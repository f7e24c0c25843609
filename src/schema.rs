//! Wire format for structured definitions
//!
//! The one serialized format this crate owns: a JSON shape describing a
//! complex definition (class name plus ordered constructor arguments,
//! setter calls, and property assignments).
//!
//! ```json
//! {
//!   "className": "FileLogger",
//!   "arguments": [ { "type": "parameter", "value": "/log" } ],
//!   "calls": [ { "method": "set_level", "arguments": [ { "type": "parameter", "value": 3 } ] } ],
//!   "properties": [ { "name": "prefix", "value": { "type": "service", "name": "prefix_provider" } } ]
//! }
//! ```
//!
//! Parameter values arrive at blueprints as erased
//! [`serde_json::Value`]s; constructors that accept config-driven wiring
//! downcast to that type.

use crate::definition::{
    Argument, ComplexRecipe, MethodCall, PropertyAssignment, ServiceDefinition,
};
use serde::Deserialize;
use std::sync::Arc;

/// Deserializable complex-definition description
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionSchema {
    pub class_name: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentSchema>,
    #[serde(default)]
    pub calls: Vec<MethodCallSchema>,
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
}

/// Deserializable argument, tagged by `type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArgumentSchema {
    /// `{ "type": "parameter", "value": <any JSON> }`
    Parameter { value: serde_json::Value },
    /// `{ "type": "service", "name": "..." }`
    Service { name: String },
    /// `{ "type": "instance", "className": "...", "arguments": [...] }`
    #[serde(rename_all = "camelCase")]
    Instance {
        class_name: String,
        #[serde(default)]
        arguments: Vec<ArgumentSchema>,
    },
}

/// Deserializable setter-call step
#[derive(Debug, Clone, Deserialize)]
pub struct MethodCallSchema {
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentSchema>,
}

/// Deserializable property-assignment step
#[derive(Debug, Clone, Deserialize)]
pub struct PropertySchema {
    pub name: String,
    pub value: ArgumentSchema,
}

impl ArgumentSchema {
    fn into_argument(self) -> Argument {
        match self {
            ArgumentSchema::Parameter { value } => Argument::Parameter {
                value: Arc::new(value),
            },
            ArgumentSchema::Service { name } => Argument::Service { name },
            ArgumentSchema::Instance {
                class_name,
                arguments,
            } => Argument::Instance {
                class_name,
                arguments: arguments
                    .into_iter()
                    .map(ArgumentSchema::into_argument)
                    .collect(),
            },
        }
    }
}

impl DefinitionSchema {
    /// Convert into a non-shared complex [`ServiceDefinition`].
    ///
    /// Chain [`ServiceDefinition::shared`] to flip the lifecycle flag.
    pub fn into_definition(self) -> ServiceDefinition {
        ServiceDefinition::complex(ComplexRecipe {
            class_name: self.class_name,
            arguments: self
                .arguments
                .into_iter()
                .map(ArgumentSchema::into_argument)
                .collect(),
            calls: self
                .calls
                .into_iter()
                .map(|call| MethodCall {
                    method: call.method,
                    arguments: call
                        .arguments
                        .into_iter()
                        .map(ArgumentSchema::into_argument)
                        .collect(),
                })
                .collect(),
            properties: self
                .properties
                .into_iter()
                .map(|property| PropertyAssignment {
                    name: property.name,
                    value: property.value.into_argument(),
                })
                .collect(),
        })
    }
}

impl From<DefinitionSchema> for ServiceDefinition {
    fn from(schema: DefinitionSchema) -> Self {
        schema.into_definition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_definition_round_trips_into_a_recipe() {
        let schema: DefinitionSchema = serde_json::from_str(
            r#"{
                "className": "FileLogger",
                "arguments": [ { "type": "parameter", "value": "/log" } ],
                "calls": [
                    { "method": "set_level",
                      "arguments": [ { "type": "parameter", "value": 3 } ] }
                ],
                "properties": [
                    { "name": "prefix",
                      "value": { "type": "service", "name": "prefix_provider" } }
                ]
            }"#,
        )
        .unwrap();

        let definition = schema.into_definition();
        let recipe = definition.as_complex().unwrap();

        assert_eq!(recipe.class_name, "FileLogger");
        assert_eq!(recipe.arguments.len(), 1);
        match &recipe.arguments[0] {
            Argument::Parameter { value } => {
                let json = value.downcast_ref::<serde_json::Value>().unwrap();
                assert_eq!(json.as_str(), Some("/log"));
            }
            other => panic!("expected parameter, got {other:?}"),
        }

        assert_eq!(recipe.calls.len(), 1);
        assert_eq!(recipe.calls[0].method, "set_level");
        assert_eq!(recipe.properties.len(), 1);
        assert!(matches!(
            &recipe.properties[0].value,
            Argument::Service { name } if name == "prefix_provider"
        ));
        assert!(!definition.is_shared());
    }

    #[test]
    fn arguments_calls_and_properties_default_to_empty() {
        let schema: DefinitionSchema =
            serde_json::from_str(r#"{ "className": "Clock" }"#).unwrap();
        let definition = schema.into_definition();
        let recipe = definition.as_complex().unwrap();

        assert_eq!(recipe.class_name, "Clock");
        assert!(recipe.arguments.is_empty());
        assert!(recipe.calls.is_empty());
        assert!(recipe.properties.is_empty());
    }

    #[test]
    fn nested_instance_specs_deserialize_recursively() {
        let schema: DefinitionSchema = serde_json::from_str(
            r#"{
                "className": "Mailer",
                "arguments": [
                    { "type": "instance",
                      "className": "SmtpTransport",
                      "arguments": [ { "type": "parameter", "value": "localhost" } ] }
                ]
            }"#,
        )
        .unwrap();

        let definition = schema.into_definition();
        let recipe = definition.as_complex().unwrap();
        match &recipe.arguments[0] {
            Argument::Instance {
                class_name,
                arguments,
            } => {
                assert_eq!(class_name, "SmtpTransport");
                assert_eq!(arguments.len(), 1);
            }
            other => panic!("expected instance spec, got {other:?}"),
        }
    }

    #[test]
    fn unknown_argument_tag_is_rejected() {
        let result: std::result::Result<DefinitionSchema, _> = serde_json::from_str(
            r#"{
                "className": "Clock",
                "arguments": [ { "type": "closure" } ]
            }"#,
        );
        assert!(result.is_err());
    }
}
