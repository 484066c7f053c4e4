//! Conversion of OpenAPI operations into function tool definitions.
//!
//! Each operation becomes one [`ToolDefinition`] whose parameter schema is an
//! object with one property per path/query parameter, plus a single
//! `requestBody` property for JSON bodies of `POST`, `PUT` and `PATCH`.
//!
//! In strict mode every property is required and no additional properties
//! are accepted, which is what OpenAI Structured Outputs demands. In lenient
//! mode optional query parameters are typed as nullable instead.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::OpenApiError;
use crate::tool::ToolDefinition;

use super::document::{Document, OperationRef, Parameter, ParameterLocation};

/// Name of the property carrying the JSON request body.
pub const REQUEST_BODY: &str = "requestBody";

/// Convert every operation of `document` into a function tool definition.
pub fn convert(document: &Document, strict: bool) -> Result<Vec<ToolDefinition>, OpenApiError> {
    document
        .operations()
        .map(|op| convert_operation(document, &op, strict))
        .collect()
}

/// Convert a single operation.
pub fn convert_operation(
    document: &Document,
    op: &OperationRef<'_>,
    strict: bool,
) -> Result<ToolDefinition, OpenApiError> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    let params = document.parameters(op)?;

    for param in params.iter().filter(|p| p.location == ParameterLocation::Path) {
        properties.insert(param.name.clone(), parameter_property(document, param)?);
        required.push(Value::String(param.name.clone()));
    }

    for param in params.iter().filter(|p| p.location == ParameterLocation::Query) {
        let mut property = parameter_property(document, param)?;
        if !strict && !param.required {
            make_nullable(&mut property);
        }
        properties.insert(param.name.clone(), property);
        if strict || param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    if op.method.has_body()
        && let Some(body) = document.request_body(op)?
        && let Some(schema) = body.json_schema()
    {
        let schema = document.resolve_schema(schema)?;
        if schema.is_object() {
            let description = body
                .description
                .clone()
                .unwrap_or_else(|| "Request body".to_owned());
            properties.insert(
                REQUEST_BODY.to_owned(),
                body_property(document, schema, description, strict)?,
            );
            required.push(Value::String(REQUEST_BODY.to_owned()));
        }
    }

    let name = op.function_name();
    debug!(
        function = %name,
        method = %op.method,
        path = op.path,
        properties = properties.len(),
        "converted operation"
    );

    Ok(ToolDefinition::new(
        name,
        op.description(),
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        }),
    )
    .with_strict(strict))
}

fn parameter_property(document: &Document, param: &Parameter) -> Result<Value, OpenApiError> {
    let empty = Value::Object(Map::new());
    let schema = match &param.schema {
        Some(schema) => document.resolve_schema(schema)?,
        None => &empty,
    };

    let mut description = param.description.clone().unwrap_or_default();
    if let Some(default) = schema.get("default") {
        let default = render_scalar(default);
        description = if description.is_empty() {
            format!("Default value: {default}")
        } else {
            format!("{description} (default: {default})")
        };
    }

    let mut property = Map::new();
    property.insert("type".to_owned(), schema_type(schema));
    property.insert("description".to_owned(), Value::String(description));
    if let Some(values) = schema.get("enum") {
        property.insert("enum".to_owned(), values.clone());
    }
    Ok(Value::Object(property))
}

fn body_property(
    document: &Document,
    schema: &Value,
    description: String,
    strict: bool,
) -> Result<Value, OpenApiError> {
    let mut properties = Map::new();
    if let Some(fields) = schema.get("properties").and_then(Value::as_object) {
        for (name, field) in fields {
            let field = document.resolve_schema(field)?;
            let mut property = Map::new();
            property.insert("type".to_owned(), schema_type(field));
            property.insert(
                "description".to_owned(),
                field.get("description").cloned().unwrap_or_else(|| json!("")),
            );
            if let Some(values) = field.get("enum") {
                property.insert("enum".to_owned(), values.clone());
            }
            properties.insert(name.clone(), Value::Object(property));
        }
    }

    let required: Vec<Value> = if strict {
        properties.keys().cloned().map(Value::String).collect()
    } else {
        schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter(|n| n.as_str().is_some_and(|n| properties.contains_key(n)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    };

    let mut body = Map::new();
    body.insert("type".to_owned(), json!("object"));
    body.insert("description".to_owned(), Value::String(description));
    body.insert("properties".to_owned(), Value::Object(properties));
    body.insert("required".to_owned(), Value::Array(required));
    if strict {
        body.insert("additionalProperties".to_owned(), Value::Bool(false));
    }
    Ok(Value::Object(body))
}

/// `type` of a schema, `"string"` when absent.
fn schema_type(schema: &Value) -> Value {
    schema.get("type").cloned().unwrap_or_else(|| json!("string"))
}

/// Widen a property's type to also accept `null`.
fn make_nullable(property: &mut Value) {
    let Some(kind) = property.get_mut("type") else {
        return;
    };
    match kind {
        Value::Array(kinds) => {
            if !kinds.iter().any(|k| k == "null") {
                kinds.push(json!("null"));
            }
        }
        other => *other = json!([other.take(), "null"]),
    }
}

/// Render a JSON value for inclusion in prose.
pub(crate) fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::from_value(json!({
            "openapi": "3.1.0",
            "paths": {
                "/films/{film_id}": {
                    "get": {
                        "operationId": "getFilm",
                        "description": "Get a film by id",
                        "parameters": [
                            {"name": "film_id", "in": "path", "required": true,
                             "description": "Film id", "schema": {"type": "integer"}},
                            {"name": "lang", "in": "query",
                             "schema": {"type": "string", "enum": ["en", "fr"], "default": "en"}},
                            {"name": "X-Trace", "in": "header", "schema": {"type": "string"}}
                        ]
                    }
                },
                "/films": {
                    "get": {
                        "operationId": "listFilms",
                        "parameters": [
                            {"name": "limit", "in": "query", "required": true,
                             "schema": {"type": "integer", "default": 10}},
                            {"name": "offset", "in": "query", "description": "Rows to skip",
                             "schema": {"type": "integer", "default": 0}},
                            {"name": "tags", "in": "query",
                             "schema": {"type": ["array", "null"]}}
                        ]
                    },
                    "post": {
                        "operationId": "createFilm",
                        "summary": "Create a film",
                        "requestBody": {"$ref": "#/components/requestBodies/NewFilm"}
                    }
                },
                "/films/{film_id}/rate": {
                    "put": {
                        "operationId": "rateFilm",
                        "requestBody": {
                            "content": {"text/plain": {"schema": {"type": "string"}}}
                        }
                    }
                }
            },
            "components": {
                "requestBodies": {
                    "NewFilm": {
                        "description": "The film to create",
                        "content": {
                            "application/json": {"schema": {"$ref": "#/components/schemas/Film"}}
                        }
                    }
                },
                "schemas": {
                    "Film": {
                        "type": "object",
                        "required": ["title"],
                        "properties": {
                            "title": {"type": "string", "description": "Title"},
                            "rating": {"$ref": "#/components/schemas/Rating"},
                            "year": {}
                        }
                    },
                    "Rating": {"type": "string", "enum": ["G", "PG", "R"]}
                }
            }
        }))
        .unwrap()
    }

    fn find(defs: &[ToolDefinition], name: &str) -> ToolDefinition {
        defs.iter().find(|d| d.name == name).cloned().unwrap()
    }

    #[test]
    fn one_definition_per_operation_in_order() {
        let defs = convert(&doc(), false).unwrap();
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["getFilm", "listFilms", "createFilm", "rateFilm"]);
    }

    #[test]
    fn path_parameters_are_always_required() {
        let def = find(&convert(&doc(), false).unwrap(), "getFilm");
        assert_eq!(
            def.parameters["properties"]["film_id"],
            json!({"type": "integer", "description": "Film id"})
        );
        assert_eq!(def.parameters["required"], json!(["film_id"]));
        assert_eq!(def.description, "Get a film by id");
    }

    #[test]
    fn lenient_optional_query_is_nullable() {
        let def = find(&convert(&doc(), false).unwrap(), "getFilm");
        assert_eq!(
            def.parameters["properties"]["lang"],
            json!({
                "type": ["string", "null"],
                "description": "Default value: en",
                "enum": ["en", "fr"]
            })
        );
    }

    #[test]
    fn strict_query_is_required_and_not_nullable() {
        let def = find(&convert(&doc(), true).unwrap(), "getFilm");
        assert_eq!(def.parameters["properties"]["lang"]["type"], json!("string"));
        assert_eq!(def.parameters["required"], json!(["film_id", "lang"]));
        assert_eq!(def.strict, Some(true));
        assert_eq!(def.parameters["additionalProperties"], json!(false));
    }

    #[test]
    fn header_parameters_are_not_exposed() {
        let def = find(&convert(&doc(), true).unwrap(), "getFilm");
        assert!(def.parameters["properties"].get("X-Trace").is_none());
    }

    #[test]
    fn default_is_appended_to_description() {
        let defs = convert(&doc(), false).unwrap();
        let def = find(&defs, "listFilms");
        assert_eq!(def.parameters["properties"]["limit"]["description"], "Default value: 10");
        assert_eq!(def.parameters["properties"]["limit"]["type"], "integer");
        assert_eq!(def.parameters["required"], json!(["limit"]));
        assert_eq!(
            def.parameters["properties"]["tags"]["type"],
            json!(["array", "null"])
        );
    }

    #[test]
    fn default_follows_existing_description() {
        let def = find(&convert(&doc(), false).unwrap(), "listFilms");
        assert_eq!(
            def.parameters["properties"]["offset"],
            json!({"type": ["integer", "null"], "description": "Rows to skip (default: 0)"})
        );
    }

    #[test]
    fn request_body_becomes_single_property() {
        let def = find(&convert(&doc(), false).unwrap(), "createFilm");
        let body = &def.parameters["properties"][REQUEST_BODY];
        assert_eq!(body["type"], "object");
        assert_eq!(body["description"], "The film to create");
        assert_eq!(body["required"], json!(["title"]));
        assert_eq!(
            body["properties"]["rating"],
            json!({"type": "string", "description": "", "enum": ["G", "PG", "R"]})
        );
        assert_eq!(body["properties"]["year"]["type"], "string");
        assert!(body.get("additionalProperties").is_none());
        assert_eq!(def.parameters["required"], json!([REQUEST_BODY]));
        assert_eq!(def.description, "Create a film");
    }

    #[test]
    fn strict_request_body_requires_every_field() {
        let def = find(&convert(&doc(), true).unwrap(), "createFilm");
        let body = &def.parameters["properties"][REQUEST_BODY];
        assert_eq!(body["required"], json!(["title", "rating", "year"]));
        assert_eq!(body["additionalProperties"], json!(false));
    }

    #[test]
    fn non_json_body_is_skipped() {
        let def = find(&convert(&doc(), false).unwrap(), "rateFilm");
        assert_eq!(def.parameters["properties"], json!({}));
        assert_eq!(def.parameters["required"], json!([]));
    }

    #[test]
    fn dangling_reference_fails_conversion() {
        let doc = Document::from_value(json!({
            "paths": {"/x": {"get": {"parameters": [{"$ref": "#/components/parameters/Nope"}]}}}
        }))
        .unwrap();
        assert!(matches!(convert(&doc, false), Err(OpenApiError::UnresolvedRef(_))));
    }

    #[test]
    fn render_scalar_strips_string_quotes() {
        assert_eq!(render_scalar(&json!("en")), "en");
        assert_eq!(render_scalar(&json!(true)), "true");
        assert_eq!(render_scalar(&json!(2.5)), "2.5");
    }
}
