//! Tool-schema translation shared by both wire families.

use pocketclaw_core::tool::{ParamType, ToolDefinition};
use serde_json::{Map, Value, json};

/// JSON-schema object for a tool's parameters.
///
/// Array parameters get an explicit `items: {type: string}`; parameters
/// flagged `required` are collected in declaration order.
pub fn input_schema(tool: &ToolDefinition) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in &tool.parameters {
        let mut prop = Map::new();
        prop.insert("type".into(), param.kind.as_str().into());
        prop.insert("description".into(), param.description.clone().into());
        if param.kind == ParamType::Array {
            prop.insert("items".into(), json!({ "type": "string" }));
        }
        properties.insert(param.name.clone(), Value::Object(prop));
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_gets_string_items_and_required_is_collected() {
        let tool = ToolDefinition::new("search", "Search files")
            .param("query", ParamType::String, "What to find", true)
            .param("globs", ParamType::Array, "File patterns", false)
            .param("limit", ParamType::Number, "Max hits", true);
        let schema = input_schema(&tool);

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["globs"]["items"]["type"], "string");
        assert!(schema["properties"]["query"].get("items").is_none());
        assert_eq!(schema["required"], json!(["query", "limit"]));

        let order: Vec<&String> = schema["properties"].as_object().unwrap().keys().collect();
        assert_eq!(order, vec!["query", "globs", "limit"]);
    }

    #[test]
    fn no_parameters_is_empty_object_schema() {
        let schema = input_schema(&ToolDefinition::new("now", "Current time"));
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }
}
