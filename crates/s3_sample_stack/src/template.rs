use serde_json::Value;

/// Rendered CloudFormation template with lookup helpers for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    body: Value,
}

impl Template {
    pub(crate) fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn as_value(&self) -> &Value {
        &self.body
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.body)
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.body.get("Resources")?.get(logical_id)
    }

    pub fn resources_of_type<'a>(&'a self, type_name: &'a str) -> Vec<(&'a str, &'a Value)> {
        self.body
            .get("Resources")
            .and_then(Value::as_object)
            .map(|resources| {
                resources
                    .iter()
                    .filter(|(_, resource)| {
                        resource.get("Type").and_then(Value::as_str) == Some(type_name)
                    })
                    .map(|(logical_id, resource)| (logical_id.as_str(), resource))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn resource_count(&self, type_name: &str) -> usize {
        self.resources_of_type(type_name).len()
    }

    pub fn output_ids(&self) -> Vec<&str> {
        self.body
            .get("Outputs")
            .and_then(Value::as_object)
            .map(|outputs| outputs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
