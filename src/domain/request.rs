use std::collections::BTreeMap;

use serde_json::Value;

/// A single generation call before execution.
///
/// Content accumulates line by line; `model` and `max_tokens` are optional
/// overrides of the serving provider's defaults. Extension attributes carry
/// caller-defined fields without schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    content: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    attributes: BTreeMap<String, Value>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = Some(content.into());
        self
    }

    pub fn add_content(&mut self, content: impl AsRef<str>) -> &mut Self {
        let content = content.as_ref();
        match self.content.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(content);
            }
            None => self.content = Some(content.to_string()),
        }
        self
    }

    pub fn set_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.model = Some(model.into());
        self
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> &mut Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Numeric extension attribute, ignoring values of any other JSON type.
    pub fn number_attribute(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }
}
