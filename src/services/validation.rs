use crate::errors::ToolError;
use serde_json::Value;

/// Argument checks shared by the tool handlers.
///
/// Schema validation already ran by the time these are called; what remains
/// is trimming and the rules a JSON Schema cannot express well.
#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<String, ToolError> {
        let text = value.and_then(Value::as_str).ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(normalized.to_string())
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
            Some(val) => self.ensure_string(Some(val), label).map(Some),
        }
    }

    /// Values interpolated into a URL path: one segment, no traversal.
    pub fn ensure_identifier(&self, value: Option<&Value>, label: &str) -> Result<String, ToolError> {
        let text = self.ensure_string(value, label)?;
        let valid = text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && text != "."
            && text != "..";
        if !valid {
            return Err(ToolError::invalid_params(format!(
                "{} may only contain letters, digits, '-', '_' and '.'",
                label
            ))
            .with_details(serde_json::json!({ "field": label })));
        }
        Ok(text)
    }

    pub fn ensure_optional_bool(
        &self,
        value: Option<&Value>,
        label: &str,
        fallback: bool,
    ) -> Result<bool, ToolError> {
        match value {
            None | Some(Value::Null) => Ok(fallback),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(_) => Err(ToolError::invalid_params(format!(
                "{} must be a boolean",
                label
            ))),
        }
    }

    pub fn ensure_positive_int(
        &self,
        value: Option<&Value>,
        label: &str,
        fallback: u64,
    ) -> Result<u64, ToolError> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(fallback);
        };
        match value.as_u64() {
            Some(number) if number > 0 => Ok(number),
            _ => Err(ToolError::invalid_params(format!(
                "{} must be a positive integer",
                label
            ))),
        }
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}
