//! Mode descriptors: how each representation displays, parses and accepts conversions.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::{
    error::ValidationError,
    model::{is_json_container, MetadataMode, MetadataValue},
};

/// Default indent width for structured display text.
pub const DEFAULT_STRUCTURED_INDENT: usize = 4;

const SIMPLE_TO_STRUCTURED_MESSAGE: &str =
    "The simple field is not valid JSON and can not be converted.";
const INVALID_JSON_MESSAGE: &str = "The field contains invalid JSON and can not be saved.";
const NOT_A_CONTAINER_MESSAGE: &str =
    "The field must contain a JSON object or array to be saved as structured metadata.";

/// Predicate run against the pending raw text before a mode conversion.
pub type ValidatorFn = fn(&str) -> bool;

#[derive(Clone)]
/// Conversion gate declared by a target mode for one source mode.
pub struct ModeValidator {
    /// Source mode this validator applies to.
    pub from: MetadataMode,
    /// Returns `true` when the pending text may be converted.
    pub check: ValidatorFn,
    /// Warning shown when `check` rejects.
    pub message: Cow<'static, str>,
}

impl ModeValidator {
    /// Builds a validator for conversions out of `from`.
    pub fn new(
        from: MetadataMode,
        check: ValidatorFn,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            from,
            check,
            message: message.into(),
        }
    }
}

impl std::fmt::Debug for ModeValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeValidator")
            .field("from", &self.from)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Accepts text that parses as a JSON object or array.
///
/// Bare scalars such as `false` or `1234` are valid JSON but are rejected, since converting them
/// would produce a structured entry that is not a container.
pub fn parses_as_json_container(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw)
        .map(|value| is_json_container(&value))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
/// Behavior bundle for one mode.
pub struct ModeDescriptor {
    mode: MetadataMode,
    indent: usize,
    validators: Vec<ModeValidator>,
}

impl ModeDescriptor {
    fn new(mode: MetadataMode) -> Self {
        Self {
            mode,
            indent: DEFAULT_STRUCTURED_INDENT,
            validators: Vec::new(),
        }
    }

    /// Mode this descriptor describes.
    pub const fn mode(&self) -> MetadataMode {
        self.mode
    }

    /// Renders `value` as editor text for this mode.
    pub fn display_value(&self, value: &MetadataValue) -> String {
        let json = value.as_json();
        match self.mode {
            MetadataMode::Simple => match json {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
            MetadataMode::Structured => pretty_json(json, self.indent),
        }
    }

    /// Parses raw editor text into a value of this mode.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] when structured text is not a JSON container.
    pub fn parse(&self, raw: &str) -> Result<MetadataValue, ValidationError> {
        match self.mode {
            MetadataMode::Simple => Ok(MetadataValue::text(raw)),
            MetadataMode::Structured => {
                let value: Value =
                    serde_json::from_str(raw).map_err(|_| ValidationError::InvalidValue {
                        message: INVALID_JSON_MESSAGE.to_string(),
                    })?;
                if !is_json_container(&value) {
                    return Err(ValidationError::InvalidValue {
                        message: NOT_A_CONTAINER_MESSAGE.to_string(),
                    });
                }
                Ok(MetadataValue::Structured(value))
            }
        }
    }

    /// Returns the validator gating conversions from `from` into this mode, if one is declared.
    pub fn validator_from(&self, from: MetadataMode) -> Option<&ModeValidator> {
        self.validators.iter().find(|validator| validator.from == from)
    }
}

fn pretty_json(value: &Value, indent: usize) -> String {
    if indent == 0 {
        return value.to_string();
    }
    let indent = " ".repeat(indent);
    let mut out = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(indent.as_bytes()));
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(out).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

#[derive(Debug, Clone)]
/// Lookup table from [`MetadataMode`] to its [`ModeDescriptor`].
pub struct ModeTable {
    simple: ModeDescriptor,
    structured: ModeDescriptor,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::permissive().with_validator(
            MetadataMode::Structured,
            ModeValidator::new(
                MetadataMode::Simple,
                parses_as_json_container,
                SIMPLE_TO_STRUCTURED_MESSAGE,
            ),
        )
    }
}

impl ModeTable {
    /// Table without any conversion validators; every switch is permitted.
    pub fn permissive() -> Self {
        Self {
            simple: ModeDescriptor::new(MetadataMode::Simple),
            structured: ModeDescriptor::new(MetadataMode::Structured),
        }
    }

    /// Declares `validator` on the descriptor for `to`, replacing one for the same source mode.
    pub fn with_validator(mut self, to: MetadataMode, validator: ModeValidator) -> Self {
        let descriptor = self.descriptor_mut(to);
        descriptor
            .validators
            .retain(|existing| existing.from != validator.from);
        descriptor.validators.push(validator);
        self
    }

    /// Sets the indent width for structured display text. Zero renders compact JSON.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.simple.indent = indent;
        self.structured.indent = indent;
        self
    }

    /// Returns the descriptor for `mode`.
    pub fn descriptor(&self, mode: MetadataMode) -> &ModeDescriptor {
        match mode {
            MetadataMode::Simple => &self.simple,
            MetadataMode::Structured => &self.structured,
        }
    }

    fn descriptor_mut(&mut self, mode: MetadataMode) -> &mut ModeDescriptor {
        match mode {
            MetadataMode::Simple => &mut self.simple,
            MetadataMode::Structured => &mut self.structured,
        }
    }

    /// Runs the validator `to` declares for `from` against `pending`.
    ///
    /// A missing validator always permits the switch.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ModeConversionRejected`] with the descriptor's message.
    pub fn check_conversion(
        &self,
        from: MetadataMode,
        to: MetadataMode,
        pending: &str,
    ) -> Result<(), ValidationError> {
        let Some(validator) = self.descriptor(to).validator_from(from) else {
            return Ok(());
        };
        if (validator.check)(pending) {
            Ok(())
        } else {
            Err(ValidationError::ModeConversionRejected {
                from,
                to,
                message: validator.message.to_string(),
            })
        }
    }

    /// Renders `value` using the descriptor for its own mode.
    pub fn display_value(&self, value: &MetadataValue) -> String {
        self.descriptor(value.mode()).display_value(value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn structured_display_then_parse_is_identity() {
        let table = ModeTable::default();
        let value = MetadataValue::Structured(json!({"a": 1, "b": [true, null, "x"]}));

        let text = table.display_value(&value);
        assert!(text.contains("\n    \"a\": 1"));
        assert_eq!(
            table.descriptor(MetadataMode::Structured).parse(&text),
            Ok(value)
        );
    }

    #[test]
    fn simple_display_then_parse_is_identity() {
        let table = ModeTable::default();
        let value = MetadataValue::text("  spaced {not json} ");

        let text = table.display_value(&value);
        assert_eq!(table.descriptor(MetadataMode::Simple).parse(&text), Ok(value));
    }

    #[test]
    fn simple_display_renders_non_string_scalars_as_json_text() {
        let table = ModeTable::default();
        assert_eq!(table.display_value(&MetadataValue::Scalar(json!(1234))), "1234");
        assert_eq!(table.display_value(&MetadataValue::Scalar(json!(false))), "false");
    }

    #[test]
    fn structured_parse_rejects_malformed_and_scalar_json() {
        let structured = ModeTable::default();
        let structured = structured.descriptor(MetadataMode::Structured);

        assert!(matches!(
            structured.parse("{\"a\":"),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(matches!(
            structured.parse("1234"),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn default_table_gates_simple_to_structured_only() {
        let table = ModeTable::default();

        assert!(table
            .check_conversion(MetadataMode::Simple, MetadataMode::Structured, "{\"a\":1}")
            .is_ok());
        assert!(table
            .check_conversion(MetadataMode::Simple, MetadataMode::Structured, "[1, 2]")
            .is_ok());
        let rejected = table
            .check_conversion(MetadataMode::Simple, MetadataMode::Structured, "false")
            .expect_err("scalar json is rejected");
        assert_eq!(rejected.to_string(), SIMPLE_TO_STRUCTURED_MESSAGE);

        assert!(table
            .check_conversion(MetadataMode::Structured, MetadataMode::Simple, "anything")
            .is_ok());
    }

    #[test]
    fn permissive_table_allows_every_switch() {
        let table = ModeTable::permissive();
        for from in MetadataMode::ALL {
            for to in MetadataMode::ALL {
                assert!(table.check_conversion(from, to, "not json").is_ok());
            }
        }
    }

    #[test]
    fn zero_indent_renders_compact_json() {
        let table = ModeTable::default().with_indent(0);
        let value = MetadataValue::Structured(json!({"a": 1}));
        assert_eq!(table.display_value(&value), "{\"a\":1}");
    }
}
