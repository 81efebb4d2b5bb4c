// Rule-string input validation for the Trellis framework
//
// `Validator::new(data, rules)` parses `"field" -> "required|min:3"`
// rule strings and evaluates them immediately; the result is inspected
// through `passes()`, `fails()`, and `errors()`.

pub mod errors;
pub mod rules;

pub use errors::{UnknownRuleError, ValidationError, ValidationErrors};
pub use rules::Rule;

use std::collections::HashMap;

/// A completed validation run.
#[derive(Debug)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    /// Parse the rule strings and validate `data` against them.
    ///
    /// A missing field validates as an empty string, so `required`
    /// catches absent and blank input alike. Unknown rule names reject
    /// the whole rule set rather than silently passing.
    pub fn new(
        data: &HashMap<String, String>,
        rules: &HashMap<String, String>,
    ) -> Result<Self, UnknownRuleError> {
        let mut fields: Vec<(&String, &String)> = rules.iter().collect();
        fields.sort_by_key(|(field, _)| field.as_str());

        let mut errors = ValidationErrors::default();
        for (field, rule_string) in fields {
            let value = data.get(field).map(String::as_str).unwrap_or("");
            for token in rule_string.split('|').filter(|t| !t.is_empty()) {
                let rule = Rule::parse(token)?;
                if let Err(error) = rule.check(field, value) {
                    errors.add(error);
                }
            }
        }

        Ok(Self { errors })
    }

    pub fn passes(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fails(&self) -> bool {
        !self.passes()
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Consume the run, keeping only the errors.
    pub fn into_errors(self) -> ValidationErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_passing_input() {
        let validator = Validator::new(
            &data(&[("name", "ada"), ("email", "ada@example.com")]),
            &data(&[("name", "required|min:3"), ("email", "required|email")]),
        )
        .unwrap();

        assert!(validator.passes());
        assert!(!validator.fails());
    }

    #[test]
    fn test_missing_field_fails_required() {
        let validator = Validator::new(
            &data(&[]),
            &data(&[("name", "required")]),
        )
        .unwrap();

        assert!(validator.fails());
        assert_eq!(
            validator.errors().first("name"),
            Some("The name field is required.")
        );
    }

    #[test]
    fn test_multiple_rules_collect_multiple_errors() {
        let validator = Validator::new(
            &data(&[("email", "nope")]),
            &data(&[("email", "email|min:10")]),
        )
        .unwrap();

        let errors = validator.errors().get_field_errors("email");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unknown_rule_rejects_rule_set() {
        let result = Validator::new(
            &data(&[("name", "ada")]),
            &data(&[("name", "required|exists:users")]),
        );

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("exists"));
    }

    #[test]
    fn test_errors_serialize_to_json() {
        let validator = Validator::new(
            &data(&[("age", "abc")]),
            &data(&[("age", "integer")]),
        )
        .unwrap();

        let json = validator.errors().to_json();
        assert_eq!(json["errors"][0]["field"], "age");
        assert_eq!(json["errors"][0]["rule"], "integer");
    }
}
