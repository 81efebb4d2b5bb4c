// Rule parsing and evaluation

use crate::{UnknownRuleError, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$").unwrap()
});

/// One parsed rule from a `"required|min:3|email"` rule string.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    Email,
    Min(usize),
    Max(usize),
    Numeric,
    Integer,
}

impl Rule {
    /// Parse one `|`-separated token; the part after `:` is the argument.
    pub fn parse(token: &str) -> Result<Self, UnknownRuleError> {
        let (name, arg) = match token.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (token, None),
        };

        match name {
            "required" => Ok(Rule::Required),
            "email" => Ok(Rule::Email),
            "numeric" => Ok(Rule::Numeric),
            "integer" => Ok(Rule::Integer),
            "min" => Ok(Rule::Min(length_arg(name, arg)?)),
            "max" => Ok(Rule::Max(length_arg(name, arg)?)),
            other => Err(UnknownRuleError::new(format!(
                "Unknown validation rule [{}]",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Email => "email",
            Rule::Min(_) => "min",
            Rule::Max(_) => "max",
            Rule::Numeric => "numeric",
            Rule::Integer => "integer",
        }
    }

    /// Check `value` for `field`, producing the substituted message on
    /// failure.
    pub fn check(&self, field: &str, value: &str) -> Result<(), ValidationError> {
        let passed = match self {
            Rule::Required => !value.is_empty(),
            Rule::Email => EMAIL_REGEX.is_match(value),
            Rule::Min(min) => value.chars().count() >= *min,
            Rule::Max(max) => value.chars().count() <= *max,
            Rule::Numeric => value.parse::<f64>().is_ok(),
            Rule::Integer => value.parse::<i64>().is_ok(),
        };

        if passed {
            Ok(())
        } else {
            Err(ValidationError::new(field, self.name(), self.message(field)))
        }
    }

    fn message(&self, field: &str) -> String {
        let template = match self {
            Rule::Required => "The :attribute field is required.",
            Rule::Email => "The :attribute must be a valid email address.",
            Rule::Min(_) => "The :attribute must be at least :min characters.",
            Rule::Max(_) => "The :attribute may not be greater than :max characters.",
            Rule::Numeric => "The :attribute must be a number.",
            Rule::Integer => "The :attribute must be an integer.",
        };

        let mut message = template.replace(":attribute", field);
        match self {
            Rule::Min(min) => message = message.replace(":min", &min.to_string()),
            Rule::Max(max) => message = message.replace(":max", &max.to_string()),
            _ => {}
        }
        message
    }
}

fn length_arg(name: &str, arg: Option<&str>) -> Result<usize, UnknownRuleError> {
    let arg = arg.ok_or_else(|| {
        UnknownRuleError::new(format!("Rule [{}] requires a numeric argument", name))
    })?;
    arg.trim().parse().map_err(|_| {
        UnknownRuleError::new(format!(
            "Rule [{}] requires a numeric argument, got [{}]",
            name, arg
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule_tokens() {
        assert_eq!(Rule::parse("required").unwrap(), Rule::Required);
        assert_eq!(Rule::parse("min:3").unwrap(), Rule::Min(3));
        assert_eq!(Rule::parse("max:10").unwrap(), Rule::Max(10));
        assert!(Rule::parse("exists").is_err());
        assert!(Rule::parse("min:three").is_err());
        assert!(Rule::parse("min").is_err());
    }

    #[test]
    fn test_min_counts_characters_not_bytes() {
        assert!(Rule::Min(3).check("name", "héé").is_ok());
        assert!(Rule::Min(4).check("name", "héé").is_err());
    }

    #[test]
    fn test_messages_substitute_placeholders() {
        let err = Rule::Min(3).check("name", "ab").unwrap_err();
        assert_eq!(err.message, "The name must be at least 3 characters.");

        let err = Rule::Required.check("email", "").unwrap_err();
        assert_eq!(err.message, "The email field is required.");
    }

    #[test]
    fn test_numeric_and_integer() {
        assert!(Rule::Numeric.check("age", "3.14").is_ok());
        assert!(Rule::Integer.check("age", "3.14").is_err());
        assert!(Rule::Integer.check("age", "42").is_ok());
        assert!(Rule::Numeric.check("age", "abc").is_err());
    }
}
