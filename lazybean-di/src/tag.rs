//! Field tags are small directive strings attached to bean fields, e.g.
//! `#[bean(tag = "path=server.port")]`. A tag consists of `;`-separated clauses, each being either
//! a bare `key` or `key=value`. Recognized keys:
//!
//! * `ignore` - skip the field during injection (any value is ignored)
//! * `path=<path>` - configuration path used to look up a value field
//! * `beanName=<name>` - resolve a bean field by name instead of by type only

use crate::error::Error;

const CLAUSE_SEPARATOR: char = ';';
const VALUE_SEPARATOR: char = '=';

const IGNORE_KEY: &str = "ignore";
const PATH_KEY: &str = "path";
const BEAN_NAME_KEY: &str = "beanName";

/// Parsed field tag.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Directive {
    pub ignore: bool,
    pub value_path: String,
    pub bean_name: String,
}

impl Directive {
    /// Parses given tag. Empty or whitespace-only tags result in a default directive.
    pub fn parse(tag: &str) -> Result<Self, Error> {
        let mut directive = Self::default();
        if tag.trim().is_empty() {
            return Ok(directive);
        }

        for clause in tag.split(CLAUSE_SEPARATOR) {
            let mut parts = clause.split(VALUE_SEPARATOR);
            let key = parts.next().unwrap_or_default();
            let value = parts.next();

            if parts.next().is_some() {
                return Err(Error::ParseTag(format!(
                    "clause '{clause}' contains more than one '{VALUE_SEPARATOR}'"
                )));
            }

            match key {
                IGNORE_KEY => directive.ignore = true,
                PATH_KEY => directive.value_path = non_empty_value(key, value)?,
                BEAN_NAME_KEY => directive.bean_name = non_empty_value(key, value)?,
                _ => return Err(Error::ParseTag(format!("unknown key '{key}' in tag '{tag}'"))),
            }
        }

        Ok(directive)
    }
}

fn non_empty_value(key: &str, value: Option<&str>) -> Result<String, Error> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(Error::ParseTag(format!("'{key}' requires a non-empty value"))),
    }
}
