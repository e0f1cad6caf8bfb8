//! Reading the configuration file.
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use apollo_typegen::Configuration;
use serde_json::Value;

/// Reads a YAML or JSON configuration, expanding `${env.NAME}` references in string values.
pub(crate) fn load(path: &Path) -> Result<Configuration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read configuration {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid configuration {}", path.display()))
}

pub(crate) fn parse(text: &str) -> Result<Configuration> {
    let mut value: Value = serde_yaml::from_str(text)?;
    expand(&mut value)?;
    Ok(Configuration::from_json(value)?)
}

fn expand(value: &mut Value) -> Result<()> {
    match value {
        Value::String(string) => {
            let expanded = shellexpand::env_with_context(string.as_str(), context)?.into_owned();
            if expanded != *string {
                *value = coerce(&expanded);
            }
        }
        Value::Array(values) => {
            for value in values {
                expand(value)?;
            }
        }
        Value::Object(object) => {
            for value in object.values_mut() {
                expand(value)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Only `env.` keys are looked up, other `$` sequences are left as written.
fn context(key: &str) -> Result<Option<String>, std::env::VarError> {
    match key.strip_prefix("env.") {
        Some(name) => std::env::var(name).map(Some),
        None => Ok(None),
    }
}

/// The expansion may have produced a primitive.
fn coerce(expanded: &str) -> Value {
    match serde_yaml::from_str(expanded) {
        Ok(Value::Bool(b)) => Value::Bool(b),
        Ok(Value::Number(n)) => Value::Number(n),
        Ok(Value::Null) => Value::Null,
        _ => Value::String(expanded.to_string()),
    }
}
