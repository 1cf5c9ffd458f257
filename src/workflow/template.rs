use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::{NodeflowError, Result, runtime::Context, workflow::consts::INVALID_CONFIG};

/// Output template variables.
/// Format: `{{#nodeId.key#}}` or `{{#nodeId.key.subkey#}}`
static OUTPUT_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{#([^.#]+)\.([^#]+)#\}\}").unwrap());
/// Output templates or execution variables in the format `{{$name$}}`.
static ANY_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{#([^.#]+)\.([^#]+)#\}\}|\{\{\$([^$]+)\$\}\}").unwrap());

/// Follow a dotted path through objects and arrays, e.g. `user.emails.0`.
/// An empty path returns the value itself.
pub fn lookup_path<'a>(
    value: &'a Value,
    path: &str,
) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve template variables in the format `{{#nodeId.key#}}` and `{{$name$}}`.
/// Returns an `INVALID_CONFIG` exception if any template variable cannot be resolved.
pub fn resolve_template(
    ctx: &Context,
    template: &str,
) -> Result<String> {
    let mut errors: Vec<String> = Vec::new();

    // substituted text is never scanned again
    let result = ANY_TEMPLATE
        .replace_all(template, |caps: &Captures| {
            let resolved = match caps.get(3) {
                Some(name) => ctx.variable(name.as_str()).map(|value| render(&value)).ok_or_else(|| format!("variable '{}' not found", name.as_str())),
                None => ctx
                    .output(&caps[1])
                    .and_then(|outputs| lookup_path(&outputs, &caps[2]).map(render))
                    .ok_or_else(|| format!("output '{}' not found", &caps[0])),
            };
            resolved.unwrap_or_else(|e| {
                errors.push(e);
                String::new()
            })
        })
        .into_owned();

    if !errors.is_empty() {
        return Err(NodeflowError::exception(INVALID_CONFIG, errors.join(", ")));
    }

    Ok(result)
}

/// Resolve template variables in a JSON Value recursively.
/// A string that is exactly one template keeps the referenced value's JSON type.
pub fn resolve_json_value(
    ctx: &Context,
    value: &Value,
) -> Result<Value> {
    match value {
        Value::String(s) => {
            if let Some(caps) = OUTPUT_TEMPLATE.captures(s) {
                if caps[0].len() == s.len() {
                    return ctx
                        .output(&caps[1])
                        .and_then(|outputs| lookup_path(&outputs, &caps[2]).cloned())
                        .ok_or_else(|| NodeflowError::exception(INVALID_CONFIG, format!("output '{}' not found", s)));
                }
            }
            Ok(Value::String(resolve_template(ctx, s)?))
        }
        Value::Array(arr) => {
            let resolved: Result<Vec<Value>> = arr.iter().map(|v| resolve_json_value(ctx, v)).collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(obj) => {
            let resolved: Result<serde_json::Map<String, Value>> = obj.iter().map(|(k, v)| resolve_json_value(ctx, v).map(|rv| (k.clone(), rv))).collect();
            Ok(Value::Object(resolved?))
        }
        _ => Ok(value.clone()),
    }
}
