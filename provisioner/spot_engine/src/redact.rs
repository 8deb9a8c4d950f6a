use serde::Serialize;
use serde_json::Value;

pub const REDACTED: &str = "<redacted>";

// Serialize `value` for logging with each dotted path masked.
// Paths that are absent are left alone.
pub fn redacted_json<T: Serialize>(value: &T, paths: &[&str]) -> String {
    let mut value = match serde_json::to_value(value) {
        Ok(value) => value,
        Err(e) => return format!("<unserializable: {}>", e),
    };

    for path in paths {
        redact_path(&mut value, path);
    }

    value.to_string()
}

fn redact_path(value: &mut Value, path: &str) {
    let mut segments = path.split('.').peekable();
    let mut current = value;

    while let Some(segment) = segments.next() {
        let Some(object) = current.as_object_mut() else {
            return;
        };

        if segments.peek().is_none() {
            if let Some(field) = object.get_mut(segment) {
                *field = Value::String(REDACTED.to_string());
            }
            return;
        }

        match object.get_mut(segment) {
            Some(next) => current = next,
            None => return,
        }
    }
}
