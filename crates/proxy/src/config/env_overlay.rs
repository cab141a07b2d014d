use serde_json::Value;

/// Overlay environment variable overrides onto a parsed config tree.
///
/// An env var named `{prefix}_SERVER__PORT` overrides `server.port`: the
/// prefix is stripped, the remainder lowercased, and `__` splits path
/// segments (snake_case field names already contain single underscores,
/// so a double underscore is the only unambiguous segment separator).
/// Values are parsed as JSON when possible (`"true"`, `"9090"`) so
/// booleans and numbers round-trip; anything else is kept as a string.
pub fn apply_env_overrides(value: &mut Value, prefix: &str) {
    let prefix = format!("{}_", prefix.to_uppercase());

    for (key, raw) in std::env::vars() {
        let Some(rest) = key.strip_prefix(&prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let path: Vec<String> = rest.to_lowercase().split("__").map(String::from).collect();
        set_path(value, &path, parse_env_value(&raw));
    }
}

fn parse_env_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn set_path(root: &mut Value, path: &[String], leaf: Value) {
    if path.is_empty() {
        return;
    }
    if !root.is_object() {
        *root = Value::Object(serde_json::Map::new());
    }
    let obj = root.as_object_mut().expect("just coerced to object");

    if path.len() == 1 {
        obj.insert(path[0].clone(), leaf);
        return;
    }

    let child = obj.entry(path[0].clone()).or_insert_with(|| Value::Object(serde_json::Map::new()));
    set_path(child, &path[1..], leaf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_a_nested_scalar() {
        let mut value = json!({"server": {"port": 8080}});
        let mut path_value = value.clone();
        set_path(&mut path_value, &["server".into(), "port".into()], json!(9090));
        assert_eq!(path_value["server"]["port"], 9090);
        let _ = value.take();
    }

    #[test]
    fn parses_booleans_and_numbers_but_keeps_plain_strings() {
        assert_eq!(parse_env_value("true"), json!(true));
        assert_eq!(parse_env_value("42"), json!(42));
        assert_eq!(parse_env_value("block"), json!("block"));
    }

    #[test]
    fn creates_missing_intermediate_objects() {
        let mut value = json!({});
        set_path(
            &mut value,
            &["security".into(), "rate_limit".into(), "enabled".into()],
            json!(false),
        );
        assert_eq!(value["security"]["rate_limit"]["enabled"], false);
    }
}
