use serde_json::{Map, Value};

/// Shallow-merges `objects` into a new map; later maps win key by key.
pub fn object_assign<'a, I>(objects: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    objects.into_iter().fold(Map::new(), |mut merged, object| {
        for (key, value) in object {
            merged.insert(key.clone(), value.clone());
        }
        merged
    })
}

/// `redirectUri` -> `redirect_uri`.
pub fn camel_case_to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// JavaScript-style truthiness, used to decide whether a setting counts as provided.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn object_assign_merges_as_a_new_object() {
        let a = as_map(json!({"prop1": 1, "prop2": "a"}));
        let mut b = as_map(json!({"prop1": 2, "prop3": "b"}));
        let merged = object_assign([&a, &b]);

        assert_eq!(merged["prop1"], json!(2));
        assert_eq!(merged["prop2"], json!("a"));
        assert_eq!(merged["prop3"], json!("b"));

        b.insert("prop1".into(), json!(3));
        assert_eq!(merged["prop1"], json!(2));
    }

    #[test]
    fn camel_case_becomes_snake_case() {
        assert_eq!(camel_case_to_snake_case("clientId"), "client_id");
        assert_eq!(
            camel_case_to_snake_case("postLogoutRedirectUri"),
            "post_logout_redirect_uri"
        );
        assert_eq!(camel_case_to_snake_case("scope"), "scope");
    }

    #[test]
    fn truthiness_follows_javascript() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(null))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(is_truthy(Some(&json!("openid"))));
        assert!(is_truthy(Some(&json!([]))));
    }
}
