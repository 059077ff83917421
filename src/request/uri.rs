use url::form_urlencoded;

/// Append `params` to `uri` as a query string. Returns `uri` unchanged when
/// there are no parameters.
pub fn construct_uri_with_parameters<K, V>(uri: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if params.is_empty() {
        return uri.to_string();
    }

    let query = encode_form(params);
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}{query}")
}

/// `application/x-www-form-urlencoded` body for `pairs`
pub fn encode_form<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_parameters_returns_uri() {
        let params: [(&str, &str); 0] = [];
        assert_eq!(
            construct_uri_with_parameters("http://example.com/a", &params),
            "http://example.com/a"
        );
    }

    #[test]
    fn test_parameters_are_appended_in_order() {
        let uri = construct_uri_with_parameters(
            "http://example.com/search",
            &[("q", "rust"), ("page", "2")],
        );
        assert_eq!(uri, "http://example.com/search?q=rust&page=2");
    }

    #[test]
    fn test_existing_query_is_extended() {
        let uri = construct_uri_with_parameters("http://example.com/?a=1", &[("b", "2")]);
        assert_eq!(uri, "http://example.com/?a=1&b=2");
    }

    #[test]
    fn test_values_are_encoded() {
        assert_eq!(encode_form(&[("name", "a b&c")]), "name=a+b%26c");
    }
}
