#![forbid(unsafe_code)]

//! Query-string codec shared by the host and editor sides.
//!
//! Both sides encode editing coordinates (`x`, `y`, `ph`, ...) and
//! cache-busting tokens into URLs with these helpers. Parsing is
//! best-effort: the input is split on `&`, then on the first `=`, and
//! percent/`+` escapes are decoded. Nothing here can fail.
//!
//! A mutation value of `None` removes the key, mirroring [`stringify`]
//! omitting absent values.

use url::form_urlencoded;

/// Parse a query string (with or without a leading `?`) into ordered pairs.
///
/// Empty segments are skipped; a segment without `=` yields an empty value.
#[must_use]
pub fn parse(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// First value for `key` in `query`, if any.
#[must_use]
pub fn value_of(query: &str, key: &str) -> Option<String> {
    parse(query)
        .into_iter()
        .find_map(|(k, v)| (k == key).then_some(v))
}

/// Serialize a flat mapping, skipping `None` values.
pub fn stringify<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if let Some(value) = value {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
    }
    serializer.finish()
}

/// Merge `params` into `current` and return the resulting query (no `?`).
///
/// Existing keys are overwritten at their first position (later duplicates
/// of a mutated key are dropped), new keys are appended in the order given,
/// and untouched keys keep both their value and position.
pub fn mutate<I, K, V>(current: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, Option<String>)> = parse(current)
        .into_iter()
        .map(|(key, value)| (key, Some(value)))
        .collect();

    for (key, value) in params {
        let key = key.as_ref();
        let value = value.map(|v| v.as_ref().to_owned());
        let mut seen = false;
        pairs.retain_mut(|(existing, slot)| {
            if existing != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *slot = value.clone();
            true
        });
        if !seen {
            pairs.push((key.to_owned(), value));
        }
    }

    stringify(pairs)
}

/// Apply [`mutate`] to the query of an arbitrary URL.
///
/// Scheme, authority, path, and fragment are preserved verbatim. A URL
/// without a query gains one; a mutation that empties the query drops the `?`.
pub fn mutate_url<I, K, V>(url: &str, params: I) -> String
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let (without_fragment, fragment) = match url.find('#') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };
    let (base, query) = match without_fragment.find('?') {
        Some(idx) => (&without_fragment[..idx], &without_fragment[idx + 1..]),
        None => (without_fragment, ""),
    };

    let query = mutate(query, params);
    if query.is_empty() {
        format!("{base}{fragment}")
    } else {
        format!("{base}?{query}{fragment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_is_best_effort() {
        assert_eq!(
            parse("?a=1&&b&c=x=y&d=%7B%7D"),
            vec![
                ("a".to_owned(), "1".to_owned()),
                ("b".to_owned(), String::new()),
                ("c".to_owned(), "x=y".to_owned()),
                ("d".to_owned(), "{}".to_owned()),
            ]
        );
    }

    #[test]
    fn stringify_skips_absent_values() {
        let out = stringify([("a", Some("1")), ("b", None), ("c", Some("two words"))]);
        assert_eq!(out, "a=1&c=two+words");
    }

    #[test]
    fn mutate_overwrites_in_place_and_appends() {
        let out = mutate("view=home&x=1&theme=dark", [("x", Some("4")), ("y", Some("2"))]);
        assert_eq!(out, "view=home&x=4&theme=dark&y=2");
    }

    #[test]
    fn mutate_with_none_removes_key() {
        let out = mutate("x=1&y=2", [("x", None::<&str>)]);
        assert_eq!(out, "y=2");
    }

    #[test]
    fn mutate_collapses_duplicates_of_mutated_key_only() {
        let out = mutate("a=1&t=1&a=2&t=2", [("a", Some("9"))]);
        assert_eq!(out, "a=9&t=1&t=2");
    }

    #[test]
    fn mutate_url_keeps_path_and_fragment() {
        let out = mutate_url(
            "https://shop.example/page/about?x=0#cells",
            [("x", Some("3")), ("y", Some("1"))],
        );
        assert_eq!(out, "https://shop.example/page/about?x=3&y=1#cells");
    }

    #[test]
    fn mutate_url_without_existing_query() {
        let out = mutate_url("/live/sidebar", [("ph", Some("hero"))]);
        assert_eq!(out, "/live/sidebar?ph=hero");
    }

    #[test]
    fn mutate_url_emptied_query_drops_separator() {
        let out = mutate_url("/p?_xt=5#top", [("_xt", None::<&str>)]);
        assert_eq!(out, "/p#top");
    }

    #[test]
    fn value_of_reads_first_match() {
        assert_eq!(value_of("?ph=hero&ph=footer", "ph").as_deref(), Some("hero"));
        assert_eq!(value_of("ph=hero", "x"), None);
    }
}
