//! Ordered, multi-valued HTTP header collection.
//!
//! Duplicates (`Cookie`, `Set-Cookie`, ...) are preserved in wire order;
//! lookups are case-insensitive.

/// Header list preserving wire order and duplicates.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `name` in wire order, case-insensitive.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All entries in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse `name: value` lines. Lines without a colon are rejected.
    pub(crate) fn parse_lines<'a>(
        lines: impl Iterator<Item = &'a str>,
    ) -> Result<Self, String> {
        let mut headers = Self::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) => headers.push(name.trim(), value.trim()),
                None => return Err(format!("header line without colon: {line:?}")),
            }
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_lookup() {
        let mut h = Headers::new();
        h.push("Content-Type", "text/html");
        assert_eq!(h.get("content-type"), Some("text/html"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(h.get("content-length"), None);
    }

    #[test]
    fn duplicates_preserved_in_order() {
        let mut h = Headers::new();
        h.push("Set-Cookie", "a=1");
        h.push("Content-Length", "0");
        h.push("Set-Cookie", "b=2");
        let cookies: Vec<_> = h.get_all("set-cookie").collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(h.get("set-cookie"), Some("a=1"));
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn parse_lines_trims() {
        let h = Headers::parse_lines("Host: example.com\r\nAccept:  */*".split("\r\n")).unwrap();
        assert_eq!(h.get("host"), Some("example.com"));
        assert_eq!(h.get("accept"), Some("*/*"));
    }

    #[test]
    fn parse_lines_rejects_garbage() {
        assert!(Headers::parse_lines("not a header".split("\r\n")).is_err());
    }
}
