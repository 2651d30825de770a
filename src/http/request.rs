use std::collections::HashMap;

/// Incoming HTTP request
///
/// A deliberately small surface: the session and auth layers only need the
/// method, path, headers (cookies) and an optional form body. Header names
/// are stored lowercase.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: &str, uri: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            uri: uri.to_string(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Set a header (name is lowercased), builder-style
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Get a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Get request path from the URI, without the query string
    pub fn path(&self) -> &str {
        match self.uri.find('?') {
            Some(query_start) => &self.uri[..query_start],
            None => &self.uri,
        }
    }

    /// Get cookie value by name
    pub fn cookie(&self, name: &str) -> Option<String> {
        let cookie_header = self.headers.get("cookie")?;
        Self::parse_cookies(cookie_header).get(name).cloned()
    }

    /// Parse a Cookie header into name/value pairs
    fn parse_cookies(cookie_header: &str) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        for pair in cookie_header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
        cookies
    }

    /// Parse an application/x-www-form-urlencoded body into a map
    ///
    /// Handles the percent escapes login forms actually produce; anything
    /// undecodable is kept verbatim.
    pub fn body_as_form(&self) -> HashMap<String, String> {
        let body = String::from_utf8_lossy(&self.body);
        let mut result = HashMap::new();
        for pair in body.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                result.insert(Self::url_decode(key), Self::url_decode(value));
            }
        }
        result
    }

    /// Percent-decoding works on raw bytes so multi-byte UTF-8 sequences
    /// survive; the UTF-8 check happens once at the end.
    fn url_decode(input: &str) -> String {
        let bytes = input.as_bytes();
        let mut decoded = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'+' => decoded.push(b' '),
                b'%' => {
                    if let Some(byte) = bytes
                        .get(i + 1..i + 3)
                        .and_then(Self::decode_hex_pair)
                    {
                        decoded.push(byte);
                        i += 3;
                        continue;
                    }
                    // Malformed escape is kept verbatim
                    decoded.push(b'%');
                }
                other => decoded.push(other),
            }
            i += 1;
        }

        match String::from_utf8(decoded) {
            Ok(s) => s,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }

    fn decode_hex_pair(hex: &[u8]) -> Option<u8> {
        let hi = (hex[0] as char).to_digit(16)?;
        let lo = (hex[1] as char).to_digit(16)?;
        Some((hi * 16 + lo) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let req = Request::new("GET", "/dashboard")
            .with_header("Cookie", "authgate.sid=abc123; theme=dark");

        assert_eq!(req.cookie("authgate.sid"), Some("abc123".to_string()));
        assert_eq!(req.cookie("theme"), Some("dark".to_string()));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn test_path_strips_query() {
        let req = Request::new("GET", "/login?next=%2Fadmin");
        assert_eq!(req.path(), "/login");
    }

    #[test]
    fn test_form_body_parsing() {
        let req = Request::new("POST", "/login")
            .with_body(b"email=a%40b.com&password=secret+word".to_vec());
        let form = req.body_as_form();
        assert_eq!(form.get("email"), Some(&"a@b.com".to_string()));
        assert_eq!(form.get("password"), Some(&"secret word".to_string()));
    }

    #[test]
    fn test_form_body_decodes_multibyte_utf8() {
        // Percent escapes covering a 2-byte UTF-8 sequence must decode to
        // one scalar, not one Latin-1 char per byte
        let req = Request::new("POST", "/login")
            .with_body(b"password=caf%C3%A9&name=J%C3%BCrgen".to_vec());
        let form = req.body_as_form();
        assert_eq!(form.get("password"), Some(&"café".to_string()));
        assert_eq!(form.get("name"), Some(&"Jürgen".to_string()));
    }

    #[test]
    fn test_malformed_escape_kept_verbatim() {
        let req = Request::new("POST", "/login").with_body(b"q=100%25&bad=50%ZZ".to_vec());
        let form = req.body_as_form();
        assert_eq!(form.get("q"), Some(&"100%".to_string()));
        assert_eq!(form.get("bad"), Some(&"50%ZZ".to_string()));
    }
}
