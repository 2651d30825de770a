use hyper::StatusCode;

/// Outgoing HTTP response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: Option<&str>) -> Self {
        let body = message.unwrap_or("Unauthorized");
        Self::new(StatusCode::UNAUTHORIZED)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body.as_bytes().to_vec())
    }

    /// 503 Service Unavailable (store outage)
    pub fn service_unavailable(message: Option<&str>) -> Self {
        let body = message.unwrap_or("Service Unavailable");
        Self::new(StatusCode::SERVICE_UNAVAILABLE)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body.as_bytes().to_vec())
    }

    /// 500 Internal Server Error
    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_body("Internal Server Error".as_bytes().to_vec())
    }

    /// 302 redirect
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::FOUND).with_header("Location", location)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Add a header, allowing duplicates (needed for Set-Cookie)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Get the first header with the given case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get all headers with the given case-insensitive name
    pub fn headers_named(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_set_cookie_headers() {
        let mut res = Response::ok();
        res.add_header("Set-Cookie", "a=1");
        res.add_header("Set-Cookie", "b=2");
        assert_eq!(res.headers_named("set-cookie").len(), 2);
    }
}
