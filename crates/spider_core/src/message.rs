use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub method: String,
    pub uri: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: u16,
    pub content_type: Option<String>,
}

impl ResponseHeader {
    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or(ct)
                .trim()
                .to_ascii_lowercase()
        })
    }

    pub fn is_image(&self) -> bool {
        self.media_type()
            .is_some_and(|media| media.starts_with("image/"))
    }

    pub fn is_html(&self) -> bool {
        self.media_type()
            .is_some_and(|media| media == "text/html" || media == "application/xhtml+xml")
    }
}

/// A request/response pair as recorded in the site tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMessage {
    pub request: RequestHeader,
    pub response: ResponseHeader,
    pub body: Vec<u8>,
}

impl HttpMessage {
    pub fn new(method: impl Into<String>, uri: Url) -> Self {
        Self {
            request: RequestHeader {
                method: method.into(),
                uri,
            },
            response: ResponseHeader {
                status: 0,
                content_type: None,
            },
            body: Vec::new(),
        }
    }

    pub fn get(uri: Url) -> Self {
        Self::new("GET", uri)
    }

    pub fn with_response(mut self, status: u16, content_type: Option<&str>) -> Self {
        self.response = ResponseHeader {
            status,
            content_type: content_type.map(ToOwned::to_owned),
        };
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn uri(&self) -> &Url {
        &self.request.uri
    }
}
