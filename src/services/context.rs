use std::collections::HashMap;

/// What the transport knows about the caller of one tool invocation.
///
/// stdio delivers nothing; the HTTP transport copies its request headers here.
/// Header names are stored lowercased so lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    headers: HashMap<String, String>,
    session_id: Option<String>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut ctx = Self::default();
        for (name, value) in headers {
            ctx.insert_header(name.as_ref(), value);
        }
        ctx
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .insert(name.trim().to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}
