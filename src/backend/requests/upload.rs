use crate::backend::requests::{Request, RequestBody, UA};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use std::borrow::Cow;

/// POST of a fixed-size payload to the upload sink.
pub(crate) struct Upload {
    data: Bytes,
}

impl Upload {
    pub fn new(bytes: u64) -> Self {
        // Zeros are cheap to generate and the server discards them anyway.
        let data = Bytes::from(vec![b'0'; bytes as usize]);

        Self { data }
    }

    pub fn bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

impl Request for Upload {
    type Response = ();

    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/__up".into()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static(UA));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );

        headers
    }

    fn body(&self) -> RequestBody {
        RequestBody::Bytes(self.data.clone())
    }
}
