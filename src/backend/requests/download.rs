use crate::backend::requests::{Request, UA};
use reqwest::header::{
    HeaderMap, HeaderValue, CACHE_CONTROL, CONNECTION, USER_AGENT,
};
use std::borrow::Cow;

#[derive(Debug, Copy, Clone)]
pub(crate) struct Download {
    pub bytes: u64,
}

impl Request for Download {
    type Response = String;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/__down?bytes={}", self.bytes).into()
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(USER_AGENT, HeaderValue::from_static(UA));

        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        headers
    }
}
