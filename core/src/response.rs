//! Per-call response metadata and the typed result wrapper.

use crate::error::AppError;
use crate::http::{HttpResponse, HEADER_ETAG_SERVER, HEADER_REQUEST_ID, HEADER_VERSION_ID};

/// Metadata reflected by the server for one call.
///
/// When `status_code` indicates failure, `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub request_id: String,
    pub etag: String,
    pub server_version: String,
    pub error: Option<AppError>,
}

impl Response {
    pub(crate) fn from_http(response: &HttpResponse) -> Self {
        let header = |name| response.header(name).unwrap_or_default().to_string();
        Self {
            status_code: response.status,
            request_id: header(HEADER_REQUEST_ID),
            etag: header(HEADER_ETAG_SERVER),
            server_version: header(HEADER_VERSION_ID),
            error: None,
        }
    }

    pub fn is_not_modified(&self) -> bool {
        self.status_code == 304
    }

    pub fn error_id(&self) -> &str {
        self.error.as_ref().map_or("", |error| error.id.as_str())
    }
}

/// Typed payload plus metadata of a call that did not fail.
///
/// `data` is `None` only when the server answered 304 Not Modified.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub response: Response,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, response: Response) -> Self {
        Self {
            data: Some(data),
            response,
        }
    }

    pub fn not_modified(response: Response) -> Self {
        Self {
            data: None,
            response,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: self.data.map(f),
            response: self.response,
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseBody;

    #[test]
    fn metadata_reads_reflected_headers() {
        let http = HttpResponse {
            status: 200,
            headers: vec![
                ("x-request-id".to_string(), "req-1".to_string()),
                ("etag".to_string(), "abc.123".to_string()),
                ("x-version-id".to_string(), "4.0.0".to_string()),
            ],
            body: ResponseBody::empty(),
        };
        let meta = Response::from_http(&http);
        assert_eq!(meta.status_code, 200);
        assert_eq!(meta.request_id, "req-1");
        assert_eq!(meta.etag, "abc.123");
        assert_eq!(meta.server_version, "4.0.0");
        assert!(meta.error.is_none());
        assert!(!meta.is_not_modified());
    }

    #[test]
    fn missing_headers_default_to_empty() {
        let http = HttpResponse {
            status: 304,
            headers: Vec::new(),
            body: ResponseBody::empty(),
        };
        let meta = Response::from_http(&http);
        assert!(meta.is_not_modified());
        assert_eq!(meta.request_id, "");
        assert_eq!(meta.error_id(), "");
    }

    #[test]
    fn map_keeps_metadata() {
        let resp = ApiResponse::new(2, Response::default()).map(|n| n * 2);
        assert_eq!(resp.data, Some(4));
        let none: ApiResponse<i32> = ApiResponse::not_modified(Response::default());
        assert_eq!(none.map(|n| n + 1).into_data(), None);
    }
}
