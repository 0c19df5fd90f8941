//! Response composition for fixed-response mode.
//!
//! Maps the configured [`FixedResponse`] and the body-decode outcome to the
//! wire response. Decode failures fail open: the configured status, body and
//! content type are all skipped and the client gets the bare default response
//! (plus CORS headers), while the failure itself lands in the journal. The
//! same applies to a failed read of a `file://` body — status and headers
//! already stand, only the body is dropped. Failures are observable in the
//! journal, never translated into synthetic error pages.

use crate::config::{FixedResponse, ResponseBody};
use crate::decode::DecodeError;
use crate::http::{Response, StatusCode};
use crate::journal::Journal;

/// Adds the permissive CORS triple. Every response leaves through this,
/// whatever the mode or error path.
pub fn cors(response: &mut Response) {
    response.add_header("Access-Control-Allow-Origin", "*");
    response.add_header("Access-Control-Allow-Methods", "*");
    response.add_header("Access-Control-Allow-Headers", "*");
}

/// Composes the response for one request in fixed-response mode.
///
/// `decode_error` short-circuits everything configured; `None` means the
/// body decoded fine and the configured response applies. File-backed bodies
/// are read here, on every call, so the served bytes always reflect the
/// file's current contents.
pub async fn compose(
    fixed: &FixedResponse,
    decode_error: Option<&DecodeError>,
    journal: &Journal,
) -> Response {
    if let Some(err) = decode_error {
        journal.error(err);
        let mut response = Response::new(StatusCode::OK);
        cors(&mut response);
        return response;
    }

    let mut response = Response::new(fixed.status.unwrap_or(StatusCode::OK));
    cors(&mut response);

    if let Some(content_type) = &fixed.content_type {
        response.add_header("Content-Type", content_type);
    }

    match &fixed.body {
        ResponseBody::Empty => {}
        ResponseBody::Literal(bytes) => response.set_body(bytes.clone()),
        ResponseBody::File(path) => match tokio::fs::read(path).await {
            Ok(bytes) => response.set_body(bytes),
            Err(e) => {
                journal.error(&format_args!(
                    "error read response body file {}, {e}",
                    path.display()
                ));
            }
        },
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn fixed(body: ResponseBody, status: Option<u16>, content_type: Option<&str>) -> FixedResponse {
        FixedResponse {
            body,
            status: status.map(|c| StatusCode::from_u16(c).unwrap()),
            content_type: content_type.map(str::to_owned),
        }
    }

    fn cors_present(response: &Response) -> bool {
        response.headers().get("Access-Control-Allow-Origin") == Some("*")
            && response.headers().get("Access-Control-Allow-Methods") == Some("*")
            && response.headers().get("Access-Control-Allow-Headers") == Some("*")
    }

    #[tokio::test]
    async fn unset_status_defaults_to_200() {
        let journal = Journal::with_sink(std::io::sink());
        let response = compose(&fixed(ResponseBody::Empty, None, None), None, &journal).await;
        assert_eq!(response.status().as_u16(), 200);
        assert!(cors_present(&response));
    }

    #[tokio::test]
    async fn configured_status_and_content_type() {
        let journal = Journal::with_sink(std::io::sink());
        let response = compose(
            &fixed(
                ResponseBody::Literal(b"missing".to_vec()),
                Some(404),
                Some("text/plain"),
            ),
            None,
            &journal,
        )
        .await;
        assert_eq!(response.status().as_u16(), 404);
        assert_eq!(response.headers().get("Content-Type"), Some("text/plain"));
        let wire = response.into_bytes();
        assert!(wire.ends_with(b"missing"));
    }

    #[tokio::test]
    async fn no_content_type_unless_configured() {
        let journal = Journal::with_sink(std::io::sink());
        let response = compose(
            &fixed(ResponseBody::Literal(b"x".to_vec()), None, None),
            None,
            &journal,
        )
        .await;
        assert_eq!(response.headers().get("Content-Type"), None);
    }

    #[tokio::test]
    async fn decode_error_skips_configured_response() {
        let buf = SharedBuf::default();
        let journal = Journal::with_sink(buf.clone());
        let err = crate::decode::decode(b"not gzip", Some("gzip")).unwrap_err();

        let response = compose(
            &fixed(
                ResponseBody::Literal(b"configured".to_vec()),
                Some(500),
                Some("text/html"),
            ),
            Some(&err),
            &journal,
        )
        .await;

        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.headers().get("Content-Type"), None);
        assert!(cors_present(&response));
        let wire = response.into_bytes();
        assert!(wire.ends_with(b"\r\n\r\n")); // no body
        assert!(buf.text().contains("[ERROR] error init gzip reader"));
    }

    #[tokio::test]
    async fn file_body_reread_every_request() {
        let journal = Journal::with_sink(std::io::sink());
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"first").unwrap();
        let fixed_response = fixed(ResponseBody::File(file.path().to_owned()), None, None);

        let wire = compose(&fixed_response, None, &journal).await.into_bytes();
        assert!(wire.ends_with(b"first"));

        std::fs::write(file.path(), b"second").unwrap();
        let wire = compose(&fixed_response, None, &journal).await.into_bytes();
        assert!(wire.ends_with(b"second"));
    }

    #[tokio::test]
    async fn unreadable_file_body_logs_and_keeps_status() {
        let buf = SharedBuf::default();
        let journal = Journal::with_sink(buf.clone());
        let fixed_response = fixed(
            ResponseBody::File("/nonexistent/reqtap-test-body".into()),
            Some(201),
            None,
        );

        let response = compose(&fixed_response, None, &journal).await;
        assert_eq!(response.status().as_u16(), 201);
        assert!(cors_present(&response));
        let wire = response.into_bytes();
        assert!(wire.ends_with(b"\r\n\r\n")); // headers only, no body
        assert!(buf.text().contains("[ERROR] error read response body file"));
    }
}
