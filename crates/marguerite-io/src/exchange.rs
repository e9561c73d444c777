//! Delimited exchange payloads and the translation service client.

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::IoError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Render assembled rows as a semicolon-delimited text table.
///
/// The header is taken from the first row's field order; every row is
/// expected to share it. Returns an empty string for zero rows.
///
/// # Errors
///
/// Returns [`IoError::Delimited`] if the CSV writer fails.
pub fn to_delimited(rows: &[Map<String, Value>]) -> Result<String, IoError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let header: Vec<&String> = first.keys().collect();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());
    writer
        .write_record(&header)
        .map_err(|e| IoError::Delimited { source: e })?;
    for row in rows {
        let record: Vec<String> = header
            .iter()
            .map(|&key| row.get(key).map(render_value).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| IoError::Delimited { source: e })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| IoError::Delimited { source: e.into_error().into() })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render one JSON value as a delimited-text field.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Client for the external translation service.
///
/// Exchanges a delimited prediction table for a JSON document in the
/// service's own schema dialect, which is passed through unmodified.
pub struct TranslatorClient {
    url: String,
    agent: ureq::Agent,
}

impl TranslatorClient {
    /// Create a client for the given endpoint URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self {
            url: url.into(),
            agent,
        }
    }

    /// POST a delimited payload and return the service's JSON response.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Translator`] | Transport or HTTP-status failure |
    /// | [`IoError::TranslatorResponse`] | Response body is not valid JSON |
    #[instrument(skip(self, payload), fields(url = %self.url, bytes = payload.len()))]
    pub fn translate(&self, payload: &str) -> Result<Value, IoError> {
        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "text/csv")
            .send_string(payload)
            .map_err(|e| IoError::Translator {
                url: self.url.clone(),
                source: Box::new(e),
            })?;

        let document: Value =
            response
                .into_json()
                .map_err(|e| IoError::TranslatorResponse {
                    url: self.url.clone(),
                    source: e,
                })?;
        info!("translation response received");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn rows() -> Vec<Map<String, Value>> {
        let row1 = json!({"Index": 2, "Fat": 3.9, "Remark": "Raw"});
        let row2 = json!({"Index": 9, "Fat": 2.25, "Remark": "Processed"});
        vec![
            row1.as_object().unwrap().clone(),
            row2.as_object().unwrap().clone(),
        ]
    }

    #[test]
    fn delimited_payload_shape() {
        let text = to_delimited(&rows()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Index;Fat;Remark"));
        assert_eq!(lines.next(), Some("2;3.9;Raw"));
        assert_eq!(lines.next(), Some("9;2.25;Processed"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_rows_give_empty_payload() {
        assert_eq!(to_delimited(&[]).unwrap(), "");
    }

    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn translate_passes_response_through() {
        let body = r#"{"translated": true, "rows": []}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let url = serve_once(response);
        let document = TranslatorClient::new(url)
            .translate("Index;Fat\n1;2.0\n")
            .unwrap();
        assert_eq!(document["translated"], Value::from(true));
    }

    #[test]
    fn translate_rejects_non_json_response() {
        let body = "not json";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let url = serve_once(response);
        let err = TranslatorClient::new(url)
            .translate("Index\n1\n")
            .unwrap_err();
        assert!(matches!(err, IoError::TranslatorResponse { .. }));
    }
}
