use std::error::Error;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Status code and raw body of one POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug)]
pub enum TransportError {
    Http(reqwest::Error),
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Http(err) => write!(f, "HTTP error: {}", err),
            TransportError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for TransportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportError::Http(err) => Some(err),
            TransportError::Io(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        TransportError::Http(value)
    }
}

impl From<io::Error> for TransportError {
    fn from(value: io::Error) -> Self {
        TransportError::Io(value)
    }
}

/// Issues form-encoded POST requests. Non-2xx statuses are returned as
/// responses, not errors.
pub trait Transport {
    fn post_form(
        &self,
        endpoint: &str,
        fields: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn post_form(
        &self,
        endpoint: &str,
        fields: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let response = self.client.post(endpoint).form(fields).send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(TransportResponse { status, body })
    }
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Write-only diagnostic copy of every payload exchanged with the server,
/// one line per payload. Write failures are ignored.
pub struct WireLog {
    sink: Option<Box<dyn Write>>,
}

impl WireLog {
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn to_writer(sink: Box<dyn Write>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::to_writer(Box::new(file)))
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub(crate) fn commands(&mut self, payload: &[u8]) {
        self.record("commands", "commands", payload);
    }

    pub(crate) fn response(&mut self, payload: &[u8]) {
        self.record("response", "response", payload);
    }

    fn record(&mut self, kind: &str, key: &str, payload: &[u8]) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let _ = write!(sink, "{{\"type\": \"{}\", \"{}\": ", kind, key);
        let _ = sink.write_all(payload);
        let _ = sink.write_all(b"}\n");
        let _ = sink.flush();
    }
}

impl fmt::Debug for WireLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use uuid::Uuid;

    use super::{TransportResponse, WireLog};

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn wire_log_frames_each_payload_on_one_line() {
        let buffer = SharedBuffer::default();
        let mut log = WireLog::to_writer(Box::new(buffer.clone()));
        log.commands(br#"[{"type":"item_close"}]"#);
        log.response(br#"{"sync_status":{}}"#);

        let text = String::from_utf8(buffer.0.borrow().clone()).expect("log should be utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value =
            serde_json::from_str(lines[0]).expect("line should be JSON");
        assert_eq!(first["type"], "commands");
        assert_eq!(first["commands"][0]["type"], "item_close");
        let second: serde_json::Value =
            serde_json::from_str(lines[1]).expect("line should be JSON");
        assert_eq!(second["type"], "response");
    }

    #[test]
    fn wire_log_appends_to_file() {
        let path = std::env::temp_dir()
            .join(format!("tdsync-wire-{}", Uuid::now_v7()))
            .join("wire.log");
        {
            let mut log = WireLog::open(&path).expect("wire log should open");
            log.response(b"{}");
        }
        {
            let mut log = WireLog::open(&path).expect("wire log should reopen");
            log.response(b"[]");
        }
        let text = std::fs::read_to_string(&path).expect("wire log should be readable");
        assert_eq!(text.lines().count(), 2);
        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn disabled_wire_log_is_silent() {
        let mut log = WireLog::disabled();
        assert!(!log.is_enabled());
        log.response(b"{}");
    }

    #[test]
    fn success_range_is_2xx() {
        let ok = TransportResponse {
            status: 204,
            body: Vec::new(),
        };
        let forbidden = TransportResponse {
            status: 403,
            body: b"nope".to_vec(),
        };
        assert!(ok.is_success());
        assert!(!forbidden.is_success());
        assert_eq!(forbidden.body_text(), "nope");
    }
}
