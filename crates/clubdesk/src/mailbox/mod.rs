//! IMAP inbox reader for the application mailbox.
//!
//! Connects over TLS, picks unread messages whose subject carries the
//! application marker, and hands their plain-text bodies to the parser.
//! Preview runs leave messages unread; confirm runs mark them seen by
//! fetching without PEEK.

use std::io;
use std::net::TcpStream;

use chrono::{DateTime, Utc};
use mailparse::{dateparse, parse_headers, parse_mail, MailHeaderMap, ParsedMail};
use tracing::{debug, info};

use crate::config::MailboxConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("failed to connect to {server}:{port}")]
    Connect {
        server: String,
        port: u16,
        source: io::Error,
    },
    #[error("TLS handshake with {server} failed: {detail}")]
    Tls { server: String, detail: String },
    #[error("login rejected for {username}")]
    Login { username: String },
    #[error("IMAP protocol error: {0}")]
    Protocol(#[from] imap::error::Error),
    #[error("malformed message: {0}")]
    Malformed(#[from] mailparse::MailParseError),
}

/// One application mail, already reduced to what the parser needs.
#[derive(Debug, Clone)]
pub struct FetchedMessage {
    pub subject: String,
    pub body: String,
    pub received_at: Option<DateTime<Utc>>,
}

pub struct MailboxFetcher {
    config: MailboxConfig,
}

type TlsSession = imap::Session<native_tls::TlsStream<TcpStream>>;

impl MailboxFetcher {
    pub fn new(config: MailboxConfig) -> Self {
        Self { config }
    }

    /// Fetches unread application messages.
    ///
    /// With `mark_as_read` false the bodies are fetched with PEEK and the
    /// mailbox is left untouched, so a preview can be repeated.
    pub fn fetch_unread(&self, mark_as_read: bool) -> Result<Vec<FetchedMessage>, MailboxError> {
        let mut session = self.connect()?;
        let result = self.collect(&mut session, mark_as_read);
        // Logout failures do not invalidate already-fetched messages.
        let _ = session.logout();
        result
    }

    fn connect(&self) -> Result<TlsSession, MailboxError> {
        let tls = native_tls::TlsConnector::builder()
            .build()
            .map_err(|e| MailboxError::Tls {
                server: self.config.server.clone(),
                detail: e.to_string(),
            })?;

        let addr = (self.config.server.as_str(), self.config.port);
        let tcp = TcpStream::connect(addr).map_err(|source| MailboxError::Connect {
            server: self.config.server.clone(),
            port: self.config.port,
            source,
        })?;
        tcp.set_read_timeout(Some(self.config.timeout))
            .map_err(|source| MailboxError::Connect {
                server: self.config.server.clone(),
                port: self.config.port,
                source,
            })?;
        tcp.set_write_timeout(Some(self.config.timeout))
            .map_err(|source| MailboxError::Connect {
                server: self.config.server.clone(),
                port: self.config.port,
                source,
            })?;

        let tls_stream = tls
            .connect(&self.config.server, tcp)
            .map_err(|e| MailboxError::Tls {
                server: self.config.server.clone(),
                detail: e.to_string(),
            })?;

        let client = imap::Client::new(tls_stream);
        let session = client
            .login(&self.config.username, &self.config.password)
            .map_err(|_| MailboxError::Login {
                username: self.config.username.clone(),
            })?;
        Ok(session)
    }

    fn collect(
        &self,
        session: &mut TlsSession,
        mark_as_read: bool,
    ) -> Result<Vec<FetchedMessage>, MailboxError> {
        session.select("INBOX")?;

        let unseen = session.search("UNSEEN")?;
        debug!(unseen = unseen.len(), "unread messages in inbox");

        let mut fetched = Vec::new();
        for seq in unseen {
            // Header peek first so non-application mail stays unread.
            let headers = session.fetch(seq.to_string(), "BODY.PEEK[HEADER]")?;
            let Some(header_bytes) = headers.iter().next().and_then(|m| m.header()) else {
                continue;
            };
            let (parsed_headers, _) = parse_headers(header_bytes)?;
            let subject = parsed_headers
                .get_first_value("Subject")
                .unwrap_or_default();
            if !subject.contains(&self.config.subject_marker) {
                continue;
            }

            let query = if mark_as_read { "BODY[]" } else { "BODY.PEEK[]" };
            let messages = session.fetch(seq.to_string(), query)?;
            let Some(raw) = messages.iter().next().and_then(|m| m.body()) else {
                continue;
            };
            let parsed = parse_mail(raw)?;

            fetched.push(FetchedMessage {
                subject,
                body: extract_plain_body(&parsed)?,
                received_at: extract_date(&parsed),
            });
        }

        info!(
            count = fetched.len(),
            mark_as_read, "fetched application messages"
        );
        Ok(fetched)
    }
}

/// Prefers the text/plain part; the form mails ship both and the HTML
/// rendition mangles line structure the parser depends on.
fn extract_plain_body(parsed: &ParsedMail<'_>) -> Result<String, mailparse::MailParseError> {
    if parsed.subparts.is_empty() {
        return parsed.get_body();
    }

    for part in &parsed.subparts {
        let content_type = part
            .headers
            .get_first_value("Content-Type")
            .unwrap_or_default();
        if content_type.contains("text/plain") {
            return part.get_body();
        }
    }

    if let Some(part) = parsed.subparts.first() {
        return part.get_body();
    }
    parsed.get_body()
}

fn extract_date(parsed: &ParsedMail<'_>) -> Option<DateTime<Utc>> {
    let raw = parsed.headers.get_first_value("Date")?;
    let timestamp = dateparse(&raw).ok()?;
    DateTime::from_timestamp(timestamp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_part_is_preferred_over_html() {
        let raw = concat!(
            "Subject: =?UTF-8?B?Tm92w6EgUMWZaWhsw6HFoWth?=\r\n",
            "Date: Mon, 12 Jan 2026 10:30:00 +0100\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/alternative; boundary=\"sep\"\r\n",
            "\r\n",
            "--sep\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>Jak se jmenuje\u{161}?: Jan</p>\r\n",
            "--sep\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "Jak se jmenuje\u{161}?: Jan\r\n",
            "--sep--\r\n",
        );
        let parsed = parse_mail(raw.as_bytes()).expect("parses");
        let body = extract_plain_body(&parsed).expect("body");
        assert!(body.starts_with("Jak se jmenuje\u{161}?: Jan"));
        assert!(!body.contains("<p>"));
    }

    #[test]
    fn date_header_becomes_utc_timestamp() {
        let raw = concat!(
            "Subject: test\r\n",
            "Date: Mon, 12 Jan 2026 10:30:00 +0100\r\n",
            "\r\n",
            "body\r\n",
        );
        let parsed = parse_mail(raw.as_bytes()).expect("parses");
        let date = extract_date(&parsed).expect("date parses");
        assert_eq!(date.to_rfc3339(), "2026-01-12T09:30:00+00:00");
    }

    #[test]
    fn missing_date_header_is_none() {
        let parsed = parse_mail(b"Subject: test\r\n\r\nbody\r\n").expect("parses");
        assert!(extract_date(&parsed).is_none());
    }
}
