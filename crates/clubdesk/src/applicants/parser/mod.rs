//! Source parsers turning inbound units (mail bodies, CSV rows) into
//! [`RawApplicantPayload`](crate::applicants::domain::RawApplicantPayload)s.

pub mod gender;
pub mod message;
pub mod table;

pub use gender::guess_gender;
pub use message::parse_message;
pub use table::{parse_csv, CsvParseError};
