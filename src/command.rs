//! # Structured alarm requests and the command grammar.
//!
//! The engine core never parses text; it consumes [`AlarmRequest`] values
//! produced by a [`CommandSource`]. This module owns the external side of
//! that seam: the request type, the source trait, and a parser for the
//! line-oriented command grammar.
//!
//! ## Grammar (case-sensitive keywords)
//! ```text
//! Start_Alarm(<id>): <seconds> <message>
//! Cancel_Alarm(<id>)
//! Replace_Alarm(<id>): <seconds> <message>
//! ```
//!
//! Anything else yields [`CommandParseError::Unrecognized`]; the engine
//! reports it as an unknown command and creates no alarm.
//!
//! ## Example
//! ```rust
//! use alarmvisor::{parse_line, AlarmId, AlarmRequest};
//!
//! let req = parse_line("Start_Alarm(3): 10 wake up").unwrap();
//! assert_eq!(
//!     req,
//!     AlarmRequest::Start { id: AlarmId(3), seconds: 10, message: "wake up".into() }
//! );
//!
//! assert!(parse_line("Snooze_Alarm(3)").is_err());
//! ```

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::alarm::AlarmId;
use crate::error::CommandParseError;

/// A structured request submitted to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlarmRequest {
    /// Schedule a new alarm.
    Start {
        /// Caller-supplied id.
        id: AlarmId,
        /// Requested delay in seconds.
        seconds: u32,
        /// Message to echo when the alarm fires.
        message: String,
    },
    /// Cancel a pending alarm.
    Cancel {
        /// Id of the alarm to cancel.
        id: AlarmId,
    },
    /// Replace a pending alarm with a new duration and message.
    Replace {
        /// Id of the alarm to replace.
        id: AlarmId,
        /// New delay in seconds.
        seconds: u32,
        /// New message.
        message: String,
    },
}

/// Producer of structured requests.
///
/// Implementations wrap whatever the requests come from — an interactive
/// console, a test script, a network socket. Returning `None` ends the
/// engine's request loop.
#[async_trait]
pub trait CommandSource: Send {
    /// Next request, a parse failure to report, or `None` at end of input.
    async fn next_request(&mut self) -> Option<Result<AlarmRequest, CommandParseError>>;
}

/// [`CommandSource`] over a buffered line reader (stdin, a file, a socket).
///
/// Blank lines are skipped; every other line goes through [`parse_line`].
pub struct LineSource<R> {
    reader: R,
}

impl<R> LineSource<R> {
    /// Wraps a buffered async reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CommandSource for LineSource<R> {
    async fn next_request(&mut self) -> Option<Result<AlarmRequest, CommandParseError>> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line).await {
                Ok(0) | Err(_) => return None,
                Ok(_) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(parse_line(&line));
                }
            }
        }
    }
}

/// Parses one command line into an [`AlarmRequest`].
pub fn parse_line(line: &str) -> Result<AlarmRequest, CommandParseError> {
    let input = line.trim();

    if let Some(rest) = input.strip_prefix("Start_Alarm(") {
        let (id, rest) = parse_id(rest, input)?;
        let (seconds, message) = parse_body(rest, input)?;
        return Ok(AlarmRequest::Start { id, seconds, message });
    }
    if let Some(rest) = input.strip_prefix("Replace_Alarm(") {
        let (id, rest) = parse_id(rest, input)?;
        let (seconds, message) = parse_body(rest, input)?;
        return Ok(AlarmRequest::Replace { id, seconds, message });
    }
    if let Some(rest) = input.strip_prefix("Cancel_Alarm(") {
        let (id, rest) = parse_id(rest, input)?;
        if !rest.is_empty() {
            return Err(CommandParseError::Unrecognized {
                input: input.to_string(),
            });
        }
        return Ok(AlarmRequest::Cancel { id });
    }

    Err(CommandParseError::Unrecognized {
        input: input.to_string(),
    })
}

/// Parses `<id>)` off the front of `rest`, returning the id and what follows
/// the closing paren.
fn parse_id<'a>(rest: &'a str, input: &str) -> Result<(AlarmId, &'a str), CommandParseError> {
    let close = rest
        .find(')')
        .ok_or_else(|| CommandParseError::Unrecognized {
            input: input.to_string(),
        })?;
    let id = rest[..close]
        .trim()
        .parse::<u32>()
        .map_err(|_| CommandParseError::BadField {
            field: "id",
            input: input.to_string(),
        })?;
    Ok((AlarmId(id), &rest[close + 1..]))
}

/// Parses `: <seconds> <message>` after the closing paren.
fn parse_body(rest: &str, input: &str) -> Result<(u32, String), CommandParseError> {
    let rest = rest
        .strip_prefix(':')
        .ok_or_else(|| CommandParseError::Unrecognized {
            input: input.to_string(),
        })?
        .trim_start();
    let (seconds_str, message) =
        rest.split_once(' ')
            .ok_or_else(|| CommandParseError::Unrecognized {
                input: input.to_string(),
            })?;
    let seconds = seconds_str
        .parse::<u32>()
        .map_err(|_| CommandParseError::BadField {
            field: "seconds",
            input: input.to_string(),
        })?;
    let message = message.trim();
    if message.is_empty() {
        return Err(CommandParseError::Unrecognized {
            input: input.to_string(),
        });
    }
    Ok((seconds, message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start() {
        let req = parse_line("Start_Alarm(7): 10 hello there").unwrap();
        assert_eq!(
            req,
            AlarmRequest::Start {
                id: AlarmId(7),
                seconds: 10,
                message: "hello there".into()
            }
        );
    }

    #[test]
    fn parses_cancel() {
        let req = parse_line("Cancel_Alarm(42)").unwrap();
        assert_eq!(req, AlarmRequest::Cancel { id: AlarmId(42) });
    }

    #[test]
    fn parses_replace() {
        let req = parse_line("Replace_Alarm(7): 20 bye").unwrap();
        assert_eq!(
            req,
            AlarmRequest::Replace {
                id: AlarmId(7),
                seconds: 20,
                message: "bye".into()
            }
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert!(matches!(
            parse_line("start_alarm(1): 5 x"),
            Err(CommandParseError::Unrecognized { .. })
        ));
    }

    #[test]
    fn rejects_trailing_junk_after_cancel() {
        assert!(parse_line("Cancel_Alarm(1): 5 x").is_err());
    }

    #[test]
    fn rejects_bad_fields() {
        assert!(matches!(
            parse_line("Start_Alarm(abc): 5 x"),
            Err(CommandParseError::BadField { field: "id", .. })
        ));
        assert!(matches!(
            parse_line("Start_Alarm(1): five x"),
            Err(CommandParseError::BadField { field: "seconds", .. })
        ));
    }

    #[test]
    fn rejects_missing_message() {
        assert!(parse_line("Start_Alarm(1): 5").is_err());
        assert!(parse_line("Start_Alarm(1): 5 ").is_err());
    }

    #[tokio::test]
    async fn line_source_skips_blank_lines_and_ends_at_eof() {
        let input = b"\nStart_Alarm(1): 5 hi\n\nCancel_Alarm(1)\n" as &[u8];
        let mut source = LineSource::new(input);

        assert!(matches!(
            source.next_request().await,
            Some(Ok(AlarmRequest::Start { .. }))
        ));
        assert!(matches!(
            source.next_request().await,
            Some(Ok(AlarmRequest::Cancel { .. }))
        ));
        assert!(source.next_request().await.is_none());
    }
}
