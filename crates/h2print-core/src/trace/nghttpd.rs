//! Line-level parser for nghttpd's verbose receive log.
//!
//! A received frame appears in the log as an announcement line such as
//!
//! ```text
//! [id=1] [  7.801] recv WINDOW_UPDATE frame <length=4, flags=0x00, stream_id=0>
//! ```
//!
//! followed by body lines whose shape depends on the frame type. HEADERS
//! frames are the exception: their pseudo-header lines precede the
//! announcement, so the parser keeps a buffer of the lines seen since the
//! last frame boundary and scans it when a HEADERS announcement arrives.

use std::collections::{BTreeMap, BTreeSet};

use crate::signature::frame::{FrameSignature, Priority, Setting};
use crate::signature::http2::Http2Signature;
use crate::trace::{ClientSignature, Extraction, TraceError};

/// Cursor over a complete trace, plus the pending lines seen since the
/// last fully-parsed frame.
pub struct NghttpdLogParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    pending: Vec<&'a str>,
}

impl<'a> NghttpdLogParser<'a> {
    pub fn new(log: &'a str) -> Self {
        Self {
            lines: log.lines().collect(),
            pos: 0,
            pending: Vec::new(),
        }
    }

    /// Run the scan. See [`Extraction`] for the failure contract.
    pub fn parse(mut self) -> Extraction {
        let mut clients: BTreeMap<u64, Vec<FrameSignature>> = BTreeMap::new();
        let mut finished: BTreeSet<u64> = BTreeSet::new();
        let mut error = None;

        while let Some((line_no, line)) = self.next_line() {
            let Some((client_id, frame_type, stream_id)) = match_announcement(line) else {
                self.pending.push(line);
                continue;
            };

            // Extraction per client stops at its first HEADERS frame;
            // later traffic is less distinguishing and is ignored.
            if finished.contains(&client_id) {
                continue;
            }

            let result = match frame_type {
                "SETTINGS" => self
                    .consume_settings(client_id)
                    .map(|settings| FrameSignature::Settings {
                        stream_id: Some(stream_id),
                        settings,
                    }),
                "WINDOW_UPDATE" => {
                    self.consume_window_update(client_id)
                        .map(|window_size_increment| FrameSignature::WindowUpdate {
                            stream_id: Some(stream_id),
                            window_size_increment,
                        })
                }
                "HEADERS" => Ok(FrameSignature::Headers {
                    stream_id: Some(stream_id),
                    pseudo_headers: self.pseudo_headers_for(stream_id),
                }),
                "PRIORITY" => self
                    .consume_priority(client_id)
                    .map(|priority| FrameSignature::Priority {
                        stream_id: Some(stream_id),
                        priority,
                    }),
                other => Err(TraceError::UnknownFrameType {
                    client_id,
                    line: line_no,
                    frame_type: other.to_string(),
                }),
            };

            match result {
                Ok(frame) => {
                    let is_headers = matches!(frame, FrameSignature::Headers { .. });
                    clients.entry(client_id).or_default().push(frame);
                    self.pending.clear();
                    if is_headers {
                        finished.insert(client_id);
                    }
                }
                Err(err) => {
                    // The failing client's partial frames are unusable;
                    // everything collected for other clients stands.
                    clients.remove(&client_id);
                    error = Some(err);
                    break;
                }
            }
        }

        Extraction {
            clients: clients
                .into_iter()
                .map(|(client_id, frames)| ClientSignature {
                    client_id,
                    signature: Http2Signature::new(frames),
                })
                .collect(),
            error,
        }
    }

    /// Next line and its 1-based number, or `None` at end of input.
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.pos).copied()?;
        self.pos += 1;
        Some((self.pos, line))
    }

    /// SETTINGS body: lines until `(niv=N)`, then exactly N parameter lines.
    fn consume_settings(&mut self, client_id: u64) -> Result<Vec<Setting>, TraceError> {
        let niv = loop {
            let (_, line) = self.next_line().ok_or(TraceError::UnexpectedEnd {
                client_id,
                expected: "SETTINGS parameter count",
            })?;
            if let Some(n) = match_niv(line) {
                break n;
            }
        };

        let mut settings = Vec::with_capacity(niv as usize);
        for _ in 0..niv {
            let (line_no, line) = self.next_line().ok_or(TraceError::UnexpectedEnd {
                client_id,
                expected: "a SETTINGS parameter",
            })?;
            let (id, value) = match_setting(line).ok_or_else(|| TraceError::UnexpectedLine {
                client_id,
                line: line_no,
                expected: "a SETTINGS parameter",
                content: line.to_string(),
            })?;
            settings.push(Setting::new(id, value));
        }
        Ok(settings)
    }

    /// WINDOW_UPDATE body: one `(window_size_increment=N)` line.
    fn consume_window_update(&mut self, client_id: u64) -> Result<u32, TraceError> {
        let (line_no, line) = self.next_line().ok_or(TraceError::UnexpectedEnd {
            client_id,
            expected: "a window size increment",
        })?;
        match_window_update(line).ok_or_else(|| TraceError::UnexpectedLine {
            client_id,
            line: line_no,
            expected: "a window size increment",
            content: line.to_string(),
        })
    }

    /// PRIORITY body: one `(dep_stream_id=N, weight=N, exclusive=N)` line.
    fn consume_priority(&mut self, client_id: u64) -> Result<Priority, TraceError> {
        let (line_no, line) = self.next_line().ok_or(TraceError::UnexpectedEnd {
            client_id,
            expected: "a priority specification",
        })?;
        match_priority(line).ok_or_else(|| TraceError::UnexpectedLine {
            client_id,
            line: line_no,
            expected: "a priority specification",
            content: line.to_string(),
        })
    }

    /// Pseudo-header names for a stream, in trace order, from the lines
    /// buffered since the last frame boundary.
    fn pseudo_headers_for(&self, stream_id: u32) -> Vec<String> {
        self.pending
            .iter()
            .filter_map(|line| match_pseudo_header(line, stream_id))
            .map(str::to_string)
            .collect()
    }
}

/// Leading decimal digits of `s`, parsed, plus the rest.
fn take_digits(s: &str) -> Option<(u64, &str)> {
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let n = s[..end].parse().ok()?;
    Some((n, &s[end..]))
}

/// Leading `[A-Z_]` run of `s`, plus the rest. Empty run is no match.
fn take_upper_name(s: &str) -> Option<(&str, &str)> {
    let end = s
        .bytes()
        .position(|b| !(b.is_ascii_uppercase() || b == b'_'))
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some(s.split_at(end))
}

/// `[id=<client>] ... recv <TYPE> frame ... stream_id=<id>`
fn match_announcement(line: &str) -> Option<(u64, &str, u32)> {
    let rest = line.strip_prefix("[id=")?;
    let (client_id, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(']')?;

    let recv = rest.find(" recv ")?;
    let rest = &rest[recv + " recv ".len()..];
    let (frame_type, rest) = take_upper_name(rest)?;
    let rest = rest.strip_prefix(" frame")?;

    let sid = rest.find("stream_id=")?;
    let (stream_id, _) = take_digits(&rest[sid + "stream_id=".len()..])?;
    let stream_id = u32::try_from(stream_id).ok()?;

    Some((client_id, frame_type, stream_id))
}

/// `(niv=<count>)`
fn match_niv(line: &str) -> Option<u64> {
    let rest = line.trim_start().strip_prefix("(niv=")?;
    let (niv, rest) = take_digits(rest)?;
    rest.strip_prefix(')')?;
    Some(niv)
}

/// `[<NAME>(0x<hex id>):<value>]`
fn match_setting(line: &str) -> Option<(u64, u32)> {
    let rest = line.trim_start().strip_prefix('[')?;
    let (_, rest) = take_upper_name(rest)?;
    let rest = rest.strip_prefix("(0x")?;

    let hex_end = rest
        .bytes()
        .position(|b| !b.is_ascii_hexdigit())
        .unwrap_or(rest.len());
    if hex_end == 0 {
        return None;
    }
    let id = u64::from_str_radix(&rest[..hex_end], 16).ok()?;
    let rest = rest[hex_end..].strip_prefix("):")?;

    let (value, rest) = take_digits(rest)?;
    let value = u32::try_from(value).ok()?;
    rest.strip_prefix(']')?;

    Some((id, value))
}

/// `(window_size_increment=<n>)`
fn match_window_update(line: &str) -> Option<u32> {
    let rest = line
        .trim_start()
        .strip_prefix("(window_size_increment=")?;
    let (increment, rest) = take_digits(rest)?;
    rest.strip_prefix(')')?;
    u32::try_from(increment).ok()
}

/// `(dep_stream_id=<n>, weight=<n>, exclusive=<n>)`
fn match_priority(line: &str) -> Option<Priority> {
    let rest = line.trim_start().strip_prefix("(dep_stream_id=")?;
    let (dep_stream_id, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(", weight=")?;
    let (weight, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(", exclusive=")?;
    let (exclusive, rest) = take_digits(rest)?;
    rest.strip_prefix(')')?;

    Some(Priority {
        dep_stream_id: u32::try_from(dep_stream_id).ok()?,
        weight: u32::try_from(weight).ok()?,
        exclusive: exclusive != 0,
    })
}

/// `... recv (stream_id=<id>) :<name>: ...` — returns the pseudo-header
/// name including its leading colon when the stream id matches.
fn match_pseudo_header(line: &str, stream_id: u32) -> Option<&str> {
    let idx = line.find("recv (stream_id=")?;
    let rest = &line[idx + "recv (stream_id=".len()..];
    let (sid, rest) = take_digits(rest)?;
    if sid != u64::from(stream_id) {
        return None;
    }
    let rest = rest.strip_prefix(") ")?;

    let name = rest.strip_prefix(':')?;
    let end = name.find(':')?;
    if !name[..end].bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    Some(&rest[..end + 1])
}
