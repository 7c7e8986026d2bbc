//! Reassembly of SSE frames from individual lines.

/// One server-sent event, before its payload is decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Value of the last `event:` field, if any.
    pub event: Option<String>,
    /// Values of the `data:` fields, in wire order.
    pub data: Vec<String>,
}

impl Frame {
    /// The frame payload: data lines joined with `\n`.
    pub fn payload(&self) -> String {
        self.data.join("\n")
    }

    fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_empty()
    }
}

/// Builds [`Frame`]s one line at a time.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    current: Frame,
}

impl FrameAssembler {
    /// Create an assembler with no frame in progress.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (terminator already stripped).
    ///
    /// Returns a frame when `line` is blank and the frame in progress carries
    /// at least one `data` line. Frames without data are dropped.
    pub fn feed(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            let frame = std::mem::take(&mut self.current);
            return (!frame.data.is_empty()).then_some(frame);
        }

        // Comment lines start with a colon; a line without one names a field
        // with no value, which nothing here uses.
        let Some((field, value)) = line.split_once(':') else {
            return None;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);

        match field {
            "data" => self.current.data.push(value.to_owned()),
            "event" => self.current.event = Some(value.to_owned()),
            // "", "id", "retry" and anything unknown
            _ => {}
        }

        None
    }

    /// Whether fields have been collected since the last blank line.
    pub fn has_partial(&self) -> bool {
        !self.current.is_empty()
    }

    /// Drop the frame in progress, returning it if it held anything.
    pub fn discard(&mut self) -> Option<Frame> {
        let frame = std::mem::take(&mut self.current);
        (!frame.is_empty()).then_some(frame)
    }
}
