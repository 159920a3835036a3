use core::str::Split;

/// Frame keywords the device sends.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Keyword {
    /// Network-identity query; expects the fixed local-identity reply.
    Net,
    /// Epoch-time query.
    Time,
    /// Poll asking the host for its next outbound command.
    GetDown,
    /// Unsolicited single-property change notification.
    PropertiesChanged,
    /// Answer to an earlier `get_properties` command.
    Result,
    Unknown,
}

impl<'a> From<&'a str> for Keyword {
    fn from(token: &'a str) -> Self {
        match token {
            "net" => Keyword::Net,
            "time" => Keyword::Time,
            "get_down" => Keyword::GetDown,
            "properties_changed" => Keyword::PropertiesChanged,
            "result" => Keyword::Result,
            _ => Keyword::Unknown,
        }
    }
}

/// One reassembled line, split into a keyword and its argument tokens.
///
/// Tokens are views into the line and are only valid while the line buffer
/// is. Splitting is on single spaces; runs of spaces would yield empty
/// tokens. The device does not emit those, and they decode to nothing
/// downstream.
#[derive(Clone)]
pub struct Frame<'a> {
    pub keyword: Keyword,
    pub args: Args<'a>,
}

/// Iterator over a frame's argument tokens.
#[derive(Clone)]
pub struct Args<'a>(Split<'a, char>);

impl<'a> Iterator for Args<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.0.next()
    }
}

impl<'a> Frame<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut tokens = line.split(' ');
        // split always yields at least one token
        let keyword = tokens.next().unwrap_or("");
        Frame {
            keyword: Keyword::from(keyword),
            args: Args(tokens),
        }
    }
}
