//! Pluggable extraction of a display title from save data.
//!
//! The engine never parses icon assets itself; callers pass a decoder into
//! [`Memcard::inspect`](crate::Memcard::inspect).

use std::ops::Range;

pub trait TitleDecoder {
    fn decode_title(&self, data: &[u8]) -> Option<String>;
}

impl<F> TitleDecoder for F
where
    F: Fn(&[u8]) -> Option<String>,
{
    fn decode_title(&self, data: &[u8]) -> Option<String> {
        self(data)
    }
}

/// Never finds a title.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTitle;

impl TitleDecoder for NoTitle {
    fn decode_title(&self, _data: &[u8]) -> Option<String> {
        None
    }
}

/// Looks for a plain-ASCII title in the icon.sys title window of the first
/// cluster. Shift-JIS titles are not decoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct IconSysTitle;

impl IconSysTitle {
    const TITLE_RANGE: Range<usize> = 0x20..0x60;
}

impl TitleDecoder for IconSysTitle {
    fn decode_title(&self, data: &[u8]) -> Option<String> {
        let window = data.get(Self::TITLE_RANGE)?;
        let end = window.iter().position(|&b| b == 0).unwrap_or(window.len());
        let raw = &window[..end];
        if !raw.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return None;
        }

        let title = std::str::from_utf8(raw).ok()?.trim();
        (!title.is_empty()).then(|| title.to_string())
    }
}
