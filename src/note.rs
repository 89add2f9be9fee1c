//! Notes attached to individual readings.
//!
//! Notes are short Hanzi glosses ("~天", "文讀") with `*…*` marking the
//! emphasised part.  Upstream text sometimes has stray spaces between
//! ideographs; those are dropped before display.

use memchr::memchr;
use phf::{Map, phf_map};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Script tag for notes of languages that are not written in Hanzi glosses.
static NOTE_SCRIPTS: Map<&'static str, &'static str> = phf_map! {
    "江永上江墟" => "zh-Nshu",
    "蒙古字韻" => "zh-Phag",
};

pub const DEFAULT_NOTE_SCRIPT: &str = "zh-HK";

#[inline]
pub fn note_script(language_abbr: &str) -> &'static str {
    NOTE_SCRIPTS
        .get(language_abbr)
        .copied()
        .unwrap_or(DEFAULT_NOTE_SCRIPT)
}

#[inline(always)]
fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

/// Remove whitespace runs sitting between two CJK unified ideographs.
pub fn tidy(note: &str) -> Cow<'_, str> {
    if !note.chars().any(char::is_whitespace) {
        return Cow::Borrowed(note);
    }

    let mut out = String::with_capacity(note.len());
    let mut chars = note.char_indices().peekable();
    let mut prev: Option<char> = None;
    while let Some((start, c)) = chars.next() {
        if !c.is_whitespace() {
            out.push(c);
            prev = Some(c);
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(i, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            end = i + w.len_utf8();
            chars.next();
        }
        let next = chars.peek().map(|&(_, n)| n);
        let between_ideographs =
            prev.is_some_and(is_cjk_ideograph) && next.is_some_and(is_cjk_ideograph);
        if !between_ideographs {
            out.push_str(&note[start..end]);
        }
        prev = Some(c);
    }

    if out.len() == note.len() {
        Cow::Borrowed(note)
    } else {
        Cow::Owned(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSegment<'a> {
    Plain(&'a str),
    Emphasis(&'a str),
}

/// Split on `*`: odd-numbered parts are emphasised, empty parts dropped.
pub fn segments(note: &str) -> SmallVec<[NoteSegment<'_>; 4]> {
    if memchr(b'*', note.as_bytes()).is_none() {
        let mut out = SmallVec::new();
        if !note.is_empty() {
            out.push(NoteSegment::Plain(note));
        }
        return out;
    }
    note.split('*')
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            if i % 2 == 1 {
                NoteSegment::Emphasis(part)
            } else {
                NoteSegment::Plain(part)
            }
        })
        .collect()
}

/// `<span lang="…" class="note">…</span>` with emphasis as `<strong>`.
pub fn note_html(note: &str, language_abbr: &str, out: &mut String) {
    let tidied = tidy(note);
    out.push_str("<span lang=\"");
    out.push_str(note_script(language_abbr));
    out.push_str("\" class=\"note\">");
    for segment in segments(&tidied) {
        match segment {
            NoteSegment::Plain(text) => {
                html_escape::encode_text_to_string(text, out);
            }
            NoteSegment::Emphasis(text) => {
                out.push_str("<strong>");
                html_escape::encode_text_to_string(text, out);
                out.push_str("</strong>");
            }
        }
    }
    out.push_str("</span>");
}
