//! Anchor lookup and bounded search windows over document text.

use regex::Regex;

/// Byte range of a located label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub start: usize,
    pub end: usize,
}

/// A bounded view into the document, starting at `start`.
#[derive(Debug, Clone, Copy)]
pub struct SearchWindow<'a> {
    /// Byte offset of the window in the document.
    pub start: usize,
    pub text: &'a str,
}

impl<'a> SearchWindow<'a> {
    /// A window covering the whole document.
    pub fn whole(text: &'a str) -> Self {
        Self { start: 0, text }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Translate an offset inside the window to a document offset.
    pub fn absolute(&self, offset: usize) -> usize {
        self.start + offset
    }
}

/// Find the first match of a label pattern.
pub fn locate(text: &str, label: &Regex) -> Option<Anchor> {
    label.find(text).map(|m| Anchor {
        start: m.start(),
        end: m.end(),
    })
}

/// Find a plain label ignoring case and Portuguese diacritics.
///
/// `"SITUACAO ATUAL"` finds `"Situação Atual"` and the other way around.
pub fn locate_folded(text: &str, label: &str) -> Option<Anchor> {
    folded_matches(text, label).next()
}

/// Like [`locate_folded`], but the match must not sit inside a longer word.
pub fn locate_folded_word(text: &str, label: &str) -> Option<Anchor> {
    folded_matches(text, label).find(|a| {
        let before = text[..a.start].chars().next_back();
        let after = text[a.end..].chars().next();
        before.is_none_or(|c| !c.is_alphanumeric()) && after.is_none_or(|c| !c.is_alphanumeric())
    })
}

fn folded_matches<'a>(text: &'a str, label: &str) -> impl Iterator<Item = Anchor> + 'a {
    let needle: Vec<char> = label.chars().map(fold_char).collect();
    let hay: Vec<(usize, char)> = text.char_indices().map(|(i, c)| (i, fold_char(c))).collect();
    let last_start = if needle.is_empty() || hay.len() < needle.len() {
        0
    } else {
        hay.len() - needle.len() + 1
    };

    (0..last_start).filter_map(move |i| {
        let found = hay[i..i + needle.len()]
            .iter()
            .map(|(_, c)| *c)
            .eq(needle.iter().copied());
        if !found {
            return None;
        }
        let (last_offset, last_char) = hay[i + needle.len() - 1];
        let original_len = text[last_offset..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(last_char.len_utf8());
        Some(Anchor {
            start: hay[i].0,
            end: last_offset + original_len,
        })
    })
}

/// Open a window of at most `len` bytes at `start`, never splitting a character.
pub fn window(text: &str, start: usize, len: usize) -> SearchWindow<'_> {
    let mut start = start.min(text.len());
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = start.saturating_add(len).min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    SearchWindow {
        start,
        text: &text[start..end],
    }
}

/// Lowercase and strip Portuguese diacritics, one char in and one char out.
pub fn fold(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

pub fn fold_char(c: char) -> char {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match lower {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Build a case- and accent-tolerant regex fragment for a plain phrase.
pub fn tolerant_pattern(phrase: &str) -> String {
    let mut out = String::new();
    let mut in_space = false;
    for c in phrase.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push_str(r"\s+");
            }
            in_space = true;
            continue;
        }
        in_space = false;
        match fold_char(c) {
            'a' => out.push_str("[aáàâãä]"),
            'e' => out.push_str("[eéèêë]"),
            'i' => out.push_str("[iíìîï]"),
            'o' => out.push_str("[oóòôõö]"),
            'u' => out.push_str("[uúùûü]"),
            'c' => out.push_str("[cç]"),
            folded => out.push_str(&regex::escape(&folded.to_string())),
        }
    }
    out
}
