//! Lossy HTML-to-text helpers.
//!
//! These are sanitizers, not parsers: tags are blanked out with a single
//! pass and only a handful of entities are understood.

/// Longest entity body considered, e.g. `#x10FFFF`.
const MAX_ENTITY_LEN: usize = 10;

/// Replaces every `<...>` tag with a space, collapses whitespace runs to a
/// single space and trims.
///
/// A `<` without a closing `>` is kept as text.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let mut spaced = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        spaced.push_str(&rest[..open]);
        if let Some(close) = rest[open..].find('>') {
            spaced.push(' ');
            rest = &rest[open + close + 1..];
        } else {
            spaced.push_str(&rest[open..]);
            rest = "";
        }
    }
    spaced.push_str(rest);

    collapse_whitespace(&spaced)
}

/// Collapses whitespace runs to one space and trims both ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replaces `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&#NNN;` and
/// `&#xHHH;` with the characters they name.
///
/// Unknown or invalid entities are left untouched. The input is scanned
/// once, so `&amp;lt;` becomes `&lt;`, not `<`.
#[must_use]
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        if let Some((ch, len)) = decode_entity(candidate) {
            out.push(ch);
            rest = &candidate[len..];
        } else {
            out.push('&');
            rest = &candidate[1..];
        }
    }
    out.push_str(rest);

    out
}

/// Decodes the entity at the start of `s` (which begins with `&`).
fn decode_entity(s: &str) -> Option<(char, usize)> {
    let semi = s
        .bytes()
        .skip(1)
        .take(MAX_ENTITY_LEN + 1)
        .position(|b| b == b';')?
        + 1;
    let name = &s[1..semi];

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => decode_numeric(name.strip_prefix('#')?)?,
    };

    Some((ch, semi + 1))
}

fn decode_numeric(num: &str) -> Option<char> {
    let code = if let Some(hex) = num.strip_prefix(['x', 'X']) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()?
    } else {
        if num.is_empty() || !num.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        num.parse::<u32>().ok()?
    };

    if code == 0 {
        return None;
    }
    char::from_u32(code)
}
