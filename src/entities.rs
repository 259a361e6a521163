use std::borrow::Cow;

// Longest name in the table below plus a little slack.
const MAX_ENTITY_LEN: usize = 12;

/// Decodes character references. Unknown or unterminated references are left
/// as written.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|&(_, ch)| ch == ';' || ch == '&' || ch.is_whitespace())
            .filter(|&(_, ch)| ch == ';')
            .and_then(|(end, _)| decode_reference(&after[..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                result.push(ch);
                rest = &after[end + 1..];
            }
            None => {
                result.push('&');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    Cow::Owned(result)
}

fn decode_reference(name: &str) -> Option<char> {
    match name.strip_prefix('#') {
        Some(numeric) => decode_numeric(numeric),
        None => named_entity(name),
    }
}

fn decode_numeric(digits: &str) -> Option<char> {
    let code_point = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    if code_point == 0 {
        return Some(char::REPLACEMENT_CHARACTER);
    }
    Some(char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER))
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" | "AMP" => '&',
        "lt" | "LT" => '<',
        "gt" | "GT" => '>',
        "quot" | "QUOT" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "shy" => '\u{00AD}',
        "copy" | "COPY" => '©',
        "reg" | "REG" => '®',
        "trade" => '™',
        "deg" => '°',
        "para" => '¶',
        "sect" => '§',
        "middot" => '·',
        "bull" => '•',
        "euro" => '€',
        "cent" => '¢',
        "pound" => '£',
        "yen" => '¥',
        "times" => '×',
        "divide" => '÷',
        "minus" => '−',
        "plusmn" => '±',
        "frac12" => '½',
        "frac14" => '¼',
        "frac34" => '¾',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "larr" => '←',
        "rarr" => '→',
        "uarr" => '↑',
        "darr" => '↓',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "zwnj" => '\u{200C}',
        "zwj" => '\u{200D}',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(decode_entities("no refs here"), Cow::Borrowed(_)));
    }

    #[test]
    fn decodes_named_and_numeric_references() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode_entities("&hellip;&mdash;"), "…—");
    }

    #[test]
    fn leaves_unknown_and_unterminated_references() {
        assert_eq!(decode_entities("&bogus; & &amp"), "&bogus; & &amp");
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&&amp;"), "&&");
    }

    #[test]
    fn invalid_code_points_become_replacement_char() {
        assert_eq!(decode_entities("&#0;&#xD800;"), "\u{FFFD}\u{FFFD}");
    }
}
