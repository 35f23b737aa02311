//! Text helpers for the built-in PDF fonts.

/// Map text onto the ASCII range the built-in Helvetica renders reliably.
pub fn transliterate(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'ą' => 'a',
            'ć' => 'c',
            'ę' => 'e',
            'ł' => 'l',
            'ń' => 'n',
            'ó' => 'o',
            'ś' => 's',
            'ź' | 'ż' => 'z',
            'Ą' => 'A',
            'Ć' => 'C',
            'Ę' => 'E',
            'Ł' => 'L',
            'Ń' => 'N',
            'Ó' => 'O',
            'Ś' => 'S',
            'Ź' | 'Ż' => 'Z',
            '–' | '—' => '-',
            '„' | '”' | '“' => '"',
            '‘' | '’' => '\'',
            '…' => '.',
            '\t' => ' ',
            '\n' => '\n',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

/// Approximate Helvetica advance width in thousandths of an em.
fn glyph_units(c: char) -> u32 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' => 222,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'I' | 'f' | 't' | '/' | '[' | ']' => 278,
        'r' | '(' | ')' | '-' | '"' => 333,
        'm' | 'M' => 833,
        'w' => 722,
        'W' => 944,
        '@' | '%' => 889,
        'A'..='Z' => 667,
        _ => 556,
    }
}

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Estimated printed width in millimetres.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(glyph_units).sum();
    units as f32 / 1000.0 * font_size * MM_PER_PT
}

/// Greedy word wrap. Explicit newlines start a new line; words wider than a
/// whole line are broken by characters.
pub fn wrap(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    let mut next = current.clone();
                    next.push(c);
                    if !current.is_empty() && text_width(&next, font_size) > max_width {
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    } else {
                        current = next;
                    }
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transliterate_polish() {
        assert_eq!(transliterate("Zażółć gęślą jaźń"), "Zazolc gesla jazn");
        assert_eq!(transliterate("ŁÓDŹ – „Siłownia”"), "LODZ - \"Silownia\"");
        assert_eq!(transliterate("kcal 🔥"), "kcal ?");
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "Bieg ciągły w drugim zakresie, potem rytmy i rozciąganie po treningu.";
        let lines = wrap(text, 40.0, 10.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0) <= 40.0, "line too wide: {line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_breaks_long_words_and_keeps_newlines() {
        let lines = wrap(&"x".repeat(200), 30.0, 10.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat().len(), 200);

        assert_eq!(wrap("a\n\nb", 100.0, 10.0), vec!["a", "", "b"]);
    }
}
