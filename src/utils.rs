use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncates `s` to at most `max_width` display columns, ending with `...`
/// when anything was cut. Never splits a character.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(1);

        if current_width + char_width + 3 > max_width {
            break;
        }

        result.push(c);
        current_width += char_width;
    }

    result.push_str("...");
    result
}

/// Greedy word wrap; continuation lines are indented by two spaces.
#[cfg_attr(not(feature = "logging"), allow(dead_code))]
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut wrapped = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if line_width > 0 && line_width + word_width + 1 > width {
            wrapped.push_str("\n  ");
            wrapped.push_str(word);
            line_width = word_width + 2;
        } else {
            if line_width > 0 {
                wrapped.push(' ');
                line_width += 1;
            }
            wrapped.push_str(word);
            line_width += word_width;
        }
    }
    wrapped
}
