use regex::Regex;

/// Compile a Redis `KEYS`-style glob into an anchored regex.
///
/// Supports `*`, `?`, `[...]` / `[^...]` classes and `\` escapes. An
/// unterminated `[` matches itself literally.
pub(crate) fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(&mut out, chars[i]);
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => push_literal(&mut out, '['),
            },
            c => push_literal(&mut out, c),
        }
        i += 1;
    }

    out.push('$');
    // Keys are binary-safe strings; let `.` cross newlines too
    Regex::new(&format!("(?s){}", out))
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn push_class(out: &mut String, body: &[char]) {
    if body.is_empty() {
        // `[]` can never match
        out.push_str("[^\\s\\S]");
        return;
    }

    if body == ['^'] {
        out.push_str("[\\s\\S]");
        return;
    }

    out.push('[');
    let mut i = 0;
    if body[0] == '^' {
        out.push('^');
        i = 1;
    }
    while i < body.len() {
        let (start, next) = class_char(body, i);
        if next + 1 < body.len() && body[next] == '-' {
            let (end, after) = class_char(body, next + 1);
            // Reversed ranges match like their ordered form
            let (low, high) = if start <= end { (start, end) } else { (end, start) };
            push_class_literal(out, low);
            out.push('-');
            push_class_literal(out, high);
            i = after;
        } else {
            push_class_literal(out, start);
            i = next;
        }
    }
    out.push(']');
}

/// One class member starting at `i`, and the index after it.
fn class_char(body: &[char], i: usize) -> (char, usize) {
    if body[i] == '\\' && i + 1 < body.len() {
        (body[i + 1], i + 2)
    } else {
        (body[i], i + 1)
    }
}

fn push_class_literal(out: &mut String, c: char) {
    if c.is_alphanumeric() {
        out.push(c);
    } else {
        out.push_str(&format!("\\x{{{:X}}}", c as u32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, key: &str) -> bool {
        compile(pattern).unwrap().is_match(key)
    }

    #[test]
    fn test_star_and_question_mark() {
        assert!(matches("user:*", "user:42"));
        assert!(matches("user:*", "user:"));
        assert!(!matches("user:*", "session:42"));
        assert!(matches("h?llo", "hello"));
        assert!(!matches("h?llo", "hllo"));
    }

    #[test]
    fn test_character_classes() {
        assert!(matches("h[ae]llo", "hallo"));
        assert!(!matches("h[ae]llo", "hillo"));
        assert!(matches("h[^e]llo", "hallo"));
        assert!(!matches("h[^e]llo", "hello"));
        assert!(matches("key[a-c]", "keyb"));
        assert!(!matches("key[a-c]", "keyd"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("a.b", "a.b"));
        assert!(!matches("a.b", "axb"));
        assert!(matches("price($)", "price($)"));
        assert!(matches("a\\*b", "a*b"));
        assert!(!matches("a\\*b", "axxb"));
        assert!(matches("open[", "open["));
    }

    #[test]
    fn test_class_ranges() {
        assert!(matches("key[z-a]", "keym"));
        assert!(!matches("key[z-a]", "key0"));
        assert!(matches("key[-a]", "key-"));
        assert!(matches("key[a-]", "key-"));
        assert!(!matches("key[a-]", "keyb"));
        assert!(matches("key[\\]-a]", "key]"));
        assert!(matches("key[^]", "keyx"));
    }
}
