//! G-code numeric field formatting and parsing.
//!
//! All positions are millimeters formatted with exactly two decimal places;
//! feed rates are emitted as integers. The parsing half is the inverse used
//! to replay an emitted command stream.

/// Format a coordinate value (mm) as a G-code field body.
pub fn format_coord(value_mm: f64) -> String {
    format!("{:.2}", value_mm)
}

/// Format a feed rate (mm/min) as a G-code field body.
pub fn format_feed(feed: u32) -> String {
    format!("{}", feed)
}

/// Parse one G-code line into `(letter, value)` words.
///
/// Comment lines (`;` prefixed) and blank lines parse to an empty list.
///
/// * `line` - One line of G-code, without the trailing newline
pub fn parse_words(line: &str) -> Result<Vec<(char, f64)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return Ok(Vec::new());
    }

    // Strip an inline trailing comment before splitting into words
    let code = match line.find(';') {
        Some(pos) => line[..pos].trim_end(),
        None => line,
    };

    let mut words = Vec::new();
    for token in code.split_whitespace() {
        let mut chars = token.chars();
        let letter = chars
            .next()
            .ok_or_else(|| format!("Empty word in line: {}", line))?;
        if !letter.is_ascii_alphabetic() {
            return Err(format!("Invalid word '{}' in line: {}", token, line));
        }
        let value = chars
            .as_str()
            .parse::<f64>()
            .map_err(|_| format!("Invalid number in word '{}'", token))?;
        words.push((letter.to_ascii_uppercase(), value));
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(0.0), "0.00");
        assert_eq!(format_coord(1.25), "1.25");
        assert_eq!(format_coord(-2.00784), "-2.01");
        assert_eq!(format_coord(12.346), "12.35");
    }

    #[test]
    fn test_format_feed() {
        assert_eq!(format_feed(2000), "2000");
        assert_eq!(format_feed(500), "500");
    }

    #[test]
    fn test_parse_words() {
        let words = parse_words("G1 X0.25 Y1.00 Z-2.01 F2000").unwrap();
        assert_eq!(
            words,
            vec![
                ('G', 1.0),
                ('X', 0.25),
                ('Y', 1.0),
                ('Z', -2.01),
                ('F', 2000.0)
            ]
        );
    }

    #[test]
    fn test_parse_comment_and_blank() {
        assert!(parse_words("; header comment").unwrap().is_empty());
        assert!(parse_words("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_inline_comment() {
        let words = parse_words("G0 Z1.00 ; Move to safe height").unwrap();
        assert_eq!(words, vec![('G', 0.0), ('Z', 1.0)]);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_words("G1 X").is_err());
        assert!(parse_words("G1 12X").is_err());
        assert!(parse_words("G1 Xabc").is_err());
    }

    #[test]
    fn test_round_trip() {
        let line = format!("G1 X{} F{}", format_coord(3.14159), format_feed(1200));
        let words = parse_words(&line).unwrap();
        assert_eq!(words, vec![('G', 1.0), ('X', 3.14), ('F', 1200.0)]);
    }
}
