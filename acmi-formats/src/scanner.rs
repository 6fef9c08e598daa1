//! Byte buffer → logical lines.
//!
//! The scanner normalizes CRLF to LF, skips blank/comment lines, and joins
//! backslash-continued physical lines into one logical line. It does not
//! interpret field syntax — that is the record decoder's job.

use acmi_common::{AcmiError, CancellationToken};

/// One logical line together with the 1-based physical line number it
/// started at, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogicalLine {
    pub line_no: usize,
    pub text: String,
}

/// Splits `input` into physical lines (LF-terminated, CR stripped) and
/// returns the first two as the header lines plus an iterator-friendly
/// vector of logical lines for everything after. Missing header lines
/// default to the empty string rather than erroring — the façade degrades
/// `AcmiData::is_valid` through `Header::is_valid()` instead of treating a
/// short file as a terminal failure.
///
/// `token` is polled once per physical line so a caller can cooperatively
/// abort a scan in progress.
pub fn scan(input: &str, token: &CancellationToken) -> Result<(Vec<String>, Vec<LogicalLine>), AcmiError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut physical = input.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

    let mut header: Vec<String> = physical.by_ref().take(2).map(str::to_owned).collect();
    header.resize(2, String::new());

    let mut logical = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (offset, raw) in physical.enumerate() {
        if token.is_cancelled() {
            return Err(AcmiError::Cancelled);
        }
        let line_no = offset + 3;

        let (start_no, mut acc) = pending.take().unwrap_or((line_no, String::new()));
        if !acc.is_empty() {
            acc.push('\n');
        }
        acc.push_str(raw);

        if ends_with_unescaped_backslash(&acc) {
            acc.pop();
            pending = Some((start_no, acc));
            continue;
        }

        if start_no == line_no {
            let trimmed = acc.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
        }

        logical.push(LogicalLine { line_no: start_no, text: acc });
    }

    if let Some((start_no, acc)) = pending {
        logical.push(LogicalLine { line_no: start_no, text: acc });
    }

    Ok((header, logical))
}

fn ends_with_unescaped_backslash(s: &str) -> bool {
    if !s.ends_with('\\') {
        return false;
    }
    let backslashes = s.chars().rev().take_while(|&c| c == '\\').count();
    backslashes % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn test_header_extraction() {
        let input = "FileType=text/acmi/tacview\nFileVersion=2.2\n#0\n";
        let (header, lines) = scan(input, &token()).unwrap();
        assert_eq!(vec!["FileType=text/acmi/tacview", "FileVersion=2.2"], header);
        assert_eq!(vec!["#0"], lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>());
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let input = "h1\nh2\n\n   \n// a comment\na,Name=x\n";
        let (_, lines) = scan(input, &token()).unwrap();
        assert_eq!(1, lines.len());
        assert_eq!("a,Name=x", lines[0].text);
    }

    #[test]
    fn test_line_continuation_joins_with_newline() {
        let input = "h1\nh2\na,Name=first\\\nsecond\n";
        let (_, lines) = scan(input, &token()).unwrap();
        assert_eq!(1, lines.len());
        assert_eq!("a,Name=first\nsecond", lines[0].text);
    }

    #[test]
    fn test_escaped_backslash_at_end_does_not_continue() {
        let input = "h1\nh2\na,Name=ends\\\\\nb,Name=next\n";
        let (_, lines) = scan(input, &token()).unwrap();
        assert_eq!(2, lines.len());
        assert_eq!("a,Name=ends\\\\", lines[0].text);
        assert_eq!("b,Name=next", lines[1].text);
    }

    #[test]
    fn test_crlf_normalized() {
        let input = "h1\r\nh2\r\na,Name=x\r\n";
        let (header, lines) = scan(input, &token()).unwrap();
        assert_eq!(vec!["h1", "h2"], header);
        assert_eq!("a,Name=x", lines[0].text);
    }

    #[test]
    fn test_missing_header_lines_default_to_empty() {
        let input = "only-one-line";
        let (header, lines) = scan(input, &token()).unwrap();
        assert_eq!(vec!["only-one-line".to_string(), String::new()], header);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_cancellation_is_observed() {
        let input = "h1\nh2\na,Name=x\n";
        let t = token();
        t.cancel();
        assert!(matches!(scan(input, &t), Err(AcmiError::Cancelled)));
    }
}
