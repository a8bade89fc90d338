//! Greedy word wrap that respects the poet's own line breaks
//!
//! Text is split on spaces, not on newlines, so a token may carry the
//! author's line breaks inside it. Words are appended to an accumulator until
//! the next one would overflow; the accumulator is then flushed, keeping every
//! user-authored break as a line boundary. Tokens wider than the whole budget
//! (long URLs, keyboard mashing) fall back to character-by-character breaking.
//!
//! Width of multi-line text is always the width of its widest line.

use std::fmt;

use crate::error::{RenderError, Result};
use crate::traits::GlyphMetrics;

/// Lines in reading order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WrapResult {
    lines: Vec<String>,
}

impl WrapResult {
    /// Split already-wrapped text into its lines
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_owned).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines joined with newlines
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl fmt::Display for WrapResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Wrap `text` so no line is wider than `max_width` pixels
///
/// The only lines allowed to exceed the budget are single characters that are
/// wider than the budget on their own.
pub fn wrap<M>(text: &str, metrics: &M, max_width: f32) -> Result<WrapResult>
where
    M: GlyphMetrics + ?Sized,
{
    if !(max_width > 0.0) {
        return Err(RenderError::Layout(format!(
            "wrap width must be positive, got {max_width}"
        ))
        .into());
    }

    let fits = |candidate: &str| -> Result<bool> { Ok(metrics.text_width(candidate)? <= max_width) };

    let mut wrapped: Vec<String> = Vec::new();
    let mut tmp = String::new();

    for word in text.split(' ') {
        let word_fits = fits(word)?;

        if word_fits && !fits(&format!("{tmp}{word}"))? {
            tmp = flush(&mut wrapped, &tmp, word, &fits)?;
        } else if !word_fits {
            // Widths of the finished lines in `tmp` and of the line being extended
            let (mut head_width, mut tail_width) = match tmp.rsplit_once('\n') {
                Some((head, tail)) => (metrics.text_width(head)?, metrics.measure(tail)?.width),
                None => (0.0, metrics.measure(&tmp)?.width),
            };

            let mut buf = [0u8; 4];
            for ch in word.chars() {
                let advance = metrics.measure(ch.encode_utf8(&mut buf))?.width;

                if head_width.max(tail_width + advance) <= max_width {
                    tmp.push(ch);
                    tail_width += advance;
                } else {
                    push_trimmed(&mut wrapped, &tmp);
                    tmp.clear();
                    tmp.push(ch);
                    head_width = 0.0;
                    tail_width = advance;
                }
            }
            tmp.push(' ');
        } else {
            tmp.push_str(word);
            tmp.push(' ');
        }
    }

    push_trimmed(&mut wrapped, &tmp);

    log::trace!("wrapped {} chars into {} lines", text.len(), wrapped.len());
    Ok(WrapResult::from_text(&wrapped.join("\n")))
}

/// Close the accumulator before `word` and return the new accumulator
///
/// Every user-authored line but the last goes out verbatim; the last one keeps
/// collecting words if `word` still fits next to it.
fn flush<F>(wrapped: &mut Vec<String>, tmp: &str, word: &str, fits: &F) -> Result<String>
where
    F: Fn(&str) -> Result<bool>,
{
    let mut fragments: Vec<&str> = trim_breaks(tmp).split('\n').collect();
    let last = fragments.pop().unwrap_or_default();

    if fragments.is_empty() {
        push_trimmed(wrapped, last);
        return Ok(format!("{word} "));
    }

    wrapped.extend(fragments.into_iter().map(str::to_owned));

    let joined = format!("{last} {word}");
    if fits(&joined)? {
        Ok(format!("{joined} "))
    } else {
        push_trimmed(wrapped, last);
        Ok(format!("{word} "))
    }
}

fn trim_breaks(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\n')
}

fn push_trimmed(wrapped: &mut Vec<String>, tmp: &str) {
    let line = trim_breaks(tmp);
    if !line.is_empty() {
        wrapped.push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextExtent;

    /// Every character is 10px wide except 'W', which is 30px
    struct Mono;

    impl GlyphMetrics for Mono {
        fn measure(&self, line: &str) -> Result<TextExtent> {
            let width = line.chars().map(|c| if c == 'W' { 30.0 } else { 10.0 }).sum();
            Ok(TextExtent::new(width, 20.0))
        }

        fn line_height(&self) -> f32 {
            20.0
        }
    }

    fn lines(text: &str, width: f32) -> Vec<String> {
        wrap(text, &Mono, width).unwrap().into_lines()
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(lines("roses are red", 500.0), vec!["roses are red"]);
    }

    #[test]
    fn breaks_between_words() {
        // 10 chars per line at 100px
        assert_eq!(
            lines("the quick brown fox jumps", 100.0),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn keeps_user_newlines_when_everything_fits() {
        let result = wrap("line one\nline two", &Mono, 500.0).unwrap();
        assert_eq!(result.text(), "line one\nline two");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn keeps_user_newlines_across_a_flush() {
        // "aa\nbbbb cc" overflows on "dddddddd": the break before "bbbb" survives
        assert_eq!(
            lines("aa\nbbbb cc dddddddd", 100.0),
            vec!["aa", "bbbb cc", "dddddddd"]
        );
    }

    #[test]
    fn overflowing_last_fragment_gets_its_own_line() {
        assert_eq!(
            lines("first\nab cd efghijklm", 100.0),
            vec!["first", "ab cd", "efghijklm"]
        );
    }

    #[test]
    fn last_fragment_keeps_collecting_when_it_fits() {
        // the doubled space overflows, the single joining space does not
        assert_eq!(lines("x\nabcdefg  hi", 100.0), vec!["x", "abcdefg hi"]);
    }

    #[test]
    fn long_token_splits_by_character() {
        let result = lines("abcdefghijklmnopqrstuvwxy", 100.0);
        assert_eq!(result, vec!["abcdefghij", "klmnopqrst", "uvwxy"]);
    }

    /// Counts how many characters were handed to `measure`
    struct Counting(std::sync::atomic::AtomicUsize);

    impl GlyphMetrics for Counting {
        fn measure(&self, line: &str) -> Result<TextExtent> {
            let n = line.chars().count();
            self.0.fetch_add(n, std::sync::atomic::Ordering::Relaxed);
            Ok(TextExtent::new(n as f32 * 10.0, 20.0))
        }

        fn line_height(&self) -> f32 {
            20.0
        }
    }

    #[test]
    fn long_token_is_measured_in_linear_time() {
        let token = "x".repeat(5_000);
        let metrics = Counting(Default::default());

        let result = wrap(&token, &metrics, 100.0).unwrap();
        assert_eq!(result.len(), 500);
        assert!(result.lines().iter().all(|line| line.len() == 10));

        let measured = metrics.0.load(std::sync::atomic::Ordering::Relaxed);
        assert!(measured < 4 * token.len(), "measured {measured} chars");
    }

    #[test]
    fn long_token_continues_the_last_line_after_a_break() {
        // "abc" is a finished line, the token starts after "de "
        assert_eq!(
            lines("abc\nde xxxxxxxxxxxxxxx", 100.0),
            vec!["abc", "de xxxxxxx", "xxxxxxxx"]
        );
    }

    #[test]
    fn long_token_then_short_word() {
        let result = lines("a very-very-very-long-unbreakable-token short", 100.0);
        for line in &result {
            assert!(Mono.text_width(line).unwrap() <= 100.0, "{line:?} too wide");
        }
        assert_eq!(result.len(), 5);
        assert_eq!(result.last().map(String::as_str), Some("short"));
        assert!(result.concat().contains("very-very-very-long-unbreakable-token"));
    }

    #[test]
    fn glyph_wider_than_budget_stands_alone() {
        // 'W' is 30px, budget is 20px
        assert_eq!(lines("WW", 20.0), vec!["W", "W"]);
        assert_eq!(lines("aWb", 20.0), vec!["a", "W", "b"]);
    }

    #[test]
    fn repeated_spaces_do_not_create_blank_lines() {
        assert_eq!(lines("   hello", 100.0), vec!["hello"]);
    }

    #[test]
    fn rejects_non_positive_width() {
        assert!(wrap("hello", &Mono, 0.0).is_err());
        assert!(wrap("hello", &Mono, -5.0).is_err());
        assert!(wrap("hello", &Mono, f32::NAN).is_err());
    }

    #[test]
    fn display_joins_lines() {
        let result = WrapResult::from_text("a\nb");
        assert_eq!(result.to_string(), "a\nb");
        assert_eq!(result.lines(), ["a".to_string(), "b".to_string()]);
    }
}
