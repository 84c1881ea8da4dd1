//! Single-segment wildcard matching.
//!
//! A pattern is matched one `/`-separated segment at a time, so no wildcard
//! can ever match across a separator. Segment syntax:
//!
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[^a-z]` / `[!a-z]` match one character from (or
//!   not from) a class
//! - `\c` matches `c` literally

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    AnyRun,
    Class {
        negated: bool,
        ranges: Vec<(char, char)>,
    },
}

/// A compiled pattern for one path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPattern {
    tokens: Vec<Token>,
}

impl SegmentPattern {
    /// Compile one segment. Returns `None` for malformed syntax: an
    /// unterminated or empty class, or a trailing backslash.
    pub fn new(segment: &str) -> Option<Self> {
        let chars: Vec<char> = segment.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => tokens.push(Token::AnyRun),
                '?' => tokens.push(Token::AnyChar),
                '\\' => {
                    i += 1;
                    tokens.push(Token::Literal(*chars.get(i)?));
                }
                '[' => {
                    let (class, next) = parse_class(&chars, i + 1)?;
                    tokens.push(class);
                    i = next;
                    continue;
                }
                c => tokens.push(Token::Literal(c)),
            }
            i += 1;
        }

        Some(Self { tokens })
    }

    pub fn matches(&self, name: &str) -> bool {
        let name: Vec<char> = name.chars().collect();
        match_tokens(&self.tokens, &name)
    }
}

/// Parse a class body starting at `start`, just past the `[`. Returns the
/// token and the index following the closing `]`.
fn parse_class(chars: &[char], start: usize) -> Option<(Token, usize)> {
    let mut i = start;
    let negated = matches!(chars.get(i), Some('^' | '!'));
    if negated {
        i += 1;
    }

    let mut ranges = Vec::new();
    loop {
        let lo = match *chars.get(i)? {
            ']' if !ranges.is_empty() => return Some((Token::Class { negated, ranges }, i + 1)),
            ']' | '-' => return None,
            '\\' => {
                i += 1;
                *chars.get(i)?
            }
            c => c,
        };
        i += 1;

        let mut hi = lo;
        if chars.get(i) == Some(&'-') {
            i += 1;
            hi = match *chars.get(i)? {
                ']' | '-' => return None,
                '\\' => {
                    i += 1;
                    *chars.get(i)?
                }
                c => c,
            };
            i += 1;
        }

        if lo > hi {
            return None;
        }
        ranges.push((lo, hi));
    }
}

impl Token {
    /// Whether a single-character token accepts `c`. Never true for `*`.
    fn accepts(&self, c: char) -> bool {
        match self {
            Token::Literal(p) => *p == c,
            Token::AnyChar => true,
            Token::AnyRun => false,
            Token::Class { negated, ranges } => {
                ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi) != *negated
            }
        }
    }
}

/// Iterative star matcher. Only the most recent `*` is ever resumed, so the
/// stack stays flat and the work is bounded by tokens times name length.
fn match_tokens(tokens: &[Token], name: &[char]) -> bool {
    let (mut t, mut n) = (0, 0);
    // Token index after the last `*`, and where its run currently ends
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                t += 1;
                star = Some((t, n));
                continue;
            }
            Some(token) if token.accepts(name[n]) => {
                t += 1;
                n += 1;
                continue;
            }
            _ => {}
        }

        let Some((resume, run_end)) = star else {
            return false;
        };
        t = resume;
        n = run_end + 1;
        star = Some((resume, n));
    }

    tokens[t..].iter().all(|token| *token == Token::AnyRun)
}

/// Whether `s` contains any wildcard syntax.
pub fn has_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '\\'])
}

/// Compile every segment of a `/`-separated pattern.
pub(crate) fn compile(pattern: &str) -> Option<Vec<SegmentPattern>> {
    pattern.split('/').map(SegmentPattern::new).collect()
}

/// Match a whole relative path against a whole pattern, segment by segment.
pub fn matches_path(pattern: &str, path: &str) -> Option<bool> {
    let segments = compile(pattern)?;
    let names: Vec<&str> = path.split('/').collect();
    Some(
        segments.len() == names.len()
            && segments.iter().zip(&names).all(|(p, n)| p.matches(n)),
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn m(pattern: &str, name: &str) -> bool {
        SegmentPattern::new(pattern).unwrap().matches(name)
    }

    #[rstest]
    #[case("*", "anything", true)]
    #[case("*", "", true)]
    #[case("*2*", "file12", true)]
    #[case("*2*", "dir21", true)]
    #[case("*2*", "file11", false)]
    #[case("file?", "file1", true)]
    #[case("file?", "file", false)]
    #[case("file1[0-2]", "file12", true)]
    #[case("file1[^0-2]", "file12", false)]
    #[case("file1[!0-2]", "file13", true)]
    #[case("[abc]x", "bx", true)]
    #[case("\\*", "*", true)]
    #[case("\\*", "a", false)]
    #[case("[\\]]", "]", true)]
    #[case("*.txt", "readme.txt", true)]
    #[case("*.txt", "readme.md", false)]
    fn segment_matching(#[case] pattern: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(m(pattern, name), expected, "{pattern:?} vs {name:?}");
    }

    #[rstest]
    #[case("[")]
    #[case("[]")]
    #[case("[a")]
    #[case("[z-a]")]
    #[case("abc\\")]
    #[case("[a-]")]
    fn malformed(#[case] pattern: &str) {
        assert_eq!(SegmentPattern::new(pattern), None);
    }

    #[test]
    fn class_consumes_only_its_own_characters() {
        assert!(m("[ab]cd*", "acdzz"));
        assert!(!m("[ab]cd", "acdz"));
    }

    #[test]
    fn star_never_crosses_separator() {
        assert_eq!(matches_path("*", "dir1/file12"), Some(false));
        assert_eq!(matches_path("*/*2*", "dir1/file12"), Some(true));
        assert_eq!(matches_path("*2*", "dir1/file12"), Some(false));
        assert_eq!(matches_path("[", "x"), None);
    }

    #[test]
    fn many_stars_fail_fast() {
        let name = "a".repeat(60);
        assert!(!m("*a*a*a*a*a*a*a*b", &name));
        assert!(m("*a*a*a*a*a*a*a*", &name));
    }

    #[test]
    fn very_long_names_match_without_recursion() {
        let name = "a".repeat(500_000);
        assert!(!m("*b", &name));
        assert!(m("*a", &name));
        assert!(m("a*?", &name));
    }

    #[test]
    fn star_backtracks_past_partial_matches() {
        assert!(m("*ab", "aab"));
        assert!(m("a*b*c", "abxbyc"));
        assert!(!m("a*b*c", "abxbyd"));
        assert!(m("**", ""));
        assert!(!m("?*", ""));
    }

    #[test]
    fn meta_detection() {
        assert!(has_meta("*.txt"));
        assert!(has_meta("file[12]"));
        assert!(!has_meta("dir1/file11"));
    }
}
