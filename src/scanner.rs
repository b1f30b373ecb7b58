//! Lexical scanner for SQL statement boundaries.
//!
//! Finds the `;` separators that actually terminate statements, ignoring
//! ones buried in string literals, quoted identifiers, line/block comments
//! and dollar-quoted blocks. The scan is deliberately permissive: an
//! unterminated quote or comment simply extends to the end of the text,
//! so intermediate states while the user is typing never fail.

use serde::{Deserialize, Serialize};

/// One lexically bounded statement with its source range (char offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSegment {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Scans the source text into non-empty statement segments.
///
/// Segment text is trimmed; the recorded range starts at the first
/// non-whitespace, non-comment character. Segments containing only
/// whitespace and comments are dropped. A final segment without a
/// trailing `;` is included if it has content.
pub fn scan(source: &str) -> Vec<StatementSegment> {
    scan_inner(source).0
}

/// Char offsets of every statement-terminating `;` in the source.
pub(crate) fn boundaries(source: &str) -> Vec<usize> {
    scan_inner(source).1
}

fn scan_inner(source: &str) -> (Vec<StatementSegment>, Vec<usize>) {
    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();

    let mut segments = Vec::new();
    let mut boundaries = Vec::new();
    let mut state = ScanState::Normal;
    let mut first_content: Option<usize> = None;
    let mut pos = 0;

    while pos < len {
        let c = chars[pos];

        match &state {
            ScanState::Normal => {
                if c == ';' {
                    boundaries.push(pos);
                    push_segment(&chars, first_content.take(), pos, &mut segments);
                    pos += 1;
                    continue;
                }
                if c == '-' && chars.get(pos + 1) == Some(&'-') {
                    state = ScanState::LineComment;
                    pos += 2;
                    continue;
                }
                if c == '/' && chars.get(pos + 1) == Some(&'*') {
                    state = ScanState::BlockComment(1);
                    pos += 2;
                    continue;
                }
                if c == '\'' {
                    first_content.get_or_insert(pos);
                    state = ScanState::SingleQuoted;
                    pos += 1;
                    continue;
                }
                if c == '"' {
                    first_content.get_or_insert(pos);
                    state = ScanState::DoubleQuoted;
                    pos += 1;
                    continue;
                }
                if c == '$' {
                    if let Some(tag_len) = dollar_tag_len(&chars, pos) {
                        let tag: String = chars[pos + 1..pos + tag_len - 1].iter().collect();
                        first_content.get_or_insert(pos);
                        state = ScanState::DollarQuoted(tag);
                        pos += tag_len;
                        continue;
                    }
                    first_content.get_or_insert(pos);
                    pos += 1;
                    continue;
                }
                if !c.is_whitespace() {
                    first_content.get_or_insert(pos);
                }
                pos += 1;
            }
            ScanState::SingleQuoted => {
                if c == '\'' {
                    if chars.get(pos + 1) == Some(&'\'') {
                        // escaped quote, stays inside the literal
                        pos += 2;
                    } else {
                        state = ScanState::Normal;
                        pos += 1;
                    }
                } else {
                    pos += 1;
                }
            }
            ScanState::DoubleQuoted => {
                if c == '"' {
                    if chars.get(pos + 1) == Some(&'"') {
                        pos += 2;
                    } else {
                        state = ScanState::Normal;
                        pos += 1;
                    }
                } else {
                    pos += 1;
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Normal;
                }
                pos += 1;
            }
            ScanState::BlockComment(depth) => {
                if c == '/' && chars.get(pos + 1) == Some(&'*') {
                    state = ScanState::BlockComment(depth + 1);
                    pos += 2;
                } else if c == '*' && chars.get(pos + 1) == Some(&'/') {
                    state = if *depth > 1 {
                        ScanState::BlockComment(depth - 1)
                    } else {
                        ScanState::Normal
                    };
                    pos += 2;
                } else {
                    pos += 1;
                }
            }
            ScanState::DollarQuoted(tag) => {
                if c == '$' && closes_dollar_quote(&chars, pos, tag) {
                    pos += tag.chars().count() + 2;
                    state = ScanState::Normal;
                } else {
                    pos += 1;
                }
            }
        }
    }

    push_segment(&chars, first_content, len, &mut segments);
    (segments, boundaries)
}

/// Length in chars of a well-formed `$tag$` opener at `pos`, if any.
/// The tag may be empty; tag characters are alphanumeric or underscore.
fn dollar_tag_len(chars: &[char], pos: usize) -> Option<usize> {
    let mut i = pos + 1;
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
        i += 1;
    }
    if chars.get(i) == Some(&'$') {
        Some(i - pos + 1)
    } else {
        None
    }
}

fn closes_dollar_quote(chars: &[char], pos: usize, tag: &str) -> bool {
    let mut i = pos + 1;
    for t in tag.chars() {
        if chars.get(i) != Some(&t) {
            return false;
        }
        i += 1;
    }
    chars.get(i) == Some(&'$')
}

fn push_segment(
    chars: &[char],
    first_content: Option<usize>,
    end: usize,
    segments: &mut Vec<StatementSegment>,
) {
    let Some(start) = first_content else {
        return;
    };
    let mut last = end;
    while last > start && chars[last - 1].is_whitespace() {
        last -= 1;
    }
    if last == start {
        return;
    }
    segments.push(StatementSegment {
        text: chars[start..last].iter().collect(),
        start,
        end: last,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        scan(source).into_iter().map(|s| s.text).collect()
    }

    mod boundaries {
        use super::*;

        #[test]
        fn splits_on_top_level_semicolons() {
            assert_eq!(texts("SELECT 1; SELECT 2;"), vec!["SELECT 1", "SELECT 2"]);
        }

        #[test]
        fn final_segment_without_semicolon_is_included() {
            assert_eq!(texts("SELECT 1; SELECT 2"), vec!["SELECT 1", "SELECT 2"]);
        }

        #[test]
        fn mixed_contexts_yield_exactly_four_statements() {
            let sql = "SELECT ';' AS x; SELECT 1 /* ; */; DO $$ ... ; $$; SELECT 3;";
            let segments = scan(sql);
            assert_eq!(segments.len(), 4);
            assert_eq!(segments[0].text, "SELECT ';' AS x");
            assert_eq!(segments[1].text, "SELECT 1 /* ; */");
            assert_eq!(segments[2].text, "DO $$ ... ; $$");
            assert_eq!(segments[3].text, "SELECT 3");
        }

        #[test]
        fn boundary_offsets_are_semicolon_positions() {
            assert_eq!(boundaries("SELECT 1;SELECT 2;"), vec![8, 17]);
        }

        #[test]
        fn segment_ranges_reconstruct_source_slices() {
            let sql = "  SELECT 1;\n-- note\nSELECT 2  ";
            for seg in scan(sql) {
                let slice: String = sql.chars().skip(seg.start).take(seg.end - seg.start).collect();
                assert_eq!(slice, seg.text);
            }
        }

        #[test]
        fn rescan_of_unchanged_text_is_stable() {
            let sql = "SELECT 'a;b'; UPDATE t SET x = 1; -- done\nSELECT 2";
            assert_eq!(scan(sql), scan(sql));
        }
    }

    mod quoting {
        use super::*;

        #[test]
        fn semicolon_in_string_literal_is_not_a_boundary() {
            assert_eq!(texts("SELECT 'a;b';"), vec!["SELECT 'a;b'"]);
        }

        #[test]
        fn escaped_single_quote_does_not_close_the_literal() {
            assert_eq!(
                texts("SELECT 'O''Brien;x'; SELECT 2;"),
                vec!["SELECT 'O''Brien;x'", "SELECT 2"]
            );
        }

        #[test]
        fn semicolon_in_quoted_identifier_is_not_a_boundary() {
            assert_eq!(texts(r#"SELECT "a;b" FROM t;"#), vec![r#"SELECT "a;b" FROM t"#]);
        }

        #[test]
        fn escaped_double_quote_does_not_close_the_identifier() {
            assert_eq!(
                texts(r#"SELECT "we""ird;name";SELECT 2"#),
                vec![r#"SELECT "we""ird;name""#, "SELECT 2"]
            );
        }

        #[test]
        fn tagged_dollar_quote_only_closes_on_matching_tag() {
            let sql = "DO $fn$ BEGIN x; $other$ ; $fn$; SELECT 1;";
            assert_eq!(
                texts(sql),
                vec!["DO $fn$ BEGIN x; $other$ ; $fn$", "SELECT 1"]
            );
        }

        #[test]
        fn lone_dollar_is_not_a_quote_opener() {
            assert_eq!(texts("SELECT 1 + $; SELECT 2;"), vec!["SELECT 1 + $", "SELECT 2"]);
        }
    }

    mod comments {
        use super::*;

        #[test]
        fn semicolon_in_line_comment_is_not_a_boundary() {
            assert_eq!(
                texts("SELECT 1 -- stop; here\n; SELECT 2;"),
                vec!["SELECT 1 -- stop; here", "SELECT 2"]
            );
        }

        #[test]
        fn block_comments_nest() {
            assert_eq!(
                texts("SELECT 1 /* outer /* inner ; */ still ; */; SELECT 2;"),
                vec!["SELECT 1 /* outer /* inner ; */ still ; */", "SELECT 2"]
            );
        }

        #[test]
        fn comment_only_segment_is_dropped() {
            assert_eq!(texts("-- nothing to run\n; SELECT 1;"), vec!["SELECT 1"]);
            assert_eq!(texts("/* all comment */;"), Vec::<String>::new());
        }

        #[test]
        fn leading_comment_is_excluded_from_the_range() {
            let sql = "-- intro\nSELECT 1;";
            let segments = scan(sql);
            assert_eq!(segments.len(), 1);
            assert_eq!(segments[0].text, "SELECT 1");
            assert_eq!(segments[0].start, 9);
        }
    }

    mod permissive {
        use super::*;

        #[test]
        fn unterminated_string_extends_to_end_of_text() {
            assert_eq!(texts("SELECT 'oops; SELECT 2;"), vec!["SELECT 'oops; SELECT 2;"]);
        }

        #[test]
        fn unterminated_block_comment_never_errors() {
            assert_eq!(texts("SELECT 1; /* dangling ;"), vec!["SELECT 1"]);
        }

        #[test]
        fn unterminated_dollar_quote_extends_to_end_of_text() {
            assert_eq!(texts("DO $$ no close; SELECT 2"), vec!["DO $$ no close; SELECT 2"]);
        }

        #[test]
        fn empty_and_whitespace_sources_yield_nothing() {
            assert!(scan("").is_empty());
            assert!(scan("  \n\t ").is_empty());
            assert!(scan(";;;").is_empty());
        }
    }
}
