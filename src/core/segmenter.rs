// Segmenter - Splits Japanese and Latin text into word-like tokens for the search index
//
// Word boundaries come from the ICU word segmenter, which uses a dictionary for
// Chinese and Japanese text and UAX #29 rules elsewhere. Segments without a
// letter or digit (punctuation, symbols, whitespace) are dropped.

use icu_segmenter::WordSegmenter;

fn is_word_like(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

/// Word-like segments of `text`, in order of appearance
pub fn segments(text: &str) -> Vec<&str> {
    let segmenter = WordSegmenter::new_dictionary();
    let breakpoints: Vec<usize> = segmenter.segment_str(text).collect();

    breakpoints
        .windows(2)
        .map(|bounds| &text[bounds[0]..bounds[1]])
        .filter(|segment| is_word_like(segment))
        .collect()
}

/// Space-joined segments, the value stored in the search index
pub fn index_text(text: &str) -> String {
    segments(text).join(" ")
}

/// FTS5 MATCH expression for a user query: every segment must appear as a
/// token prefix. `None` when the query has no searchable segment.
pub fn match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = segments(query)
        .into_iter()
        .map(|segment| format!("\"{}\"*", segment.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_kanji_runs_into_words() {
        let words = segments("古池や蛙飛び込む水の音");
        assert_eq!(words.concat(), "古池や蛙飛び込む水の音");
        assert!(words.contains(&"蛙"));
        assert!(!words.iter().any(|w| w.contains("蛙飛")));
    }

    #[test]
    fn test_discards_punctuation_and_whitespace() {
        assert_eq!(segments("「桜」 hello, world").last(), Some(&"world"));
        assert!(segments("「桜」 hello, world").contains(&"hello"));
        assert!(segments("、。！？ \n\t").is_empty());
        assert!(segments("春、夏！　秋。")
            .iter()
            .all(|w| w.chars().all(char::is_alphanumeric)));
    }

    #[test]
    fn test_latin_words() {
        assert_eq!(segments("Spring rain, falls."), vec!["Spring", "rain", "falls"]);
        assert_eq!(segments("year 2024"), vec!["year", "2024"]);
    }

    #[test]
    fn test_index_text_joins_with_spaces() {
        assert_eq!(index_text("Spring rain."), "Spring rain");
        assert_eq!(index_text("！？"), "");
    }

    #[test]
    fn test_match_expression() {
        assert_eq!(
            match_expression("spring rain"),
            Some("\"spring\"* \"rain\"*".to_string())
        );
        assert_eq!(match_expression("\"*)"), None);
        assert_eq!(match_expression(""), None);
    }
}
