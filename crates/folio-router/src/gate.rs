use folio_core::agent::defaults::DEFAULT_KEYWORDS;

/// 相关性判断：决定一条消息是否值得交给模型
pub trait RelevanceGate: Send + Sync {
    fn is_relevant(&self, utterance: &str) -> bool;
}

/// 关键词子串匹配
///
/// 先去掉首尾空白并转小写，只要包含任意一个关键词即视为相关。
/// 不做词干化和否定处理；"what"、"how" 这类疑问词会让大部分问句通过。
#[derive(Debug, Clone)]
pub struct KeywordGate {
    keywords: Vec<String>,
}

impl KeywordGate {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordGate {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl RelevanceGate for KeywordGate {
    fn is_relevant(&self, utterance: &str) -> bool {
        let folded = utterance.trim().to_lowercase();
        if folded.is_empty() {
            return false;
        }
        self.keywords.iter().any(|k| folded.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_is_relevant() {
        assert!(KeywordGate::default().is_relevant("hi"));
    }

    #[test]
    fn test_interrogative_lets_weather_through() {
        assert!(KeywordGate::default().is_relevant("what's the weather"));
    }

    #[test]
    fn test_no_keyword_is_rejected() {
        assert!(!KeywordGate::default().is_relevant("xyz123"));
    }

    #[test]
    fn test_empty_and_blank() {
        let gate = KeywordGate::default();
        assert!(!gate.is_relevant(""));
        assert!(!gate.is_relevant("   \n"));
    }

    #[test]
    fn test_case_insensitive_and_trimmed() {
        let gate = KeywordGate::new(["Project"]);
        assert!(gate.is_relevant("  Tell me about PROJECTS  "));
        assert!(!gate.is_relevant("tell me a joke"));
    }

    #[test]
    fn test_substring_match_without_word_boundaries() {
        // "this" contains "hi"
        assert!(KeywordGate::default().is_relevant("this"));
    }

    #[test]
    fn test_every_keyword_matches_itself() {
        let gate = KeywordGate::default();
        for keyword in DEFAULT_KEYWORDS {
            assert!(gate.is_relevant(&keyword.to_uppercase()), "{}", keyword);
        }
    }

    #[test]
    fn test_blank_keywords_are_dropped() {
        let gate = KeywordGate::new(["", "  ", "meet"]);
        assert_eq!(gate.keywords(), &["meet".to_string()]);
        assert!(!gate.is_relevant("anything"));
    }
}
