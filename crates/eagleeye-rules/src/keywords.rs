//! Keyword extraction from document text.
//!
//! A plain vocabulary scan: a term is a keyword of the document when it
//! occurs anywhere in the text. Financial terms are ideographic, so there
//! is no tokenization step.

/// Financial terms looked for in a document when no vocabulary is given.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "政府补助",
    "营业外收入",
    "递延收益",
    "在建工程",
    "存货",
    "应收账款",
    "其他应收款",
    "短期借款",
    "长期借款",
    "有息债务",
    "经营活动现金流",
    "投资活动",
    "筹资活动",
    "贸易收入",
    "毛利率",
];

/// Vocabulary terms occurring in `text`, in vocabulary order, without
/// duplicates.
pub fn extract_keywords<S: AsRef<str>>(text: &str, vocabulary: &[S]) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for term in vocabulary {
        let term = term.as_ref().trim();
        if term.is_empty() || found.iter().any(|f| f == term) {
            continue;
        }
        if text.contains(term) {
            found.push(term.to_string());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_terms_in_vocabulary_order() {
        let text = "本期应收账款大幅增长，存货周转放缓，政府补助计入营业外收入。";
        assert_eq!(
            extract_keywords(text, DEFAULT_VOCABULARY),
            vec!["政府补助", "营业外收入", "存货", "应收账款"]
        );
    }

    #[test]
    fn longer_term_does_not_imply_shorter() {
        // 其他应收款 does not contain 应收账款.
        let found = extract_keywords("其他应收款余额", DEFAULT_VOCABULARY);
        assert_eq!(found, vec!["其他应收款"]);
    }

    #[test]
    fn custom_vocabulary_is_deduplicated() {
        let vocab = vec!["现金".to_string(), "现金".to_string(), " ".to_string()];
        assert_eq!(extract_keywords("现金流量表", &vocab), vec!["现金"]);
    }
}
