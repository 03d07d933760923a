/// テキスト計量ユーティリティ。
///
/// 文分割、音節推定、Fleschリーダビリティを提供します。
use unicode_segmentation::UnicodeSegmentation;

/// テキストを文に分割する。
///
/// Unicode UAX#29に準拠した文境界検出を使用します。
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// テキストを単語に分割する。
#[must_use]
pub fn split_words(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}

/// 1文あたりの平均単語数。空テキストは0.0。
#[must_use]
pub fn avg_sentence_length(text: &str) -> f64 {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return 0.0;
    }
    let total_words: usize = sentences
        .iter()
        .map(|s| s.split_whitespace().count())
        .sum();
    total_words as f64 / sentences.len() as f64
}

/// 英語単語の音節数を推定する。
///
/// 母音連続を1音節と数え、語末の無音eを除外する。最低1音節。
#[must_use]
pub fn estimate_syllables(word: &str) -> usize {
    let lower = word.to_lowercase();
    let chars: Vec<char> = lower.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if chars.is_empty() {
        return 0;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
    let mut count = 0usize;
    let mut prev_vowel = false;
    for &c in &chars {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    // 語末の無音e（"make"など）。"le"終わり（"table"）は音節が残る。
    if chars.len() >= 2 && chars[chars.len() - 1] == 'e' && !is_vowel(chars[chars.len() - 2]) {
        let ends_in_consonant_le =
            chars.len() >= 3 && chars[chars.len() - 2] == 'l' && !is_vowel(chars[chars.len() - 3]);
        if !ends_in_consonant_le {
            count = count.saturating_sub(1);
        }
    }

    count.max(1)
}

/// Fleschリーディングイーズ。
///
/// `206.835 - 1.015*(words/sentences) - 84.6*(syllables/words)`。
/// 単語の無いテキストは0.0。
#[must_use]
pub fn flesch_reading_ease(text: &str) -> f64 {
    let words = split_words(text);
    if words.is_empty() {
        return 0.0;
    }
    let sentence_count = split_sentences(text).len().max(1);
    let syllables: usize = words.iter().map(|w| estimate_syllables(w)).sum();

    206.835 - 1.015 * (words.len() as f64 / sentence_count as f64)
        - 84.6 * (syllables as f64 / words.len() as f64)
}
