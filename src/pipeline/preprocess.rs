//! テキスト前処理段。
//!
//! 各投稿の`title`/`body`から正規化済みトークン列（空白区切り）を作る。
//! 絵文字は句読点と一緒に落ち、レンマ化は行わない。原文は出力用に
//! `Post`側へそのまま残る。

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use rustc_hash::FxHashSet;
use unicode_normalization::UnicodeNormalization;

use crate::model::Post;

/// 前処理済みの1投稿。全スコアリング段の共通入力。
#[derive(Debug, Clone)]
pub struct CleanPost {
    pub post: Post,
    pub clean_title: String,
    pub clean_body: String,
}

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://|www\.)\S+").expect("url pattern compiles"));
static NON_LETTER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z\s]+").expect("non-letter pattern compiles"));

// NLTK英語ストップワード。
static STOPWORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
        "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
        "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
        "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
        "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
        "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
        "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
        "with", "about", "against", "between", "into", "through", "during", "before", "after",
        "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
        "again", "further", "then", "once", "here", "there", "when", "where", "why", "how",
        "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o",
        "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't",
        "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
        "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
        "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
        "wouldn", "wouldn't",
    ]
    .into_iter()
    .collect()
});

/// 1フィールド分の正規化。NFC→小文字化→URL除去→記号/数字除去→
/// ストップワード除去→単一スペース結合。
#[must_use]
pub fn clean_text(text: &str) -> String {
    let normalized: String = text.nfc().collect::<String>().to_lowercase();
    let without_urls = URL_PATTERN.replace_all(&normalized, " ");
    let letters_only = NON_LETTER_PATTERN.replace_all(&without_urls, " ");

    letters_only
        .split_whitespace()
        .filter(|token| !STOPWORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 前処理段。投稿間に共有状態が無いのでデータ並列で走る。
pub struct PreprocessStage;

impl PreprocessStage {
    #[must_use]
    pub fn run(posts: Vec<Post>) -> Vec<CleanPost> {
        posts
            .into_par_iter()
            .map(|post| {
                let clean_title = clean_text(&post.title);
                let clean_body = clean_text(&post.body);
                CleanPost {
                    post,
                    clean_title,
                    clean_body,
                }
            })
            .collect()
    }
}
