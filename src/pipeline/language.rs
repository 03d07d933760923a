//! 言語信号抽出段。
//!
//! 本文から主観性、リーダビリティ、平均文長、フォーマリティ、感情語数、
//! スタンスを導出する。トレンド予測器の特徴量源でもある。空の本文は
//! 定義済みの中立タプル（フォーマリティだけ中間値0.5）を返す。

use std::collections::BTreeMap;
use std::sync::Arc;

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::warn;

use crate::analyzers::{PosTagger, PosToken};
use crate::model::{Degradation, Stance};
use crate::pipeline::preprocess::CleanPost;
use crate::util::text::{avg_sentence_length, flesch_reading_ease};

pub const EMOTIONS: [&str; 4] = ["joy", "anger", "fear", "surprise"];

const EMOTION_WORDS: [(&str, &str); 18] = [
    ("happy", "joy"),
    ("great", "joy"),
    ("excellent", "joy"),
    ("good", "joy"),
    ("positive", "joy"),
    ("angry", "anger"),
    ("mad", "anger"),
    ("furious", "anger"),
    ("negative", "anger"),
    ("bad", "anger"),
    ("scared", "fear"),
    ("afraid", "fear"),
    ("worried", "fear"),
    ("concerned", "fear"),
    ("wow", "surprise"),
    ("unexpected", "surprise"),
    ("surprised", "surprise"),
    ("shocking", "surprise"),
];

const AGREEMENT_MARKERS: [&str; 5] = ["agree", "yes", "correct", "right", "true"];
const DISAGREEMENT_MARKERS: [&str; 5] = ["disagree", "no", "wrong", "false", "incorrect"];

static EMOTION_AC: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::new(EMOTION_WORDS.iter().map(|(word, _)| word))
        .expect("emotion automaton builds")
});
static AGREEMENT_AC: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(AGREEMENT_MARKERS).expect("agreement automaton builds"));
static DISAGREEMENT_AC: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(DISAGREEMENT_MARKERS).expect("disagreement automaton builds"));

// 主観性語彙。重みは[0,1]で、1に近いほど主観が強い。
static SUBJECTIVITY_WEIGHTS: Lazy<FxHashMap<&'static str, f64>> = Lazy::new(|| {
    [
        ("amazing", 0.9),
        ("awful", 0.9),
        ("awesome", 0.9),
        ("terrible", 1.0),
        ("horrible", 1.0),
        ("wonderful", 1.0),
        ("best", 0.8),
        ("worst", 1.0),
        ("great", 0.75),
        ("good", 0.6),
        ("bad", 0.667),
        ("nice", 0.6),
        ("beautiful", 0.85),
        ("ugly", 0.8),
        ("love", 0.6),
        ("hate", 0.8),
        ("like", 0.5),
        ("think", 0.5),
        ("believe", 0.5),
        ("feel", 0.5),
        ("guess", 0.5),
        ("hope", 0.5),
        ("probably", 0.5),
        ("maybe", 0.5),
        ("definitely", 0.8),
        ("certainly", 0.7),
        ("obviously", 0.8),
        ("clearly", 0.7),
        ("honestly", 0.7),
        ("totally", 0.7),
        ("absolutely", 0.9),
        ("ridiculous", 0.9),
        ("insane", 0.9),
        ("crazy", 0.9),
        ("stupid", 0.9),
        ("dumb", 0.9),
        ("brilliant", 0.9),
        ("perfect", 1.0),
        ("useless", 0.9),
        ("overrated", 0.8),
        ("underrated", 0.8),
        ("happy", 0.8),
        ("sad", 0.75),
        ("angry", 0.8),
        ("excited", 0.8),
        ("boring", 0.8),
        ("interesting", 0.5),
        ("important", 0.5),
        ("easy", 0.65),
        ("hard", 0.55),
    ]
    .into_iter()
    .collect()
});

/// 抽出結果の列。入力と同じ長さ・順序。
pub struct LanguageColumns {
    pub subjectivity: Vec<f64>,
    pub readability: Vec<f64>,
    pub avg_sentence_length: Vec<f64>,
    pub formality: Vec<f64>,
    pub emotions: Vec<BTreeMap<String, u32>>,
    pub stance: Vec<Stance>,
    pub substituted: u64,
    pub degradation: Option<Degradation>,
}

pub struct LanguageStage {
    tagger: Option<Arc<dyn PosTagger>>,
}

impl LanguageStage {
    #[must_use]
    pub fn new(tagger: Option<Arc<dyn PosTagger>>) -> Self {
        Self { tagger }
    }

    pub async fn extract(&self, posts: &[CleanPost]) -> LanguageColumns {
        let subjectivity: Vec<f64> = posts
            .par_iter()
            .map(|post| subjectivity_of(&post.clean_body))
            .collect();
        let readability: Vec<f64> = posts
            .par_iter()
            .map(|post| {
                if post.post.body.trim().is_empty() {
                    0.0
                } else {
                    flesch_reading_ease(&post.post.body)
                }
            })
            .collect();
        let sentence_length: Vec<f64> = posts
            .par_iter()
            .map(|post| avg_sentence_length(&post.post.body))
            .collect();
        let emotions: Vec<BTreeMap<String, u32>> = posts
            .par_iter()
            .map(|post| emotion_counts(&post.post.body.to_lowercase()))
            .collect();
        let stance: Vec<Stance> = posts
            .par_iter()
            .map(|post| stance_of(&post.post.body.to_lowercase()))
            .collect();

        let mut substituted = 0;
        let mut degradation = None;
        let formality = match &self.tagger {
            Some(tagger) => {
                let (formality, subs) = formality_column(tagger.as_ref(), posts).await;
                substituted = subs;
                formality
            }
            None => {
                degradation = Some(Degradation::new(
                    "language",
                    "POS tagger unavailable, formality fixed at midpoint",
                ));
                vec![0.5; posts.len()]
            }
        };

        LanguageColumns {
            subjectivity,
            readability,
            avg_sentence_length: sentence_length,
            formality,
            emotions,
            stance,
            substituted,
            degradation,
        }
    }
}

/// 語彙トークンの平均重み。語彙に当たらなければ0.0。
#[must_use]
pub fn subjectivity_of(clean_text: &str) -> f64 {
    let weights: Vec<f64> = clean_text
        .split_whitespace()
        .filter_map(|token| SUBJECTIVITY_WEIGHTS.get(token).copied())
        .collect();
    if weights.is_empty() {
        0.0
    } else {
        weights.iter().sum::<f64>() / weights.len() as f64
    }
}

/// 4感情の部分文字列出現数。キーは常に4つ揃う。
#[must_use]
pub fn emotion_counts(lower_text: &str) -> BTreeMap<String, u32> {
    let mut counts: BTreeMap<String, u32> = EMOTIONS
        .iter()
        .map(|name| ((*name).to_string(), 0))
        .collect();
    for found in EMOTION_AC.find_iter(lower_text) {
        let (_, emotion) = EMOTION_WORDS[found.pattern().as_usize()];
        if let Some(count) = counts.get_mut(emotion) {
            *count += 1;
        }
    }
    counts
}

/// 賛同/反対マーカーの多数決。同数はNeutral。
#[must_use]
pub fn stance_of(lower_text: &str) -> Stance {
    let agreement = AGREEMENT_AC.find_iter(lower_text).count();
    let disagreement = DISAGREEMENT_AC.find_iter(lower_text).count();
    match agreement.cmp(&disagreement) {
        std::cmp::Ordering::Greater => Stance::Agreement,
        std::cmp::Ordering::Less => Stance::Disagreement,
        std::cmp::Ordering::Equal => Stance::Neutral,
    }
}

// Penn Treebankタグを内容語/口語表現へ割り当てる。
// 内容語: 名詞・形容詞・前置詞・限定詞。口語: 間投詞・代名詞・副詞。
fn classify_tag(label: &str) -> Option<bool> {
    if label.starts_with("NN") || label.starts_with("JJ") || label == "IN" || label == "DT" {
        return Some(true);
    }
    if label == "UH"
        || label.starts_with("PRP")
        || label.starts_with("RB")
        || label == "WP"
        || label == "WP$"
        || label == "WRB"
    {
        return Some(false);
    }
    None
}

/// トークン列からフォーマリティ比を出す。該当タグ無しは中間値0.5。
#[must_use]
pub fn formality_of(tokens: &[PosToken]) -> f64 {
    let mut formal = 0u32;
    let mut informal = 0u32;
    for token in tokens {
        match classify_tag(&token.label) {
            Some(true) => formal += 1,
            Some(false) => informal += 1,
            None => {}
        }
    }
    let total = formal + informal;
    if total == 0 {
        0.5
    } else {
        f64::from(formal) / f64::from(total)
    }
}

/// 本文が空の投稿はタガーを呼ばず0.5。失敗チャンクも0.5で置換して続行。
async fn formality_column(tagger: &dyn PosTagger, posts: &[CleanPost]) -> (Vec<f64>, u64) {
    let mut formality = vec![0.5; posts.len()];
    let non_empty: Vec<(usize, String)> = posts
        .iter()
        .enumerate()
        .filter(|(_, post)| !post.post.body.trim().is_empty())
        .map(|(i, post)| (i, post.post.body.clone()))
        .collect();
    if non_empty.is_empty() {
        return (formality, 0);
    }

    let chunk_size = non_empty.len().div_ceil(num_cpus::get()).max(1);
    let mut substituted = 0;
    for chunk in non_empty.chunks(chunk_size) {
        let texts: Vec<String> = chunk.iter().map(|(_, text)| text.clone()).collect();
        match tagger.tag_batch(&texts).await {
            Ok(tagged) if tagged.len() == chunk.len() => {
                for ((index, _), tokens) in chunk.iter().zip(tagged) {
                    formality[*index] = formality_of(&tokens);
                }
            }
            Ok(tagged) => {
                warn!(
                    expected = chunk.len(),
                    got = tagged.len(),
                    "POS batch returned wrong arity, substituting midpoint formality"
                );
                substituted += chunk.len() as u64;
            }
            Err(error) => {
                warn!(error = %error, "POS batch failed, substituting midpoint formality");
                substituted += chunk.len() as u64;
            }
        }
    }
    (formality, substituted)
}
