//! モデルB: 語彙・ルールベースの複合スコアアナライザ。
//!
//! 語ごとの感情価を合算し、`s / sqrt(s^2 + 15)`で[-1,1]へ減衰正規化する。
//! 直前3語以内の否定語は感情価を反転減衰させ、強調語は感情価を増幅する。

use rustc_hash::{FxHashMap, FxHashSet};

/// 否定時の反転係数。完全反転より弱い。
const NEGATION_SCALAR: f64 = -0.74;
/// 強調語1語あたりの増分。
const BOOSTER_INCREMENT: f64 = 0.293;
/// 正規化の減衰定数。
const NORMALIZATION_ALPHA: f64 = 15.0;
/// 否定語を探索する後方窓。
const NEGATION_WINDOW: usize = 3;

/// 語彙ベースの複合スコアアナライザ。決定的で失敗しない。
#[derive(Debug)]
pub struct LexiconAnalyzer {
    valences: FxHashMap<&'static str, f64>,
    negators: FxHashSet<&'static str>,
    boosters: FxHashMap<&'static str, f64>,
}

impl LexiconAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            valences: default_valences(),
            negators: default_negators(),
            boosters: default_boosters(),
        }
    }

    /// 複合スコアを計算する。[-1,1]。空テキストや語彙外のみのテキストは0.0。
    #[must_use]
    pub fn compound(&self, text: &str) -> f64 {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return 0.0;
        }

        let mut sum = 0.0;
        for (idx, token) in tokens.iter().enumerate() {
            let lowered = token.to_lowercase();
            let Some(&base) = self.valences.get(lowered.as_str()) else {
                continue;
            };

            let mut valence = base;
            let window_start = idx.saturating_sub(NEGATION_WINDOW);
            for prior in &tokens[window_start..idx] {
                let prior = prior.to_lowercase();
                if self.negators.contains(prior.as_str()) {
                    valence *= NEGATION_SCALAR;
                } else if let Some(&boost) = self.boosters.get(prior.as_str()) {
                    // 増分は感情価の符号方向に働く
                    valence += boost * valence.signum();
                }
            }
            sum += valence;
        }

        normalize(sum)
    }
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// 感情価合計を[-1,1]へ減衰正規化する。
fn normalize(sum: f64) -> f64 {
    if sum == 0.0 {
        return 0.0;
    }
    sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()
}

fn default_valences() -> FxHashMap<&'static str, f64> {
    [
        // 正方向
        ("good", 1.9),
        ("great", 3.1),
        ("excellent", 2.7),
        ("amazing", 2.8),
        ("awesome", 3.1),
        ("love", 3.2),
        ("like", 1.5),
        ("best", 3.2),
        ("happy", 2.7),
        ("win", 2.8),
        ("winning", 2.4),
        ("gain", 2.4),
        ("gains", 2.4),
        ("profit", 2.2),
        ("bullish", 2.6),
        ("rally", 1.9),
        ("moon", 2.1),
        ("strong", 2.3),
        ("positive", 2.3),
        ("success", 2.7),
        ("beat", 1.6),
        ("growth", 2.0),
        ("up", 1.2),
        ("solid", 1.8),
        ("confident", 2.2),
        ("opportunity", 1.8),
        ("free", 1.7),
        ("safe", 1.9),
        ("right", 1.6),
        ("well", 1.1),
        // 負方向
        ("bad", -2.5),
        ("terrible", -2.9),
        ("awful", -2.9),
        ("horrible", -2.8),
        ("hate", -2.7),
        ("worst", -3.1),
        ("sad", -2.1),
        ("loss", -2.4),
        ("losses", -2.4),
        ("lose", -2.3),
        ("losing", -2.3),
        ("crash", -2.6),
        ("bearish", -2.6),
        ("dump", -2.2),
        ("drop", -1.6),
        ("fear", -2.2),
        ("scared", -2.2),
        ("worried", -1.9),
        ("risk", -1.3),
        ("risky", -1.6),
        ("weak", -1.9),
        ("negative", -2.3),
        ("fail", -2.5),
        ("failure", -2.6),
        ("broke", -2.0),
        ("debt", -1.7),
        ("scam", -2.8),
        ("fraud", -2.9),
        ("down", -1.2),
        ("wrong", -2.1),
        ("panic", -2.4),
        ("bubble", -1.4),
    ]
    .into_iter()
    .collect()
}

fn default_negators() -> FxHashSet<&'static str> {
    [
        "not", "no", "never", "neither", "nobody", "none", "cant", "cannot", "wont", "dont",
        "didnt", "isnt", "wasnt", "shouldnt", "wouldnt", "couldnt", "without", "hardly",
        "barely",
    ]
    .into_iter()
    .collect()
}

fn default_boosters() -> FxHashMap<&'static str, f64> {
    [
        ("very", BOOSTER_INCREMENT),
        ("extremely", BOOSTER_INCREMENT),
        ("really", BOOSTER_INCREMENT),
        ("absolutely", BOOSTER_INCREMENT),
        ("incredibly", BOOSTER_INCREMENT),
        ("totally", BOOSTER_INCREMENT),
        ("so", BOOSTER_INCREMENT),
        ("super", BOOSTER_INCREMENT),
        ("slightly", -BOOSTER_INCREMENT),
        ("somewhat", -BOOSTER_INCREMENT),
        ("kinda", -BOOSTER_INCREMENT),
        ("barely", -BOOSTER_INCREMENT),
        ("marginally", -BOOSTER_INCREMENT),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_text_is_neutral() {
        let analyzer = LexiconAnalyzer::new();
        assert!((analyzer.compound("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_lexicon_text_is_neutral() {
        let analyzer = LexiconAnalyzer::new();
        assert!((analyzer.compound("quarterly filing spreadsheet") - 0.0).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case("great amazing excellent", true)]
    #[case("terrible awful horrible", false)]
    fn sign_follows_lexicon(#[case] text: &str, #[case] positive: bool) {
        let analyzer = LexiconAnalyzer::new();
        let score = analyzer.compound(text);
        assert_eq!(score > 0.0, positive, "score {score} for {text}");
    }

    #[test]
    fn negation_flips_and_dampens() {
        let analyzer = LexiconAnalyzer::new();
        let plain = analyzer.compound("good");
        let negated = analyzer.compound("not good");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
        assert!(negated.abs() < plain.abs());
    }

    #[test]
    fn negation_window_is_three_tokens() {
        let analyzer = LexiconAnalyzer::new();
        // 否定語が4語前なら影響しない
        let distant = analyzer.compound("not the market said yesterday good");
        assert!(distant > 0.0);
    }

    #[test]
    fn booster_amplifies_magnitude() {
        let analyzer = LexiconAnalyzer::new();
        let plain = analyzer.compound("good");
        let boosted = analyzer.compound("very good");
        assert!(boosted > plain);
    }

    #[test]
    fn compound_stays_in_unit_interval() {
        let analyzer = LexiconAnalyzer::new();
        let text = "great great great great great great great great great great";
        let score = analyzer.compound(text);
        assert!(score > 0.9 && score <= 1.0);
    }

    #[test]
    fn normalization_is_odd_symmetric() {
        assert!((normalize(2.0) + normalize(-2.0)).abs() < 1e-12);
    }
}
