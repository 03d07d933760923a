/// 入力バッチ文書（`{"posts": [...]}`）のスキーマ。
///
/// 必須フィールドの欠落や型不一致は致命的エラーとして扱い、
/// そのバッチの部分的な出力は生成しない。
use serde_json::{Value, json};

use super::ValidationResult;

/// 投稿バッチ文書のJSON Schemaを返す。
pub(crate) fn posts_batch_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "PostBatch",
        "type": "object",
        "properties": {
            "posts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "group_id": { "type": "string", "minLength": 1 },
                        "title": { "type": "string" },
                        "body": { "type": "string" },
                        "score": { "type": "integer" },
                        "comment_count": { "type": "integer", "minimum": 0 },
                        "created_at": { "type": "integer" }
                    },
                    "required": ["group_id", "score", "comment_count", "created_at"]
                }
            }
        },
        "required": ["posts"]
    })
}

/// 入力バッチ文書を検証する。
pub(crate) fn validate_posts_batch(instance: &Value) -> ValidationResult {
    super::validate_json(&posts_batch_schema(), instance)
}
