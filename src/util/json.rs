/// JSON直列化の補助。
///
/// `serde_json`は素のNaN/無限大を受け付けないため、サンプル不足で
/// NaNになった統計量はnullとして出力する。
use serde::Serializer;

/// 有限のf64はそのまま、NaN/無限大はnullとして直列化する。
///
/// # Errors
/// 下位のシリアライザが失敗した場合はそのエラーを返す。
pub fn float_or_null<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}
