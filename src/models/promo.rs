use serde::Serialize;

/// 促销码校验结果。与线上行为一致：校验失败不是错误，
/// 只是 valid=false 加一条给顾客看的法语提示。
#[derive(Debug, Clone, Serialize)]
pub struct PromoValidation {
    pub valid: bool,
    pub discount: f64,
    pub message: String,
}

impl PromoValidation {
    pub fn accepted(discount: f64) -> Self {
        PromoValidation {
            valid: true,
            discount,
            message: format!(
                "Code promo appliqué! Réduction de {} KMF",
                crate::utils::format_kmf(discount)
            ),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        PromoValidation {
            valid: false,
            discount: 0.0,
            message: message.into(),
        }
    }
}
