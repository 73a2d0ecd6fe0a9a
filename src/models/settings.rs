use serde::Serialize;

/// 站点参数的类型化取值。存储层一律是字符串，
/// 读取时按 整数 -> 小数 -> 布尔 -> 原文 的顺序尝试解释。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl SettingValue {
    /// 按存储字符串推断类型
    ///
    /// 规则刻意保守：只有纯数字才算整数，带负号或夹杂其他字符的
    /// 一律按原文返回；"5.5.5" 这类解析不了的也按原文返回。
    pub fn coerce(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
            && let Ok(n) = raw.parse::<i64>()
        {
            return SettingValue::Int(n);
        }
        if raw.contains('.') {
            let digits: String = raw.chars().filter(|c| *c != '.').collect();
            if !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit())
                && let Ok(f) = raw.parse::<f64>()
            {
                return SettingValue::Float(f);
            }
        }
        match raw.to_ascii_lowercase().as_str() {
            "true" => return SettingValue::Bool(true),
            "false" => return SettingValue::Bool(false),
            _ => {}
        }
        SettingValue::Text(raw.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SettingValue::Int(n) => Some(*n as f64),
            SettingValue::Float(f) => Some(*f),
            SettingValue::Text(s) => s.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Int(n) => Some(*n),
            SettingValue::Float(f) => Some(*f as i64),
            SettingValue::Text(s) => s.trim().parse().ok(),
            SettingValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Int(n) => write!(f, "{n}"),
            SettingValue::Float(x) => write!(f, "{x}"),
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Text(s) => write!(f, "{s}"),
        }
    }
}
