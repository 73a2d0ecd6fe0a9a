use rand::Rng;
use uuid::Uuid;

/// 生成邮箱验证 / 密码重置用的随机令牌（48 位字母数字）
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    (0..48)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

/// 生成提现单号，形如 WR20250818A1B2C3D4
pub fn generate_withdrawal_request_id(at: chrono::DateTime<chrono::Utc>) -> String {
    let uuid_part = Uuid::new_v4().simple().to_string();
    format!(
        "WR{}{}",
        at.format("%Y%m%d"),
        uuid_part[..8].to_uppercase()
    )
}
