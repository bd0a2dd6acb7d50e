use rand::Rng;

/// 邀请码字符集：去掉了易混淆的 0/O、1/I
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// 生成指定长度的随机邀请码
pub fn generate_random_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_length() {
        assert_eq!(generate_random_code(6).len(), 6);
        assert_eq!(generate_random_code(8).len(), 8);
    }

    #[test]
    fn test_code_alphabet() {
        let code = generate_random_code(64);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        // 易混淆字符不会出现
        assert!(!code.contains(['0', 'O', '1', 'I']));
    }

    #[test]
    fn test_codes_are_random() {
        let a = generate_random_code(16);
        let b = generate_random_code(16);
        assert_ne!(a, b);
    }
}
