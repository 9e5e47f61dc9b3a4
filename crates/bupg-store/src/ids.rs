//! Record id generation.
//!
//! Ids look like `<prefix>-<unix millis in base 36>-<5 random base-36 chars>`,
//! e.g. `pubg-lx3k9z1a-4fq0b`.

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 5;

pub const CHAT_PREFIX: &str = "chat";
pub const MESSAGE_PREFIX: &str = "msg";
pub const PRODUCT_PREFIX: &str = "product";

/// Generate a fresh id with the given prefix.
pub fn generate(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{}-{suffix}", to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
