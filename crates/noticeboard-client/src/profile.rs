use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `User_` followed by four random base-36 characters.
pub fn default_author_name() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..4)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("User_{}", suffix)
}
