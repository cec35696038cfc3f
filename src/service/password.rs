//! Temporary password generation

use rand::seq::SliceRandom;
use rand::Rng;

pub const PASSWORD_LENGTH: usize = 12;

// Look-alike characters (0 O 1 l I) are left out.
const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%*?";

/// Generate a temporary password with every character class represented
pub fn generate_password() -> String {
    generate_password_with(&mut rand::thread_rng())
}

pub fn generate_password_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let classes = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS];
    let alphabet: Vec<u8> = classes.concat();

    let mut chars: Vec<u8> = classes
        .iter()
        .filter_map(|class| class.choose(rng).copied())
        .collect();

    while chars.len() < PASSWORD_LENGTH {
        if let Some(c) = alphabet.choose(rng) {
            chars.push(*c);
        }
    }

    chars.shuffle(rng);
    chars.into_iter().map(char::from).collect()
}
