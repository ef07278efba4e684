use crate::Generator;
use async_trait::async_trait;
use rand::Rng;
use snip_core::{GeneratorError, ShortCode};

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

pub const DEFAULT_CODE_LENGTH: usize = 5;

/// Draws fixed-length codes uniformly from the 62-character alphanumeric
/// alphabet.
///
/// Randomness comes from the thread-local CSPRNG, which is periodically
/// reseeded from the operating system. With the default length of 5 there
/// are 62^5 (about 9.16e8) codes, so collisions become likely as the table
/// grows and callers must check storage.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    fn draw(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect()
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

#[async_trait]
impl Generator for RandomGenerator {
    async fn generate(&self) -> Result<ShortCode, GeneratorError> {
        Ok(ShortCode::new_unchecked(self.draw()))
    }

    fn is_collision_free(&self) -> bool {
        false
    }
}
