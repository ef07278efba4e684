//! Salted, reversible integer-to-string encoding compatible with Hashids.
//!
//! Sequential integers are scattered across the alphabet by a salt-keyed
//! shuffle, so consecutive counter values do not yield guessable neighbours.

pub const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";
const DEFAULT_SEPARATORS: &str = "cfhistuCFHISTU";
const SEPARATOR_DIV: f64 = 3.5;
const GUARD_DIV: f64 = 12.0;

/// A Hashids codec for single `u64` values.
#[derive(Debug, Clone)]
pub struct Hashids {
    salt: Vec<u8>,
    min_length: usize,
    alphabet: Vec<u8>,
    separators: Vec<u8>,
    guards: Vec<u8>,
}

impl Hashids {
    /// Creates a codec over the default 62-character alphabet.
    pub fn new(salt: impl AsRef<str>, min_length: usize) -> Self {
        Self::build(
            salt.as_ref().as_bytes(),
            min_length,
            DEFAULT_ALPHABET.as_bytes().to_vec(),
        )
    }

    fn build(salt: &[u8], min_length: usize, alphabet: Vec<u8>) -> Self {
        let mut separators: Vec<u8> = DEFAULT_SEPARATORS
            .bytes()
            .filter(|c| alphabet.contains(c))
            .collect();
        let mut alphabet: Vec<u8> = alphabet
            .into_iter()
            .filter(|c| !separators.contains(c))
            .collect();

        shuffle(&mut separators, salt);

        if separators.is_empty()
            || alphabet.len() as f64 / separators.len() as f64 > SEPARATOR_DIV
        {
            let mut separators_len = (alphabet.len() as f64 / SEPARATOR_DIV).ceil() as usize;
            if separators_len == 1 {
                separators_len = 2;
            }
            if separators_len > separators.len() {
                let diff = separators_len - separators.len();
                separators.extend(alphabet.drain(..diff));
            } else {
                separators.truncate(separators_len);
            }
        }

        shuffle(&mut alphabet, salt);

        let guard_count = (alphabet.len() as f64 / GUARD_DIV).ceil() as usize;
        let guards = if alphabet.len() < 3 {
            separators.drain(..guard_count).collect()
        } else {
            alphabet.drain(..guard_count).collect()
        };

        Self {
            salt: salt.to_vec(),
            min_length,
            alphabet,
            separators,
            guards,
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Encodes a value. The output is at least `min_length` characters.
    pub fn encode(&self, value: u64) -> String {
        let value_hash = (value % 100) as usize;
        let mut alphabet = self.alphabet.clone();

        let lottery = alphabet[value_hash % alphabet.len()];
        let mut encoded = vec![lottery];

        self.shuffle_for_lottery(&mut alphabet, lottery);
        encoded.extend(to_alphabet(value, &alphabet));

        if encoded.len() < self.min_length {
            let index = (value_hash + encoded[0] as usize) % self.guards.len();
            encoded.insert(0, self.guards[index]);

            if encoded.len() < self.min_length {
                let index = (value_hash + encoded[2] as usize) % self.guards.len();
                encoded.push(self.guards[index]);
            }
        }

        let half = alphabet.len() / 2;
        while encoded.len() < self.min_length {
            let key = alphabet.clone();
            shuffle(&mut alphabet, &key);

            let mut padded = alphabet[half..].to_vec();
            padded.extend_from_slice(&encoded);
            padded.extend_from_slice(&alphabet[..half]);
            encoded = padded;

            if encoded.len() > self.min_length {
                let start = (encoded.len() - self.min_length) / 2;
                encoded = encoded[start..start + self.min_length].to_vec();
            }
        }

        encoded.into_iter().map(char::from).collect()
    }

    /// Decodes a value produced by [`encode`](Self::encode).
    ///
    /// Returns `None` for anything that is not the canonical encoding of a
    /// single value under this salt and alphabet.
    pub fn decode(&self, encoded: &str) -> Option<u64> {
        let parts: Vec<&[u8]> = encoded
            .as_bytes()
            .split(|c| self.guards.contains(c))
            .collect();
        let body = match parts.len() {
            2 | 3 => parts[1],
            _ => parts[0],
        };

        let (&lottery, digits) = body.split_first()?;
        if digits.is_empty() || digits.iter().any(|c| self.separators.contains(c)) {
            return None;
        }

        let mut alphabet = self.alphabet.clone();
        self.shuffle_for_lottery(&mut alphabet, lottery);
        let value = from_alphabet(digits, &alphabet)?;

        (self.encode(value) == encoded).then_some(value)
    }

    fn shuffle_for_lottery(&self, alphabet: &mut [u8], lottery: u8) {
        let mut key = Vec::with_capacity(1 + self.salt.len() + alphabet.len());
        key.push(lottery);
        key.extend_from_slice(&self.salt);
        key.extend_from_slice(alphabet);
        key.truncate(alphabet.len());
        shuffle(alphabet, &key);
    }
}

/// Consistent salt-keyed shuffle.
fn shuffle(alphabet: &mut [u8], salt: &[u8]) {
    if salt.is_empty() || alphabet.is_empty() {
        return;
    }

    let mut v = 0;
    let mut p = 0;
    for i in (1..alphabet.len()).rev() {
        v %= salt.len();
        let n = salt[v] as usize;
        p += n;
        let j = (n + v + p) % i;
        alphabet.swap(i, j);
        v += 1;
    }
}

fn to_alphabet(mut value: u64, alphabet: &[u8]) -> Vec<u8> {
    let base = alphabet.len() as u64;
    let mut digits = Vec::new();
    loop {
        digits.push(alphabet[(value % base) as usize]);
        value /= base;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

fn from_alphabet(digits: &[u8], alphabet: &[u8]) -> Option<u64> {
    let base = alphabet.len() as u64;
    digits.iter().try_fold(0_u64, |acc, c| {
        let digit = alphabet.iter().position(|a| a == c)? as u64;
        acc.checked_mul(base)?.checked_add(digit)
    })
}
