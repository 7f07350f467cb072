use std::collections::HashMap;

use super::UnpackError;

const ALPHABET_36: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
const ALPHABET_62: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Decodes p.a.c.k.e.r. tokens back into symbol table indices.
///
/// Radices up to 36 use the usual `0-9a-z` positional notation. 37..=62 use a
/// prefix of the `0-9a-zA-Z` alphabet, and 95 uses every printable ASCII
/// character starting from space.
#[derive(Debug, Clone)]
pub struct Unbaser {
    base: u32,
    alphabet: Vec<char>,
    dictionary: Option<HashMap<char, u64>>,
}

impl Unbaser {
    pub fn new(base: u32) -> Result<Self, UnpackError> {
        let alphabet: Vec<char> = match base {
            2..=36 => ALPHABET_36.chars().take(base as usize).collect(),
            37..=62 => ALPHABET_62.chars().take(base as usize).collect(),
            95 => (' '..='~').collect(),
            _ => return Err(UnpackError::UnsupportedRadix(base)),
        };

        let dictionary = (base > 36).then(|| {
            alphabet
                .iter()
                .enumerate()
                .map(|(idx, ch)| (*ch, idx as u64))
                .collect()
        });

        Ok(Self {
            base,
            alphabet,
            dictionary,
        })
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    /// Positional radices read the longest run of valid leading digits, so
    /// `"1a"` is `1` in radix 10. Returns `None` when nothing decodes or the
    /// value does not fit into `usize`.
    pub fn unbase(&self, token: &str) -> Option<usize> {
        let value = match &self.dictionary {
            None => parse_prefix(token, self.base)?,
            Some(dict) => dict_convert(self.base as u64, token, dict)?,
        };

        usize::try_from(value).ok()
    }

    pub fn encode(&self, mut value: usize) -> String {
        let base = self.base as usize;
        let mut digits = vec![];

        loop {
            digits.push(self.alphabet[value % base]);
            value /= base;
            if value == 0 {
                break;
            }
        }

        digits.iter().rev().collect()
    }
}

/// Parses the leading digits of `token` in `radix` (2..=36), ignoring the rest.
pub fn parse_prefix(token: &str, radix: u32) -> Option<u64> {
    let end = token
        .char_indices()
        .find(|(_, ch)| !ch.is_digit(radix))
        .map_or(token.len(), |(idx, _)| idx);

    u64::from_str_radix(&token[..end], radix).ok()
}

fn dict_convert(base: u64, token: &str, dict: &HashMap<char, u64>) -> Option<u64> {
    token
        .chars()
        .rev()
        .enumerate()
        .try_fold(0u64, |acc, (position, ch)| {
            let digit = *dict.get(&ch)?;
            let weight = base.checked_pow(u32::try_from(position).ok()?)?;
            acc.checked_add(digit.checked_mul(weight)?)
        })
}
