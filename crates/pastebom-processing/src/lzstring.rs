//! LZ-string codec, base64 flavour.
//!
//! Output is bit-compatible with `LZString.compressToBase64` /
//! `LZString.decompressFromBase64` from the lz-string JavaScript library, which the
//! viewer uses to unpack embedded board data. Both directions work on UTF-16 code
//! units, so strings outside the Basic Multilingual Plane round-trip exactly.

use std::collections::{HashMap, HashSet};

const BASE64_ALPHABET: &[u8; 65] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";
const BITS_PER_CHAR: u32 = 6;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LzError {
    #[error("Invalid base64 character {0:?}")]
    InvalidCharacter(char),

    #[error("Compressed stream ended unexpectedly")]
    Truncated,

    #[error("Invalid dictionary reference {0}")]
    InvalidReference(u32),

    #[error("Decompressed data is not valid UTF-16")]
    InvalidUtf16,
}

struct BitWriter {
    out: String,
    val: u32,
    position: u32,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            out: String::new(),
            val: 0,
            position: 0,
        }
    }

    fn push_char(&mut self) {
        self.out
            .push(char::from(BASE64_ALPHABET[self.val as usize]));
    }

    fn write_bit(&mut self, bit: u32) {
        self.val = (self.val << 1) | bit;
        if self.position == BITS_PER_CHAR - 1 {
            self.position = 0;
            self.push_char();
            self.val = 0;
        } else {
            self.position += 1;
        }
    }

    /// Least significant bit first.
    fn write_bits(&mut self, count: u32, mut value: u32) {
        for _ in 0..count {
            self.write_bit(value & 1);
            value >>= 1;
        }
    }

    fn finish(mut self) -> String {
        loop {
            self.val <<= 1;
            if self.position == BITS_PER_CHAR - 1 {
                self.push_char();
                break;
            }
            self.position += 1;
        }

        while self.out.len() % 4 != 0 {
            self.out.push('=');
        }
        self.out
    }
}

/// Current phrase: its dictionary code, and the code unit when it is a single character.
#[derive(Clone, Copy)]
struct Phrase {
    code: u32,
    single: Option<u16>,
}

struct Compressor {
    singles: HashMap<u16, u32>,
    phrases: HashMap<(u32, u16), u32>,
    pending_literals: HashSet<u16>,
    dict_size: u32,
    num_bits: u32,
    enlarge_in: u32,
    writer: BitWriter,
}

impl Compressor {
    fn new() -> Self {
        Compressor {
            singles: HashMap::new(),
            phrases: HashMap::new(),
            pending_literals: HashSet::new(),
            dict_size: 3,
            num_bits: 2,
            enlarge_in: 2,
            writer: BitWriter::new(),
        }
    }

    fn count_down(&mut self) {
        self.enlarge_in -= 1;
        if self.enlarge_in == 0 {
            self.enlarge_in = 1 << self.num_bits;
            self.num_bits += 1;
        }
    }

    fn single_code(&mut self, unit: u16) -> u32 {
        if let Some(&code) = self.singles.get(&unit) {
            return code;
        }
        let code = self.dict_size;
        self.singles.insert(unit, code);
        self.pending_literals.insert(unit);
        self.dict_size += 1;
        code
    }

    fn emit(&mut self, phrase: Phrase) {
        match phrase.single {
            Some(unit) if self.pending_literals.remove(&unit) => {
                if unit < 256 {
                    self.writer.write_bits(self.num_bits, 0);
                    self.writer.write_bits(8, u32::from(unit));
                } else {
                    self.writer.write_bits(self.num_bits, 1);
                    self.writer.write_bits(16, u32::from(unit));
                }
                self.count_down();
            }
            _ => self.writer.write_bits(self.num_bits, phrase.code),
        }
        self.count_down();
    }

    fn compress(mut self, units: impl Iterator<Item = u16>) -> String {
        let mut current: Option<Phrase> = None;

        for unit in units {
            let single = Phrase {
                code: self.single_code(unit),
                single: Some(unit),
            };

            current = match current {
                None => Some(single),
                Some(phrase) => match self.phrases.get(&(phrase.code, unit)) {
                    Some(&code) => Some(Phrase { code, single: None }),
                    None => {
                        self.emit(phrase);
                        self.phrases.insert((phrase.code, unit), self.dict_size);
                        self.dict_size += 1;
                        Some(single)
                    }
                },
            };
        }

        if let Some(phrase) = current {
            self.emit(phrase);
        }

        self.writer.write_bits(self.num_bits, 2);
        self.writer.finish()
    }
}

/// Compress `input` to the lz-string base64 alphabet, padded to a multiple of 4.
pub fn compress_to_base64(input: &str) -> String {
    Compressor::new().compress(input.encode_utf16())
}

struct BitReader {
    values: Vec<u32>,
    val: u32,
    position: u32,
    index: usize,
}

impl BitReader {
    const RESET: u32 = 1 << (BITS_PER_CHAR - 1);

    fn new(values: Vec<u32>) -> Self {
        let val = values.first().copied().unwrap_or(0);
        BitReader {
            values,
            val,
            position: Self::RESET,
            index: 1,
        }
    }

    /// Read `count` bits, least significant first. Reads past the end yield zeros.
    fn read_bits(&mut self, count: u32) -> u32 {
        let mut bits = 0;
        for shift in 0..count {
            let bit = self.val & self.position;
            self.position >>= 1;
            if self.position == 0 {
                self.position = Self::RESET;
                self.val = self.values.get(self.index).copied().unwrap_or(0);
                self.index += 1;
            }
            if bit > 0 {
                bits |= 1 << shift;
            }
        }
        bits
    }

    fn exhausted(&self) -> bool {
        self.index > self.values.len()
    }
}

fn base64_value(c: char) -> Result<u32, LzError> {
    BASE64_ALPHABET
        .iter()
        .position(|&b| char::from(b) == c)
        .map(|p| p as u32)
        .ok_or(LzError::InvalidCharacter(c))
}

/// Inverse of [`compress_to_base64`]. An empty input decodes to an empty string.
pub fn decompress_from_base64(input: &str) -> Result<String, LzError> {
    if input.is_empty() {
        return Ok(String::new());
    }

    let values = input
        .chars()
        .map(base64_value)
        .collect::<Result<Vec<_>, _>>()?;
    let mut reader = BitReader::new(values);

    // Codes 0..=2 are control codes; their slots are never read as entries.
    let mut dictionary: Vec<Vec<u16>> = vec![Vec::new(); 3];
    let mut enlarge_in: u32 = 4;
    let mut num_bits: u32 = 3;

    let first = match reader.read_bits(2) {
        0 => reader.read_bits(8) as u16,
        1 => reader.read_bits(16) as u16,
        2 => return Ok(String::new()),
        other => return Err(LzError::InvalidReference(other)),
    };
    dictionary.push(vec![first]);
    let mut w = vec![first];
    let mut result = w.clone();

    loop {
        if reader.exhausted() {
            return Err(LzError::Truncated);
        }

        let mut code = reader.read_bits(num_bits);
        match code {
            0 | 1 => {
                let width = if code == 0 { 8 } else { 16 };
                let unit = reader.read_bits(width) as u16;
                dictionary.push(vec![unit]);
                code = (dictionary.len() - 1) as u32;
                enlarge_in -= 1;
            }
            2 => break,
            _ => {}
        }

        if enlarge_in == 0 {
            enlarge_in = 1 << num_bits;
            num_bits += 1;
        }

        let dict_size = dictionary.len() as u32;
        let entry = if code < dict_size {
            dictionary[code as usize].clone()
        } else if code == dict_size {
            let mut entry = w.clone();
            entry.push(w[0]);
            entry
        } else {
            return Err(LzError::InvalidReference(code));
        };

        result.extend_from_slice(&entry);

        let mut phrase = w;
        phrase.push(entry[0]);
        dictionary.push(phrase);
        enlarge_in -= 1;
        w = entry;

        if enlarge_in == 0 {
            enlarge_in = 1 << num_bits;
            num_bits += 1;
        }
    }

    String::from_utf16(&result).map_err(|_| LzError::InvalidUtf16)
}
