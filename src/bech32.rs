// src/bech32.rs

//! Bech32 codec for the textual address form `<prefix>1<data><checksum>`.
//!
//! The data part is always the 34-byte address payload minus its version
//! word: the 32-byte public key regrouped into 52 five-bit symbols, followed
//! by a six-symbol checksum. Valid strings are 62 characters for three-letter
//! prefixes and 66 for the `genesis` sentinel.

use crate::address::InvalidAddress;

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATOR: [u32; 5] = [
    0x3b6a_57b2,
    0x2650_8e6d,
    0x1ea1_19fa,
    0x3d42_33dd,
    0x2a14_62b3,
];

const DATA_SYMBOLS: usize = 52;
const CHECKSUM_SYMBOLS: usize = 6;

/// Encode a prefix and public key into the textual address form. The prefix
/// is written as given; [`decode`] is the validating direction.
pub fn encode(prefix: &str, key: &[u8; 32]) -> String {
    let data = convert8to5(key);
    let checksum = create_checksum(prefix, &data);

    let mut s = String::with_capacity(prefix.len() + 1 + DATA_SYMBOLS + CHECKSUM_SYMBOLS);
    s.push_str(prefix);
    s.push('1');
    for &v in data.iter().chain(checksum.iter()) {
        s.push(char::from(CHARSET[usize::from(v)]));
    }

    s
}

/// Decode a textual address into its prefix and public key.
pub fn decode(input: &str) -> Result<(String, [u8; 32]), InvalidAddress> {
    if input.len() != 62 && input.len() != 66 {
        return Err(InvalidAddress);
    }

    let bech = input.to_lowercase();

    // The data part has a fixed width, so the separator position is implied
    // by the total length.
    let sep = bech.rfind('1').ok_or(InvalidAddress)?;
    if sep != bech.len() - (DATA_SYMBOLS + CHECKSUM_SYMBOLS + 1) {
        return Err(InvalidAddress);
    }

    let prefix = &bech[..sep];
    if !prefix_is_wellformed(prefix) {
        return Err(InvalidAddress);
    }

    let mut symbols = Vec::with_capacity(DATA_SYMBOLS + CHECKSUM_SYMBOLS);
    for &b in &bech.as_bytes()[sep + 1..] {
        symbols.push(charset_index(b).ok_or(InvalidAddress)?);
    }

    let key = convert5to8(&symbols[..DATA_SYMBOLS])?;

    if !verify_checksum(prefix, &symbols) {
        return Err(InvalidAddress);
    }

    Ok((prefix.to_string(), key))
}

fn prefix_is_wellformed(prefix: &str) -> bool {
    prefix == "genesis"
        || (prefix.len() == 3 && prefix.bytes().all(|b| b.is_ascii_lowercase()))
}

fn charset_index(c: u8) -> Option<u8> {
    CHARSET.iter().position(|&x| x == c).map(|i| i as u8)
}

fn polymod(values: impl IntoIterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;

    for v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(v);

        for (i, g) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }

    chk
}

fn prefix_expand(prefix: &str) -> Vec<u8> {
    let bytes = prefix.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1 + DATA_SYMBOLS + CHECKSUM_SYMBOLS);

    out.extend(bytes.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 31));

    out
}

fn create_checksum(prefix: &str, data: &[u8]) -> [u8; CHECKSUM_SYMBOLS] {
    let mut values = prefix_expand(prefix);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; CHECKSUM_SYMBOLS]);

    let p = polymod(values) ^ 1;

    let mut checksum = [0u8; CHECKSUM_SYMBOLS];
    for (i, c) in checksum.iter_mut().enumerate() {
        *c = ((p >> (5 * (5 - i))) & 31) as u8;
    }

    checksum
}

fn verify_checksum(prefix: &str, data_with_checksum: &[u8]) -> bool {
    let mut values = prefix_expand(prefix);
    values.extend_from_slice(data_with_checksum);

    polymod(values) == 1
}

fn convert8to5(data: &[u8; 32]) -> [u8; DATA_SYMBOLS] {
    let mut out = [0u8; DATA_SYMBOLS];
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut n = 0;

    for &b in data {
        acc = (acc << 8) | u32::from(b);
        bits += 8;

        while bits >= 5 {
            bits -= 5;
            out[n] = ((acc >> bits) & 31) as u8;
            n += 1;
        }
    }

    if bits > 0 {
        out[n] = ((acc << (5 - bits)) & 31) as u8;
    }

    out
}

fn convert5to8(symbols: &[u8]) -> Result<[u8; 32], InvalidAddress> {
    let mut out = [0u8; 32];
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut n = 0;

    for &s in symbols {
        acc = (acc << 5) | u32::from(s);
        bits += 5;

        while bits >= 8 {
            bits -= 8;
            if n == out.len() {
                return Err(InvalidAddress);
            }
            out[n] = (acc >> bits) as u8;
            n += 1;
        }
    }

    // 52 symbols carry 260 bits; the trailing 4 bits are padding and must be
    // zero.
    if n != out.len() || bits >= 5 || (acc << (8 - bits)) & 0xff != 0 {
        return Err(InvalidAddress);
    }

    Ok(out)
}
