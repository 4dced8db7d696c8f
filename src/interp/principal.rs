//! Textual encoding of actor principals.
//!
//! The interpreter names the n-th actor it creates (from 1) `ID:<n>`. The textual form is the lower-case base32
//! encoding (no padding) of the big-endian CRC-32 of those bytes followed by the bytes, split into groups of five.

const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Principal of the `n`-th interpreted actor.
pub fn actor_principal(n: u64) -> String {
    encode(format!("ID:{n}").as_bytes())
}

/// Textual form of raw principal bytes.
pub fn encode(bytes: &[u8]) -> String {
    let mut data = crc32fast::hash(bytes).to_be_bytes().to_vec();
    data.extend_from_slice(bytes);
    let text = base32(&data);
    let groups: Vec<&str> = text
        .as_bytes()
        .chunks(5)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    groups.join("-")
}

fn base32(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 8 / 5 + 1);
    let mut buffer: u32 = 0;
    let mut bits = 0;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 31) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 31) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_actor_principal() {
        assert_eq!(actor_principal(1), "ys6dh-5cjiq-5dc");
    }

    #[test]
    fn principals_are_distinct() {
        assert_ne!(actor_principal(1), actor_principal(2));
    }

    #[test]
    fn base32_matches_rfc4648_lowercase() {
        assert_eq!(base32(b"foobar"), "mzxw6ytboi");
    }
}
