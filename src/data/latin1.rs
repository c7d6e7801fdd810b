//! ISO-8859-1 text codec.
//!
//! Every byte maps to the code point of the same value, so decoding never
//! fails. Encoding replaces characters above U+00FF with `?`.

pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_umlauts() {
        let bytes = b"Geb\xe4udeh\xf6he;Gescho\xdfe";
        assert_eq!(decode(bytes), "Gebäudehöhe;Geschoße");
    }

    #[test]
    fn encodes_back_to_single_bytes() {
        assert_eq!(encode("Zähler"), b"Z\xe4hler".to_vec());
        assert_eq!(encode("€"), b"?".to_vec());
    }
}
