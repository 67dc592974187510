use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Decodes a response body to text for link extraction.
///
/// Order: BOM, then the Content-Type charset, then chardetng's guess. Malformed
/// sequences are replaced rather than rejected; only the links matter here.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_is_honoured() {
        let latin1 = [0x63, 0x61, 0x66, 0xE9];
        assert_eq!(decode_body(&latin1, Some("text/html; Charset=\"ISO-8859-1\"")), "café");
    }

    #[test]
    fn bom_wins_over_header() {
        let bytes = [0xEF, 0xBB, 0xBF, b'o', b'k'];
        assert_eq!(decode_body(&bytes, Some("text/html; charset=windows-1252")), "ok");
    }
}
