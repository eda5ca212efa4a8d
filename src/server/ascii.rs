//! Line-ending translation for ASCII mode transfers.
//!
//! Outbound, every host line separator becomes CRLF; inbound, every CRLF
//! becomes the host separator. The two transforms are inverses, so an ASCII
//! round trip between identical hosts reproduces a file byte for byte.
//! Binary mode bypasses this module entirely.

/// Outbound adapter: insert a CR before every LF. Stateless, since it looks
/// at single bytes only.
pub fn to_crlf(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 8);
    for &b in input {
        if b == b'\n' {
            out.push(b'\r');
        }
        out.push(b);
    }
    out
}

/// Inbound adapter: collapse CRLF pairs to LF. A CR at the end of a chunk is
/// held back until the next chunk (or [`finish`](FromCrlf::finish)) decides
/// whether it starts a pair.
#[derive(Debug, Default)]
pub struct FromCrlf {
    pending_cr: bool,
}

impl FromCrlf {
    pub fn new() -> Self {
        FromCrlf::default()
    }

    pub fn transform(&mut self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(input.len() + 1);
        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    out.push(b'\n');
                    continue;
                }
                out.push(b'\r');
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
        out
    }

    /// Flushes a CR the stream ended on.
    pub fn finish(&mut self) -> Option<u8> {
        if std::mem::take(&mut self.pending_cr) {
            Some(b'\r')
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode_all(chunks: &[&[u8]]) -> Vec<u8> {
        let mut dec = FromCrlf::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(dec.transform(chunk));
        }
        out.extend(dec.finish());
        out
    }

    #[test]
    fn outbound_inserts_cr_before_every_lf() {
        assert_eq!(to_crlf(b"a\nb\n"), b"a\r\nb\r\n");
        assert_eq!(to_crlf(b"a\r\nb"), b"a\r\r\nb");
        assert_eq!(to_crlf(b"no newline"), b"no newline");
    }

    #[test]
    fn inbound_collapses_crlf_pairs() {
        assert_eq!(decode_all(&[b"a\r\nb\r\n"]), b"a\nb\n");
        assert_eq!(decode_all(&[b"lone\rcr"]), b"lone\rcr");
    }

    #[test]
    fn cr_straddling_a_chunk_boundary() {
        assert_eq!(decode_all(&[b"a\r", b"\nb"]), b"a\nb");
        assert_eq!(decode_all(&[b"a\r", b"x"]), b"a\rx");
        assert_eq!(decode_all(&[b"ends on\r"]), b"ends on\r");
    }

    #[test]
    fn transforms_are_inverses() {
        for original in [
            b"plain unix\nlines\n".to_vec(),
            b"already\r\ncrlf\r\n".to_vec(),
            b"mixed\rbag\r\r\n\n".to_vec(),
            Vec::new(),
        ] {
            let wire = to_crlf(&original);
            assert_eq!(decode_all(&[&wire]), original);
        }
    }
}
