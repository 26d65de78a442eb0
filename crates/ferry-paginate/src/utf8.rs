/// Incremental UTF-8 decoder for chunk boundaries that split characters.
///
/// Invalid sequences decode to U+FFFD. An incomplete trailing sequence is
/// held until the next chunk, or flushed lossily by [`Utf8Decoder::finish`].
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut decoded = String::new();
        let consumed = {
            let mut input = self.pending.as_slice();
            loop {
                match std::str::from_utf8(input) {
                    Ok(valid) => {
                        decoded.push_str(valid);
                        input = &[];
                        break;
                    }
                    Err(error) => {
                        let valid_up_to = error.valid_up_to();
                        decoded.push_str(&String::from_utf8_lossy(&input[..valid_up_to]));
                        match error.error_len() {
                            Some(invalid_len) => {
                                decoded.push(char::REPLACEMENT_CHARACTER);
                                input = &input[valid_up_to + invalid_len..];
                            }
                            None => {
                                input = &input[valid_up_to..];
                                break;
                            }
                        }
                    }
                }
            }
            self.pending.len() - input.len()
        };
        self.pending.drain(..consumed);
        decoded
    }

    pub(crate) fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::Utf8Decoder;

    #[test]
    fn unit_decoder_reassembles_split_characters() {
        let bytes = "héllo ✓".as_bytes();
        let mut decoder = Utf8Decoder::default();
        let mut output = String::new();
        for byte in bytes {
            output.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        output.push_str(&decoder.finish());
        assert_eq!(output, "héllo ✓");
    }

    #[test]
    fn regression_decoder_replaces_invalid_and_truncated_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"ok\xffgo"), "ok\u{FFFD}go");
        assert_eq!(decoder.decode(&[0xe2, 0x9c]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
