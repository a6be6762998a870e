/// Incremental UTF-8 decoder that drops malformed bytes.
///
/// A sequence cut off at the end of one chunk is held back and completed by
/// the next, so the decoded text does not depend on where chunks split.
#[derive(Debug, Default)]
pub struct LossyDecoder {
    pending: Vec<u8>,
}

impl LossyDecoder {
    /// Decode `bytes` and append the valid text to `out`.
    pub fn decode(&mut self, bytes: &[u8], out: &mut String) {
        let joined;
        let mut rest: &[u8] = if self.pending.is_empty() {
            bytes
        } else {
            joined = [std::mem::take(&mut self.pending).as_slice(), bytes].concat();
            &joined
        };

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(invalid) => rest = &after[invalid..],
                        None => {
                            self.pending = after.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Bytes of an unfinished sequence still held back. They are dropped if
    /// the stream ends here.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
