//! Tolerant UTF-8 decoding for drawn text.
//!
//! Text handed to the painter may come from anywhere, so decoding never fails:
//! orphaned continuation bytes are skipped, and the run ends at the first NUL,
//! at an invalid leading byte, or at a sequence cut short by the end of input.

/// Iterator over the Unicode codepoints of a byte string.
#[derive(Clone, Debug)]
pub struct Codepoints<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Codepoints<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            done: false,
        }
    }

    fn finish(&mut self) -> Option<u32> {
        self.done = true;
        None
    }
}

/// Decode `text` into codepoints with the tolerant rules of [`Codepoints`].
pub fn codepoints<T: AsRef<[u8]> + ?Sized>(text: &T) -> Codepoints<'_> {
    Codepoints::new(text.as_ref())
}

impl Iterator for Codepoints<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.done {
            return None;
        }

        let mut id: u32 = 0;
        let mut remaining = 0u8;

        while let Some(&c) = self.bytes.get(self.pos) {
            self.pos += 1;

            if c == 0 {
                break;
            }

            if c >> 7 == 0 {
                return Some(c as u32);
            } else if c >> 5 == 0b110 {
                id = ((c & 0b1_1111) as u32) << 6;
                remaining = 1;
            } else if c >> 4 == 0b1110 {
                id = ((c & 0b1111) as u32) << 6;
                remaining = 2;
            } else if c >> 3 == 0b1_1110 {
                id = ((c & 0b111) as u32) << 6;
                remaining = 3;
            } else if c >> 6 == 0b10 {
                if remaining == 0 {
                    continue;
                }

                id |= (c & 0b11_1111) as u32;
                remaining -= 1;
                if remaining > 0 {
                    id <<= 6;
                } else if id == 0 {
                    break;
                } else {
                    return Some(id);
                }
            } else if remaining == 0 {
                break;
            }
        }

        self.finish()
    }
}
