//! Adaptive-Huffman LZ decoder for `LZH` volume entries
//!
//! The stream is the classic LZHUF layout: a 4 KiB ring buffer, 60-byte
//! maximum match, and an adaptive Huffman tree over 314 symbols (256
//! literals plus match lengths). Match positions use a fixed prefix code
//! for the upper 6 bits.

const BUF_SIZE: usize = 4096;
const LOOK_AHEAD: usize = 60;
const THRESHOLD: usize = 2;
const N_CHAR: usize = 256 - THRESHOLD + LOOK_AHEAD;
const TABLE_SIZE: usize = N_CHAR * 2 - 1;
const ROOT: usize = TABLE_SIZE - 1;
const MAX_FREQ: u32 = 0x8000;

/// Upper 6 bits of a match position, indexed by the first position byte
const D_CODE: [u8; 256] = build_d_code();

/// Number of bits encoding a match position given its first byte
const fn position_bits(first: usize) -> usize {
    match first {
        0..32 => 3,
        32..80 => 4,
        80..144 => 5,
        144..192 => 6,
        192..240 => 7,
        _ => 8,
    }
}

const fn build_d_code() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    let mut code = 0u8;
    while i < 256 {
        let group = 1usize << (8 - position_bits(i));
        let mut k = 0;
        while k < group {
            table[i + k] = code;
            k += 1;
        }
        i += group;
        code += 1;
    }
    table
}

/// Expand `input` into exactly `output_size` bytes.
///
/// Input exhaustion feeds zero bits rather than failing, so a short or
/// damaged stream produces garbage of the right length, never a panic.
pub fn decompress(input: &[u8], output_size: usize) -> Vec<u8> {
    let mut decoder = Decoder::new(input);
    let mut out = Vec::with_capacity(output_size);
    let mut text_buf = vec![0u8; BUF_SIZE + LOOK_AHEAD - 1];
    let mut r = BUF_SIZE - LOOK_AHEAD;

    while out.len() < output_size {
        let c = decoder.decode_char();
        if c < 256 {
            let byte = c as u8;
            out.push(byte);
            text_buf[r] = byte;
            r = (r + 1) & (BUF_SIZE - 1);
        } else {
            let position = decoder.decode_position();
            let start = r.wrapping_sub(position).wrapping_sub(1) & (BUF_SIZE - 1);
            let length = c - 255 + THRESHOLD;
            for k in 0..length {
                if out.len() == output_size {
                    break;
                }
                let byte = text_buf[(start + k) & (BUF_SIZE - 1)];
                out.push(byte);
                text_buf[r] = byte;
                r = (r + 1) & (BUF_SIZE - 1);
            }
        }
    }

    out
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    bit_buf: u32,
    bit_len: u32,
    freq: Vec<u32>,
    parent: Vec<usize>,
    son: Vec<usize>,
}

impl<'a> Decoder<'a> {
    fn new(input: &'a [u8]) -> Self {
        let mut freq = vec![0u32; TABLE_SIZE + 1];
        let mut parent = vec![0usize; TABLE_SIZE + N_CHAR];
        let mut son = vec![0usize; TABLE_SIZE];

        for i in 0..N_CHAR {
            freq[i] = 1;
            son[i] = i + TABLE_SIZE;
            parent[i + TABLE_SIZE] = i;
        }
        let mut i = 0;
        for j in N_CHAR..=ROOT {
            freq[j] = freq[i] + freq[i + 1];
            son[j] = i;
            parent[i] = j;
            parent[i + 1] = j;
            i += 2;
        }
        freq[TABLE_SIZE] = 0xffff;
        parent[ROOT] = 0;

        Self {
            input,
            pos: 0,
            bit_buf: 0,
            bit_len: 0,
            freq,
            parent,
            son,
        }
    }

    fn refill(&mut self) {
        while self.bit_len <= 8 {
            let byte = self.input.get(self.pos).copied().unwrap_or(0);
            self.pos += 1;
            self.bit_buf |= u32::from(byte) << (8 - self.bit_len);
            self.bit_buf &= 0xFFFF;
            self.bit_len += 8;
        }
    }

    fn get_bit(&mut self) -> usize {
        self.refill();
        let bit = (self.bit_buf >> 15) & 1;
        self.bit_buf = (self.bit_buf << 1) & 0xFFFF;
        self.bit_len -= 1;
        bit as usize
    }

    fn get_byte(&mut self) -> usize {
        self.refill();
        let byte = self.bit_buf >> 8;
        self.bit_buf = (self.bit_buf << 8) & 0xFFFF;
        self.bit_len -= 8;
        byte as usize
    }

    fn decode_char(&mut self) -> usize {
        let mut c = self.son[ROOT];
        while c < TABLE_SIZE {
            c += self.get_bit();
            c = self.son[c];
        }
        c -= TABLE_SIZE;
        self.update(c);
        c
    }

    fn decode_position(&mut self) -> usize {
        let mut i = self.get_byte();
        let upper = usize::from(D_CODE[i]) << 6;
        for _ in 0..position_bits(i) - 2 {
            i = (i << 1) + self.get_bit();
        }
        upper | (i & 0x3f)
    }

    fn update(&mut self, symbol: usize) {
        if self.freq[ROOT] == MAX_FREQ {
            self.reconstruct();
        }

        let mut c = self.parent[symbol + TABLE_SIZE];
        loop {
            self.freq[c] += 1;
            let k = self.freq[c];

            // Keep frequencies sorted by moving the bumped node up
            let mut l = c + 1;
            if k > self.freq[l] {
                while k > self.freq[l] {
                    l += 1;
                }
                l -= 1;
                self.freq.swap(c, l);

                let i = self.son[c];
                self.parent[i] = l;
                if i < TABLE_SIZE {
                    self.parent[i + 1] = l;
                }
                let j = self.son[l];
                self.son[l] = i;
                self.parent[j] = c;
                if j < TABLE_SIZE {
                    self.parent[j + 1] = c;
                }
                self.son[c] = j;
                c = l;
            }

            c = self.parent[c];
            if c == 0 {
                break;
            }
        }
    }

    /// Halve all frequencies and rebuild the tree.
    fn reconstruct(&mut self) {
        let mut j = 0;
        for i in 0..TABLE_SIZE {
            if self.son[i] >= TABLE_SIZE {
                self.freq[j] = self.freq[i].div_ceil(2);
                self.son[j] = self.son[i];
                j += 1;
            }
        }

        let mut i = 0;
        for j in N_CHAR..TABLE_SIZE {
            let f = self.freq[i] + self.freq[i + 1];
            let mut k = j;
            while k > 0 && f < self.freq[k - 1] {
                k -= 1;
            }
            self.freq.copy_within(k..j, k + 1);
            self.son.copy_within(k..j, k + 1);
            self.freq[k] = f;
            self.son[k] = i;
            i += 2;
        }

        for i in 0..TABLE_SIZE {
            let k = self.son[i];
            self.parent[k] = i;
            if k < TABLE_SIZE {
                self.parent[k + 1] = i;
            }
        }
    }
}
