use bitstream_io::{BigEndian, BitRead, BitReader};

/// Splits bytes into fixed-width bit-groups, most significant group first.
///
/// A byte `0b00_01_10_11` read at width 2 yields `00, 01, 10, 11`; at width 4
/// it yields `0001, 1011`. Groups never straddle a byte.
pub struct BitGroups<'a> {
    bytes: &'a [u8],
    width: u32,
    reader: BitReader<&'a [u8], BigEndian>,
    remaining: usize,
}

impl<'a> BitGroups<'a> {
    pub fn new(bytes: &'a [u8], width: u32) -> Self {
        assert!(
            width == 2 || width == 4,
            "unsupported bit-group width {width}"
        );

        Self {
            bytes,
            width,
            reader: BitReader::endian(bytes, BigEndian),
            remaining: bytes.len() * (8 / width as usize),
        }
    }

    /// Rewinds to the first group of the first byte.
    pub fn restart(&mut self) {
        *self = Self::new(self.bytes, self.width);
    }
}

impl Iterator for BitGroups<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }

        let group = self.reader.read::<u8>(self.width).ok()?;
        self.remaining -= 1;

        Some(group)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BitGroups<'_> {}

#[cfg(test)]
mod tests {
    use super::BitGroups;

    fn reassemble(groups: impl Iterator<Item = u8>, width: u32) -> u8 {
        groups.fold(0u8, |acc, g| (acc << width) | g)
    }

    #[test]
    fn width_2_round_trip() {
        for b in 0..=u8::MAX {
            let byte = [b];
            let groups = BitGroups::new(&byte, 2);
            assert_eq!(groups.len(), 4);
            assert_eq!(reassemble(groups, 2), b);
        }
    }

    #[test]
    fn width_4_round_trip() {
        for b in 0..=u8::MAX {
            let byte = [b];
            let groups = BitGroups::new(&byte, 4);
            assert_eq!(groups.len(), 2);
            assert_eq!(reassemble(groups, 4), b);
        }
    }

    #[test]
    fn msb_first_across_bytes() {
        let bytes = [0x33, 0xf7];

        assert_eq!(
            BitGroups::new(&bytes, 2).collect::<Vec<_>>(),
            vec![0, 3, 0, 3, 3, 3, 1, 3]
        );
        assert_eq!(
            BitGroups::new(&bytes, 4).collect::<Vec<_>>(),
            vec![0x3, 0x3, 0xf, 0x7]
        );
    }

    #[test]
    fn matches_shift_formula() {
        let bytes: Vec<u8> = (0..64u8).map(|x| x.wrapping_mul(37) ^ 0x5a).collect();

        for width in [2u32, 4] {
            let per_byte = 8 / width as usize;
            let mask = (1u8 << width) - 1;
            let expected: Vec<u8> = bytes
                .iter()
                .flat_map(|b| {
                    (0..per_byte).map(move |g| (b >> ((per_byte - 1 - g) * width as usize)) & mask)
                })
                .collect();

            assert_eq!(BitGroups::new(&bytes, width).collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn exhausts_cleanly() {
        let mut groups = BitGroups::new(&[0xff], 4);

        assert_eq!(groups.next(), Some(0xf));
        assert_eq!(groups.next(), Some(0xf));
        assert_eq!(groups.next(), None);
        assert_eq!(groups.next(), None);

        assert_eq!(BitGroups::new(&[], 2).next(), None);
    }

    #[test]
    fn restart_rewinds() {
        let mut groups = BitGroups::new(&[0b0001_1011], 2);

        assert_eq!(groups.next(), Some(0b00));
        assert_eq!(groups.next(), Some(0b01));

        groups.restart();

        assert_eq!(groups.collect::<Vec<_>>(), vec![0b00, 0b01, 0b10, 0b11]);
    }
}
