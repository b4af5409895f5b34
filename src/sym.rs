use std::{fmt, ops::Range};

use futuresdr::num_complex::Complex;

use crate::bits::BitGroups;

/// One complex sample as the DAC takes it: 16-bit I, 16-bit Q.
pub type Iq = Complex<i16>;

/// Size of one [`Iq`] on the wire.
pub const BYTES_PER_SYMBOL: usize = 4;

pub const QPSK_POS: i16 = 23152;
pub const QPSK_NEG: i16 = -23152;

pub const SXTN_QAM_POS_ONE: i16 = 7717;
pub const SXTN_QAM_NEG_ONE: i16 = -7717;
pub const SXTN_QAM_POS_THREE: i16 = 23151;
pub const SXTN_QAM_NEG_THREE: i16 = -23151;

/// The byte used to demonstrate how bits map onto symbols.
pub const EXAMPLE_BYTE: u8 = 0b0001_1011;

const QPSK: [Iq; 4] = [
    Complex::new(QPSK_POS, QPSK_POS),
    Complex::new(QPSK_POS, QPSK_NEG),
    Complex::new(QPSK_NEG, QPSK_POS),
    Complex::new(QPSK_NEG, QPSK_NEG),
];

// Constellation layout, bit-group under each point:
//
//   (-3, 3)  (-1, 3)  (1, 3)   (3, 3)
//    0000     0001     0011     0010
//   (-3, 1)  (-1, 1)  (1, 1)   (3, 1)
//    0100     0101     0111     0110
//   (-3,-1)  (-1,-1)  (1,-1)   (3,-1)
//    1100     1101     1111     1110
//   (-3,-3)  (-1,-3)  (1,-3)   (3,-3)
//    1000     1001     1011     1010
const SXTN_QAM: [Iq; 16] = [
    Complex::new(SXTN_QAM_NEG_THREE, SXTN_QAM_POS_THREE),
    Complex::new(SXTN_QAM_NEG_ONE, SXTN_QAM_POS_THREE),
    Complex::new(SXTN_QAM_POS_THREE, SXTN_QAM_POS_THREE),
    Complex::new(SXTN_QAM_POS_ONE, SXTN_QAM_POS_THREE),
    Complex::new(SXTN_QAM_NEG_THREE, SXTN_QAM_POS_ONE),
    Complex::new(SXTN_QAM_NEG_ONE, SXTN_QAM_POS_ONE),
    Complex::new(SXTN_QAM_POS_THREE, SXTN_QAM_POS_ONE),
    Complex::new(SXTN_QAM_POS_ONE, SXTN_QAM_POS_ONE),
    Complex::new(SXTN_QAM_NEG_THREE, SXTN_QAM_NEG_THREE),
    Complex::new(SXTN_QAM_NEG_ONE, SXTN_QAM_NEG_THREE),
    Complex::new(SXTN_QAM_POS_THREE, SXTN_QAM_NEG_THREE),
    Complex::new(SXTN_QAM_POS_ONE, SXTN_QAM_NEG_THREE),
    Complex::new(SXTN_QAM_NEG_THREE, SXTN_QAM_NEG_ONE),
    Complex::new(SXTN_QAM_NEG_ONE, SXTN_QAM_NEG_ONE),
    Complex::new(SXTN_QAM_POS_THREE, SXTN_QAM_NEG_ONE),
    Complex::new(SXTN_QAM_POS_ONE, SXTN_QAM_NEG_ONE),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationScheme {
    Qpsk,
    SixteenQam,
}

impl ModulationScheme {
    pub const fn bits_per_symbol(self) -> u32 {
        match self {
            ModulationScheme::Qpsk => 2,
            ModulationScheme::SixteenQam => 4,
        }
    }

    pub const fn groups_per_byte(self) -> usize {
        8 / self.bits_per_symbol() as usize
    }

    /// Constellation points indexed by bit-group.
    pub fn table(self) -> &'static [Iq] {
        match self {
            ModulationScheme::Qpsk => &QPSK,
            ModulationScheme::SixteenQam => &SXTN_QAM,
        }
    }

    /// Maps a bit-group to its constellation point.
    ///
    /// Panics if `group` does not fit in [`Self::bits_per_symbol`] bits.
    pub fn lookup(self, group: u8) -> Iq {
        let table = self.table();

        assert!(
            (group as usize) < table.len(),
            "bit-group {group:#x} out of range for {self}"
        );

        table[group as usize]
    }

    /// Symbol used to pad a frame once the payload runs out.
    pub fn zero_symbol(self) -> Iq {
        self.lookup(0)
    }

    /// Every bit-group of the scheme in ascending order.
    pub fn bit_groups(self) -> Range<u8> {
        0..self.table().len() as u8
    }

    pub fn format_group(self, group: u8) -> String {
        format!("{:0w$b}", group, w = self.bits_per_symbol() as usize)
    }

    /// Bit-groups of [`EXAMPLE_BYTE`] paired with the symbols they map to.
    pub fn constellation_example(self) -> Vec<(u8, Iq)> {
        BitGroups::new(&[EXAMPLE_BYTE], self.bits_per_symbol())
            .map(|g| (g, self.lookup(g)))
            .collect()
    }
}

impl fmt::Display for ModulationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModulationScheme::Qpsk => write!(f, "QPSK"),
            ModulationScheme::SixteenQam => write!(f, "16QAM"),
        }
    }
}

#[cfg(test)]
mod tests {
    use futuresdr::num_complex::Complex;

    use super::*;

    const SCHEMES: [ModulationScheme; 2] = [ModulationScheme::Qpsk, ModulationScheme::SixteenQam];

    #[test]
    fn table_sizes() {
        assert_eq!(ModulationScheme::Qpsk.table().len(), 4);
        assert_eq!(ModulationScheme::SixteenQam.table().len(), 16);

        for s in SCHEMES {
            assert_eq!(s.table().len(), 1 << s.bits_per_symbol());
        }
    }

    #[test]
    fn qpsk_table_layout() {
        let expected = [(23152, 23152), (23152, -23152), (-23152, 23152), (-23152, -23152)];

        for (group, (i, q)) in expected.into_iter().enumerate() {
            assert_eq!(
                ModulationScheme::Qpsk.lookup(group as u8),
                Complex::new(i, q),
                "group {group:02b}"
            );
        }
    }

    #[test]
    fn sxtn_qam_table_layout() {
        const ONE: i16 = 7717;
        const THREE: i16 = 23151;

        let expected = [
            (-THREE, THREE),
            (-ONE, THREE),
            (THREE, THREE),
            (ONE, THREE),
            (-THREE, ONE),
            (-ONE, ONE),
            (THREE, ONE),
            (ONE, ONE),
            (-THREE, -THREE),
            (-ONE, -THREE),
            (THREE, -THREE),
            (ONE, -THREE),
            (-THREE, -ONE),
            (-ONE, -ONE),
            (THREE, -ONE),
            (ONE, -ONE),
        ];

        for (group, (i, q)) in expected.into_iter().enumerate() {
            assert_eq!(
                ModulationScheme::SixteenQam.lookup(group as u8),
                Complex::new(i, q),
                "group {group:04b}"
            );
        }
    }

    #[test]
    fn qpsk_example_byte() {
        let syms: Vec<_> = ModulationScheme::Qpsk
            .constellation_example()
            .into_iter()
            .map(|(_, s)| s)
            .collect();

        assert_eq!(
            syms,
            vec![
                Complex::new(QPSK_POS, QPSK_POS),
                Complex::new(QPSK_POS, QPSK_NEG),
                Complex::new(QPSK_NEG, QPSK_POS),
                Complex::new(QPSK_NEG, QPSK_NEG),
            ]
        );
    }

    #[test]
    fn sxtn_qam_example_byte() {
        let ex = ModulationScheme::SixteenQam.constellation_example();

        assert_eq!(
            ex,
            vec![
                (0b0001, Complex::new(SXTN_QAM_NEG_ONE, SXTN_QAM_POS_THREE)),
                (0b1011, Complex::new(SXTN_QAM_POS_ONE, SXTN_QAM_NEG_THREE)),
            ]
        );
    }

    #[test]
    fn sxtn_qam_1100_uses_its_own_q() {
        assert_eq!(
            ModulationScheme::SixteenQam.lookup(0b1100),
            Complex::new(SXTN_QAM_NEG_THREE, SXTN_QAM_NEG_ONE)
        );
    }

    #[test]
    fn sxtn_qam_points_unique() {
        let t = ModulationScheme::SixteenQam.table();

        for (i, a) in t.iter().enumerate() {
            for b in &t[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn lookup_is_pure() {
        for s in SCHEMES {
            for g in s.bit_groups() {
                assert_eq!(s.lookup(g), s.lookup(g));
            }
        }
    }

    #[test]
    #[should_panic]
    fn lookup_out_of_range() {
        ModulationScheme::Qpsk.lookup(0b100);
    }

    #[test]
    fn group_formatting() {
        assert_eq!(ModulationScheme::Qpsk.format_group(1), "01");
        assert_eq!(ModulationScheme::SixteenQam.format_group(0b0011), "0011");
    }
}
