const DNA_BITMASK_A: u8 = 1;
const DNA_BITMASK_C: u8 = 2;
const DNA_BITMASK_G: u8 = 4;
const DNA_BITMASK_T: u8 = 8;
const DNA_BITMASK_N: u8 = DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T;

/// A bitmasked IUPAC code for DNA bases, eg DNA_BITMASK_A|DNA_BITMASK_C
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IupacCode(u8);

impl IupacCode {
    pub fn new(bitmask: u8) -> Self {
        Self(bitmask & DNA_BITMASK_N)
    }

    #[inline(always)]
    pub fn from_letter(letter: u8) -> Self {
        match letter.to_ascii_uppercase() {
            b'A' => Self(DNA_BITMASK_A),
            b'C' => Self(DNA_BITMASK_C),
            b'G' => Self(DNA_BITMASK_G),
            b'T' | b'U' => Self(DNA_BITMASK_T),
            b'W' => Self(DNA_BITMASK_A | DNA_BITMASK_T),
            b'S' => Self(DNA_BITMASK_C | DNA_BITMASK_G),
            b'M' => Self(DNA_BITMASK_A | DNA_BITMASK_C),
            b'K' => Self(DNA_BITMASK_G | DNA_BITMASK_T),
            b'R' => Self(DNA_BITMASK_A | DNA_BITMASK_G),
            b'Y' => Self(DNA_BITMASK_C | DNA_BITMASK_T),
            b'B' => Self(DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T),
            b'D' => Self(DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T),
            b'H' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T),
            b'V' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G),
            b'N' => Self(DNA_BITMASK_N),
            _ => Self(0),
        }
    }

    pub fn to_letter(self) -> u8 {
        match self.0 {
            DNA_BITMASK_A => b'A',
            DNA_BITMASK_C => b'C',
            DNA_BITMASK_G => b'G',
            DNA_BITMASK_T => b'T',
            0b1001 => b'W',
            0b0110 => b'S',
            0b0011 => b'M',
            0b1100 => b'K',
            0b0101 => b'R',
            0b1010 => b'Y',
            0b1110 => b'B',
            0b1101 => b'D',
            0b1011 => b'H',
            0b0111 => b'V',
            DNA_BITMASK_N => b'N',
            _ => b'-',
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// A single concrete base, as opposed to an ambiguity code.
    #[inline(always)]
    pub fn is_concrete(&self) -> bool {
        self.0.count_ones() == 1
    }

    #[inline(always)]
    pub fn subset(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Whether a recognition-site letter accepts a sequence letter.
    ///
    /// Only concrete sequence bases can satisfy a site; an `N` in the
    /// sequence is unknown and never matches.
    #[inline(always)]
    pub fn site_matches(site_letter: u8, base: u8) -> bool {
        let base = Self::from_letter(base);
        base.is_concrete() && !Self::from_letter(site_letter).subset(base).is_empty()
    }

    pub fn complement(self) -> Self {
        let mut ret = 0;
        if self.0 & DNA_BITMASK_A != 0 {
            ret |= DNA_BITMASK_T;
        }
        if self.0 & DNA_BITMASK_C != 0 {
            ret |= DNA_BITMASK_G;
        }
        if self.0 & DNA_BITMASK_G != 0 {
            ret |= DNA_BITMASK_C;
        }
        if self.0 & DNA_BITMASK_T != 0 {
            ret |= DNA_BITMASK_A;
        }
        Self(ret)
    }

    #[inline(always)]
    pub fn is_valid_letter(letter: u8) -> bool {
        !Self::from_letter(letter).is_empty()
    }

    /// Reverse complement of an IUPAC string; ambiguity codes map onto their
    /// complementary codes (R <-> Y, B <-> V, ...).
    pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
        seq.iter()
            .rev()
            .map(|c| Self::from_letter(*c).complement().to_letter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base2iupac() {
        assert!(!IupacCode::from_letter(b'V')
            .subset(IupacCode::from_letter(b'G'))
            .is_empty());
        assert!(IupacCode::from_letter(b'H')
            .subset(IupacCode::from_letter(b'G'))
            .is_empty());
        assert_eq!(IupacCode::from_letter(b'u'), IupacCode::new(DNA_BITMASK_T));
        assert_eq!(IupacCode::from_letter(b'X'), IupacCode::new(0));
    }

    #[test]
    fn test_letter_round_trip() {
        for letter in b"ACGTWSMKRYBDHVN" {
            assert_eq!(IupacCode::from_letter(*letter).to_letter(), *letter);
        }
    }

    #[test]
    fn test_site_matches() {
        assert!(IupacCode::site_matches(b'W', b'a'));
        assert!(IupacCode::site_matches(b'W', b'T'));
        assert!(!IupacCode::site_matches(b'W', b'G'));
        assert!(IupacCode::site_matches(b'N', b'c'));
        assert!(!IupacCode::site_matches(b'N', b'N'));
        assert!(!IupacCode::site_matches(b'A', b'R'));
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(IupacCode::reverse_complement(b"GAATTC"), b"GAATTC".to_vec());
        assert_eq!(IupacCode::reverse_complement(b"GGTCTC"), b"GAGACC".to_vec());
        assert_eq!(IupacCode::reverse_complement(b"CCWWGG"), b"CCWWGG".to_vec());
        assert_eq!(IupacCode::reverse_complement(b"ACRYN"), b"NRYGT".to_vec());
    }

    #[test]
    fn test_valid_letters() {
        assert!(IupacCode::is_valid_letter(b'n'));
        assert!(IupacCode::is_valid_letter(b'U'));
        assert!(!IupacCode::is_valid_letter(b'X'));
        assert!(!IupacCode::is_valid_letter(b'-'));
    }
}
