// src/common/address.rs

use super::error::GenerateError;
use core::fmt;

/// Address characters in bus order: `0-9`, then `a-z`, then `A-Z`.
const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Sdi12Addr(char);

impl Sdi12Addr {
    pub const DEFAULT_ADDRESS: Sdi12Addr = Sdi12Addr('0');

    /// Number of distinct addresses available on one bus.
    pub const COUNT: usize = ALPHABET.len();

    /// Creates a new `Sdi12Addr` if the given character is a valid address.
    pub fn new(address_char: char) -> Result<Self, GenerateError> {
        if Self::is_valid_address_char(address_char) {
            Ok(Sdi12Addr(address_char))
        } else {
            Err(GenerateError::InvalidAddress(address_char))
        }
    }

    /// Maps a zero-based sensor index to its bus address.
    ///
    /// Indices 0-9 map to `'0'..='9'`, 10-35 to `'a'..='z'` and 36-61 to
    /// `'A'..='Z'`. Anything past 61 has no address.
    pub fn from_index(index: usize) -> Result<Self, GenerateError> {
        ALPHABET
            .get(index)
            .map(|&b| Sdi12Addr(b as char))
            .ok_or(GenerateError::AddressOutOfRange(index))
    }

    /// Inverse of [`Sdi12Addr::from_index`].
    pub fn index(&self) -> usize {
        match self.0 {
            c @ '0'..='9' => c as usize - '0' as usize,
            c @ 'a'..='z' => c as usize - 'a' as usize + 10,
            c => c as usize - 'A' as usize + 36,
        }
    }

    #[inline]
    pub const fn as_char(&self) -> char {
        self.0
    }

    #[inline]
    pub const fn is_standard(&self) -> bool {
        matches!(self.0, '0'..='9')
    }

    #[inline]
    pub const fn is_extended(&self) -> bool {
        matches!(self.0, 'a'..='z' | 'A'..='Z')
    }

    #[inline]
    pub const fn is_valid_address_char(c: char) -> bool {
        matches!(c, '0'..='9' | 'a'..='z' | 'A'..='Z')
    }
}

impl Default for Sdi12Addr {
    fn default() -> Self {
        Self::DEFAULT_ADDRESS
    }
}

impl TryFrom<char> for Sdi12Addr {
    type Error = GenerateError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sdi12Addr> for char {
    fn from(value: Sdi12Addr) -> Self {
        value.0
    }
}

impl fmt::Display for Sdi12Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(Sdi12Addr::new('0').is_ok());
        assert!(Sdi12Addr::new('9').is_ok());
        assert!(Sdi12Addr::new('a').is_ok());
        assert!(Sdi12Addr::new('z').is_ok());
        assert!(Sdi12Addr::new('A').is_ok());
        assert!(Sdi12Addr::new('Z').is_ok());
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(matches!(Sdi12Addr::new(' '), Err(GenerateError::InvalidAddress(' '))));
        assert!(matches!(Sdi12Addr::new('?'), Err(GenerateError::InvalidAddress('?'))));
        assert!(matches!(Sdi12Addr::new('$'), Err(GenerateError::InvalidAddress('$'))));
        assert!(matches!(Sdi12Addr::new('é'), Err(GenerateError::InvalidAddress('é'))));
    }

    #[test]
    fn test_from_index_boundaries() {
        assert_eq!(Sdi12Addr::from_index(0).unwrap().as_char(), '0');
        assert_eq!(Sdi12Addr::from_index(9).unwrap().as_char(), '9');
        assert_eq!(Sdi12Addr::from_index(10).unwrap().as_char(), 'a');
        assert_eq!(Sdi12Addr::from_index(35).unwrap().as_char(), 'z');
        assert_eq!(Sdi12Addr::from_index(36).unwrap().as_char(), 'A');
        assert_eq!(Sdi12Addr::from_index(61).unwrap().as_char(), 'Z');
    }

    #[test]
    fn test_from_index_out_of_range() {
        assert_eq!(Sdi12Addr::from_index(62), Err(GenerateError::AddressOutOfRange(62)));
        assert_eq!(
            Sdi12Addr::from_index(usize::MAX),
            Err(GenerateError::AddressOutOfRange(usize::MAX))
        );
    }

    #[test]
    fn test_from_index_is_bijective() {
        let mut seen = [false; 128];
        for i in 0..Sdi12Addr::COUNT {
            let addr = Sdi12Addr::from_index(i).unwrap();
            let c = addr.as_char();
            assert!(c.is_ascii_alphanumeric());
            assert!(!seen[c as usize], "duplicate address {c}");
            seen[c as usize] = true;
            assert_eq!(addr.index(), i);
            assert_eq!(Sdi12Addr::new(c).unwrap(), addr);
        }
    }

    #[test]
    fn test_address_types() {
        assert!(Sdi12Addr::from_index(3).unwrap().is_standard());
        assert!(Sdi12Addr::from_index(12).unwrap().is_extended());
        assert!(Sdi12Addr::from_index(40).unwrap().is_extended());
        assert_eq!(Sdi12Addr::default(), Sdi12Addr::from_index(0).unwrap());
    }

    #[test]
    fn test_try_from_char() {
        assert_eq!(Sdi12Addr::try_from('1').unwrap(), Sdi12Addr('1'));
        assert_eq!(Sdi12Addr::try_from('b').unwrap(), Sdi12Addr('b'));
        assert_eq!(Sdi12Addr::try_from('C').unwrap(), Sdi12Addr('C'));
        assert!(matches!(Sdi12Addr::try_from('*'), Err(GenerateError::InvalidAddress('*'))));
        assert_eq!(char::from(Sdi12Addr('Q')), 'Q');
    }
}
