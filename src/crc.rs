//! Checksum over the 16-bit words exchanged with the device.
//!
//! CRC-8, polynomial 0x31, initial value 0xFF, no reflection, no final XOR.

use ::crc::{Crc, CRC_8_NRSC_5};

use crate::Error;

const SENSIRION: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);

/// Compute the check byte for a big-endian data word.
pub(crate) fn checksum(word: [u8; 2]) -> u8 {
    SENSIRION.checksum(&word)
}

/// Verify one `[msb, lsb, crc]` group and return the data word.
pub(crate) fn verify(group: [u8; 3]) -> Result<u16, Error> {
    let [msb, lsb, received] = group;
    let expected = checksum([msb, lsb]);

    if expected != received {
        #[cfg(feature = "defmt")]
        defmt::warn!("checksum mismatch: expected {=u8:#04x}, received {=u8:#04x}", expected, received);
        return Err(Error::Crc);
    }

    Ok(u16::from_be_bytes([msb, lsb]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasheet_example() {
        assert_eq!(checksum([0xbe, 0xef]), 0x92);
    }

    #[test]
    fn known_words() {
        assert_eq!(checksum([0x00, 0x00]), 0x81);
        assert_eq!(checksum([0x66, 0x66]), 0x93);
        assert_eq!(checksum([0xff, 0xff]), 0xac);
    }

    #[test]
    fn verify_accepts_matching_check_byte() {
        assert_eq!(verify([0x64, 0x00, 0x57]), Ok(0x6400));
        assert_eq!(verify([0x00, 0x8f, 0xd5]), Ok(0x008f));
    }

    #[test]
    fn verify_rejects_corrupted_word() {
        assert_eq!(verify([0x64, 0x01, 0x57]), Err(Error::Crc));
        assert_eq!(verify([0xbe, 0xef, 0x93]), Err(Error::Crc));
    }
}
