//! BER encoding types (Tag, Length, etc.)

use crate::ber::view::ByteView;
use ber_core::{BerError, BerResult};
use serde::Serialize;
use std::fmt;

/// Universal class tag numbers (X.680 §8.4)
pub mod universal {
    pub const EOC: u32 = 0;
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const OBJECT_DESCRIPTOR: u32 = 7;
    pub const EXTERNAL: u32 = 8;
    pub const REAL: u32 = 9;
    pub const ENUMERATED: u32 = 10;
    pub const EMBEDDED_PDV: u32 = 11;
    pub const UTF8_STRING: u32 = 12;
    pub const RELATIVE_OID: u32 = 13;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const NUMERIC_STRING: u32 = 18;
    pub const PRINTABLE_STRING: u32 = 19;
    pub const TELETEX_STRING: u32 = 20;
    pub const VIDEOTEX_STRING: u32 = 21;
    pub const IA5_STRING: u32 = 22;
    pub const UTC_TIME: u32 = 23;
    pub const GENERALIZED_TIME: u32 = 24;
    pub const GRAPHIC_STRING: u32 = 25;
    pub const VISIBLE_STRING: u32 = 26;
    pub const GENERAL_STRING: u32 = 27;
    pub const UNIVERSAL_STRING: u32 = 28;
    pub const CHARACTER_STRING: u32 = 29;
    pub const BMP_STRING: u32 = 30;

    /// Display name of a universal tag number
    pub fn name(number: u32) -> &'static str {
        match number {
            EOC => "EOC",
            BOOLEAN => "BOOLEAN",
            INTEGER => "INTEGER",
            BIT_STRING => "BIT STRING",
            OCTET_STRING => "OCTET STRING",
            NULL => "NULL",
            OBJECT_IDENTIFIER => "OBJECT IDENTIFIER",
            OBJECT_DESCRIPTOR => "ObjectDescriptor",
            EXTERNAL => "EXTERNAL",
            REAL => "REAL",
            ENUMERATED => "ENUMERATED",
            EMBEDDED_PDV => "EMBEDDED PDV",
            UTF8_STRING => "UTF8String",
            RELATIVE_OID => "RELATIVE-OID",
            SEQUENCE => "SEQUENCE",
            SET => "SET",
            NUMERIC_STRING => "NumericString",
            PRINTABLE_STRING => "PrintableString",
            TELETEX_STRING => "TeletexString",
            VIDEOTEX_STRING => "VideotexString",
            IA5_STRING => "IA5String",
            UTC_TIME => "UTCTime",
            GENERALIZED_TIME => "GeneralizedTime",
            GRAPHIC_STRING => "GraphicString",
            VISIBLE_STRING => "VisibleString",
            GENERAL_STRING => "GeneralString",
            UNIVERSAL_STRING => "UniversalString",
            CHARACTER_STRING => "CHARACTER STRING",
            BMP_STRING => "BMPString",
            _ => "unknown",
        }
    }
}

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 7-6 of tag byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BerTagClass::Universal => "UNIVERSAL",
            BerTagClass::Application => "APPLICATION",
            BerTagClass::ContextSpecific => "CONTEXT",
            BerTagClass::Private => "PRIVATE",
        }
    }
}

impl fmt::Display for BerTagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value is constructed (contains other values)
/// - **Tag Number**: The actual tag number (0-30 for short form, or extended)
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number > 30):
/// ```text
/// First byte:  C C P 1 1 1 1 1  (all tag bits set to 1)
/// Following bytes: 1 T T T T T T T  (continuation bytes, last byte has bit 7 = 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BerTag {
    /// Tag class
    class: BerTagClass,
    /// Whether this is a constructed type
    constructed: bool,
    /// Tag number
    number: u32,
}

impl BerTag {
    /// Create a new BER tag
    pub const fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub const fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub const fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub const fn private(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Private, constructed, number)
    }

    /// Get tag class
    pub fn class(&self) -> BerTagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Whether this is the universal tag 0 used by the end-of-content marker
    pub fn is_eoc(&self) -> bool {
        self.class == BerTagClass::Universal && self.number == universal::EOC
    }

    /// Decode the identifier octets at `offset`
    ///
    /// # Returns
    /// Returns `Ok((BerTag, next_offset))` if successful, `Err` otherwise
    ///
    /// # Error Handling
    /// Returns error if:
    /// - The view ends inside the identifier
    /// - The extended tag number does not fit in 32 bits
    pub fn decode(view: ByteView<'_>, offset: usize) -> BerResult<(Self, usize)> {
        let first_byte = view.byte(offset)?;
        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 0x1F {
            return Ok((Self::new(class, constructed, tag_bits as u32), offset + 1));
        }

        // Extended form: base-128 continuation octets
        let mut tag_number = 0u32;
        let mut pos = offset + 1;
        loop {
            let byte = view.byte(pos)?;
            pos += 1;
            if tag_number > (u32::MAX >> 7) {
                return Err(BerError::TagTooLarge { offset });
            }
            tag_number = (tag_number << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                break;
            }
        }

        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

impl fmt::Display for BerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pc = if self.constructed { "constructed" } else { "primitive" };
        if self.class == BerTagClass::Universal {
            write!(f, "{} {} tag:{} ({})", self.class, pc, self.number, universal::name(self.number))
        } else {
            write!(f, "{} {} tag:{}", self.class, pc, self.number)
        }
    }
}

/// BER Length octets as they appear on the wire
///
/// BER length can be encoded in three forms:
/// - **Short form**: For lengths 0-127 (1 byte)
/// - **Long form**: First byte `1NNNNNNN`, followed by N big-endian length bytes
/// - **Indefinite form**: The single byte `0x80`; content ends with `00 00`
///
/// The indefinite form only announces that the length is unknown; the
/// length resolver computes the real value by scanning ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form, encoded with length-of-length
    Long(usize),
    /// Indefinite form, terminated by an end-of-content marker
    Indefinite,
}

impl BerLength {
    /// Get the definite length value (0 for the indefinite form)
    pub fn value(&self) -> usize {
        match self {
            BerLength::Short(l) => *l as usize,
            BerLength::Long(l) => *l,
            BerLength::Indefinite => 0,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self, BerLength::Indefinite)
    }

    /// Decode the length octets at `offset`
    ///
    /// # Returns
    /// Returns `Ok((BerLength, next_offset))` if successful, `Err` otherwise
    ///
    /// # Error Handling
    /// Returns error if:
    /// - The view ends inside the length octets
    /// - The reserved first octet `0xFF` is used
    /// - The length value does not fit in 32 bits
    pub fn decode(view: ByteView<'_>, offset: usize) -> BerResult<(Self, usize)> {
        let first_byte = view.byte(offset)?;

        if first_byte & 0x80 == 0 {
            return Ok((BerLength::Short(first_byte), offset + 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Ok((BerLength::Indefinite, offset + 1));
        }
        if num_bytes == 0x7F {
            return Err(BerError::InvalidData(format!(
                "Reserved length octet 0xFF at offset {}",
                offset
            )));
        }

        let bytes = view.slice(offset + 1, num_bytes)?;
        let mut length = 0u64;
        for &byte in bytes {
            length = (length << 8) | byte as u64;
            if length > u32::MAX as u64 {
                return Err(BerError::LengthTooLarge {
                    offset,
                    octets: num_bytes,
                });
            }
        }

        Ok((BerLength::Long(length as usize), offset + 1 + num_bytes))
    }
}
