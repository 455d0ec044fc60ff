//! Text and binary grammar for UUIDs.
//!
//! Accepted inputs, by length:
//!
//! | Length | Form                                            |
//! | ------ | ----------------------------------------------- |
//! | 0      | empty (nil)                                     |
//! | 3, 4   | `nil`, `max`, `null`                            |
//! | 16     | raw bytes (binary input only)                   |
//! | 32     | `0123456789abcdef0123456789abcdef`              |
//! | 36     | `01234567-89ab-cdef-0123-456789abcdef`          |
//! | 38     | `{01234567-89ab-cdef-0123-456789abcdef}`        |
//! | 45     | `urn:uuid:01234567-89ab-cdef-0123-456789abcdef` |
//!
//! Checks run in order: length, delimiters, hex digits, variant. The variant check is skipped for
//! the nil and max UUIDs.

use std::fmt;

use crate::Uuid;

/// Error parsing an invalid text or binary representation of UUID.
#[derive(Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
#[error("failed to parse \"{}\" as UUID: {problem}", .input.escape_ascii())]
pub struct ParseError {
    /// The rejected input, verbatim.
    pub input: Vec<u8>,

    /// What was wrong with it.
    pub problem: ParseProblem,
}

/// The kinds of problem [`ParseError`] reports.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, thiserror::Error)]
pub enum ParseProblem {
    /// The text input has a length no form accepts.
    #[error("unexpected input length {length}; should be 0, 32, 36, 38, or 45")]
    WrongLength { length: usize },

    /// The binary input has a length no form accepts.
    #[error("unexpected input length {length} for binary data; should be 0, 16, 32, 36, 38, or 45")]
    WrongBinaryLength { length: usize },

    /// A delimiter or hex digit was expected at `index`. `expected` is `None` where any hex digit
    /// would do.
    #[error(
        "unexpected character '{}' at index {index}; expected {}",
        .actual.escape_ascii(),
        ExpectedByte::from(.expected)
    )]
    UnexpectedCharacter {
        index: usize,
        expected: Option<u8>,
        actual: u8,
    },

    /// The variant bits, found at input offset `index`, are not `10`.
    #[error(
        "unexpected value {actual:02x} for UUID variant byte at index {index}; should be {expected:02x}"
    )]
    WrongVariant { index: usize, expected: u8, actual: u8 },
}

struct ExpectedByte(Option<u8>);

impl From<&Option<u8>> for ExpectedByte {
    fn from(src: &Option<u8>) -> Self {
        Self(*src)
    }
}

impl fmt::Display for ExpectedByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(b) => write!(f, "'{}'", b.escape_ascii()),
            None => f.write_str("hex digit [0-9a-f]"),
        }
    }
}

/// Positions of the fixed delimiters and of the five hex groups in one textual form.
struct Form {
    delimiters: &'static [(usize, u8)],
    groups: [usize; 5],
}

const GROUP_BYTES: [usize; 5] = [4, 2, 2, 2, 6];

const COMPACT: Form = Form {
    delimiters: &[],
    groups: [0, 8, 12, 16, 20],
};

const HYPHENATED: Form = Form {
    delimiters: &[(8, b'-'), (13, b'-'), (18, b'-'), (23, b'-')],
    groups: [0, 9, 14, 19, 24],
};

const BRACED: Form = Form {
    delimiters: &[
        (0, b'{'),
        (9, b'-'),
        (14, b'-'),
        (19, b'-'),
        (24, b'-'),
        (37, b'}'),
    ],
    groups: [1, 10, 15, 20, 25],
};

const URN: Form = Form {
    delimiters: &[
        (0, b'u'),
        (1, b'r'),
        (2, b'n'),
        (3, b':'),
        (4, b'u'),
        (5, b'u'),
        (6, b'i'),
        (7, b'd'),
        (8, b':'),
        (17, b'-'),
        (22, b'-'),
        (27, b'-'),
        (32, b'-'),
    ],
    groups: [9, 18, 23, 28, 33],
};

/// Parses `input` as text, or as text-or-raw-bytes when `binary` is set.
pub(crate) fn parse(input: &[u8], binary: bool) -> Result<Uuid, ParseError> {
    let fail = |problem| ParseError {
        input: input.to_vec(),
        problem,
    };

    let form = match input.len() {
        0 => return Ok(Uuid::NIL),
        3 if input.eq_ignore_ascii_case(b"nil") => return Ok(Uuid::NIL),
        3 if input.eq_ignore_ascii_case(b"max") => return Ok(Uuid::MAX),
        4 if input.eq_ignore_ascii_case(b"null") => return Ok(Uuid::NIL),
        16 if binary => {
            let mut bytes = [0u8; 16];
            bytes.copy_from_slice(input);
            return check_variant(Uuid::from(bytes), 8).map_err(fail);
        }
        32 => &COMPACT,
        36 => &HYPHENATED,
        38 => &BRACED,
        45 => &URN,
        length if binary => return Err(fail(ParseProblem::WrongBinaryLength { length })),
        length => return Err(fail(ParseProblem::WrongLength { length })),
    };

    for &(index, expected) in form.delimiters {
        let actual = input[index];
        if actual.to_ascii_lowercase() != expected {
            return Err(fail(ParseProblem::UnexpectedCharacter {
                index,
                expected: Some(expected),
                actual,
            }));
        }
    }

    let mut bytes = [0u8; 16];
    let mut dst = bytes.iter_mut();
    for (&start, &count) in form.groups.iter().zip(GROUP_BYTES.iter()) {
        for index in (start..start + count * 2).step_by(2) {
            let hi = hex_digit(input, index).map_err(fail)?;
            let lo = hex_digit(input, index + 1).map_err(fail)?;
            if let Some(e) = dst.next() {
                *e = (hi << 4) | lo;
            }
        }
    }

    check_variant(Uuid::from(bytes), form.groups[3]).map_err(fail)
}

fn hex_digit(input: &[u8], index: usize) -> Result<u8, ParseProblem> {
    let actual = input[index];
    match actual {
        b'0'..=b'9' => Ok(actual - b'0'),
        b'a'..=b'f' => Ok(actual - b'a' + 10),
        b'A'..=b'F' => Ok(actual - b'A' + 10),
        _ => Err(ParseProblem::UnexpectedCharacter {
            index,
            expected: None,
            actual,
        }),
    }
}

fn check_variant(uuid: Uuid, index: usize) -> Result<Uuid, ParseProblem> {
    let actual = uuid.as_bytes()[8];
    if uuid.is_nil() || uuid.is_max() || actual & 0xc0 == 0x80 {
        Ok(uuid)
    } else {
        Err(ParseProblem::WrongVariant {
            index,
            expected: (actual & 0x3f) | 0x80,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, ParseError, ParseProblem};
    use crate::Uuid;

    const SILLY: Uuid = Uuid::from_bytes([0, 0, 0, 0, 0, 0, 0x10, 0, 0x80, 0, 0, 0, 0, 0, 0, 0]);

    /// Accepts every documented form
    #[test]
    fn accepts_every_documented_form() {
        let cases: &[(&str, Uuid)] = &[
            ("", Uuid::NIL),
            ("nil", Uuid::NIL),
            ("null", Uuid::NIL),
            ("NULL", Uuid::NIL),
            ("max", Uuid::MAX),
            ("00000000000010008000000000000000", SILLY),
            ("00000000-0000-1000-8000-000000000000", SILLY),
            ("{00000000-0000-1000-8000-000000000000}", SILLY),
            ("urn:uuid:00000000-0000-1000-8000-000000000000", SILLY),
            ("URN:UUID:00000000-0000-1000-8000-000000000000", SILLY),
            ("00000000-0000-0000-0000-000000000000", Uuid::NIL),
            ("FFFFFFFF-FFFF-FFFF-FFFF-FFFFFFFFFFFF", Uuid::MAX),
        ];
        for &(text, expected) in cases {
            assert_eq!(parse(text.as_bytes(), false), Ok(expected), "{text}");
            assert_eq!(parse(text.as_bytes(), true), Ok(expected), "{text}");
        }
    }

    /// Accepts raw bytes only as binary input
    #[test]
    fn accepts_raw_bytes_only_as_binary_input() {
        let raw = *SILLY.as_bytes();
        assert_eq!(parse(&raw, true), Ok(SILLY));
        assert_eq!(
            parse(&raw, false).unwrap_err().problem,
            ParseProblem::WrongLength { length: 16 }
        );
        let mut bad = raw;
        bad[8] = 0x40;
        assert_eq!(
            parse(&bad, true).unwrap_err().problem,
            ParseProblem::WrongVariant {
                index: 8,
                expected: 0x80,
                actual: 0x40
            }
        );
    }

    /// Reports problems with position and bytes
    #[test]
    fn reports_problems_with_position_and_bytes() {
        let cases: &[(&str, ParseProblem)] = &[
            ("x", ParseProblem::WrongLength { length: 1 }),
            ("nul", ParseProblem::WrongLength { length: 3 }),
            (
                "0000000000001000800000000000000",
                ParseProblem::WrongLength { length: 31 },
            ),
            (
                "000000000000100080000000000000000",
                ParseProblem::WrongLength { length: 33 },
            ),
            (
                "0g000000000010008000000000000000",
                ParseProblem::UnexpectedCharacter {
                    index: 1,
                    expected: None,
                    actual: b'g',
                },
            ),
            (
                "00000000:0000:1000:8000:000000000000",
                ParseProblem::UnexpectedCharacter {
                    index: 8,
                    expected: Some(b'-'),
                    actual: b':',
                },
            ),
            (
                "(00000000-0000-1000-8000-000000000000}",
                ParseProblem::UnexpectedCharacter {
                    index: 0,
                    expected: Some(b'{'),
                    actual: b'(',
                },
            ),
            (
                "urn:uuid:00000000-0000-1000-8000-00000000000z",
                ParseProblem::UnexpectedCharacter {
                    index: 44,
                    expected: None,
                    actual: b'z',
                },
            ),
            (
                "00000000-0000-1000-c000-000000000000",
                ParseProblem::WrongVariant {
                    index: 19,
                    expected: 0x80,
                    actual: 0xc0,
                },
            ),
        ];
        for &(text, problem) in cases {
            assert_eq!(
                parse(text.as_bytes(), false),
                Err(ParseError {
                    input: text.as_bytes().to_vec(),
                    problem,
                }),
                "{text}"
            );
        }
    }

    /// Checks delimiters before hex digits
    #[test]
    fn checks_delimiters_before_hex_digits() {
        let err = parse(b"0000000g_0000-1000-8000-000000000000", false).unwrap_err();
        assert_eq!(
            err.problem,
            ParseProblem::UnexpectedCharacter {
                index: 8,
                expected: Some(b'-'),
                actual: b'_',
            }
        );
    }

    /// Distinguishes binary length errors
    #[test]
    fn distinguishes_binary_length_errors() {
        assert_eq!(
            parse(&[0u8; 15], true).unwrap_err().problem,
            ParseProblem::WrongBinaryLength { length: 15 }
        );
    }

    /// Formats diagnostics readably
    #[test]
    fn formats_diagnostics_readably() {
        let err = parse(b"0g000000000010008000000000000000", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to parse \"0g000000000010008000000000000000\" as UUID: \
             unexpected character 'g' at index 1; expected hex digit [0-9a-f]"
        );
        let err = parse(b"00000000-0000-1000-c000-000000000000", false).unwrap_err();
        assert!(err.to_string().ends_with(
            "unexpected value c0 for UUID variant byte at index 19; should be 80"
        ));
    }
}
