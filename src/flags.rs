//! `preg_*` flag decoding.
use bitflags::bitflags;
use crate::config::PhpVersion;
use crate::matcher::MatchMode;
use crate::types::Type;

bitflags! {
    /// The subset of `PREG_*` flags whose effect on the result shape is modelled.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MatchFlags: i64 {
        const PATTERN_ORDER = 1;
        const SET_ORDER = 2;
        const OFFSET_CAPTURE = 256;
        const UNMATCHED_AS_NULL = 512;
        /// Not a runtime flag: callers that emulate unmatched-as-null on
        /// PHP 7.2/7.3 pass it alongside `UNMATCHED_AS_NULL`.
        const UNMATCHED_AS_NULL_ON_72_73 = 2048;
    }
}

/// Why a flags argument cannot be analysed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagRejection {
    NotConstant,
    UnsupportedBits(i64),
    ConflictingOrder,
}

impl std::fmt::Display for FlagRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlagRejection::NotConstant => f.write_str("flags are not a constant integer"),
            FlagRejection::UnsupportedBits(bits) => write!(f, "unsupported flag bits {bits:#x}"),
            FlagRejection::ConflictingOrder => f.write_str("PREG_PATTERN_ORDER and PREG_SET_ORDER combined"),
        }
    }
}

impl MatchFlags {
    pub fn offset_capture(self) -> bool { self.contains(Self::OFFSET_CAPTURE) }
    pub fn set_order(self) -> bool { self.contains(Self::SET_ORDER) }

    /// Pattern order is the default when no order flag is given.
    pub fn pattern_order(self) -> bool { !self.set_order() }

    /// `preg_match_all` honours the flag on every version; `preg_match`
    /// reports unmatched trailing groups correctly only from PHP 7.4 on.
    pub fn unmatched_as_null(self, mode: MatchMode, version: PhpVersion) -> bool {
        if !self.contains(Self::UNMATCHED_AS_NULL) {
            return false;
        }
        match mode {
            MatchMode::All => true,
            MatchMode::One => {
                self.contains(Self::UNMATCHED_AS_NULL_ON_72_73) || version.supports_preg_unmatched_as_null()
            }
        }
    }
}

/// Decode the static type of a flags argument. `None` means the argument
/// was omitted.
pub fn resolve(flags_type: Option<&Type>, mode: MatchMode) -> Result<MatchFlags, FlagRejection> {
    let Some(flags_type) = flags_type else {
        return Ok(MatchFlags::empty());
    };
    let value = flags_type.constant_int().ok_or(FlagRejection::NotConstant)?;
    let flags = MatchFlags::from_bits_truncate(value);
    if flags.bits() != value {
        return Err(FlagRejection::UnsupportedBits(value & !MatchFlags::all().bits()));
    }
    if mode == MatchMode::All && flags.contains(MatchFlags::PATTERN_ORDER | MatchFlags::SET_ORDER) {
        return Err(FlagRejection::ConflictingOrder);
    }
    Ok(flags)
}

/// Values of the `PREG_*` constants that may appear in a flags expression.
pub fn preg_constant(name: &str) -> Option<i64> {
    Some(match name {
        "PREG_PATTERN_ORDER" => 1,
        "PREG_SET_ORDER" => 2,
        "PREG_OFFSET_CAPTURE" => 256,
        "PREG_UNMATCHED_AS_NULL" => 512,
        "PREG_UNMATCHED_AS_NULL_ON_72_73" => 2048,
        _ => return None,
    })
}
