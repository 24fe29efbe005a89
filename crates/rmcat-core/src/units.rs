//! Unit newtypes used throughout the scenario: rates, sizes and simulated time.

macro_rules! unit {
    ($name: ident) => {
        #[derive(
            Debug,
            Default,
            Copy,
            Clone,
            PartialOrd,
            Ord,
            PartialEq,
            Eq,
            Hash,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Sum,
            derive_more::FromStr,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub const ZERO: $name = Self::new(0);
            pub const ONE: $name = Self::new(1);
            pub const MAX: $name = Self::new(u64::MAX);

            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn into_u64(self) -> u64 {
                self.0
            }

            pub fn into_f64(self) -> f64 {
                self.0 as f64
            }

            pub fn saturating_sub(self, rhs: Self) -> Self {
                Self(self.0.saturating_sub(rhs.0))
            }

            pub fn saturating_add(self, rhs: Self) -> Self {
                Self(self.0.saturating_add(rhs.0))
            }
        }
    };
}

unit!(BitsPerSec);

impl BitsPerSec {
    /// Returns the time needed to serialize `size` onto a link of this rate.
    ///
    /// A zero rate never finishes, so this returns [`Nanosecs::MAX`].
    pub fn length(&self, size: Bytes) -> Nanosecs {
        if self.0 == 0 {
            return Nanosecs::MAX;
        }
        let bits = size.into_u64() as u128 * 8;
        let ns = bits * 1_000_000_000 / self.0 as u128;
        Nanosecs::new(u64::try_from(ns).unwrap_or(u64::MAX))
    }

    /// Returns the number of bytes this rate carries in `delay`.
    pub fn bytes_in(&self, delay: Millisecs) -> Bytes {
        Bytes::new(self.0 * delay.into_u64() / 8_000)
    }
}

impl std::fmt::Display for BitsPerSec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

unit!(Bytes);

impl std::fmt::Display for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}B", self.0)
    }
}

unit!(Nanosecs);

impl Nanosecs {
    /// Converts a (non-negative) number of seconds, rounding to the nearest nanosecond.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1e9).round() as u64)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1e9
    }
}

impl std::fmt::Display for Nanosecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

unit!(Millisecs);

impl std::fmt::Display for Millisecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

unit!(Secs);

impl std::fmt::Display for Secs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl From<Millisecs> for Nanosecs {
    fn from(val: Millisecs) -> Self {
        Nanosecs::new(val.into_u64().saturating_mul(1_000_000))
    }
}

impl From<Secs> for Nanosecs {
    fn from(val: Secs) -> Self {
        Nanosecs::new(val.into_u64().saturating_mul(1_000_000_000))
    }
}
