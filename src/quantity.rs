use std::fmt::{Display, Formatter};
use std::str::FromStr;

const KIB: f64 = 1_024.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity '{0}'")]
    Number(String),

    #[error("unknown suffix '{suffix}' in quantity '{raw}'")]
    Suffix { raw: String, suffix: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Binary(u8),
    Decimal(i32),
}

impl Scale {
    fn multiplier(self) -> f64 {
        match self {
            Self::Binary(power) => KIB.powi(i32::from(power)),
            Self::Decimal(exponent) => 10f64.powi(exponent),
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        let scale = match suffix {
            "" => Self::Decimal(0),
            "Ki" => Self::Binary(1),
            "Mi" => Self::Binary(2),
            "Gi" => Self::Binary(3),
            "Ti" => Self::Binary(4),
            "Pi" => Self::Binary(5),
            "Ei" => Self::Binary(6),
            "n" => Self::Decimal(-9),
            "u" => Self::Decimal(-6),
            "m" => Self::Decimal(-3),
            "k" | "K" => Self::Decimal(3),
            "M" => Self::Decimal(6),
            "G" => Self::Decimal(9),
            "T" => Self::Decimal(12),
            "P" => Self::Decimal(15),
            "E" => Self::Decimal(18),
            other => {
                let exponent = other.strip_prefix(['e', 'E'])?;
                Self::Decimal(exponent.parse().ok()?)
            }
        };
        Some(scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    number: f64,
    scale: Scale,
}

impl Quantity {
    pub fn base(&self) -> f64 {
        self.number * self.scale.multiplier()
    }

    pub fn millicores(&self) -> f64 {
        self.base() * 1_000.0
    }

    pub fn kib(&self) -> f64 {
        self.base() / KIB
    }

    pub fn mib(&self) -> f64 {
        self.base() / (KIB * KIB)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err(QuantityError::Empty);
        }

        let split = raw
            .char_indices()
            .find(|(index, ch)| {
                !(ch.is_ascii_digit() || *ch == '.' || (*index == 0 && matches!(ch, '+' | '-')))
            })
            .map(|(index, _)| index)
            .unwrap_or(raw.len());
        let (number, suffix) = raw.split_at(split);

        let number = number
            .parse::<f64>()
            .map_err(|_| QuantityError::Number(raw.to_string()))?;
        if !number.is_finite() {
            return Err(QuantityError::Number(raw.to_string()));
        }
        let scale = Scale::from_suffix(suffix).ok_or_else(|| QuantityError::Suffix {
            raw: raw.to_string(),
            suffix: suffix.to_string(),
        })?;

        Ok(Self { number, scale })
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.scale {
            Scale::Binary(power) => {
                let suffix = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"]
                    .get(usize::from(power))
                    .copied()
                    .unwrap_or("?");
                write!(f, "{}{suffix}", self.number)
            }
            Scale::Decimal(0) => write!(f, "{}", self.number),
            Scale::Decimal(exponent) => write!(f, "{}e{exponent}", self.number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Quantity, QuantityError, Scale};
    use rstest::rstest;

    #[rstest]
    #[case("16393216Ki", 16_393_216.0)]
    #[case("1Gi", 1_048_576.0)]
    #[case("512Mi", 524_288.0)]
    #[case("1024", 1.0)]
    #[case("2k", 2_000.0 / 1_024.0)]
    fn memory_in_kib(#[case] raw: &str, #[case] expected: f64) {
        let quantity: Quantity = raw.parse().unwrap();
        assert!((quantity.kib() - expected).abs() < 1e-9, "{raw}");
    }

    #[rstest]
    #[case("4", 4_000.0)]
    #[case("250m", 250.0)]
    #[case("270301052n", 270.301052)]
    #[case("1500u", 1.5)]
    #[case("0.5", 500.0)]
    fn cpu_in_millicores(#[case] raw: &str, #[case] expected: f64) {
        let quantity: Quantity = raw.parse().unwrap();
        assert!((quantity.millicores() - expected).abs() < 1e-6, "{raw}");
    }

    #[test]
    fn decimal_exponent_is_not_exa() {
        let exponent: Quantity = "1e3".parse().unwrap();
        let exa: Quantity = "1E".parse().unwrap();
        assert_eq!(exponent.scale, Scale::Decimal(3));
        assert_eq!(exa.scale, Scale::Decimal(18));
        assert_eq!(exponent.base(), 1_000.0);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!("".parse::<Quantity>(), Err(QuantityError::Empty));
        assert!(matches!(
            "12Qi".parse::<Quantity>(),
            Err(QuantityError::Suffix { .. })
        ));
        assert!(matches!(
            "Ki".parse::<Quantity>(),
            Err(QuantityError::Number(_))
        ));
    }

    #[test]
    fn display_keeps_binary_suffix() {
        let quantity: Quantity = "640Ki".parse().unwrap();
        assert_eq!(quantity.to_string(), "640Ki");
    }
}
