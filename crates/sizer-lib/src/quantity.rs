//! Exact resource quantities
//!
//! Every quantity is held as a signed integer in the smallest unit of its
//! dimension (CPU millicores, memory bytes, GPU units), so sums and scaled
//! pool capacities never drift. Parsing accepts the Kubernetes quantity
//! syntax (`500m`, `1.5Gi`, `2`, `1e3`, ...).

use crate::error::QuantityError;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// The resource dimension a quantity is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// CPU, stored in millicores
    Cpu,
    /// Memory, stored in bytes
    Memory,
    /// GPUs, stored in whole devices
    Gpu,
}

impl Dimension {
    /// Check order used by the node type filter
    pub const ALL: [Dimension; 3] = [Dimension::Cpu, Dimension::Memory, Dimension::Gpu];

    /// Number of base units in one nominal unit of the dimension
    fn base_scale(self) -> i128 {
        match self {
            Dimension::Cpu => 1000,
            Dimension::Memory | Dimension::Gpu => 1,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Cpu => "CPU",
            Dimension::Memory => "memory",
            Dimension::Gpu => "GPU",
        };
        f.write_str(name)
    }
}

/// Scale factor carried by a quantity suffix
#[derive(Debug, Clone, Copy)]
enum Multiplier {
    /// Power of 1024
    Binary(u32),
    /// Power of 10
    Decimal(i32),
}

impl Multiplier {
    fn from_suffix(suffix: &str) -> Option<Self> {
        let multiplier = match suffix {
            "" => Multiplier::Decimal(0),
            "n" => Multiplier::Decimal(-9),
            "u" => Multiplier::Decimal(-6),
            "m" => Multiplier::Decimal(-3),
            "k" => Multiplier::Decimal(3),
            "M" => Multiplier::Decimal(6),
            "G" => Multiplier::Decimal(9),
            "T" => Multiplier::Decimal(12),
            "P" => Multiplier::Decimal(15),
            "E" => Multiplier::Decimal(18),
            "Ki" => Multiplier::Binary(1),
            "Mi" => Multiplier::Binary(2),
            "Gi" => Multiplier::Binary(3),
            "Ti" => Multiplier::Binary(4),
            "Pi" => Multiplier::Binary(5),
            "Ei" => Multiplier::Binary(6),
            _ => {
                let exponent = suffix.strip_prefix(&['e', 'E'][..])?;
                Multiplier::Decimal(exponent.parse().ok()?)
            }
        };
        Some(multiplier)
    }
}

/// Largest exponent accepted in a decimal suffix
const MAX_EXPONENT: i32 = 30;

/// Binary suffixes used when rendering memory, largest first
const BINARY_SUFFIXES: [(&str, i64); 6] = [
    ("Ei", 1 << 60),
    ("Pi", 1 << 50),
    ("Ti", 1 << 40),
    ("Gi", 1 << 30),
    ("Mi", 1 << 20),
    ("Ki", 1 << 10),
];

/// A signed amount of one resource dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceQuantity {
    dimension: Dimension,
    value: i64,
}

impl ResourceQuantity {
    /// Build a quantity from a value already in base units
    pub const fn new(dimension: Dimension, value: i64) -> Self {
        Self { dimension, value }
    }

    pub const fn zero(dimension: Dimension) -> Self {
        Self::new(dimension, 0)
    }

    pub const fn cpu_millis(millicores: i64) -> Self {
        Self::new(Dimension::Cpu, millicores)
    }

    pub const fn memory_bytes(bytes: i64) -> Self {
        Self::new(Dimension::Memory, bytes)
    }

    pub const fn gpu_units(units: i64) -> Self {
        Self::new(Dimension::Gpu, units)
    }

    /// Parse a Kubernetes-style quantity string into base units
    ///
    /// Values that are not a whole number of base units are rounded up,
    /// matching how the scheduler treats fractional requests.
    pub fn parse(dimension: Dimension, input: &str) -> Result<Self, QuantityError> {
        let invalid = |reason: &str| QuantityError::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let overflow = QuantityError::Overflow(dimension);

        let trimmed = input.trim();
        let (negative, body) = if let Some(rest) = trimmed.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = trimmed.strip_prefix('+') {
            (false, rest)
        } else {
            (false, trimmed)
        };

        let number_len = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (number, suffix) = body.split_at(number_len);
        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("missing digits"));
        }
        if frac_part.contains('.') {
            return Err(invalid("more than one decimal point"));
        }
        if frac_part.len() > MAX_EXPONENT as usize {
            return Err(invalid("too many fractional digits"));
        }

        let multiplier = Multiplier::from_suffix(suffix).ok_or_else(|| invalid("unknown suffix"))?;

        let mantissa: i128 = format!("{int_part}{frac_part}")
            .parse()
            .map_err(|_| invalid("too many digits"))?;
        let mut numerator = mantissa;
        let mut denominator = 10_i128.pow(frac_part.len() as u32);

        match multiplier {
            Multiplier::Binary(power) => {
                numerator = numerator
                    .checked_mul(1024_i128.pow(power))
                    .ok_or(overflow.clone())?;
            }
            Multiplier::Decimal(exponent) if exponent.abs() > MAX_EXPONENT => {
                return Err(overflow);
            }
            Multiplier::Decimal(exponent) if exponent >= 0 => {
                numerator = numerator
                    .checked_mul(10_i128.pow(exponent as u32))
                    .ok_or(overflow.clone())?;
            }
            Multiplier::Decimal(exponent) => {
                denominator = denominator
                    .checked_mul(10_i128.pow(exponent.unsigned_abs()))
                    .ok_or(overflow.clone())?;
            }
        }

        numerator = numerator
            .checked_mul(dimension.base_scale())
            .ok_or(overflow.clone())?;

        // Round the magnitude up to the next whole base unit
        let magnitude = numerator / denominator + i128::from(numerator % denominator != 0);
        let signed = if negative { -magnitude } else { magnitude };
        let value = i64::try_from(signed).map_err(|_| overflow)?;

        Ok(Self::new(dimension, value))
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Raw value in base units
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn is_negative(&self) -> bool {
        self.value < 0
    }

    fn same_dimension(&self, other: &Self) -> Result<(), QuantityError> {
        if self.dimension == other.dimension {
            Ok(())
        } else {
            Err(QuantityError::DimensionMismatch {
                left: self.dimension,
                right: other.dimension,
            })
        }
    }

    pub fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        self.same_dimension(&other)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or(QuantityError::Overflow(self.dimension))?;
        Ok(Self::new(self.dimension, value))
    }

    pub fn checked_sub(self, other: Self) -> Result<Self, QuantityError> {
        self.same_dimension(&other)?;
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or(QuantityError::Overflow(self.dimension))?;
        Ok(Self::new(self.dimension, value))
    }

    /// Multiply by an integer factor, e.g. per-node capacity times node count
    pub fn checked_scale(self, factor: i64) -> Result<Self, QuantityError> {
        let value = self
            .value
            .checked_mul(factor)
            .ok_or(QuantityError::Overflow(self.dimension))?;
        Ok(Self::new(self.dimension, value))
    }

    /// Compare two quantities of the same dimension
    pub fn compare(&self, other: &Self) -> Result<Ordering, QuantityError> {
        self.same_dimension(other)?;
        Ok(self.value.cmp(&other.value))
    }
}

impl PartialOrd for ResourceQuantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).ok()
    }
}

impl fmt::Display for ResourceQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dimension {
            Dimension::Cpu if self.value % 1000 == 0 => write!(f, "{}", self.value / 1000),
            Dimension::Cpu => write!(f, "{}m", self.value),
            Dimension::Memory => {
                if self.value != 0 {
                    for (suffix, factor) in BINARY_SUFFIXES {
                        if self.value % factor == 0 {
                            return write!(f, "{}{}", self.value / factor, suffix);
                        }
                    }
                }
                write!(f, "{}", self.value)
            }
            Dimension::Gpu => write!(f, "{}", self.value),
        }
    }
}

impl Serialize for ResourceQuantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// CPU, memory and GPU amounts, each guaranteed to carry its own dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceVector {
    cpu: ResourceQuantity,
    memory: ResourceQuantity,
    gpu: ResourceQuantity,
}

impl ResourceVector {
    pub const fn new(cpu_millis: i64, memory_bytes: i64, gpu_units: i64) -> Self {
        Self {
            cpu: ResourceQuantity::cpu_millis(cpu_millis),
            memory: ResourceQuantity::memory_bytes(memory_bytes),
            gpu: ResourceQuantity::gpu_units(gpu_units),
        }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Assemble a vector from parsed quantities, rejecting misplaced dimensions
    pub fn from_quantities(
        cpu: ResourceQuantity,
        memory: ResourceQuantity,
        gpu: ResourceQuantity,
    ) -> Result<Self, QuantityError> {
        for (quantity, expected) in [
            (cpu, Dimension::Cpu),
            (memory, Dimension::Memory),
            (gpu, Dimension::Gpu),
        ] {
            if quantity.dimension() != expected {
                return Err(QuantityError::DimensionMismatch {
                    left: expected,
                    right: quantity.dimension(),
                });
            }
        }
        Ok(Self { cpu, memory, gpu })
    }

    pub fn cpu(&self) -> ResourceQuantity {
        self.cpu
    }

    pub fn memory(&self) -> ResourceQuantity {
        self.memory
    }

    pub fn gpu(&self) -> ResourceQuantity {
        self.gpu
    }

    pub fn get(&self, dimension: Dimension) -> ResourceQuantity {
        match dimension {
            Dimension::Cpu => self.cpu,
            Dimension::Memory => self.memory,
            Dimension::Gpu => self.gpu,
        }
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, QuantityError> {
        Ok(Self {
            cpu: self.cpu.checked_add(other.cpu)?,
            memory: self.memory.checked_add(other.memory)?,
            gpu: self.gpu.checked_add(other.gpu)?,
        })
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, QuantityError> {
        Ok(Self {
            cpu: self.cpu.checked_sub(other.cpu)?,
            memory: self.memory.checked_sub(other.memory)?,
            gpu: self.gpu.checked_sub(other.gpu)?,
        })
    }

    pub fn checked_scale(&self, factor: i64) -> Result<Self, QuantityError> {
        Ok(Self {
            cpu: self.cpu.checked_scale(factor)?,
            memory: self.memory.checked_scale(factor)?,
            gpu: self.gpu.checked_scale(factor)?,
        })
    }

    /// First dimension, in CPU, memory, GPU order, where `self` is larger than `capacity`
    pub fn first_exceeding(&self, capacity: &Self) -> Option<Dimension> {
        Dimension::ALL
            .into_iter()
            .find(|&dimension| self.get(dimension).value() > capacity.get(dimension).value())
    }

    pub fn fits_within(&self, capacity: &Self) -> bool {
        self.first_exceeding(capacity).is_none()
    }

    pub fn has_negative(&self) -> bool {
        Dimension::ALL
            .into_iter()
            .any(|dimension| self.get(dimension).is_negative())
    }
}

impl Default for ResourceVector {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} CPU, {} memory, {} GPU",
            self.cpu, self.memory, self.gpu
        )
    }
}
