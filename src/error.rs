//! Error types for the batch generation drivers.

/// Argument error returned by a batch driver before any value is computed.
///
/// The destination buffer is left untouched whenever one of these is
/// returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenError {
    /// Destination length differs from the number of values the call
    /// produces.
    DestinationSize { expected: usize, actual: usize },
    /// A coordinate array is shorter or longer than the x array.
    PositionArrayLength {
        axis: char,
        expected: usize,
        actual: usize,
    },
    /// Negative grid size, or a non-positive tile dimension.
    InvalidSize { axis: char, size: i32 },
    /// The product of the sizes does not fit in `usize`.
    SizeOverflow,
}

impl std::fmt::Display for GenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenError::DestinationSize { expected, actual } => write!(
                f,
                "destination holds {} values, call produces {}",
                actual, expected
            ),
            GenError::PositionArrayLength {
                axis,
                expected,
                actual,
            } => write!(
                f,
                "{} position array has {} entries, expected {}",
                axis, actual, expected
            ),
            GenError::InvalidSize { axis, size } => {
                write!(f, "invalid {} size {}", axis, size)
            }
            GenError::SizeOverflow => write!(f, "grid size overflows usize"),
        }
    }
}

impl std::error::Error for GenError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = GenError::DestinationSize {
            expected: 12,
            actual: 10,
        };
        assert_eq!(e.to_string(), "destination holds 10 values, call produces 12");

        let e = GenError::InvalidSize { axis: 'y', size: -3 };
        assert_eq!(e.to_string(), "invalid y size -3");

        let boxed: Box<dyn std::error::Error> = Box::new(GenError::SizeOverflow);
        assert!(boxed.to_string().contains("overflow"));
    }
}
