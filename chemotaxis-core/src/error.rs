use core::fmt;

/// Setup-time failures. A running simulation never produces one: everything
/// that could fault mid-run is rejected when the config is validated.
#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    MissingTarget,
    InvalidBounds {
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
    },
    TargetOutsideBounds { x: f64, y: f64 },
    NonPositiveInterval { name: &'static str, value: f64 },
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
    InvalidLearningRate { value: f64 },
    InvalidGenerationLength { value: u32 },
    InvalidTimeScale { value: f64 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget => write!(f, "no nutrition target configured"),
            Self::InvalidBounds {
                min_x,
                max_x,
                min_y,
                max_y,
            } => write!(
                f,
                "invalid world bounds: x in [{min_x}, {max_x}], y in [{min_y}, {max_y}]"
            ),
            Self::TargetOutsideBounds { x, y } => {
                write!(f, "target start ({x}, {y}) lies outside the world bounds")
            }
            Self::NonPositiveInterval { name, value } => write!(
                f,
                "{name} must be a finite duration of at least one microsecond, got {value}"
            ),
            Self::InvalidRange { name, min, max } => {
                write!(f, "{name} range is invalid: min={min}, max={max}")
            }
            Self::InvalidLearningRate { value } => {
                write!(f, "learning rate must be positive and finite, got {value}")
            }
            Self::InvalidGenerationLength { value } => {
                write!(f, "generation length must be at least 1, got {value}")
            }
            Self::InvalidTimeScale { value } => {
                write!(f, "time scale must be finite and >= 0, got {value}")
            }
        }
    }
}

impl std::error::Error for SimError {}
