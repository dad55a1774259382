/// Errors returned when configuring or commanding an engine.
///
/// The per-step path never produces these; degenerate numeric states are
/// guarded in place instead.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    NoBalls,
    ScoringIndexOutOfRange { index: usize, ball_count: usize },
    InvalidBallSize { index: usize },
    InvalidGeometry,
    NonFiniteAngle,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBalls => write!(f, "at least one ball is required"),
            Self::ScoringIndexOutOfRange { index, ball_count } => {
                write!(
                    f,
                    "scoring ball index {index} out of range ({ball_count} balls)"
                )
            },
            Self::InvalidBallSize { index } => {
                write!(f, "ball {index} has a negative or non-finite size")
            },
            Self::InvalidGeometry => write!(f, "table geometry is negative or non-finite"),
            Self::NonFiniteAngle => write!(f, "shot angle is not finite"),
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let e = EngineError::ScoringIndexOutOfRange {
            index: 4,
            ball_count: 3,
        };
        assert_eq!(e.to_string(), "scoring ball index 4 out of range (3 balls)");
    }
}
