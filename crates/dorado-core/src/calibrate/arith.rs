use std::fmt;
use std::str::FromStr;

use ndarray::Array2;

use crate::error::{DoradoError, Result};
use crate::frame::Frame;

/// Pixel arithmetic operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl FromStr for Operator {
    type Err = DoradoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "+" => Ok(Self::Add),
            "-" => Ok(Self::Subtract),
            "*" => Ok(Self::Multiply),
            "/" => Ok(Self::Divide),
            other => Err(DoradoError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        };
        write!(f, "{symbol}")
    }
}

/// Right-hand side of an arithmetic step.
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    Scalar(f32),
    Image(&'a Array2<f32>),
}

/// Apply `frame <op> operand` to every frame in place.
///
/// The operand is checked once up front: scalar division by zero and image
/// operands of the wrong geometry fail before any frame is touched.
pub fn imarith(frames: &mut [Frame], op: Operator, operand: Operand<'_>) -> Result<()> {
    match operand {
        Operand::Scalar(v) => {
            if op == Operator::Divide && v == 0.0 {
                return Err(DoradoError::InvalidInput("division by zero".into()));
            }
            for frame in frames.iter_mut() {
                match op {
                    Operator::Add => frame.data += v,
                    Operator::Subtract => frame.data -= v,
                    Operator::Multiply => frame.data *= v,
                    Operator::Divide => frame.data /= v,
                }
            }
        }
        Operand::Image(image) => {
            if let Some(frame) = frames.iter().find(|f| f.dim() != image.dim()) {
                return Err(DoradoError::InvalidInput(format!(
                    "operand is {:?}, frame is {:?}",
                    image.dim(),
                    frame.dim()
                )));
            }
            for frame in frames.iter_mut() {
                match op {
                    Operator::Add => frame.data += image,
                    Operator::Subtract => frame.data -= image,
                    Operator::Multiply => frame.data *= image,
                    Operator::Divide => frame.data /= image,
                }
            }
        }
    }
    Ok(())
}
