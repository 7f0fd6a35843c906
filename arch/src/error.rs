use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Assembly and runtime errors. Every variant carries a stable numeric code,
/// see [`Error::code`]; callers branch on the code, not on the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Could not parse constant ({0}) on line {1}.")]
    BadConstant(String, usize),

    #[error("More than one data segment detected. Your code should only have one '.data' directive.")]
    MultipleDataSegments,

    #[error("Your code needs exactly one .text directive.")]
    TextSegmentCount,

    #[error(
        "The data segment was not found before the text segment, or there was ancillary text above the text segment."
    )]
    SegmentOrder,

    #[error("Data segment line {0} must have a valid type.")]
    MissingDataType(usize),

    #[error("Argument '{0}' is not compatible with type {1} on line {2}.")]
    InvalidDataArgument(String, String, usize),

    #[error("No arguments were provided to data type {0} on line {1}.")]
    MissingDataArguments(String, usize),

    #[error("Max {0} segment size exceeded on line {1}.")]
    SegmentSizeExceeded(String, usize),

    #[error("No match for label '{0}' on line {1}.")]
    LabelNotFound(String, usize),

    #[error("Label '{0}' duplicated on line {1}.")]
    DuplicateLabel(String, usize),

    #[error("'{0}' is not a valid instruction on line {1}.")]
    InvalidInstruction(String, usize),

    #[error("One or more arguments to instruction '{0}' are not valid on line {1}.")]
    InvalidOperands(String, usize),

    #[error("You must have a label in your text segment called 'main'.")]
    MissingMain,

    #[error("Maximum cycle count exceeded.")]
    MaxCyclesExceeded,

    #[error("No instruction at address 0x{0:X}.")]
    NoInstructionAtAddress(u32),

    #[error("An error occurred when performing instruction '{0}' on line {1}.")]
    ExecutionFailed(String, usize),

    #[error("Instruction '{0}' made an illegal attempt to write to register zero on line {1}.")]
    WriteToZero(String, usize),

    #[error("Illegal attempt to divide by zero on line {0}.")]
    DivideByZero(usize),

    #[error("Segmentation Fault on line {0}. :(")]
    SegmentationFault(usize),

    #[error("Likely Stack Overflow on line {0}. :(")]
    LikelyStackOverflow(usize),

    #[error("Unaligned load or store on line {0}.")]
    UnalignedAccess(usize),
}

impl Error {
    /// Stable numeric code. Code 17 (integer overflow) is reserved: arithmetic
    /// wraps instead of trapping.
    pub fn code(&self) -> u32 {
        match self {
            Error::BadConstant(..) => 0,
            Error::MultipleDataSegments => 1,
            Error::TextSegmentCount => 2,
            Error::SegmentOrder => 3,
            Error::MissingDataType(..) => 4,
            Error::InvalidDataArgument(..) => 5,
            Error::MissingDataArguments(..) => 6,
            Error::SegmentSizeExceeded(..) => 7,
            Error::LabelNotFound(..) => 8,
            Error::DuplicateLabel(..) => 9,
            Error::InvalidInstruction(..) => 10,
            Error::InvalidOperands(..) => 11,
            Error::MissingMain => 12,
            Error::MaxCyclesExceeded => 13,
            Error::NoInstructionAtAddress(..) => 14,
            Error::ExecutionFailed(..) => 15,
            Error::WriteToZero(..) => 16,
            Error::DivideByZero(..) => 18,
            Error::SegmentationFault(..) => 19,
            Error::LikelyStackOverflow(..) => 20,
            Error::UnalignedAccess(..) => 21,
        }
    }

    /// Source line the error points at, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::BadConstant(_, line)
            | Error::MissingDataType(line)
            | Error::InvalidDataArgument(_, _, line)
            | Error::MissingDataArguments(_, line)
            | Error::SegmentSizeExceeded(_, line)
            | Error::LabelNotFound(_, line)
            | Error::DuplicateLabel(_, line)
            | Error::InvalidInstruction(_, line)
            | Error::InvalidOperands(_, line)
            | Error::ExecutionFailed(_, line)
            | Error::WriteToZero(_, line)
            | Error::DivideByZero(line)
            | Error::SegmentationFault(line)
            | Error::LikelyStackOverflow(line)
            | Error::UnalignedAccess(line) => Some(*line),
            Error::MultipleDataSegments
            | Error::TextSegmentCount
            | Error::SegmentOrder
            | Error::MissingMain
            | Error::MaxCyclesExceeded
            | Error::NoInstructionAtAddress(_) => None,
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo::from(self)
    }
}

/// Wire shape of an error, `{code, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u32,
    pub message: String,
}

impl From<&Error> for ErrorInfo {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}
