use snafu::prelude::*;
use uuid::Uuid;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OcrdeskError {
    #[snafu(display(
        "Project revision {} is incompatible with {}, file cannot be loaded",
        found,
        expected
    ))]
    Revision { found: i16, expected: i16 },
    #[snafu(display("Project data truncated while reading `{}`", stage))]
    Truncated { stage: String },
    #[snafu(display("Project decode error at `{}`: {}", stage, message))]
    Decode { stage: String, message: String },
    #[snafu(display("Read/write `{}` error: {}", path, source))]
    Io {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Region {} no longer exists", id))]
    RegionNotFound { id: Uuid },
    #[snafu(display("Undo history corrupted by `{}`: {}", command, message))]
    StackCorrupted { command: String, message: String },
    #[snafu(display("OCR engine error during `{}`: {}", stage, message))]
    Engine { stage: String, message: String },
    #[snafu(display("Recognition result channel closed"))]
    ChannelClosed,
}
