//! Error types used by the backends shipped with this crate.
//!
//! [`TaggedAllocator`](crate::TaggedAllocator) itself never produces an error
//! of its own. It returns whatever [`System::Error`](crate::System::Error) the
//! resolved backend reports, so custom backends are free to use their own
//! error type.

use core::fmt::Display;

/// [`core::result::Result`] with [`Error`] as the error type.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
/// An error returned by one of the backends in this crate.
pub enum Error {
    /// The underlying memory space could not satisfy the request.
    OutOfMemory,
    /// The requested size, including any bookkeeping, does not form a valid
    /// layout.
    SizeOverflow,
    /// A fixed-size arena has no room left for the request.
    Exhausted,
    /// Unknown error, returned by a backend.
    Other(&'static str),
}
impl Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::SizeOverflow => write!(f, "the requested size overflows the address space"),
            Self::Exhausted => write!(f, "the arena is exhausted"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}
