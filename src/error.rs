use core::fmt;

/// Errors returned by [`TreeList`](crate::TreeList) and its cursors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A position outside `0..len` was accessed.
    IndexOutOfRange { index: usize, len: usize },
    /// A cursor was used after an element was removed through it.
    InvalidIterator,
    /// The operation is not supported by an append-only list.
    Unsupported(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for list of length {len}")
            }
            Error::InvalidIterator => f.write_str("cursor invalidated by a removal"),
            Error::Unsupported(op) => write!(f, "`{op}` is not supported by TreeList"),
        }
    }
}

impl std::error::Error for Error {}
