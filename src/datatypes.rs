mod sections;
pub use sections::*;

/// Indices of a message in a stream and of a submessage in the message.
pub type MessageIndex = (usize, usize);

/// Positions of the sections making up one submessage in the list of all
/// sections of a stream.
///
/// `sect8` is `None` for all but the last submessage of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Grib2SubmessageIndex {
    pub(crate) message_index: MessageIndex,
    pub(crate) sect0: usize,
    pub(crate) sect1: usize,
    pub(crate) sect2: Option<usize>,
    pub(crate) sect3: usize,
    pub(crate) sect4: usize,
    pub(crate) sect5: usize,
    pub(crate) sect6: usize,
    pub(crate) sect7: usize,
    pub(crate) sect8: Option<usize>,
}
