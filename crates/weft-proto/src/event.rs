//! Transport-delivered event variants.

use crate::table::Table;

/// One event delivered by the transport's socket connection.
///
/// The raw socket payload is dynamically shaped; the transport decodes it
/// into this finite set of variants. Anything it cannot map arrives as
/// [`TransportEvent::Unrecognized`], which the ingestion worker logs and
/// drops without stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A publish batch carrying a state-diff table.
    Table(Box<Table>),
    /// The initial connect handshake completed; the session is live.
    ConnectionReady,
    /// An event shape the transport could not map.
    Unrecognized(String),
}
