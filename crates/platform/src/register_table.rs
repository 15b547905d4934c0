//! Declarative register configuration tables.
//!
//! A table is an ordered list of `(address, value)` pairs applied one write at
//! a time. Order is significant (enables come after the fields they gate) and
//! application stops at the first failing write; entries already written stay
//! written.

use crate::codec::{CodecError, RegisterBus};

/// One register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterConfigEntry {
    /// Register address.
    pub address: u32,
    /// Full register value.
    pub value: u32,
}

impl RegisterConfigEntry {
    /// Create an entry.
    pub const fn new(address: u32, value: u32) -> Self {
        Self { address, value }
    }
}

/// Borrowed, immutable, ordered register table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterConfigTable<'a>(&'a [RegisterConfigEntry]);

impl<'a> RegisterConfigTable<'a> {
    /// Wrap a slice of entries.
    pub const fn new(entries: &'a [RegisterConfigEntry]) -> Self {
        Self(entries)
    }

    /// Entries in application order.
    pub const fn entries(&self) -> &'a [RegisterConfigEntry] {
        self.0
    }

    /// Number of entries.
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the table has no entries.
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Failure while applying a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TableWriteError {
    /// Zero-based index of the entry that failed.
    pub index: usize,
    /// Address of the entry that failed.
    pub address: u32,
    /// Underlying error.
    pub error: CodecError,
}

/// Write every entry of `table` to `bus` in order.
///
/// Entries after the first failure are not attempted.
pub async fn write_table<B: RegisterBus>(
    bus: &mut B,
    table: RegisterConfigTable<'_>,
) -> Result<(), TableWriteError> {
    for (index, entry) in table.entries().iter().enumerate() {
        bus.write_register(entry.address, entry.value)
            .await
            .map_err(|error| TableWriteError {
                index,
                address: entry.address,
                error,
            })?;
    }
    Ok(())
}
