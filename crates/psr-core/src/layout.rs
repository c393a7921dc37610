//! Floor layout: which tables and slots exist and which console each one hosts.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::types::{ConsoleType, SlotId, TableId};

/// Physical arrangement of the rental floor.
///
/// Tables are numbered in one contiguous block per console type, PS4 first.
/// Slots alternate PS4, PS5, PS4, ... starting from slot 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorLayout {
    /// Number of bookable tables per console type.
    pub tables_per_console: u32,

    /// Number of console slots running live sessions.
    pub slots: u32,
}

impl Default for FloorLayout {
    fn default() -> Self {
        Self {
            tables_per_console: 4,
            slots: 8,
        }
    }
}

impl FloorLayout {
    /// Table numbers reserved for the given console type.
    #[must_use]
    pub const fn table_range(&self, console: ConsoleType) -> RangeInclusive<u32> {
        let n = self.tables_per_console;
        match console {
            ConsoleType::Ps4 => 1..=n,
            ConsoleType::Ps5 => (n + 1)..=(2 * n),
        }
    }

    /// Console type owning a table, or `None` when the table does not exist.
    #[must_use]
    pub fn console_for_table(&self, table: TableId) -> Option<ConsoleType> {
        ConsoleType::ALL
            .into_iter()
            .find(|console| self.table_range(*console).contains(&table.0))
    }

    /// Console installed at a slot, or `None` when the slot does not exist.
    #[must_use]
    pub const fn slot_console(&self, slot: SlotId) -> Option<ConsoleType> {
        if slot.0 == 0 || slot.0 > self.slots {
            return None;
        }
        if slot.0 % 2 == 1 {
            Some(ConsoleType::Ps4)
        } else {
            Some(ConsoleType::Ps5)
        }
    }

    /// All slots in ascending order with their console type.
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, ConsoleType)> + '_ {
        (1..=self.slots).filter_map(|n| {
            let slot = SlotId(n);
            self.slot_console(slot).map(|console| (slot, console))
        })
    }
}
