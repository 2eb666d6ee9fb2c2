// Validity filter - Decides which machines are worth drawing this cycle
use crate::domain::metric::{MachineId, MachineSnapshot, Sample};
use std::collections::BTreeMap;

/// A machine is valid when any category holds at least one non-null reading.
pub fn has_reading(snapshot: &MachineSnapshot) -> bool {
    snapshot
        .iter()
        .any(|(_, series)| series.iter().any(Sample::is_reading))
}

#[derive(Debug, Default)]
pub struct ValidityPartition {
    pub valid: BTreeMap<MachineId, MachineSnapshot>,
    /// Machines the API reported without a single reading.
    pub unreachable: Vec<MachineId>,
}

pub fn partition_valid(snapshots: BTreeMap<MachineId, MachineSnapshot>) -> ValidityPartition {
    let mut partition = ValidityPartition::default();
    for (machine, snapshot) in snapshots {
        if has_reading(&snapshot) {
            partition.valid.insert(machine, snapshot);
        } else {
            partition.unreachable.push(machine);
        }
    }
    partition
}
