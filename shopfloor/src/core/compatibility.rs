//! Which machine types can run which operation types

use shared::{MachineType, OperationType};

/// Turning machines only turn; a 4-axis mill also takes 3-axis work; a
/// 3-axis mill only 3-axis work. Anything unmapped is incompatible.
pub fn is_compatible(machine_type: MachineType, operation_type: OperationType) -> bool {
    matches!(
        (machine_type, operation_type),
        (MachineType::Turning, OperationType::Turning)
            | (MachineType::Milling4Axis, OperationType::Milling3Axis | OperationType::Milling4Axis)
            | (MachineType::Milling3Axis, OperationType::Milling3Axis)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turning_only_takes_turning() {
        assert!(is_compatible(MachineType::Turning, OperationType::Turning));
        assert!(!is_compatible(MachineType::Turning, OperationType::Milling3Axis));
        assert!(!is_compatible(MachineType::Turning, OperationType::Milling4Axis));
    }

    #[test]
    fn test_milling_axes() {
        assert!(is_compatible(MachineType::Milling4Axis, OperationType::Milling3Axis));
        assert!(is_compatible(MachineType::Milling4Axis, OperationType::Milling4Axis));
        assert!(is_compatible(MachineType::Milling3Axis, OperationType::Milling3Axis));
        assert!(!is_compatible(MachineType::Milling3Axis, OperationType::Milling4Axis));
        assert!(!is_compatible(MachineType::Milling4Axis, OperationType::Turning));
    }

    #[test]
    fn test_unknown_is_never_compatible() {
        assert!(!is_compatible(MachineType::Unknown, OperationType::Turning));
        assert!(!is_compatible(MachineType::Turning, OperationType::Unknown));
        assert!(!is_compatible(MachineType::Unknown, OperationType::Unknown));
    }
}
