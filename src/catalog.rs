//! Static catalog of the per-node resource envelope each `(size, kind)`
//! fleet tier provides. The tiers mirror the instance families the fleets
//! are built from, so they change only when the infrastructure does.

use std::fmt;

use serde::Deserialize;

use crate::qty::{CpuQty, MemQty};

/// T-shirt tier of a fleet. Ordering is by capacity, `xsmall` lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    XSmall,
    Small,
    Medium,
    Large,
    XLarge,
}

impl Size {
    pub const ALL: [Size; 5] = [
        Size::XSmall,
        Size::Small,
        Size::Medium,
        Size::Large,
        Size::XLarge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Size::XSmall => "xsmall",
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
            Size::XLarge => "xlarge",
        }
    }

    /// Parses the value of a node `size` label.
    pub fn from_label(label: &str) -> Option<Size> {
        Size::ALL.into_iter().find(|s| s.as_str() == label)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a fleet's instance family is optimized for memory or CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Memory,
    Cpu,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Memory => "memory",
            Kind::Cpu => "cpu",
        }
    }

    pub fn from_label(label: &str) -> Option<Kind> {
        match label {
            "memory" => Some(Kind::Memory),
            "cpu" => Some(Kind::Cpu),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-node CPU and memory envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeShape {
    pub cpu: CpuQty,
    pub memory: MemQty,
}

impl NodeShape {
    /// Schedulable capacity once the global reservation is taken off the
    /// nominal envelope. Saturates at zero; a zeroed dimension makes the
    /// shape degenerate and the planner warns about it.
    pub fn minus_reserved(self, cpu: CpuQty, memory: MemQty) -> NodeShape {
        NodeShape {
            cpu: self.cpu.saturating_sub(cpu),
            memory: self.memory.saturating_sub(memory),
        }
    }

    pub fn over_subscribed(self, basis_points: u32) -> NodeShape {
        NodeShape {
            cpu: self.cpu.over_subscribed(basis_points),
            memory: self.memory.over_subscribed(basis_points),
        }
    }

    pub fn is_degenerate(self) -> bool {
        self.cpu.is_zero() || self.memory.is_zero()
    }

    /// True when one node of this shape hosts the given demand with margin
    /// to spare in both dimensions.
    pub fn exceeds(self, cpu: CpuQty, memory: MemQty) -> bool {
        self.cpu > cpu && self.memory > memory
    }
}

fn shape(cores: u64, mebibytes: u64) -> NodeShape {
    NodeShape {
        cpu: CpuQty::from_cores(cores),
        memory: MemQty::from_mebibytes(mebibytes),
    }
}

/// Nominal per-node envelope for a tier, before reservation. Memory tiers
/// step in quarter-Gi increments, hence the Mi granularity.
pub fn node_shape(size: Size, kind: Kind) -> NodeShape {
    match (kind, size) {
        (Kind::Memory, Size::XSmall) => shape(2, 15_616),   // 15.25Gi
        (Kind::Memory, Size::Small) => shape(4, 31_232),    // 30.5Gi
        (Kind::Memory, Size::Medium) => shape(8, 62_464),   // 61Gi
        (Kind::Memory, Size::Large) => shape(16, 124_928),  // 122Gi
        (Kind::Memory, Size::XLarge) => shape(32, 249_856), // 244Gi
        (Kind::Cpu, Size::XSmall) => shape(4, 7_680),       // 7.5Gi
        (Kind::Cpu, Size::Small) => shape(8, 15_360),       // 15Gi
        (Kind::Cpu, Size::Medium) => shape(16, 30_720),     // 30Gi
        (Kind::Cpu, Size::Large) => shape(36, 61_440),      // 60Gi
        (Kind::Cpu, Size::XLarge) => shape(64, 147_456),    // 144Gi
    }
}
