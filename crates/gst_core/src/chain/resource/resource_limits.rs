use gst_chainbase::ChainbaseObject;
use gst_proc_macros::{NumBytes, Read, Write};
use gst_serialization::Write;

use crate::chain::name::Name;

/// Per-account resource entitlements. A negative value means the account is
/// not limited for that resource. Rows with `pending = true` stage a limit
/// change until the next block boundary collapses them into the committed
/// row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Read, Write, NumBytes)]
pub struct ResourceLimits {
    pub owner: Name,
    pub pending: bool,
    pub net_weight: i64,
    pub cpu_weight: i64,
    pub ram_bytes: i64,
}

impl ResourceLimits {
    pub fn new(owner: Name, pending: bool, net_weight: i64, cpu_weight: i64, ram_bytes: i64) -> Self {
        ResourceLimits {
            owner,
            pending,
            net_weight,
            cpu_weight,
            ram_bytes,
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        ResourceLimits {
            owner: Name::default(),
            pending: false,
            net_weight: -1,
            cpu_weight: -1,
            ram_bytes: -1,
        }
    }
}

impl ChainbaseObject for ResourceLimits {
    type PrimaryKey = (bool, Name);

    fn primary_key(&self) -> Vec<u8> {
        ResourceLimits::primary_key_to_bytes((self.pending, self.owner))
    }

    fn primary_key_to_bytes(key: Self::PrimaryKey) -> Vec<u8> {
        key.pack().unwrap()
    }

    fn table_name() -> &'static str {
        "resource_limits"
    }
}
