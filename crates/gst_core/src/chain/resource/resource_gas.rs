use gst_chainbase::ChainbaseObject;
use gst_proc_macros::{NumBytes, Read, Write};
use gst_serialization::Write;

use crate::chain::name::Name;

/// Per-account gas budget: `gst_bytes` is the provisioned balance (negative
/// means unlimited), `gst_usage` the bytes consumed against it. Rows live in
/// the pending keyspace; they are not collapsed at block boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Read, Write, NumBytes)]
pub struct ResourceGas {
    pub owner: Name,
    pub pending: bool,
    pub gst_bytes: i64,
    pub gst_usage: u64,
}

impl ResourceGas {
    pub fn new(owner: Name, pending: bool, gst_bytes: i64, gst_usage: u64) -> Self {
        ResourceGas {
            owner,
            pending,
            gst_bytes,
            gst_usage,
        }
    }
}

impl ChainbaseObject for ResourceGas {
    type PrimaryKey = (bool, Name);

    fn primary_key(&self) -> Vec<u8> {
        ResourceGas::primary_key_to_bytes((self.pending, self.owner))
    }

    fn primary_key_to_bytes(key: Self::PrimaryKey) -> Vec<u8> {
        key.pack().unwrap()
    }

    fn table_name() -> &'static str {
        "resource_gas"
    }
}
