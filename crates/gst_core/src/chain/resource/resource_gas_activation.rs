use gst_chainbase::ChainbaseObject;
use gst_proc_macros::{NumBytes, Read, Write};
use gst_serialization::Write;

use crate::chain::name::Name;

/// Gas metering switch. Absent, or present with `is_activation = false`, gas
/// accounting is off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Read, Write, NumBytes)]
pub struct ResourceGasActivation {
    pub owner: Name,
    pub pending: bool,
    pub is_activation: bool,
}

impl ChainbaseObject for ResourceGasActivation {
    type PrimaryKey = (bool, Name);

    fn primary_key(&self) -> Vec<u8> {
        ResourceGasActivation::primary_key_to_bytes((self.pending, self.owner))
    }

    fn primary_key_to_bytes(key: Self::PrimaryKey) -> Vec<u8> {
        key.pack().unwrap()
    }

    fn table_name() -> &'static str {
        "resource_gas_activation"
    }
}
