use super::*;

/// Extranonce1 is four big-endian bytes wide.
pub const EXTRANONCE1_SIZE: usize = 4;

/// Instance ids occupy the top five bits of extranonce1.
pub const MAX_INSTANCE_ID: u8 = 0x1f;

const COUNTER_BITS: u32 = 27;
const COUNTER_MASK: u32 = (1 << COUNTER_BITS) - 1;

/// Miners on this chain do not roll extranonce2; the slot is always
/// zero filled.
pub fn zero_extranonce2() -> Extranonce {
    Extranonce::from_bytes(&[0u8; EXTRANONCE_SIZE - EXTRANONCE1_SIZE])
}

/// Allocates session-unique extranonce1 values.
///
/// The instance id claims the high bits so that pool processes sharing
/// one chain never hand out overlapping coinbase space; the low 27
/// bits count subscriptions and wrap.
#[derive(Debug)]
pub struct ExtranonceCounter {
    prefix: u32,
    counter: u32,
}

impl ExtranonceCounter {
    pub fn new(instance_id: u8) -> Result<Self> {
        ensure!(
            instance_id <= MAX_INSTANCE_ID,
            "instance_id {instance_id} exceeds maximum {MAX_INSTANCE_ID}",
        );

        Ok(Self {
            prefix: u32::from(instance_id) << COUNTER_BITS,
            counter: 0,
        })
    }

    pub fn size(&self) -> usize {
        EXTRANONCE1_SIZE
    }

    /// Width left for the miner-controlled extranonce2.
    pub fn extranonce2_size(&self) -> usize {
        EXTRANONCE_SIZE - EXTRANONCE1_SIZE
    }

    pub fn next(&mut self) -> Extranonce {
        self.counter = self.counter.wrapping_add(1) & COUNTER_MASK;

        let mut bytes = [0u8; EXTRANONCE1_SIZE];
        BigEndian::write_u32(&mut bytes, self.prefix | self.counter);

        Extranonce::from_bytes(&bytes)
    }
}
