use super::*;

/// Maximum coinbase scriptSig length accepted by consensus rules.
const MAX_SCRIPT_SIG_LEN: usize = 100;

/// Decides where the block reward goes.
pub trait Coinbaser: Send + Sync + 'static {
    /// Output scripts and the value assigned to each, in satoshis.
    fn outputs(&self, value: u64) -> Vec<(u64, Vec<u8>)>;
}

/// Pays the whole reward to one fixed script.
#[derive(Debug, Clone)]
pub struct ScriptCoinbaser {
    script_pubkey: Vec<u8>,
}

impl ScriptCoinbaser {
    pub fn new(script_pubkey: Vec<u8>) -> Self {
        Self { script_pubkey }
    }
}

impl Coinbaser for ScriptCoinbaser {
    fn outputs(&self, value: u64) -> Vec<(u64, Vec<u8>)> {
        vec![(value, self.script_pubkey.clone())]
    }
}

/// Assembles the coinbase transaction for one template.
///
/// The serialization is split around the extranonce slot so shares can
/// be checked by splicing their extranonce into the prebuilt parts.
pub struct CoinbaseBuilder<'a> {
    height: u64,
    value: u64,
    coinbaser: &'a dyn Coinbaser,
    aux_flags: String,
    extras: String,
    timestamp: u64,
}

impl<'a> CoinbaseBuilder<'a> {
    pub fn new(height: u64, value: u64, coinbaser: &'a dyn Coinbaser) -> Self {
        Self {
            height,
            value,
            coinbaser,
            aux_flags: String::new(),
            extras: String::new(),
            timestamp: 0,
        }
    }

    pub fn aux_flags(mut self, flags: &str) -> Self {
        self.aux_flags = flags.into();
        self
    }

    pub fn extras(mut self, extras: &str) -> Self {
        self.extras = extras.into();
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn build(self) -> Result<CoinbaseTemplate> {
        let flags = hex::decode(&self.aux_flags)?;

        let mut script_prefix = Vec::new();
        push_scriptint(&mut script_prefix, i64::try_from(self.height)?);
        script_prefix.extend_from_slice(&flags);
        push_scriptint(&mut script_prefix, i64::try_from(self.timestamp)?);
        script_prefix.push(EXTRANONCE_SIZE as u8);

        let mut script_suffix = Vec::new();
        script_suffix
            .extend_from_slice(&consensus_serialize(&VarInt(self.extras.len() as u64)));
        script_suffix.extend_from_slice(self.extras.as_bytes());

        let script_len = script_prefix.len() + EXTRANONCE_SIZE + script_suffix.len();
        ensure!(
            script_len <= MAX_SCRIPT_SIG_LEN,
            "coinbase scriptSig length {script_len} exceeds {MAX_SCRIPT_SIG_LEN} bytes",
        );

        let outputs = self.coinbaser.outputs(self.value);
        ensure!(!outputs.is_empty(), "coinbaser produced no outputs");

        let mut prefix = Vec::new();
        prefix.extend_from_slice(&1i32.to_le_bytes());
        prefix.extend_from_slice(&consensus_serialize(&VarInt(1)));
        prefix.extend_from_slice(&[0u8; 32]);
        prefix.extend_from_slice(&u32::MAX.to_le_bytes());
        prefix.extend_from_slice(&consensus_serialize(&VarInt(script_len as u64)));
        prefix.extend_from_slice(&script_prefix);

        let mut suffix = script_suffix;
        suffix.extend_from_slice(&0u32.to_le_bytes());
        suffix.extend_from_slice(&consensus_serialize(&VarInt(outputs.len() as u64)));

        for (value, script_pubkey) in outputs {
            suffix.extend_from_slice(&value.to_le_bytes());
            suffix.extend_from_slice(&consensus_serialize(&VarInt(script_pubkey.len() as u64)));
            suffix.extend_from_slice(&script_pubkey);
        }

        suffix.extend_from_slice(&0u32.to_le_bytes());

        Ok(CoinbaseTemplate { prefix, suffix })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoinbaseTemplate {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl CoinbaseTemplate {
    pub fn serialize(&self, extranonce1: &Extranonce, extranonce2: &Extranonce) -> Result<Vec<u8>> {
        let width = extranonce1.len() + extranonce2.len();
        ensure!(
            width == EXTRANONCE_SIZE,
            "extranonce width {width} does not fill the {EXTRANONCE_SIZE} byte slot",
        );

        let mut serialized =
            Vec::with_capacity(self.prefix.len() + EXTRANONCE_SIZE + self.suffix.len());
        serialized.extend_from_slice(&self.prefix);
        serialized.extend_from_slice(extranonce1.as_bytes());
        serialized.extend_from_slice(extranonce2.as_bytes());
        serialized.extend_from_slice(&self.suffix);

        Ok(serialized)
    }

    /// Transaction hash in internal byte order.
    pub fn hash(&self, extranonce1: &Extranonce, extranonce2: &Extranonce) -> Result<[u8; 32]> {
        Ok(sha256d::Hash::hash(&self.serialize(extranonce1, extranonce2)?).to_byte_array())
    }
}

fn push_scriptint(script: &mut Vec<u8>, n: i64) {
    let mut buffer = [0u8; 8];
    let len = write_scriptint(&mut buffer, n);
    script.push(len as u8);
    script.extend_from_slice(&buffer[..len]);
}
