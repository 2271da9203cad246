use super::*;

/// Non-coinbase template transaction, kept in wire form for block
/// assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTx {
    pub data: Vec<u8>,
    /// Transaction hash in internal byte order.
    pub hash: [u8; 32],
}

impl RawTx {
    fn parse(raw: &daemon::RawTransaction) -> Result<Self> {
        let mut hash =
            <[u8; 32]>::try_from(hex::decode(&raw.hash)?.as_slice()).map_err(|_| {
                anyhow::anyhow!("transaction hash '{}' is not 32 bytes", raw.hash)
            })?;
        hash.reverse();

        Ok(Self {
            data: hex::decode(&raw.data)?,
            hash,
        })
    }
}

/// Job announcement fields, each already in the hex form the wire
/// protocol carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Broadcast {
    pub job_id: JobId,
    pub prevhash: String,
    pub version: String,
    pub nbits: String,
    pub ntime: String,
    pub clean_jobs: bool,
}

impl Broadcast {
    /// Header prefix a miner grinds a nonce onto.
    pub fn work_data(&self, merkle_root_hex: &str) -> String {
        format!(
            "{}{}{}{}{}",
            self.version, self.prevhash, merkle_root_hex, self.ntime, self.nbits,
        )
    }
}

/// One unit of work derived from a `getblocktemplate` response.
///
/// Immutable after construction except for the duplicate-submit set,
/// so it can be shared behind an `Arc` between the registry and
/// in-flight share checks.
pub struct BlockTemplate {
    pub job_id: JobId,
    pub height: u64,
    pub version: i32,
    pub nbits: Nbits,
    pub curtime: u32,
    /// Offset between the node's clock and ours at build time.
    pub timedelta: i64,
    pub prevhash: PrevHash,
    pub network_target: U256,
    /// Reporting only.
    pub network_difficulty: f64,
    pub merkle_tree: MerkleTree,
    pub coinbase: CoinbaseTemplate,
    pub transactions: Vec<RawTx>,
    submits: Mutex<HashSet<String>>,
}

impl BlockTemplate {
    pub fn build(
        raw: &RawBlockTemplate,
        job_id: JobId,
        now: u64,
        coinbaser: &dyn Coinbaser,
        extras: &str,
    ) -> Result<Self> {
        let transactions = raw
            .transactions
            .iter()
            .map(RawTx::parse)
            .collect::<Result<Vec<RawTx>>>()?;

        let leaves = transactions.iter().map(|tx| tx.hash).collect::<Vec<_>>();

        let coinbase = CoinbaseBuilder::new(raw.height, raw.coinbasevalue, coinbaser)
            .aux_flags(&raw.coinbaseaux.flags)
            .extras(extras)
            .timestamp(now)
            .build()?;

        let network_target = U256::from(raw.bits.value());
        let network_difficulty = stratum::ratio_to_f64(network_target);

        info!(height = raw.height, network_difficulty, "built template");

        Ok(Self {
            job_id,
            height: raw.height,
            version: raw.version,
            nbits: raw.bits,
            curtime: raw.curtime,
            timedelta: i64::from(raw.curtime) - i64::try_from(now)?,
            prevhash: raw.previousblockhash,
            network_target,
            network_difficulty,
            merkle_tree: MerkleTree::new(&leaves),
            coinbase,
            transactions,
            submits: Mutex::new(HashSet::new()),
        })
    }

    pub fn broadcast(&self, clean_jobs: bool) -> Broadcast {
        Broadcast {
            job_id: self.job_id,
            prevhash: self.prevhash.reversed_hex(),
            version: hex::encode(self.version.to_le_bytes()),
            nbits: self.nbits.to_le_hex(),
            ntime: hex::encode(self.curtime.to_le_bytes()),
            clean_jobs,
        }
    }

    /// Shares may roll ntime forward from the template time, but never
    /// backward and never far past the wall clock.
    pub fn check_ntime(&self, ntime: Ntime, now: u64) -> bool {
        let ntime = u64::from(u32::from(ntime));
        ntime >= u64::from(self.curtime) && ntime <= now + MAX_NTIME_OFFSET
    }

    /// Records a submission, returning false if the identical payload
    /// was seen before on this job.
    pub fn register_submit(&self, payload: &str) -> bool {
        self.submits.lock().insert(payload.into())
    }

    /// Merkle root for this template under `extranonce1`, hex encoded
    /// in internal byte order.
    pub fn merkle_root_hex(&self, extranonce1: &Extranonce) -> Result<String> {
        let coinbase_hash = self
            .coinbase
            .hash(extranonce1, &extranonces::zero_extranonce2())?;
        Ok(hex::encode(self.merkle_tree.root_with_first(coinbase_hash)))
    }

    pub fn serialize_coinbase(&self, extranonce1: &Extranonce) -> Result<Vec<u8>> {
        self.coinbase
            .serialize(extranonce1, &extranonces::zero_extranonce2())
    }

    /// Transaction section of a solved block: count, coinbase, then
    /// the template transactions in order.
    pub fn serialize_transactions(&self, extranonce1: &Extranonce) -> Result<Vec<u8>> {
        let mut serialized =
            consensus_serialize(&VarInt(self.transactions.len() as u64 + 1));
        serialized.extend_from_slice(&self.serialize_coinbase(extranonce1)?);

        for tx in &self.transactions {
            serialized.extend_from_slice(&tx.data);
        }

        Ok(serialized)
    }
}
