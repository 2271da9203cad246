use super::*;

/// Upstream node interface. The registry polls it for fresh work and
/// the validator hands it solved blocks.
#[async_trait]
pub trait DaemonRpc: Send + Sync + 'static {
    async fn get_block_template(&self) -> Result<RawBlockTemplate>;

    /// Submits a solved block assembled from `header_hex` and the
    /// serialized transactions. Returns whether the node accepted it.
    async fn submit_block(
        &self,
        header_hex: &str,
        transactions_hex: &str,
        block_hash_hex: &str,
    ) -> Result<bool>;
}

/// The `getblocktemplate` fields template construction consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlockTemplate {
    pub height: u64,
    pub version: i32,
    pub previousblockhash: PrevHash,
    pub bits: Nbits,
    pub curtime: u32,
    pub coinbasevalue: u64,
    #[serde(default)]
    pub coinbaseaux: CoinbaseAux,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseAux {
    #[serde(default)]
    pub flags: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Raw transaction, hex encoded.
    pub data: String,
    /// Transaction hash in display order, hex encoded.
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_node_response() {
        let raw: RawBlockTemplate = serde_json::from_str(
            r#"{
              "height": 100,
              "version": 2,
              "previousblockhash": "000000000000000000000000000000000000000000000000000000000000beef",
              "bits": "00000000ffff0000",
              "curtime": 1700000000,
              "coinbasevalue": 5000000000,
              "coinbaseaux": { "flags": "deadbeef" },
              "transactions": [
                { "data": "0100", "hash": "00ff" }
              ]
            }"#,
        )
        .unwrap();

        assert_eq!(raw.height, 100);
        assert_eq!(raw.bits.value(), 0x00000000ffff0000);
        assert_eq!(raw.coinbaseaux.flags, "deadbeef");
        assert_eq!(raw.transactions.len(), 1);
    }

    #[test]
    fn aux_and_transactions_default() {
        let raw: RawBlockTemplate = serde_json::from_str(
            r#"{
              "height": 1,
              "version": 2,
              "previousblockhash": "000000000000000000000000000000000000000000000000000000000000beef",
              "bits": "00000000ffff0000",
              "curtime": 1700000000,
              "coinbasevalue": 5000000000
            }"#,
        )
        .unwrap();

        assert_eq!(raw.coinbaseaux, CoinbaseAux::default());
        assert!(raw.transactions.is_empty());
    }
}
