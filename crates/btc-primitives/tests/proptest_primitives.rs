use proptest::prelude::*;

use btc_primitives::chainhash::Hash;
use btc_primitives::ec::private_key::PrivateKey;
use btc_primitives::hash::sha256;
use btc_primitives::schnorr;
use btc_primitives::util::{VarInt, WireReader, WireWriter};
use btc_primitives::Network;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn wif_roundtrip_on_every_network(
        seed in prop::array::uniform32(any::<u8>()),
        testnet in any::<bool>()
    ) {
        // Not all 32-byte arrays are valid private keys (must be < curve order, nonzero).
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let network = if testnet { Network::Testnet } else { Network::Mainnet };
            let pk = pk.with_network(network);
            let back = PrivateKey::from_wif(&pk.to_wif()).unwrap();
            prop_assert_eq!(back.network(), network);
            prop_assert_eq!(back.to_hex(), pk.to_hex());
        }
    }

    #[test]
    fn ecdsa_sign_verify_roundtrip(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let digest = sha256(&msg);
            let sig = pk.sign(&digest).unwrap();
            prop_assert!(sig.is_low_s());
            prop_assert!(pk.pub_key().verify(&digest, &sig));
        }
    }

    #[test]
    fn tweaked_schnorr_signature_verifies(seed in prop::array::uniform32(any::<u8>())) {
        if let Ok(pk) = PrivateKey::from_bytes(&seed) {
            let msg = sha256(&seed);
            let sig = pk.sign_schnorr_tweaked(&msg).unwrap();
            let output_key = schnorr::tweak_public_key(&pk.pub_key(), None).unwrap();
            prop_assert!(schnorr::verify(&output_key, &msg, &sig));
        }
    }

    #[test]
    fn hash_hex_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = Hash::new(bytes);
        let hash2 = Hash::from_hex(&hash.to_string()).unwrap();
        prop_assert_eq!(hash.as_bytes(), hash2.as_bytes());
    }

    #[test]
    fn varint_reads_back(value in any::<u64>()) {
        let mut writer = WireWriter::new();
        writer.write_varint(VarInt(value));
        prop_assert_eq!(writer.len(), VarInt(value).length());
        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        prop_assert_eq!(reader.read_varint().unwrap(), VarInt(value));
        prop_assert_eq!(reader.remaining(), 0);
    }
}
