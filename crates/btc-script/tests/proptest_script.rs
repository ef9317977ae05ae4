use proptest::prelude::*;

use btc_script::chunk::{decode_script, encode_push_datas};
use btc_script::{Address, AddressType, Network, Script};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn push_data_decodes_back(parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..600), 0..6)) {
        let refs: Vec<&[u8]> = parts.iter().map(|p| p.as_slice()).collect();
        let encoded = encode_push_datas(&refs).unwrap();
        let chunks = decode_script(&encoded).unwrap();
        prop_assert_eq!(chunks.len(), parts.len());
        for (chunk, part) in chunks.iter().zip(parts.iter()) {
            prop_assert_eq!(chunk.data.as_ref(), Some(part));
        }
    }

    #[test]
    fn script_hex_roundtrip(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let script = Script::from_bytes(&data);
        let script2 = Script::from_hex(&script.to_hex()).unwrap();
        prop_assert_eq!(script.to_bytes(), script2.to_bytes());
    }

    #[test]
    fn key_hash_address_matches_script(hash in any::<[u8; 20]>(), testnet in any::<bool>()) {
        let network = if testnet { Network::Testnet } else { Network::Mainnet };
        for kind in [AddressType::PayToPublicKeyHash, AddressType::PayToScriptHash, AddressType::PayToWitnessPublicKeyHash] {
            let addr = Address::new(kind, &hash, network).unwrap();
            let parsed = Address::from_string(&addr.to_string()).unwrap();
            prop_assert_eq!(&parsed, &addr);
            prop_assert_eq!(Address::from_script(&addr.to_script(), network).unwrap(), addr);
        }
    }

    #[test]
    fn classifiers_are_exclusive(hash in any::<[u8; 20]>()) {
        let scripts = [
            Script::build_public_key_hash_out(&hash),
            Script::build_script_hash_out_from_hash(&hash),
            Script::build_witness_public_key_hash_out(&hash),
        ];
        for script in &scripts {
            let hits = [
                script.is_public_key_hash_out(),
                script.is_script_hash_out(),
                script.is_witness_public_key_hash_out(),
                script.is_witness_script_hash_out(),
                script.is_taproot_out(),
                script.is_multisig_out(),
                script.is_data_out(),
            ];
            prop_assert_eq!(hits.iter().filter(|h| **h).count(), 1);
        }
    }
}
