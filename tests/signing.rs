//! End-to-end signing against blobs produced independently of this crate.

use rstest::rstest;
use serde_json::json;

use xrp_codec::{
    AccountId, IssuedAmount, KeyPair, Memo, Payment, Transaction, TransactionKind,
    TransactionType, TrustSet, XrpAmount,
};

const ED25519_SECRET: &str = "sEdSKaCy2JT7JaM7v95H9SxkhP9wS2r";
const SECP256K1_SECRET: &str = "snoPBrXtMeMyMHUVTgbuqAfg1SUTb";

const PAYMENT_SIGNATURE: &str = "8BA9A58DC61EAFDCACFAFA1686C3CEB6A975682DBD8EF5B0DB5049F8012BED23\
75182B43E20F3B027171E25F4E5F819975954D036D55BCA1D5F0A62C0DD5DA0F";
const PAYMENT_BLOB: &str = "120000228000000024000000072E00003039201B000003E86140000000000F4240\
68400000000000000C7321ED01FA53FA5A7E77798F882ECE20B1ABC00BB358A9E55A202D0D0676BD0CE37A63\
74408BA9A58DC61EAFDCACFAFA1686C3CEB6A975682DBD8EF5B0DB5049F8012BED2375182B43E20F3B027171\
E25F4E5F819975954D036D55BCA1D5F0A62C0DD5DA0F8114D28B177E48D9A8D057E70F7E464B498367281B98\
8314B5F762798A53D543A014CAF8B297CFF8F2F937E8F9EA7D0568656C6C6FE1F1";
const PAYMENT_HASH: &str = "FB8B2E1423FE690F1FDBF4AAEFB39AE9FC257DA90D59B753A3609F17F8AFFF55";

const TRUST_SET_BLOB: &str = "12001422000200002400000003201B000001F463D5038D7EA4C68000\
00000000000000000000000055534400000000008049717CC948789F32F267ADC2582484E3DFA698\
68400000000000000A73210330E7FC9D56BB25D6893BA3F317AE5BCF33B3291BD63DB32654A313222F7FD020\
74473045022100A43952EE13E6E3698FD8DD4AEFFF721AB1AEDCC18717FC27C4DBA5BEA652223502207B1502\
1AABF527228C2E9E2D505DCDB45590EFE60A0132C91A730927C6FCA6398114B5F762798A53D543A014CAF8B2\
97CFF8F2F937E8";
const TRUST_SET_HASH: &str = "9ECF9643642EC7D8F602505865749FECFB3560FE9AE6E97B1E8D4DB8822125B9";

fn account(address: &str) -> AccountId {
    address.parse().unwrap()
}

fn payment(key_pair: &KeyPair) -> Transaction {
    let mut payment = Payment::new(
        account("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"),
        XrpAmount::from_drops(1_000_000).unwrap().into(),
    );
    payment.destination_tag = Some(12345);

    let mut tx = Transaction::new(key_pair.account_id(), payment);
    tx.common.flags = Some(0x8000_0000);
    tx.common.sequence = Some(7);
    tx.common.last_ledger_sequence = Some(1000);
    tx.common.fee = Some(XrpAmount::from_drops(12).unwrap());
    tx.common.memos.push(Memo {
        memo_data: Some(b"hello".to_vec()),
        ..Memo::default()
    });
    tx
}

fn trust_set(key_pair: &KeyPair) -> Transaction {
    let limit = IssuedAmount::new(
        "100".parse().unwrap(),
        "USD".parse().unwrap(),
        account("rU6K7V3Po4snVhBBaU29sesqs2qTQJWDw1"),
    )
    .unwrap();
    let mut tx = Transaction::new(
        key_pair.account_id(),
        TrustSet {
            limit_amount: limit,
            quality_in: None,
            quality_out: None,
        },
    );
    tx.common.flags = Some(0x0002_0000);
    tx.common.sequence = Some(3);
    tx.common.last_ledger_sequence = Some(500);
    tx.common.fee = Some(XrpAmount::from_drops(10).unwrap());
    tx
}

#[test]
fn ed25519_payment_matches_reference_blob() {
    let key_pair = KeyPair::from_secret(ED25519_SECRET).unwrap();
    assert_eq!(
        key_pair.account_id().to_string(),
        "rLUEXYuLiQptky37CqLcm9USQpPiz5rkpD"
    );

    let mut tx = payment(&key_pair);
    let signed = tx.sign(&key_pair).unwrap();

    assert_eq!(
        hex::encode_upper(tx.common.txn_signature.as_ref().unwrap()),
        PAYMENT_SIGNATURE
    );
    assert_eq!(signed.blob_hex(), PAYMENT_BLOB);
    assert_eq!(signed.hash.to_string(), PAYMENT_HASH);
}

#[test]
fn secp256k1_trust_set_matches_reference_blob() {
    let key_pair = KeyPair::from_secret(SECP256K1_SECRET).unwrap();
    let mut tx = trust_set(&key_pair);
    let signed = tx.sign(&key_pair).unwrap();

    assert_eq!(signed.blob_hex(), TRUST_SET_BLOB);
    assert_eq!(signed.hash.to_string(), TRUST_SET_HASH);
}

#[rstest]
#[case::ed25519_payment(PAYMENT_BLOB, PAYMENT_HASH, TransactionType::Payment)]
#[case::secp256k1_trust_set(TRUST_SET_BLOB, TRUST_SET_HASH, TransactionType::TrustSet)]
fn reference_blobs_decode_and_verify(
    #[case] blob: &str,
    #[case] hash: &str,
    #[case] tx_type: TransactionType,
) {
    let bytes = hex::decode(blob).unwrap();
    let tx = Transaction::from_bytes(&bytes).unwrap();

    assert_eq!(tx.transaction_type(), tx_type);
    assert!(tx.verify_signature().unwrap());
    assert_eq!(tx.hash().unwrap().to_string(), hash);
    assert_eq!(tx.to_bytes().unwrap(), bytes);
}

#[test]
fn decoded_payment_matches_model() {
    let key_pair = KeyPair::from_secret(ED25519_SECRET).unwrap();
    let mut expected = payment(&key_pair);
    expected.sign(&key_pair).unwrap();

    let decoded = Transaction::from_bytes(&hex::decode(PAYMENT_BLOB).unwrap()).unwrap();
    assert_eq!(decoded, expected);
    assert_eq!(decoded.common.memos[0].memo_data.as_deref(), Some(&b"hello"[..]));
}

#[test]
fn decoded_trust_set_keeps_issued_limit() {
    let tx = Transaction::from_bytes(&hex::decode(TRUST_SET_BLOB).unwrap()).unwrap();
    let TransactionKind::TrustSet(trust_set) = &tx.kind else {
        panic!("expected TrustSet, got {:?}", tx.kind);
    };
    assert_eq!(trust_set.limit_amount.value().to_string(), "100");
    assert_eq!(trust_set.limit_amount.currency().to_string(), "USD");
    assert_eq!(
        trust_set.limit_amount.issuer().to_string(),
        "rU6K7V3Po4snVhBBaU29sesqs2qTQJWDw1"
    );
}

#[test]
fn signing_serialization_omits_signature() {
    let key_pair = KeyPair::from_secret(ED25519_SECRET).unwrap();
    let mut tx = payment(&key_pair);
    tx.sign(&key_pair).unwrap();

    let for_signing = tx.serialize(true).unwrap();
    let full = tx.serialize(false).unwrap();
    assert_eq!(full.len(), for_signing.len() + 2 + 64);
    assert!(!hex::encode_upper(&for_signing).contains(PAYMENT_SIGNATURE));
    assert_eq!(&tx.signing_data().unwrap()[4..], &for_signing[..]);
}

#[test]
fn tx_json_signs_to_reference_blob() {
    let tx_json = json!({
        "TransactionType": "Payment",
        "Account": "rLUEXYuLiQptky37CqLcm9USQpPiz5rkpD",
        "Destination": "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh",
        "DestinationTag": 12345,
        "Amount": "1000000",
        "Fee": "12",
        "Flags": 2147483648u32,
        "Sequence": 7,
        "LastLedgerSequence": 1000,
        "Memos": [{"Memo": {"MemoData": "68656C6C6F"}}],
    });
    let key_pair = KeyPair::from_secret(ED25519_SECRET).unwrap();
    let mut tx = Transaction::from_json(&tx_json).unwrap();
    let signed = tx.sign(&key_pair).unwrap();
    assert_eq!(signed.blob_hex(), PAYMENT_BLOB);

    let round_trip = tx.to_json();
    assert_eq!(round_trip["TxnSignature"], PAYMENT_SIGNATURE);
    assert_eq!(round_trip["SigningPubKey"], key_pair.public_key_hex());
}

#[test]
fn multisigned_trust_set_with_mixed_key_types() {
    let source = KeyPair::from_secret(SECP256K1_SECRET).unwrap();
    let ed = KeyPair::from_secret(ED25519_SECRET).unwrap();
    let secp = KeyPair::from_secret("sp5fghtJtpUorTwvof1NpDXAzNwf5").unwrap();

    let mut tx = trust_set(&source);
    let signers = vec![
        tx.multisign(&ed, ed.account_id()).unwrap(),
        tx.multisign(&secp, secp.account_id()).unwrap(),
    ];
    let signed = tx.combine_signers(signers).unwrap();

    let decoded = Transaction::from_bytes(&signed.blob).unwrap();
    assert_eq!(decoded.common.signers.len(), 2);
    assert!(decoded.common.signing_pub_key.is_empty());
    assert!(decoded.verify_signature().unwrap());
    assert_eq!(decoded.hash().unwrap(), signed.hash);

    // A signature made for one account does not verify for another.
    let mut swapped = decoded.clone();
    swapped.common.signers[0].account = source.account_id();
    assert!(!swapped.verify_signature().unwrap());
}

#[test]
fn serializing_without_fee_fails() {
    let key_pair = KeyPair::from_secret(ED25519_SECRET).unwrap();
    let mut tx = payment(&key_pair);
    tx.common.fee = None;
    assert!(tx.sign(&key_pair).is_err());
    assert!(tx.common.signing_pub_key.is_empty());
    assert!(tx.common.txn_signature.is_none());
    assert!(matches!(
        tx.to_bytes().unwrap_err(),
        xrp_codec::XrpError::ProtocolMismatch(_)
    ));
}
