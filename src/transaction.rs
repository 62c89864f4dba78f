//! Transaction model and the signing protocol.
//!
//! A transaction is built unsigned, signed once (or multi-signed), then
//! serialized into the blob that is submitted to the network:
//!
//! 1. `SigningPubKey` is set to the signer's canonical public key.
//! 2. The transaction is serialized without signatures, behind `STX\0`.
//! 3. The signature over those bytes becomes `TxnSignature`.
//! 4. The full serialization is the blob; half-SHA512 of `TXN\0 ‖ blob` is its hash.

use serde_json::{Map, Value};
use tracing::debug;

use crate::account::AccountId;
use crate::amount::{Amount, IssuedAmount, XrpAmount};
use crate::constant::{
    TRANSACTION_ID_PREFIX, TRANSACTION_MULTISIGN_PREFIX, TRANSACTION_SIGN_PREFIX,
};
use crate::encode_tx::{decode_transaction, encode_transaction};
use crate::error::{Result, XrpError};
use crate::hash::{Hash128, Hash256};
use crate::keypair::{self, KeyPair};
use crate::types::{JsonFields, Memo, Signer, SignerEntry, TransactionType};

/// Fields every transaction type shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonFields {
    pub account: AccountId,
    /// Must be set before serializing.
    pub fee: Option<XrpAmount>,
    /// Must be set before serializing.
    pub sequence: Option<u32>,
    pub network_id: Option<u32>,
    pub flags: Option<u32>,
    pub source_tag: Option<u32>,
    pub last_ledger_sequence: Option<u32>,
    pub account_txn_id: Option<Hash256>,
    /// Empty until signed, and empty for multi-signed transactions.
    pub signing_pub_key: Vec<u8>,
    pub txn_signature: Option<Vec<u8>>,
    pub memos: Vec<Memo>,
    pub signers: Vec<Signer>,
}

impl CommonFields {
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            fee: None,
            sequence: None,
            network_id: None,
            flags: None,
            source_tag: None,
            last_ledger_sequence: None,
            account_txn_id: None,
            signing_pub_key: Vec::new(),
            txn_signature: None,
            memos: Vec::new(),
            signers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub destination: AccountId,
    pub amount: Amount,
    pub destination_tag: Option<u32>,
    pub invoice_id: Option<Hash256>,
    pub send_max: Option<Amount>,
    pub deliver_min: Option<Amount>,
}

impl Payment {
    pub fn new(destination: AccountId, amount: Amount) -> Self {
        Self {
            destination,
            amount,
            destination_tag: None,
            invoice_id: None,
            send_max: None,
            deliver_min: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSet {
    pub clear_flag: Option<u32>,
    pub set_flag: Option<u32>,
    pub transfer_rate: Option<u32>,
    pub email_hash: Option<Hash128>,
    pub message_key: Option<Vec<u8>>,
    pub domain: Option<Vec<u8>>,
    pub tick_size: Option<u8>,
}

/// Assigns, or with `None` removes, the account's regular key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetRegularKey {
    pub regular_key: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferCreate {
    pub taker_pays: Amount,
    pub taker_gets: Amount,
    pub expiration: Option<u32>,
    pub offer_sequence: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferCancel {
    pub offer_sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerListSet {
    pub signer_quorum: u32,
    pub signer_entries: Vec<SignerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustSet {
    pub limit_amount: IssuedAmount,
    pub quality_in: Option<u32>,
    pub quality_out: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDelete {
    pub destination: AccountId,
    pub destination_tag: Option<u32>,
}

/// Type-specific part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Payment(Payment),
    AccountSet(AccountSet),
    SetRegularKey(SetRegularKey),
    OfferCreate(OfferCreate),
    OfferCancel(OfferCancel),
    SignerListSet(SignerListSet),
    TrustSet(TrustSet),
    AccountDelete(AccountDelete),
}

macro_rules! impl_from_kind {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for TransactionKind {
                fn from(tx: $variant) -> Self {
                    TransactionKind::$variant(tx)
                }
            }
        )*
    };
}

impl_from_kind!(
    Payment,
    AccountSet,
    SetRegularKey,
    OfferCreate,
    OfferCancel,
    SignerListSet,
    TrustSet,
    AccountDelete
);

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::Payment(_) => TransactionType::Payment,
            TransactionKind::AccountSet(_) => TransactionType::AccountSet,
            TransactionKind::SetRegularKey(_) => TransactionType::SetRegularKey,
            TransactionKind::OfferCreate(_) => TransactionType::OfferCreate,
            TransactionKind::OfferCancel(_) => TransactionType::OfferCancel,
            TransactionKind::SignerListSet(_) => TransactionType::SignerListSet,
            TransactionKind::TrustSet(_) => TransactionType::TrustSet,
            TransactionKind::AccountDelete(_) => TransactionType::AccountDelete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub common: CommonFields,
    pub kind: TransactionKind,
}

/// Network-ready output of signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Serialized transaction, without any hash prefix.
    pub blob: Vec<u8>,
    pub hash: Hash256,
}

impl SignedTransaction {
    pub fn blob_hex(&self) -> String {
        hex::encode_upper(&self.blob)
    }
}

fn transaction_hash(blob: &[u8]) -> Hash256 {
    Hash256::digest(&[&TRANSACTION_ID_PREFIX[..], blob].concat())
}

impl Transaction {
    pub fn new(account: AccountId, kind: impl Into<TransactionKind>) -> Self {
        Self {
            common: CommonFields::new(account),
            kind: kind.into(),
        }
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.kind.transaction_type()
    }

    pub fn is_signed(&self) -> bool {
        self.common.txn_signature.is_some() || !self.common.signers.is_empty()
    }

    /// Canonical serialization; `for_signing` leaves out `TxnSignature` and `Signers`.
    pub fn serialize(&self, for_signing: bool) -> Result<Vec<u8>> {
        encode_transaction(self, for_signing)
    }

    /// The blob submitted to the network.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.serialize(false)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_transaction(bytes)
    }

    /// `STX\0 ‖ serialize(for_signing)`, the bytes a single signer signs.
    pub fn signing_data(&self) -> Result<Vec<u8>> {
        Ok([&TRANSACTION_SIGN_PREFIX[..], &self.serialize(true)?].concat())
    }

    /// `SMT\0 ‖ serialize(for_signing) ‖ signer`, the bytes one multi-signer signs.
    ///
    /// Computed over the transaction with `SigningPubKey` empty, as it is
    /// submitted once the signatures are combined.
    pub fn multisigning_data(&self, signer: &AccountId) -> Result<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.common.signing_pub_key.clear();
        unsigned.common.txn_signature = None;
        unsigned.common.signers.clear();
        Ok([
            &TRANSACTION_MULTISIGN_PREFIX[..],
            &unsigned.serialize(true)?,
            signer.as_bytes(),
        ]
        .concat())
    }

    /// Half-SHA512 of `TXN\0 ‖ blob`.
    pub fn hash(&self) -> Result<Hash256> {
        Ok(transaction_hash(&self.to_bytes()?))
    }

    fn finish_signing(&self) -> Result<SignedTransaction> {
        let blob = self.to_bytes()?;
        let hash = transaction_hash(&blob);
        debug!("signed {} transaction {}", self.transaction_type(), hash);
        Ok(SignedTransaction { blob, hash })
    }

    /// Signs with a single key, filling `SigningPubKey` and `TxnSignature`.
    pub fn sign(&mut self, key_pair: &KeyPair) -> Result<SignedTransaction> {
        if !self.common.signers.is_empty() {
            return Err(XrpError::ProtocolMismatch(
                "a multi-signed transaction can not also be single signed".to_string(),
            ));
        }
        // `self` is only replaced once the signed form serializes
        let mut candidate = self.clone();
        candidate.common.signing_pub_key = key_pair.public_key().to_vec();
        candidate.common.txn_signature = None;
        let signature = key_pair.sign(&candidate.signing_data()?)?;

        candidate.common.txn_signature = Some(signature);
        let signed = candidate.finish_signing()?;
        *self = candidate;
        Ok(signed)
    }

    /// Produces one signer's contribution to a multi-signed transaction.
    ///
    /// `signer_account` is the account the signature is made for, which
    /// differs from the key's own account when a regular key signs.
    pub fn multisign(&self, key_pair: &KeyPair, signer_account: AccountId) -> Result<Signer> {
        let signature = key_pair.sign(&self.multisigning_data(&signer_account)?)?;
        Ok(Signer {
            account: signer_account,
            signing_pub_key: key_pair.public_key().to_vec(),
            txn_signature: signature,
        })
    }

    /// Installs the signers, ordered by account, and serializes the result.
    pub fn combine_signers(&mut self, mut signers: Vec<Signer>) -> Result<SignedTransaction> {
        if signers.is_empty() {
            return Err(XrpError::ProtocolMismatch(
                "at least one signer is required".to_string(),
            ));
        }
        signers.sort_by(|a, b| a.account.cmp(&b.account));
        if let Some(pair) = signers.windows(2).find(|w| w[0].account == w[1].account) {
            return Err(XrpError::ProtocolMismatch(format!(
                "{} signed more than once",
                pair[0].account
            )));
        }
        let mut candidate = self.clone();
        candidate.common.signing_pub_key.clear();
        candidate.common.txn_signature = None;
        candidate.common.signers = signers;
        let signed = candidate.finish_signing()?;
        *self = candidate;
        Ok(signed)
    }

    /// Checks the single signature, or every multi-signature, against this transaction.
    pub fn verify_signature(&self) -> Result<bool> {
        if self.common.signers.is_empty() {
            let Some(signature) = &self.common.txn_signature else {
                return Ok(false);
            };
            if self.common.signing_pub_key.is_empty() {
                return Ok(false);
            }
            return keypair::verify(
                &self.common.signing_pub_key,
                &self.signing_data()?,
                signature,
            );
        }

        for signer in &self.common.signers {
            let data = self.multisigning_data(&signer.account)?;
            if !keypair::verify(&signer.signing_pub_key, &data, &signer.txn_signature)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// rippled `tx_json` form.
    pub fn to_json(&self) -> Value {
        let mut tx = Map::new();
        let c = &self.common;
        let mut put = |key: &str, value: Value| {
            tx.insert(key.to_string(), value);
        };

        put("TransactionType", self.transaction_type().name().into());
        put("Account", c.account.to_string().into());
        if let Some(fee) = c.fee {
            put("Fee", Amount::Xrp(fee).to_json());
        }
        if let Some(sequence) = c.sequence {
            put("Sequence", sequence.into());
        }
        for (key, value) in [
            ("NetworkID", c.network_id),
            ("Flags", c.flags),
            ("SourceTag", c.source_tag),
            ("LastLedgerSequence", c.last_ledger_sequence),
        ] {
            if let Some(value) = value {
                put(key, value.into());
            }
        }
        if let Some(id) = &c.account_txn_id {
            put("AccountTxnID", id.to_string().into());
        }
        put("SigningPubKey", hex::encode_upper(&c.signing_pub_key).into());
        if let Some(signature) = &c.txn_signature {
            put("TxnSignature", hex::encode_upper(signature).into());
        }
        if !c.memos.is_empty() {
            put("Memos", c.memos.iter().map(Memo::to_json).collect());
        }
        if !c.signers.is_empty() {
            put("Signers", c.signers.iter().map(Signer::to_json).collect());
        }

        match &self.kind {
            TransactionKind::Payment(p) => {
                put("Destination", p.destination.to_string().into());
                put("Amount", p.amount.to_json());
                if let Some(tag) = p.destination_tag {
                    put("DestinationTag", tag.into());
                }
                if let Some(id) = &p.invoice_id {
                    put("InvoiceID", id.to_string().into());
                }
                if let Some(send_max) = &p.send_max {
                    put("SendMax", send_max.to_json());
                }
                if let Some(deliver_min) = &p.deliver_min {
                    put("DeliverMin", deliver_min.to_json());
                }
            }
            TransactionKind::AccountSet(a) => {
                for (key, value) in [
                    ("ClearFlag", a.clear_flag),
                    ("SetFlag", a.set_flag),
                    ("TransferRate", a.transfer_rate),
                ] {
                    if let Some(value) = value {
                        put(key, value.into());
                    }
                }
                if let Some(email_hash) = &a.email_hash {
                    put("EmailHash", email_hash.to_string().into());
                }
                if let Some(message_key) = &a.message_key {
                    put("MessageKey", hex::encode_upper(message_key).into());
                }
                if let Some(domain) = &a.domain {
                    put("Domain", hex::encode_upper(domain).into());
                }
                if let Some(tick_size) = a.tick_size {
                    put("TickSize", tick_size.into());
                }
            }
            TransactionKind::SetRegularKey(s) => {
                if let Some(regular_key) = &s.regular_key {
                    put("RegularKey", regular_key.to_string().into());
                }
            }
            TransactionKind::OfferCreate(o) => {
                put("TakerPays", o.taker_pays.to_json());
                put("TakerGets", o.taker_gets.to_json());
                if let Some(expiration) = o.expiration {
                    put("Expiration", expiration.into());
                }
                if let Some(offer_sequence) = o.offer_sequence {
                    put("OfferSequence", offer_sequence.into());
                }
            }
            TransactionKind::OfferCancel(o) => {
                put("OfferSequence", o.offer_sequence.into());
            }
            TransactionKind::SignerListSet(s) => {
                put("SignerQuorum", s.signer_quorum.into());
                if !s.signer_entries.is_empty() {
                    put(
                        "SignerEntries",
                        s.signer_entries.iter().map(SignerEntry::to_json).collect(),
                    );
                }
            }
            TransactionKind::TrustSet(t) => {
                put("LimitAmount", Amount::Issued(t.limit_amount).to_json());
                if let Some(quality_in) = t.quality_in {
                    put("QualityIn", quality_in.into());
                }
                if let Some(quality_out) = t.quality_out {
                    put("QualityOut", quality_out.into());
                }
            }
            TransactionKind::AccountDelete(d) => {
                put("Destination", d.destination.to_string().into());
                if let Some(tag) = d.destination_tag {
                    put("DestinationTag", tag.into());
                }
            }
        }
        Value::Object(tx)
    }

    /// Reads rippled `tx_json`. Keys this model does not know are ignored.
    pub fn from_json(value: &Value) -> Result<Self> {
        let f = JsonFields::new(value, "transaction")?;
        let tx_type: TransactionType =
            f.require("TransactionType", f.parse("TransactionType")?)?;

        let fee = f
            .amount("Fee")?
            .map(XrpAmount::try_from)
            .transpose()?;
        let memos = f
            .wrapped_array("Memos", "Memo")?
            .into_iter()
            .map(Memo::from_json)
            .collect::<Result<Vec<_>>>()?;
        let signers = f
            .wrapped_array("Signers", "Signer")?
            .into_iter()
            .map(Signer::from_json)
            .collect::<Result<Vec<_>>>()?;
        let common = CommonFields {
            account: f.require("Account", f.parse("Account")?)?,
            fee,
            sequence: f.u32("Sequence")?,
            network_id: f.u32("NetworkID")?,
            flags: f.u32("Flags")?,
            source_tag: f.u32("SourceTag")?,
            last_ledger_sequence: f.u32("LastLedgerSequence")?,
            account_txn_id: f.parse("AccountTxnID")?,
            signing_pub_key: f.hex("SigningPubKey")?.unwrap_or_default(),
            txn_signature: f.hex("TxnSignature")?,
            memos,
            signers,
        };

        let kind = match tx_type {
            TransactionType::Payment => TransactionKind::Payment(Payment {
                destination: f.require("Destination", f.parse("Destination")?)?,
                amount: f.require("Amount", f.amount("Amount")?)?,
                destination_tag: f.u32("DestinationTag")?,
                invoice_id: f.parse("InvoiceID")?,
                send_max: f.amount("SendMax")?,
                deliver_min: f.amount("DeliverMin")?,
            }),
            TransactionType::AccountSet => TransactionKind::AccountSet(AccountSet {
                clear_flag: f.u32("ClearFlag")?,
                set_flag: f.u32("SetFlag")?,
                transfer_rate: f.u32("TransferRate")?,
                email_hash: f.parse("EmailHash")?,
                message_key: f.hex("MessageKey")?,
                domain: f.hex("Domain")?,
                tick_size: f.u8("TickSize")?,
            }),
            TransactionType::SetRegularKey => TransactionKind::SetRegularKey(SetRegularKey {
                regular_key: f.parse("RegularKey")?,
            }),
            TransactionType::OfferCreate => TransactionKind::OfferCreate(OfferCreate {
                taker_pays: f.require("TakerPays", f.amount("TakerPays")?)?,
                taker_gets: f.require("TakerGets", f.amount("TakerGets")?)?,
                expiration: f.u32("Expiration")?,
                offer_sequence: f.u32("OfferSequence")?,
            }),
            TransactionType::OfferCancel => TransactionKind::OfferCancel(OfferCancel {
                offer_sequence: f.require("OfferSequence", f.u32("OfferSequence")?)?,
            }),
            TransactionType::SignerListSet => TransactionKind::SignerListSet(SignerListSet {
                signer_quorum: f.require("SignerQuorum", f.u32("SignerQuorum")?)?,
                signer_entries: f
                    .wrapped_array("SignerEntries", "SignerEntry")?
                    .into_iter()
                    .map(SignerEntry::from_json)
                    .collect::<Result<Vec<_>>>()?,
            }),
            TransactionType::TrustSet => {
                let limit = f.require("LimitAmount", f.amount("LimitAmount")?)?;
                let limit_amount = *limit.as_issued().ok_or_else(|| {
                    XrpError::Format("TrustSet LimitAmount must be an issued amount".to_string())
                })?;
                TransactionKind::TrustSet(TrustSet {
                    limit_amount,
                    quality_in: f.u32("QualityIn")?,
                    quality_out: f.u32("QualityOut")?,
                })
            }
            TransactionType::AccountDelete => TransactionKind::AccountDelete(AccountDelete {
                destination: f.require("Destination", f.parse("Destination")?)?,
                destination_tag: f.u32("DestinationTag")?,
            }),
        };
        Ok(Self { common, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SOURCE_SECRET: &str = "sEdSKaCy2JT7JaM7v95H9SxkhP9wS2r";
    const DESTINATION: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    fn payment(key_pair: &KeyPair) -> Transaction {
        let mut tx = Transaction::new(
            key_pair.account_id(),
            Payment::new(
                DESTINATION.parse().unwrap(),
                XrpAmount::from_drops(1_000_000).unwrap().into(),
            ),
        );
        tx.common.fee = Some(XrpAmount::from_drops(12).unwrap());
        tx.common.sequence = Some(1);
        tx
    }

    #[test]
    fn sign_fills_key_and_signature() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let mut tx = payment(&key_pair);
        assert!(!tx.is_signed());

        let signed = tx.sign(&key_pair).unwrap();
        assert!(tx.is_signed());
        assert_eq!(tx.common.signing_pub_key, key_pair.public_key().to_vec());
        assert_eq!(signed.blob, tx.to_bytes().unwrap());
        assert_eq!(signed.hash, tx.hash().unwrap());
        assert!(tx.verify_signature().unwrap());
    }

    #[test]
    fn signing_data_never_contains_the_signature() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let mut tx = payment(&key_pair);
        tx.sign(&key_pair).unwrap();
        let signature = tx.common.txn_signature.clone().unwrap();
        let signing_data = tx.signing_data().unwrap();

        assert_eq!(&signing_data[..4], &TRANSACTION_SIGN_PREFIX);
        assert!(!signing_data
            .windows(signature.len())
            .any(|w| w == signature.as_slice()));
        assert!(keypair::verify(&key_pair.public_key(), &signing_data, &signature).unwrap());
    }

    #[test]
    fn tampering_breaks_verification() {
        let key_pair = KeyPair::from_secret("snoPBrXtMeMyMHUVTgbuqAfg1SUTb").unwrap();
        let mut tx = payment(&key_pair);
        tx.sign(&key_pair).unwrap();
        assert!(tx.verify_signature().unwrap());

        tx.common.sequence = Some(2);
        assert!(!tx.verify_signature().unwrap());
    }

    #[test]
    fn unsigned_transaction_does_not_verify() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        assert!(!payment(&key_pair).verify_signature().unwrap());
    }

    #[test]
    fn failed_sign_keeps_the_previous_signature() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let other = KeyPair::from_secret("snoPBrXtMeMyMHUVTgbuqAfg1SUTb").unwrap();
        let mut tx = payment(&key_pair);
        tx.sign(&key_pair).unwrap();

        tx.common.sequence = None;
        let before = tx.clone();
        assert!(matches!(
            tx.sign(&other),
            Err(XrpError::ProtocolMismatch(_))
        ));
        assert_eq!(tx, before);
        assert!(tx.common.txn_signature.is_some());
        assert_eq!(tx.common.signing_pub_key, key_pair.public_key().to_vec());
    }

    #[test]
    fn failed_combine_keeps_the_transaction() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let mut tx = payment(&key_pair);
        let signer = tx.multisign(&key_pair, key_pair.account_id()).unwrap();
        tx.sign(&key_pair).unwrap();

        tx.common.fee = None;
        let before = tx.clone();
        assert!(tx.combine_signers(vec![signer]).is_err());
        assert_eq!(tx, before);
        assert!(tx.common.signers.is_empty());
    }

    #[test]
    fn multisign_round_trip() {
        let alice = KeyPair::from_secret("snoPBrXtMeMyMHUVTgbuqAfg1SUTb").unwrap();
        let bob = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let source = KeyPair::from_secret("sp5fghtJtpUorTwvof1NpDXAzNwf5").unwrap();

        let mut tx = payment(&source);
        let signers = vec![
            tx.multisign(&bob, bob.account_id()).unwrap(),
            tx.multisign(&alice, alice.account_id()).unwrap(),
        ];
        let signed = tx.combine_signers(signers).unwrap();

        assert!(tx.common.signing_pub_key.is_empty());
        assert!(tx.common.txn_signature.is_none());
        assert!(tx.common.signers[0].account < tx.common.signers[1].account);
        assert!(tx.verify_signature().unwrap());

        let parsed = Transaction::from_bytes(&signed.blob).unwrap();
        assert_eq!(parsed, tx);
        assert_eq!(parsed.hash().unwrap(), signed.hash);
    }

    #[test]
    fn multisigning_data_ends_with_signer_account() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let tx = payment(&key_pair);
        let signer: AccountId = DESTINATION.parse().unwrap();
        let data = tx.multisigning_data(&signer).unwrap();
        assert_eq!(&data[..4], &TRANSACTION_MULTISIGN_PREFIX);
        assert_eq!(&data[data.len() - 20..], signer.as_bytes());
    }

    #[test]
    fn duplicate_signers_are_rejected() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let mut tx = payment(&key_pair);
        let signer = tx.multisign(&key_pair, key_pair.account_id()).unwrap();
        assert!(matches!(
            tx.combine_signers(vec![signer.clone(), signer]),
            Err(XrpError::ProtocolMismatch(_))
        ));
        assert!(tx.combine_signers(Vec::new()).is_err());
    }

    #[test]
    fn single_signing_refuses_multisigned() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let mut tx = payment(&key_pair);
        let signer = tx.multisign(&key_pair, key_pair.account_id()).unwrap();
        tx.combine_signers(vec![signer]).unwrap();
        assert!(matches!(
            tx.sign(&key_pair),
            Err(XrpError::ProtocolMismatch(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let key_pair = KeyPair::from_secret(SOURCE_SECRET).unwrap();
        let mut tx = payment(&key_pair);
        tx.common.memos.push(Memo {
            memo_data: Some(b"hi".to_vec()),
            ..Memo::default()
        });
        if let TransactionKind::Payment(p) = &mut tx.kind {
            p.destination_tag = Some(42);
        }
        tx.sign(&key_pair).unwrap();

        let json = tx.to_json();
        assert_eq!(json["TransactionType"], "Payment");
        assert_eq!(json["Amount"], "1000000");
        assert_eq!(json["Fee"], "12");
        assert_eq!(json["DestinationTag"], 42);
        assert_eq!(Transaction::from_json(&json).unwrap(), tx);
    }

    #[test]
    fn json_input_ignores_unknown_keys() {
        let json = json!({
            "TransactionType": "OfferCancel",
            "Account": DESTINATION,
            "Fee": "10",
            "Sequence": 5,
            "OfferSequence": 4,
            "hash": "ABCD",
            "meta": {"TransactionResult": "tesSUCCESS"},
        });
        let tx = Transaction::from_json(&json).unwrap();
        assert_eq!(tx.transaction_type(), TransactionType::OfferCancel);
        assert_eq!(tx.common.sequence, Some(5));
        assert!(tx.common.signing_pub_key.is_empty());
    }

    #[test]
    fn json_rejects_bad_input() {
        assert!(Transaction::from_json(&json!({"TransactionType": "Payment"})).is_err());
        assert!(Transaction::from_json(&json!({
            "TransactionType": "TrustSet",
            "Account": DESTINATION,
            "LimitAmount": "100",
        }))
        .is_err());
        assert!(Transaction::from_json(&json!({
            "TransactionType": "OfferCancel",
            "Account": DESTINATION,
            "OfferSequence": 1,
            "Fee": {"currency": "GBP", "issuer": DESTINATION, "value": "1"},
        }))
        .is_err());
    }
}
