//! Canonical binary layout of each transaction type.
//!
//! Every encoder below writes its fields in ascending `(type code, field
//! code)` order. The order is spelled out per type rather than sorted at
//! runtime; the `StWriter` rejects any slip.

use crate::amount::{Amount, XrpAmount};
use crate::error::{Result, XrpError};
use crate::field::*;
use crate::hash::Hash256;
use crate::st_reader::{required, StObject};
use crate::st_writer::StWriter;
use crate::transaction::{
    AccountDelete, AccountSet, CommonFields, OfferCancel, OfferCreate, Payment, SetRegularKey,
    SignerListSet, Transaction, TransactionKind, TrustSet,
};
use crate::types::{Memo, Signer, SignerEntry, TransactionType};

fn opt_u32(w: &mut StWriter, field: FieldId, value: Option<u32>) -> Result<()> {
    match value {
        Some(value) => w.write_u32(field, value),
        None => Ok(()),
    }
}

fn opt_hash256(w: &mut StWriter, field: FieldId, value: Option<Hash256>) -> Result<()> {
    match value {
        Some(value) => w.write_hash256(field, &value),
        None => Ok(()),
    }
}

fn opt_amount(w: &mut StWriter, field: FieldId, value: Option<&Amount>) -> Result<()> {
    match value {
        Some(value) => w.write_amount(field, value),
        None => Ok(()),
    }
}

fn opt_blob(w: &mut StWriter, field: FieldId, value: Option<&[u8]>) -> Result<()> {
    match value {
        Some(value) => w.write_blob(field, value),
        None => Ok(()),
    }
}

/// TransactionType, NetworkID, Flags, SourceTag, Sequence.
fn write_leading(w: &mut StWriter, tx_type: TransactionType, c: &CommonFields) -> Result<()> {
    w.write_u16(TRANSACTION_TYPE, tx_type.code())?;
    opt_u32(w, NETWORK_ID, c.network_id)?;
    opt_u32(w, FLAGS, c.flags)?;
    opt_u32(w, SOURCE_TAG, c.source_tag)?;
    w.write_u32(SEQUENCE, required(c.sequence, SEQUENCE)?)
}

fn write_fee(w: &mut StWriter, c: &CommonFields) -> Result<()> {
    let fee = required(c.fee, FEE)?;
    w.write_amount(FEE, &Amount::Xrp(fee))
}

/// SigningPubKey is always present, empty when multi-signing.
fn write_signature(w: &mut StWriter, c: &CommonFields, for_signing: bool) -> Result<()> {
    w.write_blob(SIGNING_PUB_KEY, &c.signing_pub_key)?;
    if !for_signing {
        opt_blob(w, TXN_SIGNATURE, c.txn_signature.as_deref())?;
    }
    Ok(())
}

/// Signers, SignerEntries, Memos.
fn write_arrays(
    w: &mut StWriter,
    c: &CommonFields,
    for_signing: bool,
    signer_entries: Option<&[SignerEntry]>,
) -> Result<()> {
    if !for_signing && !c.signers.is_empty() {
        w.start_array(SIGNERS)?;
        for signer in &c.signers {
            signer.write(w)?;
        }
        w.end_array()?;
    }
    if let Some(entries) = signer_entries {
        if !entries.is_empty() {
            w.start_array(SIGNER_ENTRIES)?;
            for entry in entries {
                entry.write(w)?;
            }
            w.end_array()?;
        }
    }
    if !c.memos.is_empty() {
        w.start_array(MEMOS)?;
        for memo in &c.memos {
            memo.write(w)?;
        }
        w.end_array()?;
    }
    Ok(())
}

fn encode_payment(
    w: &mut StWriter,
    c: &CommonFields,
    p: &Payment,
    for_signing: bool,
) -> Result<()> {
    opt_u32(w, DESTINATION_TAG, p.destination_tag)?;
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    opt_hash256(w, INVOICE_ID, p.invoice_id)?;
    w.write_amount(AMOUNT, &p.amount)?;
    write_fee(w, c)?;
    opt_amount(w, SEND_MAX, p.send_max.as_ref())?;
    opt_amount(w, DELIVER_MIN, p.deliver_min.as_ref())?;
    write_signature(w, c, for_signing)?;
    w.write_account(ACCOUNT, &c.account)?;
    w.write_account(DESTINATION, &p.destination)?;
    write_arrays(w, c, for_signing, None)
}

fn encode_account_set(
    w: &mut StWriter,
    c: &CommonFields,
    a: &AccountSet,
    for_signing: bool,
) -> Result<()> {
    opt_u32(w, TRANSFER_RATE, a.transfer_rate)?;
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    opt_u32(w, SET_FLAG, a.set_flag)?;
    opt_u32(w, CLEAR_FLAG, a.clear_flag)?;
    if let Some(email_hash) = &a.email_hash {
        w.write_hash128(EMAIL_HASH, email_hash)?;
    }
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    write_fee(w, c)?;
    opt_blob(w, MESSAGE_KEY, a.message_key.as_deref())?;
    write_signature(w, c, for_signing)?;
    opt_blob(w, DOMAIN, a.domain.as_deref())?;
    w.write_account(ACCOUNT, &c.account)?;
    write_arrays(w, c, for_signing, None)?;
    if let Some(tick_size) = a.tick_size {
        w.write_u8(TICK_SIZE, tick_size)?;
    }
    Ok(())
}

fn encode_set_regular_key(
    w: &mut StWriter,
    c: &CommonFields,
    s: &SetRegularKey,
    for_signing: bool,
) -> Result<()> {
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    write_fee(w, c)?;
    write_signature(w, c, for_signing)?;
    w.write_account(ACCOUNT, &c.account)?;
    if let Some(regular_key) = &s.regular_key {
        w.write_account(REGULAR_KEY, regular_key)?;
    }
    write_arrays(w, c, for_signing, None)
}

fn encode_offer_create(
    w: &mut StWriter,
    c: &CommonFields,
    o: &OfferCreate,
    for_signing: bool,
) -> Result<()> {
    opt_u32(w, EXPIRATION, o.expiration)?;
    opt_u32(w, OFFER_SEQUENCE, o.offer_sequence)?;
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    w.write_amount(TAKER_PAYS, &o.taker_pays)?;
    w.write_amount(TAKER_GETS, &o.taker_gets)?;
    write_fee(w, c)?;
    write_signature(w, c, for_signing)?;
    w.write_account(ACCOUNT, &c.account)?;
    write_arrays(w, c, for_signing, None)
}

fn encode_offer_cancel(
    w: &mut StWriter,
    c: &CommonFields,
    o: &OfferCancel,
    for_signing: bool,
) -> Result<()> {
    w.write_u32(OFFER_SEQUENCE, o.offer_sequence)?;
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    write_fee(w, c)?;
    write_signature(w, c, for_signing)?;
    w.write_account(ACCOUNT, &c.account)?;
    write_arrays(w, c, for_signing, None)
}

fn encode_signer_list_set(
    w: &mut StWriter,
    c: &CommonFields,
    s: &SignerListSet,
    for_signing: bool,
) -> Result<()> {
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    w.write_u32(SIGNER_QUORUM, s.signer_quorum)?;
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    write_fee(w, c)?;
    write_signature(w, c, for_signing)?;
    w.write_account(ACCOUNT, &c.account)?;
    write_arrays(w, c, for_signing, Some(&s.signer_entries))
}

fn encode_trust_set(
    w: &mut StWriter,
    c: &CommonFields,
    t: &TrustSet,
    for_signing: bool,
) -> Result<()> {
    opt_u32(w, QUALITY_IN, t.quality_in)?;
    opt_u32(w, QUALITY_OUT, t.quality_out)?;
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    w.write_amount(LIMIT_AMOUNT, &Amount::Issued(t.limit_amount))?;
    write_fee(w, c)?;
    write_signature(w, c, for_signing)?;
    w.write_account(ACCOUNT, &c.account)?;
    write_arrays(w, c, for_signing, None)
}

fn encode_account_delete(
    w: &mut StWriter,
    c: &CommonFields,
    d: &AccountDelete,
    for_signing: bool,
) -> Result<()> {
    opt_u32(w, DESTINATION_TAG, d.destination_tag)?;
    opt_u32(w, LAST_LEDGER_SEQUENCE, c.last_ledger_sequence)?;
    opt_hash256(w, ACCOUNT_TXN_ID, c.account_txn_id)?;
    write_fee(w, c)?;
    write_signature(w, c, for_signing)?;
    w.write_account(ACCOUNT, &c.account)?;
    w.write_account(DESTINATION, &d.destination)?;
    write_arrays(w, c, for_signing, None)
}

/// Serializes a transaction. With `for_signing` the signatures are left out.
pub fn encode_transaction(tx: &Transaction, for_signing: bool) -> Result<Vec<u8>> {
    let mut w = StWriter::new();
    let c = &tx.common;
    write_leading(&mut w, tx.transaction_type(), c)?;
    match &tx.kind {
        TransactionKind::Payment(p) => encode_payment(&mut w, c, p, for_signing)?,
        TransactionKind::AccountSet(a) => encode_account_set(&mut w, c, a, for_signing)?,
        TransactionKind::SetRegularKey(s) => encode_set_regular_key(&mut w, c, s, for_signing)?,
        TransactionKind::OfferCreate(o) => encode_offer_create(&mut w, c, o, for_signing)?,
        TransactionKind::OfferCancel(o) => encode_offer_cancel(&mut w, c, o, for_signing)?,
        TransactionKind::SignerListSet(s) => encode_signer_list_set(&mut w, c, s, for_signing)?,
        TransactionKind::TrustSet(t) => encode_trust_set(&mut w, c, t, for_signing)?,
        TransactionKind::AccountDelete(d) => encode_account_delete(&mut w, c, d, for_signing)?,
    }
    w.finish()
}

fn take_xrp(object: &mut StObject, field: FieldId) -> Result<Option<XrpAmount>> {
    object.take_amount(field)?.map(XrpAmount::try_from).transpose()
}

fn take_common(object: &mut StObject) -> Result<CommonFields> {
    let memos = object
        .take_array(MEMOS)?
        .unwrap_or_default()
        .into_iter()
        .map(|(field, inner)| Memo::from_st(field, inner))
        .collect::<Result<Vec<_>>>()?;
    let signers = object
        .take_array(SIGNERS)?
        .unwrap_or_default()
        .into_iter()
        .map(|(field, inner)| Signer::from_st(field, inner))
        .collect::<Result<Vec<_>>>()?;

    Ok(CommonFields {
        account: required(object.take_account(ACCOUNT)?, ACCOUNT)?,
        fee: Some(required(take_xrp(object, FEE)?, FEE)?),
        sequence: Some(required(object.take_u32(SEQUENCE)?, SEQUENCE)?),
        network_id: object.take_u32(NETWORK_ID)?,
        flags: object.take_u32(FLAGS)?,
        source_tag: object.take_u32(SOURCE_TAG)?,
        last_ledger_sequence: object.take_u32(LAST_LEDGER_SEQUENCE)?,
        account_txn_id: object.take_hash256(ACCOUNT_TXN_ID)?,
        signing_pub_key: required(object.take_blob(SIGNING_PUB_KEY)?, SIGNING_PUB_KEY)?,
        txn_signature: object.take_blob(TXN_SIGNATURE)?,
        memos,
        signers,
    })
}

fn take_kind(object: &mut StObject, tx_type: TransactionType) -> Result<TransactionKind> {
    Ok(match tx_type {
        TransactionType::Payment => TransactionKind::Payment(Payment {
            destination: required(object.take_account(DESTINATION)?, DESTINATION)?,
            amount: required(object.take_amount(AMOUNT)?, AMOUNT)?,
            destination_tag: object.take_u32(DESTINATION_TAG)?,
            invoice_id: object.take_hash256(INVOICE_ID)?,
            send_max: object.take_amount(SEND_MAX)?,
            deliver_min: object.take_amount(DELIVER_MIN)?,
        }),
        TransactionType::AccountSet => TransactionKind::AccountSet(AccountSet {
            clear_flag: object.take_u32(CLEAR_FLAG)?,
            set_flag: object.take_u32(SET_FLAG)?,
            transfer_rate: object.take_u32(TRANSFER_RATE)?,
            email_hash: object.take_hash128(EMAIL_HASH)?,
            message_key: object.take_blob(MESSAGE_KEY)?,
            domain: object.take_blob(DOMAIN)?,
            tick_size: object.take_u8(TICK_SIZE)?,
        }),
        TransactionType::SetRegularKey => TransactionKind::SetRegularKey(SetRegularKey {
            regular_key: object.take_account(REGULAR_KEY)?,
        }),
        TransactionType::OfferCreate => TransactionKind::OfferCreate(OfferCreate {
            taker_pays: required(object.take_amount(TAKER_PAYS)?, TAKER_PAYS)?,
            taker_gets: required(object.take_amount(TAKER_GETS)?, TAKER_GETS)?,
            expiration: object.take_u32(EXPIRATION)?,
            offer_sequence: object.take_u32(OFFER_SEQUENCE)?,
        }),
        TransactionType::OfferCancel => TransactionKind::OfferCancel(OfferCancel {
            offer_sequence: required(object.take_u32(OFFER_SEQUENCE)?, OFFER_SEQUENCE)?,
        }),
        TransactionType::SignerListSet => TransactionKind::SignerListSet(SignerListSet {
            signer_quorum: required(object.take_u32(SIGNER_QUORUM)?, SIGNER_QUORUM)?,
            signer_entries: object
                .take_array(SIGNER_ENTRIES)?
                .unwrap_or_default()
                .into_iter()
                .map(|(field, inner)| SignerEntry::from_st(field, inner))
                .collect::<Result<Vec<_>>>()?,
        }),
        TransactionType::TrustSet => {
            let limit = required(object.take_amount(LIMIT_AMOUNT)?, LIMIT_AMOUNT)?;
            let limit_amount = *limit.as_issued().ok_or_else(|| {
                XrpError::ProtocolMismatch("TrustSet LimitAmount must be an issued amount".into())
            })?;
            TransactionKind::TrustSet(TrustSet {
                limit_amount,
                quality_in: object.take_u32(QUALITY_IN)?,
                quality_out: object.take_u32(QUALITY_OUT)?,
            })
        }
        TransactionType::AccountDelete => TransactionKind::AccountDelete(AccountDelete {
            destination: required(object.take_account(DESTINATION)?, DESTINATION)?,
            destination_tag: object.take_u32(DESTINATION_TAG)?,
        }),
    })
}

/// Parses a serialized transaction. Fields foreign to its type are rejected.
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction> {
    let mut object = StObject::from_bytes(bytes)?;
    let code = required(object.take_u16(TRANSACTION_TYPE)?, TRANSACTION_TYPE)?;
    let tx_type = TransactionType::from_code(code)?;
    let common = take_common(&mut object)?;
    let kind = take_kind(&mut object, tx_type)?;
    object.finish(tx_type.name())?;
    Ok(Transaction { common, kind })
}
