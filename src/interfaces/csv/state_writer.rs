use crate::domain::deposit::{DepositAccount, LockedBy};
use crate::domain::tx::{Tx, TxState, TxType};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct DepositAccountRow<'a> {
    id: &'a str,
    coin_type_id: &'a str,
    address: &'a str,
    incoming: &'a str,
    outcoming: &'a str,
    locked: bool,
    locked_by: LockedBy,
    collecting_tid: Option<&'a str>,
}

#[derive(Serialize)]
struct TxRow<'a> {
    id: &'a str,
    coin_type_id: &'a str,
    from_account_id: &'a str,
    to_account_id: &'a str,
    amount: &'a str,
    state: TxState,
    tx_type: TxType,
}

const DEPOSIT_ACCOUNT_HEADER: [&str; 8] = [
    "id",
    "coin_type_id",
    "address",
    "incoming",
    "outcoming",
    "locked",
    "locked_by",
    "collecting_tid",
];

const TX_HEADER: [&str; 7] = [
    "id",
    "coin_type_id",
    "from_account_id",
    "to_account_id",
    "amount",
    "state",
    "tx_type",
];

/// Writes the final store state as CSV, one section per collection.
///
/// Each section starts with its own header line.
pub struct StateWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StateWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_deposit_accounts(&mut self, accounts: &[DepositAccount]) -> Result<()> {
        self.writer.write_record(DEPOSIT_ACCOUNT_HEADER)?;
        for account in accounts {
            self.writer.serialize(DepositAccountRow {
                id: &account.id,
                coin_type_id: &account.coin_type_id,
                address: &account.address,
                incoming: &account.incoming,
                outcoming: &account.outcoming,
                locked: account.locked,
                locked_by: account.locked_by,
                collecting_tid: account.collecting_tid.as_deref(),
            })?;
        }
        Ok(())
    }

    pub fn write_txs(&mut self, txs: &[Tx]) -> Result<()> {
        self.writer.write_record(TX_HEADER)?;
        for tx in txs {
            self.writer.serialize(TxRow {
                id: &tx.id,
                coin_type_id: &tx.coin_type_id,
                from_account_id: &tx.from_account_id,
                to_account_id: &tx.to_account_id,
                amount: &tx.amount,
                state: tx.state,
                tx_type: tx.tx_type,
            })?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
