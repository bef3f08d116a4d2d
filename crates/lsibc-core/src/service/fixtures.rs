//! Shared fixtures for service tests.

use super::LiquidStakeService;
use crate::adapters::InMemoryStore;
use crate::config::LiquidStakeConfig;
use crate::domain::{
    BlockContext, ChainId, ChannelId, ChannelState, Coin, Dec, Deposit, FungibleTokenPacketData,
    HostChain, HostChainFlags, HostChainParams, IcaAccount, Packet, SequenceId, Validator,
    TRANSFER_PORT,
};
use crate::ports::outbound::{
    ExecutedTx, LiquidStakeStore, MockBalanceQuerier, MockBank, MockRemoteTxExecutor,
    MockTransferRouter,
};
use std::sync::Arc;

pub(crate) type TestService = LiquidStakeService<
    InMemoryStore,
    MockTransferRouter,
    MockRemoteTxExecutor,
    MockBank,
    MockBalanceQuerier,
>;

pub(crate) fn chain_id() -> ChainId {
    ChainId::new("cosmoshub-4")
}

pub(crate) fn ctx() -> BlockContext {
    BlockContext::new(100, 1_700_000_000_000_000_000)
}

/// Active chain with two validators delegated 600/400 at equal weights.
pub(crate) fn host_chain() -> HostChain {
    HostChain {
        chain_id: chain_id(),
        active: true,
        channel_id: ChannelId::new("channel-0"),
        counterparty_channel_id: ChannelId::new("channel-100"),
        connection_id: "connection-0".to_string(),
        host_denom: "uatom".to_string(),
        delegation_account: IcaAccount {
            address: "cosmos1delegation".to_string(),
            owner: "cosmoshub-4.delegate".to_string(),
            balance: Coin::zero("uatom"),
            channel_state: ChannelState::Created,
        },
        rewards_account: Some(IcaAccount {
            address: "cosmos1rewards".to_string(),
            owner: "cosmoshub-4.rewards".to_string(),
            balance: Coin::zero("uatom"),
            channel_state: ChannelState::Created,
        }),
        validators: vec![
            Validator::new("val1", 600, Dec::from_percent(50)),
            Validator::new("val2", 400, Dec::from_percent(50)),
        ],
        params: HostChainParams {
            restake_fee: Dec::from_percent(2),
            fee_address: "lsibc1fee".to_string(),
            unbonding_factor: 4,
            redelegation_acceptable_delta: 0,
        },
        flags: HostChainFlags::default(),
        reward_params: None,
        c_value: Dec::ONE,
        last_c_value: Dec::ONE,
    }
}

pub(crate) fn funded_deposit(epoch: i64, amount: u128) -> Deposit {
    let mut deposit = Deposit::new(chain_id(), epoch, host_chain().ibc_denom());
    deposit.amount.amount = amount;
    deposit
}

pub(crate) fn remote_seq(sequence: u64) -> SequenceId {
    SequenceId::new(ChannelId::new(MockRemoteTxExecutor::CHANNEL), sequence)
}

pub(crate) fn transfer_packet(
    channel: &ChannelId,
    sequence: u64,
    data: &FungibleTokenPacketData,
) -> Packet {
    Packet {
        sequence,
        source_port: TRANSFER_PORT.to_string(),
        source_channel: channel.clone(),
        destination_port: TRANSFER_PORT.to_string(),
        destination_channel: ChannelId::new("channel-1"),
        data: data.to_bytes().unwrap(),
        timeout_timestamp: 0,
    }
}

/// Packet the mock executor would have sent for `tx`.
pub(crate) fn remote_packet(tx: &ExecutedTx) -> Packet {
    let data = crate::domain::RemoteTxPacketData::new(tx.messages.clone());
    Packet {
        sequence: tx.sequence_id.sequence,
        source_port: format!("icacontroller-{}", tx.owner),
        source_channel: tx.sequence_id.channel.clone(),
        destination_port: "icahost".to_string(),
        destination_channel: ChannelId::new("channel-7"),
        data: data.to_bytes().unwrap(),
        timeout_timestamp: 0,
    }
}

pub(crate) struct Harness {
    pub service: TestService,
    pub store: Arc<InMemoryStore>,
    pub transfers: Arc<MockTransferRouter>,
    pub remote: Arc<MockRemoteTxExecutor>,
    pub bank: Arc<MockBank>,
    pub queries: Arc<MockBalanceQuerier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_mocks(
            MockTransferRouter::new(),
            MockRemoteTxExecutor::new(),
            MockBank::new(),
        )
    }

    pub fn with_mocks(
        transfers: MockTransferRouter,
        remote: MockRemoteTxExecutor,
        bank: MockBank,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        store.set_host_chain(host_chain());
        let transfers = Arc::new(transfers);
        let remote = Arc::new(remote);
        let bank = Arc::new(bank);
        let queries = Arc::new(MockBalanceQuerier::new());
        let service = LiquidStakeService::new(
            LiquidStakeConfig::default(),
            Arc::clone(&store),
            Arc::clone(&transfers),
            Arc::clone(&remote),
            Arc::clone(&bank),
            Arc::clone(&queries),
        );
        Self {
            service,
            store,
            transfers,
            remote,
            bank,
            queries,
        }
    }
}
