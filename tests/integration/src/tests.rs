//! Integration tests for the cross-chain jackpot lottery.
//!
//! Every chain runs its own lottery instance on its own mock storage. A
//! simulated transport picks `Send` messages out of each response and executes
//! them as `ReceiveMessage` on the destination chain, so winner fan-out,
//! hub notification and cross-chain randomness all run end to end.
//!
//! Reserve payouts are recorded rather than executed. The drand randomness
//! provider runs next to the hub lottery and its callbacks are routed back
//! into `OnRandomness`.
//!
//! Run:
//! ```bash
//! cargo test -p jackpot-integration-tests
//! ```

use std::collections::{BTreeMap, VecDeque};

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coins, from_json, to_json_binary, Addr, Binary, ContractResult, CosmosMsg, Env, Event,
    MemoryStorage, OwnedDeps, Response, SystemResult, Timestamp, Uint128, Uint256, WasmMsg,
    WasmQuery,
};
use jackpot_common::interfaces::{
    PriceOracleQueryMsg, QuoteResponse, RandomnessCallbackMsg, RandomnessProviderExecuteMsg,
    ReserveExecuteMsg, ReserveResponse, TransportCallbackMsg, TransportExecuteMsg,
};
use jackpot_common::{compute_win_id, Origin, PriceReading};
use jackpot_lottery::error::ContractError;
use jackpot_lottery::msg::{EntryAmount, EntryResponse, ExecuteMsg, InstantiateMsg, QueryMsg};
use jackpot_lottery::state::{ChainPriceObservation, LotteryConfig, LotteryStats, PaidWin};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── Constants ───

/// Real drand quicknet public key
const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

/// Real quicknet test vector: round 1000
const TEST_ROUND: u64 = 1000;
const TEST_SIG_HEX: &str = "b44679b9a59af2ec876b1a6b1ad52ea9b1615fc3982b19576350f93447cb1125e342b73a8dd2bacbe47e4b6b63ed5e39";
const TEST_RANDOMNESS_HEX: &str =
    "fe290beca10872ef2fb164d2aa4442de4566183ec51c56ff3cd603d930e54fdd";
/// Next unpublished quicknet round at this time is `TEST_ROUND`
const PROVIDER_REQUEST_TIME: u64 = 1692806361;

const HUB: u32 = 1;
const FEE_DENOM: &str = "uinj";
const SHARE_BPS: u16 = 500;

/// A $500 trade: 20_000 ppm with the test lottery config
const ENTRY_USD: u128 = 500_000_000;
const WIN_CHANCE_PPM: u32 = 20_000;

const WINNING_WORD: u64 = 0;
const LOSING_WORD: u64 = 999_999;

// ─── Helpers ───

fn addr(name: &str) -> Addr {
    MockApi::default().addr_make(name)
}

fn trader() -> String {
    addr("trader").to_string()
}

fn lottery_address(chain_id: u32) -> Addr {
    addr(&format!("lottery-{chain_id}"))
}

fn lottery_config() -> LotteryConfig {
    LotteryConfig {
        min_swap_usd: Uint128::new(1_000_000),
        reward_share_bps: SHARE_BPS,
        active: true,
        base_win_chance_ppm: 40,
        max_win_chance_ppm: 40_000,
        usd_multiplier_bps: 10_000,
    }
}

/// Same derivation the drand provider uses for its callbacks.
fn expected_word(request_id: u64) -> Uint256 {
    let randomness = hex::decode(TEST_RANDOMNESS_HEX).unwrap();
    let digest: [u8; 32] = Sha256::new()
        .chain_update(&randomness)
        .chain_update(request_id.to_be_bytes())
        .chain_update([0u8])
        .finalize()
        .into();
    Uint256::from_be_bytes(digest)
}

fn attr(event: &Event, key: &str) -> String {
    event
        .attributes
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
        .unwrap_or_default()
}

fn entry_id(res: &Response) -> u64 {
    let data: EntryResponse = from_json(res.data.as_ref().unwrap()).unwrap();
    data.request_id
}

// ─── Simulated network ───

struct ChainSetup {
    id: u32,
    reserve: u128,
    /// Wire a randomness provider on this chain and prefer it
    local_provider: bool,
}

fn hub(reserve: u128) -> ChainSetup {
    ChainSetup {
        id: HUB,
        reserve,
        local_provider: true,
    }
}

fn spoke(id: u32, reserve: u128) -> ChainSetup {
    ChainSetup {
        id,
        reserve,
        local_provider: false,
    }
}

struct Chain {
    deps: TestDeps,
    env: Env,
    reserve: u128,
    /// `None` makes every transport quote fail
    quote: Option<u128>,
    oracle_price: Option<u128>,
}

impl Chain {
    /// (Re)install the reserve, transport and oracle mocks for this chain.
    fn install_mocks(&mut self) {
        let reserve_addr = addr("reserve").to_string();
        let transport_addr = addr("transport").to_string();
        let oracle_addr = addr("oracle").to_string();
        let reserve = self.reserve;
        let quote = self.quote;
        let oracle_price = self.oracle_price;
        let now = self.env.block.time.seconds();

        self.deps.querier.update_wasm(move |query| match query {
            WasmQuery::Smart { contract_addr, .. } if *contract_addr == reserve_addr => {
                SystemResult::Ok(ContractResult::Ok(
                    to_json_binary(&ReserveResponse {
                        amount: Uint128::new(reserve),
                    })
                    .unwrap(),
                ))
            }
            WasmQuery::Smart { contract_addr, .. } if *contract_addr == transport_addr => {
                match quote {
                    Some(fee) => SystemResult::Ok(ContractResult::Ok(
                        to_json_binary(&QuoteResponse {
                            native_fee: Uint128::new(fee),
                        })
                        .unwrap(),
                    )),
                    None => SystemResult::Ok(ContractResult::Err("endpoint paused".to_string())),
                }
            }
            WasmQuery::Smart { contract_addr, msg } if *contract_addr == oracle_addr => {
                match (from_json::<PriceOracleQueryMsg>(msg).unwrap(), oracle_price) {
                    (PriceOracleQueryMsg::PrimaryPrice {}, Some(price)) => {
                        SystemResult::Ok(ContractResult::Ok(
                            to_json_binary(&PriceReading {
                                price: Uint128::new(price),
                                observed_at: now,
                            })
                            .unwrap(),
                        ))
                    }
                    _ => SystemResult::Ok(ContractResult::Err("no price".to_string())),
                }
            }
            _ => SystemResult::Ok(ContractResult::Err("unsupported".to_string())),
        });
    }

    fn set_fee_balance(&mut self, amount: u128) {
        self.deps
            .querier
            .bank
            .update_balance(&self.env.contract.address, coins(amount, FEE_DENOM));
    }
}

/// The drand provider contract, deployed on the chain in `chain_id`.
struct Provider {
    chain_id: u32,
    deps: TestDeps,
    env: Env,
}

#[derive(Debug, Clone, PartialEq)]
struct Payout {
    chain_id: u32,
    recipient: String,
    amount: Uint128,
}

#[derive(Debug, Clone)]
struct Delivery {
    src: u32,
    dst: u32,
    payload: Binary,
}

struct Network {
    chains: BTreeMap<u32, Chain>,
    provider: Option<Provider>,
    payouts: Vec<Payout>,
    deliveries: Vec<Delivery>,
    /// Provider requests nobody serves: (chain, request_id)
    unserved_requests: Vec<(u32, u64)>,
    events: Vec<(u32, Event)>,
}

impl Network {
    fn new(setups: &[ChainSetup]) -> Self {
        let ids: Vec<u32> = setups.iter().map(|s| s.id).collect();
        let mut chains = BTreeMap::new();

        for setup in setups {
            let mut env = mock_env();
            env.contract.address = lottery_address(setup.id);

            let mut chain = Chain {
                deps: mock_dependencies(),
                env,
                reserve: setup.reserve,
                quote: Some(0),
                oracle_price: None,
            };
            chain.install_mocks();

            let admin = addr("admin");
            let msg = InstantiateMsg {
                local_chain_id: setup.id,
                hub_chain_id: HUB,
                randomness_hub_chain_id: None,
                transport: Some(addr("transport").to_string()),
                randomness_provider: setup.local_provider.then(|| addr("provider").to_string()),
                prefer_local_randomness: setup.local_provider,
                price_oracle: Some(addr("oracle").to_string()),
                boost_source: None,
                jackpot_reserve: addr("reserve").to_string(),
                jackpot_vault_id: 1,
                fee_denom: FEE_DENOM.to_string(),
                token_decimals: 18,
                price_staleness_seconds: None,
                twap_window_seconds: None,
                default_gas_limit: None,
                lottery: lottery_config(),
                entry_callers: vec![addr("router").to_string()],
            };
            jackpot_lottery::contract::instantiate(
                chain.deps.as_mut(),
                chain.env.clone(),
                message_info(&admin, &[]),
                msg,
            )
            .unwrap();

            for peer in ids.iter().filter(|p| **p != setup.id) {
                jackpot_lottery::contract::execute(
                    chain.deps.as_mut(),
                    chain.env.clone(),
                    message_info(&admin, &[]),
                    ExecuteMsg::SetPeer {
                        chain_id: *peer,
                        address: lottery_address(*peer).to_string(),
                        gas_limit: None,
                    },
                )
                .unwrap();
            }

            chains.insert(setup.id, chain);
        }

        Network {
            chains,
            provider: None,
            payouts: vec![],
            deliveries: vec![],
            unserved_requests: vec![],
            events: vec![],
        }
    }

    /// Deploy the drand provider next to the lottery on `chain_id`. Its clock
    /// sits just before `TEST_ROUND`, so every request waits for that round.
    fn with_drand_provider(mut self, chain_id: u32) -> Self {
        let mut env = mock_env();
        env.contract.address = addr("provider");
        env.block.time = Timestamp::from_seconds(PROVIDER_REQUEST_TIME);
        let mut deps = mock_dependencies();

        let admin = addr("admin");
        jackpot_drand_randomness::contract::instantiate(
            deps.as_mut(),
            env.clone(),
            message_info(&admin, &[]),
            jackpot_drand_randomness::msg::InstantiateMsg {
                operators: vec![addr("operator").to_string()],
                consumers: vec![lottery_address(chain_id).to_string()],
                quicknet_pubkey_hex: QUICKNET_PK_HEX.to_string(),
                chain_hash: "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971"
                    .to_string(),
                genesis_time: 1692803367,
                period_seconds: 3,
                max_deliveries_per_beacon: None,
            },
        )
        .unwrap();

        self.provider = Some(Provider {
            chain_id,
            deps,
            env,
        });
        self
    }

    fn chain(&mut self, chain_id: u32) -> &mut Chain {
        self.chains.get_mut(&chain_id).unwrap()
    }

    fn execute(
        &mut self,
        chain_id: u32,
        sender: &Addr,
        msg: ExecuteMsg,
    ) -> Result<Response, ContractError> {
        let chain = self.chain(chain_id);
        jackpot_lottery::contract::execute(
            chain.deps.as_mut(),
            chain.env.clone(),
            message_info(sender, &[]),
            msg,
        )
    }

    fn query<T: DeserializeOwned>(&self, chain_id: u32, msg: QueryMsg) -> T {
        let chain = &self.chains[&chain_id];
        let bin = jackpot_lottery::contract::query(chain.deps.as_ref(), chain.env.clone(), msg)
            .unwrap();
        from_json(bin).unwrap()
    }

    /// Register a trade on `chain_id` and run everything it triggers.
    fn enter(&mut self, chain_id: u32, amount: EntryAmount) -> Response {
        let res = self
            .execute(
                chain_id,
                &addr("router"),
                ExecuteMsg::EnterLottery {
                    user: trader(),
                    amount,
                },
            )
            .unwrap();
        self.process(chain_id, res.clone());
        res
    }

    /// Play the provider on `chain_id` and deliver a chosen word.
    fn fulfill(&mut self, chain_id: u32, request_id: u64, word: u64) {
        let res = self
            .execute(
                chain_id,
                &addr("provider"),
                ExecuteMsg::OnRandomness {
                    request_id,
                    words: vec![Uint256::from(word)],
                },
            )
            .unwrap();
        self.process(chain_id, res);
    }

    /// Post the round 1000 beacon to the drand provider and route its callbacks.
    fn submit_beacon(&mut self) {
        let provider = self.provider.as_mut().unwrap();
        let res = jackpot_drand_randomness::contract::execute(
            provider.deps.as_mut(),
            provider.env.clone(),
            message_info(&addr("operator"), &[]),
            jackpot_drand_randomness::msg::ExecuteMsg::SubmitBeacon {
                round: TEST_ROUND,
                signature_hex: TEST_SIG_HEX.to_string(),
            },
        )
        .unwrap();
        let chain_id = provider.chain_id;

        for sub in res.messages {
            let CosmosMsg::Wasm(WasmMsg::Execute { msg, .. }) = sub.msg else {
                continue;
            };
            let RandomnessCallbackMsg::OnRandomness { request_id, words } =
                from_json::<RandomnessCallbackMsg>(&msg).unwrap();
            let res = self
                .execute(
                    chain_id,
                    &addr("provider"),
                    ExecuteMsg::OnRandomness { request_id, words },
                )
                .unwrap();
            self.process(chain_id, res);
        }
    }

    /// Execute a transport delivery on `dst` as if it came from `src`. The
    /// transport only knows its own callback shape, so the lottery has to
    /// accept it as is.
    fn deliver(&mut self, src: u32, dst: u32, payload: Binary) -> Result<Response, ContractError> {
        let callback = TransportCallbackMsg::ReceiveMessage {
            origin: Origin {
                src_chain: src,
                sender: lottery_address(src).to_string(),
            },
            payload,
        };
        let msg: ExecuteMsg = from_json(to_json_binary(&callback).unwrap()).unwrap();
        self.execute(dst, &addr("transport"), msg)
    }

    /// Run the outgoing messages of `res` until the network is quiet.
    fn process(&mut self, chain_id: u32, res: Response) {
        let mut queue = VecDeque::from([(chain_id, res)]);

        while let Some((chain_id, res)) = queue.pop_front() {
            for event in res.events {
                self.events.push((chain_id, event));
            }

            for sub in res.messages {
                let CosmosMsg::Wasm(WasmMsg::Execute {
                    contract_addr, msg, ..
                }) = sub.msg
                else {
                    continue;
                };

                if contract_addr == addr("transport").as_str() {
                    let TransportExecuteMsg::Send {
                        dst_chain, payload, ..
                    } = from_json::<TransportExecuteMsg>(&msg).unwrap();
                    self.deliveries.push(Delivery {
                        src: chain_id,
                        dst: dst_chain,
                        payload: payload.clone(),
                    });
                    let next = self.deliver(chain_id, dst_chain, payload).unwrap();
                    queue.push_back((dst_chain, next));
                } else if contract_addr == addr("reserve").as_str() {
                    let ReserveExecuteMsg::PayOut {
                        recipient, amount, ..
                    } = from_json::<ReserveExecuteMsg>(&msg).unwrap();
                    self.payouts.push(Payout {
                        chain_id,
                        recipient,
                        amount,
                    });
                } else if contract_addr == addr("provider").as_str() {
                    let RandomnessProviderExecuteMsg::RequestRandomness {
                        request_id,
                        num_words,
                    } = from_json::<RandomnessProviderExecuteMsg>(&msg).unwrap();

                    match self.provider.as_mut() {
                        Some(provider) if provider.chain_id == chain_id => {
                            jackpot_drand_randomness::contract::execute(
                                provider.deps.as_mut(),
                                provider.env.clone(),
                                message_info(&lottery_address(chain_id), &[]),
                                jackpot_drand_randomness::msg::ExecuteMsg::RequestRandomness {
                                    request_id,
                                    num_words,
                                },
                            )
                            .unwrap();
                        }
                        _ => self.unserved_requests.push((chain_id, request_id)),
                    }
                }
            }
        }
    }

    fn events(&self, chain_id: u32, ty: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|(c, e)| *c == chain_id && e.ty == ty)
            .map(|(_, e)| e)
            .collect()
    }

    fn payouts_on(&self, chain_id: u32) -> Vec<&Payout> {
        self.payouts
            .iter()
            .filter(|p| p.chain_id == chain_id)
            .collect()
    }
}

fn payout(chain_id: u32, amount: u128) -> Payout {
    Payout {
        chain_id,
        recipient: trader(),
        amount: Uint128::new(amount),
    }
}

fn four_chains() -> Network {
    Network::new(&[
        hub(1_000_000),
        spoke(2, 2_000_000),
        spoke(3, 3_000_000),
        spoke(4, 4_000_000),
    ])
}

// ─── Winner settlement ───

#[test]
fn test_hub_win_pays_every_chain_once() {
    let mut net = four_chains();

    let res = net.enter(HUB, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    assert_eq!(entry_id(&res), 1);
    assert_eq!(net.unserved_requests, vec![(HUB, 1)]);

    net.fulfill(HUB, 1, WINNING_WORD);

    // 5% of each chain's own reserve
    assert_eq!(
        net.payouts,
        vec![
            payout(1, 50_000),
            payout(2, 100_000),
            payout(3, 150_000),
            payout(4, 200_000),
        ]
    );

    let win_id = compute_win_id(HUB, 1, &trader());
    for chain_id in 1..=4 {
        let paid: Option<PaidWin> = net.query(
            chain_id,
            QueryMsg::PaidWin {
                win_id: win_id.clone(),
            },
        );
        assert!(paid.is_some(), "chain {chain_id} has no record of the win");
    }

    // Spokes pay but never forward a broadcast
    assert!(net.deliveries.iter().all(|d| d.src == HUB));
    assert_eq!(net.deliveries.len(), 3);
}

#[test]
fn test_losing_draw_moves_nothing() {
    let mut net = four_chains();
    net.enter(HUB, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    net.fulfill(HUB, 1, LOSING_WORD);

    assert!(net.payouts.is_empty());
    assert!(net.deliveries.is_empty());

    let stats: LotteryStats = net.query(HUB, QueryMsg::Stats {});
    assert_eq!(stats.total_losses, 1);
    assert_eq!(stats.total_wins, 0);
}

#[test]
fn test_spoke_win_routes_through_hub() {
    let mut net = Network::new(&[
        hub(1_000_000),
        ChainSetup {
            id: 2,
            reserve: 2_000_000,
            local_provider: true,
        },
        spoke(3, 3_000_000),
        spoke(4, 4_000_000),
    ]);

    net.enter(2, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    net.fulfill(2, 1, WINNING_WORD);

    // Originating spoke is paid by the hub's broadcast, exactly once
    assert_eq!(net.payouts_on(2), vec![&payout(2, 100_000)]);
    assert_eq!(net.payouts.len(), 4);
    assert_eq!(net.payouts_on(HUB), vec![&payout(1, 50_000)]);

    let notify = &net.deliveries[0];
    assert_eq!((notify.src, notify.dst), (2, HUB));
    let mut fan_out: Vec<u32> = net.deliveries[1..].iter().map(|d| d.dst).collect();
    fan_out.sort();
    assert_eq!(fan_out, vec![2, 3, 4]);

    // Every chain agrees on the id minted by the spoke
    let win_id = compute_win_id(2, 1, &trader());
    for chain_id in 1..=4 {
        let paid: Option<PaidWin> = net.query(
            chain_id,
            QueryMsg::PaidWin {
                win_id: win_id.clone(),
            },
        );
        assert_eq!(paid.unwrap().winner, trader());
    }
}

#[test]
fn test_spoke_win_with_unreachable_hub_pays_locally() {
    let mut net = Network::new(&[
        hub(1_000_000),
        ChainSetup {
            id: 2,
            reserve: 2_000_000,
            local_provider: true,
        },
        spoke(3, 3_000_000),
    ]);
    net.chain(2).quote = None;
    net.chain(2).install_mocks();

    net.enter(2, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    net.fulfill(2, 1, WINNING_WORD);

    assert_eq!(net.payouts, vec![payout(2, 100_000)]);
    assert!(net.deliveries.is_empty());

    let degraded = net.events(2, "jackpot_degraded_payout");
    assert_eq!(degraded.len(), 1);
    assert_eq!(attr(degraded[0], "reason"), "quote_failed");
}

#[test]
fn test_fan_out_survives_unaffordable_destinations_and_retry() {
    let mut net = four_chains();
    net.chain(HUB).quote = Some(600);
    net.chain(HUB).install_mocks();
    net.chain(HUB).set_fee_balance(1_000);

    net.enter(HUB, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    net.fulfill(HUB, 1, WINNING_WORD);

    // Only chain 2 fits the budget; 3 and 4 wait
    assert_eq!(net.payouts, vec![payout(1, 50_000), payout(2, 100_000)]);
    let pending: jackpot_lottery::msg::PendingBroadcastsResponse = net.query(
        HUB,
        QueryMsg::PendingBroadcasts {
            start_after: None,
            limit: None,
        },
    );
    let waiting: Vec<u32> = pending.pending.iter().map(|p| p.dst_chain).collect();
    assert_eq!(waiting, vec![3, 4]);

    net.chain(HUB).set_fee_balance(1_200);
    let res = net
        .execute(
            HUB,
            &addr("keeper"),
            ExecuteMsg::RetryBroadcast {
                broadcast_id: 1,
                dst_chain: None,
            },
        )
        .unwrap();
    net.process(HUB, res);

    assert_eq!(
        net.payouts,
        vec![
            payout(1, 50_000),
            payout(2, 100_000),
            payout(3, 150_000),
            payout(4, 200_000),
        ]
    );
    let pending: jackpot_lottery::msg::PendingBroadcastsResponse = net.query(
        HUB,
        QueryMsg::PendingBroadcasts {
            start_after: None,
            limit: None,
        },
    );
    assert!(pending.pending.is_empty());
}

#[test]
fn test_redelivered_messages_are_not_paid_twice() {
    let mut net = four_chains();
    net.enter(HUB, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    net.fulfill(HUB, 1, WINNING_WORD);
    assert_eq!(net.payouts.len(), 4);

    // The transport replays the broadcast to chain 3
    let replay = net
        .deliveries
        .iter()
        .find(|d| d.dst == 3)
        .cloned()
        .unwrap();
    let res = net.deliver(replay.src, replay.dst, replay.payload).unwrap();
    net.process(replay.dst, res);

    assert_eq!(net.payouts.len(), 4);
    let skipped = net.events(3, "jackpot_payout_skipped");
    assert_eq!(skipped.len(), 1);
}

#[test]
fn test_redelivered_notification_settles_once() {
    let mut net = Network::new(&[
        hub(1_000_000),
        ChainSetup {
            id: 2,
            reserve: 2_000_000,
            local_provider: true,
        },
        spoke(3, 3_000_000),
    ]);
    net.enter(2, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    net.fulfill(2, 1, WINNING_WORD);
    assert_eq!(net.payouts.len(), 3);
    let deliveries = net.deliveries.len();

    let notify = net.deliveries[0].clone();
    let res = net.deliver(notify.src, notify.dst, notify.payload).unwrap();
    net.process(notify.dst, res);

    // No second payout and no second fan-out
    assert_eq!(net.payouts.len(), 3);
    assert_eq!(net.deliveries.len(), deliveries);
}

// ─── Randomness ───

#[test]
fn test_drand_beacon_settles_local_entry() {
    let mut net = four_chains().with_drand_provider(HUB);

    net.enter(HUB, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    assert!(net.unserved_requests.is_empty());

    let provider = net.provider.as_ref().unwrap();
    let jobs: Vec<jackpot_drand_randomness::state::RandomnessJob> = from_json(
        jackpot_drand_randomness::contract::query(
            provider.deps.as_ref(),
            provider.env.clone(),
            jackpot_drand_randomness::msg::QueryMsg::PendingJobs { round: TEST_ROUND },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].request_id, 1);

    net.submit_beacon();

    let results = net.events(HUB, "jackpot_result");
    assert_eq!(results.len(), 1);
    let result = results[0];
    assert_eq!(attr(result, "request_id"), "1");
    assert_eq!(
        attr(result, "word"),
        hex::encode(expected_word(1).to_be_bytes())
    );
    assert_eq!(attr(result, "win_chance_ppm"), WIN_CHANCE_PPM.to_string());

    // Outcome follows from the beacon; settlement must match it either way
    let won = attr(result, "won") == "true";
    let draw: u64 = attr(result, "draw").parse().unwrap();
    assert_eq!(won, draw < WIN_CHANCE_PPM as u64);
    assert_eq!(net.payouts.len(), if won { 4 } else { 0 });

    let pending: jackpot_lottery::msg::PendingRequestsResponse = net.query(
        HUB,
        QueryMsg::PendingRequests {
            start_after: None,
            limit: None,
        },
    );
    assert!(pending.requests.is_empty());
}

#[test]
fn test_cross_chain_randomness_round_trip() {
    let mut net = Network::new(&[hub(1_000_000), spoke(2, 2_000_000), spoke(3, 3_000_000)])
        .with_drand_provider(HUB);

    let res = net.enter(2, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    assert_eq!(entry_id(&res), 1);

    // Spoke → hub request, relayed to the provider under the hub's own id
    assert_eq!(net.deliveries.len(), 1);
    assert_eq!((net.deliveries[0].src, net.deliveries[0].dst), (2, HUB));
    assert_eq!(net.events(HUB, "jackpot_randomness_relayed").len(), 1);

    net.submit_beacon();

    // Hub → spoke response carries the word the provider derived for hub id 1
    let response = &net.deliveries[1];
    assert_eq!((response.src, response.dst), (HUB, 2));

    let results = net.events(2, "jackpot_result");
    assert_eq!(results.len(), 1);
    assert_eq!(attr(results[0], "request_id"), "1");
    assert_eq!(
        attr(results[0], "word"),
        hex::encode(expected_word(1).to_be_bytes())
    );
    assert!(net.events(HUB, "jackpot_result").is_empty());

    let won = attr(results[0], "won") == "true";
    assert_eq!(net.payouts.len(), if won { 3 } else { 0 });
    if won {
        assert_eq!(net.payouts_on(2), vec![&payout(2, 100_000)]);
    }

    // A replayed response finds nothing left to fulfil
    let replay = net.deliveries[1].clone();
    let res = net.deliver(replay.src, replay.dst, replay.payload).unwrap();
    assert!(res.attributes.iter().any(|a| a.key == "ignored"));

    let stats: LotteryStats = net.query(2, QueryMsg::Stats {});
    assert_eq!(stats.total_wins + stats.total_losses, 1);
}

#[test]
fn test_replayed_randomness_request_is_rejected() {
    let mut net = Network::new(&[hub(1_000_000), spoke(2, 2_000_000)]).with_drand_provider(HUB);
    net.enter(2, EntryAmount::Usd(Uint128::new(ENTRY_USD)));

    let request = net.deliveries[0].clone();
    let err = net
        .deliver(request.src, request.dst, request.payload)
        .unwrap_err();
    assert!(matches!(
        err,
        ContractError::DuplicateSequence {
            chain_id: 2,
            sequence: 1
        }
    ));
}

// ─── Price sharing ───

#[test]
fn test_spoke_price_reaches_every_chain() {
    let mut net = Network::new(&[
        hub(1_000_000),
        ChainSetup {
            id: 2,
            reserve: 2_000_000,
            local_provider: true,
        },
        spoke(3, 3_000_000),
    ]);
    net.chain(2).oracle_price = Some(2_000_000);
    net.chain(2).install_mocks();

    net.enter(2, EntryAmount::Usd(Uint128::new(ENTRY_USD)));
    net.fulfill(2, 1, WINNING_WORD);

    // The hub folds the spoke's reading into its aggregate...
    let aggregate: PriceReading = net.query(HUB, QueryMsg::AggregatedPrice {});
    assert_eq!(aggregate.price, Uint128::new(2_000_000));

    // ...and pushes the aggregate to every chain with the broadcast
    for chain_id in [2, 3] {
        let reference: Option<ChainPriceObservation> =
            net.query(chain_id, QueryMsg::ReferencePrice {});
        let reference = reference.unwrap();
        assert_eq!(reference.chain_id, HUB);
        assert_eq!(reference.price, Uint128::new(2_000_000));
    }

    // Chain 3 has no oracle of its own but can now value token entries:
    // 1 token at $2 clears the $1 minimum
    let res = net.enter(3, EntryAmount::Tokens(Uint128::new(10u128.pow(18))));
    assert_eq!(entry_id(&res), 1);
    let entries = net.events(3, "jackpot_entry");
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_token_entry_without_any_price_is_skipped() {
    let mut net = Network::new(&[hub(1_000_000), spoke(2, 2_000_000)]);

    let res = net.enter(2, EntryAmount::Tokens(Uint128::new(10u128.pow(18))));
    assert_eq!(entry_id(&res), 0);
    assert!(net.deliveries.is_empty());
    assert_eq!(
        attr(net.events(2, "jackpot_entry_skipped")[0], "reason"),
        "price_unavailable"
    );
}
